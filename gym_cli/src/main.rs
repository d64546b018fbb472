use chrono::Local;
use clap::{Args, Parser, Subcommand};
use gym_core::ai::fallback_workout;
use gym_core::stats::minutes_for;
use gym_core::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "vibegym")]
#[command(about = "Quick workouts generated for your space, energy and time", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Act as this signed-in user (overrides config)
    #[arg(long, global = true)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a workout and print it (default)
    Generate {
        #[command(flatten)]
        prefs: PrefArgs,

        /// Print the workout as JSON
        #[arg(long)]
        json: bool,

        /// Save the generated workout under this name
        #[arg(long)]
        save_as: Option<String>,
    },

    /// Generate a workout and run the session timer
    Start {
        #[command(flatten)]
        prefs: PrefArgs,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Ask the hosted generator for a workout (falls back locally on failure)
    Ai {
        /// Room size (small, big)
        #[arg(long, default_value = "small")]
        space_size: SpaceSize,

        /// Weights are available
        #[arg(long)]
        weights: bool,

        /// Intensity (light, moderate, intense)
        #[arg(long, default_value = "moderate")]
        intensity: Intensity,

        /// Duration in minutes
        #[arg(long, default_value_t = 20)]
        duration: u32,

        /// Focus area (upper-body, lower-body, core, full-body, cardio, functional, mobility)
        #[arg(long, default_value = "full-body")]
        focus: FocusArea,

        /// Free-text notes, e.g. injuries
        #[arg(long, default_value = "")]
        notes: String,

        /// Endpoint URL (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Print the workout as JSON
        #[arg(long)]
        json: bool,

        /// Run the session timer after generating
        #[arg(long)]
        start: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show workout stats
    Stats {
        /// Print stats as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage saved workouts
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },
}

#[derive(Subcommand)]
enum SavedCommands {
    /// List saved workouts, newest first
    List,

    /// Delete a saved workout
    Delete { id: Uuid },

    /// Run a saved workout
    Start {
        id: Uuid,

        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
struct PrefArgs {
    /// Minutes available (2, 3 or 5)
    #[arg(long, default_value_t = 5)]
    minutes: u32,

    /// Space (tight, normal, outdoor)
    #[arg(long, default_value = "normal")]
    space: SpaceType,

    /// Energy level (low, medium, high)
    #[arg(long, default_value = "medium")]
    energy: EnergyLevel,

    /// Equipment at hand (none, chair, wall)
    #[arg(long, default_value = "none")]
    equipment: Equipment,

    /// Seed the exercise shuffle for a reproducible workout
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct RunArgs {
    /// Auto-complete (for testing) - start immediately and tick without delay
    #[arg(long)]
    auto_complete: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    gym_core::logging::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(user) = cli.user {
        config.user.id = Some(user);
    }
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());

    let catalog = get_default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }

    let app = App {
        store: JsonFileStore::new(data_dir),
        identity: StaticIdentity::from_config(&config.user),
        config,
        catalog,
    };

    match cli.command {
        Some(Commands::Generate {
            prefs,
            json,
            save_as,
        }) => app.cmd_generate(&prefs, json, save_as),
        Some(Commands::Start { prefs, run }) => app.cmd_start(&prefs, &run),
        Some(Commands::Ai {
            space_size,
            weights,
            intensity,
            duration,
            focus,
            notes,
            endpoint,
            json,
            start,
            run,
        }) => {
            let request = AiWorkoutRequest {
                space_size,
                has_weights: weights,
                intensity,
                duration_minutes: duration,
                focus_area: focus,
                notes,
            };
            app.cmd_ai(&request, endpoint, json, start.then_some(&run))
        }
        Some(Commands::Stats { json }) => app.cmd_stats(json),
        Some(Commands::Saved { command }) => app.cmd_saved(command),
        None => {
            // Default to "generate" with default preferences
            let prefs = PrefArgs::default();
            app.cmd_generate(&prefs, false, None)
        }
    }
}

impl Default for PrefArgs {
    fn default() -> Self {
        Self {
            minutes: 5,
            space: SpaceType::Normal,
            energy: EnergyLevel::Medium,
            equipment: Equipment::None,
            seed: None,
        }
    }
}

impl PrefArgs {
    fn to_preferences(&self) -> Result<WorkoutPreferences> {
        WorkoutPreferences::new(self.minutes, self.space, self.energy, self.equipment)
    }
}

struct App {
    config: Config,
    store: JsonFileStore,
    identity: StaticIdentity,
    catalog: &'static Catalog,
}

impl App {
    fn generate(&self, prefs: &PrefArgs) -> Result<Workout> {
        let preferences = prefs.to_preferences()?;
        let workout = match prefs.seed {
            Some(seed) => generate_workout(
                self.catalog,
                &preferences,
                &self.config.generator,
                &mut ChaCha8Rng::seed_from_u64(seed),
            ),
            None => generate_workout(
                self.catalog,
                &preferences,
                &self.config.generator,
                &mut rand::thread_rng(),
            ),
        };
        Ok(workout)
    }

    fn cmd_generate(&self, prefs: &PrefArgs, json: bool, save_as: Option<String>) -> Result<()> {
        let workout = self.generate(prefs)?;

        if json {
            println!("{}", serde_json::to_string_pretty(&workout)?);
        } else {
            display_workout(&workout);
        }

        if let Some(name) = save_as {
            // Saving is best-effort; the workout above is already usable
            match self.save_workout(&name, &workout) {
                Ok(id) => eprintln!("✓ Saved as '{}' ({})", name, id),
                Err(e) => {
                    tracing::warn!("Failed to save workout: {}", e);
                    eprintln!("Could not save workout: {}", e);
                }
            }
        }

        Ok(())
    }

    fn save_workout(&self, name: &str, workout: &Workout) -> Result<Uuid> {
        let user = require_user(&self.identity)?;
        let record = SavedWorkout::new(user.id, name, workout.clone());
        self.store.save_workout(&record)?;
        Ok(record.id)
    }

    fn cmd_start(&self, prefs: &PrefArgs, run: &RunArgs) -> Result<()> {
        let workout = self.generate(prefs)?;
        display_workout(&workout);
        self.run_session(&workout, run)?;
        Ok(())
    }

    fn cmd_ai(
        &self,
        request: &AiWorkoutRequest,
        endpoint: Option<String>,
        json: bool,
        run: Option<&RunArgs>,
    ) -> Result<()> {
        request.validate()?;

        let mut ai_config = self.config.ai.clone();
        if endpoint.is_some() {
            ai_config.endpoint = endpoint;
        }

        let workout = match HttpWorkoutSource::from_config(&ai_config)? {
            Some(source) => generate_with_fallback(&source, request),
            None => {
                tracing::info!("No AI endpoint configured, using fallback workout");
                fallback_workout(request)
            }
        };

        if json {
            println!("{}", serde_json::to_string_pretty(&workout)?);
        } else {
            display_workout(&workout);
        }

        if let Some(run) = run {
            self.run_session(&workout, run)?;
        }
        Ok(())
    }

    fn cmd_stats(&self, json: bool) -> Result<()> {
        let stats = self.store.load_stats()?;

        if json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
            return Ok(());
        }

        println!("Streak:         {} day(s)", stats.streak);
        println!("Workouts:       {}", stats.total_workouts);
        println!("Minutes moved:  {}", stats.total_minutes);
        match stats.last_workout_date {
            Some(date) => println!("Last workout:   {}", date),
            None => println!("Last workout:   never"),
        }
        Ok(())
    }

    fn cmd_saved(&self, command: SavedCommands) -> Result<()> {
        let user = require_user(&self.identity)?;

        match command {
            SavedCommands::List => {
                let saved = self.store.list_saved_workouts(&user.id)?;
                if saved.is_empty() {
                    println!("No saved workouts yet.");
                }
                for record in saved {
                    println!(
                        "{}  {}  {} exercises, {}  (completed {}x, saved {})",
                        record.id,
                        record.name,
                        record.workout.exercises.len(),
                        format_time(record.workout.total_duration_seconds),
                        record.times_completed,
                        record.saved_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    );
                }
            }

            SavedCommands::Delete { id } => {
                if self.store.delete_workout(id)? {
                    println!("✓ Deleted {}", id);
                } else {
                    println!("No saved workout with id {}", id);
                }
            }

            SavedCommands::Start { id, run } => {
                let record = self
                    .store
                    .get_saved_workout(id)?
                    .filter(|r| r.user_id == user.id)
                    .ok_or_else(|| Error::Persistence(format!("no saved workout with id {}", id)))?;

                display_workout(&record.workout);
                if self.run_session(&record.workout, &run)? == SessionOutcome::Completed {
                    match self.store.increment_times_completed(id) {
                        Ok(count) => println!("  Completed this workout {} time(s)", count),
                        Err(e) => tracing::warn!("Failed to update completion count: {}", e),
                    }
                }
            }
        }

        Ok(())
    }

    fn run_session(&self, workout: &Workout, run: &RunArgs) -> Result<SessionOutcome> {
        let session = Session::from_workout(workout)?;
        let interactive = !run.auto_complete;
        let interval = if interactive {
            self.config.session.tick_interval()
        } else {
            Duration::from_millis(1)
        };

        if interactive {
            println!("─────────────────────────────────────────");
            println!("Enter: start/pause   s: skip   b: back   r: repeat   q: quit");
        }
        print_exercise(0, session.current_exercise(), session.exercises().len());

        let runner = SessionRunner::new(interval);
        let handle = runner.spawn(session, move |event, session| {
            display_event(event, session, interactive)
        })?;

        // Closing stdin ends an interactive session; auto-complete holds its own sender
        let auto_controls = if interactive {
            let controls = handle.sender();
            std::thread::spawn(move || {
                let stdin = io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    let control = match line.trim().to_lowercase().as_str() {
                        "" | "p" => Control::TogglePause,
                        "s" => Control::Skip,
                        "b" => Control::Previous,
                        "r" => Control::Repeat,
                        "q" => Control::Exit,
                        _ => continue,
                    };
                    if controls.send(control).is_err() {
                        break;
                    }
                }
            });
            None
        } else {
            handle.send(Control::TogglePause)?;
            Some(handle.sender())
        };

        let outcome = handle.join()?;
        drop(auto_controls);
        match outcome {
            SessionOutcome::Completed => {
                println!("\n🎉 Workout complete!");
                self.record_completion(workout);
            }
            SessionOutcome::Exited => {
                println!("\nSession ended early - stats unchanged.");
            }
        }
        Ok(outcome)
    }

    /// Stats failures are reported but never fail the finished session
    fn record_completion(&self, workout: &Workout) {
        let today = Local::now().date_naive();
        let result = self.store.update_stats(|stats| {
            stats.record_completion(today, workout.total_duration_seconds)
        });

        match result {
            Ok(stats) => println!(
                "✓ Stats updated: {} day streak, {} workouts, +{} min",
                stats.streak,
                stats.total_workouts,
                minutes_for(workout.total_duration_seconds)
            ),
            Err(e) => {
                tracing::warn!("Failed to update stats: {}", e);
                eprintln!("Could not update stats: {}", e);
            }
        }
    }
}

fn display_workout(workout: &Workout) {
    println!("\n╭─────────────────────────────────────────╮");
    println!(
        "│  {}-MIN WORKOUT · {} exercises",
        workout.preferences.time_minutes,
        workout.exercises.len()
    );
    println!("╰─────────────────────────────────────────╯");
    println!();

    for (i, exercise) in workout.exercises.iter().enumerate() {
        let reps = exercise
            .reps
            .map(|r| format!("  ({} reps)", r))
            .unwrap_or_default();
        println!(
            "  {}. {}  {}{}",
            i + 1,
            exercise.name,
            format_time(exercise.duration_seconds),
            reps
        );
        println!("     {}", exercise.instructions);
    }

    println!();
    println!(
        "  Total: {} · ~{} kcal",
        format_time(workout.total_duration_seconds),
        workout.estimated_calories
    );
    println!();
}

fn print_exercise(index: usize, exercise: &Exercise, count: usize) {
    println!();
    println!("[{}/{}] {}", index + 1, count, exercise.name.to_uppercase());
    println!("  {}", exercise.instructions);
    for tip in &exercise.form_tips {
        println!("  • {}", tip);
    }
    if let Some(reps) = exercise.reps {
        println!("  Target: {} reps", reps);
    }
}

fn display_event(event: &SessionEvent, session: &Session, interactive: bool) {
    let state = session.state();
    match event {
        SessionEvent::Ticked { remaining } if interactive => {
            print!("\r  {}   ", format_time(*remaining));
            let _ = io::stdout().flush();
        }
        SessionEvent::RestStarted { seconds, .. } => {
            let next = session
                .next_exercise()
                .map(|e| e.name.as_str())
                .unwrap_or("Finish");
            println!("\n  REST {} · next: {}", format_time(*seconds), next);
        }
        SessionEvent::ExerciseStarted { index, running } => {
            print_exercise(*index, session.current_exercise(), session.exercises().len());
            if !running {
                println!("  (paused - press Enter to start)");
            }
        }
        SessionEvent::Paused if interactive => {
            println!("\n  Paused at {}", format_time(state.time_remaining_seconds));
        }
        SessionEvent::Reset { .. } => {
            println!(
                "\n  Restarting {} ({})",
                session.current_exercise().name,
                format_time(state.time_remaining_seconds)
            );
        }
        _ => {}
    }
}
