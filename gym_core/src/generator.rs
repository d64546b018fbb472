//! Rule-based workout generator.
//!
//! Selection works in two passes:
//! - Filter the catalog by space, energy (±1 level) and equipment
//! - Shuffle the matches and greedily fill the time budget, preferring
//!   unused body focus once three exercises are in
//!
//! The random source is a parameter so callers can seed it.

use crate::catalog::{get_default_catalog, FALLBACK_EXERCISE_IDS};
use crate::config::GeneratorConfig;
use crate::{
    Catalog, EnergyLevel, Equipment, Exercise, SpaceRequirement, SpaceType, Workout,
    WorkoutPreferences,
};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use uuid::Uuid;

/// Picks accepted regardless of body focus repetition
const FREE_FOCUS_PICKS: usize = 3;

/// Fewer picks than this triggers the in-order retry
const MIN_EXERCISES: usize = 2;

/// Upper bound for the in-order retry
const RETRY_CAP: usize = 3;

/// kcal/minute used when no energy level is known
const DEFAULT_CALORIE_RATE: f64 = 4.0;

/// Generate a workout from the cached catalog with default settings and the thread RNG
pub fn generate_workout_default(preferences: &WorkoutPreferences) -> Workout {
    generate_workout(
        get_default_catalog(),
        preferences,
        &GeneratorConfig::default(),
        &mut rand::thread_rng(),
    )
}

/// Generate a workout for the given preferences
///
/// Never fails: when nothing matches, the fixed fallback set is returned
/// regardless of the time budget.
pub fn generate_workout<R: Rng + ?Sized>(
    catalog: &Catalog,
    preferences: &WorkoutPreferences,
    settings: &GeneratorConfig,
    rng: &mut R,
) -> Workout {
    let target_seconds = preferences
        .time_minutes
        .saturating_mul(60)
        .saturating_sub(settings.transition_buffer_seconds);

    let candidates = filter_exercises(catalog, preferences);
    tracing::debug!(
        "{} of {} exercises match {:?}",
        candidates.len(),
        catalog.len(),
        preferences
    );

    let mut exercises = if candidates.is_empty() {
        tracing::info!("No exercises match preferences, using fallback set");
        fallback_exercises(catalog)
    } else {
        select_exercises(candidates, target_seconds, settings.max_exercises, rng)
    };

    if exercises.is_empty() {
        tracing::warn!(
            "Nothing fits a {}s budget, using fallback set",
            target_seconds
        );
        exercises = fallback_exercises(catalog);
    }

    let total_duration_seconds = exercises.iter().map(|e| e.duration_seconds).sum();
    let estimated_calories =
        estimate_calories(total_duration_seconds, Some(preferences.energy_level));

    tracing::info!(
        "Generated {} exercises, {}s, ~{} kcal",
        exercises.len(),
        total_duration_seconds,
        estimated_calories
    );

    Workout {
        id: Uuid::new_v4(),
        exercises,
        total_duration_seconds,
        estimated_calories,
        preferences: preferences.clone(),
    }
}

/// All catalog entries satisfying the space, energy and equipment predicates
pub fn filter_exercises<'a>(
    catalog: &'a Catalog,
    preferences: &WorkoutPreferences,
) -> Vec<&'a Exercise> {
    catalog
        .exercises()
        .iter()
        .filter(|e| {
            matches_space(e.space_requirement, preferences.space_type)
                && matches_energy(e.energy_level, preferences.energy_level)
                && matches_equipment(e.equipment, preferences.equipment)
        })
        .collect()
}

/// Tight rooms take minimal-space moves, normal rooms add normal ones, outdoors takes anything
pub fn matches_space(requirement: SpaceRequirement, space: SpaceType) -> bool {
    match space {
        SpaceType::Tight => requirement == SpaceRequirement::Minimal,
        SpaceType::Normal => matches!(
            requirement,
            SpaceRequirement::Minimal | SpaceRequirement::Normal
        ),
        SpaceType::Outdoor => true,
    }
}

/// Within one level of the requested energy
pub fn matches_energy(exercise: EnergyLevel, target: EnergyLevel) -> bool {
    (target.ordinal() - exercise.ordinal()).abs() <= 1
}

/// Equipment-free moves always match; otherwise the equipment must be the one available
pub fn matches_equipment(required: Equipment, available: Equipment) -> bool {
    required == Equipment::None || required == available
}

/// The fixed minimal set used when nothing matches
///
/// Drawn from `catalog` when it carries the fallback ids, otherwise from the
/// built-in catalog.
pub fn fallback_exercises(catalog: &Catalog) -> Vec<Exercise> {
    let from = |c: &Catalog| -> Vec<Exercise> {
        FALLBACK_EXERCISE_IDS
            .iter()
            .filter_map(|id| c.get(id).cloned())
            .collect()
    };

    let exercises = from(catalog);
    if exercises.is_empty() {
        from(get_default_catalog())
    } else {
        exercises
    }
}

/// Calorie estimate: minutes × per-minute rate for the energy level, rounded
pub fn estimate_calories(total_seconds: u32, energy: Option<EnergyLevel>) -> u32 {
    let rate = match energy {
        Some(EnergyLevel::Low) => 3.0,
        Some(EnergyLevel::Medium) => 5.0,
        Some(EnergyLevel::High) => 8.0,
        None => DEFAULT_CALORIE_RATE,
    };
    ((f64::from(total_seconds) / 60.0) * rate).round() as u32
}

fn select_exercises<R: Rng + ?Sized>(
    mut candidates: Vec<&Exercise>,
    target_seconds: u32,
    max_exercises: usize,
    rng: &mut R,
) -> Vec<Exercise> {
    candidates.shuffle(rng);

    let mut selected: Vec<&Exercise> = Vec::new();
    let mut used_focus = HashSet::new();
    let mut current = 0;

    for &exercise in &candidates {
        if current + exercise.duration_seconds > target_seconds {
            continue;
        }
        if used_focus.contains(&exercise.body_focus) && selected.len() >= FREE_FOCUS_PICKS {
            continue;
        }

        selected.push(exercise);
        current += exercise.duration_seconds;
        used_focus.insert(exercise.body_focus);

        if selected.len() >= max_exercises {
            break;
        }
    }

    if selected.len() < MIN_EXERCISES && candidates.len() >= MIN_EXERCISES {
        tracing::debug!(
            "Only {} exercise(s) selected, retrying in shuffled order",
            selected.len()
        );
        selected.clear();
        current = 0;

        for &exercise in candidates.iter().take(RETRY_CAP) {
            if current + exercise.duration_seconds <= target_seconds {
                selected.push(exercise);
                current += exercise.duration_seconds;
            }
        }
    }

    selected.into_iter().cloned().collect()
}
