//! Workout session state machine.
//!
//! A `Session` drives an ordered exercise list through three phases:
//!
//! ```text
//! Exercising --(0s, rest > 0)--> Resting --(0s)--> next Exercising
//! Exercising --(0s, no rest)--------------------> next Exercising
//! last exercise finished ----------------------> Complete (terminal)
//! ```
//!
//! It is a pure reducer over one-second ticks and user controls; it performs
//! no I/O and owns no clock. `SessionRunner` supplies the ticks.
//!
//! Advance policy: a countdown reaching zero carries straight on into the
//! next exercise (or rest), while manual skip/previous/repeat leave the timer
//! paused.

use crate::{Error, Exercise, Result, Workout};
use serde::{Deserialize, Serialize};

/// Current mode of the session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Exercising,
    Resting,
    Complete,
}

/// Snapshot of the countdown
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_index: usize,
    pub phase: Phase,
    pub time_remaining_seconds: u32,
    pub is_running: bool,
}

/// What a tick or control did to the session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Countdown moved; still above zero
    Ticked { remaining: u32 },
    /// Exercise finished and its rest interval began
    RestStarted { index: usize, seconds: u32 },
    /// A new exercise is loaded at full duration
    ExerciseStarted { index: usize, running: bool },
    Paused,
    Resumed,
    /// Current exercise restarted from full duration
    Reset { index: usize },
    /// Last exercise finished; emitted once per session
    Completed,
    /// User left before finishing
    Exited,
    /// Control not applicable in the current state
    Ignored,
}

/// How a session ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    Completed,
    Exited,
}

/// A running workout session
#[derive(Clone, Debug)]
pub struct Session {
    exercises: Vec<Exercise>,
    state: SessionState,
    exited: bool,
}

impl Session {
    /// Start a paused session on the first exercise
    pub fn new(exercises: Vec<Exercise>) -> Result<Self> {
        let first = exercises
            .first()
            .ok_or_else(|| Error::State("cannot start a session with no exercises".into()))?;

        let state = SessionState {
            current_index: 0,
            phase: Phase::Exercising,
            time_remaining_seconds: first.duration_seconds,
            is_running: false,
        };

        Ok(Self {
            exercises,
            state,
            exited: false,
        })
    }

    pub fn from_workout(workout: &Workout) -> Result<Self> {
        Self::new(workout.exercises.clone())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    pub fn current_exercise(&self) -> &Exercise {
        &self.exercises[self.state.current_index]
    }

    /// Exercise after the current one, if any
    pub fn next_exercise(&self) -> Option<&Exercise> {
        self.exercises.get(self.state.current_index + 1)
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn is_complete(&self) -> bool {
        self.state.phase == Phase::Complete
    }

    fn is_last(&self) -> bool {
        self.state.current_index + 1 >= self.exercises.len()
    }

    fn is_finished(&self) -> bool {
        self.exited || self.is_complete()
    }

    /// Fraction of exercises reached, counting the current one
    pub fn progress(&self) -> f64 {
        (self.state.current_index + 1) as f64 / self.exercises.len() as f64
    }

    /// Terminal outcome, once the session has one
    pub fn outcome(&self) -> Option<SessionOutcome> {
        if self.is_complete() {
            Some(SessionOutcome::Completed)
        } else if self.exited {
            Some(SessionOutcome::Exited)
        } else {
            None
        }
    }

    /// Advance the countdown by one second
    ///
    /// Ignored while paused or finished.
    pub fn tick(&mut self) -> SessionEvent {
        if !self.state.is_running || self.is_finished() {
            return SessionEvent::Ignored;
        }

        self.state.time_remaining_seconds = self.state.time_remaining_seconds.saturating_sub(1);
        if self.state.time_remaining_seconds > 0 {
            return SessionEvent::Ticked {
                remaining: self.state.time_remaining_seconds,
            };
        }

        match self.state.phase {
            Phase::Exercising => {
                let rest = self.current_exercise().rest_seconds();
                if rest > 0 {
                    self.state.phase = Phase::Resting;
                    self.state.time_remaining_seconds = rest;
                    tracing::debug!(
                        "Resting {}s after exercise {}",
                        rest,
                        self.state.current_index
                    );
                    SessionEvent::RestStarted {
                        index: self.state.current_index,
                        seconds: rest,
                    }
                } else {
                    self.advance(true)
                }
            }
            Phase::Resting => self.advance(true),
            Phase::Complete => SessionEvent::Ignored,
        }
    }

    /// Flip between running and paused
    pub fn toggle_pause(&mut self) -> SessionEvent {
        if self.is_finished() {
            return SessionEvent::Ignored;
        }

        self.state.is_running = !self.state.is_running;
        if self.state.is_running {
            SessionEvent::Resumed
        } else {
            SessionEvent::Paused
        }
    }

    /// Move to the next exercise, paused; unavailable on the last exercise
    pub fn skip(&mut self) -> SessionEvent {
        if self.is_finished() || self.is_last() {
            return SessionEvent::Ignored;
        }
        self.advance(false)
    }

    /// Step back to the previous exercise, paused at full duration
    pub fn previous(&mut self) -> SessionEvent {
        if self.is_finished() || self.state.current_index == 0 {
            return SessionEvent::Ignored;
        }

        self.load(self.state.current_index - 1, false);
        SessionEvent::ExerciseStarted {
            index: self.state.current_index,
            running: false,
        }
    }

    /// Restart the current exercise from full duration, paused
    pub fn repeat(&mut self) -> SessionEvent {
        if self.is_finished() {
            return SessionEvent::Ignored;
        }

        self.load(self.state.current_index, false);
        SessionEvent::Reset {
            index: self.state.current_index,
        }
    }

    /// Abandon the session without completing it
    pub fn exit(&mut self) -> SessionEvent {
        if self.is_finished() {
            return SessionEvent::Ignored;
        }

        self.exited = true;
        self.state.is_running = false;
        tracing::info!(
            "Session exited at exercise {} of {}",
            self.state.current_index + 1,
            self.exercises.len()
        );
        SessionEvent::Exited
    }

    fn advance(&mut self, keep_running: bool) -> SessionEvent {
        if self.is_last() {
            self.state.phase = Phase::Complete;
            self.state.is_running = false;
            self.state.time_remaining_seconds = 0;
            tracing::info!("Session complete ({} exercises)", self.exercises.len());
            return SessionEvent::Completed;
        }

        self.load(self.state.current_index + 1, keep_running);
        SessionEvent::ExerciseStarted {
            index: self.state.current_index,
            running: keep_running,
        }
    }

    fn load(&mut self, index: usize, running: bool) {
        self.state.current_index = index;
        self.state.phase = Phase::Exercising;
        self.state.time_remaining_seconds = self.exercises[index].duration_seconds;
        self.state.is_running = running;
    }
}

/// Render seconds as `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BodyFocus, EnergyLevel, Equipment, SpaceRequirement};

    fn exercise(id: &str, duration: u32, rest: Option<u32>) -> Exercise {
        Exercise {
            id: id.into(),
            name: id.into(),
            duration_seconds: duration,
            reps: None,
            difficulty: 1,
            space_requirement: SpaceRequirement::Minimal,
            energy_level: EnergyLevel::Low,
            body_focus: BodyFocus::Core,
            equipment: Equipment::None,
            instructions: String::new(),
            rest_after_seconds: rest,
            form_tips: vec![],
            category: None,
        }
    }

    fn three_by_ten() -> Session {
        Session::new(vec![
            exercise("a", 10, None),
            exercise("b", 10, None),
            exercise("c", 10, None),
        ])
        .unwrap()
    }

    #[test]
    fn test_initial_state() {
        let session = three_by_ten();
        assert_eq!(
            session.state(),
            &SessionState {
                current_index: 0,
                phase: Phase::Exercising,
                time_remaining_seconds: 10,
                is_running: false,
            }
        );
        assert_eq!(session.outcome(), None);
        assert_eq!(session.next_exercise().map(|e| e.id.as_str()), Some("b"));
    }

    #[test]
    fn test_empty_session_rejected() {
        assert!(matches!(Session::new(vec![]), Err(Error::State(_))));
    }

    #[test]
    fn test_thirty_ticks_complete_three_by_ten() {
        let mut session = three_by_ten();
        session.toggle_pause();

        let mut completions = 0;
        for tick in 1..=30 {
            let event = session.tick();
            if tick == 10 {
                assert_eq!(event, SessionEvent::ExerciseStarted { index: 1, running: true });
            }
            if event == SessionEvent::Completed {
                completions += 1;
                assert_eq!(tick, 30);
            }
        }

        assert_eq!(completions, 1);
        assert!(session.is_complete());
        assert_eq!(session.state().current_index, 2);
        assert!(!session.is_running());
        assert_eq!(session.outcome(), Some(SessionOutcome::Completed));
        assert_eq!(session.tick(), SessionEvent::Ignored);
    }

    #[test]
    fn test_rest_interval_runs_between_exercises() {
        let mut session =
            Session::new(vec![exercise("a", 3, Some(2)), exercise("b", 3, None)]).unwrap();
        session.toggle_pause();

        session.tick();
        session.tick();
        assert_eq!(session.tick(), SessionEvent::RestStarted { index: 0, seconds: 2 });
        assert_eq!(session.state().phase, Phase::Resting);
        assert!(session.is_running());

        session.tick();
        assert_eq!(session.tick(), SessionEvent::ExerciseStarted { index: 1, running: true });
        assert_eq!(session.state().time_remaining_seconds, 3);
        assert_eq!(session.state().phase, Phase::Exercising);
    }

    #[test]
    fn test_rest_after_last_exercise_precedes_completion() {
        let mut session = Session::new(vec![exercise("only", 1, Some(2))]).unwrap();
        session.toggle_pause();

        assert!(matches!(session.tick(), SessionEvent::RestStarted { .. }));
        session.tick();
        assert_eq!(session.tick(), SessionEvent::Completed);
    }

    #[test]
    fn test_ticks_ignored_while_paused() {
        let mut session = three_by_ten();
        assert_eq!(session.tick(), SessionEvent::Ignored);
        assert_eq!(session.state().time_remaining_seconds, 10);
    }

    #[test]
    fn test_every_workout_terminates() {
        for len in 1..6 {
            let exercises: Vec<_> = (0..len)
                .map(|i| exercise(&format!("e{}", i), (i as u32 % 3) + 1, Some(i as u32 % 2)))
                .collect();
            let bound: u32 = exercises
                .iter()
                .map(|e| e.duration_seconds + e.rest_seconds())
                .sum();
            let mut session = Session::new(exercises).unwrap();
            session.toggle_pause();

            let mut ticks = 0;
            while !session.is_complete() {
                session.tick();
                ticks += 1;
                assert!(session.state().current_index < len);
                assert!(ticks <= bound, "session of {} did not finish", len);
            }
        }
    }

    #[test]
    fn test_even_toggles_restore_state() {
        let mut session = three_by_ten();
        session.toggle_pause();
        session.tick();
        let before = session.state().clone();

        for _ in 0..4 {
            session.toggle_pause();
        }

        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_repeat_resets_current_exercise() {
        let mut session =
            Session::new(vec![exercise("a", 5, Some(3)), exercise("b", 5, None)]).unwrap();
        session.toggle_pause();
        session.tick();
        session.tick();

        assert_eq!(session.repeat(), SessionEvent::Reset { index: 0 });
        assert_eq!(session.state().time_remaining_seconds, 5);
        assert_eq!(session.state().current_index, 0);
        assert_eq!(session.state().phase, Phase::Exercising);
        assert!(!session.is_running());

        // From rest, repeat returns to the exercise itself
        session.toggle_pause();
        for _ in 0..5 {
            session.tick();
        }
        assert_eq!(session.state().phase, Phase::Resting);
        session.repeat();
        assert_eq!(session.state().phase, Phase::Exercising);
        assert_eq!(session.state().time_remaining_seconds, 5);
    }

    #[test]
    fn test_skip_pauses_and_stops_at_last() {
        let mut session = three_by_ten();
        session.toggle_pause();
        session.tick();

        assert_eq!(session.skip(), SessionEvent::ExerciseStarted { index: 1, running: false });
        assert_eq!(session.state().time_remaining_seconds, 10);
        assert!(!session.is_running());

        session.skip();
        assert_eq!(session.state().current_index, 2);
        assert_eq!(session.skip(), SessionEvent::Ignored);
        assert!(!session.is_complete());
    }

    #[test]
    fn test_skip_during_rest_moves_on() {
        let mut session =
            Session::new(vec![exercise("a", 1, Some(30)), exercise("b", 4, None)]).unwrap();
        session.toggle_pause();
        session.tick();
        assert_eq!(session.state().phase, Phase::Resting);

        session.skip();
        assert_eq!(session.state().current_index, 1);
        assert_eq!(session.state().phase, Phase::Exercising);
        assert_eq!(session.state().time_remaining_seconds, 4);
    }

    #[test]
    fn test_previous() {
        let mut session = three_by_ten();
        assert_eq!(session.previous(), SessionEvent::Ignored);

        session.skip();
        session.skip();
        session.toggle_pause();
        session.tick();

        assert_eq!(session.previous(), SessionEvent::ExerciseStarted { index: 1, running: false });
        assert_eq!(session.state().time_remaining_seconds, 10);
        assert!(!session.is_running());
    }

    #[test]
    fn test_exit_does_not_complete() {
        let mut session = three_by_ten();
        session.toggle_pause();
        session.tick();

        assert_eq!(session.exit(), SessionEvent::Exited);
        assert_eq!(session.outcome(), Some(SessionOutcome::Exited));
        assert!(!session.is_complete());
        assert_eq!(session.tick(), SessionEvent::Ignored);
        assert_eq!(session.toggle_pause(), SessionEvent::Ignored);
        assert_eq!(session.exit(), SessionEvent::Ignored);
    }

    #[test]
    fn test_controls_ignored_after_completion() {
        let mut session = Session::new(vec![exercise("a", 1, None)]).unwrap();
        session.toggle_pause();
        assert_eq!(session.tick(), SessionEvent::Completed);

        assert_eq!(session.repeat(), SessionEvent::Ignored);
        assert_eq!(session.previous(), SessionEvent::Ignored);
        assert_eq!(session.toggle_pause(), SessionEvent::Ignored);
        assert!(session.is_complete());
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(45), "0:45");
        assert_eq!(format_time(125), "2:05");
    }
}
