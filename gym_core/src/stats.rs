//! Completion stats: streaks and lifetime totals.

use crate::UserStats;
use chrono::{Duration, NaiveDate};

impl UserStats {
    /// Fold a completed workout into the stats
    ///
    /// A second workout on the same day keeps the streak, a workout the day
    /// after the last one extends it, anything else restarts it at 1.
    pub fn record_completion(&mut self, today: NaiveDate, workout_seconds: u32) {
        self.streak = match self.last_workout_date {
            Some(last) if last == today => self.streak.max(1),
            Some(last) if last + Duration::days(1) == today => self.streak + 1,
            _ => 1,
        };
        self.total_workouts += 1;
        self.total_minutes += minutes_for(workout_seconds);
        self.last_workout_date = Some(today);

        tracing::info!(
            "Stats updated: streak {}, {} workouts, {} minutes",
            self.streak,
            self.total_workouts,
            self.total_minutes
        );
    }
}

/// Whole minutes credited for a workout, rounded to nearest
pub fn minutes_for(seconds: u32) -> u32 {
    (f64::from(seconds) / 60.0).round() as u32
}
