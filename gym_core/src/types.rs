//! Core domain types for the workout engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercises and their constraint attributes
//! - Generation preferences (local and AI)
//! - Generated workouts
//! - User stats and saved workout records
//!
//! `Exercise` and `Workout` are the interchange format shared by every adapter,
//! so their serialized field names are stable camelCase.

use crate::{Error, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Exercise Attributes
// ============================================================================

/// Floor space an exercise needs
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpaceRequirement {
    Minimal,
    Normal,
    Large,
}

/// Effort level, shared by exercises and preferences
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl EnergyLevel {
    /// Position on the low/medium/high scale (0, 1, 2)
    pub fn ordinal(self) -> i32 {
        match self {
            EnergyLevel::Low => 0,
            EnergyLevel::Medium => 1,
            EnergyLevel::High => 2,
        }
    }
}

/// Primary muscle group or training quality
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BodyFocus {
    Upper,
    Lower,
    Core,
    Cardio,
    Flexibility,
}

/// Household equipment an exercise uses
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Equipment {
    None,
    Chair,
    Wall,
}

/// Block of an AI-structured workout
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseCategory {
    Warmup,
    Main,
    Cooldown,
}

// ============================================================================
// Exercise
// ============================================================================

/// A single timed exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    #[serde(alias = "duration")]
    pub duration_seconds: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    pub difficulty: u8,
    pub space_requirement: SpaceRequirement,
    pub energy_level: EnergyLevel,
    pub body_focus: BodyFocus,
    pub equipment: Equipment,
    pub instructions: String,
    #[serde(default, alias = "restAfter", skip_serializing_if = "Option::is_none")]
    pub rest_after_seconds: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub form_tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ExerciseCategory>,
}

impl Exercise {
    /// Rest interval after this exercise, zero when none is defined
    pub fn rest_seconds(&self) -> u32 {
        self.rest_after_seconds.unwrap_or(0)
    }
}

// ============================================================================
// Preferences
// ============================================================================

/// Session lengths the questionnaire offers
pub const ALLOWED_TIME_MINUTES: [u32; 3] = [2, 3, 5];

/// Where the user is working out
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    Tight,
    Normal,
    Outdoor,
}

/// Questionnaire answers driving the local generator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPreferences {
    pub time_minutes: u32,
    pub space_type: SpaceType,
    pub energy_level: EnergyLevel,
    pub equipment: Equipment,
}

impl WorkoutPreferences {
    /// Build preferences, rejecting session lengths the questionnaire doesn't offer
    pub fn new(
        time_minutes: u32,
        space_type: SpaceType,
        energy_level: EnergyLevel,
        equipment: Equipment,
    ) -> Result<Self> {
        let prefs = Self {
            time_minutes,
            space_type,
            energy_level,
            equipment,
        };
        prefs.validate()?;
        Ok(prefs)
    }

    /// Boundary check; the generator itself trusts its input
    pub fn validate(&self) -> Result<()> {
        if !ALLOWED_TIME_MINUTES.contains(&self.time_minutes) {
            return Err(Error::InvalidPreferences(format!(
                "time must be one of {:?} minutes, got {}",
                ALLOWED_TIME_MINUTES, self.time_minutes
            )));
        }
        Ok(())
    }
}

// ============================================================================
// AI Request Types
// ============================================================================

/// Room size for AI generation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SpaceSize {
    Small,
    Big,
}

/// Requested intensity for AI generation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Light,
    Moderate,
    Intense,
}

/// Training focus for AI generation
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FocusArea {
    UpperBody,
    LowerBody,
    Core,
    FullBody,
    Cardio,
    Functional,
    Mobility,
}

/// Longest session the AI endpoint is asked for
pub const MAX_AI_DURATION_MINUTES: u32 = 120;

/// Request body sent to the hosted workout generator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AiWorkoutRequest {
    pub space_size: SpaceSize,
    pub has_weights: bool,
    pub intensity: Intensity,
    #[serde(rename = "duration", alias = "durationMinutes")]
    pub duration_minutes: u32,
    pub focus_area: FocusArea,
    #[serde(default)]
    pub notes: String,
}

impl AiWorkoutRequest {
    pub fn validate(&self) -> Result<()> {
        if self.duration_minutes == 0 || self.duration_minutes > MAX_AI_DURATION_MINUTES {
            return Err(Error::InvalidPreferences(format!(
                "duration must be between 1 and {} minutes, got {}",
                MAX_AI_DURATION_MINUTES, self.duration_minutes
            )));
        }
        Ok(())
    }

    /// Questionnaire-equivalent preferences recorded on AI workouts
    pub fn to_preferences(&self) -> WorkoutPreferences {
        WorkoutPreferences {
            time_minutes: self.duration_minutes,
            space_type: match self.space_size {
                SpaceSize::Small => SpaceType::Tight,
                SpaceSize::Big => SpaceType::Normal,
            },
            energy_level: self.energy_level(),
            equipment: self.equipment(),
        }
    }

    /// Weights stand in for the chair slot of the local equipment model
    pub fn equipment(&self) -> Equipment {
        if self.has_weights {
            Equipment::Chair
        } else {
            Equipment::None
        }
    }

    pub fn energy_level(&self) -> EnergyLevel {
        match self.intensity {
            Intensity::Light => EnergyLevel::Low,
            Intensity::Moderate => EnergyLevel::Medium,
            Intensity::Intense => EnergyLevel::High,
        }
    }
}

// ============================================================================
// Workout
// ============================================================================

/// A generated, ordered, time-bounded exercise sequence
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workout {
    pub id: Uuid,
    pub exercises: Vec<Exercise>,
    #[serde(alias = "totalDuration")]
    pub total_duration_seconds: u32,
    pub estimated_calories: u32,
    pub preferences: WorkoutPreferences,
}

impl Workout {
    /// Sum of exercise durations; equals `total_duration_seconds` for generated workouts
    pub fn exercise_seconds(&self) -> u32 {
        self.exercises.iter().map(|e| e.duration_seconds).sum()
    }
}

// ============================================================================
// Stats and Saved Workouts
// ============================================================================

/// Lifetime workout stats
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub streak: u32,
    pub total_workouts: u32,
    pub total_minutes: u32,
    #[serde(default)]
    pub last_workout_date: Option<NaiveDate>,
}

/// A named workout kept for replay
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SavedWorkout {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub workout: Workout,
    pub preferences: WorkoutPreferences,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub times_completed: u32,
}

impl SavedWorkout {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, workout: Workout) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            name: name.into(),
            preferences: workout.preferences.clone(),
            workout,
            saved_at: Utc::now(),
            times_completed: 0,
        }
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The exercise library the generator draws from
///
/// Kept as an ordered list so seeded generation is reproducible.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub exercises: Vec<Exercise>,
}

// ============================================================================
// Text Parsing
// ============================================================================

macro_rules! text_enum {
    ($ty:ident, $what:literal, { $($text:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(Error::InvalidPreferences(format!(
                        "unknown {} '{}'",
                        $what, other
                    ))),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $($ty::$variant => $text,)+
                };
                f.write_str(text)
            }
        }
    };
}

text_enum!(SpaceType, "space type", {
    "tight" => Tight,
    "normal" => Normal,
    "outdoor" => Outdoor,
});

text_enum!(EnergyLevel, "energy level", {
    "low" => Low,
    "medium" => Medium,
    "high" => High,
});

text_enum!(Equipment, "equipment", {
    "none" => None,
    "chair" => Chair,
    "wall" => Wall,
});

text_enum!(SpaceRequirement, "space requirement", {
    "minimal" => Minimal,
    "normal" => Normal,
    "large" => Large,
});

text_enum!(BodyFocus, "body focus", {
    "upper" => Upper,
    "lower" => Lower,
    "core" => Core,
    "cardio" => Cardio,
    "flexibility" => Flexibility,
});

text_enum!(SpaceSize, "space size", {
    "small" => Small,
    "big" => Big,
});

text_enum!(Intensity, "intensity", {
    "light" => Light,
    "moderate" => Moderate,
    "intense" => Intense,
});

text_enum!(FocusArea, "focus area", {
    "upper-body" => UpperBody,
    "lower-body" => LowerBody,
    "core" => Core,
    "full-body" => FullBody,
    "cardio" => Cardio,
    "functional" => Functional,
    "mobility" => Mobility,
});
