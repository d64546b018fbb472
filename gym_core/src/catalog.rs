//! Default exercise catalog.
//!
//! The built-in exercises are quick, household-friendly movements. The catalog
//! is built once from a fixed seed table and shared read-only afterwards.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Exercises returned when nothing in the catalog matches the preferences
pub const FALLBACK_EXERCISE_IDS: [&str; 3] = ["arm-circles", "calf-raises", "neck-rolls"];

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

struct Seed {
    id: &'static str,
    name: &'static str,
    duration: u32,
    reps: Option<u32>,
    difficulty: u8,
    space: SpaceRequirement,
    energy: EnergyLevel,
    focus: BodyFocus,
    equipment: Equipment,
    instructions: &'static str,
}

use BodyFocus::*;
use EnergyLevel::{High, Low, Medium};
use SpaceRequirement::Minimal;

const SEEDS: &[Seed] = &[
    // Desk/office stretches
    Seed {
        id: "neck-rolls",
        name: "Neck Rolls",
        duration: 30,
        reps: None,
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Flexibility,
        equipment: Equipment::None,
        instructions: "Slowly roll your neck in circles, 5 times each direction",
    },
    Seed {
        id: "shoulder-shrugs",
        name: "Shoulder Shrugs",
        duration: 30,
        reps: None,
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Flexibility,
        equipment: Equipment::None,
        instructions: "Lift shoulders to ears, hold 2 seconds, release. Repeat 10 times",
    },
    Seed {
        id: "seated-spinal-twist",
        name: "Seated Spinal Twist",
        duration: 45,
        reps: None,
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Flexibility,
        equipment: Equipment::Chair,
        instructions: "Sit tall, twist gently to each side, hold 15 seconds",
    },
    // Bodyweight strength
    Seed {
        id: "push-ups",
        name: "Push-ups",
        duration: 45,
        reps: Some(10),
        difficulty: 2,
        space: SpaceRequirement::Normal,
        energy: Medium,
        focus: Upper,
        equipment: Equipment::None,
        instructions: "Standard or modified push-ups, maintain straight line",
    },
    Seed {
        id: "wall-push-ups",
        name: "Wall Push-ups",
        duration: 30,
        reps: Some(15),
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Upper,
        equipment: Equipment::Wall,
        instructions: "Stand arms length from wall, push against wall",
    },
    Seed {
        id: "squats",
        name: "Squats",
        duration: 45,
        reps: Some(15),
        difficulty: 2,
        space: SpaceRequirement::Normal,
        energy: Medium,
        focus: Lower,
        equipment: Equipment::None,
        instructions: "Feet shoulder-width apart, lower down like sitting in chair",
    },
    Seed {
        id: "chair-squats",
        name: "Chair Squats",
        duration: 30,
        reps: Some(10),
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Lower,
        equipment: Equipment::Chair,
        instructions: "Stand up and sit down from chair without using hands",
    },
    Seed {
        id: "lunges",
        name: "Lunges",
        duration: 60,
        reps: Some(12),
        difficulty: 2,
        space: SpaceRequirement::Normal,
        energy: Medium,
        focus: Lower,
        equipment: Equipment::None,
        instructions: "Step forward, lower back knee toward ground, alternate legs",
    },
    // Cardio bursts
    Seed {
        id: "jumping-jacks",
        name: "Jumping Jacks",
        duration: 30,
        reps: Some(20),
        difficulty: 2,
        space: SpaceRequirement::Normal,
        energy: High,
        focus: Cardio,
        equipment: Equipment::None,
        instructions: "Jump feet apart while raising arms overhead, repeat quickly",
    },
    Seed {
        id: "high-knees",
        name: "High Knees",
        duration: 30,
        reps: None,
        difficulty: 2,
        space: Minimal,
        energy: High,
        focus: Cardio,
        equipment: Equipment::None,
        instructions: "March in place, bringing knees up to waist level",
    },
    Seed {
        id: "mountain-climbers",
        name: "Mountain Climbers",
        duration: 30,
        reps: None,
        difficulty: 3,
        space: SpaceRequirement::Normal,
        energy: High,
        focus: Cardio,
        equipment: Equipment::None,
        instructions: "Plank position, alternate bringing knees to chest quickly",
    },
    Seed {
        id: "step-ups",
        name: "Step-ups",
        duration: 45,
        reps: Some(16),
        difficulty: 2,
        space: Minimal,
        energy: Medium,
        focus: Cardio,
        equipment: Equipment::Chair,
        instructions: "Step up onto chair, alternate legs, control the movement",
    },
    // Core
    Seed {
        id: "plank",
        name: "Plank",
        duration: 30,
        reps: None,
        difficulty: 2,
        space: SpaceRequirement::Normal,
        energy: Medium,
        focus: Core,
        equipment: Equipment::None,
        instructions: "Hold straight line from head to heels, engage core",
    },
    Seed {
        id: "dead-bug",
        name: "Dead Bug",
        duration: 45,
        reps: Some(12),
        difficulty: 2,
        space: SpaceRequirement::Normal,
        energy: Low,
        focus: Core,
        equipment: Equipment::None,
        instructions: "Lie on back, extend opposite arm and leg, alternate slowly",
    },
    Seed {
        id: "seated-leg-lifts",
        name: "Seated Leg Lifts",
        duration: 30,
        reps: Some(12),
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Core,
        equipment: Equipment::Chair,
        instructions: "Sit tall, lift one knee at a time, hold briefly",
    },
    // Flexibility
    Seed {
        id: "forward-fold",
        name: "Forward Fold",
        duration: 30,
        reps: None,
        difficulty: 1,
        space: SpaceRequirement::Normal,
        energy: Low,
        focus: Flexibility,
        equipment: Equipment::None,
        instructions: "Stand, slowly fold forward, let arms hang, gentle stretch",
    },
    Seed {
        id: "cat-cow",
        name: "Cat-Cow Stretch",
        duration: 45,
        reps: None,
        difficulty: 1,
        space: SpaceRequirement::Normal,
        energy: Low,
        focus: Flexibility,
        equipment: Equipment::None,
        instructions: "On hands and knees, arch and round spine slowly",
    },
    Seed {
        id: "hip-circles",
        name: "Hip Circles",
        duration: 30,
        reps: None,
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Flexibility,
        equipment: Equipment::None,
        instructions: "Hands on hips, make large circles with your hips",
    },
    // Variety
    Seed {
        id: "calf-raises",
        name: "Calf Raises",
        duration: 30,
        reps: Some(20),
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Lower,
        equipment: Equipment::None,
        instructions: "Rise up on toes, hold briefly, lower slowly",
    },
    Seed {
        id: "arm-circles",
        name: "Arm Circles",
        duration: 30,
        reps: None,
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Flexibility,
        equipment: Equipment::None,
        instructions: "Extend arms, make small to large circles, both directions",
    },
    Seed {
        id: "desk-push-ups",
        name: "Desk Push-ups",
        duration: 30,
        reps: Some(12),
        difficulty: 1,
        space: Minimal,
        energy: Low,
        focus: Upper,
        equipment: Equipment::Chair,
        instructions: "Hands on desk edge, push-up at an angle",
    },
];

impl From<&Seed> for Exercise {
    fn from(seed: &Seed) -> Self {
        Exercise {
            id: seed.id.into(),
            name: seed.name.into(),
            duration_seconds: seed.duration,
            reps: seed.reps,
            difficulty: seed.difficulty,
            space_requirement: seed.space,
            energy_level: seed.energy,
            body_focus: seed.focus,
            equipment: seed.equipment,
            instructions: seed.instructions.into(),
            rest_after_seconds: None,
            form_tips: Vec::new(),
            category: None,
        }
    }
}

fn build_default_catalog_internal() -> Catalog {
    Catalog {
        exercises: SEEDS.iter().map(Exercise::from).collect(),
    }
}

impl Catalog {
    pub fn new(exercises: Vec<Exercise>) -> Self {
        Self { exercises }
    }

    pub fn exercises(&self) -> &[Exercise] {
        &self.exercises
    }

    /// Look up an exercise by id
    pub fn get(&self, id: &str) -> Option<&Exercise> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for exercise in &self.exercises {
            if exercise.id.is_empty() {
                errors.push("Exercise has empty ID".to_string());
            } else if !seen.insert(exercise.id.as_str()) {
                errors.push(format!("Duplicate exercise ID '{}'", exercise.id));
            }
            if exercise.name.is_empty() {
                errors.push(format!("Exercise '{}' has empty name", exercise.id));
            }
            if exercise.duration_seconds == 0 {
                errors.push(format!("Exercise '{}' has zero duration", exercise.id));
            }
            if !(1..=3).contains(&exercise.difficulty) {
                errors.push(format!(
                    "Exercise '{}': difficulty {} outside 1..=3",
                    exercise.id, exercise.difficulty
                ));
            }
        }

        for id in FALLBACK_EXERCISE_IDS {
            if self.get(id).is_none() {
                errors.push(format!("Catalog is missing fallback exercise '{}'", id));
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_loads() {
        let catalog = build_default_catalog();
        assert_eq!(catalog.len(), 21);
        assert!(std::ptr::eq(get_default_catalog(), get_default_catalog()));
    }

    #[test]
    fn test_default_catalog_validates() {
        let catalog = build_default_catalog();
        let errors = catalog.validate();
        assert!(
            errors.is_empty(),
            "Default catalog has validation errors: {:?}",
            errors
        );
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = get_default_catalog();
        let lunges = catalog.get("lunges").unwrap();
        assert_eq!(lunges.name, "Lunges");
        assert_eq!(lunges.duration_seconds, 60);
        assert_eq!(lunges.reps, Some(12));
        assert!(catalog.get("burpees").is_none());
    }

    #[test]
    fn test_every_body_focus_is_represented() {
        let catalog = get_default_catalog();
        for focus in [Upper, Lower, Core, Cardio, Flexibility] {
            assert!(
                catalog.exercises().iter().any(|e| e.body_focus == focus),
                "No exercise for {:?}",
                focus
            );
        }
    }

    #[test]
    fn test_validate_flags_bad_entries() {
        let mut catalog = build_default_catalog();
        let mut dup = catalog.get("plank").unwrap().clone();
        dup.duration_seconds = 0;
        dup.difficulty = 4;
        catalog.exercises.push(dup);
        catalog.exercises.retain(|e| e.id != "calf-raises");

        let errors = catalog.validate();
        assert!(errors.iter().any(|e| e.contains("Duplicate exercise ID 'plank'")));
        assert!(errors.iter().any(|e| e.contains("zero duration")));
        assert!(errors.iter().any(|e| e.contains("difficulty 4")));
        assert!(errors.iter().any(|e| e.contains("fallback exercise 'calf-raises'")));
    }
}
