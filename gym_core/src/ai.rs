//! Hosted (LLM-backed) workout generation.
//!
//! The endpoint receives an `AiWorkoutRequest` as JSON and answers with a list
//! of exercises. Any failure (transport, HTTP status, unusable body) falls
//! back to a fixed three-exercise workout so a workout is always available.
//! There is a single attempt per request.

use crate::config::AiConfig;
use crate::generator::estimate_calories;
use crate::{
    AiWorkoutRequest, BodyFocus, EnergyLevel, Equipment, Error, Exercise, ExerciseCategory,
    FocusArea, Intensity, Result, SpaceRequirement, SpaceSize, Workout,
};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Longest single exercise accepted from the endpoint
pub const MAX_EXERCISE_SECONDS: u32 = 3600;

/// Anything that can produce a workout for an AI request
pub trait WorkoutSource {
    fn generate(&self, request: &AiWorkoutRequest) -> Result<Workout>;
}

/// Workout source backed by an HTTP endpoint
pub struct HttpWorkoutSource {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpWorkoutSource {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }

    /// Build from config; `None` when no endpoint is configured
    pub fn from_config(config: &AiConfig) -> Result<Option<Self>> {
        config
            .endpoint
            .as_ref()
            .map(|endpoint| {
                Self::new(endpoint.clone(), Duration::from_secs(config.timeout_seconds))
            })
            .transpose()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl WorkoutSource for HttpWorkoutSource {
    fn generate(&self, request: &AiWorkoutRequest) -> Result<Workout> {
        tracing::info!("Requesting workout from {}", self.endpoint);

        let response = self.client.post(&self.endpoint).json(request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Generation(format!(
                "workout endpoint returned HTTP {}",
                status
            )));
        }

        let body = response.text()?;
        parse_response(&body, request)
    }
}

/// Ask `source` once, falling back to the fixed workout on any error
pub fn generate_with_fallback<S>(source: &S, request: &AiWorkoutRequest) -> Workout
where
    S: WorkoutSource + ?Sized,
{
    match source.generate(request) {
        Ok(workout) => workout,
        Err(e) => {
            tracing::warn!("AI workout generation failed, using fallback: {}", e);
            fallback_workout(request)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiWorkoutResponse {
    exercises: Vec<AiExercise>,
    #[serde(default)]
    total_duration: Option<u32>,
    #[serde(default)]
    estimated_calories: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiExercise {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default, alias = "durationSeconds")]
    duration: Option<u32>,
    #[serde(default)]
    reps: Option<u32>,
    #[serde(default)]
    instructions: String,
    #[serde(default)]
    form_tips: Vec<String>,
    #[serde(default)]
    category: Option<ExerciseCategory>,
    #[serde(default, alias = "restAfterSeconds")]
    rest_after: Option<u32>,
}

/// Turn an endpoint response body into a playable workout
///
/// The total is recomputed from the exercise durations; the endpoint's own
/// figure is only logged when it disagrees.
pub fn parse_response(body: &str, request: &AiWorkoutRequest) -> Result<Workout> {
    let response: AiWorkoutResponse = serde_json::from_str(body)?;

    if response.exercises.is_empty() {
        return Err(Error::Generation("endpoint returned no exercises".into()));
    }

    let energy = request.energy_level();
    let exercises = response
        .exercises
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let duration = raw
                .duration
                .filter(|d| (1..=MAX_EXERCISE_SECONDS).contains(d))
                .ok_or_else(|| {
                    Error::Generation(format!("exercise '{}' has no usable duration", raw.name))
                })?;

            Ok(Exercise {
                id: raw
                    .id
                    .unwrap_or_else(|| format!("{}-{}", request.focus_area, i + 1)),
                name: raw.name,
                duration_seconds: duration,
                reps: raw.reps,
                difficulty: difficulty_for(request.intensity),
                space_requirement: space_for(request.space_size),
                energy_level: energy,
                body_focus: focus_for(request.focus_area),
                equipment: request.equipment(),
                instructions: raw.instructions,
                rest_after_seconds: raw.rest_after.filter(|r| *r > 0),
                form_tips: raw.form_tips,
                category: raw.category,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let total_duration_seconds = exercises
        .iter()
        .try_fold(0u32, |total, e| total.checked_add(e.duration_seconds))
        .ok_or_else(|| Error::Generation("workout duration overflows".into()))?;
    if let Some(reported) = response.total_duration {
        if reported != total_duration_seconds {
            tracing::debug!(
                "Endpoint reported {}s, exercises sum to {}s",
                reported,
                total_duration_seconds
            );
        }
    }

    Ok(Workout {
        id: Uuid::new_v4(),
        exercises,
        total_duration_seconds,
        estimated_calories: response
            .estimated_calories
            .unwrap_or_else(|| estimate_calories(total_duration_seconds, Some(energy))),
        preferences: request.to_preferences(),
    })
}

/// Fixed warmup / main / cooldown workout used when generation fails
pub fn fallback_workout(request: &AiWorkoutRequest) -> Workout {
    let exercises = vec![
        Exercise {
            id: "warmup-1".into(),
            name: "Arm Circles".into(),
            duration_seconds: 30,
            reps: None,
            difficulty: 1,
            space_requirement: SpaceRequirement::Minimal,
            energy_level: EnergyLevel::Low,
            body_focus: BodyFocus::Flexibility,
            equipment: Equipment::None,
            instructions: "Stand with feet shoulder-width apart. Extend arms to sides and \
                           make small circles, gradually increasing size."
                .into(),
            rest_after_seconds: Some(10),
            form_tips: vec![
                "Keep shoulders relaxed".into(),
                "Start small and increase circle size".into(),
                "Maintain steady breathing".into(),
            ],
            category: Some(ExerciseCategory::Warmup),
        },
        Exercise {
            id: "main-1".into(),
            name: "Bodyweight Squats".into(),
            duration_seconds: 45,
            reps: Some(15),
            difficulty: 2,
            space_requirement: SpaceRequirement::Normal,
            energy_level: EnergyLevel::Medium,
            body_focus: BodyFocus::Lower,
            equipment: Equipment::None,
            instructions: "Stand with feet hip-width apart. Lower body by bending knees and \
                           pushing hips back."
                .into(),
            rest_after_seconds: Some(20),
            form_tips: vec![
                "Keep chest up".into(),
                "Weight on heels".into(),
                "Knees track over toes".into(),
                "Go down until thighs parallel".into(),
            ],
            category: Some(ExerciseCategory::Main),
        },
        Exercise {
            id: "cooldown-1".into(),
            name: "Forward Fold Stretch".into(),
            duration_seconds: 30,
            reps: None,
            difficulty: 1,
            space_requirement: SpaceRequirement::Normal,
            energy_level: EnergyLevel::Low,
            body_focus: BodyFocus::Flexibility,
            equipment: Equipment::None,
            instructions: "Stand tall and slowly fold forward, letting arms hang naturally."
                .into(),
            rest_after_seconds: None,
            form_tips: vec![
                "Bend from hips".into(),
                "Keep knees soft".into(),
                "Breathe deeply".into(),
                "Hold gentle stretch".into(),
            ],
            category: Some(ExerciseCategory::Cooldown),
        },
    ];

    let total_duration_seconds = exercises.iter().map(|e| e.duration_seconds).sum();

    Workout {
        id: Uuid::new_v4(),
        exercises,
        total_duration_seconds,
        estimated_calories: estimate_calories(
            total_duration_seconds,
            Some(request.energy_level()),
        ),
        preferences: request.to_preferences(),
    }
}

fn difficulty_for(intensity: Intensity) -> u8 {
    match intensity {
        Intensity::Light => 1,
        Intensity::Moderate => 2,
        Intensity::Intense => 3,
    }
}

fn space_for(size: SpaceSize) -> SpaceRequirement {
    match size {
        SpaceSize::Small => SpaceRequirement::Minimal,
        SpaceSize::Big => SpaceRequirement::Normal,
    }
}

fn focus_for(area: FocusArea) -> BodyFocus {
    match area {
        FocusArea::UpperBody => BodyFocus::Upper,
        FocusArea::LowerBody => BodyFocus::Lower,
        FocusArea::Core | FocusArea::Functional => BodyFocus::Core,
        FocusArea::FullBody | FocusArea::Cardio => BodyFocus::Cardio,
        FocusArea::Mobility => BodyFocus::Flexibility,
    }
}
