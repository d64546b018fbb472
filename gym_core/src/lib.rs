#![forbid(unsafe_code)]

//! Workout generation and session timing for vibegym.
//!
//! This crate provides:
//! - Domain types (exercises, preferences, workouts, stats)
//! - The built-in exercise catalog
//! - Rule-based workout generator
//! - Session state machine and its tick runner
//! - Hosted AI generation with local fallback
//! - Persistence of stats and saved workouts

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod generator;
pub mod session;
pub mod runner;
pub mod ai;
pub mod stats;
pub mod store;
pub mod identity;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use generator::{generate_workout, generate_workout_default};
pub use session::{format_time, Phase, Session, SessionEvent, SessionOutcome, SessionState};
pub use runner::{Control, SessionHandle, SessionRunner};
pub use ai::{generate_with_fallback, HttpWorkoutSource, WorkoutSource};
pub use store::{JsonFileStore, StatsStore, WorkoutStore};
pub use identity::{require_user, Identity, StaticIdentity, User};
