//! Configuration file support for vibegym.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/vibegym/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub ai: AiConfig,

    #[serde(default)]
    pub user: UserConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Local generator tuning
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Seconds held back from the time budget for transitions
    #[serde(default = "default_transition_buffer_seconds")]
    pub transition_buffer_seconds: u32,

    #[serde(default = "default_max_exercises")]
    pub max_exercises: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            transition_buffer_seconds: default_transition_buffer_seconds(),
            max_exercises: default_max_exercises(),
        }
    }
}

/// Session timer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
        }
    }
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

/// Hosted workout generator configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiConfig {
    /// Endpoint URL; AI generation falls back to the local workout when unset
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_ai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: default_ai_timeout_seconds(),
        }
    }
}

/// Signed-in user, as provided by the identity service
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("vibegym")
}

fn default_transition_buffer_seconds() -> u32 {
    15
}

fn default_max_exercises() -> usize {
    4
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_ai_timeout_seconds() -> u64 {
    30
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings the generator can't honour
    pub fn validate(&self) -> Result<()> {
        if self.generator.max_exercises == 0 {
            return Err(Error::Config(
                "generator.max_exercises must be at least 1".into(),
            ));
        }
        if self.ai.timeout_seconds == 0 {
            return Err(Error::Config("ai.timeout_seconds must be positive".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("vibegym").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
