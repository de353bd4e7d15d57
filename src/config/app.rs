//! Main application configuration
//!
//! This module defines the top-level configuration for the rating run:
//! where results and the competition registry live, where output goes, and
//! which rating policy to apply. Values come from a TOML file or from
//! environment variables, with defaults for everything.

use crate::config::rating::{RatingConfig, RatingPreset};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub input: InputSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Name used in logs and metric labels
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Input and output locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    /// Directory with one sub-directory of result CSV files per competition
    pub data_dir: PathBuf,
    /// TOML file listing known competitions
    pub registry_path: PathBuf,
    /// Optional TOML file extending the built-in alias tables
    pub aliases_path: Option<PathBuf>,
    /// Directory for the exported leaderboard
    pub output_dir: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "adw-rating".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            registry_path: PathBuf::from("data/competitions.toml"),
            aliases_path: None,
            output_dir: PathBuf::from("output"),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        Self::load(None, None)
    }

    /// Load configuration from a TOML file. Environment variables still
    /// override values from the file.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::load(Some(path), None)
    }

    /// Load from an optional file, then apply environment overrides.
    ///
    /// `preset` replaces `RATING_PRESET`; either way the preset is applied
    /// before `MIN_FIELD_SIZE`, `SIGMA_DECAY` and `SIGMA_MIN`.
    pub fn load(path: Option<&Path>, preset: Option<RatingPreset>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok(), preset)?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, var: F, preset: Option<RatingPreset>) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Some(log_level) = var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        if let Some(dir) = var("DATA_DIR") {
            self.input.data_dir = PathBuf::from(dir);
        }
        if let Some(path) = var("REGISTRY_PATH") {
            self.input.registry_path = PathBuf::from(path);
        }
        if let Some(path) = var("ALIASES_PATH") {
            self.input.aliases_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = var("OUTPUT_DIR") {
            self.input.output_dir = PathBuf::from(dir);
        }

        // A preset replaces the whole policy; the knobs below refine it
        let preset = match (preset, var("RATING_PRESET")) {
            (Some(preset), _) => Some(preset),
            (None, Some(name)) => Some(name.parse::<RatingPreset>()?),
            (None, None) => None,
        };
        if let Some(preset) = preset {
            self.rating = preset.config();
        }
        if let Some(size) = var("MIN_FIELD_SIZE") {
            self.rating.min_field_size = size
                .parse()
                .map_err(|_| anyhow!("Invalid MIN_FIELD_SIZE value: {}", size))?;
        }
        if let Some(decay) = var("SIGMA_DECAY") {
            self.rating.sigma_decay = decay
                .parse()
                .map_err(|_| anyhow!("Invalid SIGMA_DECAY value: {}", decay))?;
        }
        if let Some(sigma_min) = var("SIGMA_MIN") {
            self.rating.sigma_min = sigma_min
                .parse()
                .map_err(|_| anyhow!("Invalid SIGMA_MIN value: {}", sigma_min))?;
        }

        Ok(())
    }

    /// Path of the CSV leaderboard inside the output directory
    pub fn ratings_csv_path(&self) -> PathBuf {
        self.input.output_dir.join("ratings.csv")
    }

    /// Path of the JSON leaderboard inside the output directory
    pub fn ratings_json_path(&self) -> PathBuf {
        self.input.output_dir.join("ratings.json")
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.trim().is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }
    if config.input.data_dir.as_os_str().is_empty() {
        return Err(anyhow!("Data directory cannot be empty"));
    }
    if config.input.registry_path.as_os_str().is_empty() {
        return Err(anyhow!("Registry path cannot be empty"));
    }
    if config.input.output_dir.as_os_str().is_empty() {
        return Err(anyhow!("Output directory cannot be empty"));
    }

    config.rating.validate()?;

    Ok(())
}
