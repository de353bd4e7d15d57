//! Configuration management for the rating pipeline
//!
//! This module handles configuration loading from TOML files and
//! environment variables, validation, and default values.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, InputSettings, ServiceSettings};
pub use rating::{
    DisplaySettings, EliminatedPolicy, NormalizationSettings, QualityFactorSettings,
    RatingConfig, RatingPreset, TierSettings, TierWeight, TierWeighting,
};
