//! Error types for the rating engine
//!
//! Library functions return `anyhow::Result`; the variants below name the
//! failure kinds callers may want to match on after downcasting.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific rating scenarios
#[derive(Debug, thiserror::Error)]
pub enum RatingError {
    #[error("Invalid result row: {reason}")]
    InvalidRow { reason: String },

    #[error("Unknown competition: {competition_id}")]
    UnknownCompetition { competition_id: String },

    #[error("Competition registry error: {message}")]
    RegistryError { message: String },

    #[error("Rating calculation failed: {reason}")]
    RatingCalculationFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Export failed: {message}")]
    ExportFailed { message: String },
}
