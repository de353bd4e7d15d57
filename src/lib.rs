//! ADW Rating - skill ratings for handler and dog agility teams
//!
//! This crate turns per-round competition results from independently-run
//! events into one Weng-Lin rating per team and size category, resolving
//! the many spellings a team appears under along the way.

pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod ranking;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{RatingError, Result};
pub use types::*;

// Re-export key components
pub use pipeline::{PipelineReport, RatingPipeline};
pub use rating::{RatingEngine, SkillModel};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
