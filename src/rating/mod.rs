//! Rating system built on the Weng-Lin (OpenSkill) algorithm
//!
//! This module batches runs into rounds, feeds each round to a skill model
//! and keeps one rating table per size category.

pub mod batcher;
pub mod calculator;
pub mod engine;
pub mod storage;
pub mod weng_lin;

// Re-export commonly used types
pub use batcher::{BatchStats, Round, RoundBatcher, RoundEntry, SkipReason};
pub use calculator::{apply_weight, MockSkillModel, Participant, SkillModel};
pub use engine::{CategoryRatings, CompetitionStats, LiveWindow, RatingEngine, RatingSnapshot};
pub use storage::{LastCompetition, RatingTable, TeamRating};
pub use weng_lin::{WengLinModelConfig, WengLinSkillModel};
