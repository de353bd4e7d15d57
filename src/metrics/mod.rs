//! Metrics for the rating pipeline

pub mod collector;

pub use collector::{PipelineMetrics, StageTimer};
