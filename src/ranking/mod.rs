//! Public view of a rating snapshot: display scores, tiers, leaderboards
//! and export

pub mod display;
pub mod export;
pub mod leaderboard;
pub mod tiers;

pub use display::{
    displayed_rating, is_provisional, quality_factor, score_team, Normalization, ScoredRating,
};
pub use export::{export_csv, export_json, write_csv, write_json};
pub use leaderboard::{CategoryLeaderboard, Leaderboard, LeaderboardEntry};
pub use tiers::{percentile_threshold, SkillTier, TierThresholds};
