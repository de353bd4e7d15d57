//! Percentile skill tiers
//!
//! Cut points are recomputed from scratch for every snapshot using
//! nearest-rank indexing over the ascending score list, so the result does
//! not depend on iteration order.

use crate::config::TierSettings;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillTier {
    Elite,
    Champion,
    Expert,
    Competitor,
}

impl SkillTier {
    pub fn label(self) -> &'static str {
        match self {
            SkillTier::Elite => "Elite",
            SkillTier::Champion => "Champion",
            SkillTier::Expert => "Expert",
            SkillTier::Competitor => "Competitor",
        }
    }
}

impl fmt::Display for SkillTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score at `floor((n - 1) * percentile)` of the ascending list; `None`
/// when there are no scores
pub fn percentile_threshold(scores: &[f64], percentile: f64) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);
    let idx = ((sorted.len() - 1) as f64 * percentile).floor() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

/// Minimum scores for each tier in one size category. A category without
/// qualified teams has no cut points and everyone is a Competitor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub elite_min: Option<f64>,
    pub champion_min: Option<f64>,
    pub expert_min: Option<f64>,
}

impl TierThresholds {
    pub fn compute(scores: &[f64], settings: &TierSettings) -> Self {
        Self {
            elite_min: percentile_threshold(scores, 1.0 - settings.elite_top),
            champion_min: percentile_threshold(scores, 1.0 - settings.champion_top),
            expert_min: percentile_threshold(scores, 1.0 - settings.expert_top),
        }
    }

    /// Highest tier whose cut point `score` meets
    pub fn classify(&self, score: f64) -> SkillTier {
        let meets = |cut: Option<f64>| cut.is_some_and(|min| score >= min);
        if meets(self.elite_min) {
            SkillTier::Elite
        } else if meets(self.champion_min) {
            SkillTier::Champion
        } else if meets(self.expert_min) {
            SkillTier::Expert
        } else {
            SkillTier::Competitor
        }
    }
}
