//! Skill-update primitive interface
//!
//! The engine never computes skill updates itself. It hands an ordered set of
//! participants to a `SkillModel` and receives one updated rating per
//! participant, in the same order.

use crate::error::{RatingError, Result};
use crate::types::SkillRating;
use serde::{Deserialize, Serialize};

/// One participant of a round as seen by the skill model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Rating before the round
    pub rating: SkillRating,
    /// Assigned rank, 1 = best; equal ranks are ties
    pub rank: u32,
    /// Multiplier for the size of the update (1.0 = normal)
    pub weight: f64,
}

/// Trait for multi-participant skill updates
pub trait SkillModel: Send + Sync {
    /// Update ratings from one finish order.
    ///
    /// # Arguments
    /// * `participants` - current rating, assigned rank and weight per entry
    ///
    /// # Returns
    /// Updated ratings in input order
    fn rate(&self, participants: &[Participant]) -> Result<Vec<SkillRating>>;

    /// Rating given to a team on its first appearance
    fn initial_rating(&self) -> SkillRating;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Check the shape of a participant list before rating it
pub fn validate_participants(participants: &[Participant]) -> Result<()> {
    if participants.len() < 2 {
        return Err(RatingError::RatingCalculationFailed {
            reason: format!(
                "A round needs at least 2 participants, got {}",
                participants.len()
            ),
        }
        .into());
    }

    if let Some(p) = participants.iter().find(|p| p.rank == 0) {
        return Err(RatingError::RatingCalculationFailed {
            reason: format!("Ranks are 1-based, got 0 for rating {:?}", p.rating),
        }
        .into());
    }

    if participants
        .iter()
        .any(|p| !p.weight.is_finite() || p.weight < 0.0)
    {
        return Err(RatingError::RatingCalculationFailed {
            reason: "Participant weights must be finite and non-negative".to_string(),
        }
        .into());
    }

    Ok(())
}

/// Scale the change from `original` to `updated` by `weight`
pub fn apply_weight(original: SkillRating, updated: SkillRating, weight: f64) -> SkillRating {
    if (weight - 1.0).abs() < 1e-12 {
        return updated;
    }

    SkillRating {
        mu: original.mu + weight * (updated.mu - original.mu),
        sigma: (original.sigma + weight * (updated.sigma - original.sigma)).max(0.0),
    }
}

/// Mock skill model for testing: returns ratings unchanged and records calls
#[derive(Debug, Default)]
pub struct MockSkillModel {
    calls: std::sync::Mutex<Vec<Vec<Participant>>>,
    initial_rating: SkillRating,
}

impl MockSkillModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all calls made (for testing)
    pub fn calls(&self) -> Vec<Vec<Participant>> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl SkillModel for MockSkillModel {
    fn rate(&self, participants: &[Participant]) -> Result<Vec<SkillRating>> {
        validate_participants(participants)?;

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(participants.to_vec());
        }

        Ok(participants.iter().map(|p| p.rating).collect())
    }

    fn initial_rating(&self) -> SkillRating {
        self.initial_rating
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "mock",
            "initial_mu": self.initial_rating.mu,
            "initial_sigma": self.initial_rating.sigma
        })
    }
}
