//! Weng-Lin (OpenSkill) skill model
//!
//! This module provides the concrete `SkillModel` used by the engine, built
//! on the multi-team Weng-Lin update from the skillratings crate. Every team
//! is a single-member team; equal ranks are treated as ties.

use crate::error::{RatingError, Result};
use crate::rating::calculator::{apply_weight, validate_participants, Participant, SkillModel};
use crate::types::SkillRating;
use serde::{Deserialize, Serialize};
use skillratings::weng_lin::{weng_lin_multi_team, WengLinConfig, WengLinRating};
use skillratings::MultiTeamOutcome;
use tracing::warn;

/// Parameters of the Weng-Lin model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WengLinModelConfig {
    /// Skill class width
    pub beta: f64,
    /// Lower bound for the sigma shrink factor in one update
    pub uncertainty_tolerance: f64,
    /// Mean for new teams
    pub initial_mu: f64,
    /// Uncertainty for new teams
    pub initial_sigma: f64,
}

impl Default for WengLinModelConfig {
    fn default() -> Self {
        Self {
            beta: 25.0 / 6.0,
            uncertainty_tolerance: 0.0001,
            initial_mu: 25.0,
            initial_sigma: 25.0 / 3.0,
        }
    }
}

impl WengLinModelConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.beta <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Beta must be positive".to_string(),
            }
            .into());
        }

        if self.uncertainty_tolerance < 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Uncertainty tolerance must be non-negative".to_string(),
            }
            .into());
        }

        if self.initial_sigma <= 0.0 {
            return Err(RatingError::ConfigurationError {
                message: "Initial sigma must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }

    fn weng_lin_config(&self) -> WengLinConfig {
        WengLinConfig {
            beta: self.beta,
            uncertainty_tolerance: self.uncertainty_tolerance,
        }
    }
}

/// Weng-Lin skill model
#[derive(Debug)]
pub struct WengLinSkillModel {
    config: WengLinModelConfig,
}

impl WengLinSkillModel {
    /// Create a new Weng-Lin skill model
    pub fn new(config: WengLinModelConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }
}

impl SkillModel for WengLinSkillModel {
    fn rate(&self, participants: &[Participant]) -> Result<Vec<SkillRating>> {
        validate_participants(participants)?;

        let teams: Vec<[WengLinRating; 1]> = participants
            .iter()
            .map(|p| [p.rating.into()])
            .collect();

        let teams_and_ranks: Vec<(&[WengLinRating], MultiTeamOutcome)> = teams
            .iter()
            .zip(participants)
            .map(|(team, p)| (team.as_slice(), MultiTeamOutcome::new(p.rank as usize)))
            .collect();

        let updated = weng_lin_multi_team(&teams_and_ranks, &self.config.weng_lin_config());

        if updated.len() != participants.len() {
            warn!(
                "Skill model returned {} results for {} participants",
                updated.len(),
                participants.len()
            );
            return Err(RatingError::RatingCalculationFailed {
                reason: "Result count does not match participant count".to_string(),
            }
            .into());
        }

        let mut results = Vec::with_capacity(participants.len());
        for (p, team) in participants.iter().zip(&updated) {
            let new_rating: SkillRating = team
                .first()
                .copied()
                .map(Into::into)
                .ok_or_else(|| RatingError::RatingCalculationFailed {
                    reason: "Empty team in skill model result".to_string(),
                })?;
            results.push(apply_weight(p.rating, new_rating, p.weight));
        }

        Ok(results)
    }

    fn initial_rating(&self) -> SkillRating {
        SkillRating {
            mu: self.config.initial_mu,
            sigma: self.config.initial_sigma,
        }
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.config).unwrap_or(serde_json::Value::Null)
    }
}
