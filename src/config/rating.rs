//! Rating policy configuration
//!
//! Every tunable of the chronological pass lives here. Variants of the
//! engine (live window, eliminated down-weighting, clean-only updates,
//! cross-size normalization, podium quality factor) are options on this
//! structure rather than separate code paths.

use crate::error::{RatingError, Result};
use crate::rating::weng_lin::WengLinModelConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How eliminated entries take part in a round update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EliminatedPolicy {
    /// Eliminated entries share last place with full weight
    SharedLast,
    /// Eliminated entries share last place with a weight that shrinks as
    /// the round's elimination rate rises: `max(min, base * (1 - rate))`
    DownWeighted { base: f64, min: f64 },
    /// Eliminated entries are dropped from the round before gating
    Ignored,
}

impl EliminatedPolicy {
    /// Weight applied to an eliminated entry in a round with the given counts
    pub fn eliminated_weight(&self, eliminated: usize, field_size: usize) -> f64 {
        match self {
            EliminatedPolicy::SharedLast | EliminatedPolicy::Ignored => 1.0,
            EliminatedPolicy::DownWeighted { base, min } => {
                if field_size == 0 {
                    return *base;
                }
                let rate = eliminated as f64 / field_size as f64;
                (base * (1.0 - rate)).max(*min)
            }
        }
    }

    pub fn includes_eliminated(&self) -> bool {
        !matches!(self, EliminatedPolicy::Ignored)
    }
}

/// Weight for one competition tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierWeight {
    pub tier: u8,
    pub weight: f64,
}

/// Optional competition-importance weighting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierWeighting {
    pub enabled: bool,
    /// Tiers not listed weigh 1.0
    pub weights: Vec<TierWeight>,
}

impl TierWeighting {
    pub fn weight_for(&self, tier: u8) -> f64 {
        if !self.enabled {
            return 1.0;
        }
        self.weights
            .iter()
            .find(|w| w.tier == tier)
            .map(|w| w.weight)
            .unwrap_or(1.0)
    }
}

impl Default for TierWeighting {
    fn default() -> Self {
        Self {
            enabled: false,
            weights: vec![
                TierWeight { tier: 1, weight: 2.0 },
                TierWeight { tier: 2, weight: 1.5 },
                TierWeight { tier: 3, weight: 1.0 },
                TierWeight { tier: 4, weight: 0.7 },
            ],
        }
    }
}

/// Public score transform: `base + scale * (mu - sigma_multiplier * sigma)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub base: f64,
    pub scale: f64,
    pub sigma_multiplier: f64,
    /// Ratings with sigma at or above this are provisional
    pub provisional_sigma: f64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            base: 1000.0,
            scale: 40.0,
            sigma_multiplier: 3.0,
            provisional_sigma: 4.0,
        }
    }
}

/// Percentile tier cut points, as cumulative top fractions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub elite_top: f64,
    pub champion_top: f64,
    pub expert_top: f64,
    /// Teams with fewer runs are left out of tiers and leaderboards
    pub min_runs_for_ranking: u32,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            elite_top: 0.02,
            champion_top: 0.10,
            expert_top: 0.30,
            min_runs_for_ranking: 5,
        }
    }
}

/// Cross-size normalization target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationSettings {
    pub target_mean: f64,
    pub target_std: f64,
    /// Categories whose spread is below this are left untouched
    pub min_std: f64,
}

impl Default for NormalizationSettings {
    fn default() -> Self {
        Self {
            target_mean: 1500.0,
            target_std: 150.0,
            min_std: 1.0,
        }
    }
}

/// Podium quality factor: `base + range * clamp01(top3_pct / top3_target_pct)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityFactorSettings {
    pub base: f64,
    pub range: f64,
    pub top3_target_pct: f64,
}

impl Default for QualityFactorSettings {
    fn default() -> Self {
        Self {
            base: 0.85,
            range: 0.20,
            top3_target_pct: 50.0,
        }
    }
}

/// Complete rating policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub model: WengLinModelConfig,
    /// Rounds with fewer distinct teams leave every rating untouched
    pub min_field_size: usize,
    /// Multiplier applied to sigma after every rated round
    pub sigma_decay: f64,
    /// Floor for sigma after decay
    pub sigma_min: f64,
    pub eliminated: EliminatedPolicy,
    pub tier_weighting: TierWeighting,
    /// Only competitions within this many days of the latest one are rated
    pub live_window_days: Option<i64>,
    pub display: DisplaySettings,
    pub tiers: TierSettings,
    pub normalization: Option<NormalizationSettings>,
    pub quality_factor: Option<QualityFactorSettings>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            model: WengLinModelConfig::default(),
            min_field_size: 6,
            sigma_decay: 0.95,
            sigma_min: 1.5,
            eliminated: EliminatedPolicy::SharedLast,
            tier_weighting: TierWeighting::default(),
            live_window_days: None,
            display: DisplaySettings::default(),
            tiers: TierSettings::default(),
            normalization: None,
            quality_factor: None,
        }
    }
}

/// Named rating policies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingPreset {
    Baseline,
    Live,
    Downweighted,
    CleanOnly,
}

impl RatingPreset {
    pub fn config(self) -> RatingConfig {
        match self {
            RatingPreset::Baseline => RatingConfig::default(),
            RatingPreset::Live => RatingConfig::live(),
            RatingPreset::Downweighted => RatingConfig::downweighted(),
            RatingPreset::CleanOnly => RatingConfig::clean_only(),
        }
    }
}

impl FromStr for RatingPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "baseline" => Ok(RatingPreset::Baseline),
            "live" => Ok(RatingPreset::Live),
            "downweighted" | "down_weighted" => Ok(RatingPreset::Downweighted),
            "clean_only" => Ok(RatingPreset::CleanOnly),
            other => Err(RatingError::ConfigurationError {
                message: format!("Unknown rating preset: {}", other),
            }
            .into()),
        }
    }
}

impl fmt::Display for RatingPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingPreset::Baseline => write!(f, "baseline"),
            RatingPreset::Live => write!(f, "live"),
            RatingPreset::Downweighted => write!(f, "downweighted"),
            RatingPreset::CleanOnly => write!(f, "clean_only"),
        }
    }
}

impl RatingConfig {
    /// Trailing two-year window with slower decay, major-event weighting,
    /// cross-size normalization and the podium quality factor
    pub fn live() -> Self {
        Self {
            sigma_decay: 0.99,
            tier_weighting: TierWeighting {
                enabled: true,
                weights: vec![TierWeight { tier: 1, weight: 1.2 }],
            },
            live_window_days: Some(730),
            display: DisplaySettings {
                sigma_multiplier: 1.0,
                provisional_sigma: 7.8,
                ..DisplaySettings::default()
            },
            normalization: Some(NormalizationSettings::default()),
            quality_factor: Some(QualityFactorSettings::default()),
            ..Self::default()
        }
    }

    /// Eliminated entries count less the more of the field was eliminated
    pub fn downweighted() -> Self {
        Self {
            eliminated: EliminatedPolicy::DownWeighted {
                base: 0.35,
                min: 0.10,
            },
            ..Self::default()
        }
    }

    /// Only clean finishes move ratings
    pub fn clean_only() -> Self {
        Self {
            eliminated: EliminatedPolicy::Ignored,
            tiers: TierSettings {
                min_runs_for_ranking: 4,
                ..TierSettings::default()
            },
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;

        if self.min_field_size < 2 {
            return Err(config_error("Minimum field size must be at least 2"));
        }
        if !(self.sigma_decay > 0.0 && self.sigma_decay <= 1.0) {
            return Err(config_error("Sigma decay must be in (0, 1]"));
        }
        if self.sigma_min <= 0.0 {
            return Err(config_error("Sigma minimum must be positive"));
        }
        if self.sigma_min > self.model.initial_sigma {
            return Err(config_error(
                "Sigma minimum cannot exceed the initial sigma",
            ));
        }
        if let EliminatedPolicy::DownWeighted { base, min } = &self.eliminated {
            if *base <= 0.0 || *min < 0.0 || min > base {
                return Err(config_error(
                    "Eliminated weighting needs base > 0 and 0 <= min <= base",
                ));
            }
        }
        if self.tier_weighting.weights.iter().any(|w| w.weight <= 0.0) {
            return Err(config_error("Tier weights must be positive"));
        }
        if matches!(self.live_window_days, Some(days) if days <= 0) {
            return Err(config_error("Live window must be a positive number of days"));
        }
        if self.display.scale <= 0.0 {
            return Err(config_error("Display scale must be positive"));
        }

        let t = &self.tiers;
        let ordered = 0.0 < t.elite_top
            && t.elite_top <= t.champion_top
            && t.champion_top <= t.expert_top
            && t.expert_top <= 1.0;
        if !ordered {
            return Err(config_error(
                "Tier fractions must satisfy 0 < elite <= champion <= expert <= 1",
            ));
        }

        if let Some(norm) = &self.normalization {
            if norm.target_std <= 0.0 {
                return Err(config_error("Normalization target std must be positive"));
            }
        }
        if let Some(quality) = &self.quality_factor {
            if quality.top3_target_pct <= 0.0 || quality.base + quality.range <= 0.0 {
                return Err(config_error("Quality factor settings are out of range"));
            }
        }

        Ok(())
    }
}

fn config_error(message: &str) -> anyhow::Error {
    RatingError::ConfigurationError {
        message: message.to_string(),
    }
    .into()
}
