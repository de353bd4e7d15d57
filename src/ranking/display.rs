//! Public score transforms
//!
//! None of these feed back into rating state: they map a finished
//! `(mu, sigma)` snapshot onto the numbers shown in leaderboards.

use crate::config::{DisplaySettings, NormalizationSettings, QualityFactorSettings};
use crate::rating::TeamRating;
use crate::types::SkillRating;
use crate::utils::{clamp01, round1};
use serde::{Deserialize, Serialize};

/// `base + scale * (mu - k * sigma)`
pub fn displayed_rating(rating: SkillRating, display: &DisplaySettings) -> f64 {
    display.base + display.scale * (rating.mu - display.sigma_multiplier * rating.sigma)
}

pub fn is_provisional(sigma: f64, display: &DisplaySettings) -> bool {
    sigma >= display.provisional_sigma
}

/// Podium multiplier from the team's top-3 finish rate, taken at the one
/// decimal shown in the leaderboard
pub fn quality_factor(team: &TeamRating, settings: &QualityFactorSettings) -> f64 {
    let top3_pct = round1(team.top3_pct());
    settings.base + settings.range * clamp01(top3_pct / settings.top3_target_pct)
}

/// Linear map of one category's score distribution onto a shared target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    pub source_mean: f64,
    pub source_std: f64,
    pub target_mean: f64,
    pub target_std: f64,
}

impl Normalization {
    /// Fit on the scores of qualified teams.
    ///
    /// Returns `None` with fewer than two scores or when the population
    /// standard deviation is below `settings.min_std`; such categories keep
    /// their raw scores.
    pub fn fit(scores: &[f64], settings: &NormalizationSettings) -> Option<Self> {
        if scores.len() < 2 {
            return None;
        }
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let std = variance.sqrt();
        if std < settings.min_std {
            return None;
        }

        Some(Self {
            source_mean: mean,
            source_std: std,
            target_mean: settings.target_mean,
            target_std: settings.target_std,
        })
    }

    pub fn apply(&self, score: f64) -> f64 {
        let z = (score - self.source_mean) / self.source_std;
        round1(self.target_mean + self.target_std * z)
    }
}

/// Scores for one team before percentile tiering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredRating {
    /// Display transform of the current rating, unadjusted
    pub base: f64,
    pub quality_factor: f64,
    pub score: f64,
    pub previous_score: Option<f64>,
}

/// Displayed score of a team: transform, then quality factor, rounded
pub fn score_team(
    team: &TeamRating,
    display: &DisplaySettings,
    quality: Option<&QualityFactorSettings>,
) -> ScoredRating {
    let factor = quality.map_or(1.0, |q| quality_factor(team, q));
    let base = displayed_rating(team.rating, display);

    ScoredRating {
        base: round1(base),
        quality_factor: factor,
        score: round1(base * factor),
        previous_score: team
            .previous
            .map(|prev| round1(displayed_rating(prev, display) * factor)),
    }
}

impl ScoredRating {
    pub fn normalized(mut self, normalization: &Normalization) -> Self {
        self.score = normalization.apply(self.score);
        self.previous_score = self.previous_score.map(|p| normalization.apply(p));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TeamId;

    fn team(num_runs: u32, top3_runs: u32) -> TeamRating {
        let mut team = TeamRating::new(TeamId::new("h", "d"), SkillRating::default());
        team.num_runs = num_runs;
        team.finished_runs = num_runs;
        team.top3_runs = top3_runs;
        team
    }

    #[test]
    fn test_displayed_rating() {
        let display = DisplaySettings::default();
        let rating = SkillRating { mu: 30.0, sigma: 2.0 };
        assert!((displayed_rating(rating, &display) - 1960.0).abs() < 1e-9);

        let live = DisplaySettings {
            sigma_multiplier: 1.0,
            ..DisplaySettings::default()
        };
        assert!((displayed_rating(rating, &live) - 2120.0).abs() < 1e-9);
    }

    #[test]
    fn test_provisional_threshold_is_inclusive() {
        let display = DisplaySettings::default();
        assert!(is_provisional(4.0, &display));
        assert!(!is_provisional(3.99, &display));
    }

    #[test]
    fn test_quality_factor_range() {
        let settings = QualityFactorSettings::default();
        assert!((quality_factor(&team(10, 0), &settings) - 0.85).abs() < 1e-12);
        assert!((quality_factor(&team(10, 5), &settings) - 1.05).abs() < 1e-12);
        assert!((quality_factor(&team(10, 10), &settings) - 1.05).abs() < 1e-12);
        assert!((quality_factor(&team(10, 1), &settings) - 0.89).abs() < 1e-12);
    }

    #[test]
    fn test_quality_factor_uses_rounded_top3_rate() {
        let settings = QualityFactorSettings::default();
        // 1 of 3 runs is 33.333..%, shown and used as 33.3%
        let expected = 0.85 + 0.20 * 33.3 / 50.0;
        assert!((quality_factor(&team(3, 1), &settings) - expected).abs() < 1e-12);
        // 2 of 3 runs is 66.7%, past the 50% target
        assert!((quality_factor(&team(3, 2), &settings) - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_normalization_fit() {
        let settings = NormalizationSettings::default();
        let norm = Normalization::fit(&[1000.0, 1200.0], &settings).unwrap();
        assert_eq!(norm.source_mean, 1100.0);
        assert_eq!(norm.source_std, 100.0);
        assert_eq!(norm.apply(1200.0), 1650.0);
        assert_eq!(norm.apply(1100.0), 1500.0);
    }

    #[test]
    fn test_normalization_skips_degenerate_input() {
        let settings = NormalizationSettings::default();
        assert!(Normalization::fit(&[1000.0], &settings).is_none());
        assert!(Normalization::fit(&[1000.0, 1000.5], &settings).is_none());
    }

    #[test]
    fn test_score_team_applies_quality_to_previous() {
        let mut t = team(4, 2);
        t.previous = Some(SkillRating { mu: 25.0, sigma: 5.0 });
        t.rating = SkillRating { mu: 26.0, sigma: 4.0 };
        let display = DisplaySettings::default();
        let quality = QualityFactorSettings::default();

        let scored = score_team(&t, &display, Some(&quality));
        assert!((scored.quality_factor - 1.05).abs() < 1e-12);
        assert_eq!(scored.base, 1560.0);
        assert_eq!(scored.score, 1638.0);
        assert_eq!(scored.previous_score, Some(1470.0));
    }
}
