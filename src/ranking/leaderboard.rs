//! Leaderboard assembly
//!
//! Turns a finished rating snapshot plus team profiles into ranked rows per
//! size category. Only teams with enough runs are listed; the same subset
//! drives normalization fitting and tier cut points.

use crate::config::RatingConfig;
use crate::identity::TeamProfile;
use crate::ranking::display::{is_provisional, score_team, Normalization, ScoredRating};
use crate::ranking::tiers::{SkillTier, TierThresholds};
use crate::rating::{RatingSnapshot, RatingTable, TeamRating};
use crate::types::{SizeCategory, TeamId};
use crate::utils::round1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// One row of a size-category leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub team_id: TeamId,
    pub handler: String,
    pub call_name: String,
    pub registered_name: String,
    pub dog: String,
    pub country: String,
    pub size: SizeCategory,
    pub mu: f64,
    pub sigma: f64,
    pub rating: f64,
    pub previous_rating: Option<f64>,
    pub quality_factor: f64,
    pub tier: SkillTier,
    pub provisional: bool,
    pub num_runs: u32,
    pub finished_pct: f64,
    pub top3_pct: f64,
    pub top10_pct: f64,
    pub last_competition: String,
}

impl LeaderboardEntry {
    /// Change in displayed rating since the previous round
    pub fn trend(&self) -> Option<f64> {
        self.previous_rating.map(|prev| round1(self.rating - prev))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLeaderboard {
    pub size: SizeCategory,
    /// Every team with a rating, listed or not
    pub rated_teams: usize,
    pub thresholds: TierThresholds,
    pub normalization: Option<Normalization>,
    pub entries: Vec<LeaderboardEntry>,
}

impl CategoryLeaderboard {
    pub fn top(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn tier_counts(&self) -> BTreeMap<SkillTier, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.tier).or_insert(0) += 1;
        }
        counts
    }
}

/// Leaderboards in display order (Large, Intermediate, Medium, Small)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub categories: Vec<CategoryLeaderboard>,
}

impl Leaderboard {
    pub fn build(
        snapshot: &RatingSnapshot,
        profiles: &BTreeMap<TeamId, TeamProfile>,
        config: &RatingConfig,
    ) -> Self {
        let categories = SizeCategory::DISPLAY_ORDER
            .iter()
            .filter_map(|size| snapshot.category(*size))
            .map(|category| build_category(&category.table, profiles, config))
            .collect();

        Self { categories }
    }

    pub fn category(&self, size: SizeCategory) -> Option<&CategoryLeaderboard> {
        self.categories.iter().find(|c| c.size == size)
    }

    /// Rows of every category in display order
    pub fn entries(&self) -> impl Iterator<Item = &LeaderboardEntry> {
        self.categories.iter().flat_map(|c| c.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|c| c.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn build_category(
    table: &RatingTable,
    profiles: &BTreeMap<TeamId, TeamProfile>,
    config: &RatingConfig,
) -> CategoryLeaderboard {
    let min_runs = config.tiers.min_runs_for_ranking;
    let quality = config.quality_factor.as_ref();

    let mut qualified: Vec<(&TeamRating, ScoredRating)> = table
        .iter()
        .filter(|team| team.num_runs >= min_runs)
        .map(|team| (team, score_team(team, &config.display, quality)))
        .collect();

    let normalization = config.normalization.as_ref().and_then(|settings| {
        let scores: Vec<f64> = qualified.iter().map(|(_, s)| s.score).collect();
        Normalization::fit(&scores, settings)
    });
    if let Some(norm) = &normalization {
        info!(
            "{}: normalized (mean {:.0} -> {:.0}, std {:.0} -> {:.0})",
            table.size(),
            norm.source_mean,
            norm.target_mean,
            norm.source_std,
            norm.target_std
        );
        for (_, scored) in qualified.iter_mut() {
            *scored = scored.normalized(norm);
        }
    }

    let scores: Vec<f64> = qualified.iter().map(|(_, s)| s.score).collect();
    let thresholds = TierThresholds::compute(&scores, &config.tiers);

    qualified.sort_by(|(a, sa), (b, sb)| {
        sb.score
            .total_cmp(&sa.score)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });

    let entries = qualified
        .into_iter()
        .enumerate()
        .map(|(idx, (team, scored))| {
            let profile = profiles.get(&team.team_id);
            let (call_name, registered_name, country) = profile
                .map(|p| (p.call_name.clone(), p.registered_name.clone(), p.country.clone()))
                .unwrap_or_default();
            LeaderboardEntry {
                rank: idx + 1,
                team_id: team.team_id.clone(),
                handler: profile
                    .map(|p| p.handler_display.clone())
                    .unwrap_or_else(|| team.team_id.handler.clone()),
                call_name,
                registered_name,
                dog: profile
                    .map(|p| p.dog_display.clone())
                    .unwrap_or_else(|| team.team_id.animal.clone()),
                country,
                size: table.size(),
                mu: team.rating.mu,
                sigma: team.rating.sigma,
                rating: scored.score,
                previous_rating: scored.previous_score,
                quality_factor: scored.quality_factor,
                tier: thresholds.classify(scored.score),
                provisional: is_provisional(team.rating.sigma, &config.display),
                num_runs: team.num_runs,
                finished_pct: round1(team.finished_pct()),
                top3_pct: round1(team.top3_pct()),
                top10_pct: round1(team.top10_pct()),
                last_competition: team
                    .last_competition
                    .as_ref()
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
            }
        })
        .collect::<Vec<_>>();

    if let Some(top) = entries.first() {
        info!(
            "{}: {} ranked of {} rated, top {} / {} ({}) {:.1}",
            table.size(),
            entries.len(),
            table.len(),
            top.handler,
            top.dog,
            top.country,
            top.rating
        );
    }

    CategoryLeaderboard {
        size: table.size(),
        rated_teams: table.len(),
        thresholds,
        normalization,
        entries,
    }
}
