//! Chronological rating pass
//!
//! The engine runs one independent pass per size category. Each pass walks
//! the batched rounds in order and, per round:
//!
//! 1. creates ratings for teams seen for the first time,
//! 2. weights each entry (competition tier, eliminated down-weighting),
//! 3. hands the ordered entries to the `SkillModel`,
//! 4. decays every returned sigma and clamps it to the configured floor,
//! 5. records the run on each team.
//!
//! The pass is a pure function of its input: running it twice over the same
//! runs yields identical state.

use crate::config::RatingConfig;
use crate::error::Result;
use crate::rating::batcher::{BatchStats, Round, RoundBatcher, RoundEntry};
use crate::rating::calculator::{Participant, SkillModel};
use crate::rating::storage::RatingTable;
use crate::rating::weng_lin::WengLinSkillModel;
use crate::types::{CompetitionId, RunResult, SizeCategory, SkillRating, TeamId};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Trailing window of competitions included in a live pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveWindow {
    /// Earliest included competition date
    pub cutoff: NaiveDate,
    /// Date of the most recent competition in the input
    pub latest: NaiveDate,
}

impl LiveWindow {
    /// Window of `days` ending at the latest competition in `runs`
    pub fn ending_at_latest(runs: &[RunResult], days: i64) -> Option<Self> {
        let latest = runs.iter().map(|r| r.competition_date).max()?;
        Some(Self {
            cutoff: latest - Duration::days(days),
            latest,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.cutoff
    }
}

/// Participation summary of one competition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitionStats {
    pub id: CompetitionId,
    pub name: String,
    pub date: NaiveDate,
    pub tier: u8,
    pub rounds_rated: usize,
    pub total_entries: usize,
    pub finished_entries: usize,
    /// Distinct rated teams per size category
    pub teams_by_size: BTreeMap<SizeCategory, usize>,
}

/// Final state of one size category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRatings {
    pub table: RatingTable,
    pub stats: BatchStats,
}

/// Everything a full pass produces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSnapshot {
    pub categories: BTreeMap<SizeCategory, CategoryRatings>,
    pub competitions: BTreeMap<CompetitionId, CompetitionStats>,
    pub window: Option<LiveWindow>,
}

impl RatingSnapshot {
    pub fn category(&self, size: SizeCategory) -> Option<&CategoryRatings> {
        self.categories.get(&size)
    }

    pub fn total_teams(&self) -> usize {
        self.categories.values().map(|c| c.table.len()).sum()
    }
}

#[derive(Default)]
struct CompetitionTally {
    rounds_rated: usize,
    total_entries: usize,
    finished_entries: usize,
    teams: BTreeMap<SizeCategory, BTreeSet<TeamId>>,
    meta: Option<(String, NaiveDate, u8)>,
}

/// Rating engine: configuration, skill model and round batcher
pub struct RatingEngine {
    config: RatingConfig,
    model: Box<dyn SkillModel>,
    batcher: RoundBatcher,
}

impl RatingEngine {
    /// Engine backed by the Weng-Lin model described by `config.model`
    pub fn new(config: RatingConfig) -> Result<Self> {
        let model = WengLinSkillModel::new(config.model.clone())?;
        Self::with_model(config, Box::new(model))
    }

    /// Engine backed by any skill model
    pub fn with_model(config: RatingConfig, model: Box<dyn SkillModel>) -> Result<Self> {
        config.validate()?;
        let batcher = RoundBatcher::from_config(&config);
        Ok(Self {
            config,
            model,
            batcher,
        })
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    pub fn model(&self) -> &dyn SkillModel {
        self.model.as_ref()
    }

    /// Rate every size category present in `runs`
    pub fn run(&self, runs: &[RunResult]) -> Result<RatingSnapshot> {
        let window = self
            .config
            .live_window_days
            .and_then(|days| LiveWindow::ending_at_latest(runs, days));
        if let Some(w) = &window {
            info!(
                "Live window {} .. {} ({} days)",
                w.cutoff,
                w.latest,
                (w.latest - w.cutoff).num_days()
            );
        }

        let mut by_size: BTreeMap<SizeCategory, Vec<&RunResult>> = BTreeMap::new();
        for run in runs {
            if window.map_or(true, |w| w.contains(run.competition_date)) {
                by_size.entry(run.size).or_default().push(run);
            }
        }

        let mut tallies: BTreeMap<CompetitionId, CompetitionTally> = BTreeMap::new();
        let mut categories = BTreeMap::new();
        for (size, size_runs) in by_size {
            let category = self.rate_category(size, size_runs, &mut tallies)?;
            categories.insert(size, category);
        }

        let competitions = tallies
            .into_iter()
            .filter_map(|(id, tally)| {
                let (name, date, tier) = tally.meta?;
                Some((
                    id.clone(),
                    CompetitionStats {
                        id,
                        name,
                        date,
                        tier,
                        rounds_rated: tally.rounds_rated,
                        total_entries: tally.total_entries,
                        finished_entries: tally.finished_entries,
                        teams_by_size: tally
                            .teams
                            .iter()
                            .map(|(size, teams)| (*size, teams.len()))
                            .collect(),
                    },
                ))
            })
            .collect();

        Ok(RatingSnapshot {
            categories,
            competitions,
            window,
        })
    }

    fn rate_category(
        &self,
        size: SizeCategory,
        runs: Vec<&RunResult>,
        tallies: &mut BTreeMap<CompetitionId, CompetitionTally>,
    ) -> Result<CategoryRatings> {
        let (rounds, stats) = self.batcher.batch(runs);
        let mut table = RatingTable::new(size);

        for round in &rounds {
            self.apply_round(&mut table, round)?;

            let tally = tallies.entry(round.competition_id.clone()).or_default();
            tally.rounds_rated += 1;
            tally.total_entries += round.entries.len();
            tally.finished_entries += round.clean_count();
            tally
                .teams
                .entry(size)
                .or_default()
                .extend(round.entries.iter().map(|e| e.team_id.clone()));
            tally.meta.get_or_insert_with(|| {
                (
                    round.competition_name.clone(),
                    round.competition_date,
                    round.competition_tier,
                )
            });
        }

        info!(
            "{}: rated {} teams over {} rounds ({} skipped)",
            size,
            table.len(),
            stats.rounds_emitted,
            stats.rounds_skipped()
        );
        if let Some(top) = table
            .iter()
            .max_by(|a, b| a.rating.mu.total_cmp(&b.rating.mu))
        {
            debug!(
                "{}: highest mu {} ({:.2}, sigma {:.2})",
                size, top.team_id, top.rating.mu, top.rating.sigma
            );
        }

        Ok(CategoryRatings { table, stats })
    }

    /// Weight of one entry in a round
    pub fn entry_weight(&self, round: &Round, entry: &RoundEntry) -> f64 {
        let mut weight = self.config.tier_weighting.weight_for(round.competition_tier);
        if entry.eliminated {
            weight *= self
                .config
                .eliminated
                .eliminated_weight(round.eliminated_count, round.field_size);
        }
        weight
    }

    /// Sigma after the per-round decay and floor
    pub fn decay_sigma(&self, sigma: f64) -> f64 {
        (sigma * self.config.sigma_decay).max(self.config.sigma_min)
    }

    /// Apply one round to the ratings of its participants
    pub fn apply_round(&self, table: &mut RatingTable, round: &Round) -> Result<()> {
        let initial = self.model.initial_rating();

        let participants: Vec<Participant> = round
            .entries
            .iter()
            .map(|entry| Participant {
                rating: table.get_or_insert(&entry.team_id, initial).rating,
                rank: entry.rank,
                weight: self.entry_weight(round, entry),
            })
            .collect();

        let updated = self.model.rate(&participants)?;

        for (entry, new_rating) in round.entries.iter().zip(updated) {
            let decayed = SkillRating {
                mu: new_rating.mu,
                sigma: self.decay_sigma(new_rating.sigma),
            };
            table
                .get_or_insert(&entry.team_id, initial)
                .record_round(decayed, entry, round);
        }

        Ok(())
    }
}
