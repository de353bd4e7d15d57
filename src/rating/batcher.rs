//! Round batching
//!
//! Groups runs into rounds in the order the engine must consume them:
//! competitions by ascending date (ties by competition id), then rounds by
//! natural round-key order. Each round is deduplicated by team and turned
//! into an assigned ranking in which every eliminated entry shares last place.

use crate::config::RatingConfig;
use crate::types::{CompetitionId, RunResult, SizeCategory, TeamId};
use crate::utils::{natural_sort_key, KeyPart};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One team's assigned position in a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundEntry {
    pub team_id: TeamId,
    /// 1-based; eliminated entries share `clean_count + 1`
    pub rank: u32,
    pub eliminated: bool,
}

/// A rateable round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub competition_id: CompetitionId,
    pub competition_name: String,
    pub competition_date: NaiveDate,
    pub competition_tier: u8,
    pub round_key: String,
    pub size: SizeCategory,
    /// Distinct teams in the round after deduplication
    pub field_size: usize,
    /// Eliminated teams after deduplication, whether or not they are rated
    pub eliminated_count: usize,
    /// Clean entries in rank order, then eliminated entries
    pub entries: Vec<RoundEntry>,
}

impl Round {
    pub fn clean_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.eliminated).count()
    }

    /// `(team, assigned rank)` pairs in emission order
    pub fn ranking(&self) -> Vec<(TeamId, u32)> {
        self.entries
            .iter()
            .map(|e| (e.team_id.clone(), e.rank))
            .collect()
    }
}

/// Why a round was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Too few distinct teams
    FieldTooSmall,
    /// Too few entries left to rate once eliminated entries are removed
    RankedTooSmall,
}

/// Counters for one batching pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub rounds_seen: usize,
    pub rounds_emitted: usize,
    pub skipped_field_too_small: usize,
    pub skipped_ranked_too_small: usize,
    pub duplicates_dropped: usize,
}

impl BatchStats {
    pub fn rounds_skipped(&self) -> usize {
        self.skipped_field_too_small + self.skipped_ranked_too_small
    }
}

/// Ranked entries of one round before round metadata is attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntries {
    pub entries: Vec<RoundEntry>,
    pub field_size: usize,
    pub eliminated_count: usize,
    pub duplicates_dropped: usize,
}

type RoundKey = (NaiveDate, CompetitionId, SizeCategory, Vec<KeyPart>, String);

/// Groups runs into ranked rounds
#[derive(Debug, Clone)]
pub struct RoundBatcher {
    min_field_size: usize,
    include_eliminated: bool,
}

impl RoundBatcher {
    pub fn new(min_field_size: usize, include_eliminated: bool) -> Self {
        Self {
            min_field_size,
            include_eliminated,
        }
    }

    pub fn from_config(config: &RatingConfig) -> Self {
        Self::new(config.min_field_size, config.eliminated.includes_eliminated())
    }

    /// Rank the runs of one round.
    ///
    /// Runs keep their input order for deduplication: the first run of a
    /// team wins.
    pub fn rank_round(&self, runs: &[&RunResult]) -> Result<RankedEntries, SkipReason> {
        let mut seen = BTreeSet::new();
        let mut unique = Vec::with_capacity(runs.len());
        for run in runs {
            if seen.insert(&run.team_id) {
                unique.push(*run);
            }
        }
        let duplicates_dropped = runs.len() - unique.len();
        let field_size = unique.len();

        if field_size < self.min_field_size {
            return Err(SkipReason::FieldTooSmall);
        }

        let (mut clean, elim): (Vec<&RunResult>, Vec<&RunResult>) =
            unique.into_iter().partition(|r| r.placement.is_clean());
        // Stable: equal source ranks keep input order
        clean.sort_by_key(|r| r.placement.rank().unwrap_or(u32::MAX));

        let eliminated_count = elim.len();
        let mut entries: Vec<RoundEntry> = clean
            .iter()
            .zip(1u32..)
            .map(|(run, rank)| RoundEntry {
                team_id: run.team_id.clone(),
                rank,
                eliminated: false,
            })
            .collect();

        if self.include_eliminated {
            let shared_last = entries.len() as u32 + 1;
            entries.extend(elim.iter().map(|run| RoundEntry {
                team_id: run.team_id.clone(),
                rank: shared_last,
                eliminated: true,
            }));
        }

        if entries.len() < self.min_field_size {
            return Err(SkipReason::RankedTooSmall);
        }

        Ok(RankedEntries {
            entries,
            field_size,
            eliminated_count,
            duplicates_dropped,
        })
    }

    /// Group runs into rounds in processing order and rank each one
    pub fn batch<'r>(&self, runs: impl IntoIterator<Item = &'r RunResult>) -> (Vec<Round>, BatchStats) {
        let mut grouped: BTreeMap<RoundKey, Vec<&RunResult>> = BTreeMap::new();
        for run in runs {
            let key = (
                run.competition_date,
                run.competition_id.clone(),
                run.size,
                natural_sort_key(&run.round_key),
                run.round_key.clone(),
            );
            grouped.entry(key).or_default().push(run);
        }

        let mut stats = BatchStats::default();
        let mut rounds = Vec::new();

        for ((date, competition_id, size, _, round_key), round_runs) in grouped {
            stats.rounds_seen += 1;
            match self.rank_round(&round_runs) {
                Ok(ranked) => {
                    stats.rounds_emitted += 1;
                    stats.duplicates_dropped += ranked.duplicates_dropped;
                    let first = round_runs[0];
                    rounds.push(Round {
                        competition_id,
                        competition_name: first.competition_name.clone(),
                        competition_date: date,
                        competition_tier: first.competition_tier,
                        round_key,
                        size,
                        field_size: ranked.field_size,
                        eliminated_count: ranked.eliminated_count,
                        entries: ranked.entries,
                    });
                }
                Err(reason) => {
                    debug!(
                        "Skipping round {}/{} ({}): {:?}",
                        competition_id, round_key, size, reason
                    );
                    match reason {
                        SkipReason::FieldTooSmall => stats.skipped_field_too_small += 1,
                        SkipReason::RankedTooSmall => stats.skipped_ranked_too_small += 1,
                    }
                }
            }
        }

        (rounds, stats)
    }
}
