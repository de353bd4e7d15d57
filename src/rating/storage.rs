//! Rating state for one size category
//!
//! Each size category owns an independent `RatingTable`. Entries are created
//! on a team's first rated round and are never removed.

use crate::rating::batcher::{Round, RoundEntry};
use crate::types::{CompetitionId, SizeCategory, SkillRating, TeamId};
use crate::utils::percentage;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Competition a team most recently took part in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastCompetition {
    pub id: CompetitionId,
    pub name: String,
    pub date: NaiveDate,
}

/// Rating entry for one team with its participation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub team_id: TeamId,
    pub rating: SkillRating,
    /// Rating before the most recent rated round
    pub previous: Option<SkillRating>,
    pub num_runs: u32,
    /// Clean finishes
    pub finished_runs: u32,
    pub top3_runs: u32,
    pub top10_runs: u32,
    pub last_competition: Option<LastCompetition>,
}

impl TeamRating {
    /// Create a new rating entry for a team seen for the first time
    pub fn new(team_id: TeamId, initial_rating: SkillRating) -> Self {
        Self {
            team_id,
            rating: initial_rating,
            previous: None,
            num_runs: 0,
            finished_runs: 0,
            top3_runs: 0,
            top10_runs: 0,
            last_competition: None,
        }
    }

    /// Store the post-round rating and count the run
    pub fn record_round(&mut self, new_rating: SkillRating, entry: &RoundEntry, round: &Round) {
        self.previous = Some(self.rating);
        self.rating = new_rating;
        self.num_runs += 1;

        if !entry.eliminated {
            self.finished_runs += 1;
            if entry.rank <= 3 {
                self.top3_runs += 1;
            }
            if entry.rank <= 10 {
                self.top10_runs += 1;
            }
        }

        // Equal dates overwrite, so the last processed competition wins
        let newer = self
            .last_competition
            .as_ref()
            .map_or(true, |last| round.competition_date >= last.date);
        if newer {
            self.last_competition = Some(LastCompetition {
                id: round.competition_id.clone(),
                name: round.competition_name.clone(),
                date: round.competition_date,
            });
        }
    }

    pub fn finished_pct(&self) -> f64 {
        percentage(self.finished_runs, self.num_runs)
    }

    pub fn top3_pct(&self) -> f64 {
        percentage(self.top3_runs, self.num_runs)
    }

    pub fn top10_pct(&self) -> f64 {
        percentage(self.top10_runs, self.num_runs)
    }
}

/// In-memory ratings of one size category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    size: SizeCategory,
    ratings: BTreeMap<TeamId, TeamRating>,
}

impl RatingTable {
    pub fn new(size: SizeCategory) -> Self {
        Self {
            size,
            ratings: BTreeMap::new(),
        }
    }

    pub fn size(&self) -> SizeCategory {
        self.size
    }

    pub fn get(&self, team_id: &TeamId) -> Option<&TeamRating> {
        self.ratings.get(team_id)
    }

    /// Entry for `team_id`, created with `initial_rating` if missing
    pub fn get_or_insert(&mut self, team_id: &TeamId, initial_rating: SkillRating) -> &mut TeamRating {
        self.ratings
            .entry(team_id.clone())
            .or_insert_with(|| TeamRating::new(team_id.clone(), initial_rating))
    }

    /// Entries in team id order
    pub fn iter(&self) -> impl Iterator<Item = &TeamRating> {
        self.ratings.values()
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}
