//! Result row schema and boundary normalization
//!
//! Rows arrive as loosely typed CSV text. This is the only place where the
//! various encodings of "eliminated" (a flag, a rank token, a missing rank)
//! are folded into `Placement`, and where size labels are mapped.

use crate::identity::NameNormalizer;
use crate::types::{CompetitionMeta, Placement, RunResult, SizeCategory};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Disciplines whose team-event rows are still individual runs
const INDIVIDUAL_DISCIPLINES: [&str; 3] = ["agility", "jumping", "final"];

/// Eliminated-flag values meaning the run did not finish clean
const ELIMINATED_FLAGS: [&str; 9] = ["true", "1", "yes", "dis", "disq", "-", "dns", "dnf", "np"];

/// Rank-column tokens meaning the run did not finish clean
const ELIMINATED_RANKS: [&str; 9] = ["dis", "dsq", "disq", "nfc", "ret", "wd", "dnf", "dns", "np"];

/// One row of a results file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestRow {
    /// Competition display name; the directory decides the competition
    pub competition: String,
    pub round_key: String,
    pub size: String,
    pub discipline: String,
    pub is_team_round: String,
    pub rank: String,
    pub start_no: String,
    pub handler: String,
    pub dog: String,
    pub breed: String,
    pub country: String,
    pub faults: String,
    pub refusals: String,
    pub time_faults: String,
    pub total_faults: String,
    pub time: String,
    pub speed: String,
    pub eliminated: String,
    pub judge: String,
    pub sct: String,
    pub mct: String,
    pub course_length: String,
}

/// Why a row did not become a `RunResult`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowRejection {
    /// Team-event row of a discipline that is not an individual run
    TeamRound,
    UnknownSize,
    MissingRoundKey,
    /// Empty handler or animal after normalization
    MissingIdentity,
    UnknownCompetition,
}

impl RowRejection {
    /// Stable label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            RowRejection::TeamRound => "team_round",
            RowRejection::UnknownSize => "unknown_size",
            RowRejection::MissingRoundKey => "missing_round_key",
            RowRejection::MissingIdentity => "missing_identity",
            RowRejection::UnknownCompetition => "unknown_competition",
        }
    }
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

fn is_true(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "y"
    )
}

impl IngestRow {
    /// Normalized finish of this row
    pub fn placement(&self) -> Placement {
        let flag = self.eliminated.trim().to_ascii_lowercase();
        let rank = self.rank.trim().trim_end_matches('.').to_ascii_lowercase();

        if ELIMINATED_FLAGS.contains(&flag.as_str()) || ELIMINATED_RANKS.contains(&rank.as_str()) {
            return Placement::Eliminated;
        }

        match rank.parse::<u32>() {
            Ok(position) if position > 0 => Placement::Ranked(position),
            _ => Placement::Unknown,
        }
    }

    pub fn is_team_round(&self) -> bool {
        is_true(&self.is_team_round)
    }

    /// Whether the row takes part in individual rating
    pub fn is_individual_run(&self) -> bool {
        if !self.is_team_round() {
            return true;
        }
        let discipline = self.discipline.trim().to_ascii_lowercase();
        INDIVIDUAL_DISCIPLINES.contains(&discipline.as_str())
    }

    pub fn size_category(&self) -> Option<SizeCategory> {
        SizeCategory::from_label(&self.size)
    }

    /// Round key, falling back to the discipline when the column is empty
    pub fn round(&self) -> Option<&str> {
        [self.round_key.trim(), self.discipline.trim()]
            .into_iter()
            .find(|key| !key.is_empty())
    }

    /// Convert into a `RunResult` for a known competition
    pub fn to_run_result(
        &self,
        meta: &CompetitionMeta,
        normalizer: &NameNormalizer,
    ) -> std::result::Result<RunResult, RowRejection> {
        if !self.is_individual_run() {
            return Err(RowRejection::TeamRound);
        }
        let size = self.size_category().ok_or(RowRejection::UnknownSize)?;
        let round_key = self.round().ok_or(RowRejection::MissingRoundKey)?;

        let team_id = normalizer.make_team_id(&self.handler, &self.dog);
        if team_id.handler.is_empty() || team_id.animal.is_empty() {
            return Err(RowRejection::MissingIdentity);
        }

        Ok(RunResult {
            competition_id: meta.id.clone(),
            competition_name: meta.name.clone(),
            competition_date: meta.date,
            competition_tier: meta.tier,
            round_key: round_key.to_string(),
            size,
            team_id,
            handler: self.handler.trim().to_string(),
            animal: self.dog.trim().to_string(),
            country: self.country.trim().to_string(),
            placement: self.placement(),
        })
    }
}
