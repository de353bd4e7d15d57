//! Results directory loader
//!
//! Layout: `<data_dir>/<competition_id>/*_results.csv`. Each competition
//! directory must be listed in the registry; its rows take the directory's
//! competition and are converted to `RunResult`s. Rows that cannot be used
//! are dropped and counted, never raised.

use crate::error::{RatingError, Result};
use crate::identity::normalizer::word_count;
use crate::identity::NameNormalizer;
use crate::ingest::registry::CompetitionRegistry;
use crate::ingest::row::{IngestRow, RowRejection};
use crate::types::{RunResult, TeamId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Suffix of result files inside a competition directory
pub const RESULTS_FILE_SUFFIX: &str = "_results.csv";

/// Longest handler-text marker accepted as a call name
const MAX_CALL_NAME_WORDS: usize = 3;

/// Counters for one load
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadStats {
    pub files_read: usize,
    pub rows_read: usize,
    pub rows_loaded: usize,
    /// Rows the CSV reader could not decode
    pub malformed_rows: usize,
    pub dropped: BTreeMap<RowRejection, usize>,
    /// Rows whose identity was copied from a row with the same start number
    pub recovered_from_start_no: usize,
    /// Rows whose call name was taken from the handler text
    pub recovered_call_from_handler: usize,
    /// Competition directories absent from the registry
    pub skipped_directories: Vec<String>,
}

impl LoadStats {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum::<usize>() + self.malformed_rows
    }

    fn drop_row(&mut self, reason: RowRejection) {
        *self.dropped.entry(reason).or_insert(0) += 1;
    }
}

/// Runs loaded so far and the counters describing how they were obtained
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub runs: Vec<RunResult>,
    pub stats: LoadStats,
    warned_competitions: BTreeSet<String>,
}

/// Identity known for one start number in a file; `None` once ambiguous
type StartIdentity = Option<(TeamId, String, String)>;

/// Reads result files and resolves them against the registry
pub struct ResultLoader<'a> {
    registry: &'a CompetitionRegistry,
    normalizer: &'a NameNormalizer,
}

impl<'a> ResultLoader<'a> {
    pub fn new(registry: &'a CompetitionRegistry, normalizer: &'a NameNormalizer) -> Self {
        Self {
            registry,
            normalizer,
        }
    }

    /// Load every competition directory under `data_dir`
    pub fn load_dir(&self, data_dir: &Path) -> Result<LoadOutcome> {
        let mut outcome = LoadOutcome::default();

        for dir in sorted_entries(data_dir)? {
            if !dir.is_dir() {
                continue;
            }
            let Some(competition_id) = dir.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if competition_id.starts_with('_') || competition_id.starts_with('.') {
                continue;
            }
            if !self.registry.contains(competition_id) {
                warn!(
                    "Skipping {}: competition {} is not in the registry",
                    dir.display(),
                    competition_id
                );
                outcome
                    .stats
                    .skipped_directories
                    .push(competition_id.to_string());
                continue;
            }

            for file in sorted_entries(&dir)? {
                let is_results = file
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(RESULTS_FILE_SUFFIX));
                if is_results && file.is_file() {
                    self.load_file(competition_id, &file, &mut outcome)?;
                }
            }
        }

        info!(
            "Loaded {} runs from {} files ({} rows read, {} dropped)",
            outcome.stats.rows_loaded,
            outcome.stats.files_read,
            outcome.stats.rows_read,
            outcome.stats.dropped_total()
        );
        for (reason, count) in &outcome.stats.dropped {
            info!("  dropped {} rows: {}", count, reason);
        }

        Ok(outcome)
    }

    /// Load one results file for `competition_id`
    pub fn load_file(
        &self,
        competition_id: &str,
        path: &Path,
        outcome: &mut LoadOutcome,
    ) -> Result<()> {
        let file = std::fs::File::open(path).map_err(|e| RatingError::InvalidRow {
            reason: format!("Failed to open {}: {}", path.display(), e),
        })?;
        let (rows, malformed) = read_rows(file);
        if malformed > 0 {
            warn!("{}: {} malformed rows skipped", path.display(), malformed);
        }
        debug!("{}: {} rows", path.display(), rows.len());

        outcome.stats.files_read += 1;
        outcome.stats.malformed_rows += malformed;
        self.ingest_rows(competition_id, rows, outcome);
        Ok(())
    }

    /// Convert the rows of one file belonging to `competition_id`.
    ///
    /// The competition is the directory the file was found in; the row's
    /// own `competition` column carries a display name and is not used.
    pub fn ingest_rows(
        &self,
        competition_id: &str,
        rows: Vec<IngestRow>,
        outcome: &mut LoadOutcome,
    ) {
        let Some(meta) = self.registry.get(competition_id) else {
            if outcome.warned_competitions.insert(competition_id.to_string()) {
                warn!("Dropping rows of unknown competition {}", competition_id);
            }
            outcome.stats.rows_read += rows.len();
            for _ in &rows {
                outcome.stats.drop_row(RowRejection::UnknownCompetition);
            }
            return;
        };
        let by_start_no = self.start_identities(&rows);

        for mut row in rows {
            outcome.stats.rows_read += 1;
            self.recover_identity(&mut row, &by_start_no, &mut outcome.stats);

            match row.to_run_result(meta, self.normalizer) {
                Ok(run) => {
                    outcome.stats.rows_loaded += 1;
                    outcome.runs.push(run);
                }
                Err(reason) => outcome.stats.drop_row(reason),
            }
        }
    }

    fn start_identities(&self, rows: &[IngestRow]) -> BTreeMap<(String, String), StartIdentity> {
        let mut identities: BTreeMap<(String, String), StartIdentity> = BTreeMap::new();

        for row in rows {
            let start_no = row.start_no.trim();
            let (handler, dog) = (row.handler.trim(), row.dog.trim());
            if start_no.is_empty() || handler.is_empty() || dog.is_empty() {
                continue;
            }
            let team_id = self.normalizer.make_team_id(handler, dog);
            let key = (row.size.trim().to_string(), start_no.to_string());

            identities
                .entry(key)
                .and_modify(|known| {
                    if known.as_ref().is_some_and(|(id, _, _)| *id != team_id) {
                        *known = None;
                    }
                })
                .or_insert_with(|| Some((team_id.clone(), handler.to_string(), dog.to_string())));
        }

        identities
    }

    fn recover_identity(
        &self,
        row: &mut IngestRow,
        by_start_no: &BTreeMap<(String, String), StartIdentity>,
        stats: &mut LoadStats,
    ) {
        let incomplete = row.handler.trim().is_empty() || row.dog.trim().is_empty();
        let start_no = row.start_no.trim();
        if incomplete && !start_no.is_empty() {
            let key = (row.size.trim().to_string(), start_no.to_string());
            if let Some(Some((_, handler, dog))) = by_start_no.get(&key) {
                row.handler = handler.clone();
                row.dog = dog.clone();
                stats.recovered_from_start_no += 1;
                return;
            }
        }

        // "Jana Svobodova (Day)" in the handler column with no dog
        if row.dog.trim().is_empty() && !row.handler.trim().is_empty() {
            let split = self
                .normalizer
                .split_trailing_marker(row.handler.trim())
                .filter(|(head, marker)| {
                    !head.is_empty() && word_count(marker) <= MAX_CALL_NAME_WORDS
                })
                .map(|(head, marker)| (head.to_string(), marker.to_string()));
            if let Some((handler, dog)) = split {
                row.handler = handler;
                row.dog = dog;
                stats.recovered_call_from_handler += 1;
            }
        }
    }
}

/// Decode rows from CSV with a header line. Returns the rows and the number
/// of records that could not be decoded.
pub fn read_rows<R: io::Read>(reader: R) -> (Vec<IngestRow>, usize) {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut malformed = 0;
    for record in csv_reader.deserialize::<IngestRow>() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => {
                debug!("Malformed row: {}", e);
                malformed += 1;
            }
        }
    }
    (rows, malformed)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| RatingError::InvalidRow {
        reason: format!("Failed to read directory {}: {}", dir.display(), e),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RatingError::InvalidRow {
            reason: format!("Failed to read directory {}: {}", dir.display(), e),
        })?;
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AliasTables;
    use crate::types::{CompetitionMeta, Placement};
    use chrono::NaiveDate;

    fn registry() -> CompetitionRegistry {
        let mut registry = CompetitionRegistry::new();
        registry
            .insert(CompetitionMeta {
                id: "open".to_string(),
                date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                tier: 2,
                name: "Open".to_string(),
            })
            .unwrap();
        registry
    }

    const CSV: &str = "\
competition,round_key,size,discipline,is_team_round,rank,start_no,handler,dog,country,eliminated
open,agility_1,Large,Agility,False,1,101,Jana Svobodová,Day,CZE,False
open,agility_1,Large,Agility,False,2,102,Petr Novak,Rex,CZE,False
open,agility_1,Large,Agility,False,,101,,,CZE,True
open,agility_1,Large,Agility,False,3,,Anna Kowalska (Fox),,POL,False
open,agility_1,Large,Team,True,1,104,Team Czech,Relay,CZE,False
open,agility_1,XXL,Agility,False,4,105,Eva Mala,Bo,CZE,False
";

    #[test]
    fn test_read_rows() {
        let (rows, malformed) = read_rows(CSV.as_bytes());
        assert_eq!(rows.len(), 6);
        assert_eq!(malformed, 0);
        assert_eq!(rows[0].handler, "Jana Svobodová");
        assert!(rows[0].breed.is_empty());
    }

    #[test]
    fn test_ingest_rows_with_recovery() {
        let registry = registry();
        let normalizer = NameNormalizer::new(AliasTables::default()).unwrap();
        let loader = ResultLoader::new(&registry, &normalizer);

        let (rows, _) = read_rows(CSV.as_bytes());
        let mut outcome = LoadOutcome::default();
        loader.ingest_rows("open", rows, &mut outcome);

        let stats = &outcome.stats;
        assert_eq!(stats.rows_read, 6);
        assert_eq!(stats.rows_loaded, 4);
        assert_eq!(stats.recovered_from_start_no, 1);
        assert_eq!(stats.recovered_call_from_handler, 1);
        assert_eq!(stats.dropped[&RowRejection::TeamRound], 1);
        assert_eq!(stats.dropped[&RowRejection::UnknownSize], 1);

        let recovered = &outcome.runs[2];
        assert_eq!(recovered.team_id, outcome.runs[0].team_id);
        assert_eq!(recovered.placement, Placement::Eliminated);

        let fox = &outcome.runs[3];
        assert_eq!(fox.team_id.to_string(), "anna kowalska|||fox");
    }

    #[test]
    fn test_ambiguous_start_number_is_not_used() {
        let registry = registry();
        let normalizer = NameNormalizer::new(AliasTables::default()).unwrap();
        let loader = ResultLoader::new(&registry, &normalizer);

        let csv = "\
round_key,size,rank,start_no,handler,dog
agility_1,Large,1,7,Jana Svobodova,Day
agility_2,Large,1,7,Petr Novak,Rex
agility_3,Large,,7,,
";
        let (rows, _) = read_rows(csv.as_bytes());
        let mut outcome = LoadOutcome::default();
        loader.ingest_rows("open", rows, &mut outcome);

        assert_eq!(outcome.stats.rows_loaded, 2);
        assert_eq!(outcome.stats.recovered_from_start_no, 0);
        assert_eq!(outcome.stats.dropped[&RowRejection::MissingIdentity], 1);
    }

    #[test]
    fn test_competition_column_is_informational() {
        let registry = registry();
        let normalizer = NameNormalizer::new(AliasTables::default()).unwrap();
        let loader = ResultLoader::new(&registry, &normalizer);

        let csv = "\
competition,round_key,size,rank,handler,dog
Open Agility 2024,agility_1,Large,1,Jana Svobodova,Day
eo2019,agility_1,Large,2,Petr Novak,Rex
";
        let (rows, _) = read_rows(csv.as_bytes());
        let mut outcome = LoadOutcome::default();
        loader.ingest_rows("open", rows, &mut outcome);

        assert_eq!(outcome.stats.rows_loaded, 2);
        assert!(outcome.stats.dropped.is_empty());
        assert!(outcome.runs.iter().all(|r| r.competition_id == "open"));
    }

    #[test]
    fn test_unknown_competition_rows_are_dropped() {
        let registry = registry();
        let normalizer = NameNormalizer::new(AliasTables::default()).unwrap();
        let loader = ResultLoader::new(&registry, &normalizer);

        let csv = "\
competition,round_key,size,rank,handler,dog
eo2019,agility_1,Large,1,Jana Svobodova,Day
eo2019,agility_1,Large,2,Petr Novak,Rex
";
        let (rows, _) = read_rows(csv.as_bytes());
        let mut outcome = LoadOutcome::default();
        loader.ingest_rows("eo2019", rows, &mut outcome);

        assert!(outcome.runs.is_empty());
        assert_eq!(outcome.stats.rows_read, 2);
        assert_eq!(outcome.stats.dropped[&RowRejection::UnknownCompetition], 2);
    }
}
