//! Test fixtures: on-disk results directories and run builders

#![allow(dead_code)]

use adw_rating::config::{AppConfig, InputSettings, RatingConfig, TierSettings};
use adw_rating::types::{Placement, RunResult, SizeCategory, TeamId};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// One row of a results CSV, in the ingestion column layout
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultRow {
    pub competition: String,
    pub round_key: String,
    pub size: String,
    pub discipline: String,
    pub is_team_round: String,
    pub rank: String,
    pub start_no: String,
    pub handler: String,
    pub dog: String,
    pub country: String,
    pub eliminated: String,
}

impl ResultRow {
    /// Clean finish at `rank`
    pub fn ranked(round_key: &str, size: &str, rank: u32, handler: &str, dog: &str) -> Self {
        Self {
            round_key: round_key.to_string(),
            size: size.to_string(),
            discipline: "Agility".to_string(),
            is_team_round: "False".to_string(),
            rank: rank.to_string(),
            handler: handler.to_string(),
            dog: dog.to_string(),
            eliminated: "False".to_string(),
            ..Self::default()
        }
    }

    /// Disqualified run
    pub fn eliminated(round_key: &str, size: &str, handler: &str, dog: &str) -> Self {
        Self {
            rank: String::new(),
            eliminated: "True".to_string(),
            ..Self::ranked(round_key, size, 1, handler, dog)
        }
    }

    pub fn with_country(mut self, country: &str) -> Self {
        self.country = country.to_string();
        self
    }

    pub fn with_start_no(mut self, start_no: u32) -> Self {
        self.start_no = start_no.to_string();
        self
    }
}

/// A competition entry for the registry file
pub struct Competition<'a> {
    pub id: &'a str,
    pub date: &'a str,
    pub tier: u8,
    pub name: &'a str,
}

/// Temporary data directory with a registry and result files
pub struct ResultsDir {
    root: TempDir,
}

impl ResultsDir {
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("Failed to create temp dir");
        fs::create_dir_all(root.path().join("data")).expect("Failed to create data dir");
        Self { root }
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.path().join("data")
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.path().join("competitions.toml")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.path().join("output")
    }

    pub fn write_registry(&self, competitions: &[Competition<'_>]) {
        let mut content = String::new();
        for c in competitions {
            content.push_str(&format!(
                "[[competition]]\nid = \"{}\"\ndate = \"{}\"\ntier = {}\nname = \"{}\"\n\n",
                c.id, c.date, c.tier, c.name
            ));
        }
        fs::write(self.registry_path(), content).expect("Failed to write registry");
    }

    /// Write `rows` to `<data>/<competition>/<file_stem>_results.csv`
    pub fn write_results(&self, competition: &str, file_stem: &str, rows: &[ResultRow]) -> PathBuf {
        let dir = self.data_dir().join(competition);
        fs::create_dir_all(&dir).expect("Failed to create competition dir");
        let path = dir.join(format!("{}_results.csv", file_stem));

        let mut writer = csv::Writer::from_path(&path).expect("Failed to create results file");
        for row in rows {
            writer.serialize(row).expect("Failed to write row");
        }
        writer.flush().expect("Failed to flush results file");
        path
    }

    /// Configuration pointing at this directory
    pub fn config(&self, rating: RatingConfig) -> AppConfig {
        AppConfig {
            input: InputSettings {
                data_dir: self.data_dir(),
                registry_path: self.registry_path(),
                aliases_path: None,
                output_dir: self.output_dir(),
            },
            rating,
            ..AppConfig::default()
        }
    }

    pub fn path(&self) -> &Path {
        self.root.path()
    }
}

/// Baseline policy with a smaller field and run threshold for small fixtures
pub fn small_field_config(min_field_size: usize) -> RatingConfig {
    RatingConfig {
        min_field_size,
        tiers: TierSettings {
            min_runs_for_ranking: 1,
            ..TierSettings::default()
        },
        ..RatingConfig::default()
    }
}

/// In-memory run with an already normalized team id
pub fn run(
    competition: &str,
    day: i64,
    round_key: &str,
    handler: &str,
    dog: &str,
    placement: Placement,
) -> RunResult {
    RunResult {
        competition_id: competition.to_string(),
        competition_name: competition.to_string(),
        competition_date: NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date")
            + Duration::days(day),
        competition_tier: 2,
        round_key: round_key.to_string(),
        size: SizeCategory::Large,
        team_id: TeamId::new(handler, dog),
        handler: handler.to_string(),
        animal: dog.to_string(),
        country: String::new(),
        placement,
    }
}

/// `teams` finishing in the given order, with the last `eliminated` of them
/// disqualified
pub fn round(
    competition: &str,
    day: i64,
    round_key: &str,
    teams: &[&str],
    eliminated: usize,
) -> Vec<RunResult> {
    let clean = teams.len().saturating_sub(eliminated);
    teams
        .iter()
        .enumerate()
        .map(|(idx, team)| {
            let placement = if idx < clean {
                Placement::Ranked(idx as u32 + 1)
            } else {
                Placement::Eliminated
            };
            run(competition, day, round_key, team, "dog", placement)
        })
        .collect()
}
