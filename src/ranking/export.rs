//! Leaderboard export

use crate::error::{RatingError, Result};
use crate::ranking::leaderboard::{Leaderboard, LeaderboardEntry};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

/// Flat CSV row; column order is the header order
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    rank: usize,
    team_id: String,
    handler: &'a str,
    call_name: &'a str,
    registered_name: &'a str,
    dog: &'a str,
    size: String,
    country: &'a str,
    mu: f64,
    sigma: f64,
    rating: f64,
    previous_rating: Option<f64>,
    quality_factor: f64,
    tier: &'static str,
    provisional: bool,
    num_runs: u32,
    finished_pct: f64,
    top3_pct: f64,
    top10_pct: f64,
    last_competition: &'a str,
}

impl<'a> From<&'a LeaderboardEntry> for CsvRow<'a> {
    fn from(entry: &'a LeaderboardEntry) -> Self {
        Self {
            rank: entry.rank,
            team_id: entry.team_id.to_string(),
            handler: &entry.handler,
            call_name: &entry.call_name,
            registered_name: &entry.registered_name,
            dog: &entry.dog,
            size: entry.size.to_string(),
            country: &entry.country,
            mu: round4(entry.mu),
            sigma: round4(entry.sigma),
            rating: entry.rating,
            previous_rating: entry.previous_rating,
            quality_factor: round4(entry.quality_factor),
            tier: entry.tier.label(),
            provisional: entry.provisional,
            num_runs: entry.num_runs,
            finished_pct: entry.finished_pct,
            top3_pct: entry.top3_pct,
            top10_pct: entry.top10_pct,
            last_competition: &entry.last_competition,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn export_error(message: String) -> anyhow::Error {
    RatingError::ExportFailed { message }.into()
}

/// Write every leaderboard row as CSV, categories in display order
pub fn write_csv<W: io::Write>(leaderboard: &Leaderboard, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for entry in leaderboard.entries() {
        csv_writer
            .serialize(CsvRow::from(entry))
            .map_err(|e| export_error(format!("Failed to write row for {}: {}", entry.team_id, e)))?;
    }
    csv_writer
        .flush()
        .map_err(|e| export_error(format!("Failed to flush CSV output: {}", e)))?;
    Ok(())
}

pub fn write_json<W: io::Write>(leaderboard: &Leaderboard, writer: W) -> Result<()> {
    serde_json::to_writer_pretty(writer, leaderboard)
        .map_err(|e| export_error(format!("Failed to write JSON output: {}", e)))
}

/// Write `leaderboard` to a file, creating parent directories
pub fn export_csv(leaderboard: &Leaderboard, path: &Path) -> Result<()> {
    let file = create_file(path)?;
    write_csv(leaderboard, io::BufWriter::new(file))?;
    info!("Wrote {} rows to {}", leaderboard.len(), path.display());
    Ok(())
}

pub fn export_json(leaderboard: &Leaderboard, path: &Path) -> Result<()> {
    let file = create_file(path)?;
    write_json(leaderboard, io::BufWriter::new(file))?;
    info!("Wrote leaderboard JSON to {}", path.display());
    Ok(())
}

fn create_file(path: &Path) -> Result<fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            export_error(format!("Failed to create {}: {}", parent.display(), e))
        })?;
    }
    fs::File::create(path)
        .map_err(|e| export_error(format!("Failed to create {}: {}", path.display(), e)))
}
