//! Metrics collection using Prometheus
//!
//! Counters describing one batch pass: what was loaded, dropped and merged,
//! how many rounds were rated, and how many teams ended up rated and ranked.
//! Recording never affects ratings.

use crate::identity::MergeReport;
use crate::ingest::LoadStats;
use crate::ranking::Leaderboard;
use crate::rating::RatingSnapshot;
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Prometheus metrics for the rating pipeline
#[derive(Clone)]
pub struct PipelineMetrics {
    registry: Arc<Registry>,

    /// Rows turned into runs
    pub rows_loaded: IntCounter,

    /// Rows dropped at the ingestion boundary
    pub rows_dropped: IntCounterVec,

    /// Team ids folded into another by identity resolution
    pub identity_merges: IntCounterVec,

    /// Rounds per size category and outcome
    pub rounds: IntCounterVec,

    /// Teams holding a rating per size category
    pub teams_rated: IntGaugeVec,

    /// Teams listed on the leaderboard per size category
    pub teams_ranked: IntGaugeVec,

    /// Wall time of pipeline stages
    pub stage_duration: Histogram,
}

impl PipelineMetrics {
    /// Create a new collector with its own registry
    pub fn new() -> Result<Self> {
        Self::with_registry(Arc::new(Registry::new()))
    }

    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let rows_loaded = IntCounter::new("adw_rating_rows_loaded_total", "Rows loaded as runs")?;
        registry.register(Box::new(rows_loaded.clone()))?;

        let rows_dropped = IntCounterVec::new(
            Opts::new("adw_rating_rows_dropped_total", "Rows dropped at ingestion"),
            &["reason"],
        )?;
        registry.register(Box::new(rows_dropped.clone()))?;

        let identity_merges = IntCounterVec::new(
            Opts::new("adw_rating_identity_merges_total", "Team identities merged"),
            &["rule"],
        )?;
        registry.register(Box::new(identity_merges.clone()))?;

        let rounds = IntCounterVec::new(
            Opts::new("adw_rating_rounds_total", "Rounds by outcome"),
            &["size", "outcome"],
        )?;
        registry.register(Box::new(rounds.clone()))?;

        let teams_rated = IntGaugeVec::new(
            Opts::new("adw_rating_teams_rated", "Teams holding a rating"),
            &["size"],
        )?;
        registry.register(Box::new(teams_rated.clone()))?;

        let teams_ranked = IntGaugeVec::new(
            Opts::new("adw_rating_teams_ranked", "Teams listed on the leaderboard"),
            &["size"],
        )?;
        registry.register(Box::new(teams_ranked.clone()))?;

        let stage_duration = Histogram::with_opts(
            HistogramOpts::new(
                "adw_rating_stage_duration_seconds",
                "Pipeline stage duration",
            )
            .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;
        registry.register(Box::new(stage_duration.clone()))?;

        Ok(Self {
            registry,
            rows_loaded,
            rows_dropped,
            identity_merges,
            rounds,
            teams_rated,
            teams_ranked,
            stage_duration,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_load(&self, stats: &LoadStats) {
        self.rows_loaded.inc_by(stats.rows_loaded as u64);
        for (reason, count) in &stats.dropped {
            self.rows_dropped
                .with_label_values(&[reason.label()])
                .inc_by(*count as u64);
        }
        if stats.malformed_rows > 0 {
            self.rows_dropped
                .with_label_values(&["malformed"])
                .inc_by(stats.malformed_rows as u64);
        }
    }

    pub fn record_merges(&self, report: &MergeReport) {
        for merge in &report.merges {
            self.identity_merges
                .with_label_values(&[merge.rule.label()])
                .inc();
        }
    }

    pub fn record_snapshot(&self, snapshot: &RatingSnapshot) {
        for (size, category) in &snapshot.categories {
            let size = size.to_string();
            let stats = &category.stats;
            let outcomes = [
                ("rated", stats.rounds_emitted),
                ("field_too_small", stats.skipped_field_too_small),
                ("ranked_too_small", stats.skipped_ranked_too_small),
            ];
            for (outcome, count) in outcomes {
                self.rounds
                    .with_label_values(&[size.as_str(), outcome])
                    .inc_by(count as u64);
            }
            self.teams_rated
                .with_label_values(&[size.as_str()])
                .set(category.table.len() as i64);
        }
    }

    pub fn record_leaderboard(&self, leaderboard: &Leaderboard) {
        for category in &leaderboard.categories {
            self.teams_ranked
                .with_label_values(&[category.size.to_string().as_str()])
                .set(category.entries.len() as i64);
        }
    }

    pub fn record_stage(&self, duration: Duration) {
        self.stage_duration.observe(duration.as_secs_f64());
    }

    /// Create a timer for measuring stage duration
    pub fn start_timer(&self) -> StageTimer {
        StageTimer {
            start: Instant::now(),
        }
    }

    /// Text exposition format of every registered metric
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Write the text exposition format to `path`
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.gather_text()?)?;
        Ok(())
    }
}

/// Timer for measuring stage durations
pub struct StageTimer {
    start: Instant,
}

impl StageTimer {
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}
