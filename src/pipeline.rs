//! End-to-end rating pass
//!
//! Wires the stages together in their required order: load rows against
//! the registry, resolve team identities, build display profiles, run the
//! chronological rating pass, and assemble leaderboards.

use crate::config::AppConfig;
use crate::error::Result;
use crate::identity::{
    AliasTables, IdentityResolver, MergeReport, NameNormalizer, ProfileBuilder, TeamProfile,
};
use crate::ingest::{CompetitionRegistry, LoadOutcome, LoadStats, ResultLoader};
use crate::metrics::PipelineMetrics;
use crate::ranking::{export_csv, export_json, Leaderboard};
use crate::rating::{RatingEngine, RatingSnapshot};
use crate::types::{RunResult, TeamId};
use std::collections::BTreeMap;
use tracing::info;

/// Everything one pass produces
#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub load: LoadStats,
    pub merges: MergeReport,
    pub profiles: BTreeMap<TeamId, TeamProfile>,
    pub snapshot: RatingSnapshot,
    pub leaderboard: Leaderboard,
}

/// Components of a rating pass, built once from configuration
pub struct RatingPipeline {
    config: AppConfig,
    registry: CompetitionRegistry,
    normalizer: NameNormalizer,
    engine: RatingEngine,
    metrics: PipelineMetrics,
}

impl RatingPipeline {
    /// Load the registry and alias tables named by `config`
    pub fn new(config: AppConfig) -> Result<Self> {
        let registry = CompetitionRegistry::load(&config.input.registry_path)?;
        let aliases = match &config.input.aliases_path {
            Some(path) => AliasTables::load_with_overrides(path)?,
            None => AliasTables::default(),
        };
        Self::from_parts(config, registry, aliases)
    }

    pub fn from_parts(
        config: AppConfig,
        registry: CompetitionRegistry,
        aliases: AliasTables,
    ) -> Result<Self> {
        info!(
            "Initializing pipeline: {} competitions, {} alias entries",
            registry.len(),
            aliases.len()
        );
        let normalizer = NameNormalizer::new(aliases)?;
        let engine = RatingEngine::new(config.rating.clone())?;
        let metrics = PipelineMetrics::new()?;

        Ok(Self {
            config,
            registry,
            normalizer,
            engine,
            metrics,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn registry(&self) -> &CompetitionRegistry {
        &self.registry
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }

    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Load every results file under the configured data directory
    pub fn load(&self) -> Result<LoadOutcome> {
        let timer = self.metrics.start_timer();
        let outcome = ResultLoader::new(&self.registry, &self.normalizer)
            .load_dir(&self.config.input.data_dir)?;
        self.metrics.record_stage(timer.stop());
        self.metrics.record_load(&outcome.stats);
        Ok(outcome)
    }

    /// Full pass over the configured data directory
    pub fn run(&self) -> Result<PipelineReport> {
        let outcome = self.load()?;
        self.rate_runs(outcome.runs, outcome.stats)
    }

    /// Resolve identities in `runs`, rate them and build leaderboards
    pub fn rate_runs(&self, mut runs: Vec<RunResult>, load: LoadStats) -> Result<PipelineReport> {
        let timer = self.metrics.start_timer();
        let merges = IdentityResolver::new(&self.normalizer).resolve(&mut runs);
        self.metrics.record_merges(&merges);

        let profiles = ProfileBuilder::new(&self.normalizer).build(&runs);
        let snapshot = self.engine.run(&runs)?;
        self.metrics.record_snapshot(&snapshot);

        let leaderboard = Leaderboard::build(&snapshot, &profiles, self.engine.config());
        self.metrics.record_leaderboard(&leaderboard);
        self.metrics.record_stage(timer.stop());

        info!(
            "Rated {} teams in {} competitions, {} on leaderboards",
            snapshot.total_teams(),
            snapshot.competitions.len(),
            leaderboard.len()
        );

        Ok(PipelineReport {
            load,
            merges,
            profiles,
            snapshot,
            leaderboard,
        })
    }

    /// Write CSV and JSON leaderboards to the output directory
    pub fn export(&self, report: &PipelineReport) -> Result<()> {
        export_csv(&report.leaderboard, &self.config.ratings_csv_path())?;
        export_json(&report.leaderboard, &self.config.ratings_json_path())?;
        Ok(())
    }
}
