//! Command line entry point for the ADW rating pass
//!
//! Loads configuration, runs one full chronological pass over the results
//! directory and writes the leaderboards.

use adw_rating::config::{AppConfig, RatingPreset};
use adw_rating::{PipelineReport, RatingPipeline};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};

/// ADW Rating - skill ratings for agility handler and dog teams
#[derive(Parser)]
#[command(
    name = "adw-rating",
    version,
    about = "Compute Weng-Lin skill ratings for agility handler and dog teams",
    long_about = "ADW Rating reads per-round results of registered competitions, resolves the \
                 spellings each handler and dog appear under into stable teams, rates every size \
                 category chronologically with the Weng-Lin (OpenSkill) model and writes ranked \
                 leaderboards."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Data directory override
    #[arg(long, value_name = "DIR", help = "Directory with one folder per competition")]
    data_dir: Option<PathBuf>,

    /// Registry override
    #[arg(long, value_name = "FILE", help = "Competition registry (TOML format)")]
    registry: Option<PathBuf>,

    /// Alias file override
    #[arg(long, value_name = "FILE", help = "Extra alias tables (TOML format)")]
    aliases: Option<PathBuf>,

    /// Output directory override
    #[arg(short, long, value_name = "DIR", help = "Directory for ratings.csv and ratings.json")]
    output_dir: Option<PathBuf>,

    /// Rating preset override
    #[arg(
        short,
        long,
        value_name = "PRESET",
        help = "Rating policy: baseline, live, downweighted, clean_only"
    )]
    preset: Option<RatingPreset>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and registry, then exit")]
    dry_run: bool,

    /// Metrics dump
    #[arg(long, value_name = "FILE", help = "Write Prometheus metrics to FILE after the pass")]
    metrics_out: Option<PathBuf>,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load configuration and apply CLI overrides
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load(args.config.as_deref(), args.preset)?;

    if let Some(data_dir) = &args.data_dir {
        config.input.data_dir = data_dir.clone();
    }
    if let Some(registry) = &args.registry {
        config.input.registry_path = registry.clone();
    }
    if let Some(aliases) = &args.aliases {
        config.input.aliases_path = Some(aliases.clone());
    }
    if let Some(output_dir) = &args.output_dir {
        config.input.output_dir = output_dir.clone();
    }
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }
    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    adw_rating::config::validate_config(&config)?;
    Ok(config)
}

fn display_startup_banner(config: &AppConfig) {
    info!("ADW Rating {}", adw_rating::VERSION);
    info!("   Service: {}", config.service.name);
    info!("   Data: {}", config.input.data_dir.display());
    info!("   Registry: {}", config.input.registry_path.display());
    info!("   Output: {}", config.input.output_dir.display());
    info!(
        "   Policy: min field {}, sigma decay {}, sigma floor {}, window {}",
        config.rating.min_field_size,
        config.rating.sigma_decay,
        config.rating.sigma_min,
        config
            .rating
            .live_window_days
            .map_or("all".to_string(), |d| format!("{} days", d))
    );
}

fn display_summary(report: &PipelineReport) {
    for category in &report.leaderboard.categories {
        let tiers = category
            .tier_counts()
            .iter()
            .map(|(tier, count)| format!("{} {}", tier, count))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            "{}: {} ranked / {} rated ({})",
            category.size,
            category.entries.len(),
            category.rated_teams,
            tiers
        );
    }
    if !report.load.skipped_directories.is_empty() {
        info!(
            "Unregistered directories skipped: {}",
            report.load.skipped_directories.join(", ")
        );
    }
}

fn run(args: &Args, config: AppConfig) -> Result<()> {
    let pipeline = RatingPipeline::new(config)?;

    if args.dry_run {
        info!(
            "Configuration and registry valid ({} competitions) - exiting",
            pipeline.registry().len()
        );
        return Ok(());
    }

    let report = pipeline.run()?;
    pipeline.export(&report)?;
    display_summary(&report);

    if let Some(path) = &args.metrics_out {
        pipeline.metrics().write_to(path)?;
        info!("Metrics written to {}", path.display());
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    display_startup_banner(&config);

    if let Err(e) = run(&args, config) {
        error!("Rating pass failed: {:#}", e);
        std::process::exit(1);
    }
}
