//! homecast - price index normalization and forecasting
//!
//! Exit codes: 0 on success, 1 on a fatal error, 2 when the run finished but
//! skipped at least one unit.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use homecast::export::write_region_csv;
use homecast::{FileSource, Pipeline, PipelineConfig, RunSummary, SqliteStore};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// homecast - real-estate price index pipeline
#[derive(Parser, Debug)]
#[command(name = "homecast")]
#[command(version, about, long_about = None)]
struct Cli {
    /// SQLite database file (overrides HOMECAST_DATABASE)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Run date as YYYY-MM-DD; only later weeks are forecast
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize, impute and store source series
    Ingest {
        /// Directory holding weekly_*_index and monthly_*_avg files
        #[arg(long)]
        source_dir: PathBuf,
    },

    /// Forecast every stored series
    Forecast,

    /// Ingest then forecast
    Run {
        #[arg(long)]
        source_dir: PathBuf,
    },

    /// Write per-region CSV files
    Export {
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "homecast=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()) {
        Ok(Some(summary)) if summary.is_partial() => {
            for unit in &summary.skipped {
                warn!(
                    region = unit.region_code.as_deref().unwrap_or("*"),
                    deal_type = %unit.deal_type,
                    stage = %unit.stage,
                    reason = %unit.reason,
                    "Skipped unit"
                );
            }
            ExitCode::from(2)
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::from(1)
        }
    }
}

fn run(cli: Cli) -> Result<Option<RunSummary>> {
    let mut config = PipelineConfig::from_env().context("loading configuration")?;
    if let Some(database) = cli.database {
        config.database_path = database;
    }
    let today = cli
        .today
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    info!(database = %config.database_path.display(), %today, "Starting homecast");

    let mut pipeline = Pipeline::new(config, today, store)?;
    let summary = match cli.command {
        Commands::Ingest { source_dir } => pipeline.ingest(&FileSource::new(source_dir))?,
        Commands::Forecast => pipeline.forecast()?,
        Commands::Run { source_dir } => pipeline.run(&FileSource::new(source_dir))?,
        Commands::Export { out } => {
            let files = write_region_csv(pipeline.store(), &out)?;
            info!(files = files.len(), "Export finished");
            return Ok(None);
        }
    };

    info!(
        observations = summary.observations_inserted,
        duplicates = summary.observations_skipped,
        predictions = summary.predictions_inserted,
        skipped_units = summary.skipped.len(),
        "Summary"
    );
    Ok(Some(summary))
}
