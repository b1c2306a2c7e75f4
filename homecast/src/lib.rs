//! # Homecast
//!
//! A Rust library for normalizing real-estate price indices and forecasting
//! them with a saturating growth model.
//!
//! ## Features
//!
//! - Wide-table (CSV / polars) and API payload ingestion
//! - Monthly-to-weekly resampling onto each region's weekly grid
//! - Average price imputation by index ratio and linear interpolation, with
//!   provenance flags
//! - Logistic growth forecasting with yearly Fourier seasonality
//! - Idempotent persistence (in-memory or SQLite)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use homecast::{FileSource, Pipeline, PipelineConfig, SqliteStore};
//!
//! # fn main() -> homecast::Result<()> {
//! let config = PipelineConfig::from_env()?;
//! let store = SqliteStore::open(&config.database_path)?;
//! let today = chrono::Local::now().date_naive();
//!
//! let mut pipeline = Pipeline::new(config, today, store)?;
//! let summary = pipeline.run(&FileSource::new("data"))?;
//! println!("{} predictions written", summary.predictions_inserted);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod forecast;
pub mod imputation;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod source;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{PipelineConfig, SourceFailurePolicy};
pub use crate::data::{RawSeries, SeriesNormalizer, WideTable};
pub use crate::error::{PipelineError, Result};
pub use crate::forecast::ForecastEngine;
pub use crate::imputation::ImputationEngine;
pub use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
pub use crate::pipeline::{Pipeline, RunContext, RunSummary};
pub use crate::registry::RegionRegistry;
pub use crate::source::{FileSource, SourceAdapter, StaticSource};
pub use crate::store::{MemoryStore, SqliteStore, Store};
pub use crate::types::{DealType, InsertOutcome, Observation, Prediction, Region, SeriesKey};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
