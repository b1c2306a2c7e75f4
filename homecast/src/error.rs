//! Error types for the homecast crate

use crate::types::DealType;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the homecast crate
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error related to forecasting operations
    #[error("Forecasting error: {0}")]
    ForecastingError(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A raw series could not be fetched from its source
    #[error("Source error: {0}")]
    SourceError(String),

    /// No index-100 observation with a price exists at the reference date
    #[error("Missing reference anchor for {region_code}/{deal_type}")]
    MissingAnchor {
        region_code: String,
        deal_type: DealType,
    },

    /// Error from the persistence layer
    #[error("Store error: {0}")]
    StoreError(String),

    /// Error from mathematical operations
    #[error("Math error: {0}")]
    MathError(#[from] estate_math::MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error decoding a JSON payload
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Error reading or writing CSV
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, PipelineError>;

impl From<PolarsError> for PipelineError {
    fn from(err: PolarsError) -> Self {
        PipelineError::PolarsError(err.to_string())
    }
}

impl From<rusqlite::Error> for PipelineError {
    fn from(err: rusqlite::Error) -> Self {
        PipelineError::StoreError(err.to_string())
    }
}
