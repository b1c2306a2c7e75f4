//! # Estate Math
//!
//! Numeric kernels behind the price-index pipeline.
//! This crate provides the rolling means, regressions, saturating growth curves
//! and interpolation routines used to normalize and forecast index series.

use thiserror::Error;

pub mod forecasting;
pub mod interpolation;
pub mod moving_averages;

/// Errors that can occur in numeric calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for numeric operations
pub type Result<T> = std::result::Result<T, MathError>;
