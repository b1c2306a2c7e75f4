//! Moving average calculation implementations
//!
//! Contains the trailing Simple Moving Average used to smooth forecast curves,
//! both as a streaming accumulator and as a batch `rolling_mean` helper.

use crate::{MathError, Result};
use std::collections::VecDeque;

/// Simple Moving Average (SMA) implementation
#[derive(Debug, Clone)]
pub struct SimpleMovingAverage {
    period: usize,
    min_periods: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl SimpleMovingAverage {
    /// Create a new Simple Moving Average that requires a full window
    pub fn new(period: usize) -> Result<Self> {
        Self::with_min_periods(period, period)
    }

    /// Create a Simple Moving Average that reports a value once `min_periods`
    /// observations are in the window.
    pub fn with_min_periods(period: usize, min_periods: usize) -> Result<Self> {
        if period == 0 {
            return Err(MathError::InvalidInput(
                "Period must be greater than zero".to_string(),
            ));
        }
        if min_periods == 0 || min_periods > period {
            return Err(MathError::InvalidInput(format!(
                "Minimum periods must be between 1 and {}, got {}",
                period, min_periods
            )));
        }

        Ok(Self {
            period,
            min_periods,
            values: VecDeque::with_capacity(period),
            sum: 0.0,
        })
    }

    /// Update the SMA with a new value
    pub fn update(&mut self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(MathError::InvalidInput(format!(
                "Cannot average non-finite value {}",
                value
            )));
        }

        self.values.push_back(value);
        self.sum += value;

        if self.values.len() > self.period {
            if let Some(old_value) = self.values.pop_front() {
                self.sum -= old_value;
            }
        }

        Ok(())
    }

    /// Get the current SMA value over the observations in the window
    pub fn value(&self) -> Result<f64> {
        if self.values.len() < self.min_periods {
            return Err(MathError::InsufficientData(format!(
                "Not enough data for SMA calculation. Need {} values, have {}.",
                self.min_periods,
                self.values.len()
            )));
        }

        Ok(self.sum / self.values.len() as f64)
    }
}

/// Trailing rolling mean over `values`.
///
/// Output has the same length as the input. Positions with fewer than
/// `min_periods` observations in the window are `None`.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Result<Vec<Option<f64>>> {
    let mut sma = SimpleMovingAverage::with_min_periods(window, min_periods)?;
    let mut smoothed = Vec::with_capacity(values.len());

    for &value in values {
        sma.update(value)?;
        smoothed.push(sma.value().ok());
    }

    Ok(smoothed)
}
