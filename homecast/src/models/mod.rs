//! Forecasting models for weekly index series

use crate::error::{PipelineError, Result};
use crate::types::IndexSeries;
use chrono::NaiveDate;
use std::fmt::Debug;

/// Forecast result containing predicted values at given dates
#[derive(Debug, Clone)]
pub struct ForecastResult {
    /// Forecasted values
    pub(crate) values: Vec<f64>,
    /// Dates the values belong to
    pub(crate) dates: Vec<NaiveDate>,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, dates: Vec<NaiveDate>) -> Result<Self> {
        if values.len() != dates.len() {
            return Err(PipelineError::ValidationError(format!(
                "Values length ({}) doesn't match dates length ({})",
                values.len(),
                dates.len()
            )));
        }

        Ok(Self { values, dates })
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Get the forecast dates
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }
}

/// Trained forecast model
pub trait TrainedForecastModel: Debug {
    /// Evaluate the model at arbitrary dates
    fn forecast(&self, dates: &[NaiveDate]) -> Result<ForecastResult>;

    /// Predict values for the training data
    fn predict(&self, data: &IndexSeries) -> Result<ForecastResult> {
        self.forecast(data.dates())
    }

    /// Name of the model
    fn name(&self) -> &str;
}

/// Forecast model that can be trained on an index series
pub trait ForecastModel: Debug + Clone {
    /// The type of trained model produced
    type Trained: TrainedForecastModel;

    /// Train the model on an index series
    fn train(&self, data: &IndexSeries) -> Result<Self::Trained>;

    /// Get the name of the model
    fn name(&self) -> &str;
}

pub mod logistic_growth;
