//! Metrics for evaluating forecast fit

use crate::error::{PipelineError, Result};
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::types::IndexSeries;
use serde::Serialize;

/// Calculate accuracy metrics for a forecast vs actual values
pub fn forecast_accuracy(forecast: &[f64], actual: &[f64]) -> Result<ForecastAccuracy> {
    if forecast.len() != actual.len() || forecast.is_empty() {
        return Err(PipelineError::ValidationError(
            "Forecast and actual values must have the same non-zero length".to_string(),
        ));
    }

    let n = forecast.len() as f64;

    let errors: Vec<f64> = forecast
        .iter()
        .zip(actual.iter())
        .map(|(&f, &a)| a - f)
        .collect();

    // Mean Absolute Error
    let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;

    // Mean Squared Error
    let mse = errors.iter().map(|e| e.powi(2)).sum::<f64>() / n;

    let rmse = mse.sqrt();

    // Mean Absolute Percentage Error over non-zero actuals
    let nonzero = actual.iter().filter(|&&a| a != 0.0).count();
    let mape = if nonzero == 0 {
        0.0
    } else {
        actual
            .iter()
            .zip(errors.iter())
            .filter(|(&a, _)| a != 0.0)
            .map(|(&a, &e)| (e.abs() / a.abs()) * 100.0)
            .sum::<f64>()
            / nonzero as f64
    };

    Ok(ForecastAccuracy {
        mae,
        mse,
        rmse,
        mape,
    })
}

/// Train `model` on `data` and score its in-sample fit
pub fn in_sample_accuracy<M: ForecastModel>(
    model: &M,
    data: &IndexSeries,
) -> Result<ForecastAccuracy> {
    let trained = model.train(data)?;
    let fitted = trained.predict(data)?;

    forecast_accuracy(fitted.values(), data.values())
}

/// Forecast accuracy metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastAccuracy {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error
    pub mape: f64,
}

impl std::fmt::Display for ForecastAccuracy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Accuracy Metrics:")?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  MSE:   {:.4}", self.mse)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        Ok(())
    }
}
