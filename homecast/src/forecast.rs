//! Per-series forecast engine
//!
//! Fits the growth model to one series' index history, extends it weekly over
//! the configured horizon, smooths the whole curve with a trailing mean and
//! keeps only the future part.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::imputation::index_to_price;
use crate::metrics::{forecast_accuracy, ForecastAccuracy};
use crate::models::logistic_growth::LogisticGrowth;
use crate::models::{ForecastModel, TrainedForecastModel};
use crate::types::{IndexSeries, Observation, Prediction, SeriesKey};
use crate::utils::future_weekly_dates;
use chrono::NaiveDate;
use estate_math::moving_averages::rolling_mean;
use tracing::info;

/// Forecast output for one series
#[derive(Debug, Clone)]
pub struct SeriesForecast {
    pub key: SeriesKey,
    pub predictions: Vec<Prediction>,
    /// In-sample fit of the raw model curve
    pub accuracy: ForecastAccuracy,
    pub cap: f64,
    pub last_history_date: NaiveDate,
}

/// Runs the growth model for single series
#[derive(Debug, Clone)]
pub struct ForecastEngine {
    model: LogisticGrowth,
    horizon_weeks: usize,
    smoothing_window: usize,
    smoothing_min_periods: usize,
}

impl ForecastEngine {
    pub fn new(
        model: LogisticGrowth,
        horizon_weeks: usize,
        smoothing_window: usize,
        smoothing_min_periods: usize,
    ) -> Result<Self> {
        if horizon_weeks == 0 {
            return Err(PipelineError::InvalidParameter(
                "Forecast horizon must be at least one week".to_string(),
            ));
        }
        if smoothing_window == 0
            || smoothing_min_periods == 0
            || smoothing_min_periods > smoothing_window
        {
            return Err(PipelineError::InvalidParameter(format!(
                "Invalid smoothing window {} with min periods {}",
                smoothing_window, smoothing_min_periods
            )));
        }

        Ok(Self {
            model,
            horizon_weeks,
            smoothing_window,
            smoothing_min_periods,
        })
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(
            LogisticGrowth::from_config(config)?,
            config.horizon_weeks,
            config.smoothing_window,
            config.smoothing_min_periods,
        )
    }

    pub fn model(&self) -> &LogisticGrowth {
        &self.model
    }

    /// Forecast a series from its date-ordered observations.
    ///
    /// Predictions are emitted only for dates after both `today` and the last
    /// historical date. Prices are derived from `anchor_price` when given.
    pub fn forecast_series(
        &self,
        key: &SeriesKey,
        observations: &[Observation],
        anchor_price: Option<f64>,
        today: NaiveDate,
    ) -> Result<SeriesForecast> {
        let history = IndexSeries::from_observations(observations)?;
        let trained = self.model.train(&history)?;
        let last_history_date = history.last_date().ok_or_else(|| {
            PipelineError::ForecastingError(format!("Series {} has no indexed history", key))
        })?;

        let fitted = trained.predict(&history)?;
        let accuracy = forecast_accuracy(fitted.values(), history.values())?;

        let future_dates = future_weekly_dates(last_history_date, self.horizon_weeks)?;
        let projected = trained.forecast(&future_dates)?;

        let curve: Vec<f64> = fitted
            .values()
            .iter()
            .chain(projected.values())
            .copied()
            .collect();
        let smoothed = rolling_mean(&curve, self.smoothing_window, self.smoothing_min_periods)?;

        let predictions: Vec<Prediction> = future_dates
            .iter()
            .zip(&smoothed[history.len()..])
            .filter(|(date, _)| **date > today && **date > last_history_date)
            .map(|(date, value)| Prediction {
                region_code: key.region_code.clone(),
                date: *date,
                deal_type: key.deal_type,
                predicted_index: *value,
                predicted_price: (*value).zip(anchor_price).map(|(v, a)| index_to_price(v, a)),
                prediction_accuracy: None,
            })
            .collect();

        info!(
            series = %key,
            model = trained.name(),
            history = history.len(),
            predictions = predictions.len(),
            mae = accuracy.mae,
            rmse = accuracy.rmse,
            mape = accuracy.mape,
            "Fitted forecast"
        );

        Ok(SeriesForecast {
            key: key.clone(),
            predictions,
            accuracy,
            cap: trained.cap(),
            last_history_date,
        })
    }
}
