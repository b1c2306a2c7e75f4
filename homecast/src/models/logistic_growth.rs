//! Saturating logistic trend with additive yearly seasonality
//!
//! The trend `cap / (1 + exp(-(k t + m)))` is fitted in logit space with `t`
//! scaled to `[0, 1]` over the training span. The cap is a fixed multiple of
//! the series maximum. Seasonality is a Fourier series over calendar days with
//! ridge-regularized coefficients. Trend and seasonality are refined by
//! alternating fits on each other's residuals.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::models::{ForecastModel, ForecastResult, TrainedForecastModel};
use crate::types::IndexSeries;
use crate::utils::days_between;
use chrono::NaiveDate;
use estate_math::forecasting::{fourier_terms, solve_ridge, LogisticCurve};
use statrs::statistics::Statistics;

/// Length of the seasonal cycle in days
pub const YEARLY_PERIOD_DAYS: f64 = 365.25;

/// Logistic growth model configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticGrowth {
    cap_multiplier: f64,
    fourier_order: usize,
    seasonality_ridge: f64,
    backfit_iterations: usize,
    min_history_points: usize,
}

impl LogisticGrowth {
    /// Create a new model
    pub fn new(cap_multiplier: f64, fourier_order: usize) -> Result<Self> {
        if !(cap_multiplier.is_finite() && cap_multiplier > 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Cap multiplier must be greater than 1, got {}",
                cap_multiplier
            )));
        }

        Ok(Self {
            cap_multiplier,
            fourier_order,
            seasonality_ridge: 0.1,
            backfit_iterations: 3,
            min_history_points: 2,
        })
    }

    /// Build a model from pipeline settings
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        Self::new(config.cap_multiplier, config.fourier_order)?
            .with_seasonality_ridge(config.seasonality_ridge)?
            .with_backfit_iterations(config.backfit_iterations)
            .with_min_history_points(config.min_history_points)
    }

    /// Set the per-observation ridge penalty on seasonal coefficients
    pub fn with_seasonality_ridge(mut self, ridge: f64) -> Result<Self> {
        if !(ridge.is_finite() && ridge >= 0.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Seasonality ridge must be non-negative, got {}",
                ridge
            )));
        }
        self.seasonality_ridge = ridge;
        Ok(self)
    }

    pub fn with_backfit_iterations(mut self, iterations: usize) -> Self {
        self.backfit_iterations = iterations.max(1);
        self
    }

    pub fn with_min_history_points(mut self, points: usize) -> Result<Self> {
        if points < 2 {
            return Err(PipelineError::InvalidParameter(
                "At least two history points are needed to fit a trend".to_string(),
            ));
        }
        self.min_history_points = points;
        Ok(self)
    }

    pub fn cap_multiplier(&self) -> f64 {
        self.cap_multiplier
    }

    pub fn fourier_order(&self) -> usize {
        self.fourier_order
    }

    fn validate(&self, data: &IndexSeries) -> Result<()> {
        if data.len() < self.min_history_points {
            return Err(PipelineError::ForecastingError(format!(
                "Insufficient history: {} points, need at least {}",
                data.len(),
                self.min_history_points
            )));
        }
        if let Some(bad) = data.values().iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(PipelineError::ValidationError(format!(
                "Index values must be positive and finite, found {}",
                bad
            )));
        }

        Ok(())
    }
}

impl ForecastModel for LogisticGrowth {
    type Trained = TrainedLogisticGrowth;

    fn train(&self, data: &IndexSeries) -> Result<Self::Trained> {
        self.validate(data)?;

        let dates = data.dates();
        let values = data.values();
        let origin = dates[0];
        let span_days = days_between(origin, dates[dates.len() - 1]);
        if span_days <= 0.0 {
            return Err(PipelineError::ForecastingError(
                "Series covers a single date; cannot scale time".to_string(),
            ));
        }

        let cap = self.cap_multiplier * Statistics::max(values.iter());
        let ts: Vec<f64> = dates
            .iter()
            .map(|date| days_between(origin, *date) / span_days)
            .collect();
        let design: Vec<Vec<f64>> = dates
            .iter()
            .map(|date| {
                fourier_terms(
                    days_between(origin, *date),
                    YEARLY_PERIOD_DAYS,
                    self.fourier_order,
                )
            })
            .collect();
        let lambda = self.seasonality_ridge * values.len() as f64;

        let mut seasonal = vec![0.0; values.len()];
        let mut trend = LogisticCurve::new(cap, 0.0, 0.0)?;
        let mut coefficients = vec![0.0; 2 * self.fourier_order];

        for _ in 0..self.backfit_iterations {
            let deseasonalized: Vec<f64> = values
                .iter()
                .zip(&seasonal)
                .map(|(y, s)| y - s)
                .collect();
            trend = LogisticCurve::fit(&ts, &deseasonalized, cap)?;

            if self.fourier_order == 0 {
                break;
            }
            let residuals: Vec<f64> = values
                .iter()
                .zip(&ts)
                .map(|(y, t)| y - trend.value(*t))
                .collect();
            coefficients = solve_ridge(&design, &residuals, lambda)?;
            seasonal = design.iter().map(|row| dot(row, &coefficients)).collect();
        }

        Ok(TrainedLogisticGrowth {
            name: "Logistic Growth".to_string(),
            trend,
            coefficients,
            fourier_order: self.fourier_order,
            origin,
            span_days,
        })
    }

    fn name(&self) -> &str {
        "Logistic Growth"
    }
}

/// Trained logistic growth model
#[derive(Debug, Clone)]
pub struct TrainedLogisticGrowth {
    name: String,
    trend: LogisticCurve,
    coefficients: Vec<f64>,
    fourier_order: usize,
    origin: NaiveDate,
    span_days: f64,
}

impl TrainedLogisticGrowth {
    /// The fitted trend curve
    pub fn trend(&self) -> &LogisticCurve {
        &self.trend
    }

    /// The saturation cap used for this series
    pub fn cap(&self) -> f64 {
        self.trend.cap()
    }

    /// Trend component at `date`
    pub fn trend_at(&self, date: NaiveDate) -> f64 {
        self.trend.value(days_between(self.origin, date) / self.span_days)
    }

    /// Seasonal component at `date`
    pub fn seasonal_at(&self, date: NaiveDate) -> f64 {
        if self.fourier_order == 0 {
            return 0.0;
        }
        let terms = fourier_terms(
            days_between(self.origin, date),
            YEARLY_PERIOD_DAYS,
            self.fourier_order,
        );
        dot(&terms, &self.coefficients)
    }
}

impl TrainedForecastModel for TrainedLogisticGrowth {
    fn forecast(&self, dates: &[NaiveDate]) -> Result<ForecastResult> {
        let values = dates
            .iter()
            .map(|date| self.trend_at(*date) + self.seasonal_at(*date))
            .collect();

        ForecastResult::new(values, dates.to_vec())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
