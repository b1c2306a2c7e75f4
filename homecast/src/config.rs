//! Run configuration with environment overrides

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// What to do when a raw source cannot be fetched or decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceFailurePolicy {
    /// Stop the run and return the error
    Abort,
    /// Log the failure and continue with partial data
    #[default]
    Skip,
}

impl FromStr for SourceFailurePolicy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(SourceFailurePolicy::Abort),
            "skip" => Ok(SourceFailurePolicy::Skip),
            other => Err(PipelineError::InvalidParameter(format!(
                "Unknown source failure policy: {}",
                other
            ))),
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Date at which every series is indexed to 100
    pub reference_date: NaiveDate,
    /// Growth cap as a multiple of the series maximum
    pub cap_multiplier: f64,
    /// Number of weekly periods to forecast
    pub horizon_weeks: usize,
    /// Trailing moving-average window applied to the forecast curve
    pub smoothing_window: usize,
    pub smoothing_min_periods: usize,
    /// Order of the yearly Fourier seasonality
    pub fourier_order: usize,
    /// Ridge penalty per observation for the seasonal coefficients
    pub seasonality_ridge: f64,
    /// Trend/seasonality refinement passes
    pub backfit_iterations: usize,
    /// Minimum indexed points needed to fit a series
    pub min_history_points: usize,
    pub source_policy: SourceFailurePolicy,
    /// Accepted weekly date formats, tried in order
    pub weekly_date_formats: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("homecast.db"),
            reference_date: NaiveDate::from_ymd_opt(2022, 1, 10).unwrap_or_default(),
            cap_multiplier: 1.5,
            horizon_weeks: 156,
            smoothing_window: 7,
            smoothing_min_periods: 1,
            fourier_order: 10,
            seasonality_ridge: 0.1,
            backfit_iterations: 3,
            min_history_points: 2,
            source_policy: SourceFailurePolicy::Skip,
            weekly_date_formats: vec![
                "%y.%m.%d".to_string(),
                "%Y%m%d".to_string(),
                "%Y-%m-%d".to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Load defaults overridden by `HOMECAST_*` environment variables.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        if let Ok(path) = env::var("HOMECAST_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(date) = env_value::<String>("HOMECAST_REFERENCE_DATE")? {
            config.reference_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                PipelineError::InvalidParameter(format!(
                    "HOMECAST_REFERENCE_DATE must be YYYY-MM-DD: {}",
                    e
                ))
            })?;
        }
        if let Some(multiplier) = env_value("HOMECAST_CAP_MULTIPLIER")? {
            config.cap_multiplier = multiplier;
        }
        if let Some(horizon) = env_value("HOMECAST_HORIZON_WEEKS")? {
            config.horizon_weeks = horizon;
        }
        if let Some(window) = env_value("HOMECAST_SMOOTHING_WINDOW")? {
            config.smoothing_window = window;
        }
        if let Some(order) = env_value("HOMECAST_FOURIER_ORDER")? {
            config.fourier_order = order;
        }
        if let Some(min_history) = env_value("HOMECAST_MIN_HISTORY")? {
            config.min_history_points = min_history;
        }
        if let Some(policy) = env_value::<String>("HOMECAST_SOURCE_POLICY")? {
            config.source_policy = policy.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that parameters are usable
    pub fn validate(&self) -> Result<()> {
        if !(self.cap_multiplier.is_finite() && self.cap_multiplier > 1.0) {
            return Err(PipelineError::InvalidParameter(format!(
                "Cap multiplier must be greater than 1, got {}",
                self.cap_multiplier
            )));
        }
        if self.horizon_weeks == 0 {
            return Err(PipelineError::InvalidParameter(
                "Forecast horizon must be at least one week".to_string(),
            ));
        }
        if self.smoothing_window == 0 {
            return Err(PipelineError::InvalidParameter(
                "Smoothing window must be greater than zero".to_string(),
            ));
        }
        if self.smoothing_min_periods == 0 || self.smoothing_min_periods > self.smoothing_window {
            return Err(PipelineError::InvalidParameter(format!(
                "Smoothing min periods must be between 1 and {}",
                self.smoothing_window
            )));
        }
        if self.seasonality_ridge < 0.0 {
            return Err(PipelineError::InvalidParameter(
                "Seasonality ridge penalty cannot be negative".to_string(),
            ));
        }
        if self.min_history_points < 2 {
            return Err(PipelineError::InvalidParameter(
                "At least two history points are needed to fit a trend".to_string(),
            ));
        }
        if self.weekly_date_formats.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "At least one weekly date format is required".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_value<T>(name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            PipelineError::InvalidParameter(format!("{} has an invalid value: {}", name, e))
        }),
        Err(_) => Ok(None),
    }
}
