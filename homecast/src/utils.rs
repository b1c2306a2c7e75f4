//! Utility functions for the homecast crate

use crate::error::{PipelineError, Result};
use chrono::{Datelike, Duration, NaiveDate};

/// First day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Weekly dates following `last_date`: `last_date + 7h` for `h = 1..=horizon`
pub fn future_weekly_dates(last_date: NaiveDate, horizon: usize) -> Result<Vec<NaiveDate>> {
    let mut dates = Vec::with_capacity(horizon);
    let mut current = last_date;

    for _ in 0..horizon {
        current = current.checked_add_signed(Duration::weeks(1)).ok_or_else(|| {
            PipelineError::ValidationError(format!(
                "Forecast horizon of {} weeks overflows the calendar from {}",
                horizon, last_date
            ))
        })?;
        dates.push(current);
    }

    Ok(dates)
}

/// Signed number of days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64
}

/// File-system safe stem for a region code
pub fn file_stem(region_code: &str) -> String {
    let stem: String = region_code
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();

    if stem.is_empty() {
        "region".to_string()
    } else {
        stem
    }
}
