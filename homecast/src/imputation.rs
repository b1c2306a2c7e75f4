//! Average price imputation
//!
//! Weekly index rows receive the month's source price on the first week of
//! each month. Remaining gaps are filled by index-ratio projection against the
//! reference anchor and then by date-weighted linear interpolation. Any row
//! whose price was missing before and present after is flagged as imputed.

use crate::data::RegionSeries;
use crate::error::{PipelineError, Result};
use crate::types::{DealType, Observation, SeriesKey, WeeklyPricePoint};
use crate::utils::{days_between, first_of_month};
use chrono::NaiveDate;
use estate_math::interpolation::interpolate_interior;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

/// Index value that defines the reference anchor
pub const ANCHOR_INDEX: f64 = 100.0;

/// Convert an index value to a price using the anchor price
pub fn index_to_price(index_value: f64, anchor_price: f64) -> f64 {
    (index_value / ANCHOR_INDEX) * anchor_price
}

/// True when `index_value` is the anchor index
pub fn is_anchor_index(index_value: f64) -> bool {
    (index_value - ANCHOR_INDEX).abs() < 1e-9
}

/// Counts of how a series' prices were filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImputationReport {
    pub source_prices: usize,
    pub ratio_filled: usize,
    pub interpolated: usize,
    pub left_null: usize,
}

/// Output of imputing one series
#[derive(Debug, Clone)]
pub struct ImputedSeries {
    pub observations: Vec<Observation>,
    pub anchor_price: Option<f64>,
    pub report: ImputationReport,
}

/// Fills missing average prices for one (region, deal type) series
#[derive(Debug, Clone)]
pub struct ImputationEngine {
    reference_date: NaiveDate,
}

impl ImputationEngine {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self { reference_date }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Attach monthly source prices to the first grid week of each month
    pub fn join_monthly(
        &self,
        weekly: &RegionSeries,
        deal_type: DealType,
        monthly: &BTreeMap<NaiveDate, Option<f64>>,
    ) -> Vec<Observation> {
        let mut seen_months = HashSet::new();

        weekly
            .points
            .iter()
            .map(|(&date, &index_value)| {
                let month = first_of_month(date);
                let avg_price = if seen_months.insert(month) {
                    monthly.get(&month).copied().flatten()
                } else {
                    None
                };
                Observation {
                    region_code: weekly.region_code.clone(),
                    date,
                    deal_type,
                    index_value,
                    avg_price,
                    is_interpolated: false,
                }
            })
            .collect()
    }

    /// Resolve the anchor price for a joined series.
    ///
    /// The row at the reference date must carry index 100. Its source price is
    /// used when present, otherwise the resampled monthly curve at that date.
    pub fn resolve_anchor(
        &self,
        observations: &[Observation],
        curve: &[WeeklyPricePoint],
    ) -> Result<f64> {
        let missing = || match observations.first() {
            Some(first) => PipelineError::MissingAnchor {
                region_code: first.region_code.clone(),
                deal_type: first.deal_type,
            },
            None => PipelineError::DataError("Cannot anchor an empty series".to_string()),
        };

        let reference = observations
            .iter()
            .find(|obs| obs.date == self.reference_date)
            .filter(|obs| obs.index_value.map(is_anchor_index).unwrap_or(false))
            .ok_or_else(missing)?;

        if let Some(price) = reference.avg_price {
            return Ok(price);
        }

        curve
            .iter()
            .find(|point| point.date == self.reference_date)
            .and_then(|point| point.price)
            .ok_or_else(missing)
    }

    /// Join, anchor and fill one region's weekly series
    pub fn impute(
        &self,
        weekly: &RegionSeries,
        deal_type: DealType,
        monthly: &BTreeMap<NaiveDate, Option<f64>>,
        curve: &[WeeklyPricePoint],
    ) -> Result<ImputedSeries> {
        let key = SeriesKey::new(weekly.region_code.clone(), deal_type);
        let mut observations = self.join_monthly(weekly, deal_type, monthly);
        let missing_before: Vec<bool> = observations
            .iter()
            .map(|obs| obs.avg_price.is_none())
            .collect();

        let mut report = ImputationReport {
            source_prices: missing_before.iter().filter(|missing| !**missing).count(),
            ..ImputationReport::default()
        };

        let anchor_price = match self.resolve_anchor(&observations, curve) {
            Ok(price) => Some(price),
            Err(err @ PipelineError::MissingAnchor { .. }) => {
                warn!(
                    series = %key,
                    reference_date = %self.reference_date,
                    "{}; ratio fill skipped",
                    err
                );
                None
            }
            Err(err) => return Err(err),
        };

        if let Some(anchor) = anchor_price {
            for obs in observations.iter_mut().filter(|obs| obs.avg_price.is_none()) {
                if let Some(index_value) = obs.index_value {
                    obs.avg_price = Some(index_to_price(index_value, anchor));
                    report.ratio_filled += 1;
                }
            }
        }

        if observations.iter().any(|obs| obs.avg_price.is_none()) {
            let origin = observations[0].date;
            let positions: Vec<f64> = observations
                .iter()
                .map(|obs| days_between(origin, obs.date))
                .collect();
            let prices: Vec<Option<f64>> = observations.iter().map(|obs| obs.avg_price).collect();
            let filled = interpolate_interior(&positions, &prices)?;

            for (obs, price) in observations.iter_mut().zip(filled) {
                if obs.avg_price.is_none() && price.is_some() {
                    obs.avg_price = price;
                    report.interpolated += 1;
                }
            }
        }

        for (obs, was_missing) in observations.iter_mut().zip(&missing_before) {
            obs.is_interpolated = *was_missing && obs.avg_price.is_some();
        }
        report.left_null = observations
            .iter()
            .filter(|obs| obs.avg_price.is_none())
            .count();

        debug!(
            series = %key,
            source = report.source_prices,
            ratio = report.ratio_filled,
            interpolated = report.interpolated,
            null = report.left_null,
            "Imputed average prices"
        );

        Ok(ImputedSeries {
            observations,
            anchor_price,
            report,
        })
    }
}
