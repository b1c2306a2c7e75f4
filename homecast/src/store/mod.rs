//! Persistence of regions, observations and predictions
//!
//! Observations and predictions are keyed by (region, date, deal type). Writes
//! go through [`Store::put_observation`] and [`Store::put_prediction`], which
//! check for an existing row first and never overwrite one.

use crate::error::{PipelineError, Result};
use crate::imputation::is_anchor_index;
use crate::types::{InsertOutcome, Observation, Prediction, Region, SeriesKey};
use chrono::NaiveDate;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Storage backend for the pipeline
pub trait Store {
    /// Insert a region unless its code already exists
    fn insert_region(&mut self, region: &Region) -> Result<InsertOutcome>;

    fn get_region(&self, region_code: &str) -> Result<Option<Region>>;

    fn list_regions(&self) -> Result<Vec<Region>>;

    fn get_observation(&self, key: &SeriesKey, date: NaiveDate) -> Result<Option<Observation>>;

    /// Write an observation; the key must not exist yet
    fn insert_observation(&mut self, observation: &Observation) -> Result<()>;

    /// All observations of a series, ordered by date
    fn list_observations(&self, key: &SeriesKey) -> Result<Vec<Observation>>;

    /// Every (region, deal type) that has at least one observation
    fn series_keys(&self) -> Result<Vec<SeriesKey>>;

    fn get_prediction(&self, key: &SeriesKey, date: NaiveDate) -> Result<Option<Prediction>>;

    /// Write a prediction; the key must not exist yet
    fn insert_prediction(&mut self, prediction: &Prediction) -> Result<()>;

    /// All predictions of a series, ordered by date
    fn list_predictions(&self, key: &SeriesKey) -> Result<Vec<Prediction>>;

    /// Price of the index-100 observation at `reference_date`, if any
    fn anchor_price(&self, key: &SeriesKey, reference_date: NaiveDate) -> Result<Option<f64>> {
        Ok(self
            .get_observation(key, reference_date)?
            .filter(|obs| obs.index_value.map(is_anchor_index).unwrap_or(false))
            .and_then(|obs| obs.avg_price))
    }

    /// Like [`Store::anchor_price`], failing with `MissingAnchor` when absent
    fn require_anchor(&self, key: &SeriesKey, reference_date: NaiveDate) -> Result<f64> {
        self.anchor_price(key, reference_date)?
            .ok_or_else(|| PipelineError::MissingAnchor {
                region_code: key.region_code.clone(),
                deal_type: key.deal_type,
            })
    }

    /// Insert an observation unless its key already exists
    fn put_observation(&mut self, observation: &Observation) -> Result<InsertOutcome> {
        if self
            .get_observation(&observation.key(), observation.date)?
            .is_some()
        {
            return Ok(InsertOutcome::Skipped);
        }
        self.insert_observation(observation)?;
        Ok(InsertOutcome::Inserted)
    }

    /// Insert a prediction unless its key already exists
    fn put_prediction(&mut self, prediction: &Prediction) -> Result<InsertOutcome> {
        if self
            .get_prediction(&prediction.key(), prediction.date)?
            .is_some()
        {
            return Ok(InsertOutcome::Skipped);
        }
        self.insert_prediction(prediction)?;
        Ok(InsertOutcome::Inserted)
    }
}
