//! In-memory store for tests and dry runs

use super::Store;
use crate::error::{PipelineError, Result};
use crate::types::{InsertOutcome, Observation, Prediction, Region, SeriesKey};
use chrono::NaiveDate;
use std::collections::BTreeMap;

type RowKey = (SeriesKey, NaiveDate);

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    regions: BTreeMap<String, Region>,
    observations: BTreeMap<RowKey, Observation>,
    predictions: BTreeMap<RowKey, Prediction>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prediction_count(&self) -> usize {
        self.predictions.len()
    }
}

impl Store for MemoryStore {
    fn insert_region(&mut self, region: &Region) -> Result<InsertOutcome> {
        if self.regions.contains_key(&region.region_code) {
            return Ok(InsertOutcome::Skipped);
        }
        self.regions.insert(region.region_code.clone(), region.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn get_region(&self, region_code: &str) -> Result<Option<Region>> {
        Ok(self.regions.get(region_code).cloned())
    }

    fn list_regions(&self) -> Result<Vec<Region>> {
        Ok(self.regions.values().cloned().collect())
    }

    fn get_observation(&self, key: &SeriesKey, date: NaiveDate) -> Result<Option<Observation>> {
        Ok(self.observations.get(&(key.clone(), date)).cloned())
    }

    fn insert_observation(&mut self, observation: &Observation) -> Result<()> {
        let row_key = (observation.key(), observation.date);
        if self.observations.contains_key(&row_key) {
            return Err(PipelineError::StoreError(format!(
                "Observation {} at {} already exists",
                row_key.0, row_key.1
            )));
        }
        self.observations.insert(row_key, observation.clone());
        Ok(())
    }

    fn list_observations(&self, key: &SeriesKey) -> Result<Vec<Observation>> {
        Ok(self
            .observations
            .iter()
            .filter(|((series, _), _)| series == key)
            .map(|(_, obs)| obs.clone())
            .collect())
    }

    fn series_keys(&self) -> Result<Vec<SeriesKey>> {
        let mut keys: Vec<SeriesKey> = self
            .observations
            .keys()
            .map(|(series, _)| series.clone())
            .collect();
        keys.dedup();
        Ok(keys)
    }

    fn get_prediction(&self, key: &SeriesKey, date: NaiveDate) -> Result<Option<Prediction>> {
        Ok(self.predictions.get(&(key.clone(), date)).cloned())
    }

    fn insert_prediction(&mut self, prediction: &Prediction) -> Result<()> {
        let row_key = (prediction.key(), prediction.date);
        if self.predictions.contains_key(&row_key) {
            return Err(PipelineError::StoreError(format!(
                "Prediction {} at {} already exists",
                row_key.0, row_key.1
            )));
        }
        self.predictions.insert(row_key, prediction.clone());
        Ok(())
    }

    fn list_predictions(&self, key: &SeriesKey) -> Result<Vec<Prediction>> {
        Ok(self
            .predictions
            .iter()
            .filter(|((series, _), _)| series == key)
            .map(|(_, prediction)| prediction.clone())
            .collect())
    }
}
