//! Typed records shared across the pipeline

use crate::error::{PipelineError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction type of a price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DealType {
    /// Purchase prices (매매)
    Sale,
    /// Jeonse deposit prices (전세)
    Rent,
}

impl DealType {
    /// Both deal types, in processing order
    pub const ALL: [DealType; 2] = [DealType::Sale, DealType::Rent];

    /// Storage label
    pub fn as_str(&self) -> &'static str {
        match self {
            DealType::Sale => "sale",
            DealType::Rent => "rent",
        }
    }
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sale" | "매매" => Ok(DealType::Sale),
            "rent" | "전세" => Ok(DealType::Rent),
            other => Err(PipelineError::ValidationError(format!(
                "Unknown deal type: {}",
                other
            ))),
        }
    }
}

/// Identity of one (region, deal type) series
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    pub region_code: String,
    pub deal_type: DealType,
}

impl SeriesKey {
    pub fn new(region_code: impl Into<String>, deal_type: DealType) -> Self {
        Self {
            region_code: region_code.into(),
            deal_type,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.region_code, self.deal_type)
    }
}

/// A region with its canonical names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub region_code: String,
    pub name_local: String,
    pub name_en: String,
}

/// One melted cell of a raw series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    pub region_code: String,
    pub region_name: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// One resampled monthly price on a region's weekly grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPricePoint {
    pub date: NaiveDate,
    pub price: Option<f64>,
}

/// A normalized weekly row with its imputed price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub region_code: String,
    pub date: NaiveDate,
    pub deal_type: DealType,
    pub index_value: Option<f64>,
    pub avg_price: Option<f64>,
    pub is_interpolated: bool,
}

impl Observation {
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.region_code.clone(), self.deal_type)
    }
}

/// A forecast row for a future week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub region_code: String,
    pub date: NaiveDate,
    pub deal_type: DealType,
    pub predicted_index: Option<f64>,
    pub predicted_price: Option<f64>,
    pub prediction_accuracy: Option<f64>,
}

impl Prediction {
    pub fn key(&self) -> SeriesKey {
        SeriesKey::new(self.region_code.clone(), self.deal_type)
    }
}

/// Result of an idempotent insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was new and has been written
    Inserted,
    /// A row with the same natural key already existed
    Skipped,
}

/// Date-ordered index values of one series, ready for model fitting
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl IndexSeries {
    /// Create a series from parallel date and value vectors
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if dates.len() != values.len() {
            return Err(PipelineError::ValidationError(format!(
                "Dates length ({}) doesn't match values length ({})",
                dates.len(),
                values.len()
            )));
        }
        if dates.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(PipelineError::ValidationError(
                "Series dates must be strictly increasing".to_string(),
            ));
        }

        Ok(Self { dates, values })
    }

    /// Collect the indexed points of date-ordered observations
    pub fn from_observations(observations: &[Observation]) -> Result<Self> {
        let (dates, values) = observations
            .iter()
            .filter_map(|obs| obs.index_value.map(|value| (obs.date, value)))
            .unzip();
        Self::new(dates, values)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}
