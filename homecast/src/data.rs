//! Raw series loading and normalization
//!
//! Sources arrive either as wide tables (one row per region, one column per
//! period label) or as API payloads with a shared date list and per-region
//! value lists. Both are melted into [`LongRecord`]s and grouped per region.
//! Monthly prices are then resampled onto each region's weekly grid.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::types::{LongRecord, WeeklyPricePoint};
use crate::utils::first_of_month;
use chrono::{Months, NaiveDate};
use estate_math::interpolation::{lerp, step_weight};
use polars::prelude::*;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Column names recognised as the region column of a wide table
const REGION_COLUMNS: [&str; 3] = ["지역명", "region", "지역"];

/// Wide-format table: one row per region, one column per period label
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    periods: Vec<String>,
    rows: Vec<WideRow>,
}

/// One region row of a [`WideTable`]
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub region_name: String,
    pub values: Vec<Option<f64>>,
}

impl WideTable {
    /// Create a table, checking every row against the period labels
    pub fn new(periods: Vec<String>, rows: Vec<WideRow>) -> Result<Self> {
        if let Some(row) = rows.iter().find(|row| row.values.len() != periods.len()) {
            return Err(PipelineError::DataError(format!(
                "Row for {} has {} values but the table has {} periods",
                row.region_name,
                row.values.len(),
                periods.len()
            )));
        }

        Ok(Self { periods, rows })
    }

    /// Load a wide table from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Convert an existing DataFrame; non-numeric cells become `None`
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let region_column = Self::detect_region_column(df)?;
        let names = df.column(&region_column)?.cast(&DataType::Utf8)?;
        let region_names: Vec<String> = names
            .utf8()?
            .into_iter()
            .map(|name| name.unwrap_or_default().to_string())
            .collect();

        let mut periods = Vec::new();
        let mut columns = Vec::new();
        for series in df.get_columns() {
            if series.name() == region_column {
                continue;
            }
            let numeric = series.cast(&DataType::Float64)?;
            columns.push(numeric.f64()?.into_iter().collect::<Vec<Option<f64>>>());
            periods.push(series.name().to_string());
        }

        let rows = region_names
            .into_iter()
            .enumerate()
            .map(|(i, region_name)| WideRow {
                region_name,
                values: columns.iter().map(|column| column[i]).collect(),
            })
            .collect();

        Self::new(periods, rows)
    }

    /// Find the region column by name, falling back to the first column
    fn detect_region_column(df: &DataFrame) -> Result<String> {
        let column_names = df.get_column_names();

        for name in &column_names {
            let lower_name = name.trim().to_lowercase();
            if REGION_COLUMNS.contains(&lower_name.as_str()) {
                return Ok(name.to_string());
            }
        }

        column_names
            .first()
            .map(|name| name.to_string())
            .ok_or_else(|| PipelineError::DataError("Wide table has no columns".to_string()))
    }

    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    pub fn rows(&self) -> &[WideRow] {
        &self.rows
    }
}

/// KB API response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPayload {
    #[serde(rename = "dataBody", alias = "data_body")]
    pub data_body: PayloadBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadBody {
    pub data: PayloadData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadData {
    #[serde(rename = "날짜리스트", alias = "date_list")]
    pub date_list: Vec<Value>,
    #[serde(rename = "데이터리스트", alias = "data_list")]
    pub data_list: Vec<PayloadRegion>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PayloadRegion {
    #[serde(rename = "지역코드", alias = "region_code", default)]
    pub region_code: Option<Value>,
    #[serde(rename = "지역명", alias = "region_name")]
    pub region_name: String,
    #[serde(rename = "dataList", alias = "values")]
    pub values: Vec<Value>,
}

impl ApiPayload {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let payload: Self = serde_json::from_str(json)?;
        payload.validate()?;
        Ok(payload)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let payload: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        payload.validate()?;
        Ok(payload)
    }

    /// Every region must carry one value per date label
    pub fn validate(&self) -> Result<()> {
        let data = &self.data_body.data;
        if let Some(region) = data
            .data_list
            .iter()
            .find(|region| region.values.len() != data.date_list.len())
        {
            return Err(PipelineError::SourceError(format!(
                "Payload region {} has {} values but {} dates",
                region.region_name,
                region.values.len(),
                data.date_list.len()
            )));
        }

        Ok(())
    }
}

/// A raw series as delivered by a source adapter
#[derive(Debug, Clone)]
pub enum RawSeries {
    Wide(WideTable),
    Payload(ApiPayload),
}

impl RawSeries {
    /// Check shape invariants that deserialization cannot enforce
    pub fn validate(&self) -> Result<()> {
        match self {
            RawSeries::Wide(_) => Ok(()),
            RawSeries::Payload(payload) => payload.validate(),
        }
    }
}

/// Period granularity of a raw series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Weekly,
    Monthly,
}

/// Dated values for one region, ordered by date
#[derive(Debug, Clone, PartialEq)]
pub struct RegionSeries {
    pub region_code: String,
    pub region_name: String,
    pub points: BTreeMap<NaiveDate, Option<f64>>,
}

impl RegionSeries {
    /// The region's weekly date grid
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.keys().copied().collect()
    }
}

/// Melts raw series into long records
#[derive(Debug, Clone)]
pub struct SeriesNormalizer {
    weekly_formats: Vec<String>,
}

impl SeriesNormalizer {
    pub fn new(weekly_formats: Vec<String>) -> Self {
        Self { weekly_formats }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.weekly_date_formats.clone())
    }

    /// Parse a weekly date label with the configured formats
    pub fn parse_weekly_date(&self, label: &str) -> Option<NaiveDate> {
        let label = label.trim();
        self.weekly_formats
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(label, format).ok())
    }

    /// Parse a month label (`YYYY-MM`, `YYYYMM`, `YYYY.MM`) to the first of the month
    pub fn parse_month_label(label: &str) -> Option<NaiveDate> {
        let digits: String = label.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.len() {
            6 => {
                let year = digits[..4].parse().ok()?;
                let month = digits[4..].parse().ok()?;
                NaiveDate::from_ymd_opt(year, month, 1)
            }
            8 => NaiveDate::parse_from_str(&digits, "%Y%m%d")
                .ok()
                .map(first_of_month),
            _ => None,
        }
    }

    fn parse_date(&self, label: &str, cadence: Cadence) -> Option<NaiveDate> {
        match cadence {
            Cadence::Weekly => self.parse_weekly_date(label),
            Cadence::Monthly => Self::parse_month_label(label),
        }
    }

    /// Melt a raw series into long records.
    ///
    /// Rows with unparseable dates or empty region names are dropped. The first
    /// occurrence of a (region, date) pair wins.
    pub fn normalize(&self, raw: &RawSeries, cadence: Cadence) -> Vec<LongRecord> {
        let mut records = Vec::new();
        let mut seen = HashSet::new();

        let mut push = |code: &str, name: &str, label: &str, value: Option<f64>| {
            let code = code.trim();
            if code.is_empty() {
                debug!(label, "Dropping cell without a region");
                return;
            }
            let Some(date) = self.parse_date(label, cadence) else {
                debug!(region = code, label, "Dropping cell with unparseable date");
                return;
            };
            if !seen.insert((code.to_string(), date)) {
                debug!(region = code, %date, "Dropping duplicate cell");
                return;
            }
            records.push(LongRecord {
                region_code: code.to_string(),
                region_name: name.trim().to_string(),
                date,
                value,
            });
        };

        match raw {
            RawSeries::Wide(table) => {
                for row in table.rows() {
                    for (label, value) in table.periods().iter().zip(&row.values) {
                        push(&row.region_name, &row.region_name, label, *value);
                    }
                }
            }
            RawSeries::Payload(payload) => {
                let data = &payload.data_body.data;
                let labels: Vec<String> = data.date_list.iter().map(value_label).collect();
                for region in &data.data_list {
                    let code = region
                        .region_code
                        .as_ref()
                        .map(value_label)
                        .filter(|code| !code.trim().is_empty())
                        .unwrap_or_else(|| region.region_name.clone());
                    for (label, value) in labels.iter().zip(&region.values) {
                        push(&code, &region.region_name, label, lenient_number(value));
                    }
                }
            }
        }

        records
    }
}

/// Group long records into per-region series
pub fn group_by_region(records: Vec<LongRecord>) -> BTreeMap<String, RegionSeries> {
    let mut grouped: BTreeMap<String, RegionSeries> = BTreeMap::new();

    for record in records {
        let series = grouped
            .entry(record.region_code.clone())
            .or_insert_with(|| RegionSeries {
                region_code: record.region_code.clone(),
                region_name: record.region_name.clone(),
                points: BTreeMap::new(),
            });
        series.points.entry(record.date).or_insert(record.value);
    }

    grouped
}

/// Resample a monthly series (keyed by first of month) onto a weekly grid.
///
/// Each month's value holds at its first grid week and moves linearly toward
/// the following calendar month, reaching week `k` of `N` with weight
/// `k / (N - 1)`. Months without a value repeat the last known value flat, and
/// a month whose successor has no value is held flat.
pub fn resample_monthly(
    grid: &[NaiveDate],
    monthly: &BTreeMap<NaiveDate, Option<f64>>,
) -> Vec<WeeklyPricePoint> {
    let mut resampled = Vec::with_capacity(grid.len());
    let mut last_base: Option<f64> = None;
    let mut start = 0;

    while start < grid.len() {
        let month = first_of_month(grid[start]);
        let end = grid[start..]
            .iter()
            .position(|date| first_of_month(*date) != month)
            .map(|offset| start + offset)
            .unwrap_or(grid.len());
        let weeks = &grid[start..end];

        let current = monthly.get(&month).copied().flatten();
        if current.is_some() {
            last_base = current;
        }
        let next = current.and_then(|_| {
            month
                .checked_add_months(Months::new(1))
                .and_then(|successor| monthly.get(&successor).copied().flatten())
        });

        for (k, date) in weeks.iter().enumerate() {
            let price = match (last_base, next) {
                (Some(base), Some(next)) => Some(lerp(base, next, step_weight(k, weeks.len()))),
                (Some(base), None) => Some(base),
                (None, _) => None,
            };
            resampled.push(WeeklyPricePoint { date: *date, price });
        }

        start = end;
    }

    resampled
}

fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn lenient_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}
