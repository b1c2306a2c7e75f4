//! SQLite store
//!
//! Table layout:
//! - `kb_region(region_code PK, region_name_kor, region_name_eng)`
//! - `kb_property_price_data(region_code, date, price_type, index_value,
//!   avg_price, is_interpolated)` unique on `(region_code, date, price_type)`
//! - `kb_prediction(region_code, date, price_type, predicted_index,
//!   predicted_price, prediction_accuracy)` unique on the same key

use super::Store;
use crate::error::Result;
use crate::types::{DealType, InsertOutcome, Observation, Prediction, Region, SeriesKey};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS kb_region (
        region_code TEXT PRIMARY KEY,
        region_name_kor TEXT NOT NULL,
        region_name_eng TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS kb_property_price_data (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        region_code TEXT NOT NULL REFERENCES kb_region(region_code),
        date TEXT NOT NULL,
        price_type TEXT NOT NULL,
        index_value REAL,
        avg_price REAL,
        is_interpolated INTEGER NOT NULL DEFAULT 0,
        UNIQUE(region_code, date, price_type)
    );
    CREATE TABLE IF NOT EXISTS kb_prediction (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        region_code TEXT NOT NULL REFERENCES kb_region(region_code),
        date TEXT NOT NULL,
        price_type TEXT NOT NULL,
        predicted_index REAL,
        predicted_price REAL,
        prediction_accuracy REAL,
        UNIQUE(region_code, date, price_type)
    );
";

const OBSERVATION_COLUMNS: &str =
    "region_code, date, price_type, index_value, avg_price, is_interpolated";
const PREDICTION_COLUMNS: &str =
    "region_code, date, price_type, predicted_index, predicted_price, prediction_accuracy";

type ObservationRow = (String, NaiveDate, String, Option<f64>, Option<f64>, bool);
type PredictionRow = (String, NaiveDate, String, Option<f64>, Option<f64>, Option<f64>);

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Opened SQLite store");
        Self::with_connection(conn)
    }

    /// Private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn observation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ObservationRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn prediction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PredictionRow> {
        Ok((
            row.get(0)?,
            row.get(1)?,
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
        ))
    }

    fn into_observation(row: ObservationRow) -> Result<Observation> {
        let (region_code, date, price_type, index_value, avg_price, is_interpolated) = row;
        Ok(Observation {
            region_code,
            date,
            deal_type: price_type.parse()?,
            index_value,
            avg_price,
            is_interpolated,
        })
    }

    fn into_prediction(row: PredictionRow) -> Result<Prediction> {
        let (region_code, date, price_type, predicted_index, predicted_price, prediction_accuracy) =
            row;
        Ok(Prediction {
            region_code,
            date,
            deal_type: price_type.parse()?,
            predicted_index,
            predicted_price,
            prediction_accuracy,
        })
    }
}

impl Store for SqliteStore {
    fn insert_region(&mut self, region: &Region) -> Result<InsertOutcome> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO kb_region (region_code, region_name_kor, region_name_eng)
             VALUES (?1, ?2, ?3)",
            params![region.region_code, region.name_local, region.name_en],
        )?;

        Ok(if changed == 0 {
            InsertOutcome::Skipped
        } else {
            InsertOutcome::Inserted
        })
    }

    fn get_region(&self, region_code: &str) -> Result<Option<Region>> {
        let region = self
            .conn
            .query_row(
                "SELECT region_code, region_name_kor, region_name_eng
                 FROM kb_region WHERE region_code = ?1",
                params![region_code],
                |row| {
                    Ok(Region {
                        region_code: row.get(0)?,
                        name_local: row.get(1)?,
                        name_en: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(region)
    }

    fn list_regions(&self) -> Result<Vec<Region>> {
        let mut stmt = self.conn.prepare(
            "SELECT region_code, region_name_kor, region_name_eng
             FROM kb_region ORDER BY region_code",
        )?;
        let regions = stmt
            .query_map([], |row| {
                Ok(Region {
                    region_code: row.get(0)?,
                    name_local: row.get(1)?,
                    name_en: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(regions)
    }

    fn get_observation(&self, key: &SeriesKey, date: NaiveDate) -> Result<Option<Observation>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM kb_property_price_data
                     WHERE region_code = ?1 AND date = ?2 AND price_type = ?3",
                    OBSERVATION_COLUMNS
                ),
                params![key.region_code, date, key.deal_type.as_str()],
                Self::observation_row,
            )
            .optional()?;
        row.map(Self::into_observation).transpose()
    }

    fn insert_observation(&mut self, observation: &Observation) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO kb_property_price_data ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                OBSERVATION_COLUMNS
            ),
            params![
                observation.region_code,
                observation.date,
                observation.deal_type.as_str(),
                observation.index_value,
                observation.avg_price,
                observation.is_interpolated,
            ],
        )?;
        Ok(())
    }

    fn list_observations(&self, key: &SeriesKey) -> Result<Vec<Observation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM kb_property_price_data
             WHERE region_code = ?1 AND price_type = ?2 ORDER BY date",
            OBSERVATION_COLUMNS
        ))?;
        let rows = stmt
            .query_map(
                params![key.region_code, key.deal_type.as_str()],
                Self::observation_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(Self::into_observation).collect()
    }

    fn series_keys(&self) -> Result<Vec<SeriesKey>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT region_code, price_type FROM kb_property_price_data
             ORDER BY region_code, price_type",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut keys = rows
            .into_iter()
            .map(|(region_code, price_type)| {
                Ok(SeriesKey::new(region_code, price_type.parse::<DealType>()?))
            })
            .collect::<Result<Vec<_>>>()?;
        keys.sort();
        Ok(keys)
    }

    fn get_prediction(&self, key: &SeriesKey, date: NaiveDate) -> Result<Option<Prediction>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM kb_prediction
                     WHERE region_code = ?1 AND date = ?2 AND price_type = ?3",
                    PREDICTION_COLUMNS
                ),
                params![key.region_code, date, key.deal_type.as_str()],
                Self::prediction_row,
            )
            .optional()?;
        row.map(Self::into_prediction).transpose()
    }

    fn insert_prediction(&mut self, prediction: &Prediction) -> Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO kb_prediction ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                PREDICTION_COLUMNS
            ),
            params![
                prediction.region_code,
                prediction.date,
                prediction.deal_type.as_str(),
                prediction.predicted_index,
                prediction.predicted_price,
                prediction.prediction_accuracy,
            ],
        )?;
        Ok(())
    }

    fn list_predictions(&self, key: &SeriesKey) -> Result<Vec<Prediction>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM kb_prediction
             WHERE region_code = ?1 AND price_type = ?2 ORDER BY date",
            PREDICTION_COLUMNS
        ))?;
        let rows = stmt
            .query_map(
                params![key.region_code, key.deal_type.as_str()],
                Self::prediction_row,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(Self::into_prediction).collect()
    }
}
