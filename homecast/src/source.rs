//! Raw series sources
//!
//! A source hands out one raw series per (deal type, kind) request. Weekly
//! index and monthly average price series are fetched separately.

use crate::data::{ApiPayload, Cadence, RawSeries, WideTable};
use crate::error::{PipelineError, Result};
use crate::types::DealType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Which series of a deal type to fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Weekly price index
    WeeklyIndex,
    /// Monthly average price (10k won)
    MonthlyPrice,
}

impl SourceKind {
    pub fn cadence(&self) -> Cadence {
        match self {
            SourceKind::WeeklyIndex => Cadence::Weekly,
            SourceKind::MonthlyPrice => Cadence::Monthly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceRequest {
    pub deal_type: DealType,
    pub kind: SourceKind,
}

impl SourceRequest {
    pub fn new(deal_type: DealType, kind: SourceKind) -> Self {
        Self { deal_type, kind }
    }

    /// File stem used by [`FileSource`], e.g. `weekly_sale_index`
    pub fn file_stem(&self) -> String {
        match self.kind {
            SourceKind::WeeklyIndex => format!("weekly_{}_index", self.deal_type),
            SourceKind::MonthlyPrice => format!("monthly_{}_avg", self.deal_type),
        }
    }
}

/// Anything that can deliver raw series
pub trait SourceAdapter {
    fn fetch(&self, request: &SourceRequest) -> Result<RawSeries>;
}

/// Reads raw series from `{stem}.json` or `{stem}.csv` files in a directory.
///
/// JSON payloads are preferred when both files exist.
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SourceAdapter for FileSource {
    fn fetch(&self, request: &SourceRequest) -> Result<RawSeries> {
        let stem = request.file_stem();
        let json_path = self.dir.join(format!("{}.json", stem));
        let csv_path = self.dir.join(format!("{}.csv", stem));

        if json_path.is_file() {
            debug!(path = %json_path.display(), "Reading payload");
            return Ok(RawSeries::Payload(ApiPayload::from_json_file(&json_path)?));
        }
        if csv_path.is_file() {
            debug!(path = %csv_path.display(), "Reading wide table");
            return Ok(RawSeries::Wide(WideTable::from_csv(&csv_path)?));
        }

        Err(PipelineError::SourceError(format!(
            "No {}.json or {}.csv in {}",
            stem,
            stem,
            self.dir.display()
        )))
    }
}

/// Serves series held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    series: HashMap<SourceRequest, RawSeries>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, deal_type: DealType, kind: SourceKind, raw: RawSeries) -> Self {
        self.series.insert(SourceRequest::new(deal_type, kind), raw);
        self
    }
}

impl SourceAdapter for StaticSource {
    fn fetch(&self, request: &SourceRequest) -> Result<RawSeries> {
        self.series.get(request).cloned().ok_or_else(|| {
            PipelineError::SourceError(format!("No series registered for {}", request.file_stem()))
        })
    }
}
