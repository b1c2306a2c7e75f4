//! Pipeline orchestration
//!
//! `ingest` fetches, normalizes, imputes and persists every (region, deal type)
//! unit. `forecast` rebuilds each persisted series from the store and writes
//! its predictions. A failing unit is recorded in the [`RunSummary`] and the
//! run moves on to the next one.

use crate::config::{PipelineConfig, SourceFailurePolicy};
use crate::data::{group_by_region, resample_monthly, RawSeries, RegionSeries, SeriesNormalizer};
use crate::error::{PipelineError, Result};
use crate::forecast::ForecastEngine;
use crate::imputation::ImputationEngine;
use crate::registry::RegionRegistry;
use crate::source::{SourceAdapter, SourceKind, SourceRequest};
use crate::store::Store;
use crate::types::{DealType, InsertOutcome, SeriesKey};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{debug, info, warn};

/// Run-scoped state shared by the pipeline stages
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: PipelineConfig,
    /// Run date; only later dates are forecast
    pub today: NaiveDate,
    pub registry: RegionRegistry,
    anchors: HashMap<SeriesKey, Option<f64>>,
}

impl RunContext {
    pub fn new(config: PipelineConfig, today: NaiveDate) -> Self {
        Self {
            config,
            today,
            registry: RegionRegistry::new(),
            anchors: HashMap::new(),
        }
    }

    /// Anchor price of a series, read from the store once per run
    pub fn anchor<S: Store + ?Sized>(&mut self, store: &S, key: &SeriesKey) -> Result<Option<f64>> {
        if let Some(anchor) = self.anchors.get(key) {
            return Ok(*anchor);
        }
        let anchor = store.anchor_price(key, self.config.reference_date)?;
        self.anchors.insert(key.clone(), anchor);
        Ok(anchor)
    }
}

/// Pipeline stage a unit failed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Register,
    Impute,
    Persist,
    Forecast,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Fetch => "fetch",
            Stage::Register => "register",
            Stage::Impute => "impute",
            Stage::Persist => "persist",
            Stage::Forecast => "forecast",
        };
        f.write_str(label)
    }
}

/// A unit the run could not complete
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedUnit {
    /// `None` when a whole source was skipped
    pub region_code: Option<String>,
    pub deal_type: DealType,
    pub stage: Stage,
    pub reason: String,
}

/// Counts and skipped units of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub regions_inserted: usize,
    pub observations_inserted: usize,
    pub observations_skipped: usize,
    pub ratio_filled: usize,
    pub interpolated: usize,
    pub left_null: usize,
    pub series_forecast: usize,
    pub predictions_inserted: usize,
    pub predictions_skipped: usize,
    pub skipped: Vec<SkippedUnit>,
}

impl RunSummary {
    /// True when at least one unit was skipped
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn merge(&mut self, other: RunSummary) {
        self.regions_inserted += other.regions_inserted;
        self.observations_inserted += other.observations_inserted;
        self.observations_skipped += other.observations_skipped;
        self.ratio_filled += other.ratio_filled;
        self.interpolated += other.interpolated;
        self.left_null += other.left_null;
        self.series_forecast += other.series_forecast;
        self.predictions_inserted += other.predictions_inserted;
        self.predictions_skipped += other.predictions_skipped;
        self.skipped.extend(other.skipped);
    }

    fn skip(
        &mut self,
        region_code: Option<&str>,
        deal_type: DealType,
        stage: Stage,
        err: &PipelineError,
    ) {
        warn!(
            region = region_code.unwrap_or("*"),
            deal_type = %deal_type,
            stage = %stage,
            error = %err,
            "Skipping unit"
        );
        self.skipped.push(SkippedUnit {
            region_code: region_code.map(str::to_string),
            deal_type,
            stage,
            reason: err.to_string(),
        });
    }
}

/// Sequences ingestion and forecasting over a store
#[derive(Debug)]
pub struct Pipeline<S: Store> {
    context: RunContext,
    store: S,
    normalizer: SeriesNormalizer,
    imputation: ImputationEngine,
    engine: ForecastEngine,
}

impl<S: Store> Pipeline<S> {
    pub fn new(config: PipelineConfig, today: NaiveDate, store: S) -> Result<Self> {
        config.validate()?;
        let normalizer = SeriesNormalizer::from_config(&config);
        let imputation = ImputationEngine::new(config.reference_date);
        let engine = ForecastEngine::from_config(&config)?;

        Ok(Self {
            context: RunContext::new(config, today),
            store,
            normalizer,
            imputation,
            engine,
        })
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Fetch, normalize, impute and persist both deal types
    pub fn ingest(&mut self, source: &dyn SourceAdapter) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for deal_type in DealType::ALL {
            let Some(weekly_raw) =
                self.fetch(source, deal_type, SourceKind::WeeklyIndex, &mut summary)?
            else {
                continue;
            };
            let monthly_raw =
                self.fetch(source, deal_type, SourceKind::MonthlyPrice, &mut summary)?;

            let weekly = group_by_region(
                self.normalizer
                    .normalize(&weekly_raw, SourceKind::WeeklyIndex.cadence()),
            );
            let has_monthly = monthly_raw.is_some();
            let monthly = monthly_raw
                .map(|raw| {
                    group_by_region(
                        self.normalizer
                            .normalize(&raw, SourceKind::MonthlyPrice.cadence()),
                    )
                })
                .unwrap_or_default();

            if weekly.is_empty() {
                warn!(deal_type = %deal_type, "Weekly source produced no rows");
            }

            let empty = BTreeMap::new();
            for series in weekly.values() {
                let prices = match match_monthly(&monthly, series) {
                    Some(prices) => &prices.points,
                    None => {
                        if has_monthly {
                            warn!(
                                region = %series.region_code,
                                deal_type = %deal_type,
                                "No monthly prices for region; source prices stay null"
                            );
                        }
                        &empty
                    }
                };
                self.ingest_unit(series, deal_type, prices, &mut summary);
            }

            info!(
                deal_type = %deal_type,
                regions = weekly.len(),
                inserted = summary.observations_inserted,
                skipped = summary.observations_skipped,
                "Ingested deal type"
            );
        }

        Ok(summary)
    }

    fn fetch(
        &self,
        source: &dyn SourceAdapter,
        deal_type: DealType,
        kind: SourceKind,
        summary: &mut RunSummary,
    ) -> Result<Option<RawSeries>> {
        let request = SourceRequest::new(deal_type, kind);
        match source
            .fetch(&request)
            .and_then(|raw| raw.validate().map(|_| raw))
        {
            Ok(raw) => Ok(Some(raw)),
            Err(err) => match self.context.config.source_policy {
                SourceFailurePolicy::Abort => Err(err),
                SourceFailurePolicy::Skip => {
                    summary.skip(None, deal_type, Stage::Fetch, &err);
                    Ok(None)
                }
            },
        }
    }

    fn ingest_unit(
        &mut self,
        series: &RegionSeries,
        deal_type: DealType,
        monthly: &BTreeMap<NaiveDate, Option<f64>>,
        summary: &mut RunSummary,
    ) {
        let code = series.region_code.as_str();
        let region = self
            .context
            .registry
            .observe(code, &series.region_name)
            .clone();
        match self.store.insert_region(&region) {
            Ok(InsertOutcome::Inserted) => summary.regions_inserted += 1,
            Ok(InsertOutcome::Skipped) => {}
            Err(err) => {
                summary.skip(Some(code), deal_type, Stage::Register, &err);
                return;
            }
        }

        let curve = resample_monthly(&series.dates(), monthly);
        let imputed = match self.imputation.impute(series, deal_type, monthly, &curve) {
            Ok(imputed) => imputed,
            Err(err) => {
                summary.skip(Some(code), deal_type, Stage::Impute, &err);
                return;
            }
        };
        summary.ratio_filled += imputed.report.ratio_filled;
        summary.interpolated += imputed.report.interpolated;
        summary.left_null += imputed.report.left_null;

        for observation in &imputed.observations {
            match self.store.put_observation(observation) {
                Ok(InsertOutcome::Inserted) => summary.observations_inserted += 1,
                Ok(InsertOutcome::Skipped) => summary.observations_skipped += 1,
                Err(err) => {
                    summary.skip(Some(code), deal_type, Stage::Persist, &err);
                    return;
                }
            }
        }

        debug!(
            region = code,
            deal_type = %deal_type,
            rows = imputed.observations.len(),
            "Persisted series"
        );
    }

    /// Forecast every persisted series and store its predictions
    pub fn forecast(&mut self) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for key in self.store.series_keys()? {
            let code = key.region_code.as_str();
            let observations = match self.store.list_observations(&key) {
                Ok(observations) => observations,
                Err(err) => {
                    summary.skip(Some(code), key.deal_type, Stage::Forecast, &err);
                    continue;
                }
            };

            let anchor = match self.context.anchor(&self.store, &key) {
                Ok(anchor) => anchor,
                Err(err) => {
                    summary.skip(Some(code), key.deal_type, Stage::Forecast, &err);
                    continue;
                }
            };
            if anchor.is_none() {
                let err = PipelineError::MissingAnchor {
                    region_code: key.region_code.clone(),
                    deal_type: key.deal_type,
                };
                warn!(series = %key, "{}; predicted prices will be null", err);
            }

            let forecast = match self.engine.forecast_series(
                &key,
                &observations,
                anchor,
                self.context.today,
            ) {
                Ok(forecast) => forecast,
                Err(err) => {
                    summary.skip(Some(code), key.deal_type, Stage::Forecast, &err);
                    continue;
                }
            };
            summary.series_forecast += 1;

            for prediction in &forecast.predictions {
                match self.store.put_prediction(prediction) {
                    Ok(InsertOutcome::Inserted) => summary.predictions_inserted += 1,
                    Ok(InsertOutcome::Skipped) => summary.predictions_skipped += 1,
                    Err(err) => {
                        summary.skip(Some(code), key.deal_type, Stage::Persist, &err);
                        break;
                    }
                }
            }
        }

        info!(
            series = summary.series_forecast,
            inserted = summary.predictions_inserted,
            skipped = summary.predictions_skipped,
            "Forecast complete"
        );

        Ok(summary)
    }

    /// Ingest from `source`, then forecast
    pub fn run(&mut self, source: &dyn SourceAdapter) -> Result<RunSummary> {
        let mut summary = self.ingest(source)?;
        summary.merge(self.forecast()?);

        info!(
            observations = summary.observations_inserted,
            predictions = summary.predictions_inserted,
            skipped_units = summary.skipped.len(),
            "Run complete"
        );

        Ok(summary)
    }
}

/// Monthly series for a weekly region: by code, then by trimmed region name
fn match_monthly<'a>(
    monthly: &'a BTreeMap<String, RegionSeries>,
    weekly: &RegionSeries,
) -> Option<&'a RegionSeries> {
    if let Some(series) = monthly.get(&weekly.region_code) {
        return Some(series);
    }
    let name = weekly.region_name.trim();
    if name.is_empty() {
        return None;
    }
    monthly
        .get(name)
        .or_else(|| monthly.values().find(|series| series.region_name.trim() == name))
}
