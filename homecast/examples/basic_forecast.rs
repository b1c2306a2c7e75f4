use chrono::{Duration, NaiveDate};
use homecast::data::{ApiPayload, RawSeries, WideRow, WideTable};
use homecast::source::SourceKind;
use homecast::{DealType, MemoryStore, Pipeline, PipelineConfig, SeriesKey, StaticSource, Store};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Homecast: Basic Forecasting Example");
    println!("===================================\n");

    // Two years of weekly sale indices around the 2022-01-10 reference week
    let start = NaiveDate::from_ymd_opt(2021, 1, 4).ok_or("bad start date")?;
    let weeks: Vec<NaiveDate> = (0..104).map(|w| start + Duration::weeks(w)).collect();
    let reference = weeks
        .iter()
        .position(|d| d.to_string() == "2022-01-10")
        .ok_or("no reference week")?;
    let indices: Vec<Option<f64>> = (0..weeks.len())
        .map(|i| Some(100.0 + 0.2 * (i as f64 - reference as f64)))
        .collect();

    let weekly = WideTable::new(
        weeks.iter().map(|d| d.format("%y.%m.%d").to_string()).collect(),
        vec![WideRow {
            region_name: "서울".to_string(),
            values: indices,
        }],
    )?;

    let monthly = ApiPayload::from_json_str(
        r#"{"dataBody": {"data": {
            "날짜리스트": ["202112", "202201", "202202"],
            "데이터리스트": [
                {"지역코드": "서울", "지역명": "서울", "dataList": [98000, 100000, "101000"]}
            ]
        }}}"#,
    )?;

    let source = StaticSource::new()
        .with(DealType::Sale, SourceKind::WeeklyIndex, RawSeries::Wide(weekly))
        .with(DealType::Sale, SourceKind::MonthlyPrice, RawSeries::Payload(monthly));

    let config = PipelineConfig {
        horizon_weeks: 52,
        ..PipelineConfig::default()
    };
    let today = *weeks.last().ok_or("empty grid")?;
    let mut pipeline = Pipeline::new(config, today, MemoryStore::new())?;

    // No rent series is registered, so the run reports it as skipped
    println!("Running pipeline...");
    let summary = pipeline.run(&source)?;
    println!(
        "Stored {} observations ({} ratio-filled) and {} predictions",
        summary.observations_inserted, summary.ratio_filled, summary.predictions_inserted
    );
    for unit in &summary.skipped {
        println!(
            "  skipped {:?} {} at {}: {}",
            unit.region_code, unit.deal_type, unit.stage, unit.reason
        );
    }

    let key = SeriesKey::new("서울", DealType::Sale);
    println!("\nFirst forecast weeks for {}:", key);
    for prediction in pipeline.store().list_predictions(&key)?.iter().take(8) {
        println!(
            "  {}: index {:.2}, price {:.0}",
            prediction.date,
            prediction.predicted_index.unwrap_or(f64::NAN),
            prediction.predicted_price.unwrap_or(f64::NAN)
        );
    }

    println!("\nForecasting complete!");
    Ok(())
}
