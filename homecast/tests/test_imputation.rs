use approx::assert_relative_eq;
use chrono::NaiveDate;
use homecast::data::{resample_monthly, RegionSeries};
use homecast::imputation::{index_to_price, ImputationEngine};
use homecast::{DealType, PipelineError};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn engine() -> ImputationEngine {
    ImputationEngine::new(date("2022-01-10"))
}

fn weekly(points: &[(&str, Option<f64>)]) -> RegionSeries {
    RegionSeries {
        region_code: "서울".to_string(),
        region_name: "서울".to_string(),
        points: points.iter().map(|(d, v)| (date(d), *v)).collect(),
    }
}

fn seoul_january() -> RegionSeries {
    weekly(&[
        ("2022-01-03", Some(98.0)),
        ("2022-01-10", Some(100.0)),
        ("2022-01-17", Some(101.0)),
        ("2022-01-24", Some(103.0)),
    ])
}

#[test]
fn test_seoul_sale_scenario() {
    let series = seoul_january();
    let monthly = BTreeMap::from([(date("2022-01-01"), Some(500.0))]);
    let curve = resample_monthly(&series.dates(), &monthly);

    let imputed = engine()
        .impute(&series, DealType::Sale, &monthly, &curve)
        .unwrap();
    let prices: Vec<f64> = imputed
        .observations
        .iter()
        .map(|obs| obs.avg_price.unwrap())
        .collect();

    assert_eq!(imputed.anchor_price, Some(500.0));
    assert_relative_eq!(prices[0], 500.0);
    assert_relative_eq!(prices[1], 500.0, epsilon = 1e-9);
    assert_relative_eq!(prices[2], 505.0, epsilon = 1e-9);
    assert_relative_eq!(prices[3], 515.0, epsilon = 1e-9);

    let flags: Vec<bool> = imputed
        .observations
        .iter()
        .map(|obs| obs.is_interpolated)
        .collect();
    assert_eq!(flags, vec![false, true, true, true]);
    assert_eq!(imputed.report.source_prices, 1);
    assert_eq!(imputed.report.ratio_filled, 3);
    assert_eq!(imputed.report.left_null, 0);
}

#[test]
fn test_anchor_prefers_source_price_at_reference_date() {
    // The reference week is the first week of the month on this grid
    let series = weekly(&[
        ("2022-01-10", Some(100.0)),
        ("2022-01-17", Some(102.0)),
    ]);
    let monthly = BTreeMap::from([(date("2022-01-01"), Some(800.0))]);

    let observations = engine().join_monthly(&series, DealType::Rent, &monthly);
    assert_eq!(observations[0].avg_price, Some(800.0));
    assert_eq!(observations[1].avg_price, None);

    let anchor = engine().resolve_anchor(&observations, &[]).unwrap();
    assert_relative_eq!(anchor, 800.0);
}

#[test]
fn test_anchor_round_trip() {
    assert_relative_eq!(index_to_price(100.0, 731.5), 731.5);
}

#[test]
fn test_missing_anchor_falls_back_to_interpolation() {
    // No index 100 at the reference date
    let series = weekly(&[
        ("2022-01-03", Some(98.0)),
        ("2022-01-10", Some(99.0)),
        ("2022-01-17", Some(101.0)),
        ("2022-01-24", Some(103.0)),
        ("2022-01-31", Some(104.0)),
        ("2022-02-07", Some(105.0)),
        ("2022-02-14", Some(106.0)),
    ]);
    let monthly = BTreeMap::from([
        (date("2022-01-01"), Some(500.0)),
        (date("2022-02-01"), Some(535.0)),
    ]);
    let curve = resample_monthly(&series.dates(), &monthly);

    let err = engine()
        .resolve_anchor(&engine().join_monthly(&series, DealType::Sale, &monthly), &curve)
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingAnchor { .. }));

    let imputed = engine()
        .impute(&series, DealType::Sale, &monthly, &curve)
        .unwrap();
    assert_eq!(imputed.anchor_price, None);

    let prices: Vec<Option<f64>> = imputed
        .observations
        .iter()
        .map(|obs| obs.avg_price)
        .collect();
    // Five weekly steps between the two source prices
    assert_relative_eq!(prices[1].unwrap(), 507.0, epsilon = 1e-9);
    assert_relative_eq!(prices[4].unwrap(), 528.0, epsilon = 1e-9);
    assert_eq!(prices[5], Some(535.0));
    // Nothing after the last known price
    assert_eq!(prices[6], None);
    assert!(!imputed.observations[6].is_interpolated);
    assert_eq!(imputed.report.interpolated, 4);
    assert_eq!(imputed.report.left_null, 1);
}

#[test]
fn test_rows_without_index_are_interpolated_between_ratio_fills() {
    let series = weekly(&[
        ("2022-01-03", Some(98.0)),
        ("2022-01-10", Some(100.0)),
        ("2022-01-17", None),
        ("2022-01-24", Some(104.0)),
    ]);
    let monthly = BTreeMap::from([(date("2022-01-01"), Some(1000.0))]);
    let curve = resample_monthly(&series.dates(), &monthly);

    let imputed = engine()
        .impute(&series, DealType::Sale, &monthly, &curve)
        .unwrap();
    let obs = &imputed.observations;

    assert_relative_eq!(obs[1].avg_price.unwrap(), 1000.0, epsilon = 1e-9);
    assert_relative_eq!(obs[3].avg_price.unwrap(), 1040.0, epsilon = 1e-9);
    assert_relative_eq!(obs[2].avg_price.unwrap(), 1020.0, epsilon = 1e-9);
    assert!(obs[2].is_interpolated);
    assert_eq!(obs[2].index_value, None);
    assert_eq!(imputed.report.ratio_filled, 2);
    assert_eq!(imputed.report.interpolated, 1);
}

#[test]
fn test_series_without_any_price_stays_null() {
    let series = weekly(&[("2022-01-03", Some(98.0)), ("2022-01-17", Some(99.0))]);
    let monthly = BTreeMap::new();

    let imputed = engine()
        .impute(&series, DealType::Rent, &monthly, &[])
        .unwrap();
    assert!(imputed
        .observations
        .iter()
        .all(|obs| obs.avg_price.is_none() && !obs.is_interpolated));
    assert_eq!(imputed.report.left_null, 2);
}
