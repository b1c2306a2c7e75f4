use approx::assert_relative_eq;
use chrono::NaiveDate;
use homecast::data::{
    group_by_region, resample_monthly, ApiPayload, Cadence, RawSeries, SeriesNormalizer,
    WideRow, WideTable,
};
use homecast::{PipelineConfig, PipelineError};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::BTreeMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn normalizer() -> SeriesNormalizer {
    SeriesNormalizer::from_config(&PipelineConfig::default())
}

#[test]
fn test_wide_table_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "지역명,22.01.03,22.01.10,22.01.17").unwrap();
    writeln!(file, "서울 ,98.5,100,-").unwrap();
    writeln!(file, "부산,97,99.1,100.2").unwrap();

    let table = WideTable::from_csv(file.path()).unwrap();
    assert_eq!(table.periods(), &["22.01.03", "22.01.10", "22.01.17"]);
    assert_eq!(table.rows().len(), 2);
    assert_eq!(table.rows()[0].values[2], None);
    assert_eq!(table.rows()[1].values[2], Some(100.2));

    let records = normalizer().normalize(&RawSeries::Wide(table), Cadence::Weekly);
    assert_eq!(records.len(), 6);
    assert_eq!(records[0].region_code, "서울");
    assert_eq!(records[0].date, date("2022-01-03"));
    assert_eq!(records[0].value, Some(98.5));
}

#[test]
fn test_wide_table_rejects_ragged_rows() {
    let result = WideTable::new(
        vec!["2022-01".to_string(), "2022-02".to_string()],
        vec![WideRow {
            region_name: "서울".to_string(),
            values: vec![Some(1.0)],
        }],
    );
    assert!(result.is_err());
}

#[test]
fn test_payload_with_korean_keys() {
    let payload = ApiPayload::from_json_str(
        r#"{"dataBody": {"data": {
            "날짜리스트": [20220103, "20220110", "bad"],
            "데이터리스트": [
                {"지역코드": "11000", "지역명": "서울", "dataList": [98.0, "100", 101.0]},
                {"지역코드": "26000", "지역명": "부산", "dataList": [null, "-", 99.0]}
            ]
        }}}"#,
    )
    .unwrap();

    let records = normalizer().normalize(&RawSeries::Payload(payload), Cadence::Weekly);
    // The third date label is unparseable and its cells are dropped
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].region_code, "11000");
    assert_eq!(records[0].region_name, "서울");
    assert_eq!(records[1].date, date("2022-01-10"));
    assert_eq!(records[1].value, Some(100.0));
    assert_eq!(records[2].value, None);
    assert_eq!(records[3].value, None);
}

#[test]
fn test_payload_with_english_keys() {
    let payload = ApiPayload::from_json_str(
        r#"{"data_body": {"data": {
            "date_list": ["202201", "202202"],
            "data_list": [{"region_code": "11000", "region_name": "서울", "values": [500, 510]}]
        }}}"#,
    )
    .unwrap();

    let records = normalizer().normalize(&RawSeries::Payload(payload), Cadence::Monthly);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date, date("2022-01-01"));
    assert_eq!(records[1].value, Some(510.0));
}

#[rstest]
#[case("22.01.03", Some("2022-01-03"))]
#[case("20220103", Some("2022-01-03"))]
#[case("2022-01-03", Some("2022-01-03"))]
#[case("2022/01/03", None)]
#[case("", None)]
fn test_weekly_date_parsing(#[case] label: &str, #[case] expected: Option<&str>) {
    assert_eq!(normalizer().parse_weekly_date(label), expected.map(date));
}

#[rstest]
#[case("2022-01", Some("2022-01-01"))]
#[case("202201", Some("2022-01-01"))]
#[case("2022.01", Some("2022-01-01"))]
#[case("2022-13", None)]
#[case("2022-1", None)]
fn test_month_label_parsing(#[case] label: &str, #[case] expected: Option<&str>) {
    assert_eq!(SeriesNormalizer::parse_month_label(label), expected.map(date));
}

#[test]
fn test_duplicate_cells_first_wins() {
    let table = WideTable::new(
        vec!["22.01.03".to_string(), "2022-01-03".to_string()],
        vec![WideRow {
            region_name: "서울".to_string(),
            values: vec![Some(98.0), Some(99.0)],
        }],
    )
    .unwrap();

    let records = normalizer().normalize(&RawSeries::Wide(table), Cadence::Weekly);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value, Some(98.0));

    let grouped = group_by_region(records);
    assert_eq!(grouped["서울"].points.len(), 1);
}

fn january_february_grid() -> Vec<NaiveDate> {
    [
        "2022-01-03", "2022-01-10", "2022-01-17", "2022-01-24", "2022-01-31",
        "2022-02-07", "2022-02-14", "2022-02-21", "2022-02-28",
    ]
    .iter()
    .map(|s| date(s))
    .collect()
}

#[rstest]
#[case(0, 100.0)]
#[case(1, 125.0)]
#[case(2, 150.0)]
#[case(4, 200.0)]
fn test_resample_interpolates_within_month(#[case] week: usize, #[case] expected: f64) {
    let monthly = BTreeMap::from([
        (date("2022-01-01"), Some(100.0)),
        (date("2022-02-01"), Some(200.0)),
    ]);

    let curve = resample_monthly(&january_february_grid(), &monthly);
    assert_relative_eq!(curve[week].price.unwrap(), expected, epsilon = 1e-9);
}

#[test]
fn test_resample_holds_final_month_flat() {
    let monthly = BTreeMap::from([
        (date("2022-01-01"), Some(100.0)),
        (date("2022-02-01"), Some(200.0)),
    ]);

    let curve = resample_monthly(&january_february_grid(), &monthly);
    let february: Vec<Option<f64>> = curve[5..].iter().map(|point| point.price).collect();
    assert_eq!(february, vec![Some(200.0); 4]);
}

#[test]
fn test_resample_forward_fills_missing_months() {
    let mut grid = january_february_grid();
    grid.push(date("2022-03-07"));
    let monthly = BTreeMap::from([
        (date("2022-01-01"), Some(100.0)),
        (date("2022-02-01"), None),
        (date("2022-03-01"), Some(300.0)),
    ]);

    let curve = resample_monthly(&grid, &monthly);
    // January's successor has no value, so January is held flat
    assert!(curve[..5].iter().all(|point| point.price == Some(100.0)));
    assert!(curve[5..9].iter().all(|point| point.price == Some(100.0)));
    assert_eq!(curve[9].price, Some(300.0));
}

#[test]
fn test_resample_single_week_month_and_leading_gap() {
    let grid = vec![date("2021-12-27"), date("2022-01-03")];
    let monthly = BTreeMap::from([(date("2022-01-01"), Some(500.0))]);

    let curve = resample_monthly(&grid, &monthly);
    assert_eq!(curve[0].price, None);
    assert_eq!(curve[1].price, Some(500.0));
}

#[test]
fn test_payload_rejects_mismatched_value_list() {
    let result = ApiPayload::from_json_str(
        r#"{"dataBody": {"data": {
            "날짜리스트": ["20220103", "20220110", "20220117"],
            "데이터리스트": [{"지역코드": "11000", "지역명": "서울", "dataList": [99]}]
        }}}"#,
    );

    assert!(matches!(result, Err(PipelineError::SourceError(_))));
}

#[test]
fn test_resample_skipped_month_holds_flat() {
    let grid = vec![
        date("2022-01-03"),
        date("2022-01-10"),
        date("2022-02-07"),
        date("2022-03-07"),
        date("2022-03-14"),
    ];
    let monthly = BTreeMap::from([
        (date("2022-01-01"), Some(100.0)),
        (date("2022-03-01"), Some(300.0)),
    ]);

    let curve = resample_monthly(&grid, &monthly);
    let prices: Vec<Option<f64>> = curve.iter().map(|point| point.price).collect();
    assert_eq!(
        prices,
        vec![Some(100.0), Some(100.0), Some(100.0), Some(300.0), Some(300.0)]
    );
}
