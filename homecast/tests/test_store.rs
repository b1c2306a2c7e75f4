use chrono::NaiveDate;
use homecast::store::{MemoryStore, SqliteStore, Store};
use homecast::{DealType, InsertOutcome, Observation, PipelineError, Prediction, Region, SeriesKey};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn stores() -> Vec<(&'static str, Box<dyn Store>)> {
    vec![
        ("memory", Box::new(MemoryStore::new()) as Box<dyn Store>),
        ("sqlite", Box::new(SqliteStore::open_in_memory().unwrap()) as Box<dyn Store>),
    ]
}

fn seoul() -> Region {
    Region {
        region_code: "11000".to_string(),
        name_local: "서울".to_string(),
        name_en: "Seoul".to_string(),
    }
}

fn observation(
    day: &str,
    deal_type: DealType,
    index: Option<f64>,
    price: Option<f64>,
) -> Observation {
    Observation {
        region_code: "11000".to_string(),
        date: date(day),
        deal_type,
        index_value: index,
        avg_price: price,
        is_interpolated: false,
    }
}

fn prediction(day: &str, index: f64) -> Prediction {
    Prediction {
        region_code: "11000".to_string(),
        date: date(day),
        deal_type: DealType::Sale,
        predicted_index: Some(index),
        predicted_price: None,
        prediction_accuracy: None,
    }
}

#[test]
fn test_region_insert_is_idempotent() {
    for (name, mut store) in stores() {
        assert_eq!(store.insert_region(&seoul()).unwrap(), InsertOutcome::Inserted, "{}", name);

        let renamed = Region {
            name_en: "Other".to_string(),
            ..seoul()
        };
        assert_eq!(store.insert_region(&renamed).unwrap(), InsertOutcome::Skipped, "{}", name);
        assert_eq!(store.get_region("11000").unwrap(), Some(seoul()), "{}", name);
        assert_eq!(store.list_regions().unwrap().len(), 1, "{}", name);
        assert_eq!(store.get_region("99999").unwrap(), None, "{}", name);
    }
}

#[test]
fn test_put_observation_never_overwrites() {
    for (name, mut store) in stores() {
        store.insert_region(&seoul()).unwrap();
        let original = observation("2022-01-10", DealType::Sale, Some(100.0), Some(500.0));
        let changed = observation("2022-01-10", DealType::Sale, Some(100.0), Some(999.0));

        assert_eq!(store.put_observation(&original).unwrap(), InsertOutcome::Inserted);
        assert_eq!(store.put_observation(&changed).unwrap(), InsertOutcome::Skipped);

        let key = SeriesKey::new("11000", DealType::Sale);
        let stored = store.get_observation(&key, date("2022-01-10")).unwrap();
        assert_eq!(stored, Some(original), "{}", name);

        // A direct insert of an existing key is an error
        assert!(store.insert_observation(&changed).is_err(), "{}", name);
    }
}

#[test]
fn test_deal_types_are_separate_keys() {
    for (name, mut store) in stores() {
        store.insert_region(&seoul()).unwrap();
        store
            .put_observation(&observation("2022-01-10", DealType::Sale, Some(100.0), Some(500.0)))
            .unwrap();
        let outcome = store
            .put_observation(&observation("2022-01-10", DealType::Rent, Some(100.0), Some(300.0)))
            .unwrap();

        assert_eq!(outcome, InsertOutcome::Inserted, "{}", name);
        assert_eq!(
            store.series_keys().unwrap(),
            vec![
                SeriesKey::new("11000", DealType::Sale),
                SeriesKey::new("11000", DealType::Rent),
            ],
            "{}",
            name
        );
    }
}

#[test]
fn test_list_observations_is_date_ordered() {
    for (name, mut store) in stores() {
        store.insert_region(&seoul()).unwrap();
        for day in ["2022-01-24", "2022-01-03", "2022-01-17", "2022-01-10"] {
            store
                .put_observation(&observation(day, DealType::Sale, Some(100.0), None))
                .unwrap();
        }

        let key = SeriesKey::new("11000", DealType::Sale);
        let dates: Vec<NaiveDate> = store
            .list_observations(&key)
            .unwrap()
            .iter()
            .map(|obs| obs.date)
            .collect();
        assert_eq!(
            dates,
            vec![
                date("2022-01-03"),
                date("2022-01-10"),
                date("2022-01-17"),
                date("2022-01-24"),
            ],
            "{}",
            name
        );
    }
}

#[test]
fn test_anchor_price_requires_index_100() {
    for (name, mut store) in stores() {
        store.insert_region(&seoul()).unwrap();
        let key = SeriesKey::new("11000", DealType::Sale);
        let rent = SeriesKey::new("11000", DealType::Rent);
        store
            .put_observation(&observation("2022-01-10", DealType::Sale, Some(100.0), Some(500.0)))
            .unwrap();
        store
            .put_observation(&observation("2022-01-10", DealType::Rent, Some(99.0), Some(300.0)))
            .unwrap();

        assert_eq!(store.anchor_price(&key, date("2022-01-10")).unwrap(), Some(500.0), "{}", name);
        assert_eq!(store.anchor_price(&rent, date("2022-01-10")).unwrap(), None, "{}", name);
        assert_eq!(store.anchor_price(&key, date("2022-01-17")).unwrap(), None, "{}", name);
        assert!(matches!(
            store.require_anchor(&rent, date("2022-01-10")),
            Err(PipelineError::MissingAnchor { .. })
        ));
    }
}

#[test]
fn test_put_prediction_is_idempotent() {
    for (name, mut store) in stores() {
        store.insert_region(&seoul()).unwrap();
        let key = SeriesKey::new("11000", DealType::Sale);

        let first = store.put_prediction(&prediction("2023-01-02", 110.0)).unwrap();
        let again = store.put_prediction(&prediction("2023-01-02", 120.0)).unwrap();
        assert_eq!(first, InsertOutcome::Inserted, "{}", name);
        assert_eq!(again, InsertOutcome::Skipped, "{}", name);
        store.put_prediction(&prediction("2022-12-26", 109.0)).unwrap();

        let stored = store.list_predictions(&key).unwrap();
        assert_eq!(stored.len(), 2, "{}", name);
        assert_eq!(stored[0].date, date("2022-12-26"), "{}", name);
        assert_eq!(stored[1].predicted_index, Some(110.0), "{}", name);
        assert_eq!(
            store.get_prediction(&key, date("2023-01-02")).unwrap(),
            Some(prediction("2023-01-02", 110.0)),
            "{}",
            name
        );
    }
}

#[test]
fn test_sqlite_store_persists_across_connections() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("homecast.db");

    {
        let mut store = SqliteStore::open(&path).unwrap();
        store.insert_region(&seoul()).unwrap();
        let mut row = observation("2022-01-17", DealType::Rent, Some(101.0), Some(303.0));
        row.is_interpolated = true;
        store.put_observation(&row).unwrap();
    }

    let mut store = SqliteStore::open(&path).unwrap();
    let key = SeriesKey::new("11000", DealType::Rent);
    let rows = store.list_observations(&key).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].is_interpolated);
    assert_eq!(rows[0].avg_price, Some(303.0));

    let again = observation("2022-01-17", DealType::Rent, Some(101.0), Some(303.0));
    assert_eq!(store.put_observation(&again).unwrap(), InsertOutcome::Skipped);
}
