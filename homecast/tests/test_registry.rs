use homecast::registry::english_name;
use homecast::RegionRegistry;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case("서울", Some("Seoul"))]
#[case(" 경기 ", Some("Gyeonggi"))]
#[case("강남11개구", Some("11 Districts of Gangnam"))]
#[case("서울시", None)]
fn test_english_name(#[case] local: &str, #[case] expected: Option<&str>) {
    assert_eq!(english_name(local), expected);
}

#[test]
fn test_observe_creates_region_once() {
    let mut registry = RegionRegistry::new();
    assert!(registry.is_empty());

    let region = registry.observe(" 11000 ", " 서울 ").clone();
    assert_eq!(region.region_code, "11000");
    assert_eq!(region.name_local, "서울");
    assert_eq!(region.name_en, "Seoul");

    // First name wins
    let again = registry.observe("11000", "부산").clone();
    assert_eq!(again, region);
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get("11000"), Some(&region));
}

#[test]
fn test_unknown_name_keeps_local_rendering() {
    let mut registry = RegionRegistry::new();
    let region = registry.observe("99999", "어딘가");
    assert_eq!(region.name_en, "어딘가");
}

#[test]
fn test_resolve_by_fragment() {
    let mut registry = RegionRegistry::new();
    registry.observe("11000", "서울");
    registry.observe("26000", "부산");
    registry.observe("41000", "경기");

    let codes = |fragment: &str| -> Vec<String> {
        registry
            .resolve(fragment)
            .iter()
            .map(|region| region.region_code.clone())
            .collect()
    };

    assert_eq!(codes("seoul"), vec!["11000"]);
    assert_eq!(codes("BUS"), vec!["26000"]);
    assert_eq!(codes("경"), vec!["41000"]);
    assert!(codes("").is_empty());
    assert!(codes("Tokyo").is_empty());
    assert_eq!(registry.regions().count(), 3);
}
