//! Region registry
//!
//! Regions are created lazily the first time a series references them. The
//! first name seen for a code wins; later observations of the same code are
//! no-ops.

use crate::types::Region;
use std::collections::BTreeMap;

/// KB region names and their English renderings
const REGION_NAMES: &[(&str, &str)] = &[
    ("전국", "Nationwide"),
    ("서울", "Seoul"),
    ("강북14개구", "14 Districts of Gangbuk"),
    ("강남11개구", "11 Districts of Gangnam"),
    ("수도권", "Metropolitan Area"),
    ("6개광역시", "6 Major Cities"),
    ("5개광역시", "5 Major Cities"),
    ("기타지방", "Other Provinces"),
    ("부산", "Busan"),
    ("대구", "Daegu"),
    ("인천", "Incheon"),
    ("광주", "Gwangju"),
    ("대전", "Daejeon"),
    ("울산", "Ulsan"),
    ("세종", "Sejong"),
    ("경기", "Gyeonggi"),
    ("충북", "Chungbuk"),
    ("충남", "Chungnam"),
    ("전남", "Jeonnam"),
    ("경북", "Gyeongbuk"),
    ("경남", "Gyeongnam"),
    ("제주", "Jeju"),
    ("강원", "Gangwon"),
    ("전북", "Jeonbuk"),
];

/// English name for a KB region name, if known
pub fn english_name(name_local: &str) -> Option<&'static str> {
    let name = name_local.trim();
    REGION_NAMES
        .iter()
        .find(|(local, _)| *local == name)
        .map(|(_, english)| *english)
}

/// Run-scoped set of known regions keyed by region code
#[derive(Debug, Clone, Default)]
pub struct RegionRegistry {
    regions: BTreeMap<String, Region>,
}

impl RegionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the region for `code`, creating it on first reference
    pub fn observe(&mut self, code: &str, name_local: &str) -> &Region {
        let code = code.trim();
        self.regions.entry(code.to_string()).or_insert_with(|| {
            let name_local = name_local.trim().to_string();
            let name_en = english_name(&name_local)
                .map(str::to_string)
                .unwrap_or_else(|| name_local.clone());
            Region {
                region_code: code.to_string(),
                name_local,
                name_en,
            }
        })
    }

    pub fn get(&self, code: &str) -> Option<&Region> {
        self.regions.get(code.trim())
    }

    /// Regions whose local or English name contains `fragment`
    pub fn resolve(&self, fragment: &str) -> Vec<&Region> {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return Vec::new();
        }
        let lowered = fragment.to_lowercase();

        self.regions
            .values()
            .filter(|region| {
                region.name_local.contains(fragment)
                    || region.name_en.to_lowercase().contains(&lowered)
            })
            .collect()
    }

    pub fn regions(&self) -> impl Iterator<Item = &Region> {
        self.regions.values()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
