//! Per-region CSV export of observations and predictions

use crate::error::Result;
use crate::store::Store;
use crate::types::{DealType, SeriesKey};
use crate::utils::file_stem;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `{region}_observations.csv` and `{region}_predictions.csv` for every
/// stored region into `out_dir`. Returns the written paths.
pub fn write_region_csv<S: Store + ?Sized>(store: &S, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)?;
    let mut written = Vec::new();

    for region in store.list_regions()? {
        let stem = file_stem(&region.region_code);

        let mut observations = Vec::new();
        let mut predictions = Vec::new();
        for deal_type in DealType::ALL {
            let key = SeriesKey::new(region.region_code.clone(), deal_type);
            observations.extend(store.list_observations(&key)?);
            predictions.extend(store.list_predictions(&key)?);
        }

        let path = out_dir.join(format!("{}_observations.csv", stem));
        write_rows(&path, &observations)?;
        written.push(path);

        let path = out_dir.join(format!("{}_predictions.csv", stem));
        write_rows(&path, &predictions)?;
        written.push(path);
    }

    info!(dir = %out_dir.display(), files = written.len(), "Exported region files");
    Ok(written)
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
