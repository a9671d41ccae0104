//! Code for reading the clutter table from a CSV file.
use super::*;
use crate::clutter::{ClutterTable, Environment};
use crate::units::PerKm2;
use serde::Deserialize;

const CLUTTER_LOOKUP_FILE_NAME: &str = "clutter_lookup.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ClutterRaw {
    upper_pop_density_km2: f64,
    environment: Environment,
}

/// Read the clutter table from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_clutter_table(model_dir: &Path) -> Result<ClutterTable> {
    let file_path = model_dir.join(CLUTTER_LOOKUP_FILE_NAME);
    let clutter_csv = read_csv::<ClutterRaw>(&file_path)?;
    ClutterTable::new(clutter_csv.map(|row| (PerKm2(row.upper_pop_density_km2), row.environment)))
        .with_context(|| input_err_msg(&file_path))
}
