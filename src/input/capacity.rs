//! Code for reading capacity curves from a CSV file.
use super::*;
use crate::asset::{Bandwidth, Frequency};
use crate::capacity::{CapacityKey, CapacityTable};
use crate::clutter::Environment;
use crate::units::{MbpsPerKm2, PerKm2};
use indexmap::IndexMap;
use serde::Deserialize;

const CAPACITY_LOOKUP_FILE_NAME: &str = "capacity_lookup.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct CapacityRaw {
    environment: Environment,
    frequency_mhz: Frequency,
    bandwidth: Bandwidth,
    mast_height_m: u32,
    site_density_km2: f64,
    capacity_mbps_km2: f64,
}

/// Read the capacity table from the model directory.
///
/// Each row is one breakpoint. Rows are grouped into curves by environment, frequency, bandwidth
/// and mast height, and need not be in order.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_capacity_table(model_dir: &Path) -> Result<CapacityTable> {
    let file_path = model_dir.join(CAPACITY_LOOKUP_FILE_NAME);
    let capacity_csv = read_csv(&file_path)?;
    read_capacity_table_from_iter(capacity_csv).with_context(|| input_err_msg(&file_path))
}

fn read_capacity_table_from_iter<I>(iter: I) -> Result<CapacityTable>
where
    I: Iterator<Item = CapacityRaw>,
{
    let mut curves: IndexMap<CapacityKey, Vec<(PerKm2, MbpsPerKm2)>> = IndexMap::new();
    for row in iter {
        let key = CapacityKey {
            environment: row.environment,
            frequency: row.frequency_mhz,
            bandwidth: row.bandwidth,
            mast_height_m: row.mast_height_m,
        };
        curves.entry(key).or_default().push((
            PerKm2(row.site_density_km2),
            MbpsPerKm2(row.capacity_mbps_km2),
        ));
    }

    let mut table = CapacityTable::new();
    for (key, breakpoints) in curves {
        table.insert_curve(key, breakpoints)?;
    }

    Ok(table)
}
