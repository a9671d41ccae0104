//! Code for reading postcode sectors from a CSV file.
use super::*;
use crate::lad::LADID;
use crate::postcode_sector::{PostcodeSectorData, PostcodeSectorID};
use crate::units::{Area, GigabytesPerMonth};
use serde::Deserialize;

const POSTCODE_SECTORS_FILE_NAME: &str = "postcode_sectors.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PostcodeSectorRaw {
    id: PostcodeSectorID,
    lad_id: LADID,
    population: f64,
    area_km2: f64,
    user_throughput_gb_per_month: f64,
}

/// Read postcode sectors from the model directory.
///
/// Sectors are not checked against the LADs here. A sector whose LAD is unknown or whose area is
/// not positive is dropped when the network is built.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_postcode_sectors(model_dir: &Path) -> Result<Vec<PostcodeSectorData>> {
    let file_path = model_dir.join(POSTCODE_SECTORS_FILE_NAME);
    let sectors_csv = read_csv(&file_path)?;
    read_postcode_sectors_from_iter(sectors_csv).with_context(|| input_err_msg(&file_path))
}

fn read_postcode_sectors_from_iter<I>(iter: I) -> Result<Vec<PostcodeSectorData>>
where
    I: Iterator<Item = PostcodeSectorRaw>,
{
    let mut ids = HashSet::new();
    iter.map(|sector| {
        ensure!(
            ids.insert(sector.id.clone()),
            "Duplicate postcode sector ID: {}",
            sector.id
        );
        check_non_negative(sector.population, "population")
            .with_context(|| format!("Invalid postcode sector {}", sector.id))?;
        ensure!(
            sector.area_km2.is_finite(),
            "Area of postcode sector {} must be finite",
            sector.id
        );
        check_non_negative(sector.user_throughput_gb_per_month, "user throughput")
            .with_context(|| format!("Invalid postcode sector {}", sector.id))?;

        Ok(PostcodeSectorData {
            id: sector.id,
            lad_id: sector.lad_id,
            population: sector.population,
            area: Area(sector.area_km2),
            user_throughput: GigabytesPerMonth(sector.user_throughput_gb_per_month),
        })
    })
    .try_collect()
}
