//! Code for reading the initial asset inventory from a CSV file.
use super::*;
use crate::asset::{
    Asset, AssetType, Bandwidth, Frequency, SiteID, Technology, check_sectors_valid,
};
use crate::model::ModelParameters;
use crate::postcode_sector::PostcodeSectorID;
use serde::Deserialize;

const ASSETS_FILE_NAME: &str = "assets.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct AssetRaw {
    pcd_sector_id: PostcodeSectorID,
    site_id: SiteID,
    technology: Technology,
    frequency_mhz: Frequency,
    bandwidth: Option<Bandwidth>,
    build_year: Option<u32>,
    #[serde(rename = "type")]
    asset_type: Option<AssetType>,
    sectors: Option<u32>,
    mast_height_m: Option<u32>,
}

/// Read the initial assets from the model directory.
///
/// Omitted fields are filled in from the model parameters: the build year defaults to the base
/// year and the mast height to the standard mast height.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
/// * `parameters` - Model parameters
pub fn read_assets(model_dir: &Path, parameters: &ModelParameters) -> Result<Vec<Asset>> {
    let file_path = model_dir.join(ASSETS_FILE_NAME);
    let assets_csv = read_csv(&file_path)?;
    read_assets_from_iter(assets_csv, parameters).with_context(|| input_err_msg(&file_path))
}

fn read_assets_from_iter<I>(iter: I, parameters: &ModelParameters) -> Result<Vec<Asset>>
where
    I: Iterator<Item = AssetRaw>,
{
    iter.map(|asset| -> Result<_> {
        ensure!(
            !asset.site_id.0.is_empty(),
            "Asset in sector {} has an empty site ID",
            asset.pcd_sector_id
        );

        let sectors = asset.sectors.unwrap_or(crate::asset::DEFAULT_SECTORS);
        check_sectors_valid(sectors)
            .with_context(|| format!("Invalid asset on site {}", asset.site_id))?;

        let mast_height_m = asset.mast_height_m.unwrap_or(parameters.mast_height_m);
        ensure!(
            mast_height_m > 0,
            "Mast height for site {} must be greater than zero",
            asset.site_id
        );

        Ok(Asset {
            site_id: asset.site_id,
            pcd_sector_id: asset.pcd_sector_id,
            technology: asset.technology,
            frequency: asset.frequency_mhz,
            bandwidth: asset.bandwidth.unwrap_or_default(),
            asset_type: asset.asset_type.unwrap_or_default(),
            sectors,
            mast_height_m,
            build_year: asset.build_year.unwrap_or(parameters.base_year),
        })
    })
    .try_collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{asset, model_parameters};
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[fixture]
    fn raw() -> AssetRaw {
        AssetRaw {
            pcd_sector_id: "CB11".into(),
            site_id: "s1".into(),
            technology: Technology::Lte,
            frequency_mhz: Frequency::Mhz800,
            bandwidth: None,
            build_year: Some(2017),
            asset_type: None,
            sectors: None,
            mast_height_m: None,
        }
    }

    #[rstest]
    fn test_read_assets(model_parameters: ModelParameters, asset: Asset) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(ASSETS_FILE_NAME)).unwrap();
            writeln!(
                file,
                "pcd_sector_id,site_id,technology,frequency_mhz,bandwidth,build_year,type,sectors,mast_height_m
CB11,s1,LTE,800,2x10MHz,2017,macrocell_site,3,30
CB11,s2,5G,3500,,,,6,"
            )
            .unwrap();
        }

        let assets = read_assets(dir.path(), &model_parameters).unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0], asset);
        assert_eq!(
            assets[1],
            Asset {
                site_id: "s2".into(),
                technology: Technology::Nr,
                frequency: Frequency::Mhz3500,
                sectors: 6,
                build_year: model_parameters.base_year,
                ..asset
            }
        );
    }

    #[rstest]
    fn test_read_assets_from_iter_defaults(raw: AssetRaw, model_parameters: ModelParameters) {
        let assets = read_assets_from_iter([raw].into_iter(), &model_parameters).unwrap();
        assert_eq!(assets[0].bandwidth, Bandwidth::default());
        assert_eq!(assets[0].asset_type, AssetType::MacrocellSite);
        assert_eq!(assets[0].sectors, 3);
        assert_eq!(assets[0].mast_height_m, model_parameters.mast_height_m);
    }

    #[rstest]
    #[case(AssetRaw { sectors: Some(2), ..raw() })]
    #[case(AssetRaw { mast_height_m: Some(0), ..raw() })]
    #[case(AssetRaw { site_id: "".into(), ..raw() })]
    fn test_read_assets_from_iter_invalid(
        #[case] asset: AssetRaw,
        model_parameters: ModelParameters,
    ) {
        assert!(read_assets_from_iter([asset].into_iter(), &model_parameters).is_err());
    }
}
