//! The module responsible for writing output data to disk.
use crate::asset::SiteID;
use crate::clutter::Environment;
use crate::intervention::{Intervention, UpgradeItem};
use crate::lad::LADID;
use crate::network::{NetworkManager, NetworkResults};
use crate::postcode_sector::PostcodeSectorID;
use crate::simulation::planner::SectorWarning;
use crate::strategy::StrategyTag;
use crate::units::{Dimensionless, MbpsPerKm2, Money};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

pub mod metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "cdcam_results";

/// The output file name for LAD metrics
const METRICS_FILE_NAME: &str = "metrics.csv";

/// The output file name for built interventions
const DECISIONS_FILE_NAME: &str = "decisions.csv";

/// The output file name for spend, labelled by strategy
const SPEND_FILE_NAME: &str = "spend.csv";

/// The output file name for sectors skipped or left partially planned
const WARNINGS_FILE_NAME: &str = "warnings.csv";

/// The output file name for per-sector debug information
const DEBUG_SECTORS_FILE_NAME: &str = "debug_sectors.csv";

/// Get the default output directory for the model specified at `model_dir`
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model, optionally overwriting existing data
///
/// # Arguments
///
/// * `output_dir` - The output directory to create/overwrite
/// * `allow_overwrite` - Whether to delete and recreate the folder if it is non-empty
///
/// # Returns
///
/// `true` if the output dir contained existing data that was deleted, `false` if not, or an error.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    // If the folder already exists, then delete it
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Please delete the folder or pass the --overwrite command line option."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the metrics CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct MetricsRow {
    year: u32,
    lad_id: LADID,
    lad_name: String,
    cost: Money,
    coverage: Dimensionless,
    demand: MbpsPerKm2,
    capacity: MbpsPerKm2,
}

/// Represents a row in the decisions CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DecisionRow {
    year: u32,
    pcd_sector_id: PostcodeSectorID,
    site_id: SiteID,
    item: UpgradeItem,
    cost: Money,
}

/// Represents a row in the spend CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SpendRow {
    year: u32,
    pcd_sector_id: PostcodeSectorID,
    site_id: SiteID,
    item: UpgradeItem,
    cost: Money,
    strategy: StrategyTag,
}

/// Represents a row in the warnings CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct WarningRow {
    year: u32,
    pcd_sector_id: PostcodeSectorID,
    message: String,
}

/// Represents a row in the debug sectors CSV file
#[derive(Serialize, Debug, PartialEq)]
struct DebugSectorRow {
    year: u32,
    pcd_sector_id: PostcodeSectorID,
    lad_id: LADID,
    environment: Environment,
    population: f64,
    demand: MbpsPerKm2,
    capacity: MbpsPerKm2,
    capacity_margin: MbpsPerKm2,
}

/// An object for writing the results of one scenario/strategy combination to file
pub struct DataWriter {
    strategy: StrategyTag,
    metrics_writer: csv::Writer<File>,
    decisions_writer: csv::Writer<File>,
    spend_writer: csv::Writer<File>,
    warnings_writer: csv::Writer<File>,
    debug_writer: Option<csv::Writer<File>>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    /// * `strategy` - The strategy being run, recorded in the spend file
    /// * `save_debug_info` - Whether to include extra CSV files for debugging model
    pub fn create(
        output_path: &Path,
        strategy: StrategyTag,
        save_debug_info: bool,
    ) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        let debug_writer = if save_debug_info {
            Some(new_writer(DEBUG_SECTORS_FILE_NAME)?)
        } else {
            None
        };

        Ok(Self {
            strategy,
            metrics_writer: new_writer(METRICS_FILE_NAME)?,
            decisions_writer: new_writer(DECISIONS_FILE_NAME)?,
            spend_writer: new_writer(SPEND_FILE_NAME)?,
            warnings_writer: new_writer(WARNINGS_FILE_NAME)?,
            debug_writer,
        })
    }

    /// Write one row per LAD to the metrics file
    pub fn write_metrics(&mut self, year: u32, results: &NetworkResults) -> Result<()> {
        for lad in &results.lads {
            let row = MetricsRow {
                year,
                lad_id: lad.lad_id.clone(),
                lad_name: lad.lad_name.clone(),
                cost: lad.cost,
                coverage: lad.metrics.coverage,
                demand: lad.metrics.demand,
                capacity: lad.metrics.capacity,
            };
            self.metrics_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write one row per built intervention to the decisions and spend files
    pub fn write_interventions(&mut self, year: u32, interventions: &[Intervention]) -> Result<()> {
        for intervention in interventions {
            let row = DecisionRow {
                year,
                pcd_sector_id: intervention.pcd_sector_id.clone(),
                site_id: intervention.site_id.clone(),
                item: intervention.item,
                cost: intervention.cost,
            };
            self.decisions_writer.serialize(row)?;

            let row = SpendRow {
                year,
                pcd_sector_id: intervention.pcd_sector_id.clone(),
                site_id: intervention.site_id.clone(),
                item: intervention.item,
                cost: intervention.cost,
                strategy: self.strategy,
            };
            self.spend_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write sector warnings to file
    pub fn write_warnings<'a, I>(&mut self, year: u32, warnings: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a SectorWarning>,
    {
        for warning in warnings {
            let row = WarningRow {
                year,
                pcd_sector_id: warning.pcd_sector_id.clone(),
                message: warning.message.clone(),
            };
            self.warnings_writer.serialize(row)?;
        }

        Ok(())
    }

    /// Write demand and capacity for every sector, if debug output is enabled.
    ///
    /// Sectors whose capacity cannot be calculated are left out.
    pub fn write_debug_sectors(&mut self, year: u32, manager: &NetworkManager) -> Result<()> {
        let Some(writer) = &mut self.debug_writer else {
            return Ok(());
        };

        for (sector, metrics) in manager.sector_metrics() {
            let Ok(metrics) = metrics else {
                continue;
            };

            let row = DebugSectorRow {
                year,
                pcd_sector_id: sector.id.clone(),
                lad_id: sector.lad_id.clone(),
                environment: sector.environment,
                population: metrics.population,
                demand: metrics.demand,
                capacity: metrics.capacity,
                capacity_margin: metrics.capacity - metrics.demand,
            };
            writer.serialize(row)?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.metrics_writer.flush()?;
        self.decisions_writer.flush()?;
        self.spend_writer.flush()?;
        self.warnings_writer.flush()?;
        if let Some(writer) = &mut self.debug_writer {
            writer.flush()?;
        }

        Ok(())
    }
}
