//! Functionality for running the simulation.
use crate::asset::Asset;
use crate::model::{Model, RunSelection, RunSpec};
use crate::network::NetworkManager;
use crate::output::DataWriter;
use crate::output::metadata::write_metadata;
use crate::postcode_sector::PostcodeSectorData;
use crate::scenario::{PopulationScenario, ThroughputScenario};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;
use std::rc::Rc;

pub mod planner;
use planner::{PlannerOptions, SectorWarning, decide};

/// Run the simulation for every selected scenario and strategy combination.
///
/// Each combination writes to its own subfolder of `output_path`. A failing combination is
/// logged and the rest still run, but an error is returned at the end.
///
/// # Arguments:
///
/// * `model` - The model to run
/// * `output_path` - The folder to which output files will be written
/// * `debug_model` - Whether to write additional information to CSV files
/// * `selection` - Narrows the scenarios and strategies to run
pub fn run(
    model: &Model,
    output_path: &Path,
    debug_model: bool,
    selection: &RunSelection,
) -> Result<()> {
    let specs = model.run_specs(selection)?;
    write_metadata(output_path, &model.model_path, &specs)
        .context("Failed to save metadata")?;

    let mut failed = Vec::new();
    for spec in &specs {
        info!("Running {spec}");
        if let Err(err) = run_combination(model, spec, output_path, debug_model) {
            error!("Run {spec} failed: {err:?}");
            failed.push(spec.to_string());
        }
    }

    ensure!(
        failed.is_empty(),
        "{} of {} runs failed: {}",
        failed.len(),
        specs.len(),
        failed.join(", ")
    );

    Ok(())
}

/// Simulate every year for one scenario and strategy combination
fn run_combination(
    model: &Model,
    spec: &RunSpec,
    output_path: &Path,
    debug_model: bool,
) -> Result<()> {
    let population = model
        .population_scenarios
        .get(&spec.population_scenario)
        .with_context(|| format!("Unknown population scenario {}", spec.population_scenario))?;
    let throughput = model
        .throughput_scenarios
        .get(&spec.throughput_scenario)
        .with_context(|| format!("Unknown throughput scenario {}", spec.throughput_scenario))?;

    let run_path = output_path.join(spec.to_string());
    fs::create_dir_all(&run_path)?;
    let mut writer = DataWriter::create(&run_path, spec.strategy, debug_model)?;

    let params = &model.parameters;
    let sector_parameters = Rc::new(params.sector_parameters());

    // Initial assets plus everything built in earlier years
    let mut pipeline = model.assets.clone();

    for year in model.iter_years() {
        info!("Year {year}");

        let sectors = sectors_for_year(&model.postcode_sectors, population, throughput, year);
        let assets = assets_in_service(&pipeline, year).cloned();
        let mut manager = NetworkManager::new(
            model.lads.iter().cloned(),
            sectors,
            assets,
            &model.capacity_table,
            &model.clutter_table,
            &sector_parameters,
            params.service_obligation_capacity,
        );

        if year == params.base_year {
            log_diagnostics(&manager);
        }

        let options = PlannerOptions {
            year,
            spectrum_release_year: params.spectrum_release_year,
            mast_heights: params.mast_heights(),
        };
        let plan = decide(
            spec.strategy,
            params.annual_budget,
            &manager,
            &model.catalog,
            &options,
        );
        for intervention in &plan.interventions {
            debug!(
                "{} ({}) at site {} in {} for {}",
                intervention.item.description(),
                intervention.item,
                intervention.site_id,
                intervention.pcd_sector_id,
                intervention.cost
            );
        }
        info!(
            "Built {} interventions, leaving {} of the budget",
            plan.interventions.len(),
            plan.remaining_budget
        );

        manager.upgrade(&plan.interventions)?;
        pipeline.extend(
            plan.interventions
                .iter()
                .flat_map(|intervention| intervention.assets.iter().cloned()),
        );

        let results = manager.results();
        let skipped = results
            .skipped_sectors
            .iter()
            .map(|(pcd_sector_id, err)| SectorWarning {
                pcd_sector_id: pcd_sector_id.clone(),
                message: format!("Left out of metrics: {err}"),
            })
            .collect_vec();
        for warning in plan.warnings.iter().chain(&skipped) {
            warn!("{year}: sector {}: {}", warning.pcd_sector_id, warning.message);
        }

        writer.write_metrics(year, &results)?;
        writer.write_interventions(year, &plan.interventions)?;
        writer.write_warnings(year, plan.warnings.iter().chain(&skipped))?;
        writer.write_debug_sectors(year, &manager)?;
    }

    writer.flush()
}

/// Postcode sectors with this year's population and throughput.
///
/// Values missing from a scenario keep those given in the postcode sectors file.
fn sectors_for_year<'a>(
    sectors: &'a [PostcodeSectorData],
    population: &'a PopulationScenario,
    throughput: &'a ThroughputScenario,
    year: u32,
) -> impl Iterator<Item = PostcodeSectorData> + 'a {
    sectors.iter().map(move |data| PostcodeSectorData {
        population: population
            .population(year, &data.id)
            .unwrap_or(data.population),
        user_throughput: throughput
            .throughput(year)
            .unwrap_or(data.user_throughput),
        ..data.clone()
    })
}

/// Report input records which could not be placed in the network
fn log_diagnostics(manager: &NetworkManager) {
    let diagnostics = manager.diagnostics();
    if !diagnostics.any_dropped() {
        return;
    }

    warn!(
        "Dropped {} sectors with an unknown LAD, {} sectors without area and {} assets with \
        an unknown sector",
        diagnostics.sectors_without_lad,
        diagnostics.sectors_without_area,
        diagnostics.assets_without_sector
    );
}

/// Assets in service in a given year
fn assets_in_service(pipeline: &[Asset], year: u32) -> impl Iterator<Item = &Asset> {
    pipeline.iter().filter(move |asset| asset.build_year <= year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Frequency, Technology};
    use crate::fixture::{asset, model};
    use crate::strategy::StrategyTag;
    use crate::units::GigabytesPerMonth;
    use map_macro::hash_map;
    use rstest::rstest;
    use tempfile::tempdir;

    fn read_file(dir: &Path, spec: &str, file_name: &str) -> Vec<String> {
        fs::read_to_string(dir.join(spec).join(file_name))
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    #[rstest]
    fn test_sectors_for_year(model: Model) {
        let population = &model.population_scenarios["baseline"];
        let throughput = ThroughputScenario(hash_map! {2021 => GigabytesPerMonth(5.0)});

        let sectors =
            sectors_for_year(&model.postcode_sectors, population, &throughput, 2021).collect_vec();
        assert_eq!(sectors[0].population, 600.0);
        assert_eq!(sectors[0].user_throughput, GigabytesPerMonth(5.0));

        // Missing entries fall back to the sector file
        let sectors =
            sectors_for_year(&model.postcode_sectors, population, &throughput, 2030).collect_vec();
        assert_eq!(sectors[0].population, 500.0);
        assert_eq!(sectors[0].user_throughput, GigabytesPerMonth(2.0));
    }

    #[rstest]
    fn test_assets_in_service(asset: Asset) {
        let future = Asset {
            build_year: 2025,
            ..asset.clone()
        };
        let pipeline = [asset, future];
        assert_eq!(assets_in_service(&pipeline, 2020).count(), 1);
        assert_eq!(assets_in_service(&pipeline, 2025).count(), 2);
    }

    #[rstest]
    fn test_run(model: Model) {
        let dir = tempdir().unwrap();
        run(&model, dir.path(), true, &RunSelection::default()).unwrap();
        assert!(dir.path().join("metadata.toml").exists());

        // Nothing is built under the minimal strategy
        let spec = "baseline__baseline__minimal";
        assert_eq!(read_file(dir.path(), spec, "decisions.csv").len(), 0);
        let metrics = read_file(dir.path(), spec, "metrics.csv");
        assert_eq!(metrics[0], "year,lad_id,lad_name,cost,coverage,demand,capacity");
        assert_eq!(metrics.len(), 3);
        assert!(metrics[1].starts_with("2020,1,Cambridge,0.0,0.0,"));
        assert!(metrics[2].starts_with("2021,1,Cambridge,0.0,0.0,"));
        assert_eq!(read_file(dir.path(), spec, "debug_sectors.csv").len(), 3);

        // One small cell lifts the sector over the obligation and it stays there
        let spec = "baseline__baseline__small-cell-and-spectrum";
        assert_eq!(
            read_file(dir.path(), spec, "decisions.csv"),
            [
                "year,pcd_sector_id,site_id,item,cost",
                "2020,CB11,CB11_small_cell_1,small_cell,40220.0"
            ]
        );
        assert_eq!(
            read_file(dir.path(), spec, "spend.csv")[1],
            "2020,CB11,CB11_small_cell_1,small_cell,40220.0,small-cell-and-spectrum"
        );
        let metrics = read_file(dir.path(), spec, "metrics.csv");
        assert!(metrics[1].starts_with("2020,1,Cambridge,40220.0,1.0,"));
        assert!(metrics[2].starts_with("2021,1,Cambridge,0.0,1.0,"));
        assert_eq!(read_file(dir.path(), spec, "warnings.csv").len(), 0);
    }

    #[rstest]
    fn test_run_selection(model: Model) {
        let dir = tempdir().unwrap();
        let selection = RunSelection {
            strategy: Some(StrategyTag::Minimal),
            ..Default::default()
        };
        run(&model, dir.path(), false, &selection).unwrap();
        assert!(dir.path().join("baseline__baseline__minimal").is_dir());
        assert!(
            !dir.path()
                .join("baseline__baseline__small-cell-and-spectrum")
                .exists()
        );
        assert!(
            !dir.path()
                .join("baseline__baseline__minimal")
                .join("debug_sectors.csv")
                .exists()
        );
    }

    #[rstest]
    fn test_run_missing_curve_is_reported(mut model: Model) {
        // There is no 2100 MHz curve, so the sector's capacity cannot be calculated
        model.assets[0].technology = Technology::Umts;
        model.assets[0].frequency = Frequency::Mhz2100;
        let dir = tempdir().unwrap();
        let selection = RunSelection {
            strategy: Some(StrategyTag::SmallCellAndSpectrum),
            ..Default::default()
        };
        run(&model, dir.path(), false, &selection).unwrap();

        let spec = "baseline__baseline__small-cell-and-spectrum";
        assert!(read_file(dir.path(), spec, "decisions.csv").is_empty());
        let warnings = read_file(dir.path(), spec, "warnings.csv");
        assert_eq!(warnings.len(), 5);
        assert!(warnings[1].starts_with("2020,CB11,Not considered for upgrades:"));
        assert!(warnings[2].starts_with("2020,CB11,Left out of metrics:"));
        assert!(warnings[3].starts_with("2021,CB11,"));
    }

    #[rstest]
    fn test_run_bad_selection(model: Model) {
        let dir = tempdir().unwrap();
        let selection = RunSelection {
            population_scenario: Some("high".into()),
            ..Default::default()
        };
        assert!(run(&model, dir.path(), false, &selection).is_err());
    }
}
