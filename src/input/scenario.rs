//! Code for reading population and throughput scenarios from CSV files.
use super::*;
use crate::postcode_sector::PostcodeSectorID;
use crate::scenario::{
    PopulationScenario, PopulationScenarioMap, ThroughputScenario, ThroughputScenarioMap,
};
use crate::units::GigabytesPerMonth;
use serde::Deserialize;

const POPULATION_SCENARIOS_FILE_NAME: &str = "population_scenarios.csv";
const THROUGHPUT_SCENARIOS_FILE_NAME: &str = "throughput_scenarios.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct PopulationRaw {
    scenario: ScenarioID,
    year: u32,
    pcd_sector_id: PostcodeSectorID,
    population: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct ThroughputRaw {
    scenario: ScenarioID,
    year: u32,
    gb_per_month: f64,
}

/// Read population scenarios from the model directory.
///
/// Sectors which are not in the sectors file are allowed; their entries are never used.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_population_scenarios(model_dir: &Path) -> Result<PopulationScenarioMap> {
    let file_path = model_dir.join(POPULATION_SCENARIOS_FILE_NAME);
    let population_csv = read_csv(&file_path)?;
    read_population_scenarios_from_iter(population_csv)
        .with_context(|| input_err_msg(&file_path))
}

fn read_population_scenarios_from_iter<I>(iter: I) -> Result<PopulationScenarioMap>
where
    I: Iterator<Item = PopulationRaw>,
{
    let mut scenarios = PopulationScenarioMap::new();
    for row in iter {
        check_non_negative(row.population, "population").with_context(|| {
            format!(
                "Invalid population for sector {} in {} ({})",
                row.pcd_sector_id, row.year, row.scenario
            )
        })?;

        let scenario: &mut PopulationScenario = scenarios.entry(row.scenario.clone()).or_default();
        let existing = scenario
            .0
            .insert((row.year, row.pcd_sector_id.clone()), row.population);
        ensure!(
            existing.is_none(),
            "Population for sector {} in {} defined more than once for scenario {}",
            row.pcd_sector_id,
            row.year,
            row.scenario
        );
    }

    Ok(scenarios)
}

/// Read throughput scenarios from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_throughput_scenarios(model_dir: &Path) -> Result<ThroughputScenarioMap> {
    let file_path = model_dir.join(THROUGHPUT_SCENARIOS_FILE_NAME);
    let throughput_csv = read_csv(&file_path)?;
    read_throughput_scenarios_from_iter(throughput_csv)
        .with_context(|| input_err_msg(&file_path))
}

fn read_throughput_scenarios_from_iter<I>(iter: I) -> Result<ThroughputScenarioMap>
where
    I: Iterator<Item = ThroughputRaw>,
{
    let mut scenarios = ThroughputScenarioMap::new();
    for row in iter {
        check_non_negative(row.gb_per_month, "gb_per_month").with_context(|| {
            format!("Invalid throughput in {} ({})", row.year, row.scenario)
        })?;

        let scenario: &mut ThroughputScenario = scenarios.entry(row.scenario.clone()).or_default();
        let existing = scenario
            .0
            .insert(row.year, GigabytesPerMonth(row.gb_per_month));
        ensure!(
            existing.is_none(),
            "Throughput for {} defined more than once for scenario {}",
            row.year,
            row.scenario
        );
    }

    Ok(scenarios)
}
