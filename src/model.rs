//! The model represents the static input data provided by the user.
use crate::asset::Asset;
use crate::capacity::CapacityTable;
use crate::clutter::ClutterTable;
use crate::intervention::InterventionCatalog;
use crate::lad::LADDescriptor;
use crate::postcode_sector::PostcodeSectorData;
use crate::scenario::{PopulationScenarioMap, ScenarioID, ThroughputScenarioMap};
use crate::strategy::StrategyTag;
use anyhow::{Result, ensure};
use itertools::iproduct;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

pub mod parameters;
pub use parameters::ModelParameters;

/// Model definition
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// Parameters from the model TOML file
    pub parameters: ModelParameters,
    /// Local area districts
    pub lads: Vec<LADDescriptor>,
    /// Postcode sectors with their base-year population and throughput
    pub postcode_sectors: Vec<PostcodeSectorData>,
    /// The initial asset inventory
    pub assets: Vec<Asset>,
    /// Population scenarios
    pub population_scenarios: PopulationScenarioMap,
    /// Throughput scenarios
    pub throughput_scenarios: ThroughputScenarioMap,
    /// Capacity curves
    pub capacity_table: Rc<CapacityTable>,
    /// Clutter breakpoints
    pub clutter_table: ClutterTable,
    /// Upgrade costs
    pub catalog: InterventionCatalog,
}

/// One combination of scenarios and strategy which is simulated independently
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    /// Population scenario name
    pub population_scenario: ScenarioID,
    /// Throughput scenario name
    pub throughput_scenario: ScenarioID,
    /// Investment strategy
    pub strategy: StrategyTag,
}

impl fmt::Display for RunSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}__{}__{}",
            self.population_scenario, self.throughput_scenario, self.strategy
        )
    }
}

/// Narrows the scenarios and strategies listed in the model file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSelection {
    /// Run only this population scenario
    pub population_scenario: Option<String>,
    /// Run only this throughput scenario
    pub throughput_scenario: Option<String>,
    /// Run only this strategy
    pub strategy: Option<StrategyTag>,
}

/// Apply an optional selection to a list of names
fn select<T: Clone + PartialEq + fmt::Display>(
    kind: &str,
    available: &[T],
    selected: Option<T>,
) -> Result<Vec<T>> {
    let Some(selected) = selected else {
        return Ok(available.to_vec());
    };

    ensure!(
        available.contains(&selected),
        "The {kind} {selected} is not listed in the model file"
    );

    Ok(vec![selected])
}

impl Model {
    /// Iterate over the years of the simulation
    pub fn iter_years(&self) -> impl Iterator<Item = u32> + '_ {
        self.parameters.iter_years()
    }

    /// The scenario and strategy combinations to run, in a stable order.
    ///
    /// Returns an error if the selection names something the model file does not list.
    pub fn run_specs(&self, selection: &RunSelection) -> Result<Vec<RunSpec>> {
        let params = &self.parameters;
        let population_scenarios = select(
            "population scenario",
            &params.population_scenarios,
            selection.population_scenario.as_deref().map(ScenarioID::from),
        )?;
        let throughput_scenarios = select(
            "throughput scenario",
            &params.throughput_scenarios,
            selection.throughput_scenario.as_deref().map(ScenarioID::from),
        )?;
        let strategies = select("strategy", &params.strategies, selection.strategy)?;

        Ok(iproduct!(population_scenarios, throughput_scenarios, strategies)
            .map(
                |(population_scenario, throughput_scenario, strategy)| RunSpec {
                    population_scenario,
                    throughput_scenario,
                    strategy,
                },
            )
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, model};
    use rstest::rstest;

    #[rstest]
    fn test_run_specs_all(model: Model) {
        let specs = model.run_specs(&RunSelection::default()).unwrap();
        assert_eq!(
            specs.iter().map(ToString::to_string).collect::<Vec<_>>(),
            [
                "baseline__baseline__minimal",
                "baseline__baseline__small-cell-and-spectrum"
            ]
        );
    }

    #[rstest]
    fn test_run_specs_selection(model: Model) {
        let selection = RunSelection {
            strategy: Some(StrategyTag::SmallCellAndSpectrum),
            ..Default::default()
        };
        let specs = model.run_specs(&selection).unwrap();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].strategy, StrategyTag::SmallCellAndSpectrum);

        let selection = RunSelection {
            population_scenario: Some("high".into()),
            ..Default::default()
        };
        assert_error!(
            model.run_specs(&selection),
            "The population scenario high is not listed in the model file"
        );
    }
}
