//! Defines the `ModelParameters` struct, which represents the contents of `model.toml`.
use crate::input::{deserialise_proportion, input_err_msg, read_toml};
use crate::intervention::MastHeights;
use crate::postcode_sector::SectorParameters;
use crate::scenario::ScenarioID;
use crate::strategy::StrategyTag;
use crate::units::{Dimensionless, MbpsPerKm2, Money};
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use serde::Deserialize;
use std::path::Path;

const MODEL_PARAMETERS_FILE_NAME: &str = "model.toml";

macro_rules! define_unit_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            <$type>::new($value)
        }
    };
}

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_unit_param_default!(default_penetration, Dimensionless, 0.8);
define_unit_param_default!(default_busy_hour_fraction, Dimensionless, 0.15);
define_unit_param_default!(default_market_share, Dimensionless, 1.0);
define_param_default!(default_mast_height_m, u32, 30);
define_param_default!(default_raised_mast_height_m, u32, 40);
define_param_default!(default_spectrum_release_year, u32, 2020);

/// Represents the contents of the entire model file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// The first simulated year
    pub base_year: u32,
    /// The last simulated year (inclusive)
    pub end_year: u32,
    /// Money available for upgrades each year, in GBP
    pub annual_budget: Money,
    /// The capacity every sector should reach.
    ///
    /// When zero, sectors are upgraded until capacity meets demand instead.
    #[serde(default)]
    pub service_obligation_capacity: MbpsPerKm2,
    /// Proportion of the population with a mobile subscription
    #[serde(default = "default_penetration")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub penetration: Dimensionless,
    /// Proportion of daily traffic carried in the busy hour
    #[serde(default = "default_busy_hour_fraction")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub busy_hour_fraction: Dimensionless,
    /// Proportion of subscribers using the modelled operator
    #[serde(default = "default_market_share")]
    #[serde(deserialize_with = "deserialise_proportion")]
    pub market_share: Dimensionless,
    /// Standard mast height in metres
    #[serde(default = "default_mast_height_m")]
    pub mast_height_m: u32,
    /// Mast height in metres after a `raise_mast_height` upgrade
    #[serde(default = "default_raised_mast_height_m")]
    pub raised_mast_height_m: u32,
    /// The first year in which new spectrum and 5G equipment can be deployed
    #[serde(default = "default_spectrum_release_year")]
    pub spectrum_release_year: u32,
    /// Names of the population scenarios to run
    pub population_scenarios: Vec<ScenarioID>,
    /// Names of the throughput scenarios to run
    pub throughput_scenarios: Vec<ScenarioID>,
    /// The strategies to run
    pub strategies: Vec<StrategyTag>,
}

/// Check that the simulation period is valid
fn check_years(base_year: u32, end_year: u32) -> Result<()> {
    ensure!(
        base_year <= end_year,
        "end_year ({end_year}) cannot be before base_year ({base_year})"
    );

    Ok(())
}

/// Check that the `annual_budget` parameter is valid
fn check_annual_budget(value: Money) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Money(0.0),
        "annual_budget must be a finite number which is not negative"
    );

    Ok(())
}

/// Check that the `service_obligation_capacity` parameter is valid
fn check_service_obligation_capacity(value: MbpsPerKm2) -> Result<()> {
    ensure!(
        value.is_finite() && value >= MbpsPerKm2(0.0),
        "service_obligation_capacity must be a finite number which is not negative"
    );

    Ok(())
}

/// Check that the mast heights are valid
fn check_mast_heights(standard_m: u32, raised_m: u32) -> Result<()> {
    ensure!(standard_m > 0, "mast_height_m cannot be zero");
    ensure!(
        raised_m > standard_m,
        "raised_mast_height_m must be greater than mast_height_m"
    );

    Ok(())
}

/// Check that a list of run selections is non-empty and has no repeats
fn check_selection<T: Eq + std::hash::Hash + std::fmt::Display>(
    name: &str,
    values: &[T],
) -> Result<()> {
    ensure!(!values.is_empty(), "`{name}` is empty");
    if let Some(duplicate) = values.iter().duplicates().next() {
        bail!("`{name}` contains {duplicate} more than once");
    }

    Ok(())
}

impl ModelParameters {
    /// Read a model file from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    ///
    /// # Returns
    ///
    /// The model file contents as a [`ModelParameters`] struct or an error if the file is invalid
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<ModelParameters> {
        let file_path = model_dir.as_ref().join(MODEL_PARAMETERS_FILE_NAME);
        let model_params: ModelParameters = read_toml(&file_path)?;

        model_params
            .validate()
            .with_context(|| input_err_msg(file_path))?;

        Ok(model_params)
    }

    /// Validate parameters after reading in file
    fn validate(&self) -> Result<()> {
        check_years(self.base_year, self.end_year)?;
        check_annual_budget(self.annual_budget)?;
        check_service_obligation_capacity(self.service_obligation_capacity)?;

        // proportions already validated with deserialise_proportion

        check_mast_heights(self.mast_height_m, self.raised_mast_height_m)?;
        check_selection("population_scenarios", &self.population_scenarios)?;
        check_selection("throughput_scenarios", &self.throughput_scenarios)?;
        check_selection("strategies", &self.strategies)?;

        Ok(())
    }

    /// The simulated years, in order
    pub fn iter_years(&self) -> impl Iterator<Item = u32> {
        self.base_year..=self.end_year
    }

    /// Parameters shared by every postcode sector
    pub fn sector_parameters(&self) -> SectorParameters {
        SectorParameters {
            penetration: self.penetration,
            market_share: self.market_share,
            busy_hour_fraction: self.busy_hour_fraction,
            mast_height_m: self.mast_height_m,
        }
    }

    /// Heights used for new masts
    pub fn mast_heights(&self) -> MastHeights {
        MastHeights {
            standard_m: self.mast_height_m,
            raised_m: self.raised_mast_height_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    const MINIMAL_FILE: &str = r#"base_year = 2020
end_year = 2022
annual_budget = 1e6
population_scenarios = ["baseline"]
throughput_scenarios = ["baseline"]
strategies = ["minimal", "small-cell-and-spectrum"]
"#;

    fn write_model_file(dir_path: &Path, contents: &str) {
        let mut file = File::create(dir_path.join(MODEL_PARAMETERS_FILE_NAME)).unwrap();
        write!(file, "{contents}").unwrap();
    }

    #[test]
    fn test_model_params_from_path() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), MINIMAL_FILE);

        let model_params = ModelParameters::from_path(dir.path()).unwrap();
        assert_eq!(model_params.iter_years().collect_vec(), [2020, 2021, 2022]);
        assert_eq!(model_params.annual_budget, Money(1e6));
        assert_eq!(model_params.service_obligation_capacity, MbpsPerKm2(0.0));
        assert_eq!(model_params.penetration, Dimensionless(0.8));
        assert_eq!(
            model_params.strategies,
            [StrategyTag::Minimal, StrategyTag::SmallCellAndSpectrum]
        );
        assert_eq!(
            model_params.mast_heights(),
            MastHeights {
                standard_m: 30,
                raised_m: 40
            }
        );
    }

    #[test]
    fn test_model_params_unknown_strategy() {
        let dir = tempdir().unwrap();
        write_model_file(
            dir.path(),
            &MINIMAL_FILE.replace("\"minimal\"", "\"fibre-to-the-mast\""),
        );
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[test]
    fn test_model_params_bad_proportion() {
        let dir = tempdir().unwrap();
        write_model_file(dir.path(), &format!("{MINIMAL_FILE}market_share = 1.5\n"));
        assert!(ModelParameters::from_path(dir.path()).is_err());
    }

    #[rstest]
    #[case(2020, 2020, true)]
    #[case(2020, 2030, true)]
    #[case(2021, 2020, false)]
    fn test_check_years(#[case] base: u32, #[case] end: u32, #[case] expected_valid: bool) {
        assert_eq!(check_years(base, end).is_ok(), expected_valid);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(2e9, true)]
    #[case(-1.0, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_check_annual_budget(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(check_annual_budget(Money(value)).is_ok(), expected_valid);
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(10.0, true)]
    #[case(-0.5, false)]
    #[case(f64::NAN, false)]
    fn test_check_service_obligation_capacity(#[case] value: f64, #[case] expected_valid: bool) {
        assert_eq!(
            check_service_obligation_capacity(MbpsPerKm2(value)).is_ok(),
            expected_valid
        );
    }

    #[rstest]
    #[case(30, 40, true)]
    #[case(30, 30, false)]
    #[case(0, 40, false)]
    fn test_check_mast_heights(
        #[case] standard: u32,
        #[case] raised: u32,
        #[case] expected_valid: bool,
    ) {
        assert_eq!(check_mast_heights(standard, raised).is_ok(), expected_valid);
    }

    #[test]
    fn test_check_selection() {
        assert!(check_selection::<StrategyTag>("strategies", &[StrategyTag::Minimal]).is_ok());
        assert_error!(
            check_selection::<StrategyTag>("strategies", &[]),
            "`strategies` is empty"
        );
        assert_error!(
            check_selection(
                "strategies",
                &[StrategyTag::CloudRan, StrategyTag::CloudRan]
            ),
            "`strategies` contains cloud-ran more than once"
        );
    }
}
