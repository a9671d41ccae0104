//! Common routines for handling input data.
use crate::model::{Model, ModelParameters};
use crate::scenario::ScenarioID;
use anyhow::{Context, Result, bail, ensure};
use itertools::Itertools;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::rc::Rc;

pub mod asset;
use asset::read_assets;
pub mod capacity;
use capacity::read_capacity_table;
pub mod clutter;
use clutter::read_clutter_table;
pub mod intervention;
use intervention::read_intervention_catalog;
pub mod lad;
use lad::read_lads;
pub mod postcode_sector;
use postcode_sector::read_postcode_sectors;
pub mod scenario;
use scenario::{read_population_scenarios, read_throughput_scenarios};

/// Read a series of type `T`s from a CSV file.
///
/// Will raise an error if the file is empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    let vec = read_csv_internal(file_path)?;
    if vec.is_empty() {
        bail!("CSV file {} cannot be empty", file_path.display());
    }

    Ok(vec.into_iter())
}

/// Read a series of type `T`s from a CSV file which may be absent.
///
/// An absent file is treated as empty.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_csv_optional<'a, T: DeserializeOwned + 'a>(
    file_path: &'a Path,
) -> Result<impl Iterator<Item = T> + 'a> {
    if !file_path.exists() {
        return Ok(Vec::new().into_iter());
    }

    Ok(read_csv_internal(file_path)?.into_iter())
}

fn read_csv_internal<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let vec = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?
        .into_deserialize()
        .process_results(|iter| iter.collect_vec())
        .with_context(|| input_err_msg(file_path))?;

    Ok(vec)
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read a `Dimensionless`-like f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D, T>(deserialiser: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<f64>,
{
    let value: f64 = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value must be between 0 and 1"))?;
    }

    Ok(value.into())
}

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Check that a number is finite and not negative
pub fn check_non_negative(value: f64, name: &str) -> Result<()> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{name} must be a finite number which is not negative (got {value})"
    );

    Ok(())
}

/// Read a model from the specified directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The loaded model or an error.
pub fn load_model<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
    let model_dir = model_dir.as_ref();
    let parameters = ModelParameters::from_path(model_dir)?;
    let lads = read_lads(model_dir)?;
    let postcode_sectors = read_postcode_sectors(model_dir)?;
    let assets = read_assets(model_dir, &parameters)?;
    let population_scenarios = read_population_scenarios(model_dir)?;
    let throughput_scenarios = read_throughput_scenarios(model_dir)?;
    check_scenarios_defined(
        "population",
        &parameters.population_scenarios,
        population_scenarios.keys(),
    )?;
    check_scenarios_defined(
        "throughput",
        &parameters.throughput_scenarios,
        throughput_scenarios.keys(),
    )?;
    let capacity_table = read_capacity_table(model_dir)?;
    let clutter_table = read_clutter_table(model_dir)?;
    let catalog = read_intervention_catalog(model_dir)?;

    Ok(Model {
        model_path: model_dir.to_path_buf(),
        parameters,
        lads,
        postcode_sectors,
        assets,
        population_scenarios,
        throughput_scenarios,
        capacity_table: Rc::new(capacity_table),
        clutter_table,
        catalog,
    })
}

/// Check that every scenario named in `model.toml` is defined in its CSV file
fn check_scenarios_defined<'a, I>(kind: &str, names: &[ScenarioID], defined: I) -> Result<()>
where
    I: Iterator<Item = &'a ScenarioID>,
{
    let defined: HashSet<_> = defined.collect();
    for name in names {
        ensure!(
            defined.contains(name),
            "The {kind} scenario {name} is not defined in the {kind} scenarios file"
        );
    }

    Ok(())
}
