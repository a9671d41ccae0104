//! Code for reading overrides to the unit costs of upgrades.
use super::*;
use crate::intervention::{InterventionCatalog, UpgradeItem};
use crate::units::Money;
use serde::Deserialize;

const INTERVENTION_COSTS_FILE_NAME: &str = "intervention_costs.csv";

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct InterventionCostRaw {
    item: UpgradeItem,
    cost: Money,
}

/// Read the intervention catalogue, applying any cost overrides in the model directory.
///
/// The overrides file is optional. Items which are not listed keep their default costs.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
pub fn read_intervention_catalog(model_dir: &Path) -> Result<InterventionCatalog> {
    let file_path = model_dir.join(INTERVENTION_COSTS_FILE_NAME);
    let costs_csv = read_csv_optional(&file_path)?;
    read_intervention_catalog_from_iter(costs_csv).with_context(|| input_err_msg(&file_path))
}

fn read_intervention_catalog_from_iter<I>(iter: I) -> Result<InterventionCatalog>
where
    I: Iterator<Item = InterventionCostRaw>,
{
    let mut items = HashSet::new();
    let overrides: Vec<_> = iter
        .map(|row| {
            ensure!(
                items.insert(row.item),
                "Cost for {} defined more than once",
                row.item
            );
            Ok((row.item, row.cost))
        })
        .try_collect()?;

    InterventionCatalog::with_costs(overrides)
}
