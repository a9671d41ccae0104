//! Code for reading local area districts from a CSV file.
use super::*;
use crate::lad::LADDescriptor;

const LADS_FILE_NAME: &str = "lads.csv";

/// Read LADs from the model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// The LADs in file order or an error.
pub fn read_lads(model_dir: &Path) -> Result<Vec<LADDescriptor>> {
    let file_path = model_dir.join(LADS_FILE_NAME);
    let lads_csv = read_csv(&file_path)?;
    read_lads_from_iter(lads_csv).with_context(|| input_err_msg(&file_path))
}

fn read_lads_from_iter<I>(iter: I) -> Result<Vec<LADDescriptor>>
where
    I: Iterator<Item = LADDescriptor>,
{
    let mut ids = HashSet::new();
    iter.map(|lad| {
        ensure!(!lad.id.0.is_empty(), "LAD IDs cannot be empty");
        ensure!(ids.insert(lad.id.clone()), "Duplicate LAD ID: {}", lad.id);
        Ok(lad)
    })
    .try_collect()
}
