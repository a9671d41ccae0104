//! A capacity planning model for mobile access networks.
//!
//! Postcode sectors are grouped into local area districts (LADs). Each year, a strategy chooses
//! upgrades for the most underserved sectors within an annual budget, and demand, capacity and
//! coverage are reported for every LAD.
#![warn(missing_docs)]
use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod asset;
pub mod capacity;
pub mod cli;
pub mod clutter;
pub mod id;
pub mod input;
pub mod intervention;
pub mod lad;
pub mod log;
pub mod model;
pub mod network;
pub mod output;
pub mod postcode_sector;
pub mod scenario;
pub mod settings;
pub mod simulation;
pub mod strategy;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the directory in which program settings are stored
pub fn get_cdcam_config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Could not determine the user config directory")?;
    path.push("cdcam");

    Ok(path)
}
