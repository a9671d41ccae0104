//! Population and throughput scenarios, which vary demand over the simulation period.
use crate::id::define_id_type;
use crate::postcode_sector::PostcodeSectorID;
use crate::units::GigabytesPerMonth;
use indexmap::IndexMap;
use std::collections::HashMap;

define_id_type! {ScenarioID}

/// Sector populations for each year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopulationScenario(pub HashMap<(u32, PostcodeSectorID), f64>);

impl PopulationScenario {
    /// The population of a sector in a given year, if the scenario specifies one
    pub fn population(&self, year: u32, pcd_sector_id: &PostcodeSectorID) -> Option<f64> {
        self.0.get(&(year, pcd_sector_id.clone())).copied()
    }
}

/// Per-user monthly throughput for each year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThroughputScenario(pub HashMap<u32, GigabytesPerMonth>);

impl ThroughputScenario {
    /// The per-user throughput in a given year, if the scenario specifies one
    pub fn throughput(&self, year: u32) -> Option<GigabytesPerMonth> {
        self.0.get(&year).copied()
    }
}

/// Population scenarios keyed by name
pub type PopulationScenarioMap = IndexMap<ScenarioID, PopulationScenario>;

/// Throughput scenarios keyed by name
pub type ThroughputScenarioMap = IndexMap<ScenarioID, ThroughputScenario>;
