//! Local area districts (LADs) aggregate postcode sectors for reporting.
use crate::id::define_id_type;
use crate::postcode_sector::{PostcodeSectorID, SectorMetrics};
use crate::units::{Area, Dimensionless, MbpsPerKm2, PerKm2};
use indexmap::IndexMap;
use serde::Deserialize;

define_id_type! {LADID}

/// A map of [`LAD`]s, keyed by LAD ID
pub type LADMap = IndexMap<LADID, LAD>;

/// A local area district
#[derive(Debug, Clone, PartialEq)]
pub struct LAD {
    /// Unique identifier
    pub id: LADID,
    /// Human-readable name (e.g. "Cambridge")
    pub name: String,
    /// The sectors in this LAD, in the order they were registered
    pub sector_ids: Vec<PostcodeSectorID>,
}

/// The row of the LADs input file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LADDescriptor {
    /// Unique identifier
    pub id: LADID,
    /// Human-readable name
    pub name: String,
}

impl From<LADDescriptor> for LAD {
    fn from(value: LADDescriptor) -> Self {
        Self {
            id: value.id,
            name: value.name,
            sector_ids: Vec::new(),
        }
    }
}

/// Aggregate demand and capacity figures for a LAD
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LADMetrics {
    /// Total residents
    pub population: f64,
    /// Total land area
    pub area: Area,
    /// Residents per km² over the whole LAD
    pub population_density: PerKm2,
    /// Mean of sector capacities
    pub capacity: MbpsPerKm2,
    /// Area-weighted mean of sector demand
    pub demand: MbpsPerKm2,
    /// Proportion of the population living in sectors which meet the service obligation
    pub coverage: Dimensionless,
}

impl LADMetrics {
    /// Aggregate the metrics of a LAD's sectors.
    ///
    /// All figures are zero for a LAD without sectors.
    pub fn from_sectors(sectors: &[SectorMetrics], service_obligation: MbpsPerKm2) -> Self {
        if sectors.is_empty() {
            return Self::default();
        }

        let population: f64 = sectors.iter().map(|sector| sector.population).sum();
        let area: Area = sectors.iter().map(|sector| sector.area).sum();
        let total_capacity: MbpsPerKm2 = sectors.iter().map(|sector| sector.capacity).sum();
        let capacity = total_capacity / Dimensionless(sectors.len() as f64);

        let (population_density, demand) = if area > Area(0.0) {
            let weighted_demand: f64 = sectors
                .iter()
                .map(|sector| sector.demand.value() * sector.area.value())
                .sum();
            (
                Dimensionless(population) / area,
                MbpsPerKm2(weighted_demand / area.value()),
            )
        } else {
            (PerKm2(0.0), MbpsPerKm2(0.0))
        };

        let coverage = if population > 0.0 {
            let covered: f64 = sectors
                .iter()
                .filter(|sector| sector.capacity >= service_obligation)
                .map(|sector| sector.population)
                .sum();
            Dimensionless(covered / population)
        } else {
            Dimensionless(0.0)
        };

        Self {
            population,
            area,
            population_density,
            capacity,
            demand,
            coverage,
        }
    }
}
