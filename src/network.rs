//! The network manager owns the LADs and postcode sectors for a single year.
use crate::asset::Asset;
use crate::capacity::{CapacityTable, LookupMissing};
use crate::clutter::ClutterTable;
use crate::intervention::Intervention;
use crate::lad::{LAD, LADDescriptor, LADID, LADMap, LADMetrics};
use crate::postcode_sector::{
    PostcodeSector, PostcodeSectorData, PostcodeSectorID, SectorMetrics, SectorParameters,
};
use crate::units::{Area, MbpsPerKm2, Money};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

/// A map of [`PostcodeSector`]s, keyed by sector ID
pub type PostcodeSectorMap = IndexMap<PostcodeSectorID, PostcodeSector>;

/// Counts of input records dropped while building a network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputDiagnostics {
    /// Sectors whose LAD is not in the LAD list
    pub sectors_without_lad: usize,
    /// Sectors whose area is not positive
    pub sectors_without_area: usize,
    /// Assets whose sector is not in the network
    pub assets_without_sector: usize,
}

impl InputDiagnostics {
    /// Whether any records were dropped
    pub fn any_dropped(&self) -> bool {
        *self != Self::default()
    }
}

/// Results for a single LAD
#[derive(Debug, Clone, PartialEq)]
pub struct LADResult {
    /// The LAD's ID
    pub lad_id: LADID,
    /// The LAD's name
    pub lad_name: String,
    /// Spend on upgrades applied to the network in this LAD
    pub cost: Money,
    /// Aggregate demand, capacity and coverage
    pub metrics: LADMetrics,
}

/// The results of querying every LAD in a network
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NetworkResults {
    /// One entry per LAD, in input order
    pub lads: Vec<LADResult>,
    /// Sectors left out of the aggregates because their capacity could not be looked up
    pub skipped_sectors: Vec<(PostcodeSectorID, LookupMissing)>,
}

/// Owns the physical state of the network for one timestep
#[derive(Debug)]
pub struct NetworkManager {
    lads: LADMap,
    postcode_sectors: PostcodeSectorMap,
    service_obligation: MbpsPerKm2,
    costs: HashMap<LADID, Money>,
    diagnostics: InputDiagnostics,
}

impl NetworkManager {
    /// Build the network from input records.
    ///
    /// Records which cannot be placed are dropped and counted in [`InputDiagnostics`] rather than
    /// causing an error: a sector whose LAD is unknown or whose area is not positive, and an
    /// asset whose sector is not in the network.
    ///
    /// # Arguments
    ///
    /// * `lads` - The LADs
    /// * `sectors` - The postcode sectors, with population and throughput for this year
    /// * `assets` - All assets in service this year
    /// * `capacity_table` - Capacity curves, shared by every sector
    /// * `clutter_table` - Clutter breakpoints
    /// * `parameters` - Demand and mast parameters, shared by every sector
    /// * `service_obligation` - The capacity every sector should reach
    pub fn new<L, S, A>(
        lads: L,
        sectors: S,
        assets: A,
        capacity_table: &Rc<CapacityTable>,
        clutter_table: &ClutterTable,
        parameters: &Rc<SectorParameters>,
        service_obligation: MbpsPerKm2,
    ) -> Self
    where
        L: IntoIterator<Item = LADDescriptor>,
        S: IntoIterator<Item = PostcodeSectorData>,
        A: IntoIterator<Item = Asset>,
    {
        let mut lads: LADMap = lads
            .into_iter()
            .map(|lad| (lad.id.clone(), LAD::from(lad)))
            .collect();

        let mut assets_by_sector: HashMap<PostcodeSectorID, Vec<Asset>> = HashMap::new();
        for asset in assets {
            assets_by_sector
                .entry(asset.pcd_sector_id.clone())
                .or_default()
                .push(asset);
        }

        let mut diagnostics = InputDiagnostics::default();
        let mut postcode_sectors = PostcodeSectorMap::new();
        for data in sectors {
            if !(data.area.is_finite() && data.area > Area(0.0)) {
                debug!("Dropping sector {} with area {}", data.id, data.area);
                diagnostics.sectors_without_area += 1;
                continue;
            }

            let Some(lad) = lads.get_mut(&data.lad_id) else {
                debug!("Dropping sector {} with unknown LAD {}", data.id, data.lad_id);
                diagnostics.sectors_without_lad += 1;
                continue;
            };

            lad.sector_ids.push(data.id.clone());
            let sector_assets = assets_by_sector.remove(&data.id).unwrap_or_default();
            let sector = PostcodeSector::new(
                data,
                sector_assets,
                Rc::clone(capacity_table),
                clutter_table,
                Rc::clone(parameters),
            );
            postcode_sectors.insert(sector.id.clone(), sector);
        }

        diagnostics.assets_without_sector = assets_by_sector.values().map(Vec::len).sum();

        Self {
            lads,
            postcode_sectors,
            service_obligation,
            costs: HashMap::new(),
            diagnostics,
        }
    }

    /// The LADs in the network
    pub fn lads(&self) -> &LADMap {
        &self.lads
    }

    /// The postcode sectors in the network
    pub fn postcode_sectors(&self) -> &PostcodeSectorMap {
        &self.postcode_sectors
    }

    /// The capacity every sector should reach
    pub fn service_obligation(&self) -> MbpsPerKm2 {
        self.service_obligation
    }

    /// Counts of records dropped during construction
    pub fn diagnostics(&self) -> InputDiagnostics {
        self.diagnostics
    }

    /// Add the assets of each intervention to its sector.
    ///
    /// Every intervention is checked before any is applied, so on error the network is
    /// unchanged.
    pub fn upgrade(&mut self, interventions: &[Intervention]) -> Result<()> {
        for intervention in interventions {
            ensure!(
                self.postcode_sectors.contains_key(&intervention.pcd_sector_id),
                "Intervention targets unknown sector {}",
                intervention.pcd_sector_id
            );
            for asset in &intervention.assets {
                ensure!(
                    asset.pcd_sector_id == intervention.pcd_sector_id,
                    "Intervention {} in sector {} has an asset for sector {}",
                    intervention.item,
                    intervention.pcd_sector_id,
                    asset.pcd_sector_id
                );
            }
        }

        for intervention in interventions {
            let sector = self
                .postcode_sectors
                .get_mut(&intervention.pcd_sector_id)
                .with_context(|| {
                    format!(
                        "Intervention targets unknown sector {}",
                        intervention.pcd_sector_id
                    )
                })?;

            for asset in &intervention.assets {
                sector.add_asset(asset.clone());
            }

            *self.costs.entry(sector.lad_id.clone()).or_default() += intervention.cost;
        }

        Ok(())
    }

    /// Metrics for every sector, in input order
    pub fn sector_metrics(
        &self,
    ) -> impl Iterator<Item = (&PostcodeSector, Result<SectorMetrics, LookupMissing>)> {
        self.postcode_sectors
            .values()
            .map(|sector| (sector, sector.metrics()))
    }

    /// Aggregate demand, capacity, coverage and cost for each LAD.
    ///
    /// Sectors whose capacity cannot be looked up are left out of the aggregates and reported
    /// separately.
    pub fn results(&self) -> NetworkResults {
        let mut results = NetworkResults::default();
        for lad in self.lads.values() {
            let mut sector_metrics = Vec::with_capacity(lad.sector_ids.len());
            for sector_id in &lad.sector_ids {
                match self.postcode_sectors[sector_id].metrics() {
                    Ok(metrics) => sector_metrics.push(metrics),
                    Err(err) => results.skipped_sectors.push((sector_id.clone(), err)),
                }
            }

            results.lads.push(LADResult {
                lad_id: lad.id.clone(),
                lad_name: lad.name.clone(),
                cost: self.costs.get(&lad.id).copied().unwrap_or_default(),
                metrics: LADMetrics::from_sectors(&sector_metrics, self.service_obligation),
            });
        }

        results
    }
}
