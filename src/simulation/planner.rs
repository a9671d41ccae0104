//! Code for deciding which upgrades to build in a year.
use crate::asset::{Asset, AssetType, Frequency, SiteID, Technology};
use crate::intervention::{Intervention, InterventionCatalog, MastHeights, Placement, UpgradeItem};
use crate::network::NetworkManager;
use crate::postcode_sector::{PostcodeSector, PostcodeSectorID};
use crate::strategy::StrategyTag;
use crate::units::{MbpsPerKm2, Money};
use float_cmp::approx_eq;
use indexmap::IndexMap;
use log::debug;
use std::collections::HashSet;

/// A problem with a single sector which is reported but does not stop the run
#[derive(Debug, Clone, PartialEq)]
pub struct SectorWarning {
    /// The affected sector
    pub pcd_sector_id: PostcodeSectorID,
    /// What went wrong
    pub message: String,
}

/// Settings which apply to every planner call in a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerOptions {
    /// The year in which upgrades are built
    pub year: u32,
    /// The first year in which spectrum-dependent upgrades are available
    pub spectrum_release_year: u32,
    /// Mast heights for new assets
    pub mast_heights: MastHeights,
}

/// The upgrades chosen for a year
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    /// Interventions to build, in the order they were chosen
    pub interventions: Vec<Intervention>,
    /// Budget left over
    pub remaining_budget: Money,
    /// Sectors which could not be fully planned
    pub warnings: Vec<SectorWarning>,
}

/// Uniquely identifies an intervention over a whole plan
type InterventionKey = (SiteID, Technology, UpgradeItem);

/// How many new sites the planner looks ahead for a capacity gain in a sector with no capacity
const MAX_UNITS_WITHOUT_GAIN: usize = 20;

/// Choose the upgrades to build this year.
///
/// Sectors are visited in order of capacity margin, most underserved first. Where the network has
/// a service obligation, only sectors with capacity below it are considered. Each sector receives
/// the strategy's upgrades in order until it meets its target or the budget runs out. An upgrade
/// which costs more than the remaining budget ends planning for that sector.
///
/// The manager is not modified; apply the result with [`NetworkManager::upgrade`].
///
/// # Arguments
///
/// * `strategy` - The investment strategy
/// * `budget` - The money available this year
/// * `manager` - The current state of the network
/// * `catalog` - Upgrade costs
/// * `options` - Year and mast settings
pub fn decide(
    strategy: StrategyTag,
    budget: Money,
    manager: &NetworkManager,
    catalog: &InterventionCatalog,
    options: &PlannerOptions,
) -> Plan {
    let mut plan = Plan {
        interventions: Vec::new(),
        remaining_budget: budget,
        warnings: Vec::new(),
    };
    if strategy.items().is_empty() {
        return plan;
    }

    let service_obligation = manager.service_obligation();
    let mut built = HashSet::new();
    for sector in rank_sectors(manager, &mut plan.warnings) {
        if plan.remaining_budget <= Money(0.0) {
            debug!("Budget exhausted in {}", options.year);
            break;
        }

        let target = if service_obligation > MbpsPerKm2(0.0) {
            service_obligation
        } else {
            sector.demand()
        };
        let mut planner = SectorPlanner {
            sector,
            target,
            catalog,
            options,
            built: &mut built,
            remaining_budget: &mut plan.remaining_budget,
            interventions: Vec::new(),
        };
        if let Err(message) = planner.run(strategy.items()) {
            plan.warnings.push(SectorWarning {
                pcd_sector_id: sector.id.clone(),
                message,
            });
        }
        plan.interventions.extend(planner.interventions);
    }

    plan
}

/// Sectors in ascending order of capacity margin.
///
/// Sectors whose capacity cannot be calculated are left out and reported.
fn rank_sectors<'a>(
    manager: &'a NetworkManager,
    warnings: &mut Vec<SectorWarning>,
) -> Vec<&'a PostcodeSector> {
    let service_obligation = manager.service_obligation();
    let mut ranked = Vec::new();
    for sector in manager.postcode_sectors().values() {
        let capacity = match sector.capacity() {
            Ok(capacity) => capacity,
            Err(err) => {
                warnings.push(SectorWarning {
                    pcd_sector_id: sector.id.clone(),
                    message: format!("Not considered for upgrades: {err}"),
                });
                continue;
            }
        };

        if service_obligation > MbpsPerKm2(0.0) && capacity >= service_obligation {
            continue;
        }

        ranked.push((capacity - sector.demand(), sector));
    }

    // Stable, so ties keep input order
    ranked.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    ranked.into_iter().map(|(_, sector)| sector).collect()
}

/// Plans the upgrades for a single sector
struct SectorPlanner<'a> {
    sector: &'a PostcodeSector,
    target: MbpsPerKm2,
    catalog: &'a InterventionCatalog,
    options: &'a PlannerOptions,
    built: &'a mut HashSet<InterventionKey>,
    remaining_budget: &'a mut Money,
    interventions: Vec<Intervention>,
}

impl SectorPlanner<'_> {
    /// Apply items in order until the sector is satisfied or an item is unaffordable.
    ///
    /// Returns an error message if the sector's capacity cannot be calculated.
    fn run(&mut self, items: &[UpgradeItem]) -> Result<(), String> {
        for &item in items {
            if self.capacity()? >= self.target {
                return Ok(());
            }

            if item.needs_spectrum_release()
                && self.options.year < self.options.spectrum_release_year
            {
                continue;
            }

            let affordable = match item.placement() {
                Placement::ExistingSite => self.upgrade_sites(item),
                Placement::NewSite => self.densify(item)?,
            };
            if !affordable {
                break;
            }
        }

        Ok(())
    }

    /// Capacity with the interventions chosen so far
    fn capacity(&self) -> Result<MbpsPerKm2, String> {
        self.sector
            .capacity_with(&self.hypothetical_assets())
            .map_err(|err| format!("Planning stopped: {err}"))
    }

    fn hypothetical_assets(&self) -> Vec<Asset> {
        self.interventions
            .iter()
            .flat_map(|intervention| intervention.assets.iter().cloned())
            .collect()
    }

    /// Existing and planned assets grouped by site, in order of first appearance
    fn sites(&self) -> IndexMap<SiteID, Vec<Asset>> {
        let mut sites: IndexMap<SiteID, Vec<Asset>> = IndexMap::new();
        for asset in self
            .sector
            .assets()
            .iter()
            .cloned()
            .chain(self.hypothetical_assets())
        {
            sites.entry(asset.site_id.clone()).or_default().push(asset);
        }

        sites
    }

    /// Try to pay for one unit of `item` at `site_id`. Returns false if it is unaffordable.
    fn build(&mut self, item: UpgradeItem, site_id: SiteID) -> bool {
        let cost = self.catalog.cost(item);
        if cost > *self.remaining_budget {
            return false;
        }

        *self.remaining_budget -= cost;
        self.built
            .insert((site_id.clone(), item.technology(), item));
        self.interventions.push(Intervention::new(
            item,
            &self.sector.id,
            &site_id,
            self.options.year,
            cost,
            self.options.mast_heights,
        ));

        true
    }

    /// Apply `item` to every existing site which qualifies for it
    fn upgrade_sites(&mut self, item: UpgradeItem) -> bool {
        let candidates: Vec<_> = self
            .sites()
            .into_iter()
            .filter(|(_, assets)| site_qualifies(item, assets))
            .map(|(site_id, _)| site_id)
            .collect();

        for site_id in candidates {
            if self
                .built
                .contains(&(site_id.clone(), item.technology(), item))
            {
                continue;
            }
            if !self.build(item, site_id) {
                return false;
            }
        }

        true
    }

    /// Add new sites one at a time until the sector meets its target.
    ///
    /// Stops early once extra sites would no longer add capacity. A sector which already has
    /// capacity stops as soon as one more site adds nothing. A sector with none may need several
    /// sites to reach the first point of the capacity curve, so it looks up to
    /// [`MAX_UNITS_WITHOUT_GAIN`] sites ahead.
    fn densify(&mut self, item: UpgradeItem) -> Result<bool, String> {
        loop {
            let capacity = self.capacity()?;
            if capacity >= self.target {
                return Ok(true);
            }

            let lookahead = if capacity > MbpsPerKm2(0.0) {
                1
            } else {
                MAX_UNITS_WITHOUT_GAIN
            };
            if !self.gains_capacity(item, capacity, lookahead)? {
                debug!(
                    "Capacity of {} has reached its ceiling for {item}",
                    self.sector.id
                );
                return Ok(true);
            }

            let site_id = self.new_site_id(item);
            if !self.build(item, site_id) {
                return Ok(false);
            }
        }
    }

    /// Whether up to `max_units` more new sites of `item` would raise capacity above `capacity`
    fn gains_capacity(
        &self,
        item: UpgradeItem,
        capacity: MbpsPerKm2,
        max_units: usize,
    ) -> Result<bool, String> {
        let mut trial = self.hypothetical_assets();
        for site_id in self.new_site_ids(item).take(max_units) {
            trial.extend(item.templates().iter().map(|template| {
                template.realise(
                    &site_id,
                    &self.sector.id,
                    self.options.year,
                    self.options.mast_heights,
                )
            }));
            let trial_capacity = self
                .sector
                .capacity_with(&trial)
                .map_err(|err| format!("Planning stopped: {err}"))?;
            if trial_capacity > capacity
                && !approx_eq!(f64, trial_capacity.value(), capacity.value())
            {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Site IDs which are not used in this sector or elsewhere in the plan, in order
    fn new_site_ids(&self, item: UpgradeItem) -> impl Iterator<Item = SiteID> + '_ {
        let sites = self.sites();
        (1..)
            .map(move |n| SiteID::from(format!("{}_{item}_{n}", self.sector.id).as_str()))
            .filter(move |site_id| {
                !sites.contains_key(site_id)
                    && !self.built.contains(&(site_id.clone(), item.technology(), item))
            })
    }

    /// The first free site ID for a new site
    fn new_site_id(&self, item: UpgradeItem) -> SiteID {
        self.new_site_ids(item)
            .next()
            .unwrap_or_else(|| unreachable!("Site numbers are unbounded"))
    }
}

/// Whether an upgrade can be applied to an existing site with the given assets
fn site_qualifies(item: UpgradeItem, assets: &[Asset]) -> bool {
    // Sites hosting only small cells never receive macrocell upgrades
    if !assets.iter().any(Asset::is_macrocell_carrier) {
        return false;
    }

    let has_lte = assets
        .iter()
        .any(|asset| matches!(asset.technology, Technology::Lte | Technology::Nr));
    let has_band = |frequency: Frequency| {
        assets
            .iter()
            .any(|asset| asset.is_macrocell_carrier() && asset.frequency == frequency)
    };

    match item {
        UpgradeItem::Carrier800_1800_2600 => !has_lte,
        UpgradeItem::Carrier700 => has_lte && !has_band(Frequency::Mhz700),
        UpgradeItem::Carrier3500 => {
            has_lte && has_band(Frequency::Mhz700) && !has_band(Frequency::Mhz3500)
        }
        UpgradeItem::Add3Sectors => {
            has_band(Frequency::Mhz700)
                && has_band(Frequency::Mhz3500)
                && !assets.iter().any(|asset| asset.sectors == 6)
        }
        UpgradeItem::RaiseMastHeight => {
            has_lte
                && !assets
                    .iter()
                    .any(|asset| asset.asset_type == AssetType::ExtendedHeightMacro)
        }
        UpgradeItem::Build4GMacroSite
        | UpgradeItem::Build5GMacroSite
        | UpgradeItem::Macro5GCRan
        | UpgradeItem::SmallCell => false,
    }
}
