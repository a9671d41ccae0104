//! Postcode sectors are the unit over which demand and capacity are estimated.
use crate::asset::{
    Asset, AssetType, Frequency, MACROCELL_BANDWIDTH, MACROCELL_FREQUENCIES, SMALL_CELL_BANDWIDTH,
    SiteID,
};
use crate::capacity::{CapacityKey, CapacityTable, LookupMissing};
use crate::clutter::{ClutterTable, Environment};
use crate::id::define_id_type;
use crate::lad::LADID;
use crate::units::{Area, Dimensionless, GigabytesPerMonth, MbpsPerKm2, PerKm2};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

define_id_type! {PostcodeSectorID}

/// Parameters which apply to every sector in a network
#[derive(Debug, Clone, PartialEq)]
pub struct SectorParameters {
    /// Proportion of the population with a mobile subscription
    pub penetration: Dimensionless,
    /// Proportion of subscribers using the modelled operator
    pub market_share: Dimensionless,
    /// Proportion of daily traffic carried in the busy hour
    pub busy_hour_fraction: Dimensionless,
    /// Standard mast height in metres
    pub mast_height_m: u32,
}

/// The attributes of a postcode sector which are read from input files and updated each year
#[derive(Debug, Clone, PartialEq)]
pub struct PostcodeSectorData {
    /// Unique identifier (e.g. "CB11")
    pub id: PostcodeSectorID,
    /// The local area district which contains this sector
    pub lad_id: LADID,
    /// Number of residents
    pub population: f64,
    /// Land area
    pub area: Area,
    /// Traffic generated by each user in a month
    pub user_throughput: GigabytesPerMonth,
}

/// A snapshot of a sector's demand and capacity, used for aggregation and output
#[derive(Debug, Clone, PartialEq)]
pub struct SectorMetrics {
    /// Number of residents
    pub population: f64,
    /// Land area
    pub area: Area,
    /// Busy-hour demand per km²
    pub demand: MbpsPerKm2,
    /// Capacity per km²
    pub capacity: MbpsPerKm2,
}

/// A postcode sector together with the assets deployed within it
#[derive(Debug, Clone)]
pub struct PostcodeSector {
    /// Unique identifier
    pub id: PostcodeSectorID,
    /// The local area district which contains this sector
    pub lad_id: LADID,
    /// Number of residents
    pub population: f64,
    /// Land area. Always positive.
    pub area: Area,
    /// Traffic generated by each user in a month
    pub user_throughput: GigabytesPerMonth,
    /// Clutter environment, derived from population density
    pub environment: Environment,
    assets: Vec<Asset>,
    capacity_table: Rc<CapacityTable>,
    parameters: Rc<SectorParameters>,
}

impl PostcodeSector {
    /// Create a new sector.
    ///
    /// The caller is responsible for checking that the area is positive and that every asset
    /// belongs to this sector.
    pub fn new(
        data: PostcodeSectorData,
        assets: Vec<Asset>,
        capacity_table: Rc<CapacityTable>,
        clutter_table: &ClutterTable,
        parameters: Rc<SectorParameters>,
    ) -> Self {
        let population_density = Dimensionless(data.population) / data.area;
        let environment = clutter_table.classify(population_density);

        Self {
            id: data.id,
            lad_id: data.lad_id,
            population: data.population,
            area: data.area,
            user_throughput: data.user_throughput,
            environment,
            assets,
            capacity_table,
            parameters,
        }
    }

    /// The assets deployed in this sector, in the order they were added
    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Add a new asset to the sector.
    ///
    /// The caller is responsible for checking that the asset belongs to this sector.
    pub fn add_asset(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    /// Residents per km²
    pub fn population_density(&self) -> PerKm2 {
        Dimensionless(self.population) / self.area
    }

    /// Busy-hour traffic demand per km²
    pub fn demand(&self) -> MbpsPerKm2 {
        let params = &self.parameters;
        let user_rate = self
            .user_throughput
            .busy_hour_rate(params.busy_hour_fraction);
        let users = Dimensionless(self.population) * params.penetration * params.market_share;

        (users * user_rate) / self.area
    }

    /// Capacity per km² delivered by the sector's current assets
    pub fn capacity(&self) -> Result<MbpsPerKm2, LookupMissing> {
        self.capacity_with(&[])
    }

    /// Capacity per km² the sector would have with some additional assets.
    ///
    /// Each site counts once in each band it carries, or twice once sectorised. A raised mast
    /// only affects the carriers on its own site. Where a band's sites stand at different
    /// heights, the curve for each height is weighted by its share of the band's sites.
    ///
    /// The sector itself is not modified.
    pub fn capacity_with(&self, extra_assets: &[Asset]) -> Result<MbpsPerKm2, LookupMissing> {
        let assets = || self.assets.iter().chain(extra_assets);
        let standard_height = self.parameters.mast_height_m;

        let mut site_heights: HashMap<&SiteID, u32> = HashMap::new();
        for marker in assets().filter(|asset| asset.asset_type == AssetType::ExtendedHeightMacro) {
            let height = site_heights
                .entry(&marker.site_id)
                .or_insert(standard_height);
            *height = (*height).max(marker.mast_height_m);
        }

        let mut capacity = MbpsPerKm2(0.0);
        for frequency in MACROCELL_FREQUENCIES {
            let mut band_sites: HashMap<&SiteID, u32> = HashMap::new();
            for asset in assets()
                .filter(|asset| asset.is_macrocell_carrier() && asset.frequency == frequency)
            {
                let count = band_sites.entry(&asset.site_id).or_default();
                *count = (*count).max(asset.band_site_count());
            }

            // Ordered so that the sum is reproducible
            let mut sites_by_height: BTreeMap<u32, u32> = BTreeMap::new();
            for (site_id, count) in band_sites {
                let height = site_heights
                    .get(site_id)
                    .copied()
                    .unwrap_or(standard_height);
                *sites_by_height.entry(height).or_default() += count;
            }

            capacity += self.band_capacity(frequency, &sites_by_height)?;
        }

        let num_small_cells = assets().filter(|asset| asset.is_small_cell()).count();
        let key = CapacityKey {
            environment: Environment::SmallCells,
            frequency: Frequency::Mhz3700,
            bandwidth: SMALL_CELL_BANDWIDTH.into(),
            mast_height_m: standard_height,
        };
        capacity += self.lookup(&key, u32::try_from(num_small_cells).unwrap_or(u32::MAX))?;

        Ok(capacity)
    }

    /// Macrocell capacity of one band, given the number of sites at each mast height
    fn band_capacity(
        &self,
        frequency: Frequency,
        sites_by_height: &BTreeMap<u32, u32>,
    ) -> Result<MbpsPerKm2, LookupMissing> {
        let num_sites: u32 = sites_by_height.values().sum();

        let mut capacity = MbpsPerKm2(0.0);
        for (&mast_height_m, &sites) in sites_by_height {
            let key = CapacityKey {
                environment: self.environment,
                frequency,
                bandwidth: MACROCELL_BANDWIDTH.into(),
                mast_height_m,
            };
            let share = Dimensionless(f64::from(sites) / f64::from(num_sites));
            capacity += share * self.lookup(&key, num_sites)?;
        }

        Ok(capacity)
    }

    /// Capacity minus demand. Negative values indicate an underserved sector.
    pub fn capacity_margin(&self) -> Result<MbpsPerKm2, LookupMissing> {
        Ok(self.capacity()? - self.demand())
    }

    /// Calculate demand and capacity for the sector's current assets
    pub fn metrics(&self) -> Result<SectorMetrics, LookupMissing> {
        Ok(SectorMetrics {
            population: self.population,
            area: self.area,
            demand: self.demand(),
            capacity: self.capacity()?,
        })
    }

    /// Look up the capacity for a number of sites. A band with no sites contributes nothing.
    fn lookup(&self, key: &CapacityKey, num_sites: u32) -> Result<MbpsPerKm2, LookupMissing> {
        if num_sites == 0 {
            return Ok(MbpsPerKm2(0.0));
        }

        let site_density = Dimensionless(num_sites as f64) / self.area;
        self.capacity_table.lookup(key, site_density)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Technology;
    use crate::fixture::{asset, capacity_table, clutter_table, sector_data, sector_parameters};
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn sector(
        sector_data: PostcodeSectorData,
        asset: Asset,
        capacity_table: CapacityTable,
        clutter_table: ClutterTable,
        sector_parameters: SectorParameters,
    ) -> PostcodeSector {
        PostcodeSector::new(
            sector_data,
            vec![asset],
            capacity_table.into(),
            &clutter_table,
            sector_parameters.into(),
        )
    }

    #[rstest]
    fn test_environment(sector: PostcodeSector) {
        // 500 people over 2 km²
        assert_eq!(sector.population_density(), PerKm2(250.0));
        assert_eq!(sector.environment, Environment::Urban);
    }

    #[rstest]
    fn test_demand(sector: PostcodeSector) {
        let user_rate = 2.0 * 1024.0 * 8.0 * 0.15 / 30.0 / 3600.0;
        let expected = 500.0 * 0.8 * 1.0 * user_rate / 2.0;
        assert_approx_eq!(f64, sector.demand().value(), expected);
    }

    #[rstest]
    fn test_capacity_single_site(sector: PostcodeSector) {
        // One 800 MHz site over 2 km² gives a density of 0.5, interpolated on (0,0)-(1,2)
        assert_approx_eq!(f64, sector.capacity().unwrap().value(), 1.0);
        assert_approx_eq!(
            f64,
            sector.capacity_margin().unwrap().value(),
            1.0 - sector.demand().value()
        );
    }

    #[rstest]
    fn test_capacity_no_assets(mut sector: PostcodeSector) {
        sector.assets.clear();
        assert_eq!(sector.capacity().unwrap(), MbpsPerKm2(0.0));
    }

    #[rstest]
    fn test_capacity_with_extra_assets(sector: PostcodeSector, asset: Asset) {
        let extra = [
            Asset {
                site_id: "s2".into(),
                ..asset.clone()
            },
            Asset {
                site_id: "s3".into(),
                ..asset
            },
        ];

        // Three sites over 2 km²: beyond the last breakpoint
        assert_approx_eq!(f64, sector.capacity_with(&extra).unwrap().value(), 2.0);

        // Sector itself unchanged
        assert_eq!(sector.assets().len(), 1);
        assert_approx_eq!(f64, sector.capacity().unwrap().value(), 1.0);
    }

    #[rstest]
    fn test_capacity_six_sectors_count_double(sector: PostcodeSector, asset: Asset) {
        let sectorised = Asset {
            site_id: "s2".into(),
            sectors: 6,
            ..asset
        };

        // One three-sector site plus one six-sector site: density 3 / 2 = 1.5
        assert_approx_eq!(f64, sector.capacity_with(&[sectorised]).unwrap().value(), 2.0);
    }

    #[rstest]
    fn test_capacity_small_cells(sector: PostcodeSector, asset: Asset) {
        let small_cell = Asset {
            site_id: "small1".into(),
            technology: Technology::Nr,
            frequency: Frequency::Mhz3700,
            bandwidth: SMALL_CELL_BANDWIDTH.into(),
            asset_type: AssetType::SmallCell,
            sectors: 1,
            ..asset
        };

        // Small cell curve: (0,0)-(1,10), density 0.5 -> 5
        assert_approx_eq!(
            f64,
            sector.capacity_with(&[small_cell]).unwrap().value(),
            1.0 + 5.0
        );
    }

    #[rstest]
    fn test_capacity_lookup_missing(sector: PostcodeSector, asset: Asset) {
        // No curves for 2600 MHz in the fixture table
        let carrier = Asset {
            frequency: Frequency::Mhz2600,
            ..asset
        };
        assert!(sector.capacity_with(&[carrier]).is_err());
    }

    #[rstest]
    fn test_capacity_raised_mast(sector: PostcodeSector, asset: Asset) {
        let marker = Asset {
            asset_type: AssetType::ExtendedHeightMacro,
            mast_height_m: 40,
            ..asset
        };

        // The fixture table has a steeper curve at 40 m: (0,0)-(1,4)
        assert_approx_eq!(f64, sector.capacity_with(&[marker]).unwrap().value(), 2.0);
    }

    /// A sector over 4 km², so that one site gives a density of 0.25
    fn large_sector(
        sector_data: PostcodeSectorData,
        assets: Vec<Asset>,
        capacity_table: CapacityTable,
        clutter_table: &ClutterTable,
        sector_parameters: SectorParameters,
    ) -> PostcodeSector {
        PostcodeSector::new(
            PostcodeSectorData {
                area: Area(4.0),
                ..sector_data
            },
            assets,
            capacity_table.into(),
            clutter_table,
            sector_parameters.into(),
        )
    }

    #[rstest]
    fn test_capacity_sectorised_site_counts_twice(
        sector_data: PostcodeSectorData,
        asset: Asset,
        capacity_table: CapacityTable,
        clutter_table: ClutterTable,
        sector_parameters: SectorParameters,
    ) {
        let sector = large_sector(
            sector_data,
            vec![asset.clone()],
            capacity_table,
            &clutter_table,
            sector_parameters,
        );
        assert_approx_eq!(f64, sector.capacity().unwrap().value(), 0.5);

        // The three-sector carrier stays, but the site now counts as two: density 0.5
        let sectorised = Asset {
            sectors: 6,
            ..asset.clone()
        };
        assert_approx_eq!(
            f64,
            sector.capacity_with(&[sectorised]).unwrap().value(),
            1.0
        );

        // A second carrier in the same band on the same site adds nothing
        assert_approx_eq!(f64, sector.capacity_with(&[asset]).unwrap().value(), 0.5);
    }

    #[rstest]
    fn test_capacity_raised_mast_applies_per_site(
        sector_data: PostcodeSectorData,
        asset: Asset,
        capacity_table: CapacityTable,
        clutter_table: ClutterTable,
        sector_parameters: SectorParameters,
    ) {
        let second_site = Asset {
            site_id: "s2".into(),
            ..asset.clone()
        };
        let sector = large_sector(
            sector_data,
            vec![asset.clone(), second_site.clone()],
            capacity_table,
            &clutter_table,
            sector_parameters,
        );
        let marker = |site: &Asset| Asset {
            asset_type: AssetType::ExtendedHeightMacro,
            mast_height_m: 40,
            ..site.clone()
        };

        // Two sites at density 0.5: 1 on the 30 m curve, 2 on the 40 m curve
        assert_approx_eq!(f64, sector.capacity().unwrap().value(), 1.0);
        assert_approx_eq!(
            f64,
            sector.capacity_with(&[marker(&asset)]).unwrap().value(),
            1.5
        );
        assert_approx_eq!(
            f64,
            sector
                .capacity_with(&[marker(&asset), marker(&second_site)])
                .unwrap()
                .value(),
            2.0
        );
    }
}
