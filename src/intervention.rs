//! The catalogue of upgrades which can be built, with their costs and the assets they add.
use crate::asset::{
    Asset, AssetType, DEFAULT_SECTORS, Frequency, MACROCELL_BANDWIDTH, SMALL_CELL_BANDWIDTH,
    SiteID, Technology,
};
use crate::postcode_sector::PostcodeSectorID;
use crate::units::Money;
use anyhow::{Result, ensure};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// A kind of upgrade
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
pub enum UpgradeItem {
    /// Add LTE carriers at 800, 1800 and 2600 MHz to an existing macrocell site
    #[serde(rename = "carrier_800_1800_2600")]
    #[strum(serialize = "carrier_800_1800_2600")]
    Carrier800_1800_2600,
    /// Add a 700 MHz carrier to an LTE site
    #[serde(rename = "carrier_700")]
    #[strum(serialize = "carrier_700")]
    Carrier700,
    /// Add a 3500 MHz carrier to a 5G-ready site
    #[serde(rename = "carrier_3500")]
    #[strum(serialize = "carrier_3500")]
    Carrier3500,
    /// Sectorise a 5G site from three to six sectors
    #[serde(rename = "add_3_sectors")]
    #[strum(serialize = "add_3_sectors")]
    Add3Sectors,
    /// Build a new LTE macrocell site
    #[serde(rename = "build_4G_macro_site")]
    #[strum(serialize = "build_4G_macro_site")]
    Build4GMacroSite,
    /// Build a new 5G macrocell site
    #[serde(rename = "build_5G_macro_site")]
    #[strum(serialize = "build_5G_macro_site")]
    Build5GMacroSite,
    /// Raise the mast height of an existing site
    #[serde(rename = "raise_mast_height")]
    #[strum(serialize = "raise_mast_height")]
    RaiseMastHeight,
    /// Build a new 5G macrocell connected to a cloud RAN hub
    #[serde(rename = "macro_5G_c_ran")]
    #[strum(serialize = "macro_5G_c_ran")]
    Macro5GCRan,
    /// Deploy a single small cell
    #[serde(rename = "small_cell")]
    #[strum(serialize = "small_cell")]
    SmallCell,
}

/// Where the assets of an upgrade are placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// On an existing site which satisfies the upgrade's precondition
    ExistingSite,
    /// On a newly created site; the upgrade may be repeated to densify a sector
    NewSite,
}

/// Describes an asset an upgrade adds, apart from where and when it is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetTemplate {
    /// Technology generation
    pub technology: Technology,
    /// Spectrum band
    pub frequency: Frequency,
    /// Channel bandwidth
    pub bandwidth: &'static str,
    /// Kind of equipment
    pub asset_type: AssetType,
    /// Number of sectors
    pub sectors: u32,
    /// Whether the asset sits on a raised mast
    pub raised_mast: bool,
}

const fn macro_carrier(technology: Technology, frequency: Frequency) -> AssetTemplate {
    AssetTemplate {
        technology,
        frequency,
        bandwidth: MACROCELL_BANDWIDTH,
        asset_type: AssetType::MacrocellSite,
        sectors: DEFAULT_SECTORS,
        raised_mast: false,
    }
}

const LTE_CARRIERS: [AssetTemplate; 3] = [
    macro_carrier(Technology::Lte, Frequency::Mhz800),
    macro_carrier(Technology::Lte, Frequency::Mhz1800),
    macro_carrier(Technology::Lte, Frequency::Mhz2600),
];

const CARRIER_700: AssetTemplate = macro_carrier(Technology::Lte, Frequency::Mhz700);

const CARRIER_3500: AssetTemplate = macro_carrier(Technology::Nr, Frequency::Mhz3500);

const SECTORISED_CARRIERS: [AssetTemplate; 2] = [
    AssetTemplate {
        sectors: 6,
        ..macro_carrier(Technology::Nr, Frequency::Mhz700)
    },
    AssetTemplate {
        sectors: 6,
        ..CARRIER_3500
    },
];

const MACRO_5G_SITE: [AssetTemplate; 5] = [
    LTE_CARRIERS[0],
    LTE_CARRIERS[1],
    LTE_CARRIERS[2],
    CARRIER_700,
    CARRIER_3500,
];

const RAISED_MAST: [AssetTemplate; 1] = [AssetTemplate {
    asset_type: AssetType::ExtendedHeightMacro,
    raised_mast: true,
    ..macro_carrier(Technology::Lte, Frequency::Mhz800)
}];

const C_RAN_SITE: [AssetTemplate; 2] = [
    AssetTemplate {
        asset_type: AssetType::MacroCRan,
        ..macro_carrier(Technology::Nr, Frequency::Mhz700)
    },
    AssetTemplate {
        asset_type: AssetType::MacroCRan,
        ..CARRIER_3500
    },
];

const SMALL_CELL: [AssetTemplate; 1] = [AssetTemplate {
    technology: Technology::Nr,
    frequency: Frequency::Mhz3700,
    bandwidth: SMALL_CELL_BANDWIDTH,
    asset_type: AssetType::SmallCell,
    sectors: 1,
    raised_mast: false,
}];

impl UpgradeItem {
    /// A human-readable description of the upgrade
    pub fn description(self) -> &'static str {
        match self {
            Self::Carrier800_1800_2600 => "Add LTE carriers at 800, 1800 and 2600 MHz",
            Self::Carrier700 => "Add a 700 MHz carrier",
            Self::Carrier3500 => "Add a 3500 MHz carrier",
            Self::Add3Sectors => "Upgrade a 5G site from 3 to 6 sectors",
            Self::Build4GMacroSite => "Build a new 4G macrocell site",
            Self::Build5GMacroSite => "Build a new 5G macrocell site",
            Self::RaiseMastHeight => "Raise the mast height of a site",
            Self::Macro5GCRan => "Build a new 5G macrocell served by a cloud RAN hub",
            Self::SmallCell => "Deploy a small cell",
        }
    }

    /// The cost of one unit of this upgrade, in GBP, unless overridden
    pub fn default_cost(self) -> Money {
        let cost = match self {
            Self::Carrier800_1800_2600 => 142_446.0,
            Self::Carrier700 | Self::Carrier3500 => 50_917.0,
            Self::Add3Sectors => 50_000.0,
            Self::Build4GMacroSite | Self::Build5GMacroSite | Self::RaiseMastHeight => 150_000.0,
            Self::Macro5GCRan => 40_000.0,
            Self::SmallCell => 40_220.0,
        };

        Money(cost)
    }

    /// The assets one unit of this upgrade adds
    pub fn templates(self) -> &'static [AssetTemplate] {
        match self {
            Self::Carrier800_1800_2600 | Self::Build4GMacroSite => &LTE_CARRIERS,
            Self::Carrier700 => &[CARRIER_700],
            Self::Carrier3500 => &[CARRIER_3500],
            Self::Add3Sectors => &SECTORISED_CARRIERS,
            Self::Build5GMacroSite => &MACRO_5G_SITE,
            Self::RaiseMastHeight => &RAISED_MAST,
            Self::Macro5GCRan => &C_RAN_SITE,
            Self::SmallCell => &SMALL_CELL,
        }
    }

    /// Where this upgrade's assets are placed
    pub fn placement(self) -> Placement {
        match self {
            Self::Carrier800_1800_2600
            | Self::Carrier700
            | Self::Carrier3500
            | Self::Add3Sectors
            | Self::RaiseMastHeight => Placement::ExistingSite,
            Self::Build4GMacroSite
            | Self::Build5GMacroSite
            | Self::Macro5GCRan
            | Self::SmallCell => Placement::NewSite,
        }
    }

    /// Whether this upgrade needs spectrum or equipment which is only available from the
    /// spectrum release year onwards
    pub fn needs_spectrum_release(self) -> bool {
        matches!(
            self,
            Self::Carrier700
                | Self::Carrier3500
                | Self::Add3Sectors
                | Self::Build5GMacroSite
                | Self::Macro5GCRan
                | Self::SmallCell
        )
    }

    /// The technology recorded against interventions of this kind
    pub fn technology(self) -> Technology {
        self.templates()
            .last()
            .map_or(Technology::Lte, |template| template.technology)
    }
}

/// Mast heights used when realising asset templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MastHeights {
    /// Standard mast height in metres
    pub standard_m: u32,
    /// Raised mast height in metres
    pub raised_m: u32,
}

impl AssetTemplate {
    /// Create a concrete asset from this template
    pub fn realise(
        &self,
        site_id: &SiteID,
        pcd_sector_id: &PostcodeSectorID,
        build_year: u32,
        mast_heights: MastHeights,
    ) -> Asset {
        Asset {
            site_id: site_id.clone(),
            pcd_sector_id: pcd_sector_id.clone(),
            technology: self.technology,
            frequency: self.frequency,
            bandwidth: self.bandwidth.into(),
            asset_type: self.asset_type,
            sectors: self.sectors,
            mast_height_m: if self.raised_mast {
                mast_heights.raised_m
            } else {
                mast_heights.standard_m
            },
            build_year,
        }
    }
}

/// The unit costs of every upgrade
#[derive(Debug, Clone, PartialEq)]
pub struct InterventionCatalog {
    costs: IndexMap<UpgradeItem, Money>,
}

impl Default for InterventionCatalog {
    fn default() -> Self {
        Self {
            costs: UpgradeItem::iter()
                .map(|item| (item, item.default_cost()))
                .collect(),
        }
    }
}

impl InterventionCatalog {
    /// Create a catalogue with default costs, replacing those given in `overrides`
    pub fn with_costs<I>(overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (UpgradeItem, Money)>,
    {
        let mut catalog = Self::default();
        for (item, cost) in overrides {
            ensure!(
                cost.is_finite() && cost > Money(0.0),
                "Cost for {item} must be a finite number greater than zero"
            );
            catalog.costs.insert(item, cost);
        }

        Ok(catalog)
    }

    /// The unit cost of an upgrade
    pub fn cost(&self, item: UpgradeItem) -> Money {
        self.costs[&item]
    }
}

/// A single decision to build one unit of an upgrade
#[derive(Debug, Clone, PartialEq)]
pub struct Intervention {
    /// The kind of upgrade
    pub item: UpgradeItem,
    /// The sector in which it is built
    pub pcd_sector_id: PostcodeSectorID,
    /// The site on which it is built
    pub site_id: SiteID,
    /// The year in which it is built
    pub build_year: u32,
    /// What it cost
    pub cost: Money,
    /// The assets it adds
    pub assets: Vec<Asset>,
}

impl Intervention {
    /// Create an intervention by realising all of an upgrade's templates at a site
    pub fn new(
        item: UpgradeItem,
        pcd_sector_id: &PostcodeSectorID,
        site_id: &SiteID,
        build_year: u32,
        cost: Money,
        mast_heights: MastHeights,
    ) -> Self {
        let assets = item
            .templates()
            .iter()
            .map(|template| template.realise(site_id, pcd_sector_id, build_year, mast_heights))
            .collect();

        Self {
            item,
            pcd_sector_id: pcd_sector_id.clone(),
            site_id: site_id.clone(),
            build_year,
            cost,
            assets,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const MAST_HEIGHTS: MastHeights = MastHeights {
        standard_m: 30,
        raised_m: 40,
    };

    #[test]
    fn test_item_display() {
        assert_eq!(
            UpgradeItem::Carrier800_1800_2600.to_string(),
            "carrier_800_1800_2600"
        );
        assert_eq!(UpgradeItem::Build5GMacroSite.to_string(), "build_5G_macro_site");
        assert_eq!(UpgradeItem::Macro5GCRan.to_string(), "macro_5G_c_ran");
    }

    #[test]
    fn test_catalog_default_costs() {
        let catalog = InterventionCatalog::default();
        for item in UpgradeItem::iter() {
            assert_eq!(catalog.cost(item), item.default_cost());
            assert!(!item.templates().is_empty());
        }
        assert_eq!(
            catalog.cost(UpgradeItem::Carrier800_1800_2600),
            Money(142_446.0)
        );
    }

    #[rstest]
    #[case(1000.0, true)]
    #[case(0.0, false)]
    #[case(-5.0, false)]
    #[case(f64::INFINITY, false)]
    #[case(f64::NAN, false)]
    fn test_catalog_with_costs(#[case] cost: f64, #[case] expected_valid: bool) {
        let result = InterventionCatalog::with_costs([(UpgradeItem::SmallCell, Money(cost))]);
        assert_eq!(result.is_ok(), expected_valid);
        if expected_valid {
            let catalog = result.unwrap();
            assert_eq!(catalog.cost(UpgradeItem::SmallCell), Money(cost));
            assert_eq!(
                catalog.cost(UpgradeItem::Carrier700),
                UpgradeItem::Carrier700.default_cost()
            );
        }
    }

    #[test]
    fn test_intervention_new() {
        let intervention = Intervention::new(
            UpgradeItem::Carrier800_1800_2600,
            &"CB11".into(),
            &"s1".into(),
            2018,
            Money(142_446.0),
            MAST_HEIGHTS,
        );

        assert_eq!(intervention.assets.len(), 3);
        for asset in &intervention.assets {
            assert_eq!(asset.site_id, "s1".into());
            assert_eq!(asset.pcd_sector_id, "CB11".into());
            assert_eq!(asset.technology, Technology::Lte);
            assert_eq!(asset.build_year, 2018);
            assert_eq!(asset.mast_height_m, 30);
        }
        let frequencies: Vec<_> = intervention.assets.iter().map(|a| a.frequency).collect();
        assert_eq!(
            frequencies,
            [Frequency::Mhz800, Frequency::Mhz1800, Frequency::Mhz2600]
        );
    }

    #[test]
    fn test_raise_mast_height_template() {
        let intervention = Intervention::new(
            UpgradeItem::RaiseMastHeight,
            &"CB11".into(),
            &"s1".into(),
            2021,
            Money(1.0),
            MAST_HEIGHTS,
        );
        assert_eq!(intervention.assets.len(), 1);
        assert_eq!(
            intervention.assets[0].asset_type,
            AssetType::ExtendedHeightMacro
        );
        assert_eq!(intervention.assets[0].mast_height_m, 40);
    }

    #[test]
    fn test_small_cell_template() {
        let template = UpgradeItem::SmallCell.templates()[0];
        assert_eq!(template.asset_type, AssetType::SmallCell);
        assert_eq!(template.frequency, Frequency::Mhz3700);
        assert_eq!(template.bandwidth, "2x25MHz");
        assert_eq!(template.sectors, 1);
        assert_eq!(UpgradeItem::SmallCell.placement(), Placement::NewSite);
    }
}
