//! Investment strategies, each an ordered sequence of upgrades.
use crate::intervention::UpgradeItem;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// A named investment strategy
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
pub enum StrategyTag {
    /// Build nothing
    #[serde(rename = "minimal")]
    #[strum(serialize = "minimal")]
    Minimal,
    /// Bring non-LTE sites up to LTE
    #[serde(rename = "upgrade-to-lte")]
    #[strum(serialize = "upgrade-to-lte")]
    UpgradeToLte,
    /// LTE upgrades plus 700 MHz carriers
    #[serde(rename = "macrocell-700")]
    #[strum(serialize = "macrocell-700")]
    Macrocell700,
    /// LTE upgrades plus 700 and 3500 MHz carriers
    #[serde(rename = "macrocell-700-3500")]
    #[strum(serialize = "macrocell-700-3500")]
    Macrocell700And3500,
    /// Spectrum upgrades followed by sectorisation of 5G sites
    #[serde(rename = "sectorisation")]
    #[strum(serialize = "sectorisation")]
    Sectorisation,
    /// Spectrum upgrades followed by new 5G macrocell sites
    #[serde(rename = "macro-densification")]
    #[strum(serialize = "macro-densification")]
    MacroDensification,
    /// Spectrum upgrades followed by raising mast heights
    #[serde(rename = "deregulation")]
    #[strum(serialize = "deregulation")]
    Deregulation,
    /// Spectrum upgrades followed by new cloud RAN macrocells
    #[serde(rename = "cloud-ran")]
    #[strum(serialize = "cloud-ran")]
    CloudRan,
    /// Densify with small cells
    #[serde(rename = "small-cell-and-spectrum")]
    #[strum(serialize = "small-cell-and-spectrum")]
    SmallCellAndSpectrum,
}

const SPECTRUM_UPGRADES: [UpgradeItem; 3] = [
    UpgradeItem::Carrier800_1800_2600,
    UpgradeItem::Carrier700,
    UpgradeItem::Carrier3500,
];

const fn with_spectrum_upgrades(last: UpgradeItem) -> [UpgradeItem; 4] {
    [
        SPECTRUM_UPGRADES[0],
        SPECTRUM_UPGRADES[1],
        SPECTRUM_UPGRADES[2],
        last,
    ]
}

const SECTORISATION: [UpgradeItem; 4] = with_spectrum_upgrades(UpgradeItem::Add3Sectors);
const MACRO_DENSIFICATION: [UpgradeItem; 4] =
    with_spectrum_upgrades(UpgradeItem::Build5GMacroSite);
const DEREGULATION: [UpgradeItem; 4] = with_spectrum_upgrades(UpgradeItem::RaiseMastHeight);
const CLOUD_RAN: [UpgradeItem; 4] = with_spectrum_upgrades(UpgradeItem::Macro5GCRan);

impl StrategyTag {
    /// The upgrades this strategy applies to each sector, in order
    pub fn items(self) -> &'static [UpgradeItem] {
        match self {
            Self::Minimal => &[],
            Self::UpgradeToLte => &[UpgradeItem::Carrier800_1800_2600],
            Self::Macrocell700 => &[UpgradeItem::Carrier800_1800_2600, UpgradeItem::Carrier700],
            Self::Macrocell700And3500 => &SPECTRUM_UPGRADES,
            Self::Sectorisation => &SECTORISATION,
            Self::MacroDensification => &MACRO_DENSIFICATION,
            Self::Deregulation => &DEREGULATION,
            Self::CloudRan => &CLOUD_RAN,
            Self::SmallCellAndSpectrum => &[UpgradeItem::SmallCell],
        }
    }
}
