//! Assets are the individual carriers deployed at cell sites.
//!
//! An asset is never modified once created: upgrades add new assets rather than changing existing
//! ones.
use crate::id::define_id_type;
use crate::postcode_sector::PostcodeSectorID;
use anyhow::{Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;
use std::fmt;
use std::rc::Rc;

define_id_type! {SiteID}

/// The bandwidth used by macrocell carriers when looking up capacity
pub const MACROCELL_BANDWIDTH: &str = "2x10MHz";

/// The bandwidth used by small cells when looking up capacity
pub const SMALL_CELL_BANDWIDTH: &str = "2x25MHz";

/// The number of sectors for an ordinary macrocell site
pub const DEFAULT_SECTORS: u32 = 3;

/// Mobile technology generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Technology {
    /// GSM
    #[serde(rename = "2G", alias = "GSM")]
    Gsm,
    /// UMTS
    #[serde(rename = "3G", alias = "UMTS")]
    Umts,
    /// LTE
    #[serde(rename = "4G", alias = "LTE")]
    Lte,
    /// New Radio
    #[serde(rename = "5G", alias = "NR")]
    Nr,
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gsm => "2G",
            Self::Umts => "3G",
            Self::Lte => "4G",
            Self::Nr => "5G",
        };
        write!(f, "{s}")
    }
}

/// A supported spectrum band, in MHz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
pub enum Frequency {
    /// 700 MHz
    #[serde(rename = "700")]
    Mhz700,
    /// 800 MHz
    #[serde(rename = "800")]
    Mhz800,
    /// 1800 MHz
    #[serde(rename = "1800")]
    Mhz1800,
    /// 2100 MHz
    #[serde(rename = "2100")]
    Mhz2100,
    /// 2600 MHz
    #[serde(rename = "2600")]
    Mhz2600,
    /// 3500 MHz
    #[serde(rename = "3500")]
    Mhz3500,
    /// 3700 MHz
    #[serde(rename = "3700")]
    Mhz3700,
}

/// The bands which contribute to macrocell capacity, in the order they are summed
pub const MACROCELL_FREQUENCIES: [Frequency; 6] = [
    Frequency::Mhz700,
    Frequency::Mhz800,
    Frequency::Mhz1800,
    Frequency::Mhz2100,
    Frequency::Mhz2600,
    Frequency::Mhz3500,
];

impl Frequency {
    /// The centre frequency of the band in MHz
    pub fn mhz(self) -> u32 {
        match self {
            Self::Mhz700 => 700,
            Self::Mhz800 => 800,
            Self::Mhz1800 => 1800,
            Self::Mhz2100 => 2100,
            Self::Mhz2600 => 2600,
            Self::Mhz3500 => 3500,
            Self::Mhz3700 => 3700,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mhz())
    }
}

/// Channel bandwidth of a carrier (e.g. `2x10MHz`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Bandwidth(pub Rc<str>);

impl Default for Bandwidth {
    fn default() -> Self {
        MACROCELL_BANDWIDTH.into()
    }
}

impl From<&str> for Bandwidth {
    fn from(s: &str) -> Self {
        Bandwidth(Rc::from(s))
    }
}

impl fmt::Display for Bandwidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of equipment an asset represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, DeserializeLabeledStringEnum)]
pub enum AssetType {
    /// A carrier on an ordinary macrocell mast
    #[default]
    #[string = "macrocell_site"]
    MacrocellSite,
    /// A small cell
    #[string = "small_cell"]
    SmallCell,
    /// Marker recording that a site's mast has been raised
    #[string = "extended_height_macro"]
    ExtendedHeightMacro,
    /// A carrier on a macrocell connected to a cloud RAN hub
    #[string = "macro_c_ran"]
    MacroCRan,
}

/// One deployed carrier on one site at one frequency
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    /// The mast hosting the carrier. Several assets may share a site.
    pub site_id: SiteID,
    /// The postcode sector the site is in
    pub pcd_sector_id: PostcodeSectorID,
    /// Technology generation
    pub technology: Technology,
    /// Spectrum band
    pub frequency: Frequency,
    /// Channel bandwidth
    pub bandwidth: Bandwidth,
    /// Kind of equipment
    pub asset_type: AssetType,
    /// Number of sectors (1, 3 or 6)
    pub sectors: u32,
    /// Height of the mast in metres
    pub mast_height_m: u32,
    /// The year in which the asset comes into service
    pub build_year: u32,
}

/// Check that the number of sectors is one the model understands
pub fn check_sectors_valid(sectors: u32) -> Result<()> {
    ensure!(
        matches!(sectors, 1 | 3 | 6),
        "Number of sectors must be 1, 3 or 6 (got {sectors})"
    );

    Ok(())
}

impl Asset {
    /// Whether this asset is a macrocell carrier which counts towards band site density
    pub fn is_macrocell_carrier(&self) -> bool {
        matches!(
            self.asset_type,
            AssetType::MacrocellSite | AssetType::MacroCRan
        )
    }

    /// Whether this asset is a small cell
    pub fn is_small_cell(&self) -> bool {
        self.asset_type == AssetType::SmallCell
    }

    /// The number of sites this asset is worth when computing site density for its band.
    ///
    /// A six-sector carrier counts twice.
    pub fn band_site_count(&self) -> u32 {
        if self.sectors == 6 { 2 } else { 1 }
    }
}
