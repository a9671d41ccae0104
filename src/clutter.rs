//! Classification of postcode sectors into clutter environments by population density.
use crate::units::PerKm2;
use anyhow::{Result, ensure};
use itertools::Itertools;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};

/// Geotype which selects the capacity curve used for a sector
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum Environment {
    /// Dense city centres
    #[string = "Urban"]
    Urban,
    /// Towns and city outskirts
    #[string = "Suburban"]
    Suburban,
    /// Sparsely populated areas
    #[string = "Rural"]
    Rural,
    /// The curve used for small cell deployments, whatever the clutter
    #[string = "Small cells"]
    SmallCells,
}

/// Population density breakpoints, each the upper bound of an environment
#[derive(Debug, Clone, PartialEq)]
pub struct ClutterTable(Vec<(PerKm2, Environment)>);

impl ClutterTable {
    /// Create a new table from `(upper_pop_density, environment)` breakpoints in any order.
    ///
    /// The table must contain at least one breakpoint and the bounds must be unique.
    pub fn new<I>(breakpoints: I) -> Result<Self>
    where
        I: IntoIterator<Item = (PerKm2, Environment)>,
    {
        let breakpoints = breakpoints
            .into_iter()
            .sorted_by(|(a, _), (b, _)| a.total_cmp(b))
            .collect_vec();
        ensure!(!breakpoints.is_empty(), "Clutter table cannot be empty");
        ensure!(
            breakpoints.iter().all(|(bound, _)| bound.is_finite()),
            "Clutter table bounds must be finite"
        );
        ensure!(
            breakpoints
                .iter()
                .tuple_windows()
                .all(|((a, _), (b, _))| a < b),
            "Clutter table bounds must be unique"
        );

        Ok(Self(breakpoints))
    }

    /// Map a population density onto an environment.
    ///
    /// Returns the environment of the first breakpoint whose upper bound is at least
    /// `population_density`. A density equal to a bound therefore takes that bound's (denser)
    /// environment. Densities above the top bound take the highest environment.
    pub fn classify(&self, population_density: PerKm2) -> Environment {
        self.0
            .iter()
            .find(|(upper, _)| *upper >= population_density)
            .or_else(|| self.0.last())
            .map(|(_, environment)| *environment)
            .expect("Clutter table is never empty")
    }
}
