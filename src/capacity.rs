//! Lookup of area capacity from site density using curves produced by a propagation simulator.
use crate::asset::{Bandwidth, Frequency};
use crate::clutter::Environment;
use crate::units::{MbpsPerKm2, PerKm2};
use anyhow::{Result, ensure};
use itertools::Itertools;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;

/// Identifies a single capacity curve
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CapacityKey {
    /// Clutter environment
    pub environment: Environment,
    /// Spectrum band
    pub frequency: Frequency,
    /// Channel bandwidth
    pub bandwidth: Bandwidth,
    /// Mast height in metres
    pub mast_height_m: u32,
}

impl fmt::Display for CapacityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {} MHz, {}, {} m)",
            self.environment, self.frequency, self.bandwidth, self.mast_height_m
        )
    }
}

/// Indicates that the capacity table has no curve for the requested key
#[derive(Debug, Clone, PartialEq)]
pub struct LookupMissing {
    /// The key which was requested
    pub key: CapacityKey,
}

impl fmt::Display for LookupMissing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "No capacity curve for {}", self.key)
    }
}

/// This is needed so that LookupMissing can be treated like standard errors are.
impl Error for LookupMissing {}

/// A curve of `(site_density, capacity)` breakpoints, sorted by strictly increasing density
pub type CapacityCurve = Vec<(PerKm2, MbpsPerKm2)>;

/// Capacity curves keyed by environment, band, bandwidth and mast height
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapacityTable(HashMap<CapacityKey, CapacityCurve>);

impl CapacityTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a curve to the table.
    ///
    /// Breakpoints may be given in any order, but densities must be unique and the key must not
    /// already be present.
    pub fn insert_curve<I>(&mut self, key: CapacityKey, breakpoints: I) -> Result<()>
    where
        I: IntoIterator<Item = (PerKm2, MbpsPerKm2)>,
    {
        let curve = breakpoints
            .into_iter()
            .sorted_by(|(a, _), (b, _)| a.total_cmp(b))
            .collect_vec();

        ensure!(!curve.is_empty(), "Capacity curve for {key} is empty");
        ensure!(
            curve
                .iter()
                .all(|(density, capacity)| density.is_finite() && capacity.is_finite()),
            "Capacity curve for {key} contains non-finite values"
        );
        ensure!(
            curve.iter().tuple_windows().all(|((a, _), (b, _))| a < b),
            "Capacity curve for {key} has duplicate site densities"
        );
        ensure!(
            !self.0.contains_key(&key),
            "Capacity curve for {key} defined more than once"
        );

        self.0.insert(key, curve);

        Ok(())
    }

    /// Whether the table contains a curve for the given key
    pub fn contains_key(&self, key: &CapacityKey) -> bool {
        self.0.contains_key(key)
    }

    /// Look up the area capacity delivered at a given site density.
    ///
    /// Densities below the first breakpoint deliver no capacity; densities at or beyond the last
    /// breakpoint deliver the last breakpoint's capacity. In between, capacity is interpolated
    /// linearly.
    pub fn lookup(
        &self,
        key: &CapacityKey,
        site_density: PerKm2,
    ) -> Result<MbpsPerKm2, LookupMissing> {
        let curve = self
            .0
            .get(key)
            .ok_or_else(|| LookupMissing { key: key.clone() })?;

        Ok(lookup_curve(curve, site_density))
    }
}

/// Evaluate a curve at the given site density
fn lookup_curve(curve: &[(PerKm2, MbpsPerKm2)], site_density: PerKm2) -> MbpsPerKm2 {
    let (Some(&(first_density, _)), Some(&(last_density, last_capacity))) =
        (curve.first(), curve.last())
    else {
        return MbpsPerKm2(0.0);
    };

    if site_density < first_density {
        return MbpsPerKm2(0.0);
    }
    if site_density >= last_density {
        return last_capacity;
    }

    curve
        .iter()
        .tuple_windows()
        .find(|((x0, _), (x1, _))| *x0 <= site_density && site_density < *x1)
        .map_or(last_capacity, |(&(x0, y0), &(x1, y1))| {
            interpolate(x0, y0, x1, y1, site_density)
        })
}

/// Linear interpolation between `(x0, y0)` and `(x1, y1)`
fn interpolate(x0: PerKm2, y0: MbpsPerKm2, x1: PerKm2, y1: MbpsPerKm2, x: PerKm2) -> MbpsPerKm2 {
    let (x0, x1, x) = (x0.value(), x1.value(), x.value());
    MbpsPerKm2((y0.value() * (x1 - x) + y1.value() * (x - x0)) / (x1 - x0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::MACROCELL_BANDWIDTH;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn key() -> CapacityKey {
        CapacityKey {
            environment: Environment::Urban,
            frequency: Frequency::Mhz800,
            bandwidth: MACROCELL_BANDWIDTH.into(),
            mast_height_m: 30,
        }
    }

    #[fixture]
    fn table(key: CapacityKey) -> CapacityTable {
        let mut table = CapacityTable::new();
        table
            .insert_curve(
                key,
                [
                    (PerKm2(3.0), MbpsPerKm2(8.0)),
                    (PerKm2(0.0), MbpsPerKm2(0.0)),
                    (PerKm2(1.0), MbpsPerKm2(2.0)),
                ],
            )
            .unwrap();
        table
    }

    #[rstest]
    #[case(2.0, 5.0)] // interpolated between (1, 2) and (3, 8)
    #[case(0.0, 0.0)]
    #[case(0.5, 1.0)]
    #[case(1.0, 2.0)] // exact breakpoint
    #[case(3.0, 8.0)] // last breakpoint
    #[case(100.0, 8.0)] // beyond last breakpoint
    #[case(-1.0, 0.0)] // below first breakpoint
    fn test_lookup(
        table: CapacityTable,
        key: CapacityKey,
        #[case] density: f64,
        #[case] expected: f64,
    ) {
        assert_approx_eq!(
            f64,
            table.lookup(&key, PerKm2(density)).unwrap().value(),
            expected
        );
    }

    #[rstest]
    fn test_lookup_below_range(key: CapacityKey) {
        let mut table = CapacityTable::new();
        table
            .insert_curve(
                key.clone(),
                [(PerKm2(1.0), MbpsPerKm2(2.0)), (PerKm2(2.0), MbpsPerKm2(4.0))],
            )
            .unwrap();
        assert_eq!(table.lookup(&key, PerKm2(0.5)).unwrap(), MbpsPerKm2(0.0));
    }

    #[rstest]
    fn test_lookup_missing(table: CapacityTable, key: CapacityKey) {
        let missing = CapacityKey {
            mast_height_m: 40,
            ..key
        };
        let err = table.lookup(&missing, PerKm2(1.0)).unwrap_err();
        assert_eq!(err.key, missing);
        assert_eq!(
            err.to_string(),
            "No capacity curve for (Urban, 800 MHz, 2x10MHz, 40 m)"
        );
    }

    #[rstest]
    fn test_insert_curve_invalid(mut table: CapacityTable, key: CapacityKey) {
        // Duplicate key
        assert!(
            table
                .insert_curve(key.clone(), [(PerKm2(0.0), MbpsPerKm2(0.0))])
                .is_err()
        );

        // Duplicate densities
        let other = CapacityKey {
            frequency: Frequency::Mhz2600,
            ..key
        };
        assert!(
            table
                .insert_curve(
                    other.clone(),
                    [(PerKm2(1.0), MbpsPerKm2(0.0)), (PerKm2(1.0), MbpsPerKm2(2.0))]
                )
                .is_err()
        );

        // Empty
        assert!(table.insert_curve(other, []).is_err());
    }
}
