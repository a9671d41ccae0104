//! This module defines various unit types and their conversions.
#![allow(missing_docs)]
use serde::{Deserialize, Serialize};
use std::iter::Sum;

/// Number of megabits in a gigabyte, using the binary convention for the gigabyte
const MEGABITS_PER_GIGABYTE: f64 = 1024.0 * 8.0;

/// Days per month assumed when spreading monthly traffic
const DAYS_PER_MONTH: f64 = 30.0;

/// Seconds in an hour
const SECONDS_PER_HOUR: f64 = 3600.0;

macro_rules! unit_struct {
    ($name:ident) => {
        /// Represents a type of quantity.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            Serialize,
            Deserialize,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
            derive_more::SubAssign,
            derive_more::Display,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// Creates a new instance of the unit type from a f64 value.
            pub fn new(val: f64) -> Self {
                Self(val)
            }

            /// Returns the value of the unit type as a f64.
            pub fn value(self) -> f64 {
                self.0
            }

            /// Whether the underlying value is finite
            pub fn is_finite(self) -> bool {
                self.0.is_finite()
            }

            /// The larger of two quantities
            pub fn max(self, other: Self) -> Self {
                Self(self.0.max(other.0))
            }

            /// Total ordering, as for [`f64::total_cmp`]
            pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.0.total_cmp(&other.0)
            }
        }

        impl Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                Self(iter.map(|x| x.0).sum())
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::ops::Div<$name> for $name {
            type Output = Dimensionless;
            fn div(self, rhs: $name) -> Dimensionless {
                Dimensionless(self.0 / rhs.0)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::new(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::new(self.0 / rhs.0)
            }
        }
    };
}

/// Represents a dimensionless quantity (proportions, counts of people or sites).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Default,
    Serialize,
    Deserialize,
    derive_more::Add,
    derive_more::Sub,
    derive_more::AddAssign,
    derive_more::Display,
)]
pub struct Dimensionless(pub f64);

impl Dimensionless {
    pub fn new(val: f64) -> Self {
        Self(val)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }
}

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Sum for Dimensionless {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|x| x.0).sum())
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

// Base quantities
unit_struct!(Money);
unit_struct!(Area);
unit_struct!(Mbps);
unit_struct!(GigabytesPerMonth);

// Derived quantities
unit_struct!(MbpsPerKm2);
unit_struct!(PerKm2);

// Division rules
impl_div!(Mbps, Area, MbpsPerKm2);
impl_div!(Dimensionless, Area, PerKm2);

// Multiplication rules
impl_mul!(MbpsPerKm2, Area, Mbps);
impl_mul!(PerKm2, Area, Dimensionless);

impl GigabytesPerMonth {
    /// Convert monthly traffic into a busy-hour bit rate.
    ///
    /// `busy_hour_fraction` is the share of a day's traffic carried in the busiest hour.
    pub fn busy_hour_rate(self, busy_hour_fraction: Dimensionless) -> Mbps {
        let daily_megabits = self.0 * MEGABITS_PER_GIGABYTE / DAYS_PER_MONTH;
        Mbps(daily_megabits * busy_hour_fraction.0 / SECONDS_PER_HOUR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_busy_hour_rate() {
        let rate = GigabytesPerMonth(2.0).busy_hour_rate(Dimensionless(0.15));
        assert_approx_eq!(f64, rate.value(), 2.0 * 1024.0 * 8.0 * 0.15 / 30.0 / 3600.0);
    }

    #[test]
    fn test_density_arithmetic() {
        let density = Dimensionless(3.0) / Area(2.0);
        assert_eq!(density, PerKm2(1.5));
        assert_eq!(density * Area(4.0), Dimensionless(6.0));
        assert_eq!(Mbps(10.0) / Area(4.0), MbpsPerKm2(2.5));
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money(1.0), Money(2.5)].into_iter().sum();
        assert_eq!(total, Money(3.5));
    }
}
