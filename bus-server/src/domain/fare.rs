//! Money amounts.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::DomainError;

/// A non-negative money amount in minor units (paise).
///
/// The data API stores prices as plain decimal numbers in rupees; `Fare`
/// keeps them as integers so totals are exact.
///
/// # Examples
///
/// ```
/// use bus_server::domain::Fare;
///
/// let fare = Fare::from_major(500.0).unwrap();
/// assert_eq!(fare.times(2).to_string(), "₹1000");
/// assert_eq!(Fare::from_minor(50_050).to_string(), "₹500.50");
/// assert!(Fare::from_major(-1.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fare(u64);

impl Fare {
    pub const ZERO: Fare = Fare(0);

    /// Build from an amount in minor units.
    pub const fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    /// Build from a decimal amount in rupees, rounding to the nearest paisa.
    pub fn from_major(major: f64) -> Result<Self, DomainError> {
        if !major.is_finite() {
            return Err(DomainError::InvalidFare(format!("{major} is not a number")));
        }
        if major < 0.0 {
            return Err(DomainError::InvalidFare(format!("{major} is negative")));
        }
        let minor = (major * 100.0).round();
        if minor > u64::MAX as f64 {
            return Err(DomainError::InvalidFare(format!("{major} is too large")));
        }
        Ok(Self(minor as u64))
    }

    pub fn minor(&self) -> u64 {
        self.0
    }

    /// Amount in rupees, as sent to the data API.
    pub fn as_major(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// This fare multiplied by a seat count. Saturates instead of overflowing.
    pub fn times(&self, count: usize) -> Fare {
        Fare(self.0.saturating_mul(count as u64))
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rupees = self.0 / 100;
        let paise = self.0 % 100;
        if paise == 0 {
            write!(f, "₹{rupees}")
        } else {
            write!(f, "₹{rupees}.{paise:02}")
        }
    }
}

impl Serialize for Fare {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl<'de> Deserialize<'de> for Fare {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = f64::deserialize(deserializer)?;
        Fare::from_major(major).map_err(serde::de::Error::custom)
    }
}
