//! Buses as listed in the catalogue.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{DomainError, Fare};

/// Opaque identifier of a bus in the data API.
///
/// The API hands out UUIDs, but nothing here depends on that; any
/// non-blank token is accepted.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BusId(String);

impl BusId {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DomainError::MissingField("bus id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BusId({})", self.0)
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BusId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<BusId> for String {
    fn from(id: BusId) -> Self {
        id.0
    }
}

/// Coach class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BusType {
    AcSleeper,
    NonAcSeater,
    AcSeater,
    /// Anything else the catalogue returns, kept verbatim.
    Other(String),
}

impl BusType {
    /// The classes offered as search filters.
    pub const FILTERABLE: [BusType; 3] = [BusType::AcSleeper, BusType::NonAcSeater, BusType::AcSeater];

    /// Parse a catalogue label. Unknown labels become `Other`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "AC Sleeper" => BusType::AcSleeper,
            "Non-AC Seater" => BusType::NonAcSeater,
            "AC Seater" => BusType::AcSeater,
            other => BusType::Other(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BusType::AcSleeper => "AC Sleeper",
            BusType::NonAcSeater => "Non-AC Seater",
            BusType::AcSeater => "AC Seater",
            BusType::Other(label) => label,
        }
    }
}

impl fmt::Display for BusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A scheduled bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub id: BusId,
    pub bus_number: String,
    pub name: String,
    pub bus_type: BusType,
    pub source: String,
    pub destination: String,
    pub departure: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
    /// Fare per seat.
    pub fare: Fare,
    /// Seat count declared by the operator. The seat map does not use it.
    pub total_seats: u32,
}

impl Bus {
    /// Time on the road. Zero if the arrival is recorded before departure.
    pub fn duration(&self) -> Duration {
        let d = self.arrival - self.departure;
        if d < Duration::zero() { Duration::zero() } else { d }
    }

    /// Duration rendered as `12h 05m`.
    pub fn duration_display(&self) -> String {
        let d = self.duration();
        format!("{}h {:02}m", d.num_hours(), d.num_minutes() % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bus(dep_hour: u32, arr_hour: u32) -> Bus {
        Bus {
            id: BusId::parse("bus-1").unwrap(),
            bus_number: "KA-01-1234".into(),
            name: "Night Rider".into(),
            bus_type: BusType::AcSleeper,
            source: "Bangalore".into(),
            destination: "Chennai".into(),
            departure: Utc.with_ymd_and_hms(2024, 3, 15, dep_hour, 0, 0).unwrap(),
            arrival: Utc.with_ymd_and_hms(2024, 3, 15, arr_hour, 5, 0).unwrap(),
            fare: Fare::from_minor(50_000),
            total_seats: 36,
        }
    }

    #[test]
    fn bus_id_rejects_blank() {
        assert!(BusId::parse("").is_err());
        assert!(BusId::parse("   ").is_err());
        assert_eq!(BusId::parse(" abc ").unwrap().as_str(), "abc");
    }

    #[test]
    fn bus_type_labels() {
        assert_eq!(BusType::from_label("AC Sleeper"), BusType::AcSleeper);
        assert_eq!(BusType::from_label("Non-AC Seater"), BusType::NonAcSeater);
        assert_eq!(BusType::from_label("AC Seater"), BusType::AcSeater);
        assert_eq!(
            BusType::from_label("Volvo Multi-Axle"),
            BusType::Other("Volvo Multi-Axle".into())
        );
        assert_eq!(BusType::Other("Volvo".into()).to_string(), "Volvo");
    }

    #[test]
    fn duration() {
        let b = bus(8, 20);
        assert_eq!(b.duration().num_minutes(), 12 * 60 + 5);
        assert_eq!(b.duration_display(), "12h 05m");
    }

    #[test]
    fn negative_duration_clamps_to_zero() {
        let b = bus(20, 8);
        assert_eq!(b.duration(), Duration::zero());
    }
}
