//! Booking records.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};

use super::{Bus, BusId, Fare, SeatId};

/// Lifecycle status of a booking row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BookingStatus {
    Confirmed,
    Pending,
    Cancelled,
    Other(String),
}

impl BookingStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "confirmed" => BookingStatus::Confirmed,
            "pending" => BookingStatus::Pending,
            "cancelled" | "canceled" => BookingStatus::Cancelled,
            _ => BookingStatus::Other(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Pending => "pending",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Other(label) => label,
        }
    }

    /// Only confirmed bookings hold seats.
    pub fn holds_seats(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored booking.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: String,
    pub bus_id: BusId,
    pub user_id: Option<String>,
    pub seats: Vec<SeatId>,
    /// Travel date. Rows written by older clients may lack it.
    pub travel_date: Option<NaiveDate>,
    pub total: Fare,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    /// The bus, when the query joined it.
    pub bus: Option<Bus>,
}

impl Booking {
    /// Seats as a display string, e.g. `C3, C4`.
    pub fn seats_display(&self) -> String {
        self.seats
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels() {
        assert_eq!(BookingStatus::from_label("confirmed"), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::from_label("CONFIRMED"), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::from_label("canceled"), BookingStatus::Cancelled);
        assert_eq!(
            BookingStatus::from_label("refunded"),
            BookingStatus::Other("refunded".into())
        );
        assert!(BookingStatus::Confirmed.holds_seats());
        assert!(!BookingStatus::Pending.holds_seats());
    }

    #[test]
    fn seats_display_joins() {
        let booking = Booking {
            id: "b1".into(),
            bus_id: BusId::parse("bus-1").unwrap(),
            user_id: None,
            seats: vec![SeatId::parse("C3").unwrap(), SeatId::parse("C4").unwrap()],
            travel_date: None,
            total: Fare::from_minor(100_000),
            status: BookingStatus::Confirmed,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            bus: None,
        };
        assert_eq!(booking.seats_display(), "C3, C4");
    }
}
