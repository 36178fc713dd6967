//! Typed requests to the data API.

use chrono::NaiveDate;

use crate::domain::{BusId, Fare, SeatId};

/// Bus search criteria.
///
/// Source and destination match as case-insensitive substrings. When a date
/// is given, only buses departing on that calendar day (UTC) match.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BusQuery {
    pub source: String,
    pub destination: String,
    pub date: Option<NaiveDate>,
}

impl BusQuery {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            date: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// A booking to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub bus_id: BusId,
    pub seats: Vec<SeatId>,
    pub travel_date: NaiveDate,
    pub total: Fare,
    /// Always `None` for guest checkout.
    pub user_id: Option<String>,
}
