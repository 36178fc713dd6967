//! Data API row DTOs.
//!
//! These types map directly to the JSON rows of the `buses` and `bookings`
//! tables. They use `Option` liberally because older rows omit columns.

use serde::{Deserialize, Serialize};

/// A primary or foreign key. The tables use UUIDs, but integer keys show up
/// in hand-seeded databases.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RowId {
    Text(String),
    Number(i64),
}

impl RowId {
    pub fn as_string(&self) -> String {
        match self {
            RowId::Text(s) => s.clone(),
            RowId::Number(n) => n.to_string(),
        }
    }
}

/// Row of the `buses` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BusRow {
    pub id: RowId,

    /// Registration plate.
    #[serde(default)]
    pub bus_number: Option<String>,

    pub name: String,

    /// Coach class label, e.g. "AC Sleeper".
    #[serde(rename = "type", default)]
    pub bus_type: Option<String>,

    pub source: String,

    pub destination: String,

    /// Departure timestamp (ISO 8601).
    pub departure_time: String,

    /// Arrival timestamp (ISO 8601).
    pub arrival_time: String,

    /// Fare per seat in rupees.
    pub price: f64,

    #[serde(default)]
    pub total_seats: Option<i64>,
}

/// Row of the `bookings` table, optionally with the joined bus.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BookingRow {
    pub id: RowId,

    pub bus_id: RowId,

    #[serde(default)]
    pub user_id: Option<String>,

    /// May be `null`.
    #[serde(default)]
    pub seat_numbers: Option<Vec<String>>,

    /// Travel date (`YYYY-MM-DD`).
    #[serde(default)]
    pub booking_date: Option<String>,

    pub total_price: f64,

    pub status: String,

    pub created_at: String,

    /// Present when selected with `buses(*)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buses: Option<BusRow>,
}

/// Projection used by the reservation query (`select=seat_numbers`).
#[derive(Debug, Clone, Deserialize)]
pub struct SeatNumbersRow {
    #[serde(default)]
    pub seat_numbers: Option<Vec<String>>,
}

/// Projection used for station suggestions (`select=source,destination`).
#[derive(Debug, Clone, Deserialize)]
pub struct RouteRow {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

/// Body of a booking insert.
#[derive(Debug, Clone, Serialize)]
pub struct NewBookingRow {
    pub bus_id: String,
    pub user_id: Option<String>,
    pub seat_numbers: Vec<String>,
    pub booking_date: String,
    pub total_price: f64,
    pub status: String,
}
