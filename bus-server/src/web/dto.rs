//! Data transfer objects for web requests and responses.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkout::CheckoutSummary;
use crate::domain::{Booking, Bus, Fare, format_travel_date};
use crate::seatmap::{CheckoutHandoff, SeatMap, SeatMapView, Toggle};

/// Station autocomplete query.
#[derive(Debug, Deserialize)]
pub struct StationSearchRequest {
    #[serde(default)]
    pub q: String,
    pub limit: Option<usize>,
}

/// Station autocomplete results.
#[derive(Debug, Serialize)]
pub struct StationSearchResponse {
    pub stations: Vec<String>,
}

/// Bus search form values, as submitted.
///
/// Built from raw query pairs because the class filter arrives as one `type`
/// pair per ticked checkbox.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BusSearchParams {
    pub source: Option<String>,
    pub destination: Option<String>,
    /// Travel date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Comma-separated coach classes
    pub bus_type: Option<String>,
}

impl BusSearchParams {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut params = Self::default();
        let mut types: Vec<String> = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "source" => params.source = Some(value),
                "destination" => params.destination = Some(value),
                "date" => params.date = Some(value),
                "type" => types.push(value),
                _ => {}
            }
        }
        if !types.is_empty() {
            params.bus_type = Some(types.join(","));
        }
        params
    }
}

/// A bus in API responses.
#[derive(Debug, Serialize)]
pub struct BusResult {
    pub id: String,
    pub bus_number: String,
    pub name: String,
    #[serde(rename = "type")]
    pub bus_type: String,
    pub source: String,
    pub destination: String,
    /// RFC 3339
    pub departure_time: String,
    /// RFC 3339
    pub arrival_time: String,
    pub duration: String,
    pub price: Fare,
    pub total_seats: u32,
}

impl BusResult {
    pub fn from_bus(bus: &Bus) -> Self {
        Self {
            id: bus.id.to_string(),
            bus_number: bus.bus_number.clone(),
            name: bus.name.clone(),
            bus_type: bus.bus_type.label().to_string(),
            source: bus.source.clone(),
            destination: bus.destination.clone(),
            departure_time: bus.departure.to_rfc3339(),
            arrival_time: bus.arrival.to_rfc3339(),
            duration: bus.duration_display(),
            price: bus.fare,
            total_seats: bus.total_seats,
        }
    }
}

/// Bus search results.
#[derive(Debug, Serialize)]
pub struct BusSearchResponse {
    pub count: usize,
    pub buses: Vec<BusResult>,
}

/// Query for opening a seat map.
#[derive(Debug, Default, Deserialize)]
pub struct OpenSeatMapParams {
    pub date: Option<String>,
}

/// A seat map session.
#[derive(Debug, Serialize)]
pub struct SeatMapResponse {
    pub session: Uuid,
    pub bus_id: Option<String>,
    pub travel_date: Option<String>,
    #[serde(flatten)]
    pub view: SeatMapView,
}

impl SeatMapResponse {
    pub fn new(session: Uuid, map: &SeatMap) -> Self {
        Self {
            session,
            bus_id: map.bus_id().map(|id| id.to_string()),
            travel_date: map.travel_date().map(format_travel_date),
            view: SeatMapView::from_map(map),
        }
    }
}

/// Result of toggling a seat.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub outcome: Toggle,
    #[serde(flatten)]
    pub seat_map: SeatMapResponse,
}

/// Where to continue after leaving the seat map.
#[derive(Debug, Serialize)]
pub struct ProceedResponse {
    pub checkout_url: String,
    pub bus_id: String,
    pub seats: Vec<String>,
    pub total: Fare,
    pub travel_date: Option<String>,
}

impl ProceedResponse {
    pub fn new(checkout_url: String, handoff: &CheckoutHandoff) -> Self {
        Self {
            checkout_url,
            bus_id: handoff.bus_id.to_string(),
            seats: handoff.seats.iter().map(|s| s.to_string()).collect(),
            total: handoff.total,
            travel_date: handoff.travel_date.map(format_travel_date),
        }
    }
}

/// Checkout handoff query.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutParams {
    #[serde(rename = "busId")]
    pub bus_id: Option<String>,
    pub seats: Option<String>,
    pub total: Option<String>,
    pub date: Option<String>,
}

/// Checkout form submission.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(rename = "busId")]
    pub bus_id: Option<String>,
    pub seats: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Priced checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub bus: BusResult,
    pub seats: Vec<String>,
    pub travel_date: Option<String>,
    pub base_fare: Fare,
    pub taxes: Fare,
    pub total: Fare,
}

impl CheckoutResponse {
    pub fn from_summary(summary: &CheckoutSummary) -> Self {
        Self {
            bus: BusResult::from_bus(&summary.bus),
            seats: summary.seats.iter().map(|s| s.to_string()).collect(),
            travel_date: summary.travel_date.map(format_travel_date),
            base_fare: summary.base_fare,
            taxes: summary.taxes,
            total: summary.total,
        }
    }
}

/// A booking in API responses.
#[derive(Debug, Serialize)]
pub struct BookingResult {
    pub id: String,
    pub bus_id: String,
    pub seat_numbers: Vec<String>,
    pub booking_date: Option<String>,
    pub total_price: Fare,
    pub status: String,
    /// RFC 3339
    pub created_at: String,
    pub bus: Option<BusResult>,
}

impl BookingResult {
    pub fn from_booking(booking: &Booking) -> Self {
        Self {
            id: booking.id.clone(),
            bus_id: booking.bus_id.to_string(),
            seat_numbers: booking.seats.iter().map(|s| s.to_string()).collect(),
            booking_date: booking.travel_date.map(format_travel_date),
            total_price: booking.total,
            status: booking.status.label().to_string(),
            created_at: booking.created_at.to_rfc3339(),
            bus: booking.bus.as_ref().map(BusResult::from_bus),
        }
    }
}

/// Past bookings.
#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    pub bookings: Vec<BookingResult>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Format an optional travel date for display, `-` when absent.
pub fn display_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%a %d %b %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BookingStatus, BusType};
    use crate::store::fixtures;

    #[test]
    fn bus_result_fields() {
        let bus = fixtures::bus("bus-1", "Bangalore", "Chennai", 9, BusType::AcSleeper);
        let json = serde_json::to_value(BusResult::from_bus(&bus)).unwrap();

        assert_eq!(json["id"], "bus-1");
        assert_eq!(json["type"], "AC Sleeper");
        assert_eq!(json["price"], 500.0);
        assert_eq!(json["duration"], "1h 30m");
        assert_eq!(json["departure_time"], "2024-03-15T09:00:00+00:00");
    }

    #[test]
    fn booking_result_fields() {
        let mut booking = fixtures::booking("bk-1", "bus-1", &["C3", "C4"], BookingStatus::Confirmed);
        booking.bus = Some(fixtures::bus("bus-1", "Bangalore", "Chennai", 9, BusType::AcSleeper));

        let json = serde_json::to_value(BookingResult::from_booking(&booking)).unwrap();
        assert_eq!(json["seat_numbers"], serde_json::json!(["C3", "C4"]));
        assert_eq!(json["booking_date"], "2024-03-15");
        assert_eq!(json["total_price"], 1000.0);
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["bus"]["name"], "Express bus-1");
    }

    #[test]
    fn checkout_params_use_handoff_names() {
        let params: CheckoutParams =
            serde_urlencoded::from_str("busId=bus-1&seats=C3%2CC4&total=1000&date=2024-03-15")
                .unwrap();
        assert_eq!(params.bus_id.as_deref(), Some("bus-1"));
        assert_eq!(params.seats.as_deref(), Some("C3,C4"));
        assert_eq!(params.date.as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn search_params_collect_types() {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(
            "source=Pune&destination=Mumbai&type=AC+Seater&type=AC+Sleeper&page=2",
        )
        .unwrap();
        let params = BusSearchParams::from_pairs(pairs);
        assert_eq!(params.source.as_deref(), Some("Pune"));
        assert_eq!(params.bus_type.as_deref(), Some("AC Seater,AC Sleeper"));
        assert_eq!(params.date, None);
    }

    #[test]
    fn display_date_formats() {
        assert_eq!(display_date(Some(fixtures::date())), "Fri 15 Mar 2024");
        assert_eq!(display_date(None), "-");
    }
}
