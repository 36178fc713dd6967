//! Askama templates for the web frontend.

use askama::Template;
use chrono::{DateTime, NaiveDate, Utc};

use crate::checkout::CheckoutSummary;
use crate::domain::{Booking, Bus, BusType, format_travel_date};
use crate::seatmap::{SeatMap, SeatMapView};

use super::dto::display_date;

// ============================================================================
// Page Templates (extend base.html)
// ============================================================================

/// Home page with search form.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// Suggestions for the station inputs.
    pub stations: Vec<String>,
    /// Earliest selectable travel date.
    pub today: String,
}

/// Search results page.
#[derive(Template)]
#[template(path = "search_results.html")]
pub struct SearchResultsTemplate {
    pub source: String,
    pub destination: String,
    pub date: String,
    pub filters: Vec<TypeFilterView>,
    pub buses: Vec<BusView>,
    /// Shown instead of results when the form was incomplete.
    pub notice: Option<String>,
}

/// Seat map page.
#[derive(Template)]
#[template(path = "seat_map.html")]
pub struct SeatMapTemplate {
    pub session: String,
    pub bus: Option<BusView>,
    pub travel_date: String,
    pub map: SeatMapView,
}

/// Checkout page.
#[derive(Template)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub checkout: CheckoutView,
}

/// Past bookings page.
#[derive(Template)]
#[template(path = "bookings.html")]
pub struct BookingsTemplate {
    pub bookings: Vec<BookingView>,
}

/// Error page.
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub title: String,
    pub message: String,
}

// ============================================================================
// View Models (for templates)
// ============================================================================

/// One coach class checkbox on the results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFilterView {
    pub label: String,
    pub checked: bool,
}

impl TypeFilterView {
    /// A checkbox per filterable class, ticked if it is in `active`.
    pub fn all(active: &[BusType]) -> Vec<Self> {
        BusType::FILTERABLE
            .iter()
            .map(|t| Self {
                label: t.label().to_string(),
                checked: active.contains(t),
            })
            .collect()
    }
}

/// Bus view model for templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusView {
    pub id: String,
    pub bus_number: String,
    pub name: String,
    pub bus_type: String,
    pub source: String,
    pub destination: String,
    pub departure: String,
    pub arrival: String,
    pub duration: String,
    pub fare: String,
    pub total_seats: u32,
    /// `YYYY-MM-DD` of departure, used when opening the seat map.
    pub travel_date: String,
}

impl BusView {
    pub fn from_bus(bus: &Bus) -> Self {
        Self {
            id: bus.id.to_string(),
            bus_number: bus.bus_number.clone(),
            name: bus.name.clone(),
            bus_type: bus.bus_type.label().to_string(),
            source: bus.source.clone(),
            destination: bus.destination.clone(),
            departure: clock(bus.departure),
            arrival: clock(bus.arrival),
            duration: bus.duration_display(),
            fare: bus.fare.to_string(),
            total_seats: bus.total_seats,
            travel_date: format_travel_date(bus.departure.date_naive()),
        }
    }
}

fn clock(t: DateTime<Utc>) -> String {
    t.format("%H:%M").to_string()
}

/// Checkout view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutView {
    pub bus: BusView,
    pub bus_id: String,
    /// Comma-joined, as posted back with the form.
    pub seats_param: String,
    pub seats: String,
    pub seat_count: usize,
    pub date_param: String,
    pub travel_date: String,
    pub base_fare: String,
    pub taxes: String,
    pub total: String,
    /// Bookings need a date; without one the form is disabled.
    pub can_submit: bool,
}

impl CheckoutView {
    pub fn from_summary(summary: &CheckoutSummary) -> Self {
        let seats: Vec<String> = summary.seats.iter().map(|s| s.to_string()).collect();
        Self {
            bus: BusView::from_bus(&summary.bus),
            bus_id: summary.bus.id.to_string(),
            seats_param: seats.join(","),
            seats: seats.join(", "),
            seat_count: seats.len(),
            date_param: summary
                .travel_date
                .map(format_travel_date)
                .unwrap_or_default(),
            travel_date: display_date(summary.travel_date),
            base_fare: summary.base_fare.to_string(),
            taxes: summary.taxes.to_string(),
            total: summary.total.to_string(),
            can_submit: summary.travel_date.is_some(),
        }
    }
}

/// Booking view model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingView {
    pub id: String,
    pub bus_name: String,
    pub bus_type: String,
    pub route: String,
    pub travel_date: String,
    pub seats: String,
    pub total: String,
    pub status: String,
    pub booked_at: String,
}

impl BookingView {
    pub fn from_booking(booking: &Booking) -> Self {
        let (bus_name, bus_type, route) = match &booking.bus {
            Some(bus) => (
                bus.name.clone(),
                bus.bus_type.label().to_string(),
                format!("{} → {}", bus.source, bus.destination),
            ),
            None => (booking.bus_id.to_string(), String::new(), String::new()),
        };
        Self {
            id: booking.id.clone(),
            bus_name,
            bus_type,
            route,
            travel_date: display_date(booking.travel_date),
            seats: booking.seats_display(),
            total: booking.total.to_string(),
            status: booking.status.label().to_string(),
            booked_at: booking.created_at.format("%d %b %Y %H:%M").to_string(),
        }
    }
}

impl SeatMapTemplate {
    pub fn new(session: String, bus: Option<&Bus>, map: &SeatMap) -> Self {
        Self {
            session,
            bus: bus.map(BusView::from_bus),
            travel_date: display_date(map.travel_date()),
            map: SeatMapView::from_map(map),
        }
    }
}

/// Today's date as `YYYY-MM-DD`.
pub fn today() -> String {
    format_travel_date(Utc::now().date_naive())
}

/// Date as sent back in form fields; blank when absent.
pub fn date_param(date: Option<NaiveDate>) -> String {
    date.map(format_travel_date).unwrap_or_default()
}
