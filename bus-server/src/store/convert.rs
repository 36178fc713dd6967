//! Conversion from data API rows to domain types.

use tracing::warn;

use crate::domain::{
    Booking, BookingStatus, Bus, BusId, BusType, DomainError, Fare, SeatId, format_travel_date,
    parse_timestamp, parse_travel_date,
};

use super::request::NewBooking;
use super::types::{BookingRow, BusRow, NewBookingRow};

/// Error during row to domain conversion.
#[derive(Debug, Clone, thiserror::Error)]
#[error("row {id}: {source}")]
pub struct ConversionError {
    /// Primary key of the offending row
    pub id: String,
    pub source: DomainError,
}

fn invalid(id: String) -> impl FnOnce(DomainError) -> ConversionError {
    move |source| ConversionError { id, source }
}

/// Convert a `buses` row.
pub fn convert_bus(row: &BusRow) -> Result<Bus, ConversionError> {
    let id_str = row.id.as_string();
    let id = BusId::parse(&id_str).map_err(invalid(id_str.clone()))?;
    let departure = parse_timestamp(&row.departure_time).map_err(invalid(id_str.clone()))?;
    let arrival = parse_timestamp(&row.arrival_time).map_err(invalid(id_str.clone()))?;
    let fare = Fare::from_major(row.price).map_err(invalid(id_str))?;

    Ok(Bus {
        id,
        bus_number: row.bus_number.clone().unwrap_or_default(),
        name: row.name.clone(),
        bus_type: BusType::from_label(row.bus_type.as_deref().unwrap_or_default()),
        source: row.source.clone(),
        destination: row.destination.clone(),
        departure,
        arrival,
        fare,
        total_seats: row
            .total_seats
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or_default(),
    })
}

/// Convert a list of `buses` rows, skipping rows that fail validation.
pub fn convert_buses(rows: &[BusRow]) -> Vec<Bus> {
    rows.iter()
        .filter_map(|row| match convert_bus(row) {
            Ok(bus) => Some(bus),
            Err(e) => {
                warn!(error = %e, "skipping bus row");
                None
            }
        })
        .collect()
}

/// Convert a `bookings` row.
///
/// Seat tokens that don't parse are dropped with a warning; they cannot be
/// shown on the seat map anyway.
pub fn convert_booking(row: &BookingRow) -> Result<Booking, ConversionError> {
    let id = row.id.as_string();
    let bus_id = BusId::parse(&row.bus_id.as_string()).map_err(invalid(id.clone()))?;
    let travel_date = row
        .booking_date
        .as_deref()
        .map(parse_travel_date)
        .transpose()
        .map_err(invalid(id.clone()))?;
    let total = Fare::from_major(row.total_price).map_err(invalid(id.clone()))?;
    let created_at = parse_timestamp(&row.created_at).map_err(invalid(id.clone()))?;

    let seats = row
        .seat_numbers
        .iter()
        .flatten()
        .filter_map(|token| match SeatId::parse_normalized(token) {
            Ok(seat) => Some(seat),
            Err(e) => {
                warn!(booking = %id, error = %e, "dropping unparseable seat");
                None
            }
        })
        .collect();

    // A join that fails to convert shouldn't hide the booking itself
    let bus = row.buses.as_ref().and_then(|b| match convert_bus(b) {
        Ok(bus) => Some(bus),
        Err(e) => {
            warn!(booking = %id, error = %e, "ignoring joined bus");
            None
        }
    });

    Ok(Booking {
        id,
        bus_id,
        user_id: row.user_id.clone(),
        seats,
        travel_date,
        total,
        status: BookingStatus::from_label(&row.status),
        created_at,
        bus,
    })
}

/// Convert a list of `bookings` rows, skipping rows that fail validation.
pub fn convert_bookings(rows: &[BookingRow]) -> Vec<Booking> {
    rows.iter()
        .filter_map(|row| match convert_booking(row) {
            Ok(booking) => Some(booking),
            Err(e) => {
                warn!(error = %e, "skipping booking row");
                None
            }
        })
        .collect()
}

/// Build the insert body for a new booking.
pub fn new_booking_row(booking: &NewBooking) -> NewBookingRow {
    NewBookingRow {
        bus_id: booking.bus_id.as_str().to_string(),
        user_id: booking.user_id.clone(),
        seat_numbers: booking.seats.iter().map(|s| s.to_string()).collect(),
        booking_date: format_travel_date(booking.travel_date),
        total_price: booking.total.as_major(),
        status: BookingStatus::Confirmed.label().to_string(),
    }
}
