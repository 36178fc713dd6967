//! Checkout: turning a seat map handoff into a stored booking.
//!
//! The handoff arrives as query parameters, so nothing in it is trusted. The
//! bus is looked up again, the total is recomputed from its fare, and the
//! requested seats are checked against a fresh reservation set right before
//! the booking is written.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{
    Booking, Bus, BusId, DomainError, Fare, InvalidSeatId, SeatId, SeatLayout,
    parse_optional_travel_date,
};
use crate::seatmap::fetch_reservations;
use crate::store::{BookingStore, CachedStore, NewBooking, StoreError};

/// Errors from preparing or submitting a checkout.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("invalid bus id: {0}")]
    InvalidBus(DomainError),

    #[error("select at least one seat")]
    NoSeats,

    #[error("{0}")]
    InvalidSeat(#[from] InvalidSeatId),

    #[error("seat {0} is not on this bus")]
    SeatOutsideLayout(SeatId),

    #[error("invalid travel date: {0}")]
    InvalidDate(DomainError),

    #[error("a travel date is required to book")]
    MissingDate,

    #[error("a valid email address is required")]
    InvalidEmail,

    #[error("a phone number is required")]
    MissingPhone,

    #[error("bus {0} not found")]
    BusNotFound(BusId),

    #[error("seats already booked: {}", seat_list(.0))]
    SeatsTaken(Vec<SeatId>),

    #[error("booking rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Store(StoreError),
}

fn seat_list(seats: &[SeatId]) -> String {
    seats
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<StoreError> for CheckoutError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(message) => CheckoutError::Rejected(message),
            other => CheckoutError::Store(other),
        }
    }
}

/// A checkout as handed off by the seat map.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub bus_id: BusId,
    /// Deduplicated, row-major.
    pub seats: Vec<SeatId>,
    pub travel_date: Option<NaiveDate>,
    /// Total shown on the seat map. Display only.
    pub quoted_total: Option<Fare>,
}

impl CheckoutRequest {
    /// Validate raw handoff values. `seats` is comma-separated.
    pub fn from_params(
        bus_id: Option<&str>,
        seats: Option<&str>,
        date: Option<&str>,
        total: Option<&str>,
    ) -> Result<Self, CheckoutError> {
        let bus_id = BusId::parse(bus_id.unwrap_or_default()).map_err(CheckoutError::InvalidBus)?;
        let seats = parse_seats(seats.unwrap_or_default(), &SeatLayout::default())?;
        let travel_date = parse_optional_travel_date(date).map_err(CheckoutError::InvalidDate)?;
        let quoted_total = total
            .and_then(|t| t.trim().parse::<f64>().ok())
            .and_then(|t| Fare::from_major(t).ok());

        Ok(Self {
            bus_id,
            seats,
            travel_date,
            quoted_total,
        })
    }
}

/// Parse a comma-separated seat list into a sorted, deduplicated list.
pub fn parse_seats(raw: &str, layout: &SeatLayout) -> Result<Vec<SeatId>, CheckoutError> {
    let mut seats = BTreeSet::new();
    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let seat = SeatId::parse_normalized(token)?;
        if !layout.contains(&seat) {
            return Err(CheckoutError::SeatOutsideLayout(seat));
        }
        seats.insert(seat);
    }
    if seats.is_empty() {
        return Err(CheckoutError::NoSeats);
    }
    Ok(seats.into_iter().collect())
}

/// Contact details collected on the checkout form.
///
/// Validated but not stored; bookings are guest bookings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub email: String,
    pub phone: String,
}

impl Contact {
    pub fn parse(email: &str, phone: &str) -> Result<Self, CheckoutError> {
        let email = email.trim();
        let phone = phone.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(CheckoutError::InvalidEmail);
        }
        if phone.is_empty() {
            return Err(CheckoutError::MissingPhone);
        }
        Ok(Self {
            email: email.to_string(),
            phone: phone.to_string(),
        })
    }
}

/// Price breakdown shown on the checkout page.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSummary {
    pub bus: Bus,
    pub seats: Vec<SeatId>,
    pub travel_date: Option<NaiveDate>,
    /// Seat count times fare.
    pub base_fare: Fare,
    pub taxes: Fare,
    pub total: Fare,
}

impl CheckoutSummary {
    fn new(bus: Bus, request: &CheckoutRequest) -> Self {
        let base_fare = bus.fare.times(request.seats.len());
        let taxes = Fare::ZERO;
        let total = Fare::from_minor(base_fare.minor().saturating_add(taxes.minor()));
        Self {
            bus,
            seats: request.seats.clone(),
            travel_date: request.travel_date,
            base_fare,
            taxes,
            total,
        }
    }
}

/// Look up the bus and price the request.
pub async fn prepare(
    store: &CachedStore,
    request: &CheckoutRequest,
) -> Result<CheckoutSummary, CheckoutError> {
    let bus = store
        .get_bus(&request.bus_id)
        .await?
        .ok_or_else(|| CheckoutError::BusNotFound(request.bus_id.clone()))?;

    let summary = CheckoutSummary::new(bus.as_ref().clone(), request);
    if let Some(quoted) = request.quoted_total.filter(|q| *q != summary.total) {
        debug!(%quoted, total = %summary.total, "handed-off total differs from recomputed total");
    }
    Ok(summary)
}

/// Seats in `requested` that are already reserved.
///
/// A failed reservation query returns no conflicts; the store still gets the
/// last word when the booking is written.
async fn taken_seats(
    store: &dyn BookingStore,
    bus_id: &BusId,
    date: NaiveDate,
    requested: &[SeatId],
) -> Vec<SeatId> {
    match fetch_reservations(store, bus_id, date, &SeatLayout::default()).await {
        Ok(reserved) => requested
            .iter()
            .filter(|s| reserved.contains(s))
            .copied()
            .collect(),
        Err(e) => {
            warn!(%bus_id, %date, error = %e, "could not re-check reservations, submitting anyway");
            Vec::new()
        }
    }
}

/// Re-check and store a booking.
///
/// Taking a [`Contact`] means the form has been validated; the details
/// themselves are not stored.
pub async fn submit(
    store: &CachedStore,
    request: &CheckoutRequest,
    _contact: &Contact,
) -> Result<Booking, CheckoutError> {
    let travel_date = request.travel_date.ok_or(CheckoutError::MissingDate)?;
    let summary = prepare(store, request).await?;

    let taken = taken_seats(store, &request.bus_id, travel_date, &request.seats).await;
    if !taken.is_empty() {
        info!(bus_id = %request.bus_id, seats = %seat_list(&taken), "checkout rejected, seats taken");
        return Err(CheckoutError::SeatsTaken(taken));
    }

    let new = NewBooking {
        bus_id: request.bus_id.clone(),
        seats: request.seats.clone(),
        travel_date,
        total: summary.total,
        user_id: None,
    };
    let booking = BookingStore::submit_booking(store, &new).await?;

    info!(
        booking_id = %booking.id,
        bus_id = %booking.bus_id,
        seats = %booking.seats_display(),
        total = %booking.total,
        "booking confirmed"
    );
    Ok(booking)
}
