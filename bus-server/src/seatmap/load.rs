//! Reservation loading.
//!
//! The seat map asks the store once, when it opens, which seats are already
//! taken. A failed query does not block the customer: the map opens with every
//! seat free and the failure is logged. A seat shown as free that is in fact
//! taken is caught (or not) by the store when the booking is submitted.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{BusId, SeatId, SeatLayout};
use crate::store::{BookingStore, StoreError};

/// Error fetching the reservation set.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("reservation query failed: {0}")]
    Store(#[from] StoreError),
}

/// Seats already confirmed-booked for one bus on one date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationSet(BTreeSet<SeatId>);

impl ReservationSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Flatten per-booking seat lists into one set.
    ///
    /// Tokens that don't parse, or that name a seat outside the layout, cannot
    /// be rendered and are dropped.
    pub fn from_seat_lists(lists: &[Vec<String>], layout: &SeatLayout) -> Self {
        let mut seats = BTreeSet::new();
        for token in lists.iter().flatten() {
            match SeatId::parse_normalized(token) {
                Ok(seat) if layout.contains(&seat) => {
                    seats.insert(seat);
                }
                Ok(seat) => debug!(%seat, "reserved seat outside layout ignored"),
                Err(e) => debug!(error = %e, "unparseable reserved seat ignored"),
            }
        }
        Self(seats)
    }

    pub fn contains(&self, seat: &SeatId) -> bool {
        self.0.contains(seat)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeatId> {
        self.0.iter()
    }
}

impl FromIterator<SeatId> for ReservationSet {
    fn from_iter<I: IntoIterator<Item = SeatId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Where a seat map's reservation set came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationSource {
    /// The query succeeded; this many seats are reserved.
    Fetched { seats: usize },
    /// The query failed; every seat starts available.
    FailedOpen { reason: String },
    /// No bus id or no travel date, so nothing was queried.
    Skipped,
}

impl ReservationSource {
    /// Whether the map may be showing taken seats as free.
    pub fn is_degraded(&self) -> bool {
        !matches!(self, ReservationSource::Fetched { .. })
    }
}

/// A reservation set together with how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedReservations {
    pub reserved: ReservationSet,
    pub source: ReservationSource,
}

/// Query the store for the reservation set of a bus on a date.
pub async fn fetch_reservations(
    store: &dyn BookingStore,
    bus_id: &BusId,
    date: NaiveDate,
    layout: &SeatLayout,
) -> Result<ReservationSet, FetchError> {
    let lists = store.query_reserved_seats(bus_id, date).await?;
    debug!(%bus_id, %date, bookings = lists.len(), "reservation query returned");
    Ok(ReservationSet::from_seat_lists(&lists, layout))
}

/// Load reservations for a seat map, failing open.
///
/// Without both a bus id and a travel date the fetch is skipped. A failed
/// fetch yields the empty set and a warning.
pub async fn load_reservations(
    store: &dyn BookingStore,
    bus_id: Option<&BusId>,
    date: Option<NaiveDate>,
    layout: &SeatLayout,
) -> LoadedReservations {
    let (Some(bus_id), Some(date)) = (bus_id, date) else {
        debug!(?bus_id, ?date, "seat map opened without bus or date, skipping reservation fetch");
        return LoadedReservations {
            reserved: ReservationSet::empty(),
            source: ReservationSource::Skipped,
        };
    };

    match fetch_reservations(store, bus_id, date, layout).await {
        Ok(reserved) => LoadedReservations {
            source: ReservationSource::Fetched {
                seats: reserved.len(),
            },
            reserved,
        },
        Err(e) => {
            warn!(
                %bus_id,
                %date,
                error = %e,
                "reservation fetch failed, opening seat map with all seats available"
            );
            LoadedReservations {
                reserved: ReservationSet::empty(),
                source: ReservationSource::FailedOpen {
                    reason: e.to_string(),
                },
            }
        }
    }
}
