//! Client for the hosted booking data API.
//!
//! Buses, bookings and reservations all live in an external PostgREST-style
//! service. This module wraps it behind the [`BookingStore`] trait so the
//! rest of the server can run against the real API, a JSON-fixture mock, or
//! a cached wrapper of either.
//!
//! Key characteristics of the data API:
//! - Reservation state is derived from `bookings` rows with status
//!   `confirmed`; there is no separate seat table
//! - Nothing here locks seats. Two customers can pick the same seat; the
//!   store's insert-time constraints (if any) decide who wins

mod cache;
mod client;
mod convert;
mod error;
mod mock;
mod request;
mod types;

use chrono::NaiveDate;
use futures::future::BoxFuture;

use crate::domain::{Booking, Bus, BusId};

pub use cache::{CacheConfig, CachedStore};
pub use client::{RestStore, StoreConfig};
pub use convert::{ConversionError, convert_booking, convert_bus};
pub use error::StoreError;
pub use mock::MockStore;
#[cfg(test)]
pub(crate) use mock::fixtures;
pub use request::{BusQuery, NewBooking};
pub use types::{BookingRow, BusRow, NewBookingRow, RowId};

/// Read/write access to buses and bookings.
///
/// Returns boxed futures so the store can be shared as `Arc<dyn BookingStore>`.
pub trait BookingStore: Send + Sync {
    /// Buses matching a route (and optionally a travel date).
    fn search_buses<'a>(&'a self, query: &'a BusQuery)
    -> BoxFuture<'a, Result<Vec<Bus>, StoreError>>;

    /// A single bus, or `None` if no such id exists.
    fn get_bus<'a>(&'a self, id: &'a BusId) -> BoxFuture<'a, Result<Option<Bus>, StoreError>>;

    /// Seat lists of every confirmed booking for the bus on that date, one
    /// list per booking. Tokens are returned as stored.
    fn query_reserved_seats<'a>(
        &'a self,
        bus_id: &'a BusId,
        date: NaiveDate,
    ) -> BoxFuture<'a, Result<Vec<Vec<String>>, StoreError>>;

    /// Persist a confirmed booking and return the stored row.
    fn submit_booking<'a>(
        &'a self,
        booking: &'a NewBooking,
    ) -> BoxFuture<'a, Result<Booking, StoreError>>;

    /// All bookings with their buses, newest first.
    fn list_bookings(&self) -> BoxFuture<'_, Result<Vec<Booking>, StoreError>>;

    /// Every (source, destination) pair in the catalogue.
    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<(String, String)>, StoreError>>;
}
