//! In-memory store for development and tests.
//!
//! Loads buses and bookings from JSON fixture files and serves them as if they
//! were API responses. Writes are kept in memory only.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{NaiveDate, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::domain::{Booking, BookingStatus, Bus, BusId, SeatId};

use super::BookingStore;
use super::convert::{convert_bookings, convert_buses};
use super::error::StoreError;
use super::request::{BusQuery, NewBooking};
use super::types::{BookingRow, BusRow};

#[derive(Default)]
struct Tables {
    buses: Vec<Bus>,
    bookings: Vec<Booking>,
}

/// Mock store backed by in-memory tables.
///
/// Booking inserts are checked against confirmed bookings for the same bus
/// and date, the way a seat uniqueness constraint in the real database would
/// behave; a clash is reported as [`StoreError::Conflict`].
#[derive(Clone, Default)]
pub struct MockStore {
    tables: Arc<RwLock<Tables>>,
    fail_reservations: Arc<AtomicBool>,
}

impl MockStore {
    /// Create a store holding the given rows.
    pub fn new(buses: Vec<Bus>, bookings: Vec<Booking>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables { buses, bookings })),
            fail_reservations: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Load fixtures from a directory.
    ///
    /// Expects `buses.json` (an array of `buses` rows) and optionally
    /// `bookings.json` (an array of `bookings` rows).
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();

        let bus_rows: Vec<BusRow> = read_fixture(&data_dir.join("buses.json"))?;
        let buses = convert_buses(&bus_rows);
        if buses.is_empty() {
            return Err(StoreError::Fixture(format!(
                "no usable buses in {:?}",
                data_dir.join("buses.json")
            )));
        }

        let bookings_path = data_dir.join("bookings.json");
        let bookings = if bookings_path.is_file() {
            let rows: Vec<BookingRow> = read_fixture(&bookings_path)?;
            convert_bookings(&rows)
        } else {
            Vec::new()
        };

        Ok(Self::new(buses, bookings))
    }

    /// Make every reservation query fail until switched back.
    pub fn set_fail_reservations(&self, fail: bool) {
        self.fail_reservations.store(fail, Ordering::SeqCst);
    }

    /// Number of stored bookings.
    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }

    async fn search(&self, query: &BusQuery) -> Vec<Bus> {
        let source = query.source.trim().to_lowercase();
        let destination = query.destination.trim().to_lowercase();
        let tables = self.tables.read().await;

        let mut buses: Vec<Bus> = tables
            .buses
            .iter()
            .filter(|b| b.source.to_lowercase().contains(&source))
            .filter(|b| b.destination.to_lowercase().contains(&destination))
            .filter(|b| query.date.is_none_or(|d| b.departure.date_naive() == d))
            .cloned()
            .collect();
        buses.sort_by_key(|b| b.departure);
        buses
    }

    async fn reserved(&self, bus_id: &BusId, date: NaiveDate) -> Result<Vec<Vec<String>>, StoreError> {
        if self.fail_reservations.load(Ordering::SeqCst) {
            return Err(StoreError::Simulated("reservation query"));
        }
        let tables = self.tables.read().await;
        Ok(tables
            .bookings
            .iter()
            .filter(|b| &b.bus_id == bus_id && b.travel_date == Some(date))
            .filter(|b| b.status.holds_seats())
            .map(|b| b.seats.iter().map(SeatId::to_string).collect())
            .collect())
    }

    async fn insert(&self, new: &NewBooking) -> Result<Booking, StoreError> {
        let mut tables = self.tables.write().await;

        let bus = tables.buses.iter().find(|b| b.id == new.bus_id).cloned();
        if bus.is_none() {
            return Err(StoreError::Conflict(format!(
                "bus {} does not exist",
                new.bus_id
            )));
        }

        let taken: Vec<String> = tables
            .bookings
            .iter()
            .filter(|b| b.bus_id == new.bus_id && b.travel_date == Some(new.travel_date))
            .filter(|b| b.status.holds_seats())
            .flat_map(|b| b.seats.iter())
            .filter(|s| new.seats.contains(s))
            .map(SeatId::to_string)
            .collect();
        if !taken.is_empty() {
            return Err(StoreError::Conflict(format!(
                "seats already booked: {}",
                taken.join(", ")
            )));
        }

        let booking = Booking {
            id: uuid::Uuid::new_v4().to_string(),
            bus_id: new.bus_id.clone(),
            user_id: new.user_id.clone(),
            seats: new.seats.clone(),
            travel_date: Some(new.travel_date),
            total: new.total,
            status: BookingStatus::Confirmed,
            created_at: Utc::now(),
            bus,
        };
        tables.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn bookings_newest_first(&self) -> Vec<Booking> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<Booking> = tables
            .bookings
            .iter()
            .map(|b| {
                let mut b = b.clone();
                if b.bus.is_none() {
                    b.bus = tables.buses.iter().find(|bus| bus.id == b.bus_id).cloned();
                }
                b
            })
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        bookings
    }
}

fn read_fixture<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| StoreError::Fixture(format!("failed to read {:?}: {}", path, e)))?;
    serde_json::from_str(&json)
        .map_err(|e| StoreError::Fixture(format!("failed to parse {:?}: {}", path, e)))
}

impl BookingStore for MockStore {
    fn search_buses<'a>(
        &'a self,
        query: &'a BusQuery,
    ) -> BoxFuture<'a, Result<Vec<Bus>, StoreError>> {
        async move { Ok(self.search(query).await) }.boxed()
    }

    fn get_bus<'a>(&'a self, id: &'a BusId) -> BoxFuture<'a, Result<Option<Bus>, StoreError>> {
        async move {
            let tables = self.tables.read().await;
            Ok(tables.buses.iter().find(|b| &b.id == id).cloned())
        }
        .boxed()
    }

    fn query_reserved_seats<'a>(
        &'a self,
        bus_id: &'a BusId,
        date: NaiveDate,
    ) -> BoxFuture<'a, Result<Vec<Vec<String>>, StoreError>> {
        self.reserved(bus_id, date).boxed()
    }

    fn submit_booking<'a>(
        &'a self,
        booking: &'a NewBooking,
    ) -> BoxFuture<'a, Result<Booking, StoreError>> {
        self.insert(booking).boxed()
    }

    fn list_bookings(&self) -> BoxFuture<'_, Result<Vec<Booking>, StoreError>> {
        async move { Ok(self.bookings_newest_first().await) }.boxed()
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<(String, String)>, StoreError>> {
        async move {
            let tables = self.tables.read().await;
            Ok(tables
                .buses
                .iter()
                .map(|b| (b.source.clone(), b.destination.clone()))
                .collect())
        }
        .boxed()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Shared test data.

    use chrono::{DateTime, NaiveDate, TimeZone, Utc};

    use crate::domain::{Booking, BookingStatus, Bus, BusId, BusType, Fare, SeatId};

    pub fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    pub fn bus(id: &str, source: &str, destination: &str, hour: u32, bus_type: BusType) -> Bus {
        Bus {
            id: BusId::parse(id).unwrap(),
            bus_number: format!("KA-{id}"),
            name: format!("Express {id}"),
            bus_type,
            source: source.into(),
            destination: destination.into(),
            departure: Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0).unwrap(),
            arrival: Utc.with_ymd_and_hms(2024, 3, 15, hour + 1, 30, 0).unwrap(),
            fare: Fare::from_minor(50_000),
            total_seats: 40,
        }
    }

    pub fn booking(id: &str, bus_id: &str, seats: &[&str], status: BookingStatus) -> Booking {
        Booking {
            id: id.into(),
            bus_id: BusId::parse(bus_id).unwrap(),
            user_id: None,
            seats: seats.iter().map(|s| SeatId::parse(s).unwrap()).collect(),
            travel_date: Some(date()),
            total: Fare::from_minor(50_000).times(seats.len()),
            status,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            bus: None,
        }
    }

    /// Two buses Bangalore→Chennai, one Pune→Mumbai; A1 and B2 confirmed on bus-1.
    pub fn store() -> super::MockStore {
        super::MockStore::new(
            vec![
                bus("bus-2", "Bangalore", "Chennai", 18, BusType::NonAcSeater),
                bus("bus-1", "Bangalore", "Chennai", 9, BusType::AcSleeper),
                bus("bus-3", "Pune", "Mumbai", 7, BusType::AcSeater),
            ],
            vec![
                booking("bk-1", "bus-1", &["A1"], BookingStatus::Confirmed),
                booking("bk-2", "bus-1", &["B2"], BookingStatus::Confirmed),
                booking("bk-3", "bus-1", &["C1"], BookingStatus::Cancelled),
            ],
        )
    }
}
