//! Caching layer for catalogue reads.
//!
//! Bus listings change rarely, so search results and single-bus lookups are
//! cached for a short TTL. Reservation queries and writes always go to the
//! underlying store: a cached reservation set would show seats as free long
//! after someone else booked them.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{Booking, Bus, BusId};

use super::BookingStore;
use super::error::StoreError;
use super::request::{BusQuery, NewBooking};

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per table.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Store wrapper that caches catalogue reads.
pub struct CachedStore {
    inner: Arc<dyn BookingStore>,
    searches: MokaCache<BusQuery, Arc<Vec<Bus>>>,
    buses: MokaCache<BusId, Arc<Bus>>,
}

impl CachedStore {
    /// Wrap a store.
    pub fn new(inner: Arc<dyn BookingStore>, config: &CacheConfig) -> Self {
        let searches = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let buses = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            inner,
            searches,
            buses,
        }
    }

    /// Search, using the cache if available.
    pub async fn search_buses(&self, query: &BusQuery) -> Result<Arc<Vec<Bus>>, StoreError> {
        if let Some(cached) = self.searches.get(query).await {
            debug!(?query, "bus search cache hit");
            return Ok(cached);
        }

        let buses = Arc::new(self.inner.search_buses(query).await?);
        join_all(
            buses
                .iter()
                .map(|bus| self.buses.insert(bus.id.clone(), Arc::new(bus.clone()))),
        )
        .await;
        self.searches.insert(query.clone(), buses.clone()).await;
        Ok(buses)
    }

    /// Single bus lookup, using the cache if available. Misses are not cached.
    pub async fn get_bus(&self, id: &BusId) -> Result<Option<Arc<Bus>>, StoreError> {
        if let Some(cached) = self.buses.get(id).await {
            return Ok(Some(cached));
        }

        match self.inner.get_bus(id).await? {
            Some(bus) => {
                let bus = Arc::new(bus);
                self.buses.insert(id.clone(), bus.clone()).await;
                Ok(Some(bus))
            }
            None => Ok(None),
        }
    }
}

impl BookingStore for CachedStore {
    fn search_buses<'a>(
        &'a self,
        query: &'a BusQuery,
    ) -> BoxFuture<'a, Result<Vec<Bus>, StoreError>> {
        async move {
            CachedStore::search_buses(self, query)
                .await
                .map(|buses| buses.as_ref().clone())
        }
        .boxed()
    }

    fn get_bus<'a>(&'a self, id: &'a BusId) -> BoxFuture<'a, Result<Option<Bus>, StoreError>> {
        async move {
            CachedStore::get_bus(self, id)
                .await
                .map(|bus| bus.map(|b| b.as_ref().clone()))
        }
        .boxed()
    }

    fn query_reserved_seats<'a>(
        &'a self,
        bus_id: &'a BusId,
        date: NaiveDate,
    ) -> BoxFuture<'a, Result<Vec<Vec<String>>, StoreError>> {
        self.inner.query_reserved_seats(bus_id, date)
    }

    fn submit_booking<'a>(
        &'a self,
        booking: &'a NewBooking,
    ) -> BoxFuture<'a, Result<Booking, StoreError>> {
        async move {
            let stored = self.inner.submit_booking(booking).await?;
            // Listings show seats left, so drop searches that include this bus
            self.searches.invalidate_all();
            Ok(stored)
        }
        .boxed()
    }

    fn list_bookings(&self) -> BoxFuture<'_, Result<Vec<Booking>, StoreError>> {
        self.inner.list_bookings()
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<(String, String)>, StoreError>> {
        self.inner.list_routes()
    }
}
