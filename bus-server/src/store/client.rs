//! PostgREST HTTP client.
//!
//! Provides async methods for querying the `buses` and `bookings` tables of
//! the hosted data API. Handles authentication, request concurrency, and
//! conversion to domain types.

use std::sync::Arc;

use chrono::NaiveDate;
use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use tokio::sync::{Semaphore, SemaphorePermit};
use tracing::debug;

use crate::domain::{Booking, BookingStatus, Bus, BusId, day_bounds, format_travel_date};

use super::BookingStore;
use super::convert::{convert_booking, convert_bookings, convert_buses, new_booking_row};
use super::error::StoreError;
use super::request::{BusQuery, NewBooking};
use super::types::{BookingRow, BusRow, RouteRow, SeatNumbersRow};

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 8;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// How much of an unparseable body to keep in errors.
const ERROR_BODY_CHARS: usize = 500;

/// Configuration for the data API client.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project API key, sent as both `apikey` and bearer token
    pub api_key: String,
    /// Project URL, e.g. `https://xyz.supabase.co`
    pub base_url: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl StoreConfig {
    /// Create a new config for the given project URL and API key.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// REST endpoint for a table.
    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

/// Data API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct RestStore {
    http: reqwest::Client,
    config: StoreConfig,
    semaphore: Arc<Semaphore>,
}

impl RestStore {
    /// Create a new client with the given configuration.
    pub fn new(config: StoreConfig) -> Result<Self, StoreError> {
        let invalid_key = || StoreError::Api {
            status: 0,
            message: "Invalid API key format".to_string(),
        };

        let mut headers = HeaderMap::new();
        let api_key = HeaderValue::from_str(&config.api_key).map_err(|_| invalid_key())?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|_| invalid_key())?;
        headers.insert(HeaderName::from_static("apikey"), api_key);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
        })
    }

    async fn permit(&self) -> Result<SemaphorePermit<'_>, StoreError> {
        self.semaphore.acquire().await.map_err(|_| StoreError::Api {
            status: 0,
            message: "Semaphore closed".to_string(),
        })
    }

    /// Run a GET against a table and decode the JSON array.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        params: &[(&str, String)],
    ) -> Result<T, StoreError> {
        let _permit = self.permit().await?;
        let url = self.config.table_url(table);
        debug!(%url, ?params, "data API select");

        let response = self.http.get(&url).query(params).send().await?;
        read_json(response).await
    }

    /// Bus search.
    pub async fn search_buses(&self, query: &BusQuery) -> Result<Vec<Bus>, StoreError> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("source", format!("ilike.*{}*", query.source.trim())),
            ("destination", format!("ilike.*{}*", query.destination.trim())),
            ("order", "departure_time.asc".to_string()),
        ];
        if let Some(date) = query.date {
            let (start, end) = day_bounds(date);
            params.push(("departure_time", format!("gte.{}", start.to_rfc3339())));
            params.push(("departure_time", format!("lte.{}", end.to_rfc3339())));
        }

        let rows: Vec<BusRow> = self.select("buses", &params).await?;
        Ok(convert_buses(&rows))
    }

    /// Single bus lookup.
    pub async fn get_bus(&self, id: &BusId) -> Result<Option<Bus>, StoreError> {
        let params = [
            ("select", "*".to_string()),
            ("id", format!("eq.{}", id.as_str())),
            ("limit", "1".to_string()),
        ];
        let rows: Vec<BusRow> = self.select("buses", &params).await?;
        match rows.first() {
            Some(row) => super::convert_bus(row)
                .map(Some)
                .map_err(|e| StoreError::Conversion(e.to_string())),
            None => Ok(None),
        }
    }

    /// Seat lists of confirmed bookings for a bus on a date.
    pub async fn query_reserved_seats(
        &self,
        bus_id: &BusId,
        date: NaiveDate,
    ) -> Result<Vec<Vec<String>>, StoreError> {
        let params = [
            ("select", "seat_numbers".to_string()),
            ("bus_id", format!("eq.{}", bus_id.as_str())),
            ("booking_date", format!("eq.{}", format_travel_date(date))),
            ("status", format!("eq.{}", BookingStatus::Confirmed.label())),
        ];
        let rows: Vec<SeatNumbersRow> = self.select("bookings", &params).await?;
        Ok(rows
            .into_iter()
            .map(|r| r.seat_numbers.unwrap_or_default())
            .collect())
    }

    /// Insert a booking.
    pub async fn submit_booking(&self, booking: &NewBooking) -> Result<Booking, StoreError> {
        let _permit = self.permit().await?;
        let url = self.config.table_url("bookings");
        let body = new_booking_row(booking);

        let response = self
            .http
            .post(&url)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;

        let rows: Vec<BookingRow> = read_json(response).await?;
        let row = rows.first().ok_or_else(|| StoreError::Api {
            status: 200,
            message: "insert returned no rows".to_string(),
        })?;
        convert_booking(row).map_err(|e| StoreError::Conversion(e.to_string()))
    }

    /// All bookings, newest first, with their buses.
    pub async fn list_bookings(&self) -> Result<Vec<Booking>, StoreError> {
        let params = [
            ("select", "*,buses(*)".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        let rows: Vec<BookingRow> = self.select("bookings", &params).await?;
        Ok(convert_bookings(&rows))
    }

    /// All (source, destination) pairs.
    pub async fn list_routes(&self) -> Result<Vec<(String, String)>, StoreError> {
        let params = [("select", "source,destination".to_string())];
        let rows: Vec<RouteRow> = self.select("buses", &params).await?;
        Ok(rows
            .into_iter()
            .map(|r| (r.source.unwrap_or_default(), r.destination.unwrap_or_default()))
            .collect())
    }
}

/// Map the response status to an error, or decode the body.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(StoreError::Unauthorized);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(StoreError::RateLimited);
    }

    if status == reqwest::StatusCode::CONFLICT {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Conflict(body));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| StoreError::Json {
        message: e.to_string(),
        body: Some(body.chars().take(ERROR_BODY_CHARS).collect()),
    })
}

impl BookingStore for RestStore {
    fn search_buses<'a>(
        &'a self,
        query: &'a BusQuery,
    ) -> BoxFuture<'a, Result<Vec<Bus>, StoreError>> {
        RestStore::search_buses(self, query).boxed()
    }

    fn get_bus<'a>(&'a self, id: &'a BusId) -> BoxFuture<'a, Result<Option<Bus>, StoreError>> {
        RestStore::get_bus(self, id).boxed()
    }

    fn query_reserved_seats<'a>(
        &'a self,
        bus_id: &'a BusId,
        date: NaiveDate,
    ) -> BoxFuture<'a, Result<Vec<Vec<String>>, StoreError>> {
        RestStore::query_reserved_seats(self, bus_id, date).boxed()
    }

    fn submit_booking<'a>(
        &'a self,
        booking: &'a NewBooking,
    ) -> BoxFuture<'a, Result<Booking, StoreError>> {
        RestStore::submit_booking(self, booking).boxed()
    }

    fn list_bookings(&self) -> BoxFuture<'_, Result<Vec<Booking>, StoreError>> {
        RestStore::list_bookings(self).boxed()
    }

    fn list_routes(&self) -> BoxFuture<'_, Result<Vec<(String, String)>, StoreError>> {
        RestStore::list_routes(self).boxed()
    }
}
