//! Bus search.
//!
//! The store is asked for buses on a route (and optionally a date); the coach
//! class filter is applied afterwards over the returned list, so changing the
//! filter never needs another round trip.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{Bus, BusType, DomainError, parse_optional_travel_date};
use crate::store::{BusQuery, CachedStore, StoreError};

/// Why a search request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("source is required")]
    MissingSource,

    #[error("destination is required")]
    MissingDestination,

    #[error("invalid travel date: {0}")]
    InvalidDate(#[from] DomainError),
}

/// A validated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub source: String,
    pub destination: String,
    pub date: Option<NaiveDate>,
    /// Coach classes to keep. Empty keeps everything.
    pub types: Vec<BusType>,
}

impl SearchRequest {
    /// Validate raw form values.
    ///
    /// `types` is a comma-separated list of coach class labels; blank entries
    /// are ignored.
    pub fn from_params(
        source: Option<&str>,
        destination: Option<&str>,
        date: Option<&str>,
        types: Option<&str>,
    ) -> Result<Self, SearchError> {
        let source = non_blank(source).ok_or(SearchError::MissingSource)?;
        let destination = non_blank(destination).ok_or(SearchError::MissingDestination)?;
        let date = parse_optional_travel_date(date)?;
        let types = types
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(BusType::from_label)
            .collect();

        Ok(Self {
            source,
            destination,
            date,
            types,
        })
    }

    pub fn query(&self) -> BusQuery {
        let query = BusQuery::new(&self.source, &self.destination);
        match self.date {
            Some(date) => query.on(date),
            None => query,
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Keep only buses whose class is in `types`. An empty filter keeps all.
pub fn filter_by_type<'a>(buses: &'a [Bus], types: &[BusType]) -> Vec<&'a Bus> {
    buses
        .iter()
        .filter(|b| types.is_empty() || types.contains(&b.bus_type))
        .collect()
}

/// Results of one search.
#[derive(Debug, Clone)]
pub struct SearchResults {
    pub request: SearchRequest,
    /// Everything the store returned for the route, departure order.
    pub all: Arc<Vec<Bus>>,
}

impl SearchResults {
    /// Buses passing the class filter.
    pub fn buses(&self) -> Vec<&Bus> {
        filter_by_type(&self.all, &self.request.types)
    }

    pub fn count(&self) -> usize {
        self.buses().len()
    }
}

/// Run a search against the (cached) store.
pub async fn search(store: &CachedStore, request: SearchRequest) -> Result<SearchResults, StoreError> {
    let all = store.search_buses(&request.query()).await?;
    Ok(SearchResults { request, all })
}
