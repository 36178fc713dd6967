//! Application state for the web layer.

use std::sync::Arc;

use crate::seatmap::SeatMapSessions;
use crate::stations::StationNames;
use crate::store::CachedStore;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Cached booking store
    pub store: Arc<CachedStore>,

    /// Live seat map sessions
    pub sessions: SeatMapSessions,

    /// Station name suggestions
    pub station_names: StationNames,
}

impl AppState {
    /// Create a new app state.
    pub fn new(store: CachedStore, sessions: SeatMapSessions, station_names: StationNames) -> Self {
        Self {
            store: Arc::new(store),
            sessions,
            station_names,
        }
    }
}
