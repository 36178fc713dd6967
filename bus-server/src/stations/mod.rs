//! Station name suggestions for the search form.
//!
//! Names are gathered from the bus catalogue's routes at startup and
//! refreshed periodically.

mod names;

pub use names::{DEFAULT_LIMIT, DEFAULT_STATIONS, MAX_LIMIT, StationNames};
