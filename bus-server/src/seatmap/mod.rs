//! Seat map engine.
//!
//! A seat map is opened for one bus on one travel date. It loads the set of
//! seats already held by confirmed bookings, then lets the customer toggle
//! seats in and out of a selection and hand the result to checkout.
//!
//! - Reserved seats are fixed for the life of the map; toggling one is a no-op
//! - The running total is always `selected seats × fare`
//! - Nothing is held while the customer chooses. Two customers can select the
//!   same free seat; the booking store decides at submit time

mod load;
mod session;
mod state;
mod view;

pub use load::{
    FetchError, LoadedReservations, ReservationSet, ReservationSource, fetch_reservations,
    load_reservations,
};
pub use session::{SeatMapSessions, SessionConfig};
pub use state::{
    CheckoutHandoff, ProceedError, SeatMap, SeatMapInputs, SeatState, Toggle,
};
pub use view::{SeatMapView, SeatRowView, SeatView, SelectionSummary};
