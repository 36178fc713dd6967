//! Domain types for the bus booking storefront.
//!
//! This module contains the validated model types shared by the data API
//! client, the seat map and the web layer. Types enforce their invariants at
//! construction time, so code that receives them can trust their validity.

mod booking;
mod bus;
mod error;
mod fare;
mod seat;
mod time;

pub use booking::{Booking, BookingStatus};
pub use bus::{Bus, BusId, BusType};
pub use error::DomainError;
pub use fare::Fare;
pub use seat::{DEFAULT_COLUMNS, DEFAULT_ROWS, InvalidSeatId, SeatId, SeatLayout};
pub use time::{
    DATE_FORMAT, day_bounds, format_travel_date, parse_optional_travel_date, parse_timestamp,
    parse_travel_date,
};
