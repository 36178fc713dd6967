//! Web layer for the bus booking storefront.
//!
//! Provides HTTP endpoints for searching buses, choosing seats, checking out
//! and listing bookings. Every page also answers JSON when the client does
//! not ask for HTML.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use templates::*;
