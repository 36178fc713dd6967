//! Bus ticket storefront server.
//!
//! A web application for searching intercity buses, picking seats on a
//! per-bus seat map and booking them as a guest. Bus and booking data lives
//! in a hosted data API; this crate is a typed layer over it plus the seat
//! map engine.

pub mod checkout;
pub mod config;
pub mod domain;
pub mod search;
pub mod seatmap;
pub mod stations;
pub mod store;
pub mod web;
