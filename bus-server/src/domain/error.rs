//! Domain error types.
//!
//! These errors represent validation failures in the domain layer. They are
//! distinct from data API and IO errors.

/// Domain-level errors for validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A required value was missing or blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Negative, non-finite or oversized money amount
    #[error("invalid fare: {0}")]
    InvalidFare(String),

    /// Seat grid dimensions out of range
    #[error("invalid seat layout: {0}")]
    InvalidLayout(&'static str),

    /// Timestamp in a format we don't understand
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
}
