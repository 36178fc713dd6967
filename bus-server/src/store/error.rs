//! Data API error types.

/// Errors from the booking data API.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Invalid API key or row-level security refused the request
    #[error("unauthorized: check BUS_STORE_KEY")]
    Unauthorized,

    /// Rate limited by the API
    #[error("rate limited by the data API")]
    RateLimited,

    /// A uniqueness or foreign-key constraint rejected a write
    #[error("conflict: {0}")]
    Conflict(String),

    /// A row could not be converted to domain types
    #[error("invalid row: {0}")]
    Conversion(String),

    /// Mock fixtures missing or unreadable
    #[error("fixture error: {0}")]
    Fixture(String),

    /// The mock store was told to fail this call
    #[error("simulated failure: {0}")]
    Simulated(&'static str),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}
