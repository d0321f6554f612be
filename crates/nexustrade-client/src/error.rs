//! Error types for the NexusTrade client.

use thiserror::Error;


/// Client error types.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or invalid bearer token.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but not allowed (plan or license key).
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Payload exceeded the server's size ceiling.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Rate limited; retry later.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message from API.
        message: String,
    },
}
