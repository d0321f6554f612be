//! Error types for the REST API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;


/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Error code.
    pub code: String,
}

/// Rate limit error response body.
#[derive(Debug, Serialize)]
pub struct RateLimitErrorResponse {
    /// Error message.
    pub error: String,
    /// Error code.
    pub code: String,
    /// Maximum requests allowed.
    pub limit: u32,
    /// Remaining requests.
    pub remaining: u32,
    /// Unix timestamp when the rate limit resets.
    pub reset: u64,
    /// Seconds until reset.
    pub retry_after: u64,
}

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or invalid input; recoverable by resubmitting correct input.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing or invalid bearer token.
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Authenticated but the plan does not allow this operation.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// The submitted license code does not match the server-held secret.
    #[error("Invalid license key")]
    InvalidKey,

    /// Payload exceeds the configured size ceiling.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded {
        /// Maximum requests allowed.
        limit: u32,
        /// Remaining requests (always 0 when exceeded).
        remaining: u32,
        /// Unix timestamp when the rate limit resets.
        reset: u64,
        /// Seconds until reset.
        retry_after: u64,
    },

    /// Identity provider or model call failed or returned unparseable output.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Required secret or config is missing; fatal, not user-actionable.
    #[error("Server misconfigured: {0}")]
    Misconfigured(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::RateLimitExceeded {
                limit,
                remaining,
                reset,
                retry_after,
            } => {
                let body = Json(RateLimitErrorResponse {
                    error: "Rate limit exceeded".to_string(),
                    code: "RATE_LIMIT_EXCEEDED".to_string(),
                    limit: *limit,
                    remaining: *remaining,
                    reset: *reset,
                    retry_after: *retry_after,
                });

                (
                    StatusCode::TOO_MANY_REQUESTS,
                    [
                        ("X-RateLimit-Limit", limit.to_string()),
                        ("X-RateLimit-Remaining", remaining.to_string()),
                        ("X-RateLimit-Reset", reset.to_string()),
                        ("Retry-After", retry_after.to_string()),
                    ],
                    body,
                )
                    .into_response()
            }
            _ => {
                let (status, code) = match &self {
                    ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                    ApiError::Unauthenticated(_) => {
                        (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED")
                    }
                    ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                    ApiError::InvalidKey => (StatusCode::FORBIDDEN, "INVALID_KEY"),
                    ApiError::PayloadTooLarge(_) => {
                        (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE")
                    }
                    ApiError::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
                    ApiError::Misconfigured(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_MISCONFIGURED")
                    }
                    ApiError::RateLimitExceeded { .. } => unreachable!(),
                };

                let body = Json(ErrorResponse {
                    error: self.to_string(),
                    code: code.to_string(),
                });

                (status, body).into_response()
            }
        }
    }
}
