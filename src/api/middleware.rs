//! API middleware: rate limiting and response security headers.

use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rate limiting middleware.
///
/// Buckets requests per handler per client IP with a fixed window. On
/// rejection the request is answered with 429 immediately; the handler and
/// any upstream call never run. Successful responses carry the rate-limit
/// headers.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();

    // Exempt health check endpoint
    if path == "/health" {
        return next.run(request).await;
    }

    let key = format!("{}:{}", handler_name(path), extract_client_ip(&request));
    let limits = &state.config.limits;
    let decision =
        state
            .limiter
            .check_and_consume(&key, limits.requests_per_window, limits.window_ms);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let retry_after = decision.reset_in_ms.div_ceil(1000);
    let reset = now + retry_after;

    if !decision.allowed {
        return ApiError::RateLimitExceeded {
            limit: limits.requests_per_window,
            remaining: 0,
            reset,
            retry_after,
        }
        .into_response();
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(
        "X-RateLimit-Limit",
        limits.requests_per_window.to_string().parse().unwrap(),
    );
    headers.insert(
        "X-RateLimit-Remaining",
        decision.remaining.to_string().parse().unwrap(),
    );
    headers.insert("X-RateLimit-Reset", reset.to_string().parse().unwrap());

    response
}

/// Adds `Cache-Control: no-store` and `X-Content-Type-Options: nosniff` to
/// every response, including errors and 405s.
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    response
}

/// Derives the rate-limit bucket name from the request path.
fn handler_name(path: &str) -> &str {
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("unknown")
}

/// Extract client IP from request.
fn extract_client_ip(request: &Request<Body>) -> String {
    // Try X-Forwarded-For header first
    if let Some(forwarded) = request.headers().get("X-Forwarded-For")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
        && !ip.trim().is_empty()
    {
        return ip.trim().to_string();
    }

    // Try X-Real-IP header
    if let Some(real_ip) = request.headers().get("X-Real-IP")
        && let Ok(value) = real_ip.to_str()
        && !value.trim().is_empty()
    {
        return value.trim().to_string();
    }

    // Fall back to the socket address when the server exposes it
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }

    // All unidentifiable clients share one bucket
    "unknown".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;

    #[test]
    fn test_extract_client_ip_forwarded() {
        let request = Request::builder()
            .uri("/api/analyze")
            .header("X-Forwarded-For", "192.168.1.1, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&request), "192.168.1.1");
    }

    #[test]
    fn test_extract_client_ip_real_ip() {
        let request = Request::builder()
            .uri("/api/analyze")
            .header("X-Real-IP", "192.168.1.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&request), "192.168.1.2");
    }

    #[test]
    fn test_extract_client_ip_socket_address() {
        let mut request = Request::builder()
            .uri("/api/analyze")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4321))));

        assert_eq!(extract_client_ip(&request), "127.0.0.1");
    }

    #[test]
    fn test_extract_client_ip_unknown() {
        let request = Request::builder()
            .uri("/api/analyze")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_client_ip(&request), "unknown");
    }

    #[test]
    fn test_handler_name_from_path() {
        assert_eq!(handler_name("/api/analyze"), "analyze");
        assert_eq!(handler_name("/api/activate"), "activate");
        assert_eq!(handler_name("/"), "unknown");
    }
}
