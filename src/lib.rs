//! # NexusTrade Backend - REST API Server
//!
//! The request-handling core behind NexusTrade: upload a screenshot of a
//! trading chart, get back an AI-generated verdict, gated behind a paid
//! license plan. Built with [Axum](https://crates.io/crates/axum) for async
//! HTTP handling and provides OpenAPI/Swagger documentation via
//! [utoipa](https://crates.io/crates/utoipa).
//!
//! ## Key Features
//!
//! - **Fixed-window rate limiting**: per-handler, per-client-IP buckets in
//!   front of every gated endpoint; rejected requests never reach the
//!   upstream providers.
//!
//! - **Strict request validation**: method, bearer token, JSON shape, MIME
//!   allow-list, base64 character class and a payload size ceiling, all
//!   checked before any external call.
//!
//! - **Delegated identity**: bearer tokens are verified against an external
//!   identity provider with a privileged service credential; the subscription
//!   plan defaults to `free` whenever the provider is silent (fail-closed).
//!
//! - **Gated model access**: the chart model is only invoked for PRO
//!   principals, with a strict output schema and a caller-facing timeout.
//!
//! - **Platform enforcement**: verdicts for charts the model cannot confirm
//!   as coming from the designated trading platform are replaced wholesale
//!   by a canned NEUTRAL result.
//!
//! - **Structured Logging**: request tracing with `tower-http` plus
//!   structured fields on every decision point.
//!
//! ## Request flow
//!
//! ```text
//! client
//!   └── security headers (every response)
//!         └── rate limiter            → 429
//!               └── validation        → 400 / 401 / 413
//!                     └── identity    → 401 / 403
//!                           └── upstream (identity / model) → 502
//!                                 └── structured JSON response
//! ```
//!
//! ## Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Route handlers, middleware and router configuration |
//! | [`auth`] | Principals, plans and the identity provider seam |
//! | [`config`] | TOML + environment configuration, resolved at startup |
//! | [`error`] | API error taxonomy with `IntoResponse` implementation |
//! | [`limiter`] | Fixed-window rate limiter |
//! | [`models`] | Request/response DTOs with OpenAPI schemas |
//! | [`state`] | Application state management |
//! | [`upstream`] | Identity provider and model clients |
//! | [`validate`] | Per-handler payload validation |
//!
//! ## API Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/health` | Health check (rate-limit exempt) |
//! | POST | `/api/analyze` | Analyze a chart screenshot (PRO only) |
//! | POST | `/api/activate` | Activate a PRO license |
//!
//! Every response carries `Cache-Control: no-store` and
//! `X-Content-Type-Options: nosniff`.
//!
//! ## Example Usage
//!
//! ### Starting the Server
//!
//! ```bash
//! export NEXUS_SERVICE_ROLE_KEY=...
//! export NEXUS_MODEL_API_KEY=...
//! export NEXUS_LICENSE_KEY=...
//!
//! # Defaults
//! cargo run
//!
//! # With a config file
//! NEXUS_CONFIG=nexustrade.toml cargo run
//! ```
//!
//! ### API Requests
//!
//! ```bash
//! # Activate a license
//! curl -X POST http://localhost:8080/api/activate \
//!   -H "Authorization: Bearer $TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"licenseKey": "NX-..."}'
//!
//! # Analyze a chart
//! curl -X POST http://localhost:8080/api/analyze \
//!   -H "Authorization: Bearer $TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d "{\"base64Image\": \"$(base64 -w0 chart.png)\", \"mimeType\": \"image/png\"}"
//! ```
//!
//! ## Swagger UI
//!
//! Once the server is running, access the interactive API documentation at:
//!
//! ```text
//! http://localhost:8080/swagger-ui/
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod limiter;
pub mod models;
pub mod state;
pub mod upstream;
pub mod validate;
