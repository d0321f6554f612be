//! HTTP client library for the NexusTrade API.
//!
//! This crate provides a typed HTTP client for the NexusTrade backend:
//! health check, chart analysis and license activation.
//!
//! # Example
//!
//! ```no_run
//! use nexustrade_client::{ClientConfig, NexusTradeClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), nexustrade_client::Error> {
//!     let client = NexusTradeClient::new(ClientConfig {
//!         base_url: "http://localhost:8080".into(),
//!         timeout: Duration::from_secs(30),
//!     })?;
//!
//!     // Check health
//!     let health = client.health_check().await?;
//!     println!("Status: {}", health.status);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{ClientConfig, NexusTradeClient};
pub use error::Error;
pub use types::*;
