//! HTTP client for the NexusTrade API.

use crate::error::Error;
use crate::types::*;
use reqwest::Client;
use std::time::Duration;


/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API (e.g., "http://localhost:8080").
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the NexusTrade API.
#[derive(Debug, Clone)]
pub struct NexusTradeClient {
    client: Client,
    base_url: String,
}

impl NexusTradeClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates a new client with default configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_base_url(base_url: &str) -> Result<Self, Error> {
        Self::new(ClientConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
    }

    // ========================================================================
    // Health
    // ========================================================================

    /// Performs a health check.
    ///
    /// # Errors
    /// Returns error if the request fails.
    pub async fn health_check(&self) -> Result<HealthResponse, Error> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Chart Analysis
    // ========================================================================

    /// Submits a chart screenshot for analysis.
    ///
    /// # Errors
    /// Returns error if the request fails or is rejected by the API.
    pub async fn analyze_chart(
        &self,
        token: &str,
        base64_image: &str,
        mime_type: &str,
    ) -> Result<AnalysisResponse, Error> {
        let url = format!("{}/api/analyze", self.base_url);
        let body = AnalyzeRequest {
            base64_image: base64_image.to_string(),
            mime_type: mime_type.to_string(),
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // License Activation
    // ========================================================================

    /// Activates a PRO license for the authenticated principal.
    ///
    /// # Errors
    /// Returns error if the request fails or the key does not match.
    pub async fn activate_license(
        &self,
        token: &str,
        license_key: &str,
    ) -> Result<ActivateResponse, Error> {
        let url = format!("{}/api/activate", self.base_url);
        let body = ActivateRequest {
            license_key: license_key.to_string(),
        };
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        self.handle_response(resp).await
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();

        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let text = resp.text().await.unwrap_or_default();
        Err(match status.as_u16() {
            401 => Error::Unauthenticated(text),
            403 => Error::Forbidden(text),
            413 => Error::PayloadTooLarge(text),
            429 => Error::RateLimited(text),
            code => Error::Api {
                status: code,
                message: text,
            },
        })
    }
}
