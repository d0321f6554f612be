//! Configuration module: TOML settings plus named secret environment variables,
//! resolved once at startup.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the identity provider service-role key.
pub const SERVICE_ROLE_KEY_VAR: &str = "NEXUS_SERVICE_ROLE_KEY";
/// Environment variable holding the multimodal model API key.
pub const MODEL_API_KEY_VAR: &str = "NEXUS_MODEL_API_KEY";
/// Environment variable holding the license activation secret.
pub const LICENSE_KEY_VAR: &str = "NEXUS_LICENSE_KEY";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse TOML configuration.
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    /// Invalid configuration value.
    #[error("invalid config value: {0}")]
    InvalidValue(String),
    /// A required secret is not set.
    #[error("missing required secret: set the {0} environment variable")]
    MissingSecret(&'static str),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Rate limit and payload ceilings.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Identity provider configuration.
    #[serde(default)]
    pub identity: IdentityConfig,
    /// Multimodal model configuration.
    #[serde(default)]
    pub model: ModelConfig,
    /// License activation configuration.
    #[serde(default)]
    pub license: LicenseConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port number to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Rate limit and payload ceilings shared by all handlers.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Requests allowed per client per window.
    pub requests_per_window: u32,
    /// Fixed window width in milliseconds.
    pub window_ms: u64,
    /// Maximum base64 payload length in characters, after stripping
    /// whitespace. Bounds the decoded image to roughly 3/4 of this.
    pub max_base64_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            requests_per_window: 10,
            window_ms: 60_000,
            max_base64_chars: 10 * 1024 * 1024,
        }
    }
}

/// Identity provider (token verification and profile updates).
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity provider project.
    pub base_url: String,
    /// Privileged service-role key. Filled from the environment by
    /// [`Config::resolve`]; never read from the TOML file.
    #[serde(skip)]
    pub service_role_key: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            service_role_key: String::new(),
        }
    }
}

/// Multimodal model used for chart interpretation.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the generative model API.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Caller-facing timeout for one model invocation, in seconds.
    pub timeout_secs: u64,
    /// Name of the designated trading platform. Charts from anywhere else
    /// get a canned NEUTRAL verdict.
    pub platform: String,
    /// Model API key. Filled from the environment by [`Config::resolve`].
    #[serde(skip)]
    pub api_key: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.5-flash".to_string(),
            timeout_secs: 25,
            platform: "TrionBroker".to_string(),
            api_key: String::new(),
        }
    }
}

impl ModelConfig {
    /// Timeout for one model invocation.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// License activation configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LicenseConfig {
    /// The single server-held activation secret. Filled from the
    /// environment by [`Config::resolve`].
    #[serde(skip)]
    pub key: String,
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file.
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Arguments
    /// * `content` - TOML content as string.
    ///
    /// # Errors
    /// Returns error if content cannot be parsed.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Folds the three secret environment variables into the config and
    /// requires each to be present. Each secret has exactly one variable
    /// name; there is no multi-source fallback.
    ///
    /// # Errors
    /// Returns error if any required secret is missing or empty.
    pub fn resolve(mut self) -> Result<Self, ConfigError> {
        self.identity.service_role_key = require_secret(SERVICE_ROLE_KEY_VAR)?;
        self.model.api_key = require_secret(MODEL_API_KEY_VAR)?;
        self.license.key = require_secret(LICENSE_KEY_VAR)?;
        Ok(self)
    }

    /// Validates the configuration values.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.requests_per_window == 0 {
            return Err(ConfigError::InvalidValue(
                "limits.requests_per_window must be positive".to_string(),
            ));
        }
        if self.limits.window_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "limits.window_ms must be positive".to_string(),
            ));
        }
        if self.limits.max_base64_chars == 0 {
            return Err(ConfigError::InvalidValue(
                "limits.max_base64_chars must be positive".to_string(),
            ));
        }
        if self.identity.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "identity.base_url cannot be empty".to_string(),
            ));
        }
        if self.model.base_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "model.base_url cannot be empty".to_string(),
            ));
        }
        if self.model.model.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "model.model cannot be empty".to_string(),
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "model.timeout_secs must be positive".to_string(),
            ));
        }
        if self.model.platform.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "model.platform cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn require_secret(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingSecret(var)),
    }
}
