//! Application state management.

use crate::auth::IdentityProvider;
use crate::config::Config;
use crate::limiter::FixedWindowLimiter;
use crate::upstream::{ChartModel, GeminiModel, SupabaseIdentity};
use std::sync::Arc;

/// Application state shared across all handlers.
///
/// The rate-limit table is the only mutable piece; everything else is
/// resolved once at startup. The upstream collaborators sit behind traits
/// so tests can inject doubles.
#[derive(Clone)]
pub struct AppState {
    /// Resolved configuration.
    pub config: Arc<Config>,
    /// Shared fixed-window rate limiter.
    pub limiter: Arc<FixedWindowLimiter>,
    /// Identity provider (token verification, plan updates).
    pub identity: Arc<dyn IdentityProvider>,
    /// Multimodal chart model.
    pub model: Arc<dyn ChartModel>,
}

impl AppState {
    /// Creates the production state: real identity and model clients built
    /// from the resolved configuration.
    ///
    /// # Errors
    /// Returns error if either upstream HTTP client cannot be built.
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let identity = SupabaseIdentity::new(&config.identity)?;
        let model = GeminiModel::new(config.model.clone())?;
        Ok(Self::with_providers(
            config,
            Arc::new(identity),
            Arc::new(model),
        ))
    }

    /// Creates a state with explicit upstream providers. Production wiring
    /// and tests share this constructor.
    #[must_use]
    pub fn with_providers(
        config: Config,
        identity: Arc<dyn IdentityProvider>,
        model: Arc<dyn ChartModel>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            limiter: Arc::new(FixedWindowLimiter::new()),
            identity,
            model,
        }
    }
}
