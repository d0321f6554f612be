//! End-to-end tests for the NexusTrade API.
//!
//! Each test spawns the backend in-process on an ephemeral port, with mock
//! identity and model providers injected through the state's trait seams,
//! and drives it through `nexustrade-client`. The mocks count their calls
//! so tests can assert the gates run before the upstream work.

use async_trait::async_trait;
use nexustrade_backend::api::create_router;
use nexustrade_backend::auth::{IdentityError, IdentityProvider, Plan, Principal};
use nexustrade_backend::config::Config;
use nexustrade_backend::models::{AnalysisResponse, Signal};
use nexustrade_backend::state::AppState;
use nexustrade_backend::upstream::{ChartModel, ModelError};
use nexustrade_backend::validate::ChartImage;
use nexustrade_client::NexusTradeClient;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// The bearer token the mock identity provider accepts.
pub const VALID_TOKEN: &str = "valid-test-token";

/// The license secret baked into [`test_config`].
pub const LICENSE_SECRET: &str = "NX-NEXUS-TRADE";

/// Identity provider double with a single known token and a mutable plan.
pub struct MockIdentity {
    plan: Mutex<Plan>,
    /// Number of `verify_token` calls.
    pub verify_calls: AtomicUsize,
    /// Number of `set_plan` calls.
    pub set_plan_calls: AtomicUsize,
}

impl MockIdentity {
    /// Creates a provider that resolves [`VALID_TOKEN`] to a principal with
    /// the given plan.
    #[must_use]
    pub fn with_plan(plan: Plan) -> Arc<Self> {
        Arc::new(Self {
            plan: Mutex::new(plan),
            verify_calls: AtomicUsize::new(0),
            set_plan_calls: AtomicUsize::new(0),
        })
    }

    /// The plan currently stored for the principal.
    #[must_use]
    pub fn plan(&self) -> Plan {
        *self.plan.lock().unwrap()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn verify_token(&self, token: &str) -> Result<Principal, IdentityError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if token != VALID_TOKEN {
            return Err(IdentityError::InvalidToken("unknown token".to_string()));
        }
        Ok(Principal {
            id: "user-e2e".to_string(),
            email: "trader@example.com".to_string(),
            display_name: "trader".to_string(),
            plan: self.plan(),
        })
    }

    async fn set_plan(&self, _user_id: &str, plan: Plan) -> Result<(), IdentityError> {
        self.set_plan_calls.fetch_add(1, Ordering::SeqCst);
        *self.plan.lock().unwrap() = plan;
        Ok(())
    }
}

/// Chart model double returning a fixed verdict.
pub struct MockModel {
    verdict: Mutex<AnalysisResponse>,
    /// Number of `analyze_chart` calls.
    pub calls: AtomicUsize,
}

impl MockModel {
    /// Creates a model that answers every call with `verdict`.
    #[must_use]
    pub fn returning(verdict: AnalysisResponse) -> Arc<Self> {
        Arc::new(Self {
            verdict: Mutex::new(verdict),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ChartModel for MockModel {
    async fn analyze_chart(&self, _image: &ChartImage) -> Result<AnalysisResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict.lock().unwrap().clone())
    }
}

/// A verdict where the model confirmed the designated platform.
#[must_use]
pub fn confirmed_verdict(signal: Signal, confidence: f64) -> AnalysisResponse {
    AnalysisResponse {
        is_source_platform: true,
        signal,
        pattern: "Bull flag".to_string(),
        trend: "Up".to_string(),
        risk_reward: "1:3".to_string(),
        reasoning: "Breakout retest held above the flag.".to_string(),
        support_levels: vec!["1.0842".to_string(), "1.0810".to_string()],
        resistance_levels: vec!["1.0901".to_string()],
        confidence,
    }
}

/// A verdict where the model did not confirm the platform, but still tried
/// to smuggle a directional call through the other fields.
#[must_use]
pub fn foreign_chart_verdict() -> AnalysisResponse {
    AnalysisResponse {
        is_source_platform: false,
        signal: Signal::Buy,
        pattern: "Cup and handle".to_string(),
        trend: "Up".to_string(),
        risk_reward: "1:5".to_string(),
        reasoning: "Looks bullish regardless of platform.".to_string(),
        support_levels: vec!["99.0".to_string()],
        resistance_levels: vec!["120.0".to_string()],
        confidence: 0.95,
    }
}

/// Resolved configuration for tests: secrets filled, default limits.
#[must_use]
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.identity.service_role_key = "test-service-role".to_string();
    config.model.api_key = "test-model-key".to_string();
    config.license.key = LICENSE_SECRET.to_string();
    config
}

/// Same as [`test_config`] with a custom rate limit.
#[must_use]
pub fn test_config_with_limit(requests_per_window: u32) -> Config {
    let mut config = test_config();
    config.limits.requests_per_window = requests_per_window;
    config
}

/// One in-process backend instance on an ephemeral port.
pub struct TestServer {
    /// Base URL of the running instance.
    pub base_url: String,
    /// The injected identity double.
    pub identity: Arc<MockIdentity>,
    /// The injected model double.
    pub model: Arc<MockModel>,
}

impl TestServer {
    /// Spawns the router with the given config and providers.
    pub async fn spawn(
        config: Config,
        identity: Arc<MockIdentity>,
        model: Arc<MockModel>,
    ) -> Self {
        let state = Arc::new(AppState::with_providers(
            config,
            identity.clone(),
            model.clone(),
        ));
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");

        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("serve test instance");
        });

        Self {
            base_url: format!("http://{addr}"),
            identity,
            model,
        }
    }

    /// Spawns a default instance: pro plan, confirmed BUY verdict.
    pub async fn spawn_default() -> Self {
        Self::spawn(
            test_config(),
            MockIdentity::with_plan(Plan::Pro),
            MockModel::returning(confirmed_verdict(Signal::Buy, 0.87)),
        )
        .await
    }

    /// Creates an API client pointed at this instance.
    #[must_use]
    pub fn client(&self) -> NexusTradeClient {
        NexusTradeClient::with_base_url(&self.base_url).expect("build client")
    }
}

/// A small valid PNG-ish base64 payload for analyze calls.
#[must_use]
pub fn sample_base64() -> String {
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==".to_string()
}
