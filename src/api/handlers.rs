//! API request handlers.
//!
//! Both gated handlers run their checks in a fixed order and stop at the
//! first failure: bearer token, identity, plan/key, payload, upstream call.
//! Nothing is retried; an upstream failure fails the whole request.

use crate::auth::{Plan, bearer_token};
use crate::error::ApiError;
use crate::models::{
    ActivateRequest, ActivateResponse, AnalysisResponse, AnalyzeRequest, HealthResponse,
};
use crate::state::AppState;
use crate::validate::{parse_json_body, validate_activate, validate_analyze};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use std::sync::Arc;
use tracing::{info, warn};

// ============================================================================
// Health Check
// ============================================================================

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Chart Analysis
// ============================================================================

/// Analyze a chart screenshot.
///
/// Requires a PRO plan. The plan gate runs strictly before the model call
/// so non-paying requests never spend model quota. Charts the model cannot
/// confirm as coming from the designated platform get a canned NEUTRAL
/// verdict with zero confidence, still as a 200.
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Structured analysis result", body = AnalysisResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "PRO plan required"),
        (status = 413, description = "Image too large"),
        (status = 429, description = "Rate limited"),
        (status = 502, description = "Model call failed")
    ),
    tag = "Analysis"
)]
pub async fn analyze_chart(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".to_string()))?;

    if state.config.model.api_key.is_empty() {
        return Err(ApiError::Misconfigured(
            "model API key is not set".to_string(),
        ));
    }

    let principal = state.identity.verify_token(&token).await.map_err(|e| {
        warn!(error = %e, "token verification failed");
        ApiError::Unauthenticated("invalid token".to_string())
    })?;

    if principal.plan != Plan::Pro {
        return Err(ApiError::Forbidden("PRO plan required".to_string()));
    }

    let request: AnalyzeRequest = parse_json_body(&body)?;
    let image = validate_analyze(&request, state.config.limits.max_base64_chars)?;

    let mut verdict = state.model.analyze_chart(&image).await.map_err(|e| {
        warn!(error = %e, "model invocation failed");
        ApiError::Upstream(e.to_string())
    })?;

    if !verdict.is_source_platform {
        info!(user_id = %principal.id, "chart not confirmed as designated platform");
        return Ok(Json(AnalysisResponse::platform_rejection(
            &state.config.model.platform,
        )));
    }

    verdict.confidence = verdict.confidence.clamp(0.0, 1.0);
    Ok(Json(verdict))
}

// ============================================================================
// License Activation
// ============================================================================

/// Activate a PRO license.
///
/// Compares the submitted code against the single server-held secret,
/// trimmed and case-insensitive, and on match sets the principal's plan to
/// PRO through the identity provider. Activating an already-PRO principal
/// is a no-op success.
#[utoipa::path(
    post,
    path = "/api/activate",
    request_body = ActivateRequest,
    responses(
        (status = 200, description = "Plan upgraded", body = ActivateResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "License key does not match"),
        (status = 429, description = "Rate limited"),
        (status = 502, description = "Plan update failed")
    ),
    tag = "License"
)]
pub async fn activate_license(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ActivateResponse>, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::Unauthenticated("missing bearer token".to_string()))?;

    let request: ActivateRequest = parse_json_body(&body)?;
    let submitted = validate_activate(&request)?;

    let secret = state.config.license.key.trim();
    if secret.is_empty() {
        return Err(ApiError::Misconfigured(
            "license key is not set".to_string(),
        ));
    }

    let principal = state.identity.verify_token(&token).await.map_err(|e| {
        warn!(error = %e, "token verification failed");
        ApiError::Unauthenticated("invalid token".to_string())
    })?;

    if !submitted.eq_ignore_ascii_case(secret) {
        return Err(ApiError::InvalidKey);
    }

    state
        .identity
        .set_plan(&principal.id, Plan::Pro)
        .await
        .map_err(|e| {
            warn!(user_id = %principal.id, error = %e, "plan update failed");
            ApiError::Upstream(e.to_string())
        })?;

    info!(user_id = %principal.id, "license activated");
    Ok(Json(ActivateResponse { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityError, IdentityProvider, Principal};
    use crate::config::Config;
    use crate::models::Signal;
    use crate::upstream::{ChartModel, ModelError};
    use crate::validate::ChartImage;
    use async_trait::async_trait;
    use axum::http::{HeaderValue, header};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockIdentity {
        plan: Mutex<Plan>,
        reject_token: bool,
        set_plan_calls: AtomicUsize,
    }

    impl MockIdentity {
        fn with_plan(plan: Plan) -> Arc<Self> {
            Arc::new(Self {
                plan: Mutex::new(plan),
                reject_token: false,
                set_plan_calls: AtomicUsize::new(0),
            })
        }

        fn rejecting() -> Arc<Self> {
            Arc::new(Self {
                plan: Mutex::new(Plan::Free),
                reject_token: true,
                set_plan_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl IdentityProvider for MockIdentity {
        async fn verify_token(&self, _token: &str) -> Result<Principal, IdentityError> {
            if self.reject_token {
                return Err(IdentityError::InvalidToken("expired".to_string()));
            }
            Ok(Principal {
                id: "user-1".to_string(),
                email: "trader@example.com".to_string(),
                display_name: "trader".to_string(),
                plan: *self.plan.lock().unwrap(),
            })
        }

        async fn set_plan(&self, _user_id: &str, plan: Plan) -> Result<(), IdentityError> {
            *self.plan.lock().unwrap() = plan;
            self.set_plan_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct MockModel {
        verdict: AnalysisResponse,
        calls: AtomicUsize,
    }

    impl MockModel {
        fn returning(verdict: AnalysisResponse) -> Arc<Self> {
            Arc::new(Self {
                verdict,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ChartModel for MockModel {
        async fn analyze_chart(&self, _image: &ChartImage) -> Result<AnalysisResponse, ModelError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict.clone())
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.identity.service_role_key = "service-role".to_string();
        config.model.api_key = "model-key".to_string();
        config.license.key = "NX-NEXUS-TRADE".to_string();
        config
    }

    fn confirmed_verdict(confidence: f64) -> AnalysisResponse {
        AnalysisResponse {
            is_source_platform: true,
            signal: Signal::Buy,
            pattern: "Bull flag".to_string(),
            trend: "Up".to_string(),
            risk_reward: "1:3".to_string(),
            reasoning: "Breakout retest held.".to_string(),
            support_levels: vec!["1.0842".to_string()],
            resistance_levels: vec!["1.0901".to_string()],
            confidence,
        }
    }

    fn state_with(
        config: Config,
        identity: Arc<MockIdentity>,
        model: Arc<MockModel>,
    ) -> Arc<AppState> {
        Arc::new(AppState::with_providers(config, identity, model))
    }

    fn auth_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        headers
    }

    fn analyze_body() -> Bytes {
        Bytes::from(r#"{"base64Image": "aGVsbG8=", "mimeType": "image/png"}"#)
    }

    fn activate_body(key: &str) -> Bytes {
        Bytes::from(format!(r#"{{"licenseKey": "{key}"}}"#))
    }

    #[tokio::test]
    async fn test_analyze_requires_bearer_token() {
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), MockIdentity::with_plan(Plan::Pro), model.clone());

        let result = analyze_chart(State(state), HeaderMap::new(), analyze_body()).await;
        assert!(matches!(result.unwrap_err(), ApiError::Unauthenticated(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_rejects_invalid_token() {
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), MockIdentity::rejecting(), model.clone());

        let result = analyze_chart(State(state), auth_headers("bad"), analyze_body()).await;
        assert!(matches!(result.unwrap_err(), ApiError::Unauthenticated(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_free_plan_never_reaches_model() {
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), MockIdentity::with_plan(Plan::Free), model.clone());

        let result = analyze_chart(State(state), auth_headers("token"), analyze_body()).await;
        assert!(matches!(result.unwrap_err(), ApiError::Forbidden(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_bad_mime_never_reaches_model() {
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), MockIdentity::with_plan(Plan::Pro), model.clone());

        let body = Bytes::from(r#"{"base64Image": "aGVsbG8=", "mimeType": "image/gif"}"#);
        let result = analyze_chart(State(state), auth_headers("token"), body).await;
        assert!(matches!(result.unwrap_err(), ApiError::BadRequest(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_oversized_payload_never_reaches_model() {
        let mut config = test_config();
        config.limits.max_base64_chars = 16;
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(config, MockIdentity::with_plan(Plan::Pro), model.clone());

        let payload = "A".repeat(64);
        let body = Bytes::from(format!(
            r#"{{"base64Image": "{payload}", "mimeType": "image/png"}}"#
        ));
        let result = analyze_chart(State(state), auth_headers("token"), body).await;
        assert!(matches!(result.unwrap_err(), ApiError::PayloadTooLarge(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_analyze_passes_confirmed_verdict_through() {
        let model = MockModel::returning(confirmed_verdict(0.87));
        let state = state_with(test_config(), MockIdentity::with_plan(Plan::Pro), model.clone());

        let Json(response) = analyze_chart(State(state), auth_headers("token"), analyze_body())
            .await
            .unwrap();
        assert_eq!(response.signal, Signal::Buy);
        assert_eq!(response.confidence, 0.87);
        assert_eq!(response.support_levels, vec!["1.0842".to_string()]);
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_analyze_clamps_out_of_range_confidence() {
        let model = MockModel::returning(confirmed_verdict(1.7));
        let state = state_with(test_config(), MockIdentity::with_plan(Plan::Pro), model);

        let Json(response) = analyze_chart(State(state), auth_headers("token"), analyze_body())
            .await
            .unwrap();
        assert_eq!(response.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_analyze_synthesizes_rejection_for_foreign_chart() {
        // The model claims BUY with high confidence but does not confirm the
        // platform; nothing of that verdict may leak through.
        let mut verdict = confirmed_verdict(0.95);
        verdict.is_source_platform = false;
        let model = MockModel::returning(verdict);
        let state = state_with(test_config(), MockIdentity::with_plan(Plan::Pro), model);

        let Json(response) = analyze_chart(State(state), auth_headers("token"), analyze_body())
            .await
            .unwrap();
        assert!(!response.is_source_platform);
        assert_eq!(response.signal, Signal::Neutral);
        assert_eq!(response.confidence, 0.0);
        assert!(response.support_levels.is_empty());
        assert!(response.resistance_levels.is_empty());
        assert!(response.reasoning.contains("TrionBroker"));
    }

    #[tokio::test]
    async fn test_activate_happy_path_flips_plan() {
        let identity = MockIdentity::with_plan(Plan::Free);
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), identity.clone(), model);

        let Json(response) = activate_license(
            State(state),
            auth_headers("token"),
            activate_body("NX-NEXUS-TRADE"),
        )
        .await
        .unwrap();
        assert!(response.ok);
        assert_eq!(*identity.plan.lock().unwrap(), Plan::Pro);
        assert_eq!(identity.set_plan_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_activate_normalizes_case_and_whitespace() {
        let identity = MockIdentity::with_plan(Plan::Free);
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), identity.clone(), model);

        let Json(response) = activate_license(
            State(state),
            auth_headers("token"),
            activate_body(" nx-nexus-trade "),
        )
        .await
        .unwrap();
        assert!(response.ok);
        assert_eq!(*identity.plan.lock().unwrap(), Plan::Pro);
    }

    #[tokio::test]
    async fn test_activate_is_idempotent() {
        let identity = MockIdentity::with_plan(Plan::Free);
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), identity.clone(), model);

        for _ in 0..2 {
            let Json(response) = activate_license(
                State(state.clone()),
                auth_headers("token"),
                activate_body("NX-NEXUS-TRADE"),
            )
            .await
            .unwrap();
            assert!(response.ok);
        }
        assert_eq!(*identity.plan.lock().unwrap(), Plan::Pro);
        // One plan write per successful call, nothing else.
        assert_eq!(identity.set_plan_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_activate_substantively_wrong_key_rejected() {
        let identity = MockIdentity::with_plan(Plan::Free);
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), identity.clone(), model);

        let result = activate_license(
            State(state),
            auth_headers("token"),
            activate_body("NX-NEXUS-TRADE-2"),
        )
        .await;
        assert!(matches!(result.unwrap_err(), ApiError::InvalidKey));
        assert_eq!(*identity.plan.lock().unwrap(), Plan::Free);
        assert_eq!(identity.set_plan_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_activate_empty_key_is_bad_request() {
        let identity = MockIdentity::with_plan(Plan::Free);
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), identity, model);

        let result =
            activate_license(State(state), auth_headers("token"), activate_body("  ")).await;
        assert!(matches!(result.unwrap_err(), ApiError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_activate_invalid_token_rejected() {
        let identity = MockIdentity::rejecting();
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(test_config(), identity.clone(), model);

        let result = activate_license(
            State(state),
            auth_headers("bad"),
            activate_body("NX-NEXUS-TRADE"),
        )
        .await;
        assert!(matches!(result.unwrap_err(), ApiError::Unauthenticated(_)));
        assert_eq!(identity.set_plan_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_activate_missing_license_key_is_misconfigured() {
        let mut config = test_config();
        config.license.key = String::new();
        let identity = MockIdentity::with_plan(Plan::Free);
        let model = MockModel::returning(confirmed_verdict(0.9));
        let state = state_with(config, identity, model);

        let result = activate_license(
            State(state),
            auth_headers("token"),
            activate_body("anything"),
        )
        .await;
        assert!(matches!(result.unwrap_err(), ApiError::Misconfigured(_)));
    }

    #[tokio::test]
    async fn test_health_check_reports_version() {
        let Json(health) = health_check().await;
        assert_eq!(health.status, "healthy");
        assert!(!health.version.is_empty());
    }
}
