//! Principals, subscription plans, and the identity provider seam.

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Subscription tier gating access to paid functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    /// Free tier; cannot run chart analysis.
    #[default]
    Free,
    /// Paid tier; full access.
    Pro,
}

impl Plan {
    /// Parses a plan string from provider metadata. Anything that is not
    /// exactly `"pro"` resolves to [`Plan::Free`]; the default is always
    /// fail-closed.
    #[must_use]
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value {
            Some("pro") => Plan::Pro,
            _ => Plan::Free,
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => write!(f, "free"),
            Self::Pro => write!(f, "pro"),
        }
    }
}

/// The authenticated identity making a request.
///
/// Owned by the external identity provider and mirrored read-only into the
/// request after token verification; only license activation mutates the
/// plan field, through the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Provider-side user id.
    pub id: String,
    /// Account email.
    pub email: String,
    /// Display name; falls back to the local part of the email.
    pub display_name: String,
    /// Resolved subscription plan.
    pub plan: Plan,
}

/// Identity provider error types.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token did not resolve to a user.
    #[error("token rejected: {0}")]
    InvalidToken(String),
    /// The provider call failed or returned an unexpected payload.
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// Verified-identity operations delegated to the external provider.
///
/// Verification uses a privileged service credential, never the end user's
/// session, so it does not depend on any cookie state.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchanges a bearer token for a verified principal.
    async fn verify_token(&self, token: &str) -> Result<Principal, IdentityError>;

    /// Updates the principal's plan in the provider's profile store.
    async fn set_plan(&self, user_id: &str, plan: Plan) -> Result<(), IdentityError>;
}

/// Extracts the bearer token from the Authorization header.
///
/// The scheme is matched case-insensitively; surrounding whitespace is
/// trimmed. Returns `None` when the header is absent, malformed, or the
/// token is empty.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = raw.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}
