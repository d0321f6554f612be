//! Identity provider client (Supabase GoTrue API).
//!
//! Verification always runs with the privileged service-role key so it does
//! not depend on the caller's session state. Plan updates re-read the user
//! and write back merged metadata, preserving unrelated keys.

use crate::auth::{IdentityError, IdentityProvider, Plan, Principal};
use crate::config::IdentityConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Supabase-backed identity provider.
#[derive(Debug, Clone)]
pub struct SupabaseIdentity {
    client: reqwest::Client,
    base_url: String,
    service_role_key: String,
}

/// User payload returned by the provider.
#[derive(Debug, Deserialize)]
struct ProviderUser {
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    app_metadata: Map<String, Value>,
    #[serde(default)]
    user_metadata: Map<String, Value>,
}

impl SupabaseIdentity {
    /// Creates a new identity client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    async fn fetch_admin_user(&self, user_id: &str) -> Result<ProviderUser, IdentityError> {
        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Provider(format!(
                "admin user lookup failed with status {}",
                response.status()
            )));
        }

        response
            .json::<ProviderUser>()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentity {
    async fn verify_token(&self, token: &str) -> Result<Principal, IdentityError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::InvalidToken(format!(
                "provider answered {}",
                response.status()
            )));
        }

        let user = response
            .json::<ProviderUser>()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        debug!(user_id = %user.id, "token verified");
        Ok(principal_from(user))
    }

    async fn set_plan(&self, user_id: &str, plan: Plan) -> Result<(), IdentityError> {
        // Re-read, merge, write back: a partial metadata update would drop
        // keys the provider stores alongside the plan.
        let user = self.fetch_admin_user(user_id).await?;

        let mut app_metadata = user.app_metadata;
        let mut user_metadata = user.user_metadata;
        app_metadata.insert("plan".to_string(), json!(plan.to_string()));
        user_metadata.insert("plan".to_string(), json!(plan.to_string()));

        let url = format!("{}/auth/v1/admin/users/{}", self.base_url, user_id);
        let response = self
            .client
            .put(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .json(&json!({
                "app_metadata": app_metadata,
                "user_metadata": user_metadata,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Provider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Provider(format!(
                "plan update failed with status {}",
                response.status()
            )));
        }

        debug!(user_id = %user_id, plan = %plan, "plan updated");
        Ok(())
    }
}

fn principal_from(user: ProviderUser) -> Principal {
    let plan = Plan::from_metadata(
        metadata_plan(&user.app_metadata).or_else(|| metadata_plan(&user.user_metadata)),
    );
    let display_name = user
        .user_metadata
        .get("name")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            user.email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string()
        });

    Principal {
        id: user.id,
        email: user.email,
        display_name,
        plan,
    }
}

fn metadata_plan(metadata: &Map<String, Value>) -> Option<&str> {
    metadata
        .get("plan")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
