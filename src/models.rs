//! Request and response models for the REST API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Trading verdict emitted by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    /// Enter a long position.
    Buy,
    /// Enter a short position.
    Sell,
    /// No actionable setup.
    Neutral,
    /// Keep the current position.
    Hold,
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
            Self::Neutral => write!(f, "NEUTRAL"),
            Self::Hold => write!(f, "HOLD"),
        }
    }
}

/// Request to analyze a chart screenshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Base64-encoded image bytes.
    pub base64_image: String,
    /// Declared image MIME type (png, jpeg or webp).
    pub mime_type: String,
}

/// Structured chart analysis, either passed through from the model or the
/// canned rejection for charts that are not from the designated platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// Whether the model confirmed the chart comes from the designated
    /// trading platform.
    pub is_source_platform: bool,
    /// Trading verdict.
    pub signal: Signal,
    /// Detected technical pattern.
    pub pattern: String,
    /// Detected trend direction.
    pub trend: String,
    /// Risk/reward estimate.
    #[serde(default = "not_applicable")]
    pub risk_reward: String,
    /// Technical explanation for the verdict.
    pub reasoning: String,
    /// Support price levels, nearest first.
    #[serde(default)]
    pub support_levels: Vec<String>,
    /// Resistance price levels, nearest first.
    #[serde(default)]
    pub resistance_levels: Vec<String>,
    /// Model confidence in [0, 1].
    #[serde(default)]
    pub confidence: f64,
}

fn not_applicable() -> String {
    "N/A".to_string()
}

impl AnalysisResponse {
    /// Canned verdict returned whenever the model does not confirm the
    /// chart is from the designated platform. Nothing from the model's
    /// own output survives into this, so a partially compliant model
    /// response cannot leak a verdict.
    #[must_use]
    pub fn platform_rejection(platform: &str) -> Self {
        Self {
            is_source_platform: false,
            signal: Signal::Neutral,
            pattern: not_applicable(),
            trend: not_applicable(),
            risk_reward: not_applicable(),
            reasoning: format!(
                "ERROR: Chart not recognized. Only screenshots taken inside the {platform} \
                 platform can be analyzed. Upload a chart from {platform} and try again."
            ),
            support_levels: Vec::new(),
            resistance_levels: Vec::new(),
            confidence: 0.0,
        }
    }
}

/// Request to activate a PRO license.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    /// Submitted license code.
    pub license_key: String,
}

/// Response after a successful activation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivateResponse {
    /// Always true on success.
    pub ok: bool,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}
