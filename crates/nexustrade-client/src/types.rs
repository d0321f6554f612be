//! Request and response types for the NexusTrade API.

use serde::{Deserialize, Serialize};


/// Trading verdict emitted by the analysis endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
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

// ============================================================================
// Health
// ============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service version.
    pub version: String,
}

// ============================================================================
// Chart Analysis
// ============================================================================

/// Request to analyze a chart screenshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Base64-encoded image bytes.
    pub base64_image: String,
    /// Declared image MIME type.
    pub mime_type: String,
}

/// Structured chart analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    /// Whether the chart was confirmed as coming from the designated
    /// trading platform.
    pub is_source_platform: bool,
    /// Trading verdict.
    pub signal: Signal,
    /// Detected technical pattern.
    pub pattern: String,
    /// Detected trend direction.
    pub trend: String,
    /// Risk/reward estimate.
    #[serde(default)]
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

// ============================================================================
// License Activation
// ============================================================================

/// Request to activate a PRO license.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateRequest {
    /// Submitted license code.
    pub license_key: String,
}

/// Response after a successful activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivateResponse {
    /// Always true on success.
    pub ok: bool,
}
