//! Multimodal model client for chart interpretation.
//!
//! The model receives a fixed persona, the platform-validation rules, the
//! image bytes and a strict JSON output schema. One invocation per request,
//! no retries; a hung upstream is cut off by the per-request timeout.

use crate::config::ModelConfig;
use crate::models::AnalysisResponse;
use crate::validate::ChartImage;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

/// Model client error types.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Transport failure or timeout.
    #[error("model request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The model returned no text candidate.
    #[error("empty response from the model")]
    EmptyResponse,
    /// The model's output did not match the response schema.
    #[error("model output violated the schema: {0}")]
    Schema(String),
}

/// Chart interpretation delegated to an external multimodal model.
#[async_trait]
pub trait ChartModel: Send + Sync {
    /// Analyzes one chart screenshot and returns the structured verdict.
    async fn analyze_chart(&self, image: &ChartImage) -> Result<AnalysisResponse, ModelError>;
}

/// Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiModel {
    client: reqwest::Client,
    config: ModelConfig,
}

impl GeminiModel {
    /// Creates a new model client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ChartModel for GeminiModel {
    async fn analyze_chart(&self, image: &ChartImage) -> Result<AnalysisResponse, ModelError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let body = json!({
            "system_instruction": {
                "parts": [{ "text": system_instruction(&self.config.platform) }]
            },
            "contents": [{
                "parts": [
                    { "inline_data": { "mime_type": image.mime_type, "data": image.base64 } },
                    { "text": user_prompt(&self.config.platform) },
                ]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": response_schema(),
            }
        });

        debug!(model = %self.config.model, mime = %image.mime_type, "invoking chart model");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(self.config.timeout())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateContentResponse>()
            .await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(ModelError::EmptyResponse)?;

        parse_verdict(&text)
    }
}

/// Parses the model's JSON text into the structured verdict. Any deviation
/// from the schema, including an out-of-enum signal, is fatal.
fn parse_verdict(text: &str) -> Result<AnalysisResponse, ModelError> {
    serde_json::from_str(text).map_err(|e| ModelError::Schema(e.to_string()))
}

fn system_instruction(platform: &str) -> String {
    format!(
        "You are NexusTrade AI, a senior financial analyst specialized in price action, \
         institutional technical analysis and smart money concepts.\n\
         \n\
         YOUR OBJECTIVES:\n\
         1. Validate that the image is a legitimate financial chart.\n\
         2. Identify high-probability chart patterns.\n\
         3. Deliver a clear BUY/SELL verdict backed by technical reasoning.\n\
         \n\
         VALIDATION RULES (MANDATORY):\n\
         - If the image is NOT a financial chart (e.g. a photo of a person, a landscape, \
           an object, a meme), return signal=\"NEUTRAL\" and reasoning=\"ERROR: the image is \
           not a valid trading chart.\".\n\
         - You MUST analyze ONLY chart screenshots taken inside the {platform} platform.\n\
         - If the image comes from any other broker or platform, OR if you cannot confirm \
           it is {platform}, return signal=\"NEUTRAL\" and reasoning starting with \"ERROR:\"."
    )
}

fn user_prompt(platform: &str) -> String {
    format!(
        "First, visually confirm this screenshot was taken inside {platform}.\n\
         - If it is NOT {platform}, or if there is any doubt, immediately return \
           signal=\"NEUTRAL\" and reasoning starting with \"ERROR:\" per the rules.\n\
         - Set the boolean field isSourcePlatform to true only when it is clearly \
           {platform}; otherwise false.\n\
         \n\
         If it is {platform}, analyze the chart and provide:\n\
         - Signal (BUY, SELL, NEUTRAL, HOLD)\n\
         - Technical pattern (e.g. flag, head and shoulders, hammer, pivot)\n\
         - Trend (up, down, sideways)\n\
         - Detailed technical reasoning, citing the entry triggers\n\
         - Support and resistance levels\n\
         \n\
         Respond strictly in JSON following the schema."
    )
}

fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "isSourcePlatform": { "type": "BOOLEAN" },
            "signal": { "type": "STRING", "enum": ["BUY", "SELL", "NEUTRAL", "HOLD"] },
            "pattern": { "type": "STRING" },
            "trend": { "type": "STRING" },
            "riskReward": { "type": "STRING" },
            "reasoning": { "type": "STRING" },
            "supportLevels": { "type": "ARRAY", "items": { "type": "STRING" } },
            "resistanceLevels": { "type": "ARRAY", "items": { "type": "STRING" } },
            "confidence": { "type": "NUMBER" },
        },
        "required": ["isSourcePlatform", "signal", "pattern", "trend", "reasoning"],
    })
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}
