//! Per-handler request validation.
//!
//! Every check here runs before any upstream call; the first failing check
//! short-circuits the rest.

use crate::error::ApiError;
use crate::models::{ActivateRequest, AnalyzeRequest};
use serde::de::DeserializeOwned;

/// Image MIME types the analysis handler accepts.
pub const ALLOWED_MIME_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/webp"];

/// A validated analysis payload, with whitespace stripped from the base64
/// body and the length ceiling already enforced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    /// Whitespace-free base64 image bytes.
    pub base64: String,
    /// Declared MIME type, from the allow-list.
    pub mime_type: String,
}

/// Parses a request body as JSON. Malformed JSON and missing fields are
/// client errors, never server errors.
pub fn parse_json_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

/// Validates an analysis payload: MIME allow-list, base64 character class,
/// then the size ceiling. The ceiling applies to the whitespace-stripped
/// length and bounds the decoded image to protect a memory-constrained
/// handler.
pub fn validate_analyze(
    request: &AnalyzeRequest,
    max_base64_chars: usize,
) -> Result<ChartImage, ApiError> {
    if !ALLOWED_MIME_TYPES.contains(&request.mime_type.as_str()) {
        return Err(ApiError::BadRequest(format!(
            "invalid mimeType: {}. Send PNG, JPEG or WEBP",
            request.mime_type
        )));
    }

    if request.base64_image.is_empty() {
        return Err(ApiError::BadRequest("base64Image is required".to_string()));
    }

    if !request
        .base64_image
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '/' | '=') || c.is_ascii_whitespace())
    {
        return Err(ApiError::BadRequest(
            "base64Image contains invalid characters".to_string(),
        ));
    }

    let stripped: String = request
        .base64_image
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if stripped.is_empty() {
        return Err(ApiError::BadRequest("base64Image is required".to_string()));
    }
    if stripped.len() > max_base64_chars {
        return Err(ApiError::PayloadTooLarge(
            "image too large for analysis, send a smaller screenshot".to_string(),
        ));
    }

    Ok(ChartImage {
        base64: stripped,
        mime_type: request.mime_type.clone(),
    })
}

/// Validates an activation payload and returns the trimmed license code.
pub fn validate_activate(request: &ActivateRequest) -> Result<String, ApiError> {
    let key = request.license_key.trim();
    if key.is_empty() {
        return Err(ApiError::BadRequest("licenseKey is required".to_string()));
    }
    Ok(key.to_string())
}
