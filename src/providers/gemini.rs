use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::ModelConfig;
use crate::errors::ProviderError;

/// Gemini client for the generateContent API
///
/// The API key travels as a query parameter, so failures are sanitized
/// before they become error messages.
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key, appended as `?key=` query parameter
    api_key: String,
    /// Base URL of the API (e.g. `https://generativelanguage.googleapis.com/v1beta`)
    base_url: String,
}

/// Gemini generateContent request body
#[derive(Debug, Serialize)]
pub struct GeminiRequest {
    /// Conversation contents
    contents: Vec<GeminiContent>,

    /// Generation parameters
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

/// One content block of a Gemini request or response
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiContent {
    /// Typed parts of the content
    pub parts: Vec<GeminiPart>,
}

/// A single typed part
#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiPart {
    /// Text payload
    #[serde(default)]
    pub text: Option<String>,

    /// Set when the part carries model reasoning rather than the answer
    #[serde(default)]
    pub thought: Option<bool>,
}

/// Generation parameters
#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    /// Sampling temperature
    temperature: f32,

    /// Nucleus sampling mass
    #[serde(rename = "topP")]
    top_p: f32,

    /// Maximum tokens to generate
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

/// Gemini generateContent response
#[derive(Debug, Deserialize)]
pub struct GeminiResponse {
    /// Generated candidates; the first one is used
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,
}

/// One candidate of a Gemini response
#[derive(Debug, Deserialize)]
pub struct GeminiCandidate {
    /// Candidate content
    pub content: GeminiContent,
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(client: Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }

    /// Generate text for a prompt with the given model
    pub async fn generate(
        &self,
        model: &str,
        model_config: &ModelConfig,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let api_url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url.trim_end_matches('/'),
            model,
            self.api_key
        );

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                    thought: None,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: model_config.temperature,
                top_p: model_config.top_p,
                max_output_tokens: model_config.max_tokens,
            },
        };

        let response = self
            .client
            .post(&api_url)
            .json(&request)
            .send()
            .await
            // without_url: the key is part of the URL and must not leak
            .map_err(|e| ProviderError::RequestFailed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response body".to_string());
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let gemini_response = response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.without_url().to_string()))?;

        Self::extract_text(&gemini_response)
    }

    /// Extract the final-answer text from a response.
    ///
    /// Parts flagged as thought are dropped; the remaining text parts of
    /// the first candidate are concatenated.
    pub fn extract_text(response: &GeminiResponse) -> Result<String, ProviderError> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| ProviderError::ParseError("Response contains no candidates".to_string()))?;

        let text: String = candidate
            .content
            .parts
            .iter()
            .filter(|part| !part.thought.unwrap_or(false))
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.is_empty() {
            return Err(ProviderError::ParseError(
                "Response contains no text parts".to_string(),
            ));
        }

        Ok(text)
    }
}
