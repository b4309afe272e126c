use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::app_config::ModelConfig;
use crate::errors::ProviderError;

/// Client for OpenAI-compatible chat completion endpoints
///
/// Several vendors share this wire shape; the catalog decides which
/// provider identifiers route here.
pub struct OpenAiChat {
    /// HTTP client for API requests
    client: Client,
    /// API key sent as a Bearer token
    api_key: String,
    /// Full endpoint URL (e.g. `https://api.openai.com/v1/chat/completions`)
    endpoint: String,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    /// The model to use
    model: String,

    /// Conversation messages
    messages: Vec<ChatMessage>,

    /// Sampling temperature
    temperature: f32,

    /// Nucleus sampling mass
    top_p: f32,

    /// Maximum tokens to generate
    max_tokens: u32,
}

/// One chat message
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the sender (user, assistant, system)
    pub role: String,

    /// Message content
    pub content: String,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    /// Generated choices; the first one is used
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One choice of a chat response
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message
    pub message: ChatMessage,
}

impl OpenAiChat {
    /// Create a new OpenAI-compatible chat client
    pub fn new(client: Client, api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Complete a single-user-message conversation
    pub async fn complete(
        &self,
        model: &str,
        model_config: &ModelConfig,
        prompt: &str,
    ) -> Result<String, ProviderError> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: model_config.temperature,
            top_p: model_config.top_p,
            max_tokens: model_config.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
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

        let chat_response = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.without_url().to_string()))?;

        Self::extract_text(&chat_response)
    }

    /// Extract the generated text from a response
    pub fn extract_text(response: &ChatResponse) -> Result<String, ProviderError> {
        response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::ParseError("Response contains no choices".to_string()))
    }
}
