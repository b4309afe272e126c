/*!
 * Provider gateway for LLM translation services.
 *
 * This module contains the uniform request/response abstraction over the
 * supported provider endpoint shapes:
 * - Gemini: generateContent endpoint, API key as query parameter
 * - OpenAI-chat: chat completions endpoint shared by several vendors
 *
 * Adding a provider means adding a catalog entry (and, for a new wire
 * shape, an `EndpointShape` variant); call sites only ever see `send`.
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

pub mod gemini;
pub mod http;
pub mod mock;
pub mod openai_chat;

pub use http::HttpGateway;

/// Markers delimiting reasoning output of "thinking" models
const THINKING_OPEN: &str = "<think>";
const THINKING_CLOSE: &str = "</think>";

/// A provider/model pair addressing one catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRoute {
    /// Provider identifier in the catalog
    pub provider: String,
    /// Model identifier within the provider
    pub model: String,
}

impl ProviderRoute {
    /// Create a route from provider and model identifiers
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }
}

impl std::fmt::Display for ProviderRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.provider, self.model)
    }
}

/// Common interface over all provider endpoint shapes
///
/// Implementations must never place API keys in returned error messages.
#[async_trait]
pub trait ProviderGateway: Send + Sync + Debug {
    /// Send a rendered prompt and return the generated text
    async fn send(&self, route: &ProviderRoute, prompt: &str) -> Result<String, ProviderError>;

    /// Check that a route exists before any request is made
    ///
    /// The default implementation accepts everything; catalog-backed
    /// gateways override this for fail-fast batch validation.
    fn validate_route(&self, _route: &ProviderRoute) -> Result<(), ProviderError> {
        Ok(())
    }
}

/// Remove reasoning spans emitted by thinking models.
///
/// Everything between the thinking markers is dropped; an unterminated
/// opening marker drops the rest of the text from that point.
pub fn strip_reasoning(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(THINKING_OPEN) {
        result.push_str(&rest[..open]);
        match rest[open..].find(THINKING_CLOSE) {
            Some(close) => {
                rest = &rest[open + close + THINKING_CLOSE.len()..];
            }
            None => {
                rest = "";
            }
        }
    }
    result.push_str(rest);

    result.trim().to_string()
}

/// Strip instructional scaffolding echoed at the very start of a response.
///
/// Leading lines that look like prompt leftovers (dash bullets, literal
/// "Requirements:" or "Translation:" labels, blank lines between them) are
/// dropped; the first genuine content line ends the stripping.
pub fn strip_instruction_echo(text: &str) -> String {
    let mut lines = text.lines();
    let mut kept: Vec<&str> = Vec::new();
    let mut in_preamble = true;

    for line in lines.by_ref() {
        if in_preamble {
            let trimmed = line.trim_start();
            if trimmed.is_empty()
                || trimmed.starts_with("- ")
                || trimmed.starts_with("Requirements:")
                || trimmed.starts_with("Translation:")
            {
                continue;
            }
            in_preamble = false;
        }
        kept.push(line);
    }

    kept.join("\n").trim().to_string()
}
