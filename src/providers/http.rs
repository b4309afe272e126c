/*!
 * Catalog-backed HTTP gateway.
 *
 * `HttpGateway` resolves a `ProviderRoute` against the provider catalog,
 * dispatches the request through the endpoint shape the catalog names,
 * and normalizes the response: reasoning spans of thinking models are
 * stripped, and instructional scaffolding echoed at the start of the
 * output is removed.
 */

use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::debug;
use reqwest::Client;

use crate::app_config::{CredentialStore, EndpointShape, ProviderCatalog};
use crate::errors::ProviderError;
use crate::providers::gemini::Gemini;
use crate::providers::openai_chat::OpenAiChat;
use crate::providers::{ProviderGateway, ProviderRoute, strip_instruction_echo, strip_reasoning};

/// HTTP gateway over all configured providers
#[derive(Debug)]
pub struct HttpGateway {
    /// Shared HTTP client, carries the request timeout
    client: Client,
    /// Provider catalog
    catalog: ProviderCatalog,
    /// API key resolution
    credentials: CredentialStore,
}

impl HttpGateway {
    /// Create a gateway with the given catalog, credentials and timeout.
    ///
    /// Fails when the HTTP client cannot be built, rather than falling
    /// back to a client without the configured timeout.
    pub fn new(
        catalog: ProviderCatalog,
        credentials: CredentialStore,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                ProviderError::RequestFailed(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            catalog,
            credentials,
        })
    }
}

#[async_trait]
impl ProviderGateway for HttpGateway {
    async fn send(&self, route: &ProviderRoute, prompt: &str) -> Result<String, ProviderError> {
        let entry = self.catalog.provider(&route.provider)?;
        let model_config = self.catalog.model_config(&route.provider, &route.model)?;
        let api_key = self.credentials.resolve(&self.catalog, &route.provider)?;

        let started = Instant::now();
        debug!(
            "Sending {} chars to {} ({})",
            prompt.len(),
            route,
            entry.shape
        );

        let raw = match entry.shape {
            EndpointShape::Gemini => {
                let client = Gemini::new(self.client.clone(), api_key, entry.base_url.clone());
                client.generate(&route.model, model_config, prompt).await?
            }
            EndpointShape::OpenAiChat => {
                let endpoint = model_config
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| entry.base_url.clone());
                let client = OpenAiChat::new(self.client.clone(), api_key, endpoint);
                client.complete(&route.model, model_config, prompt).await?
            }
        };

        debug!(
            "Received {} chars from {} in {:?}",
            raw.len(),
            route,
            started.elapsed()
        );

        let cleaned = if model_config.thinking {
            strip_reasoning(&raw)
        } else {
            raw
        };

        let text = strip_instruction_echo(&cleaned);
        if text.is_empty() {
            return Err(ProviderError::ParseError(
                "Provider returned an empty response".to_string(),
            ));
        }

        Ok(text)
    }

    fn validate_route(&self, route: &ProviderRoute) -> Result<(), ProviderError> {
        self.catalog.validate(&route.provider, &route.model)
    }
}
