/*!
 * Mock gateway implementations for testing.
 *
 * `MockGateway` simulates provider behavior without network access:
 * - `MockGateway::uppercase()` - "translates" by uppercasing the prompt
 * - `MockGateway::fixed(text)` - always returns the same text
 * - `MockGateway::failing()` - always fails with an API error
 * - `MockGateway::by_route(...)` - dispatches on the route, so tests can
 *   script different behavior for translation and check models
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{ProviderGateway, ProviderRoute};

/// Responder function deciding the outcome of one mock call
pub type Responder =
    dyn Fn(&ProviderRoute, &str) -> Result<String, ProviderError> + Send + Sync;

/// Scripted in-memory gateway
pub struct MockGateway {
    /// Behavior for each call
    responder: Box<Responder>,
    /// Number of calls made
    call_count: Arc<AtomicUsize>,
    /// Prompts seen, in order
    prompts: Arc<Mutex<Vec<String>>>,
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("call_count", &self.call_count.load(Ordering::SeqCst))
            .finish()
    }
}

impl MockGateway {
    /// Create a gateway with a custom responder
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ProviderRoute, &str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            call_count: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A gateway that uppercases whatever it is sent
    pub fn uppercase() -> Self {
        Self::new(|_, prompt| Ok(prompt.to_uppercase()))
    }

    /// A gateway that echoes the prompt back unchanged
    pub fn echo() -> Self {
        Self::new(|_, prompt| Ok(prompt.to_string()))
    }

    /// A gateway that always returns the same text
    pub fn fixed(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(move |_, _| Ok(text.clone()))
    }

    /// A gateway that always fails with a simulated API error
    pub fn failing() -> Self {
        Self::new(|_, _| {
            Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            })
        })
    }

    /// Dispatch on the model id, so a separate check/refine model can be
    /// scripted independently of the main translation model
    pub fn by_route<F>(dispatch: F) -> Self
    where
        F: Fn(&ProviderRoute, &str) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self::new(dispatch)
    }

    /// Number of calls made so far
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Prompts received, in call order
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl ProviderGateway for MockGateway {
    async fn send(&self, route: &ProviderRoute, prompt: &str) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        (self.responder)(route, prompt)
    }
}
