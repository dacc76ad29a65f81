//! Mock provider implementation for testing.

use super::{FinishReason, GenerationRequest, ProviderError, ProviderOutput, TryOnProvider};
use crate::config::OutputMode;
use crate::models::InlineImage;
use async_trait::async_trait;
use secrecy::Secret;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Scripted behaviour of [`MockTryOnProvider`].
#[derive(Debug, Clone)]
enum MockBehavior {
    Respond(ProviderOutput),
    Fail(&'static str),
}

/// Mock try-on provider for testing. Returns a fixed output and records
/// every request it receives.
pub struct MockTryOnProvider {
    behavior: MockBehavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl MockTryOnProvider {
    fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Respond with a text description.
    pub fn text(description: &str) -> Self {
        Self::with_behavior(MockBehavior::Respond(ProviderOutput {
            text: Some(description.to_string()),
            ..Default::default()
        }))
    }

    /// Respond with text cut off at the token limit.
    pub fn truncated(partial: &str) -> Self {
        Self::with_behavior(MockBehavior::Respond(ProviderOutput {
            text: Some(partial.to_string()),
            finish_reason: FinishReason::Length,
            ..Default::default()
        }))
    }

    /// Respond with a generated image.
    pub fn image(image: InlineImage) -> Self {
        Self::with_behavior(MockBehavior::Respond(ProviderOutput {
            image: Some(image),
            ..Default::default()
        }))
    }

    /// Respond successfully but with neither text nor image.
    pub fn empty() -> Self {
        Self::with_behavior(MockBehavior::Respond(ProviderOutput::default()))
    }

    /// Fail every call with an API error.
    pub fn failing(message: &'static str) -> Self {
        Self::with_behavior(MockBehavior::Fail(message))
    }

    /// Number of `generate` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent request passed to `generate`.
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TryOnProvider for MockTryOnProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model_for(&self, mode: OutputMode) -> &str {
        match mode {
            OutputMode::Image => "mock-image",
            OutputMode::Text => "mock-text",
        }
    }

    async fn generate(
        &self,
        _api_key: &Secret<String>,
        request: &GenerationRequest,
    ) -> Result<ProviderOutput, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut guard) = self.last_request.lock() {
            *guard = Some(request.clone());
        }

        match &self.behavior {
            MockBehavior::Respond(output) => Ok(output.clone()),
            MockBehavior::Fail(message) => Err(ProviderError::ApiError(message.to_string())),
        }
    }
}
