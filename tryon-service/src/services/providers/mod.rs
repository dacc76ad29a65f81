//! AI provider abstractions and implementations.
//!
//! The try-on flow talks to its multimodal backend only through
//! [`TryOnProvider`], so the Gemini client can be swapped for the mock in
//! tests.

pub mod gemini;
pub mod mock;

use crate::config::OutputMode;
use crate::models::InlineImage;
use async_trait::async_trait;
use secrecy::Secret;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Short label for metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ProviderError::NotConfigured(_) => "not_configured",
            ProviderError::ApiError(_) => "api_error",
            ProviderError::RateLimited => "rate_limited",
            ProviderError::ContentFiltered => "content_filtered",
            ProviderError::NetworkError(_) => "network",
            ProviderError::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// A single multimodal request: prompt text plus inline images, in order.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub images: Vec<InlineImage>,
    pub output_mode: OutputMode,
    /// Correlation ID forwarded to the provider.
    pub request_id: Option<String>,
}

/// What the provider returned. Either field may be absent; the caller
/// decides which one it needs.
#[derive(Debug, Clone, Default)]
pub struct ProviderOutput {
    pub text: Option<String>,
    pub image: Option<InlineImage>,
    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FinishReason {
    #[default]
    Complete,
    Length,
    ContentFilter,
}

/// Trait for multimodal try-on providers (e.g., Gemini).
#[async_trait]
pub trait TryOnProvider: Send + Sync {
    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Model used for the given output mode.
    fn model_for(&self, mode: OutputMode) -> &str;

    /// Run one generation. Called at most once per try-on request.
    async fn generate(
        &self,
        api_key: &Secret<String>,
        request: &GenerationRequest,
    ) -> Result<ProviderOutput, ProviderError>;
}
