//! Virtual try-on orchestration.
//!
//! Runs the sequential part of a request once its fields are validated:
//! credential check, product image fetch, payload assembly, one provider
//! call, and mapping the provider output to a [`TryOnOutcome`].

use crate::config::OutputMode;
use crate::models::{InlineImage, TryOnInput, TryOnOutcome};
use crate::services::image_fetcher::{ImageFetchError, ProductImageFetcher};
use crate::services::metrics;
use crate::services::providers::{
    FinishReason, GenerationRequest, ProviderError, TryOnProvider,
};
use secrecy::Secret;
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;

/// Failures after validation. All of them surface to the caller as the same
/// generic 500; the variant only matters for logs and metrics.
#[derive(Debug, thiserror::Error)]
pub enum TryOnError {
    #[error("Provider API key is not configured")]
    MissingCredential,

    #[error("User photo is not a base64 image or data URL")]
    InvalidUserPhoto,

    #[error(transparent)]
    ImageFetch(#[from] ImageFetchError),

    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Provider returned no {0} content")]
    NoContent(&'static str),
}

impl TryOnError {
    pub fn kind(&self) -> &'static str {
        match self {
            TryOnError::MissingCredential => "missing_credential",
            TryOnError::InvalidUserPhoto => "invalid_user_photo",
            TryOnError::ImageFetch(_) => "image_fetch",
            TryOnError::Provider(_) => "provider",
            TryOnError::NoContent(_) => "no_content",
        }
    }
}

impl From<TryOnError> for AppError {
    fn from(err: TryOnError) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

/// Try-on service. Holds the credential injected at construction; it is
/// never read from the environment per request.
#[derive(Clone)]
pub struct TryOnService {
    api_key: Option<Secret<String>>,
    output_mode: OutputMode,
    fetcher: ProductImageFetcher,
    provider: Arc<dyn TryOnProvider>,
}

impl TryOnService {
    pub fn new(
        api_key: Option<Secret<String>>,
        output_mode: OutputMode,
        fetcher: ProductImageFetcher,
        provider: Arc<dyn TryOnProvider>,
    ) -> Self {
        Self {
            api_key,
            output_mode,
            fetcher,
            provider,
        }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model_for(self.output_mode)
    }

    /// Run one try-on. The fetch and the provider call are strictly
    /// sequential and each happens at most once.
    pub async fn run(
        &self,
        input: TryOnInput,
        request_id: Option<&str>,
    ) -> Result<TryOnOutcome, TryOnError> {
        let api_key = self.api_key.as_ref().ok_or(TryOnError::MissingCredential)?;

        let user_image = InlineImage::from_data_url_or_base64(&input.user_photo)
            .ok_or(TryOnError::InvalidUserPhoto)?;

        let product_image = self.fetcher.fetch(&input.product_image, request_id).await?;

        tracing::info!(
            user_image_bytes = user_image.decoded_len(),
            user_image_mime = %user_image.mime_type,
            product_image_bytes = product_image.decoded_len(),
            product_image_mime = %product_image.mime_type,
            "Assembled try-on payload"
        );

        let request = GenerationRequest {
            prompt: input.prompt,
            images: vec![user_image, product_image],
            output_mode: self.output_mode,
            request_id: request_id.map(str::to_string),
        };

        let provider_name = self.provider.name();
        let model = self.model();
        let start = Instant::now();
        let result = self.provider.generate(api_key, &request).await;
        metrics::record_provider_latency(provider_name, model, start.elapsed().as_secs_f64());

        let output = result.inspect_err(|e| {
            metrics::record_provider_error(provider_name, e.error_type());
        })?;

        if output.finish_reason == FinishReason::Length {
            tracing::warn!(
                provider = provider_name,
                model = %model,
                "Provider output was truncated at the token limit"
            );
        }

        match self.output_mode {
            OutputMode::Image => output
                .image
                .map(|image| TryOnOutcome::Image(image.to_data_url()))
                .ok_or(TryOnError::NoContent("image")),
            OutputMode::Text => output
                .text
                .map(TryOnOutcome::Description)
                .ok_or(TryOnError::NoContent("text")),
        }
    }
}
