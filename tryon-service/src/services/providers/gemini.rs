//! Gemini AI provider implementation.
//!
//! Sends the prompt and both photos as one `generateContent` call. In image
//! mode the IMAGE response modality is requested and the first inline image
//! of the first candidate is returned; in text mode the candidate's text
//! parts are joined.

use super::{FinishReason, GenerationRequest, ProviderError, ProviderOutput, TryOnProvider};
use crate::config::OutputMode;
use crate::models::InlineImage;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;

/// Header carrying the Gemini API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base_url: String,
    pub image_model: String,
    pub text_model: String,
}

/// Gemini try-on provider.
pub struct GeminiTryOnProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiTryOnProvider {
    pub fn new(config: GeminiConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Build the API URL for the given model and method.
    fn api_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.config.api_base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(request.images.len() + 1);
        parts.push(ContentPart::Text {
            text: request.prompt.clone(),
        });
        parts.extend(request.images.iter().map(|image| ContentPart::InlineData {
            inline_data: InlineData {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            },
        }));

        let generation_config = match request.output_mode {
            OutputMode::Image => Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
            }),
            OutputMode::Text => None,
        };

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config,
        }
    }
}

#[async_trait]
impl TryOnProvider for GeminiTryOnProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model_for(&self, mode: OutputMode) -> &str {
        match mode {
            OutputMode::Image => &self.config.image_model,
            OutputMode::Text => &self.config.text_model,
        }
    }

    async fn generate(
        &self,
        api_key: &Secret<String>,
        request: &GenerationRequest,
    ) -> Result<ProviderOutput, ProviderError> {
        if api_key.expose_secret().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let model = self.model_for(request.output_mode);
        let url = self.api_url(model, "generateContent");
        let body = Self::build_request(request);

        tracing::debug!(
            model = %model,
            prompt_len = request.prompt.len(),
            image_count = request.images.len(),
            output_mode = request.output_mode.as_str(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .traced_post(&url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .json(&body)
            .request_id(request.request_id.as_deref())
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| {
                ProviderError::InvalidResponse(format!("Failed to parse response: {}", e))
            })?;

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            return Ok(ProviderOutput::default());
        };

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("IMAGE_SAFETY") | Some("PROHIBITED_CONTENT") => {
                FinishReason::ContentFilter
            }
            _ => FinishReason::Complete,
        };

        if finish_reason == FinishReason::ContentFilter {
            return Err(ProviderError::ContentFiltered);
        }

        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        let mut text: Option<String> = None;
        let mut image: Option<InlineImage> = None;
        for part in parts {
            match part {
                ContentPart::Text { text: chunk } => {
                    text.get_or_insert_with(String::new).push_str(&chunk);
                }
                ContentPart::InlineData { inline_data } => {
                    if image.is_none() && !inline_data.data.is_empty() {
                        image = Some(InlineImage {
                            mime_type: inline_data.mime_type,
                            data: inline_data.data,
                        });
                    }
                }
            }
        }

        Ok(ProviderOutput {
            text: text.filter(|t| !t.trim().is_empty()),
            image,
            finish_reason,
        })
    }
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(alias = "mime_type")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}
