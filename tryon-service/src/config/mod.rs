use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

/// Gemini REST API base URL.
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default inbound body limit (10MB). Base64 photos are ~4/3 of their
/// binary size, so axum's 2MB default is too small.
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct TryOnConfig {
    pub common: core_config::Config,
    pub google: GoogleConfig,
    pub models: ModelConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Provider credential. `None` is not a startup error: each try-on
    /// request fails with a 500 until a key is configured.
    pub api_key: Option<Secret<String>>,
    pub api_base_url: String,
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Which success shape the service produces.
    pub output_mode: OutputMode,
    /// Model for image output (must support the IMAGE response modality)
    pub image_model: String,
    /// Model for text descriptions
    pub text_model: String,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub max_body_bytes: usize,
    /// Allowed CORS origins; empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl TryOnConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = common_config.is_production();

        let api_key = env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .map(Secret::new);

        if api_key.is_none() {
            tracing::warn!("GOOGLE_API_KEY is not set; try-on requests will fail until it is");
        }

        Ok(TryOnConfig {
            common: common_config,
            google: GoogleConfig {
                api_key,
                api_base_url: get_env(
                    "GEMINI_API_BASE_URL",
                    Some(DEFAULT_GEMINI_API_BASE),
                    is_prod,
                )?,
            },
            models: ModelConfig {
                output_mode: get_env("TRYON_OUTPUT_MODE", Some("text"), is_prod)?.parse()?,
                image_model: get_env(
                    "GENAI_IMAGE_MODEL",
                    Some("gemini-2.0-flash-preview-image-generation"),
                    is_prod,
                )?,
                text_model: get_env("GENAI_TEXT_MODEL", Some("gemini-2.0-flash"), is_prod)?,
            },
            http: HttpConfig {
                max_body_bytes: get_env(
                    "TRYON_MAX_BODY_BYTES",
                    Some(&DEFAULT_MAX_BODY_BYTES.to_string()),
                    is_prod,
                )?
                .parse()
                .map_err(|e| {
                    AppError::ConfigError(anyhow::anyhow!("Invalid TRYON_MAX_BODY_BYTES: {}", e))
                })?,
                allowed_origins: parse_origins(&get_env(
                    "TRYON_ALLOWED_ORIGINS",
                    Some("*"),
                    is_prod,
                )?),
            },
        })
    }

    /// Get the model for the configured output mode.
    pub fn active_model(&self) -> &str {
        match self.models.output_mode {
            OutputMode::Image => &self.models.image_model,
            OutputMode::Text => &self.models.text_model,
        }
    }

    pub fn has_credential(&self) -> bool {
        self.google.api_key.is_some()
    }
}

/// What the provider is asked to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// A generated try-on image, returned to the caller as a data URL.
    Image,
    /// A textual description of the try-on.
    Text,
}

impl OutputMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputMode::Image => "image",
            OutputMode::Text => "text",
        }
    }
}

impl FromStr for OutputMode {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Ok(OutputMode::Image),
            "text" => Ok(OutputMode::Text),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "Invalid TRYON_OUTPUT_MODE '{}': expected 'image' or 'text'",
                other
            ))),
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(str::to_string)
        .collect()
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
