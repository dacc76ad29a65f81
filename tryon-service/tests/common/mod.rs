#![allow(dead_code)]

use httpmock::prelude::*;
use httpmock::Mock;
use secrecy::Secret;
use serde_json::json;
use service_core::config::Config as CoreConfig;
use tryon_service::config::{GoogleConfig, HttpConfig, ModelConfig, OutputMode, TryOnConfig};
use tryon_service::startup::Application;

pub const TEST_API_KEY: &str = "test-api-key";
pub const TEXT_MODEL: &str = "test-text-model";
pub const IMAGE_MODEL: &str = "test-image-model";
pub const USER_PHOTO: &str = "data:image/png;base64,VVNFUg==";
pub const PRODUCT_PATH: &str = "/products/dress.jpg";
pub const PROMPT: &str = "Show how this dress would look on the person";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    /// Stands in for both the product image host and the Gemini API.
    pub upstream: MockServer,
    pub client: reqwest::Client,
}

pub struct TestOptions {
    pub api_key: Option<&'static str>,
    pub output_mode: OutputMode,
    pub max_body_bytes: usize,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            api_key: Some(TEST_API_KEY),
            output_mode: OutputMode::Text,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        let upstream = MockServer::start_async().await;

        let config = TryOnConfig {
            common: CoreConfig {
                port: 0, // Random port for testing
                ..CoreConfig::default()
            },
            google: GoogleConfig {
                api_key: options.api_key.map(|key| Secret::new(key.to_string())),
                api_base_url: upstream.base_url(),
            },
            models: ModelConfig {
                output_mode: options.output_mode,
                image_model: IMAGE_MODEL.to_string(),
                text_model: TEXT_MODEL.to_string(),
            },
            http: HttpConfig {
                max_body_bytes: options.max_body_bytes,
                allowed_origins: Vec::new(),
            },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            upstream,
            client,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/generateImage", self.address)
    }

    pub fn product_url(&self) -> String {
        self.upstream.url(PRODUCT_PATH)
    }

    /// A complete, valid request body.
    pub fn valid_body(&self) -> serde_json::Value {
        json!({
            "userPhoto": USER_PHOTO,
            "productImage": self.product_url(),
            "prompt": PROMPT,
        })
    }

    pub async fn post_generate(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.endpoint())
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn mock_product_image(&self) -> Mock<'_> {
        self.upstream
            .mock_async(|when, then| {
                when.method(GET).path(PRODUCT_PATH);
                then.status(200)
                    .header("content-type", "image/jpeg")
                    .body(b"PRODUCT");
            })
            .await
    }

    pub async fn mock_product_status(&self, status: u16) -> Mock<'_> {
        self.upstream
            .mock_async(|when, then| {
                when.method(GET).path(PRODUCT_PATH);
                then.status(status);
            })
            .await
    }

    /// Mock `generateContent` for `model`, answering with `response`.
    pub async fn mock_gemini(&self, model: &str, response: serde_json::Value) -> Mock<'_> {
        let path = format!("/models/{}:generateContent", model);
        self.upstream
            .mock_async(|when, then| {
                when.method(POST).path(path);
                then.status(200).json_body(response);
            })
            .await
    }

    pub async fn mock_gemini_status(&self, model: &str, status: u16) -> Mock<'_> {
        let path = format!("/models/{}:generateContent", model);
        self.upstream
            .mock_async(|when, then| {
                when.method(POST).path(path);
                then.status(status)
                    .json_body(json!({ "error": { "message": "upstream failure" } }));
            })
            .await
    }
}

pub fn text_candidate(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

pub fn image_candidate(mime_type: &str, data: &str) -> serde_json::Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [
                { "inlineData": { "mimeType": mime_type, "data": data } }
            ]},
            "finishReason": "STOP"
        }]
    })
}
