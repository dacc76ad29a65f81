//! Fetches the product image the caller points at and turns it into an
//! inline image for the provider request.

use crate::models::InlineImage;
use crate::services::metrics;
use reqwest::{header::CONTENT_TYPE, Client};
use service_core::observability::TracedClientExt;
use std::time::Instant;

/// Error type for product image fetching.
#[derive(Debug, thiserror::Error)]
pub enum ImageFetchError {
    /// Upstream answered with a non-2xx status; carries its status text.
    #[error("Failed to fetch product image: {0}")]
    Status(String),

    #[error("Failed to fetch product image: {0}")]
    Network(#[from] reqwest::Error),
}

impl ImageFetchError {
    fn error_type(&self) -> &'static str {
        match self {
            ImageFetchError::Status(_) => "status",
            ImageFetchError::Network(_) => "network",
        }
    }
}

/// Product image fetcher backed by a shared HTTP client.
#[derive(Clone)]
pub struct ProductImageFetcher {
    client: Client,
}

impl ProductImageFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// GET `url` and base64-encode the body. The MIME type comes from the
    /// response `Content-Type`, defaulting to JPEG.
    pub async fn fetch(
        &self,
        url: &str,
        request_id: Option<&str>,
    ) -> Result<InlineImage, ImageFetchError> {
        let start = Instant::now();
        let result = self.fetch_inner(url, request_id).await;

        match &result {
            Ok(image) => {
                metrics::record_image_fetch("ok", start.elapsed().as_secs_f64());
                tracing::debug!(
                    mime_type = %image.mime_type,
                    bytes = image.decoded_len(),
                    "Fetched product image"
                );
            }
            Err(e) => {
                metrics::record_image_fetch("error", start.elapsed().as_secs_f64());
                metrics::record_image_fetch_error(e.error_type());
            }
        }

        result
    }

    async fn fetch_inner(
        &self,
        url: &str,
        request_id: Option<&str>,
    ) -> Result<InlineImage, ImageFetchError> {
        let response = self
            .client
            .traced_get(url)
            .request_id(request_id)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let status_text = status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.as_str().to_string());
            return Err(ImageFetchError::Status(status_text));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;

        Ok(InlineImage::from_bytes(&bytes, content_type.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_IMAGE_MIME_TYPE;
    use httpmock::prelude::*;

    fn fetcher() -> ProductImageFetcher {
        ProductImageFetcher::new(Client::new())
    }

    #[tokio::test]
    async fn fetches_and_encodes_image() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/dress.png")
                    .header("x-request-id", "req-7");
                then.status(200)
                    .header("content-type", "image/png")
                    .body(b"\x89PNG");
            })
            .await;

        let image = fetcher()
            .fetch(&server.url("/dress.png"), Some("req-7"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw==");
    }

    #[tokio::test]
    async fn missing_content_type_defaults_to_jpeg() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/shirt");
                then.status(200).body(b"\xff\xd8\xff");
            })
            .await;

        let image = fetcher().fetch(&server.url("/shirt"), None).await.unwrap();

        assert_eq!(image.mime_type, DEFAULT_IMAGE_MIME_TYPE);
        assert_eq!(image.data, "/9j/");
    }

    #[tokio::test]
    async fn non_success_status_carries_status_text() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/gone.jpg");
                then.status(404);
            })
            .await;

        let err = fetcher()
            .fetch(&server.url("/gone.jpg"), None)
            .await
            .unwrap_err();

        match err {
            ImageFetchError::Status(text) => assert_eq!(text, "Not Found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is not listening in test environments.
        let err = fetcher()
            .fetch("http://127.0.0.1:9/product.jpg", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ImageFetchError::Network(_)));
    }
}
