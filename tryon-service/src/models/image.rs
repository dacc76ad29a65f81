//! Inline image payloads: base64 data tagged with a MIME type.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// MIME type assumed when neither a data URL nor a response header says otherwise.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Image embedded directly in a provider request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 (standard alphabet) encoded bytes.
    pub data: String,
}

impl InlineImage {
    /// Encode raw bytes. `content_type` may carry parameters
    /// (`image/png; charset=binary`), which are dropped.
    pub fn from_bytes(bytes: &[u8], content_type: Option<&str>) -> Self {
        Self {
            mime_type: normalize_mime(content_type),
            data: STANDARD.encode(bytes),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL, or take the input as raw
    /// base64 with the default MIME type.
    ///
    /// Returns `None` for a data URL that is not base64 encoded or has an
    /// empty payload.
    pub fn from_data_url_or_base64(input: &str) -> Option<Self> {
        let input = input.trim();

        let Some(rest) = input.strip_prefix("data:") else {
            return Some(Self {
                mime_type: DEFAULT_IMAGE_MIME_TYPE.to_string(),
                data: input.to_string(),
            });
        };

        let (meta, payload) = rest.split_once(',')?;
        let mime = meta.strip_suffix(";base64")?;
        if payload.is_empty() {
            return None;
        }

        Some(Self {
            mime_type: normalize_mime(Some(mime)),
            data: payload.to_string(),
        })
    }

    /// Render as a `data:` URL suitable for an `<img src>`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Approximate decoded size, for logging.
    pub fn decoded_len(&self) -> usize {
        self.data.len() / 4 * 3
    }
}

fn normalize_mime(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME_TYPE)
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_url() {
        let image = InlineImage::from_data_url_or_base64("data:image/png;base64,iVBORw0KGgo=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw0KGgo=");
    }

    #[test]
    fn raw_base64_defaults_to_jpeg() {
        let image = InlineImage::from_data_url_or_base64("/9j/4AAQSkZJRg==").unwrap();
        assert_eq!(image.mime_type, DEFAULT_IMAGE_MIME_TYPE);
        assert_eq!(image.data, "/9j/4AAQSkZJRg==");
    }

    #[test]
    fn data_url_without_mime_defaults_to_jpeg() {
        let image = InlineImage::from_data_url_or_base64("data:;base64,AAAA").unwrap();
        assert_eq!(image.mime_type, DEFAULT_IMAGE_MIME_TYPE);
    }

    #[test]
    fn rejects_non_base64_data_url() {
        assert!(InlineImage::from_data_url_or_base64("data:text/plain,hello").is_none());
        assert!(InlineImage::from_data_url_or_base64("data:image/png;base64,").is_none());
        assert!(InlineImage::from_data_url_or_base64("data:image/png;base64").is_none());
    }

    #[test]
    fn from_bytes_strips_content_type_parameters() {
        let image = InlineImage::from_bytes(b"\x89PNG", Some("Image/PNG; charset=binary"));
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "iVBORw==");
    }

    #[test]
    fn from_bytes_defaults_mime_type() {
        assert_eq!(
            InlineImage::from_bytes(b"abc", None).mime_type,
            DEFAULT_IMAGE_MIME_TYPE
        );
        assert_eq!(
            InlineImage::from_bytes(b"abc", Some("  ")).mime_type,
            DEFAULT_IMAGE_MIME_TYPE
        );
    }

    #[test]
    fn renders_data_url() {
        let image = InlineImage {
            mime_type: "image/webp".to_string(),
            data: "UklGRg==".to_string(),
        };
        assert_eq!(image.to_data_url(), "data:image/webp;base64,UklGRg==");
    }
}
