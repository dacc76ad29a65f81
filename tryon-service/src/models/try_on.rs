use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Wire field names, in the order they are reported when missing.
const REQUIRED_FIELDS: [(&str, &str); 3] = [
    ("user_photo", "userPhoto"),
    ("product_image", "productImage"),
    ("prompt", "prompt"),
];

/// Inbound `POST /api/generateImage` body.
///
/// Fields are optional at the serde level so that a missing key, `null`
/// and `""` are all reported the same way by [`TryOnRequest::into_input`].
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TryOnRequest {
    /// Data URL or raw base64 of the person's photo.
    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub user_photo: Option<String>,

    /// URL of the product image to fetch.
    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub product_image: Option<String>,

    #[serde(default)]
    #[validate(required, length(min = 1))]
    pub prompt: Option<String>,
}

impl TryOnRequest {
    /// Wire names of every missing or empty field.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let Err(errors) = self.validate() else {
            return Vec::new();
        };
        let field_errors = errors.field_errors();

        REQUIRED_FIELDS
            .iter()
            .filter(|(field, _)| field_errors.contains_key(*field))
            .map(|(_, wire)| *wire)
            .collect()
    }

    /// Validate and unwrap into a [`TryOnInput`], or return the wire names
    /// of the missing fields.
    pub fn into_input(self) -> Result<TryOnInput, Vec<&'static str>> {
        let missing = self.missing_fields();
        match (self.user_photo, self.product_image, self.prompt) {
            (Some(user_photo), Some(product_image), Some(prompt)) if missing.is_empty() => {
                Ok(TryOnInput {
                    user_photo,
                    product_image,
                    prompt,
                })
            }
            _ => Err(missing),
        }
    }
}

/// A request that passed field validation.
#[derive(Debug, Clone)]
pub struct TryOnInput {
    pub user_photo: String,
    pub product_image: String,
    pub prompt: String,
}

/// Successful try-on result. The variant is fixed by the configured output
/// mode, not by what the provider happened to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryOnOutcome {
    /// Generated image, as a URL the client can render directly.
    Image(String),
    /// Textual description of how the product would look.
    Description(String),
}

/// Message accompanying a text description.
pub const DESCRIPTION_MESSAGE: &str =
    "Image generation is not available; returning a description of the try-on instead";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedImageResponse {
    pub generated_image_url: String,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
    pub message: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl TryOnOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            TryOnOutcome::Image(_) => "image",
            TryOnOutcome::Description(_) => "text_description",
        }
    }
}

impl IntoResponse for TryOnOutcome {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match self {
            TryOnOutcome::Image(url) => Json(GeneratedImageResponse {
                generated_image_url: url,
            })
            .into_response(),
            TryOnOutcome::Description(description) => Json(DescriptionResponse {
                description,
                message: DESCRIPTION_MESSAGE,
                kind,
            })
            .into_response(),
        }
    }
}
