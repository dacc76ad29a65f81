//! Domain models for the try-on service.

pub mod image;
pub mod try_on;

pub use image::{InlineImage, DEFAULT_IMAGE_MIME_TYPE};
pub use try_on::{TryOnInput, TryOnOutcome, TryOnRequest};
