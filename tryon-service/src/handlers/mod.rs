//! HTTP handlers for the try-on service.

pub mod generate_image;
pub mod health;

pub use generate_image::{generate_image, method_not_allowed, not_found};
pub use health::{health_check, metrics_handler, readiness_check};
