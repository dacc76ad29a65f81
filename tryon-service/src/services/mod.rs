pub mod image_fetcher;
pub mod metrics;
pub mod providers;
pub mod try_on;

pub use image_fetcher::{ImageFetchError, ProductImageFetcher};
pub use try_on::{TryOnError, TryOnService};
