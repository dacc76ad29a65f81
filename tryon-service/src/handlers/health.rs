use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use service_core::error::AppError;

/// Liveness probe. Reports whether a provider credential is configured but
/// stays 200 either way.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "tryon-service",
        "version": env!("CARGO_PKG_VERSION"),
        "provider": state.try_on.provider_name(),
        "provider_configured": state.try_on.is_configured(),
    }))
}

/// Readiness probe: not ready until a provider credential is configured.
pub async fn readiness_check(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    if state.try_on.is_configured() {
        Ok(StatusCode::OK)
    } else {
        tracing::warn!("Readiness check failed - provider credential missing");
        Err(AppError::ServiceUnavailable)
    }
}

/// Metrics endpoint for Prometheus scraping.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        get_metrics(),
    )
}
