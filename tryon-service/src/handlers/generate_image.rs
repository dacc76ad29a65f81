use crate::models::{TryOnOutcome, TryOnRequest};
use crate::services::metrics;
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use service_core::error::AppError;
use service_core::observability::extract_request_id;

/// `POST /api/generateImage`
#[tracing::instrument(
    skip_all,
    fields(
        request_id = tracing::field::Empty,
        output_mode = tracing::field::Empty,
        model = tracing::field::Empty,
    )
)]
pub async fn generate_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<TryOnRequest>, JsonRejection>,
) -> Result<TryOnOutcome, AppError> {
    let span = tracing::Span::current();
    span.record("output_mode", state.try_on.output_mode().as_str());
    span.record("model", state.try_on.model());

    let request_id = extract_request_id(&headers);
    if let Some(id) = &request_id {
        span.record("request_id", id.as_str());
    }

    let Json(request) = payload.map_err(|rejection| {
        tracing::warn!(error = %rejection, "Rejected unreadable try-on request body");
        metrics::record_request("bad_request");
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(anyhow::anyhow!("Invalid request body"))
        }
    })?;

    let input = request.into_input().map_err(|missing| {
        tracing::warn!(missing = ?missing, "Rejected try-on request with missing fields");
        metrics::record_request("bad_request");
        AppError::BadRequest(anyhow::anyhow!(
            "Missing required fields: {}",
            missing.join(", ")
        ))
    })?;

    tracing::info!("Try-on request started");

    match state.try_on.run(input, request_id.as_deref()).await {
        Ok(outcome) => {
            metrics::record_request("success");
            tracing::info!(result = outcome.kind(), "Try-on request completed");
            Ok(outcome)
        }
        Err(e) => {
            metrics::record_request("error");
            tracing::error!(error = %e, kind = e.kind(), "Try-on request failed");
            Err(e.into())
        }
    }
}

/// Any method other than POST on the try-on route.
pub async fn method_not_allowed() -> AppError {
    metrics::record_request("method_not_allowed");
    AppError::MethodNotAllowed { allow: "POST" }
}

pub async fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Not found"))
}
