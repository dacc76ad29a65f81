//! Application startup and lifecycle management.

use crate::config::TryOnConfig;
use crate::handlers::{
    generate_image, health_check, method_not_allowed, metrics_handler, not_found,
    readiness_check,
};
use crate::services::metrics::init_metrics;
use crate::services::providers::gemini::{GeminiConfig, GeminiTryOnProvider};
use crate::services::providers::TryOnProvider;
use crate::services::{ProductImageFetcher, TryOnService};
use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{request_id_middleware, security_headers_middleware};
use service_core::observability::REQUEST_ID_HEADER;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceExt;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TryOnConfig>,
    pub try_on: TryOnService,
}

impl AppState {
    /// Wire the Gemini provider from configuration.
    pub fn from_config(config: TryOnConfig) -> Result<Self, AppError> {
        let client = build_http_client()?;

        let provider: Arc<dyn TryOnProvider> = Arc::new(GeminiTryOnProvider::new(
            GeminiConfig {
                api_base_url: config.google.api_base_url.clone(),
                image_model: config.models.image_model.clone(),
                text_model: config.models.text_model.clone(),
            },
            client.clone(),
        ));

        tracing::info!(
            model = %config.active_model(),
            output_mode = config.models.output_mode.as_str(),
            credential_configured = config.has_credential(),
            "Initialized Gemini try-on provider"
        );

        Ok(Self::with_provider(config, provider, client))
    }

    /// Build state around an arbitrary provider.
    pub fn with_provider(
        config: TryOnConfig,
        provider: Arc<dyn TryOnProvider>,
        client: reqwest::Client,
    ) -> Self {
        let try_on = TryOnService::new(
            config.google.api_key.clone(),
            config.models.output_mode,
            ProductImageFetcher::new(client),
            provider,
        );

        Self {
            config: Arc::new(config),
            try_on,
        }
    }
}

fn build_http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(concat!("tryon-service/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create HTTP client");
            AppError::InternalError(anyhow::Error::new(e))
        })
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let layer = CorsLayer::new()
        .allow_methods([Method::POST])
        .allow_headers([header::CONTENT_TYPE, request_id.clone()])
        .expose_headers([request_id]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// A CORS preflight carries both `Origin` and `Access-Control-Request-Method`.
fn is_preflight(req: &Request) -> bool {
    req.method() == Method::OPTIONS
        && req.headers().contains_key(header::ORIGIN)
        && req
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

/// Route bare `OPTIONS` requests around the CORS layer so they reach the
/// method check like any other non-POST method.
async fn cors_gate(State(routes): State<Router>, req: Request, next: Next) -> Response {
    if req.method() == Method::OPTIONS && !is_preflight(&req) {
        return routes.oneshot(req).await.into_response();
    }
    next.run(req).await
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    let max_body_bytes = state.config.http.max_body_bytes;
    let cors = cors_layer(&state.config.http.allowed_origins);

    let routes = Router::new()
        .route(
            "/api/generateImage",
            post(generate_image)
                .fallback(method_not_allowed)
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .with_state(state);

    routes
        .clone()
        .layer(cors)
        .layer(middleware::from_fn_with_state(routes, cors_gate))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: TryOnConfig) -> Result<Self, AppError> {
        let state = AppState::from_config(config)?;
        Self::build_with_state(state).await
    }

    /// Build the application around prepared state (e.g. a mock provider).
    pub async fn build_with_state(state: AppState) -> Result<Self, AppError> {
        init_metrics();

        // Port 0 = random port for testing
        let addr = SocketAddr::from(([0, 0, 0, 0], state.config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Try-on service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router: build_router(state),
        })
    }

    /// Get the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                tracing::error!("HTTP server error: {}", e);
                e
            })
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
