// src/lib.rs

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod tls;

use crate::handlers::{health_check, ping_handler};
use axum::{
    body::Body,
    http::{HeaderValue, Request as AxumRequest},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::{path::PathBuf, sync::Arc, time::Duration, time::Instant};
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

pub use cli::Overrides;
pub use client::PingClient;
pub use config::AppConfig;
pub use error::{AppError, Result, TransportErrorKind};
pub use state::AppState;
pub use tls::{BundleSource, TrustMode, TrustPolicy};

/// Extra time the inbound request gets on top of the outbound ping timeout.
const INBOUND_TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// Builds the application router: `/health` and `/api/ping`.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/ping", get(ping_handler))
        .with_state(state)
}

/// Tags each request with an `X-Request-ID` and logs it inside a tracing span.
async fn trace_requests(
    mut req: AxumRequest<Body>,
    next: axum::middleware::Next,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let start_time = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let span = info_span!(
        "request",
        request_id = %request_id,
        http.method = %method,
        url.path = %path,
    );

    req.extensions_mut().insert(request_id);

    async move {
        let mut response = next.run(req).await;
        let elapsed = start_time.elapsed();

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert("X-Request-ID", value);
        }

        info!(
            http.response.duration = ?elapsed,
            http.status_code = response.status().as_u16(),
            "Finished processing request"
        );

        response
    }
    .instrument(span)
    .await
}

/// Wraps the router with request tracing and an inbound timeout.
pub fn build_app(state: Arc<AppState>) -> Router {
    let inbound_timeout = state.ping_client.timeout() + INBOUND_TIMEOUT_GRACE;
    create_router(state)
        .layer(TimeoutLayer::new(inbound_timeout))
        .layer(axum::middleware::from_fn(trace_requests))
}

/// Loads the configuration, then builds the state and the router.
///
/// Any startup error (bad configuration, unusable trust bundle) is returned
/// before a listener exists.
pub async fn run(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> std::result::Result<(Router, AppConfig), AppError> {
    info!("Starting ping proxy...");

    let app_config = setup_configuration(config_path_override, overrides)?;
    let app_state = build_application_state(&app_config)?;
    let app = build_app(app_state);

    Ok((app, app_config))
}

/// Resolves the config path: explicit override, then `PING_PROXY_CONFIG`, then `config.yaml`.
pub fn resolve_config_path(config_path_override: Option<PathBuf>) -> PathBuf {
    config_path_override.unwrap_or_else(|| {
        std::env::var("PING_PROXY_CONFIG").map_or_else(|_| PathBuf::from("config.yaml"), PathBuf::from)
    })
}

/// Loads, overrides, validates and logs the application configuration.
pub fn setup_configuration(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<AppConfig> {
    let config_path = resolve_config_path(config_path_override);

    let config_path_display = config_path.display().to_string();
    if config_path.exists() {
        info!(config.path = %config_path_display, "Using configuration file");
    } else {
        info!(config.path = %config_path_display, "Optional configuration file not found. Using defaults and environment variables.");
    }

    let mut app_config = config::load_unvalidated(&config_path).map_err(|e| {
        error!(config.path = %config_path_display, error = ?e, "Failed to load configuration. Exiting.");
        e
    })?;
    apply_overrides(&mut app_config, overrides);

    config::ConfigValidator::validate(&app_config).map_err(|e| {
        error!(
            config.path = %config_path_display,
            error = ?e,
            "Failed to validate configuration. Exiting."
        );
        e
    })?;

    info!(
        upstream.base_url = %app_config.upstream.base_url,
        upstream.ping_path = %app_config.upstream.ping_path,
        tls.mode = %app_config.tls.mode,
        tls.bundle = ?app_config.tls.bundle_path,
        server.port = app_config.server.port,
        "Configuration loaded and validated successfully."
    );

    Ok(app_config)
}

fn apply_overrides(config: &mut AppConfig, overrides: Overrides) {
    if let Some(port) = overrides.port {
        info!("Overriding server port from command line: {}", port);
        config.server.port = port;
    }
    if let Some(mode) = overrides.trust_mode {
        info!("Overriding trust mode from command line: {}", mode);
        config.tls.mode = mode;
    }
    if let Some(bundle) = overrides.bundle {
        info!("Overriding trust bundle from command line: {}", bundle.display());
        config.tls.bundle_path = Some(bundle);
    }
}

/// Builds the shared application state.
pub fn build_application_state(app_config: &AppConfig) -> Result<Arc<AppState>> {
    let app_state = AppState::new(app_config).map_err(|e| {
        error!(error = ?e, "Failed to initialize application state. Exiting.");
        e
    })?;

    info!("Application state initialized successfully.");
    Ok(Arc::new(app_state))
}
