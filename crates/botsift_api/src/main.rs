//! Bot Email Classification API Server
//!
//! HTTP API over the botsift detection engine: single-email
//! classification, verbose explanations, and CSV batch uploads,
//! built with axum and tokio.

use axum::Router;
use botsift_core::{DetectionConfig, DetectionPipeline};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api_handler;
mod config;
mod routes;

use api_handler::ApiError;
use config::AppConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = load_config()?;

    // Initialize tracing/logging
    init_tracing(&config)?;

    info!(
        "Starting Bot Email Classification API v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration loaded: {}", config.server.host);

    // Fail fast on detection settings the engine would reject per request.
    let detection_config = config.detection.to_detection_config();
    let pipeline = DetectionPipeline::new(detection_config)
        .map_err(|e| format!("Invalid detection configuration: {}", e))?;

    let stats = pipeline.stats();
    info!(
        "Detection rules loaded - {} disposable domains, {} bot keywords, {} role prefixes",
        stats.disposable_domains_count, stats.bot_keywords_count, stats.role_prefixes_count
    );

    // Create shared application state
    let app_state = AppState {
        config: Arc::new(config.clone()),
    };

    // Build the router
    let app = create_router(app_state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);
    info!("Classification API: http://{}/v1/classify", addr);
    info!("Batch upload API: http://{}/v1/batch", addr);

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

/// Build a detection pipeline, mapping engine config errors to API errors.
pub(crate) fn build_pipeline(config: &DetectionConfig) -> Result<DetectionPipeline, ApiError> {
    DetectionPipeline::new(config.clone()).map_err(ApiError::from)
}

/// Build the pipeline for one request: the configured defaults plus an
/// optional per-request threshold override.
pub(crate) fn pipeline_for_request(
    state: &AppState,
    bot_threshold: Option<f64>,
) -> Result<DetectionPipeline, ApiError> {
    let mut config = state.config.detection.to_detection_config();
    if let Some(threshold) = bot_threshold {
        config.bot_threshold = threshold;
    }
    build_pipeline(&config)
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // Use the routes module to build all routes
    let mut router = routes::build_routes(Arc::new(state));

    // Add middleware layers
    router = router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers(tower_http::cors::Any),
        )
        .layer(CompressionLayer::new());

    router
}

/// Load application configuration from environment and files
fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    // Start with a base configuration using defaults
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    // Try to load config file if it exists (optional)
    if std::path::Path::new("Config.toml").exists() {
        figment = figment.merge(Toml::file("Config.toml"));
    }

    // Override with environment variables
    figment = figment.merge(Env::prefixed("BOTSIFT_").split("_"));

    let config: AppConfig = figment.extract()?;

    Ok(config)
}

/// Initialize tracing and logging
fn init_tracing(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={}",
            env!("CARGO_PKG_NAME").replace('-', "_"),
            config.observability.log_level
        )
        .into()
    });

    if config.observability.json_logs {
        // JSON format for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable format for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn threshold_override_applies() {
        let state = AppState {
            config: Arc::new(AppConfig::default()),
        };
        let pipeline = pipeline_for_request(&state, Some(0.5)).unwrap();
        assert_eq!(pipeline.config().bot_threshold, 0.5);
    }

    #[tokio::test]
    async fn bad_threshold_override_is_rejected() {
        let state = AppState {
            config: Arc::new(AppConfig::default()),
        };
        assert!(pipeline_for_request(&state, Some(f64::NAN)).is_err());
    }
}
