//! Health and monitoring route handlers

use crate::{api_handler::ApiResult, AppState};
use axum::{extract::State, response::Json};
use botsift_core::pipeline::PipelineStats;
use serde::Serialize;
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /ready
///
/// Readiness is equivalent to liveness here; the pipeline is built per
/// request and has no warm-up phase.
pub async fn ready_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Rule-set statistics response
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub pipeline: PipelineStats,
    pub bot_threshold: f64,
    pub enable_syntax_check: bool,
    pub enable_mx_check: bool,
}

/// GET /stats
///
/// Reports the sizes of the detection rule sets and the configured
/// defaults, for monitoring and threshold tuning.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> ApiResult<StatsResponse> {
    let settings = &state.config.detection;
    let pipeline = crate::build_pipeline(&settings.to_detection_config())?;

    Ok(Json(StatsResponse {
        pipeline: pipeline.stats(),
        bot_threshold: settings.bot_threshold,
        enable_syntax_check: settings.enable_syntax_check,
        enable_mx_check: settings.enable_mx_check,
    }))
}
