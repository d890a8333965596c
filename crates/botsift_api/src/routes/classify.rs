//! Single-email classification route handlers

use crate::api_handler::{
    convert_verdict, ApiResult, ClassifyRequest, ClassifyResponse, ExplainResponse,
};
use crate::AppState;
use axum::{extract::State, response::Json};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// POST /v1/classify
///
/// Classifies one email address: verification status plus the bot
/// decision. An optional `bot_threshold` in the body overrides the
/// configured threshold for this request only.
#[instrument(skip(state, request), fields(request_id))]
pub async fn classify_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> ApiResult<ClassifyResponse> {
    let request_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("request_id", &request_id);

    let pipeline = crate::pipeline_for_request(&state, request.bot_threshold)?;
    let verdict = pipeline
        .explain(
            &request.email,
            request.first_name.as_deref(),
            request.last_name.as_deref(),
        )
        .await;

    info!(
        "Classified email: status={}, is_bot={}",
        verdict.email_status, verdict.is_bot
    );

    Ok(Json(convert_verdict(verdict, request_id)))
}

/// POST /v1/explain
///
/// Verbose form of `/v1/classify`: returns the full verdict with the
/// per-feature breakdown for diagnostics and threshold tuning.
#[instrument(skip(state, request), fields(request_id))]
pub async fn explain_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ClassifyRequest>,
) -> ApiResult<ExplainResponse> {
    let request_id = Uuid::new_v4().to_string();
    tracing::Span::current().record("request_id", &request_id);

    let pipeline = crate::pipeline_for_request(&state, request.bot_threshold)?;
    let verdict = pipeline
        .explain(
            &request.email,
            request.first_name.as_deref(),
            request.last_name.as_deref(),
        )
        .await;

    info!(
        "Explained email: status={}, score={:.2}, is_bot={}",
        verdict.email_status, verdict.score, verdict.is_bot
    );

    Ok(Json(ExplainResponse {
        request_id,
        verdict,
        checked_at: chrono::Utc::now().to_rfc3339(),
    }))
}
