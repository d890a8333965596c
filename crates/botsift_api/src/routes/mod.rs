//! API Routes Module
//!
//! This module organizes all HTTP endpoints into logical groups:
//! - `classify`: Single-email classification and explanation endpoints
//! - `batch`: CSV batch classification endpoint
//! - `health`: Health checks and monitoring endpoints

pub mod batch;
pub mod classify;
pub mod health;

use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Build all API routes and return a configured Router
pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Classification endpoints
        .route("/v1/classify", post(classify::classify_handler))
        .route("/v1/explain", post(classify::explain_handler))
        .route("/v1/batch", post(batch::batch_handler))
        // Health and monitoring endpoints
        .route("/health", get(health::health_handler))
        .route("/ready", get(health::ready_handler))
        .route("/stats", get(health::stats_handler))
        // Apply shared state to all routes
        .with_state(state)
}

/// API version information
#[allow(dead_code)]
pub const API_VERSION: &str = "v1";
