//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::AppState;

/// Liveness plus the state of the validation batch
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub validation_enabled: bool,
    /// Start time of the most recent batch in this process
    pub last_batch_at: Option<DateTime<Utc>>,
    pub last_evaluation_date: Option<NaiveDate>,
    /// Tours whose write failed in the most recent batch
    pub last_batch_failures: usize,
}

/// GET /health
///
/// Does NOT require authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let latest = state.validation.latest().await;

    Json(HealthResponse {
        status: "ok",
        module: "flyer-tours",
        version: env!("CARGO_PKG_VERSION"),
        validation_enabled: state.validation.schedule().enabled,
        last_batch_at: latest.as_ref().map(|s| s.started_at),
        last_evaluation_date: latest.as_ref().map(|s| s.evaluation_date),
        last_batch_failures: latest.map_or(0, |s| s.tours_failed),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
