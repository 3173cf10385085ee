//! Validation batch trigger and history

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::evaluation_date;
use crate::error::{ApiError, ApiResult};
use crate::runner::BatchSummary;
use crate::AppState;

/// Optional body of a batch trigger
#[derive(Debug, Default, Deserialize)]
pub struct RunRequest {
    /// Evaluation date override, `YYYY-MM-DD`; defaults to today
    #[serde(default)]
    pub date: Option<String>,
}

/// POST /api/validation/run
///
/// Runs one commit pass and returns its summary. Waits if a scheduled
/// batch is already running. An empty body means "today"; any other body
/// must be a JSON `RunRequest`.
pub async fn run_validation_batch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<BatchSummary>> {
    let request = parse_run_request(&headers, &body)?;
    let date = evaluation_date(request.date.as_deref())?;

    info!("Validation batch triggered over HTTP for {}", date);
    let summary = state.validation.run_now(date).await?;

    Ok(Json(summary))
}

fn parse_run_request(headers: &HeaderMap, body: &[u8]) -> ApiResult<RunRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RunRequest::default());
    }

    if !is_json_content_type(headers) {
        return Err(ApiError::BadRequest(
            "request body requires Content-Type: application/json".to_string(),
        ));
    }

    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("invalid run request: {}", e)))
}

fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || (essence.len() > 5
            && essence.starts_with("application/")
            && essence[essence.len() - 5..].eq_ignore_ascii_case("+json"))
}

/// GET /api/validation/history
pub async fn get_validation_history(State(state): State<AppState>) -> Json<Vec<BatchSummary>> {
    Json(state.validation.history().await)
}
