//! Participation registration, lookup and cancellation

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::engine::{Participation, ParticipationStatus, SectorSelection};
use crate::error::{ApiError, ApiResult};
use crate::store::{CancelOutcome, NewParticipation, TourStore};
use crate::AppState;

/// A participation with its sector selections
#[derive(Debug, Serialize)]
pub struct ParticipationDetail {
    pub participation: Participation,
    pub sectors: Vec<SectorSelection>,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub id: Uuid,
    pub outcome: CancelOutcome,
    pub status: ParticipationStatus,
}

/// POST /api/participations
pub async fn create_participation(
    State(state): State<AppState>,
    Json(request): Json<NewParticipation>,
) -> ApiResult<(StatusCode, Json<ParticipationDetail>)> {
    let participation = state.store.insert_participation(&request).await?;
    let sectors = state.store.selections_for(&[participation.id]).await?;

    info!(
        "Participation {} registered for {} on {}",
        participation.id, participation.city, participation.start_date
    );

    Ok((
        StatusCode::CREATED,
        Json(ParticipationDetail {
            participation,
            sectors,
        }),
    ))
}

/// GET /api/participations/:id
pub async fn get_participation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ParticipationDetail>> {
    let participation = state
        .store
        .get_participation(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("participation {}", id)))?;
    let sectors = state.store.selections_for(&[id]).await?;

    Ok(Json(ParticipationDetail {
        participation,
        sectors,
    }))
}

/// POST /api/participations/:id/cancel
///
/// Idempotent: cancelling twice reports `already_cancelled`.
pub async fn cancel_participation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CancelResponse>> {
    let outcome = state.store.cancel_participation(id).await?;

    if outcome == CancelOutcome::Cancelled {
        info!("Participation {} cancelled by user", id);
    }

    Ok(Json(CancelResponse {
        id,
        outcome,
        status: ParticipationStatus::Cancelled,
    }))
}
