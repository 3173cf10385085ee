//! User dashboard with projected tour statuses

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use uuid::Uuid;

use super::{evaluation_date, DateQuery};
use crate::engine::{
    project, Participation, ParticipationStatus, ProjectionPhase, SectorResult, TourKey,
    TourProjection,
};
use crate::error::ApiResult;
use crate::store::TourStore;
use crate::AppState;

/// One row of a user's dashboard
#[derive(Debug, Serialize)]
pub struct DashboardEntry {
    pub participation: Participation,
    /// Status to show; may differ from the stored one before commitment
    pub displayed_status: ParticipationStatus,
    /// `None` for cancelled participations
    pub phase: Option<ProjectionPhase>,
    /// Participant counts of the whole tour, by sector
    pub tour_sectors: Vec<SectorResult>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user_id: String,
    pub evaluation_date: NaiveDate,
    pub participations: Vec<DashboardEntry>,
}

/// GET /api/users/:user_id/dashboard
///
/// Read-only: nothing is written, whatever the projection shows.
pub async fn get_user_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<DashboardResponse>> {
    let date = evaluation_date(query.date.as_deref())?;
    let mine = state.store.participations_for_user(&user_id).await?;

    let tours: Vec<TourKey> = mine
        .iter()
        .filter(|p| p.status != ParticipationStatus::Cancelled)
        .map(Participation::tour_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let peers = state.store.active_participations_for_tours(&tours).await?;
    let ids: Vec<Uuid> = peers.iter().map(|p| p.id).collect();
    let selections = state.store.selections_for(&ids).await?;

    let projections: HashMap<TourKey, TourProjection> = project(&peers, &selections, date)
        .into_iter()
        .map(|projection| (projection.key.clone(), projection))
        .collect();

    let participations = mine
        .into_iter()
        .map(|participation| dashboard_entry(participation, &projections))
        .collect();

    Ok(Json(DashboardResponse {
        user_id,
        evaluation_date: date,
        participations,
    }))
}

fn dashboard_entry(
    participation: Participation,
    projections: &HashMap<TourKey, TourProjection>,
) -> DashboardEntry {
    if participation.status == ParticipationStatus::Cancelled {
        return DashboardEntry {
            displayed_status: ParticipationStatus::Cancelled,
            phase: None,
            tour_sectors: Vec::new(),
            participation,
        };
    }

    match projections.get(&participation.tour_key()) {
        Some(projection) => DashboardEntry {
            displayed_status: projection
                .displayed_status(&participation.id)
                .unwrap_or(participation.status),
            phase: Some(projection.phase),
            tour_sectors: projection.sectors.clone(),
            participation,
        },
        // Cancelled between the two reads
        None => DashboardEntry {
            displayed_status: participation.status,
            phase: None,
            tour_sectors: Vec::new(),
            participation,
        },
    }
}
