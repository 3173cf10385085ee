//! Tour listing by city

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::evaluation_date;
use crate::engine::{project, ParticipationStatus, ProjectionPhase, SectorResult, TourProjection};
use crate::error::ApiResult;
use crate::store::TourStore;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ToursQuery {
    pub city: Option<String>,
    pub date: Option<String>,
}

/// Public view of a tour; participant identities are not exposed
#[derive(Debug, Serialize)]
pub struct TourSummary {
    pub city: String,
    pub start_date: String,
    pub phase: ProjectionPhase,
    pub participants: usize,
    /// Displayed tour-level status when one applies to every participant
    pub status: Option<ParticipationStatus>,
    pub sectors: Vec<SectorResult>,
}

#[derive(Debug, Serialize)]
pub struct ToursResponse {
    pub evaluation_date: NaiveDate,
    pub tours: Vec<TourSummary>,
}

/// GET /api/tours?city=...&date=...
pub async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<ToursQuery>,
) -> ApiResult<Json<ToursResponse>> {
    let date = evaluation_date(query.date.as_deref())?;
    let participations = state
        .store
        .active_participations_in_city(query.city.as_deref())
        .await?;
    let ids: Vec<Uuid> = participations.iter().map(|p| p.id).collect();
    let selections = state.store.selections_for(&ids).await?;

    let tours = project(&participations, &selections, date)
        .into_iter()
        .map(tour_summary)
        .collect();

    Ok(Json(ToursResponse {
        evaluation_date: date,
        tours,
    }))
}

/// GET /api/cities
pub async fn list_cities(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.store.list_cities().await?))
}

fn tour_summary(projection: TourProjection) -> TourSummary {
    let mut statuses = projection.displayed.values();
    let first = statuses.next().copied();
    let uniform = first.filter(|status| statuses.all(|s| s == status));

    TourSummary {
        city: projection.key.city,
        start_date: projection.key.start_date,
        phase: projection.phase,
        participants: projection.displayed.len(),
        status: uniform,
        sectors: projection.sectors,
    }
}
