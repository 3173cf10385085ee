//! Validation batch runner
//!
//! Orchestrates one commit pass: read active participations, pick the
//! tours inside their commit window, then for each tour read its sector
//! selections, classify, and write the status. Each tour is isolated; a
//! failing read or write is logged, counted and skipped.

use chrono::{DateTime, NaiveDate, Utc};
use flyer_common::{time, Result};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::engine::{
    decide, select_eligible, EligibleTour, ParticipationStatus, SectorResult, SkipReason,
    SkippedTour,
};
use crate::store::TourStore;

/// Outcome of one validated tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourReport {
    pub city: String,
    pub start_date: String,
    pub status: ParticipationStatus,
    /// Rows actually changed by the write
    pub participations_updated: u64,
    pub sectors: Vec<SectorResult>,
}

/// A tour whose read or write failed in this pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourFailure {
    pub city: String,
    pub start_date: String,
    pub error: String,
}

/// Summary of one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub evaluation_date: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub tours_validated: usize,
    pub tours_failed: usize,
    pub tours_skipped: usize,
    pub tours: Vec<TourReport>,
    pub failures: Vec<TourFailure>,
    /// Tours skipped because their start date could not be parsed
    pub unparsable: Vec<SkippedTour>,
}

/// Run one commit pass against `store` for `evaluation_date`.
///
/// Only a failure to list the active participations is returned as an
/// error; everything after that is reported in the summary.
pub async fn run_validation<S>(store: &S, evaluation_date: NaiveDate) -> Result<BatchSummary>
where
    S: TourStore + ?Sized,
{
    let started_at = time::now();
    info!("Starting tour validation for {}", evaluation_date);

    let participations = store.active_participations().await?;
    let (eligible, skipped) = select_eligible(&participations, evaluation_date);

    let mut tours = Vec::with_capacity(eligible.len());
    let mut failures = Vec::new();

    for tour in &eligible {
        match validate_tour(store, tour).await {
            Ok(report) => {
                info!(
                    "Tour {} validated: {} ({} participations updated)",
                    tour.key, report.status, report.participations_updated
                );
                tours.push(report);
            }
            Err(e) => {
                error!("Tour {} skipped after store failure: {}", tour.key, e);
                failures.push(TourFailure {
                    city: tour.key.city.clone(),
                    start_date: tour.key.start_date.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    let unparsable: Vec<SkippedTour> = skipped
        .iter()
        .filter(|s| matches!(s.reason, SkipReason::UnparsableDate { .. }))
        .cloned()
        .collect();
    if !unparsable.is_empty() {
        warn!("{} tours skipped with unparsable start dates", unparsable.len());
    }

    let summary = BatchSummary {
        evaluation_date,
        started_at,
        tours_validated: tours.len(),
        tours_failed: failures.len(),
        tours_skipped: skipped.len(),
        tours,
        failures,
        unparsable,
    };

    info!(
        "Tour validation finished: {} validated, {} failed, {} skipped",
        summary.tours_validated, summary.tours_failed, summary.tours_skipped
    );

    Ok(summary)
}

async fn validate_tour<S>(store: &S, tour: &EligibleTour) -> Result<TourReport>
where
    S: TourStore + ?Sized,
{
    let selections = store.selections_for(&tour.participation_ids).await?;
    let decision = decide(tour, &selections);
    let updated = store
        .set_status(&decision.participation_ids, decision.status)
        .await?;

    Ok(TourReport {
        city: decision.key.city,
        start_date: decision.key.start_date,
        status: decision.status,
        participations_updated: updated,
        sectors: decision.sectors,
    })
}
