//! Batch commit planning
//!
//! Decides which tours are inside their commit window on the evaluation
//! date and what status each of them receives. Produces writes as data;
//! applying them is the runner's job.

use chrono::NaiveDate;
use flyer_common::tour_date::{parse_tour_date, TourDate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

use super::classify::{classify_tour, SectorResult};
use super::grouping::{group_by_tour, sector_counts};
use super::model::{Participation, ParticipationStatus, SectorSelection, TourKey};
use super::window::{commit_date, days_since_commit, COMMIT_GRACE_DAYS};

/// A tour whose commit window contains the evaluation date
#[derive(Debug, Clone, PartialEq)]
pub struct EligibleTour {
    pub key: TourKey,
    pub start: TourDate,
    pub participation_ids: Vec<Uuid>,
}

/// Why a tour received no decision in this pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Start date did not parse; carries the offending string
    UnparsableDate { raw: String },
    /// Evaluation date is before the commit date or past the grace day
    OutsideWindow { days_since_commit: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTour {
    pub key: TourKey,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Status to write to every participation of one tour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourDecision {
    pub key: TourKey,
    pub participation_ids: Vec<Uuid>,
    pub status: ParticipationStatus,
    pub sectors: Vec<SectorResult>,
}

/// Full result of planning a commit pass over in-memory data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPlan {
    pub decisions: Vec<TourDecision>,
    pub skipped: Vec<SkippedTour>,
}

/// Calendar start date of a tour, or `None` when the raw string is unusable.
///
/// A date whose commit date cannot be represented counts as unusable.
pub(crate) fn parse_start(raw: &str) -> Option<(TourDate, NaiveDate)> {
    let tour_date = parse_tour_date(raw)?;
    let calendar = calendar_start(&tour_date)?;
    Some((tour_date, calendar))
}

fn calendar_start(tour_date: &TourDate) -> Option<NaiveDate> {
    let calendar = tour_date.to_naive_date()?;
    commit_date(calendar)?;
    Some(calendar)
}

/// Split tours into those eligible for commitment and those skipped.
pub fn select_eligible(
    participations: &[Participation],
    evaluation_date: NaiveDate,
) -> (Vec<EligibleTour>, Vec<SkippedTour>) {
    let mut eligible = Vec::new();
    let mut skipped = Vec::new();

    for (key, members) in group_by_tour(participations) {
        let parsed = parse_start(&key.start_date).and_then(|(start, start_day)| {
            days_since_commit(start_day, evaluation_date).map(|days| (start, days))
        });
        let Some((start, days)) = parsed else {
            warn!(
                "Skipping tour in {}: unparsable start date '{}'",
                key.city, key.start_date
            );
            skipped.push(SkippedTour {
                reason: SkipReason::UnparsableDate {
                    raw: key.start_date.clone(),
                },
                key,
            });
            continue;
        };

        if !(0..=COMMIT_GRACE_DAYS).contains(&days) {
            debug!("Tour {} outside commit window ({} days since commit date)", key, days);
            skipped.push(SkippedTour {
                key,
                reason: SkipReason::OutsideWindow {
                    days_since_commit: days,
                },
            });
            continue;
        }

        eligible.push(EligibleTour {
            key,
            start,
            participation_ids: members.iter().map(|p| p.id).collect(),
        });
    }

    (eligible, skipped)
}

/// Classify one eligible tour from its sector selections.
///
/// Selections belonging to other tours are ignored.
pub fn decide<'a, I>(tour: &EligibleTour, selections: I) -> TourDecision
where
    I: IntoIterator<Item = &'a SectorSelection>,
{
    let members: HashSet<Uuid> = tour.participation_ids.iter().copied().collect();
    let classification = classify_tour(&sector_counts(&members, selections));

    TourDecision {
        key: tour.key.clone(),
        participation_ids: tour.participation_ids.clone(),
        status: classification.status,
        sectors: classification.sectors,
    }
}

/// Plan a whole commit pass over already-fetched data
pub fn plan_commit(
    participations: &[Participation],
    selections: &[SectorSelection],
    evaluation_date: NaiveDate,
) -> CommitPlan {
    let (eligible, skipped) = select_eligible(participations, evaluation_date);

    CommitPlan {
        decisions: eligible
            .iter()
            .map(|tour| decide(tour, selections))
            .collect(),
        skipped,
    }
}
