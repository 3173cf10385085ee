//! Read-time status projection
//!
//! Computes what a dashboard should display for each participation
//! without persisting anything. Before the commit window the display only
//! ever moves toward `bouclee`; a premature `cancelled` is never shown.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

use super::classify::{
    classify_tour, SectorResult, TourClassification, BOUCLEE_THRESHOLD, CONFIRMED_THRESHOLD,
};
use super::commit::parse_start;
use super::grouping::{group_by_tour, sector_counts};
use super::model::{Participation, ParticipationStatus, SectorSelection, TourKey};
use super::window::{tour_phase, TourPhase};

/// Phase of a projected tour; `UnparsableDate` when no date arithmetic
/// was possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionPhase {
    UnparsableDate,
    BeforeCommit,
    CommitWindow,
    Committed,
    Passed,
}

impl From<TourPhase> for ProjectionPhase {
    fn from(phase: TourPhase) -> Self {
        match phase {
            TourPhase::BeforeCommit => ProjectionPhase::BeforeCommit,
            TourPhase::CommitWindow => ProjectionPhase::CommitWindow,
            TourPhase::Committed => ProjectionPhase::Committed,
            TourPhase::Passed => ProjectionPhase::Passed,
        }
    }
}

/// Display view of one tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TourProjection {
    pub key: TourKey,
    pub phase: ProjectionPhase,
    /// Status replacing the stored one, if any
    pub override_status: Option<ParticipationStatus>,
    pub sectors: Vec<SectorResult>,
    /// Displayed status of every non-cancelled participation of the tour
    pub displayed: BTreeMap<Uuid, ParticipationStatus>,
}

impl TourProjection {
    pub fn displayed_status(&self, id: &Uuid) -> Option<ParticipationStatus> {
        self.displayed.get(id).copied()
    }
}

/// Which status, if any, replaces the stored one for display
pub fn display_override(
    phase: ProjectionPhase,
    classification: &TourClassification,
) -> Option<ParticipationStatus> {
    let max_count = classification.max_count();
    match phase {
        ProjectionPhase::UnparsableDate => None,
        ProjectionPhase::BeforeCommit | ProjectionPhase::Committed => {
            (max_count >= BOUCLEE_THRESHOLD).then_some(ParticipationStatus::Bouclee)
        }
        ProjectionPhase::CommitWindow => Some(classification.status),
        ProjectionPhase::Passed => {
            if max_count >= CONFIRMED_THRESHOLD {
                Some(ParticipationStatus::Bouclee)
            } else if !classification.sectors.is_empty() {
                Some(ParticipationStatus::Cancelled)
            } else {
                // No selections at all: nothing to infer from
                None
            }
        }
    }
}

/// Project a single tour from its members
pub fn project_tour<'a, I>(
    key: TourKey,
    members: &[&Participation],
    selections: I,
    evaluation_date: NaiveDate,
) -> TourProjection
where
    I: IntoIterator<Item = &'a SectorSelection>,
{
    let ids: HashSet<Uuid> = members.iter().map(|p| p.id).collect();
    let classification = classify_tour(&sector_counts(&ids, selections));

    let phase = parse_start(&key.start_date)
        .and_then(|(_, start)| tour_phase(start, evaluation_date))
        .map_or(ProjectionPhase::UnparsableDate, ProjectionPhase::from);
    let override_status = display_override(phase, &classification);

    let displayed = members
        .iter()
        .map(|p| (p.id, override_status.unwrap_or(p.status)))
        .collect();

    TourProjection {
        key,
        phase,
        override_status,
        sectors: classification.sectors,
        displayed,
    }
}

/// Project every tour present in `participations`
pub fn project(
    participations: &[Participation],
    selections: &[SectorSelection],
    evaluation_date: NaiveDate,
) -> Vec<TourProjection> {
    group_by_tour(participations)
        .into_iter()
        .map(|(key, members)| project_tour(key, &members, selections, evaluation_date))
        .collect()
}
