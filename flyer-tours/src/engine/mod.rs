//! Tour aggregation and validation engine
//!
//! Pure functions over already-fetched participations and sector
//! selections. The evaluation date is always an argument; nothing in here
//! reads a clock or touches the store.
//!
//! - [`commit`]: batch decisions for tours inside their commit window
//! - [`projection`]: display statuses for dashboards, never persisted
//!
//! Both go through [`classify::classify_tour`], so the thresholds exist in
//! one place.

pub mod classify;
pub mod commit;
pub mod grouping;
pub mod model;
pub mod projection;
pub mod window;

#[cfg(test)]
pub(crate) mod test_support;

pub use classify::{classify_sector, classify_tour, SectorResult, TourClassification};
pub use commit::{
    decide, plan_commit, select_eligible, CommitPlan, EligibleTour, SkipReason, SkippedTour,
    TourDecision,
};
pub use grouping::{group_by_tour, sector_counts};
pub use model::{
    FlyerInfo, Participation, ParticipationStatus, SectorSelection, SectorStatus, TourKey,
};
pub use projection::{project, project_tour, ProjectionPhase, TourProjection};
pub use window::{commit_date, is_commit_eligible, tour_phase, TourPhase, COMMIT_LEAD_DAYS};
