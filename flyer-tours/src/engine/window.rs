//! Commit-window date arithmetic
//!
//! A tour's status is committed on the day that falls
//! [`COMMIT_LEAD_DAYS`] calendar days before it starts, or the day after.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar days between the commit date and the tour start
pub const COMMIT_LEAD_DAYS: i64 = 15;

/// Days after the commit date on which a commit is still accepted
pub const COMMIT_GRACE_DAYS: i64 = 1;

/// Where an evaluation date falls relative to a tour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TourPhase {
    /// Before the commit date
    BeforeCommit,
    /// On the commit date or the grace day after it
    CommitWindow,
    /// After the window, up to and including the start date
    Committed,
    /// Strictly after the start date
    Passed,
}

/// Commit date of a tour starting on `start`; `None` when it falls
/// before chrono's earliest representable date.
pub fn commit_date(start: NaiveDate) -> Option<NaiveDate> {
    start.checked_sub_signed(Duration::days(COMMIT_LEAD_DAYS))
}

/// Signed number of days from the commit date to `evaluation_date`
pub fn days_since_commit(start: NaiveDate, evaluation_date: NaiveDate) -> Option<i64> {
    commit_date(start).map(|commit| (evaluation_date - commit).num_days())
}

pub fn is_commit_eligible(start: NaiveDate, evaluation_date: NaiveDate) -> bool {
    days_since_commit(start, evaluation_date)
        .is_some_and(|days| (0..=COMMIT_GRACE_DAYS).contains(&days))
}

pub fn tour_phase(start: NaiveDate, evaluation_date: NaiveDate) -> Option<TourPhase> {
    let days = days_since_commit(start, evaluation_date)?;
    let phase = if days < 0 {
        TourPhase::BeforeCommit
    } else if days <= COMMIT_GRACE_DAYS {
        TourPhase::CommitWindow
    } else if evaluation_date > start {
        TourPhase::Passed
    } else {
        TourPhase::Committed
    };
    Some(phase)
}
