//! Participation store
//!
//! The engine never talks to the database; the runner reaches it through
//! [`TourStore`], which keeps the batch testable against failing stores.

use async_trait::async_trait;
use flyer_common::{parse_tour_date, Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::commit::parse_start;
use crate::engine::{FlyerInfo, Participation, ParticipationStatus, SectorSelection};

mod sqlite;
pub use sqlite::SqliteStore;

/// Operations the validation batch needs from persistent storage
#[async_trait]
pub trait TourStore: Send + Sync {
    /// All participations whose status is not `cancelled`
    async fn active_participations(&self) -> Result<Vec<Participation>>;

    /// All sector selections referencing any of `ids`
    async fn selections_for(&self, ids: &[Uuid]) -> Result<Vec<SectorSelection>>;

    /// Set `status` on every listed participation that is not cancelled.
    /// Returns the number of rows changed.
    async fn set_status(&self, ids: &[Uuid], status: ParticipationStatus) -> Result<u64>;
}

/// Sector chosen at signup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSector {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub dwellings: Option<i64>,
}

/// Signup request for one tour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewParticipation {
    pub user_id: String,
    pub city: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default = "default_tour_index")]
    pub tour_index: i64,
    #[serde(default)]
    pub total_dwellings: i64,
    #[serde(default)]
    pub distribution_cost: f64,
    #[serde(default)]
    pub flyer: Option<FlyerInfo>,
    #[serde(default)]
    pub sectors: Vec<NewSector>,
}

fn default_tour_index() -> i64 {
    1
}

impl NewParticipation {
    /// Reject signups the engine could never evaluate
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(Error::InvalidInput("user_id must not be empty".to_string()));
        }
        if self.city.trim().is_empty() {
            return Err(Error::InvalidInput("city must not be empty".to_string()));
        }
        if parse_tour_date(&self.start_date).is_none() {
            return Err(Error::InvalidInput(format!(
                "unrecognized start date '{}'",
                self.start_date
            )));
        }
        if parse_start(&self.start_date).is_none() {
            return Err(Error::DateOutOfRange(format!(
                "start date '{}' is outside the supported calendar",
                self.start_date
            )));
        }
        if let Some(end) = &self.end_date {
            if parse_tour_date(end).is_none() {
                return Err(Error::InvalidInput(format!("unrecognized end date '{}'", end)));
            }
        }
        if self.total_dwellings < 0 {
            return Err(Error::InvalidInput("total_dwellings must not be negative".to_string()));
        }
        if self.distribution_cost < 0.0 || !self.distribution_cost.is_finite() {
            return Err(Error::InvalidInput(
                "distribution_cost must be a non-negative number".to_string(),
            ));
        }
        if self.sectors.iter().any(|s| s.code.trim().is_empty()) {
            return Err(Error::InvalidInput("sector code must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Result of a user cancellation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
}
