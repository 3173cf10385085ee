//! Value types consumed and produced by the engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle status of a participation, and the tour-level verdict
/// written back to every participation of a tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    Pending,
    Confirmed,
    Cancelled,
    /// Fully booked
    Bouclee,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Pending => "pending",
            ParticipationStatus::Confirmed => "confirmed",
            ParticipationStatus::Cancelled => "cancelled",
            ParticipationStatus::Bouclee => "bouclee",
        }
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ParticipationStatus::Pending),
            "confirmed" => Ok(ParticipationStatus::Confirmed),
            "cancelled" => Ok(ParticipationStatus::Cancelled),
            "bouclee" => Ok(ParticipationStatus::Bouclee),
            other => Err(format!("unknown participation status '{}'", other)),
        }
    }
}

/// Per-sector verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectorStatus {
    Bouclee,
    Confirmed,
    Insufficient,
}

/// Flyer attached to a participation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlyerInfo {
    pub file_name: String,
    pub url: Option<String>,
}

/// One user's signup for one city's distribution round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participation {
    pub id: Uuid,
    pub user_id: String,
    pub city: String,
    /// Raw stored start date, e.g. "15 janvier 2024"
    pub start_date: String,
    pub end_date: Option<String>,
    pub tour_index: i64,
    pub total_dwellings: i64,
    pub distribution_cost: f64,
    pub status: ParticipationStatus,
    pub flyer: Option<FlyerInfo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Participation {
    pub fn tour_key(&self) -> TourKey {
        TourKey {
            city: self.city.clone(),
            start_date: self.start_date.clone(),
        }
    }
}

/// A participation's choice of one IRIS sector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorSelection {
    pub participation_id: Uuid,
    pub code: String,
    pub name: String,
    pub dwellings: Option<i64>,
}

/// Identity of a tour: city plus the raw start-date string.
///
/// Compared by exact string equality; two spellings of the same calendar
/// day are two different tours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TourKey {
    pub city: String,
    pub start_date: String,
}

impl fmt::Display for TourKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.city, self.start_date)
    }
}
