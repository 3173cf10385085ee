//! Sector and tour classification
//!
//! Shared by the batch commit and the read-time projection; neither mode
//! has its own copy of the thresholds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::model::{ParticipationStatus, SectorStatus};

/// Distinct participants at which a sector is fully booked
pub const BOUCLEE_THRESHOLD: usize = 5;

/// Distinct participants at which a sector is confirmed
pub const CONFIRMED_THRESHOLD: usize = 3;

/// Classification of one sector within a tour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectorResult {
    pub code: String,
    pub count: usize,
    pub status: SectorStatus,
}

/// Classification of a whole tour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourClassification {
    pub status: ParticipationStatus,
    /// Ordered by sector code
    pub sectors: Vec<SectorResult>,
}

impl TourClassification {
    /// Highest participant count among the tour's sectors (0 if none)
    pub fn max_count(&self) -> usize {
        self.sectors.iter().map(|s| s.count).max().unwrap_or(0)
    }
}

pub fn classify_sector(count: usize) -> SectorStatus {
    if count >= BOUCLEE_THRESHOLD {
        SectorStatus::Bouclee
    } else if count >= CONFIRMED_THRESHOLD {
        SectorStatus::Confirmed
    } else {
        SectorStatus::Insufficient
    }
}

/// Classify every sector, then derive the tour status.
///
/// Any `bouclee` sector makes the tour `bouclee`; otherwise any `confirmed`
/// sector makes it `confirmed`; otherwise (including no sectors) it is
/// `cancelled`.
pub fn classify_tour(counts: &BTreeMap<String, usize>) -> TourClassification {
    let sectors: Vec<SectorResult> = counts
        .iter()
        .map(|(code, &count)| SectorResult {
            code: code.clone(),
            count,
            status: classify_sector(count),
        })
        .collect();

    let status = if sectors.iter().any(|s| s.status == SectorStatus::Bouclee) {
        ParticipationStatus::Bouclee
    } else if sectors.iter().any(|s| s.status == SectorStatus::Confirmed) {
        ParticipationStatus::Confirmed
    } else {
        ParticipationStatus::Cancelled
    };

    TourClassification { status, sectors }
}
