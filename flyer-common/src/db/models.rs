//! Database row models
//!
//! Raw rows as stored. Status and identifiers are kept as text here;
//! typed conversion happens in the services that own the semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Setting {
    pub key: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ParticipationRow {
    pub id: String,
    pub user_id: String,
    pub city: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub tour_index: i64,
    pub total_dwellings: i64,
    pub distribution_cost: f64,
    pub status: String,
    pub flyer_file_name: Option<String>,
    pub flyer_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct IrisSelectionRow {
    pub participation_id: String,
    pub iris_code: String,
    pub iris_name: String,
    pub dwellings: Option<i64>,
}
