//! HTTP API handlers for flyer-tours

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod participations;
pub mod tours;
pub mod validation;

pub use auth::auth_middleware;
pub use dashboard::get_user_dashboard;
pub use health::health_routes;
pub use participations::{cancel_participation, create_participation, get_participation};
pub use tours::{list_cities, list_tours};
pub use validation::{get_validation_history, run_validation_batch};

use chrono::NaiveDate;
use flyer_common::time;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Optional `?date=YYYY-MM-DD` override of the evaluation date
#[derive(Debug, Default, Deserialize)]
pub struct DateQuery {
    pub date: Option<String>,
}

/// Parse an optional ISO date, defaulting to today
pub(crate) fn evaluation_date(raw: Option<&str>) -> ApiResult<NaiveDate> {
    match raw {
        Some(value) => time::parse_iso_date(value).ok_or_else(|| {
            ApiError::BadRequest(format!("invalid date '{}', expected YYYY-MM-DD", value))
        }),
        None => Ok(time::today()),
    }
}
