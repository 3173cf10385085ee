//! Builders shared by the engine's unit tests

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::model::{Participation, ParticipationStatus, SectorSelection};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn participation(city: &str, start_date: &str) -> Participation {
    let now = Utc::now();
    Participation {
        id: Uuid::new_v4(),
        user_id: "user-1".to_string(),
        city: city.to_string(),
        start_date: start_date.to_string(),
        end_date: None,
        tour_index: 1,
        total_dwellings: 1200,
        distribution_cost: 96.0,
        status: ParticipationStatus::Pending,
        flyer: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn selection(participation_id: Uuid, code: &str) -> SectorSelection {
    SectorSelection {
        participation_id,
        code: code.to_string(),
        name: format!("IRIS {}", code),
        dwellings: Some(400),
    }
}
