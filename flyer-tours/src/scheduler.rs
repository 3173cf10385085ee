//! Periodic validation service
//!
//! Runs the validation batch on a timer, evaluating with today's local
//! date. The HTTP trigger goes through the same service so that one
//! process never runs two batches at once.

use chrono::NaiveDate;
use flyer_common::db::get_setting;
use flyer_common::{time, Result};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::runner::{run_validation, BatchSummary};
use crate::store::TourStore;

/// Validation schedule configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationSchedule {
    /// Enable the periodic batch (default: true)
    pub enabled: bool,

    /// Seconds between runs (default: 3600)
    pub interval_secs: u64,

    /// Run once immediately at startup (default: true)
    pub run_on_startup: bool,

    /// Batch summaries kept in memory (default: 50)
    pub history_size: usize,
}

impl Default for ValidationSchedule {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 3600,
            run_on_startup: true,
            history_size: 50,
        }
    }
}

impl ValidationSchedule {
    /// Load the schedule from database settings, falling back to defaults
    /// for missing or unparsable values
    pub async fn from_database(pool: &SqlitePool) -> Self {
        let mut schedule = Self::default();

        if let Ok(Some(enabled)) = get_setting(pool, "validation_enabled").await {
            schedule.enabled = enabled.trim().eq_ignore_ascii_case("true");
        }

        if let Ok(Some(value)) = get_setting(pool, "validation_interval_secs").await {
            if let Ok(secs) = value.trim().parse::<u64>() {
                if secs > 0 {
                    schedule.interval_secs = secs;
                }
            }
        }

        if let Ok(Some(value)) = get_setting(pool, "validation_run_on_startup").await {
            schedule.run_on_startup = value.trim().eq_ignore_ascii_case("true");
        }

        if let Ok(Some(value)) = get_setting(pool, "validation_history_size").await {
            if let Ok(size) = value.trim().parse::<usize>() {
                schedule.history_size = size;
            }
        }

        schedule
    }
}

/// Validation Service
///
/// Owns the batch history and serializes batch runs.
pub struct ValidationService {
    schedule: ValidationSchedule,
    store: Arc<dyn TourStore>,
    history: RwLock<Vec<BatchSummary>>,
    run_lock: Mutex<()>,
}

impl ValidationService {
    pub fn new(schedule: ValidationSchedule, store: Arc<dyn TourStore>) -> Self {
        Self {
            schedule,
            store,
            history: RwLock::new(Vec::new()),
            run_lock: Mutex::new(()),
        }
    }

    pub fn schedule(&self) -> &ValidationSchedule {
        &self.schedule
    }

    /// Run one batch now, waiting for any batch already in progress
    pub async fn run_now(&self, evaluation_date: NaiveDate) -> Result<BatchSummary> {
        let _guard = self.run_lock.lock().await;

        let summary = run_validation(self.store.as_ref(), evaluation_date).await?;

        let mut history = self.history.write().await;
        history.insert(0, summary.clone()); // most recent first
        history.truncate(self.schedule.history_size);

        Ok(summary)
    }

    /// Recent batch summaries, most recent first
    pub async fn history(&self) -> Vec<BatchSummary> {
        self.history.read().await.clone()
    }

    pub async fn latest(&self) -> Option<BatchSummary> {
        self.history.read().await.first().cloned()
    }

    /// Spawn the periodic loop. Returns `None` when disabled.
    pub fn run(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.schedule.enabled {
            info!("ValidationService disabled by configuration");
            return None;
        }

        info!(
            "Starting ValidationService (interval: {}s, run on startup: {})",
            self.schedule.interval_secs, self.schedule.run_on_startup
        );

        Some(tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(self.schedule.interval_secs.max(1)));
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // The first tick completes immediately
            if !self.schedule.run_on_startup {
                timer.tick().await;
            }

            loop {
                timer.tick().await;
                debug!("ValidationService: running scheduled batch");

                if let Err(e) = self.run_now(time::today()).await {
                    error!("ValidationService: batch failed: {}", e);
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{NewParticipation, SqliteStore};
    use flyer_common::db::{init_in_memory, set_setting};

    #[test]
    fn test_schedule_defaults() {
        let schedule = ValidationSchedule::default();
        assert!(schedule.enabled);
        assert_eq!(schedule.interval_secs, 3600);
        assert!(schedule.run_on_startup);
        assert_eq!(schedule.history_size, 50);
    }

    #[tokio::test]
    async fn test_schedule_from_database() {
        let pool = init_in_memory().await.unwrap();
        set_setting(&pool, "validation_enabled", "false").await.unwrap();
        set_setting(&pool, "validation_interval_secs", "120").await.unwrap();
        set_setting(&pool, "validation_history_size", "3").await.unwrap();

        let schedule = ValidationSchedule::from_database(&pool).await;
        assert!(!schedule.enabled);
        assert_eq!(schedule.interval_secs, 120);
        assert_eq!(schedule.history_size, 3);
    }

    #[tokio::test]
    async fn test_bad_settings_fall_back_to_defaults() {
        let pool = init_in_memory().await.unwrap();
        set_setting(&pool, "validation_interval_secs", "soon").await.unwrap();
        set_setting(&pool, "validation_history_size", "-1").await.unwrap();

        let schedule = ValidationSchedule::from_database(&pool).await;
        assert_eq!(schedule.interval_secs, 3600);
        assert_eq!(schedule.history_size, 50);
    }

    #[tokio::test]
    async fn test_disabled_service_does_not_spawn() {
        let store = Arc::new(SqliteStore::new(init_in_memory().await.unwrap()));
        let schedule = ValidationSchedule {
            enabled: false,
            ..Default::default()
        };
        let service = Arc::new(ValidationService::new(schedule, store));

        assert!(service.run().is_none());
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_most_recent_first() {
        let store = Arc::new(SqliteStore::new(init_in_memory().await.unwrap()));
        store
            .insert_participation(&NewParticipation {
                user_id: "u1".to_string(),
                city: "Lyon".to_string(),
                start_date: "15 janvier 2024".to_string(),
                end_date: None,
                tour_index: 1,
                total_dwellings: 0,
                distribution_cost: 0.0,
                flyer: None,
                sectors: Vec::new(),
            })
            .await
            .unwrap();

        let schedule = ValidationSchedule {
            history_size: 2,
            ..Default::default()
        };
        let service = ValidationService::new(schedule, store);

        for day in [1, 2, 3] {
            let date = NaiveDate::from_ymd_opt(2023, 11, day).unwrap();
            service.run_now(date).await.unwrap();
        }

        let history = service.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].evaluation_date, NaiveDate::from_ymd_opt(2023, 11, 3).unwrap());
        assert_eq!(
            service.latest().await.unwrap().evaluation_date,
            NaiveDate::from_ymd_opt(2023, 11, 3).unwrap()
        );
    }
}
