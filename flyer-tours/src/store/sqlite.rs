//! SQLite implementation of the participation store

use async_trait::async_trait;
use flyer_common::db::{IrisSelectionRow, ParticipationRow};
use flyer_common::{time, Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{CancelOutcome, NewParticipation, TourStore};
use crate::engine::{FlyerInfo, Participation, ParticipationStatus, SectorSelection, TourKey};

const PARTICIPATION_COLUMNS: &str = "id, user_id, city, start_date, end_date, tour_index, \
     total_dwellings, distribution_cost, status, flyer_file_name, flyer_url, created_at, updated_at";

/// Maximum ids bound in one `IN (...)` clause, well under SQLite's
/// host-parameter limit
const ID_CHUNK: usize = 500;

/// Participation store backed by the service's SQLite database
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Register a new `pending` participation with its sector selections
    pub async fn insert_participation(&self, request: &NewParticipation) -> Result<Participation> {
        request.validate()?;

        let id = Uuid::new_v4();
        let now = time::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO participations (
                id, user_id, city, start_date, end_date, tour_index, total_dwellings,
                distribution_cost, status, flyer_file_name, flyer_url, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&request.user_id)
        .bind(request.city.trim())
        .bind(request.start_date.trim())
        .bind(request.end_date.as_deref())
        .bind(request.tour_index)
        .bind(request.total_dwellings)
        .bind(request.distribution_cost)
        .bind(request.flyer.as_ref().map(|f| f.file_name.as_str()))
        .bind(request.flyer.as_ref().and_then(|f| f.url.as_deref()))
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for sector in &request.sectors {
            sqlx::query(
                "INSERT INTO iris_selections (participation_id, iris_code, iris_name, dwellings) VALUES (?, ?, ?, ?)",
            )
            .bind(id.to_string())
            .bind(sector.code.trim())
            .bind(&sector.name)
            .bind(sector.dwellings)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(
            "Registered participation {} for {} ({} sectors)",
            id,
            request.city,
            request.sectors.len()
        );

        Ok(Participation {
            id,
            user_id: request.user_id.clone(),
            city: request.city.trim().to_string(),
            start_date: request.start_date.trim().to_string(),
            end_date: request.end_date.clone(),
            tour_index: request.tour_index,
            total_dwellings: request.total_dwellings,
            distribution_cost: request.distribution_cost,
            status: ParticipationStatus::Pending,
            flyer: request.flyer.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    pub async fn get_participation(&self, id: Uuid) -> Result<Option<Participation>> {
        let row = sqlx::query_as::<_, ParticipationRow>(&format!(
            "SELECT {} FROM participations WHERE id = ?",
            PARTICIPATION_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(participation_from_row).transpose()
    }

    /// Every participation owned by `user_id`, cancelled ones included
    pub async fn participations_for_user(&self, user_id: &str) -> Result<Vec<Participation>> {
        let rows = sqlx::query_as::<_, ParticipationRow>(&format!(
            "SELECT {} FROM participations WHERE user_id = ? ORDER BY created_at, id",
            PARTICIPATION_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(participation_from_row).collect()
    }

    /// Non-cancelled participations belonging to any of `tours`
    pub async fn active_participations_for_tours(
        &self,
        tours: &[TourKey],
    ) -> Result<Vec<Participation>> {
        let mut participations = Vec::new();

        for key in tours {
            let rows = sqlx::query_as::<_, ParticipationRow>(&format!(
                "SELECT {} FROM participations \
                 WHERE city = ? AND start_date = ? AND status <> 'cancelled' ORDER BY id",
                PARTICIPATION_COLUMNS
            ))
            .bind(&key.city)
            .bind(&key.start_date)
            .fetch_all(&self.pool)
            .await?;

            for row in rows {
                participations.push(participation_from_row(row)?);
            }
        }

        Ok(participations)
    }

    /// Non-cancelled participations, optionally limited to one city
    pub async fn active_participations_in_city(
        &self,
        city: Option<&str>,
    ) -> Result<Vec<Participation>> {
        match city {
            Some(city) => {
                let rows = sqlx::query_as::<_, ParticipationRow>(&format!(
                    "SELECT {} FROM participations \
                     WHERE city = ? AND status <> 'cancelled' ORDER BY start_date, id",
                    PARTICIPATION_COLUMNS
                ))
                .bind(city)
                .fetch_all(&self.pool)
                .await?;

                rows.into_iter().map(participation_from_row).collect()
            }
            None => self.active_participations().await,
        }
    }

    /// Distinct cities that have at least one active participation
    pub async fn list_cities(&self) -> Result<Vec<String>> {
        let cities: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT city FROM participations WHERE status <> 'cancelled' ORDER BY city",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(cities)
    }

    /// User cancellation. Idempotent; unknown ids are `NotFound`.
    pub async fn cancel_participation(&self, id: Uuid) -> Result<CancelOutcome> {
        let changed = sqlx::query(
            "UPDATE participations SET status = 'cancelled', updated_at = ? \
             WHERE id = ? AND status <> 'cancelled'",
        )
        .bind(time::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?
        .rows_affected();

        if changed > 0 {
            return Ok(CancelOutcome::Cancelled);
        }

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM participations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => Ok(CancelOutcome::AlreadyCancelled),
            None => Err(Error::NotFound(format!("participation {}", id))),
        }
    }
}

#[async_trait]
impl TourStore for SqliteStore {
    async fn active_participations(&self) -> Result<Vec<Participation>> {
        let rows = sqlx::query_as::<_, ParticipationRow>(&format!(
            "SELECT {} FROM participations WHERE status <> 'cancelled' ORDER BY city, start_date, id",
            PARTICIPATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(participation_from_row).collect()
    }

    async fn selections_for(&self, ids: &[Uuid]) -> Result<Vec<SectorSelection>> {
        let mut selections = Vec::new();

        for chunk in ids.chunks(ID_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
                "SELECT participation_id, iris_code, iris_name, dwellings \
                 FROM iris_selections WHERE participation_id IN (",
            );
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.to_string());
            }
            separated.push_unseparated(") ORDER BY id");

            let rows = builder
                .build_query_as::<IrisSelectionRow>()
                .fetch_all(&self.pool)
                .await?;

            for row in rows {
                selections.push(selection_from_row(row)?);
            }
        }

        Ok(selections)
    }

    async fn set_status(&self, ids: &[Uuid], status: ParticipationStatus) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let now = time::now();
        let mut changed = 0;
        // One transaction so a tour is never left half-updated
        let mut tx = self.pool.begin().await?;

        for chunk in ids.chunks(ID_CHUNK) {
            let mut builder: QueryBuilder<Sqlite> =
                QueryBuilder::new("UPDATE participations SET status = ");
            builder.push_bind(status.as_str());
            builder.push(", updated_at = ");
            builder.push_bind(now);
            builder.push(" WHERE status <> 'cancelled' AND id IN (");
            let mut separated = builder.separated(", ");
            for id in chunk {
                separated.push_bind(id.to_string());
            }
            separated.push_unseparated(")");

            changed += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;
        Ok(changed)
    }
}

fn participation_from_row(row: ParticipationRow) -> Result<Participation> {
    let ParticipationRow {
        id,
        user_id,
        city,
        start_date,
        end_date,
        tour_index,
        total_dwellings,
        distribution_cost,
        status,
        flyer_file_name,
        flyer_url,
        created_at,
        updated_at,
    } = row;

    let id = Uuid::parse_str(&id)
        .map_err(|e| Error::Internal(format!("invalid participation id '{}': {}", id, e)))?;
    let status = status.parse::<ParticipationStatus>().map_err(Error::Internal)?;
    let flyer = flyer_file_name.map(|file_name| FlyerInfo {
        file_name,
        url: flyer_url,
    });

    Ok(Participation {
        id,
        user_id,
        city,
        start_date,
        end_date,
        tour_index,
        total_dwellings,
        distribution_cost,
        status,
        flyer,
        created_at,
        updated_at,
    })
}

fn selection_from_row(row: IrisSelectionRow) -> Result<SectorSelection> {
    let participation_id = Uuid::parse_str(&row.participation_id).map_err(|e| {
        Error::Internal(format!(
            "invalid participation id '{}' in iris_selections: {}",
            row.participation_id, e
        ))
    })?;

    Ok(SectorSelection {
        participation_id,
        code: row.iris_code,
        name: row.iris_name,
        dwellings: row.dwellings,
    })
}
