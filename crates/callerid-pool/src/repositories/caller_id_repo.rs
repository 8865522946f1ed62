//! Caller-ID repository implementation
//!
//! Provides PostgreSQL-backed storage for the caller-ID inventory, with the
//! LRU candidate query the Allocator's Phase 2 depends on (`spec.md` §4.1).

use callerid_core::{
    models::CallerId,
    traits::{CallerIdRepository, Repository},
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of `CallerIdRepository`.
pub struct PgCallerIdRepository {
    pool: PgPool,
}

impl PgCallerIdRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CALLER_ID_SELECT_COLUMNS: &str = r#"
    number, area_code, carrier, hourly_cap, daily_cap,
    last_used_at, active, metadata, created_at, updated_at
"#;

#[async_trait]
impl Repository<CallerId, String> for PgCallerIdRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: String) -> AppResult<Option<CallerId>> {
        self.get_by_number(&id).await
    }

    #[instrument(skip(self))]
    async fn find_all(&self, limit: i64, offset: i64) -> AppResult<Vec<CallerId>> {
        debug!("Finding all caller-ids with limit {} offset {}", limit, offset);

        let query = format!(
            "SELECT {} FROM caller_ids ORDER BY number LIMIT $1 OFFSET $2",
            CALLER_ID_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallerIdRow>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding caller-ids: {}", e);
                AppError::Database(format!("Failed to fetch caller-ids: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn count(&self) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM caller_ids")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting caller-ids: {}", e);
                AppError::Database(format!("Failed to count caller-ids: {}", e))
            })?;

        Ok(result.0)
    }

    #[instrument(skip(self, entity))]
    async fn create(&self, entity: &CallerId) -> AppResult<CallerId> {
        self.create_caller_id(entity).await
    }

    #[instrument(skip(self, entity))]
    async fn update(&self, entity: &CallerId) -> AppResult<CallerId> {
        debug!("Updating caller-id: {}", entity.number);

        let query = format!(
            r#"
            UPDATE caller_ids
            SET area_code = $2,
                carrier = $3,
                hourly_cap = $4,
                daily_cap = $5,
                last_used_at = $6,
                active = $7,
                metadata = $8,
                updated_at = NOW()
            WHERE number = $1
            RETURNING {}
            "#,
            CALLER_ID_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallerIdRow>(&query)
            .bind(&entity.number)
            .bind(&entity.area_code)
            .bind(&entity.carrier)
            .bind(entity.hourly_cap)
            .bind(entity.daily_cap)
            .bind(entity.last_used_at)
            .bind(entity.active)
            .bind(Json(&entity.metadata))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating caller-id {}: {}", entity.number, e);
                AppError::Database(format!("Failed to update caller-id: {}", e))
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: String) -> AppResult<bool> {
        debug!("Deleting caller-id: {}", id);

        let result = sqlx::query("DELETE FROM caller_ids WHERE number = $1")
            .bind(&id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error deleting caller-id {}: {}", id, e);
                AppError::Database(format!("Failed to delete caller-id: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CallerIdRepository for PgCallerIdRepository {
    /// Candidate query for `Allocate` Phase 2.
    ///
    /// `area_code = None` matches any row (tier-2 fallback); passing
    /// `Some(code)` restricts to that area code (tier-1). Only active,
    /// capped-positive rows are ever eligible candidates, so the
    /// ineligibility checks live in SQL rather than a post-filter.
    #[instrument(skip(self))]
    async fn query_candidates(
        &self,
        area_code: Option<&str>,
        limit: i64,
    ) -> AppResult<Vec<CallerId>> {
        debug!(
            "Querying candidates: area_code={:?}, limit={}",
            area_code, limit
        );

        let query = format!(
            r#"
            SELECT {}
            FROM caller_ids
            WHERE active = true
              AND hourly_cap > 0
              AND daily_cap > 0
              AND ($1::text IS NULL OR area_code = $1)
            ORDER BY last_used_at ASC NULLS FIRST, number ASC
            LIMIT $2
            "#,
            CALLER_ID_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, CallerIdRow>(&query)
            .bind(area_code)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error querying candidates: {}", e);
                AppError::Database(format!("Failed to query candidates: {}", e))
            })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_by_number(&self, number: &str) -> AppResult<Option<CallerId>> {
        debug!("Finding caller-id by number: {}", number);

        let query = format!(
            "SELECT {} FROM caller_ids WHERE number = $1",
            CALLER_ID_SELECT_COLUMNS
        );

        let result = sqlx::query_as::<sqlx::Postgres, CallerIdRow>(&query)
            .bind(number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error finding caller-id: {}", e);
                AppError::Database(format!("Failed to find caller-id: {}", e))
            })?;

        Ok(result.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn update_last_used(&self, number: &str, at: DateTime<Utc>) -> AppResult<()> {
        debug!("Updating last_used_at for {}: {}", number, at);

        sqlx::query(
            "UPDATE caller_ids SET last_used_at = $2, updated_at = NOW() WHERE number = $1",
        )
        .bind(number)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating last_used_at for {}: {}", number, e);
            AppError::Database(format!("Failed to update last_used_at: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self, caller_id))]
    async fn create_caller_id(&self, caller_id: &CallerId) -> AppResult<CallerId> {
        debug!("Creating caller-id: {}", caller_id.number);

        let query = format!(
            r#"
            INSERT INTO caller_ids (
                number, area_code, carrier, hourly_cap, daily_cap,
                last_used_at, active, metadata, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            CALLER_ID_SELECT_COLUMNS
        );

        let row = sqlx::query_as::<sqlx::Postgres, CallerIdRow>(&query)
            .bind(&caller_id.number)
            .bind(&caller_id.area_code)
            .bind(&caller_id.carrier)
            .bind(caller_id.hourly_cap)
            .bind(caller_id.daily_cap)
            .bind(caller_id.last_used_at)
            .bind(caller_id.active)
            .bind(Json(&caller_id.metadata))
            .bind(caller_id.created_at)
            .bind(caller_id.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error creating caller-id: {}", e);
                if e.to_string().contains("unique constraint") {
                    AppError::Conflict(format!("Caller-id {} already exists", caller_id.number))
                } else {
                    AppError::Database(format!("Failed to create caller-id: {}", e))
                }
            })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn set_active(&self, number: &str, active: bool) -> AppResult<()> {
        debug!("Setting active={} for {}", active, number);

        sqlx::query("UPDATE caller_ids SET active = $2, updated_at = NOW() WHERE number = $1")
            .bind(number)
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error setting active for {}: {}", number, e);
                AppError::Database(format!("Failed to set active: {}", e))
            })?;

        Ok(())
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct CallerIdRow {
    number: String,
    area_code: Option<String>,
    carrier: Option<String>,
    hourly_cap: i32,
    daily_cap: i32,
    last_used_at: Option<DateTime<Utc>>,
    active: bool,
    metadata: Json<HashMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CallerIdRow> for CallerId {
    fn from(row: CallerIdRow) -> Self {
        Self {
            number: row.number,
            area_code: row.area_code,
            carrier: row.carrier,
            hourly_cap: row.hourly_cap,
            daily_cap: row.daily_cap,
            last_used_at: row.last_used_at,
            active: row.active,
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caller_id_row_conversion() {
        let now = Utc::now();
        let row = CallerIdRow {
            number: "2125551001".to_string(),
            area_code: Some("212".to_string()),
            carrier: Some("verizon".to_string()),
            hourly_cap: 100,
            daily_cap: 500,
            last_used_at: None,
            active: true,
            metadata: Json(HashMap::new()),
            created_at: now,
            updated_at: now,
        };

        let caller_id: CallerId = row.into();
        assert_eq!(caller_id.number, "2125551001");
        assert!(caller_id.is_eligible());
    }
}
