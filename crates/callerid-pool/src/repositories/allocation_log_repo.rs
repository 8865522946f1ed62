//! Allocation history repository implementation
//!
//! Append-only log of allocation attempts and their outcomes, modeled on
//! the teacher's CDR repository: runtime queries (no compile-time macros)
//! so the crate builds without a live database, plus a `list_filtered`
//! query for reporting tools. Never read back by the Allocator itself
//! (`spec.md` §3).

use callerid_core::{
    models::{AllocationOutcome, AllocationRecord},
    traits::AllocationLogRepository,
    AppError, AppResult,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of `AllocationLogRepository`.
pub struct PgAllocationLogRepository {
    pool: PgPool,
}

impl PgAllocationLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn parse_outcome(s: &str) -> AllocationOutcome {
        match s {
            "granted" => AllocationOutcome::Granted,
            "rate_limited" => AllocationOutcome::RateLimited,
            "none_available" => AllocationOutcome::NoneAvailable,
            "unavailable" => AllocationOutcome::Unavailable,
            _ => AllocationOutcome::InvalidInput,
        }
    }
}

const ALLOCATION_SELECT_COLUMNS: &str = r#"
    id, number, destination, campaign, agent, latency_ms, outcome, created_at
"#;

#[async_trait]
impl AllocationLogRepository for PgAllocationLogRepository {
    #[instrument(skip(self, record))]
    async fn record(&self, record: &AllocationRecord) -> AppResult<()> {
        debug!(
            "Recording allocation attempt for {} (outcome={})",
            record.number, record.outcome
        );

        sqlx::query(
            r#"
            INSERT INTO allocation_records (
                number, destination, campaign, agent, latency_ms, outcome, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&record.number)
        .bind(&record.destination)
        .bind(&record.campaign)
        .bind(&record.agent)
        .bind(record.latency_ms)
        .bind(record.outcome.to_string())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error recording allocation attempt: {}", e);
            AppError::Database(format!("Failed to record allocation attempt: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_filtered(
        &self,
        number: Option<&str>,
        campaign: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<AllocationRecord>, i64)> {
        debug!(
            "Listing allocation records: number={:?}, campaign={:?}, limit={}, offset={}",
            number, campaign, limit, offset
        );

        let count_query = format!(
            r#"
            SELECT COUNT(*) FROM allocation_records
            WHERE ($1::text IS NULL OR number = $1)
              AND ($2::text IS NULL OR campaign = $2)
            "#,
        );

        let total: (i64,) = sqlx::query_as(&count_query)
            .bind(number)
            .bind(campaign)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error counting allocation records: {}", e);
                AppError::Database(format!("Failed to count allocation records: {}", e))
            })?;

        let data_query = format!(
            r#"
            SELECT {}
            FROM allocation_records
            WHERE ($1::text IS NULL OR number = $1)
              AND ($2::text IS NULL OR campaign = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            ALLOCATION_SELECT_COLUMNS
        );

        let rows = sqlx::query_as::<sqlx::Postgres, AllocationRecordRow>(&data_query)
            .bind(number)
            .bind(campaign)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error fetching allocation records: {}", e);
                AppError::Database(format!("Failed to fetch allocation records: {}", e))
            })?;

        Ok((rows.into_iter().map(Into::into).collect(), total.0))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct AllocationRecordRow {
    id: i64,
    number: String,
    destination: String,
    campaign: String,
    agent: String,
    latency_ms: i64,
    outcome: String,
    created_at: DateTime<Utc>,
}

impl From<AllocationRecordRow> for AllocationRecord {
    fn from(row: AllocationRecordRow) -> Self {
        Self {
            id: row.id,
            number: row.number,
            destination: row.destination,
            campaign: row.campaign,
            agent: row.agent,
            latency_ms: row.latency_ms,
            outcome: PgAllocationLogRepository::parse_outcome(&row.outcome),
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_record_row_conversion() {
        let now = Utc::now();
        let row = AllocationRecordRow {
            id: 1,
            number: "2125551001".to_string(),
            destination: "3105551234".to_string(),
            campaign: "spring-promo".to_string(),
            agent: "agent-7".to_string(),
            latency_ms: 42,
            outcome: "granted".to_string(),
            created_at: now,
        };

        let record: AllocationRecord = row.into();
        assert_eq!(record.outcome, AllocationOutcome::Granted);
    }

    #[test]
    fn test_parse_outcome_unknown_defaults_to_invalid_input() {
        assert_eq!(
            PgAllocationLogRepository::parse_outcome("bogus"),
            AllocationOutcome::InvalidInput
        );
    }
}
