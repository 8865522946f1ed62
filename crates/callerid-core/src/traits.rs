//! Common traits for the Pool Store and Coordination Store adapters
//!
//! Defines the abstractions the Allocator is generic over, so it can be
//! tested against in-memory fakes without a live Postgres/Redis.

use crate::error::AppError;
use crate::models::{AllocationRecord, CallerId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Generic repository trait for CRUD operations, kept for the symmetry the
/// teacher's layering relies on even though the allocator only ever needs
/// `CallerIdRepository`'s specialized methods.
#[async_trait]
pub trait Repository<T, ID>: Send + Sync {
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, AppError>;
    async fn find_all(&self, limit: i64, offset: i64) -> Result<Vec<T>, AppError>;
    async fn count(&self) -> Result<i64, AppError>;
    async fn create(&self, entity: &T) -> Result<T, AppError>;
    async fn update(&self, entity: &T) -> Result<T, AppError>;
    async fn delete(&self, id: ID) -> Result<bool, AppError>;
}

/// Pool Store adapter (`spec.md` §4.2).
///
/// `ID` is the caller-ID's `number`, which is both its primary key and the
/// Coordination Store's reservation-key identity.
#[async_trait]
pub trait CallerIdRepository: Repository<CallerId, String> {
    /// Candidate query for Phase 2 of `Allocate`.
    ///
    /// Ordered by `(last_used_at ASC NULLS FIRST, number ASC)` — the
    /// number is a deterministic tiebreak so repeated queries (and
    /// distinct replicas) see identical ordering.
    ///
    /// `area_code = None` means "any area code" (tier-2 fallback).
    async fn query_candidates(
        &self,
        area_code: Option<&str>,
        limit: i64,
    ) -> Result<Vec<CallerId>, AppError>;

    /// Find a caller-ID by its canonical number.
    async fn get_by_number(&self, number: &str) -> Result<Option<CallerId>, AppError>;

    /// Persist the most recent successful-allocation timestamp.
    ///
    /// A fire-and-forget write is acceptable: correctness of future LRU
    /// ordering is restored on eventual commit (`spec.md` §4.1 Phase 3d).
    async fn update_last_used(&self, number: &str, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Admin-only: create a new caller-ID. Returns `AppError::Conflict`
    /// if `number` already exists.
    async fn create_caller_id(&self, caller_id: &CallerId) -> Result<CallerId, AppError>;

    /// Admin-only: toggle the `active` flag.
    async fn set_active(&self, number: &str, active: bool) -> Result<(), AppError>;
}

/// Append-only allocation history (`spec.md` §3, "optional history").
/// Never read by the Allocator; consumed only by reporting tooling.
#[async_trait]
pub trait AllocationLogRepository: Send + Sync {
    /// Record one allocation attempt's outcome. Fire-and-forget from the
    /// Allocator's perspective — failures here must never fail `Allocate`.
    async fn record(&self, record: &AllocationRecord) -> Result<(), AppError>;

    /// List recorded allocations, most recent first, for reporting tools.
    async fn list_filtered(
        &self,
        number: Option<&str>,
        campaign: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AllocationRecord>, i64), AppError>;
}

/// Outcome of `CoordinationStore::set_if_absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    Created,
    AlreadyExists,
}

/// Outcome of `CoordinationStore::delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Absent,
}

/// Coordination Store adapter (`spec.md` §4.3).
///
/// All primitives are single-key atomics. Implementations MUST surface
/// transient transport errors distinctly from "absent"/"exists" outcomes
/// (via `Err(AppError::Unavailable(..))`) so the Allocator can map them
/// without guessing whether a failure was semantic or transient.
#[async_trait]
pub trait CoordinationStore: Send + Sync {
    /// Atomically create `key` with `value` and `ttl_seconds` only if it
    /// does not already exist.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<SetOutcome, AppError>;

    /// Read the raw value stored at `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Delete `key`. Idempotent: deleting an absent key returns `Absent`,
    /// never an error.
    async fn delete(&self, key: &str) -> Result<DeleteOutcome, AppError>;

    /// Atomically increment the integer counter at `key`, setting
    /// `ttl_seconds` only if the key did not already exist. Returns the
    /// post-increment value.
    async fn increment_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<i64, AppError>;

    /// Best-effort compensating decrement after a cap violation
    /// (`spec.md` §4.1 Phase 3c). Never surfaced as a hard failure by
    /// callers — drift self-heals at TTL expiry.
    async fn decrement(&self, key: &str) -> Result<i64, AppError>;
}
