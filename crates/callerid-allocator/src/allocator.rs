//! The `Allocator`: LRU caller-ID selection, cap enforcement, and the
//! per-agent rate limit.
//!
//! Generic over both store traits so the allocator can be exercised in
//! tests against in-memory fakes without a live Redis/Postgres.

use callerid_core::config::AllocatorConfig;
use callerid_core::error::AppError;
use callerid_core::models::{Allocation, AllocationOutcome, AllocationRecord, AllocationRequest, Reservation};
use callerid_core::phone;
use callerid_core::traits::{AllocationLogRepository, CallerIdRepository, CoordinationStore, DeleteOutcome, SetOutcome};
use callerid_core::AppResult;
use callerid_coordination::keys;
use chrono::{Timelike, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{instrument, warn};

/// The allocation engine.
///
/// Owns the Coordination Store and Pool Store capability handles and an
/// immutable runtime configuration. Constructed once at start-up and
/// shared across request handlers behind an `Arc`.
pub struct Allocator<C, P>
where
    C: CoordinationStore,
    P: CallerIdRepository,
{
    coordination: Arc<C>,
    pool: Arc<P>,
    log: Option<Arc<dyn AllocationLogRepository>>,
    config: AllocatorConfig,
}

impl<C, P> Allocator<C, P>
where
    C: CoordinationStore,
    P: CallerIdRepository,
{
    pub fn new(coordination: Arc<C>, pool: Arc<P>, config: AllocatorConfig) -> Self {
        Self {
            coordination,
            pool,
            log: None,
            config,
        }
    }

    /// Attach an allocation-history repository. Recording failures never
    /// fail the allocation itself (`spec.md` §3: "never read by the
    /// allocator").
    pub fn with_log(mut self, log: Arc<dyn AllocationLogRepository>) -> Self {
        self.log = Some(log);
        self
    }

    /// `Allocate(req) -> Allocation | AllocationError`.
    #[instrument(skip(self, req), fields(campaign = %req.campaign, agent = %req.agent))]
    pub async fn allocate(&self, req: &AllocationRequest) -> AppResult<Allocation> {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(self.config.request_deadline_ms);

        let campaign = req.campaign.trim();
        let agent = req.agent.trim();
        if !phone::is_non_empty_trimmed(campaign) || !phone::is_non_empty_trimmed(agent) {
            let err = AppError::InvalidInput("campaign and agent must be non-empty".into());
            return self.finish(req, AllocationOutcome::InvalidInput, started, Err(err)).await;
        }

        let raw_digits = phone::normalize(&req.destination);
        let digits = phone::strip_leading_country_code(&raw_digits);
        if !phone::is_valid_destination(digits) {
            let err = AppError::InvalidDestination(format!(
                "destination must be 7-15 digits, got {}",
                digits.len()
            ));
            return self.finish(req, AllocationOutcome::InvalidInput, started, Err(err)).await;
        }
        let area_code = phone::area_code(&raw_digits);

        // Phase 1: rate limit, incremented before candidate selection so
        // scan cost cannot be used to amplify abuse.
        let now = Utc::now();
        let rate_key = keys::rate_limit_key(agent, now);
        let rate_count = match self
            .with_deadline(deadline, self.coordination.increment_with_ttl(&rate_key, keys::RATE_LIMIT_TTL_SECS))
            .await
        {
            Ok(count) => count,
            Err(err) => return self.finish(req, AllocationOutcome::Unavailable, started, Err(err)).await,
        };
        if rate_count > self.config.agent_rate_limit_per_minute as i64 {
            let err = AppError::RateLimited {
                agent: agent.to_string(),
                limit: self.config.agent_rate_limit_per_minute,
                retry_after_secs: seconds_until_next_minute(now),
            };
            return self.finish(req, AllocationOutcome::RateLimited, started, Err(err)).await;
        }

        // Phase 2/3: tier-1 (area-code match) then tier-2 (any area code).
        let result = self.try_allocate(req, digits, area_code.as_deref(), deadline).await;
        match result {
            Ok(Some(alloc)) => self.finish(req, AllocationOutcome::Granted, started, Ok(alloc)).await,
            Ok(None) => {
                self.finish(req, AllocationOutcome::NoneAvailable, started, Err(AppError::NoneAvailable)).await
            }
            Err(err) => self.finish(req, AllocationOutcome::Unavailable, started, Err(err)).await,
        }
    }

    async fn try_allocate(
        &self,
        req: &AllocationRequest,
        destination: &str,
        area_code: Option<&str>,
        deadline: Instant,
    ) -> AppResult<Option<Allocation>> {
        if let Some(code) = area_code {
            if let Some(alloc) = self.contend_tier(req, destination, Some(code), deadline).await? {
                return Ok(Some(alloc));
            }
        }
        self.contend_tier(req, destination, None, deadline).await
    }

    /// Phase 2 (candidate query) and Phase 3 (per-candidate contention)
    /// for a single tier.
    async fn contend_tier(
        &self,
        req: &AllocationRequest,
        destination: &str,
        area_code: Option<&str>,
        deadline: Instant,
    ) -> AppResult<Option<Allocation>> {
        let candidates = self
            .with_deadline(
                deadline,
                self.pool.query_candidates(area_code, self.config.candidate_scan_limit),
            )
            .await?;

        for candidate in candidates {
            if Instant::now() >= deadline {
                return Err(AppError::Unavailable("request deadline exceeded during candidate scan".into()));
            }

            let reservation_key = keys::reservation_key(&candidate.number);
            let reservation = Reservation::new(
                req.agent.trim().to_string(),
                req.campaign.trim().to_string(),
                destination.to_string(),
                self.config.reservation_ttl_seconds,
            );
            let payload = serde_json::to_string(&reservation)?;

            // Phase 3a: conditional-create the reservation lock.
            let set_outcome = self
                .with_deadline(
                    deadline,
                    self.coordination.set_if_absent(&reservation_key, &payload, self.config.reservation_ttl_seconds),
                )
                .await?;

            if set_outcome == SetOutcome::AlreadyExists {
                // 3b: already reserved, try the next candidate.
                continue;
            }

            // A deadline expiry from here on must clean up the reservation
            // we just created, so an unused number is not locked for the
            // full TTL (spec.md §5).
            if Instant::now() >= deadline {
                let _ = self.coordination.delete(&reservation_key).await;
                return Err(AppError::Unavailable("request deadline exceeded after reservation create".into()));
            }

            match self.check_caps_and_commit(&candidate, &reservation_key, deadline).await {
                Ok(CapOutcome::Granted) => {
                    let now = Utc::now();
                    if let Err(e) = self.pool.update_last_used(&candidate.number, now).await {
                        warn!("failed to persist last_used_at for {}: {}", candidate.number, e);
                    }
                    return Ok(Some(Allocation {
                        number: candidate.number,
                        area_code: candidate.area_code,
                        carrier: candidate.carrier,
                        ttl_seconds: self.config.reservation_ttl_seconds,
                        destination: destination.to_string(),
                        campaign: req.campaign.trim().to_string(),
                        agent: req.agent.trim().to_string(),
                    }));
                }
                Ok(CapOutcome::Capped) => continue,
                Err(err) => return Err(err),
            }
        }

        Ok(None)
    }

    /// Phase 3c: increment the hourly/daily usage counters and evaluate
    /// the caller-ID's caps. On cap violation the reservation and both
    /// counters are rolled back (best-effort) and the candidate is
    /// considered capped, not an error.
    async fn check_caps_and_commit(
        &self,
        candidate: &callerid_core::models::CallerId,
        reservation_key: &str,
        deadline: Instant,
    ) -> AppResult<CapOutcome> {
        let number = candidate.number.as_str();
        let now = Utc::now();
        let hourly_key = keys::hourly_usage_key(number, now);
        let daily_key = keys::daily_usage_key(number, now);

        let hourly_count = match self
            .with_deadline(deadline, self.coordination.increment_with_ttl(&hourly_key, keys::HOURLY_TTL_SECS))
            .await
        {
            Ok(count) => count,
            Err(err) => {
                let _ = self.coordination.delete(reservation_key).await;
                return Err(err);
            }
        };

        let daily_count = match self
            .with_deadline(deadline, self.coordination.increment_with_ttl(&daily_key, keys::DAILY_TTL_SECS))
            .await
        {
            Ok(count) => count,
            Err(err) => {
                let _ = self.coordination.decrement(&hourly_key).await;
                let _ = self.coordination.delete(reservation_key).await;
                return Err(err);
            }
        };

        if hourly_count > candidate.hourly_cap as i64 || daily_count > candidate.daily_cap as i64 {
            let _ = self.coordination.decrement(&hourly_key).await;
            let _ = self.coordination.decrement(&daily_key).await;
            let _ = self.coordination.delete(reservation_key).await;
            return Ok(CapOutcome::Capped);
        }

        Ok(CapOutcome::Granted)
    }

    /// `Release(number) -> {deleted | absent}`. Idempotent; never
    /// decrements usage counters (they reflect allocation attempts, not
    /// eventual call success).
    #[instrument(skip(self))]
    pub async fn release(&self, number: &str) -> AppResult<DeleteOutcome> {
        let key = keys::reservation_key(number);
        self.coordination.delete(&key).await
    }

    /// `LookupReservation(number) -> Reservation | absent`.
    #[instrument(skip(self))]
    pub async fn lookup_reservation(&self, number: &str) -> AppResult<Option<Reservation>> {
        let key = keys::reservation_key(number);
        match self.coordination.get(&key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn finish(
        &self,
        req: &AllocationRequest,
        outcome: AllocationOutcome,
        started: Instant,
        result: AppResult<Allocation>,
    ) -> AppResult<Allocation> {
        if let Some(log) = &self.log {
            let number = match &result {
                Ok(alloc) => alloc.number.clone(),
                Err(_) => String::new(),
            };
            let record = AllocationRecord {
                id: 0,
                number,
                destination: req.destination.clone(),
                campaign: req.campaign.clone(),
                agent: req.agent.clone(),
                latency_ms: started.elapsed().as_millis() as i64,
                outcome,
                created_at: Utc::now(),
            };
            if let Err(e) = log.record(&record).await {
                warn!("failed to record allocation attempt: {}", e);
            }
        }
        result
    }

    /// Bound a single store call by the remaining request deadline,
    /// mapping both "already past deadline" and "timed out waiting" to
    /// `AppError::Unavailable`.
    async fn with_deadline<T>(&self, deadline: Instant, fut: impl Future<Output = AppResult<T>>) -> AppResult<T> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(AppError::Unavailable("request deadline exceeded".into()));
        }
        match tokio::time::timeout(remaining, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Unavailable("store call exceeded request deadline".into())),
        }
    }
}

enum CapOutcome {
    Granted,
    Capped,
}

fn seconds_until_next_minute(now: chrono::DateTime<Utc>) -> u64 {
    (60 - now.second() % 60) as u64
}
