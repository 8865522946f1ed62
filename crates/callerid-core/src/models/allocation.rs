//! Allocation request/response models
//!
//! The payloads that cross the Allocator's public boundary (`spec.md` §6),
//! plus the append-only `AllocationRecord` history row consumed only by
//! dashboards (never read back by the allocator itself).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Inbound allocation request.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AllocationRequest {
    /// Destination phone number (digits, possibly with formatting).
    #[validate(length(min = 1))]
    pub destination: String,

    /// Campaign name.
    #[validate(length(min = 1))]
    pub campaign: String,

    /// Agent name.
    #[validate(length(min = 1))]
    pub agent: String,
}

/// A granted allocation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Allocation {
    pub number: String,
    pub area_code: Option<String>,
    pub carrier: Option<String>,
    pub ttl_seconds: u64,
    pub destination: String,
    pub campaign: String,
    pub agent: String,
}

/// Append-only log row per granted allocation (`spec.md` §3).
/// Consumed only by dashboards; never read by the allocator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub id: i64,
    pub number: String,
    pub destination: String,
    pub campaign: String,
    pub agent: String,
    pub latency_ms: i64,
    pub outcome: AllocationOutcome,
    pub created_at: DateTime<Utc>,
}

/// Final outcome recorded for an allocation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationOutcome {
    Granted,
    RateLimited,
    NoneAvailable,
    Unavailable,
    InvalidInput,
}

impl std::fmt::Display for AllocationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AllocationOutcome::Granted => "granted",
            AllocationOutcome::RateLimited => "rate_limited",
            AllocationOutcome::NoneAvailable => "none_available",
            AllocationOutcome::Unavailable => "unavailable",
            AllocationOutcome::InvalidInput => "invalid_input",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn test_allocation_request_rejects_blank_fields() {
        let req = AllocationRequest {
            destination: "5551234".into(),
            campaign: String::new(),
            agent: "a1".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_allocation_request_accepts_filled_fields() {
        let req = AllocationRequest {
            destination: "5551234".into(),
            campaign: "camp".into(),
            agent: "a1".into(),
        };
        assert!(req.validate().is_ok());
    }
}
