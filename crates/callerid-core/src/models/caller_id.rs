//! Caller-ID model
//!
//! Represents one dialable number in the rotation pool, the Pool Store's
//! authoritative catalog entity (`spec.md` §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::phone;

/// One dialable number under rotation.
///
/// Invariants: `number` is unique and immutable; `hourly_cap <= daily_cap`;
/// an inactive entry is never returned by candidate queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerId {
    /// Canonical digit string, 10-15 digits, unique key of the pool.
    pub number: String,

    /// Geographic prefix derived from `number`; `None` for non-NANP numbers.
    pub area_code: Option<String>,

    /// Free-form carrier tag (advisory only; never read by the allocator).
    pub carrier: Option<String>,

    /// Maximum allocations permitted in any rolling clock-hour bucket.
    pub hourly_cap: i32,

    /// Maximum allocations permitted in any clock-day bucket.
    pub daily_cap: i32,

    /// Most recent successful allocation; `None` means "never used."
    pub last_used_at: Option<DateTime<Utc>>,

    /// Inactive entries are invisible to the allocator.
    pub active: bool,

    /// Opaque metadata for external tooling; never read by the allocator.
    pub metadata: HashMap<String, String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CallerId {
    /// Construct a new caller-ID, deriving `area_code` from `number`.
    pub fn new(number: String, carrier: Option<String>, hourly_cap: i32, daily_cap: i32) -> Self {
        let now = Utc::now();
        let area_code = phone::area_code(&number);
        Self {
            number,
            area_code,
            carrier,
            hourly_cap,
            daily_cap,
            last_used_at: None,
            active: true,
            metadata: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// `true` when this caller-ID can never be allocated: `hourly_cap == 0`
    /// (spec.md §8 boundary behavior) or the entry is inactive.
    pub fn is_eligible(&self) -> bool {
        self.active && self.hourly_cap > 0 && self.daily_cap > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_area_code() {
        let c = CallerId::new("2125551001".to_string(), Some("Verizon".into()), 100, 500);
        assert_eq!(c.area_code.as_deref(), Some("212"));
        assert!(c.active);
        assert!(c.last_used_at.is_none());
    }

    #[test]
    fn test_new_international_has_no_area_code() {
        let c = CallerId::new("442079460000".to_string(), None, 100, 500);
        assert_eq!(c.area_code, None);
    }

    #[test]
    fn test_zero_hourly_cap_never_eligible() {
        let c = CallerId::new("2125551001".to_string(), None, 0, 500);
        assert!(!c.is_eligible());
    }

    #[test]
    fn test_inactive_never_eligible() {
        let mut c = CallerId::new("2125551001".to_string(), None, 100, 500);
        c.active = false;
        assert!(!c.is_eligible());
    }
}
