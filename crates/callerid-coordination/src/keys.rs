//! Coordination Store key layout
//!
//! Key naming is part of the external contract (`spec.md` §6) because it
//! is observed by operational tooling, so these builders are the single
//! source of truth for the on-the-wire key strings.
//!
//! # Key Patterns
//!
//! - `reservation:{number}` — the live reservation lock for a caller-ID.
//! - `usage:hourly:{number}:{YYYYMMDDHH}` — hourly usage counter.
//! - `usage:daily:{number}:{YYYYMMDD}` — daily usage counter.
//! - `ratelimit:{agent}:{YYYYMMDDHHMM}` — per-agent per-minute request counter.

use chrono::{DateTime, Utc};

/// TTL safety margin on the hourly bucket so a late write never outlives
/// the bucket it's trying to expire with (`spec.md` §3: "at least the
/// bucket width plus a small grace").
pub const HOURLY_TTL_SECS: u64 = 3700;

/// TTL safety margin on the daily bucket.
pub const DAILY_TTL_SECS: u64 = 90_000;

/// TTL for the per-agent per-minute rate counter.
pub const RATE_LIMIT_TTL_SECS: u64 = 60;

/// `reservation:{number}`
pub fn reservation_key(number: &str) -> String {
    format!("reservation:{number}")
}

/// `usage:hourly:{number}:{YYYYMMDDHH}`
pub fn hourly_usage_key(number: &str, at: DateTime<Utc>) -> String {
    format!("usage:hourly:{number}:{}", at.format("%Y%m%d%H"))
}

/// `usage:daily:{number}:{YYYYMMDD}`
pub fn daily_usage_key(number: &str, at: DateTime<Utc>) -> String {
    format!("usage:daily:{number}:{}", at.format("%Y%m%d"))
}

/// `ratelimit:{agent}:{YYYYMMDDHHMM}`
pub fn rate_limit_key(agent: &str, at: DateTime<Utc>) -> String {
    format!("ratelimit:{agent}:{}", at.format("%Y%m%d%H%M"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 28, 14, 35, 9).unwrap()
    }

    #[test]
    fn test_reservation_key() {
        assert_eq!(reservation_key("2125551001"), "reservation:2125551001");
    }

    #[test]
    fn test_hourly_usage_key() {
        assert_eq!(
            hourly_usage_key("2125551001", fixed_time()),
            "usage:hourly:2125551001:2026072814"
        );
    }

    #[test]
    fn test_daily_usage_key() {
        assert_eq!(
            daily_usage_key("2125551001", fixed_time()),
            "usage:daily:2125551001:20260728"
        );
    }

    #[test]
    fn test_rate_limit_key() {
        assert_eq!(
            rate_limit_key("agent-7", fixed_time()),
            "ratelimit:agent-7:202607281435"
        );
    }

    #[test]
    fn test_key_prefixes_are_distinct() {
        let t = fixed_time();
        let keys = vec![
            reservation_key("1"),
            hourly_usage_key("1", t),
            daily_usage_key("1", t),
            rate_limit_key("1", t),
        ];
        let unique: std::collections::HashSet<_> = keys.iter().collect();
        assert_eq!(unique.len(), keys.len());
    }
}
