//! Reservation model
//!
//! A short-lived exclusive claim on a caller-ID, held as a Coordination
//! Store value (`spec.md` §3). The key identity is the caller-ID number
//! itself (`reservation:{number}`); this struct is only the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload stored under `reservation:{number}` in the Coordination Store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub agent: String,
    pub campaign: String,
    pub destination: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Reservation {
    /// Build a reservation payload with `ttl_seconds` remaining life.
    pub fn new(agent: String, campaign: String, destination: String, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            agent,
            campaign,
            destination,
            created_at: now,
            expires_at: now + chrono::Duration::seconds(ttl_seconds as i64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_expiry_from_ttl() {
        let r = Reservation::new("a1".into(), "camp".into(), "5551234".into(), 300);
        let life = r.expires_at - r.created_at;
        assert_eq!(life.num_seconds(), 300);
    }
}
