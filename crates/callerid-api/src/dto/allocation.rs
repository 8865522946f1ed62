//! Allocation-related DTOs
//!
//! The wire shapes of the `Allocate`/`Release`/`LookupReservation` surface
//! (`spec.md` §6). Request validation is delegated to `AllocationRequest`
//! itself; these DTOs only reshape it for JSON and add the HTTP-facing
//! error envelope.

use callerid_core::models::{Allocation, AllocationRequest, Reservation};
use serde::{Deserialize, Serialize};

/// Inbound allocation request body.
#[derive(Debug, Clone, Deserialize)]
pub struct AllocateRequestDto {
    pub destination: String,
    pub campaign: String,
    pub agent: String,
}

impl From<AllocateRequestDto> for AllocationRequest {
    fn from(dto: AllocateRequestDto) -> Self {
        Self {
            destination: dto.destination,
            campaign: dto.campaign,
            agent: dto.agent,
        }
    }
}

/// A granted allocation, as returned to the caller.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AllocateResponseDto {
    pub number: String,
    pub area_code: Option<String>,
    pub carrier: Option<String>,
    pub ttl_seconds: u64,
    pub destination: String,
    pub campaign: String,
    pub agent: String,
}

impl From<Allocation> for AllocateResponseDto {
    fn from(alloc: Allocation) -> Self {
        Self {
            number: alloc.number,
            area_code: alloc.area_code,
            carrier: alloc.carrier,
            ttl_seconds: alloc.ttl_seconds,
            destination: alloc.destination,
            campaign: alloc.campaign,
            agent: alloc.agent,
        }
    }
}

/// `Release` response body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReleaseResponseDto {
    /// `true` if a reservation was actually deleted, `false` if it was
    /// already absent (release is idempotent, `spec.md` §7).
    pub deleted: bool,
}

/// `LookupReservation` response body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReservationResponseDto {
    pub agent: String,
    pub campaign: String,
    pub destination: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl From<Reservation> for ReservationResponseDto {
    fn from(r: Reservation) -> Self {
        Self {
            agent: r.agent,
            campaign: r.campaign,
            destination: r.destination,
            created_at: r.created_at,
            expires_at: r.expires_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_dto_converts_to_allocation_request() {
        let dto = AllocateRequestDto {
            destination: "2125551234".into(),
            campaign: "spring-promo".into(),
            agent: "agent-7".into(),
        };
        let req: AllocationRequest = dto.into();
        assert_eq!(req.destination, "2125551234");
        assert_eq!(req.agent, "agent-7");
    }

    #[test]
    fn test_allocation_converts_to_response_dto() {
        let alloc = Allocation {
            number: "2125551001".into(),
            area_code: Some("212".into()),
            carrier: None,
            ttl_seconds: 300,
            destination: "2125551234".into(),
            campaign: "c".into(),
            agent: "a".into(),
        };
        let dto: AllocateResponseDto = alloc.into();
        assert_eq!(dto.number, "2125551001");
        assert_eq!(dto.ttl_seconds, 300);
    }
}
