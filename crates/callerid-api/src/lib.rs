//! HTTP API layer for the caller-ID allocation engine
//!
//! A thin surface over `callerid_allocator::Allocator`: `allocate`,
//! `release`, and `lookup_reservation` only. No account, billing, or
//! reporting endpoints live here (`spec.md` Non-goals).

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;

use callerid_allocator::Allocator;
use callerid_coordination::RedisCoordinationStore;
use callerid_pool::PgCallerIdRepository;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, AllocateRequestDto, AllocateResponseDto};

// Re-export handler configuration
pub use handlers::configure_allocations;

/// The allocation engine, closed over its concrete store implementations.
/// The API layer never needs to be generic over the store traits: it
/// wires one Coordination Store and one Pool Store at start-up and shares
/// the resulting `Allocator` behind an `Arc` across all workers.
pub type AppAllocator = Allocator<RedisCoordinationStore, PgCallerIdRepository>;
