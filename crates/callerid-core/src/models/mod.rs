//! Domain models for the caller-ID allocation engine
//!
//! This module contains the core domain models used throughout the application.

pub mod allocation;
pub mod caller_id;
pub mod reservation;

pub use allocation::{Allocation, AllocationOutcome, AllocationRecord, AllocationRequest};
pub use caller_id::CallerId;
pub use reservation::Reservation;
