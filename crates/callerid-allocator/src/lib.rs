//! The caller-ID allocation engine
//!
//! This crate contains the core decision logic: given an `AllocationRequest`,
//! pick a caller-ID from the pool, reserve it exclusively, enforce usage
//! caps and the per-agent rate limit, and record the outcome. It is the
//! only component of the system that must be concurrency-correct under
//! heavy contention.
//!
//! # Architecture
//!
//! - The `Allocator` owns a Coordination Store handle and a Pool Store
//!   handle, both injected as capability values constructed at start-up.
//! - Every store call is an explicit suspension point; no in-process lock
//!   is held across one.
//! - The allocator is generic over both store traits so it can be tested
//!   against in-memory fakes without a live Redis/Postgres.
//!
//! # Modules
//!
//! - `allocator` — the `Allocator` struct and `Allocate`/`Release`/
//!   `LookupReservation` operations.

pub mod allocator;

pub use allocator::Allocator;
