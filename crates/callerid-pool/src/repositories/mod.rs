//! Repository implementations
//!
//! Concrete implementations of the repository traits defined in
//! `callerid-core`, using `sqlx` for PostgreSQL access.

pub mod allocation_log_repo;
pub mod caller_id_repo;

pub use allocation_log_repo::PgAllocationLogRepository;
pub use caller_id_repo::PgCallerIdRepository;
