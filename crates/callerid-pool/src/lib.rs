//! Pool Store for the caller-ID allocation engine
//!
//! Durable inventory of caller-IDs and their configured caps, plus the
//! optional append-only allocation history (`spec.md` §4.2). Backed by
//! PostgreSQL via `sqlx`.

pub mod pool;
pub mod repositories;

pub use pool::create_pool;
pub use repositories::*;

pub use callerid_core::{AppError, AppResult};
pub use sqlx::{PgPool, Postgres, Transaction};
