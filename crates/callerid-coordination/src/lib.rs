//! Coordination Store adapter for the caller-ID allocation engine
//!
//! Provides the Redis-backed implementation of `CoordinationStore`
//! (`callerid_core::traits`): the single-key atomics the Allocator uses for
//! reservation locks, usage counters, and per-agent rate limiting
//! (`spec.md` §4.3).
//!
//! # Features
//!
//! - Connection pooling via Redis `ConnectionManager`
//! - `SET NX EX` for the mutual-exclusion reservation lock
//! - A Lua script for the "increment, set TTL only if newly created" counter
//!   primitive, so a crash between `INCR` and `EXPIRE` can never leave a
//!   counter with no expiry
//! - Comprehensive error classification into `AppError`
//!
//! # Example
//!
//! ```no_run
//! use callerid_coordination::RedisCoordinationStore;
//! use callerid_core::traits::CoordinationStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = RedisCoordinationStore::new("redis://127.0.0.1:6379").await?;
//!     store.set_if_absent("reservation:2125551001", "agent-7", 300).await?;
//!     Ok(())
//! }
//! ```

pub mod keys;

use callerid_core::error::AppError;
use callerid_core::traits::{CoordinationStore, DeleteOutcome, SetOutcome};
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError, Script};
use tracing::{debug, error, warn};

/// Lua script implementing "increment the counter at `KEYS[1]`; if this
/// call created it (post-increment value is 1), set its expiry to
/// `ARGV[1]` seconds". Running both steps inside one `EVAL` is what makes
/// the primitive atomic: a plain `INCR` followed by a separate `EXPIRE`
/// call could crash in between and leave an immortal counter.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local v = redis.call('INCR', KEYS[1])
if v == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return v
"#;

/// Redis-backed `CoordinationStore`.
///
/// Wraps a `ConnectionManager` for efficient, multiplexed access. All
/// operations are async and return `Result<_, AppError>`.
#[derive(Clone)]
pub struct RedisCoordinationStore {
    manager: ConnectionManager,
    incr_with_ttl: Script,
}

impl RedisCoordinationStore {
    /// Connect to Redis at `url`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::CacheConnection` if the URL is malformed or the
    /// connection cannot be established.
    pub async fn new(url: &str) -> Result<Self, AppError> {
        debug!("Connecting to Redis at {}", url);

        let client = Client::open(url).map_err(|e| {
            error!("Failed to create Redis client: {}", e);
            AppError::CacheConnection(format!("Invalid Redis URL: {}", e))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to establish Redis connection: {}", e);
            AppError::CacheConnection(format!("Connection failed: {}", e))
        })?;

        debug!("Redis connection established successfully");
        Ok(Self {
            manager,
            incr_with_ttl: Script::new(INCR_WITH_TTL_SCRIPT),
        })
    }

    /// Ping the Redis server to check connectivity.
    pub async fn ping(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Redis ping failed: {}", e);
                AppError::Cache(format!("Ping failed: {}", e))
            })?;
        Ok(())
    }

    /// Flush all keys from the current database. Testing/development only.
    #[cfg(test)]
    pub async fn flush_db(&self) -> Result<(), AppError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("FLUSHDB")
            .query_async(&mut conn)
            .await
            .map_err(|e| {
                error!("Failed to flush database: {}", e);
                AppError::Cache(format!("Flush failed: {}", e))
            })?;
        Ok(())
    }

    fn map_redis_error(err: RedisError) -> AppError {
        match err.kind() {
            redis::ErrorKind::IoError => {
                error!("Redis I/O error: {}", err);
                AppError::Unavailable(format!("Coordination Store I/O error: {}", err))
            }
            redis::ErrorKind::TypeError => {
                warn!("Redis type error: {}", err);
                AppError::Cache(format!("Type mismatch: {}", err))
            }
            _ => {
                error!("Redis error: {}", err);
                AppError::Cache(err.to_string())
            }
        }
    }
}

#[async_trait::async_trait]
impl CoordinationStore for RedisCoordinationStore {
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl_seconds: u64,
    ) -> Result<SetOutcome, AppError> {
        debug!("SET {} NX EX {}", key, ttl_seconds);
        let mut conn = self.manager.clone();

        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_redis_error)?;

        Ok(match result {
            Some(_) => SetOutcome::Created,
            None => SetOutcome::AlreadyExists,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        debug!("GET {}", key);
        let mut conn = self.manager.clone();
        conn.get(key).await.map_err(Self::map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, AppError> {
        debug!("DEL {}", key);
        let mut conn = self.manager.clone();
        let deleted: i64 = conn.del(key).await.map_err(Self::map_redis_error)?;
        Ok(if deleted > 0 {
            DeleteOutcome::Deleted
        } else {
            DeleteOutcome::Absent
        })
    }

    async fn increment_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<i64, AppError> {
        debug!("INCR {} (TTL if new: {}s)", key, ttl_seconds);
        let mut conn = self.manager.clone();

        self.incr_with_ttl
            .key(key)
            .arg(ttl_seconds)
            .invoke_async(&mut conn)
            .await
            .map_err(Self::map_redis_error)
    }

    async fn decrement(&self, key: &str) -> Result<i64, AppError> {
        debug!("DECR {}", key);
        let mut conn = self.manager.clone();
        conn.decr(key, 1).await.map_err(Self::map_redis_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> RedisCoordinationStore {
        let store = RedisCoordinationStore::new("redis://127.0.0.1:6379")
            .await
            .expect("Failed to connect to Redis");
        store.flush_db().await.expect("Failed to flush DB");
        store
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_ping() {
        let store = setup_store().await;
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_set_if_absent_is_exclusive() {
        let store = setup_store().await;

        let first = store.set_if_absent("lock:a", "agent-1", 60).await.unwrap();
        assert_eq!(first, SetOutcome::Created);

        let second = store.set_if_absent("lock:a", "agent-2", 60).await.unwrap();
        assert_eq!(second, SetOutcome::AlreadyExists);

        assert_eq!(store.get("lock:a").await.unwrap(), Some("agent-1".into()));
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_delete_is_idempotent() {
        let store = setup_store().await;

        store.set_if_absent("lock:b", "x", 60).await.unwrap();
        assert_eq!(store.delete("lock:b").await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(store.delete("lock:b").await.unwrap(), DeleteOutcome::Absent);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_increment_with_ttl_sets_expiry_once() {
        let store = setup_store().await;

        let first = store.increment_with_ttl("usage:x", 1).await.unwrap();
        assert_eq!(first, 1);
        let second = store.increment_with_ttl("usage:x", 3600).await.unwrap();
        assert_eq!(second, 2);

        // TTL from the first call (1s) governs, not the second call's 3600s.
        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
        assert_eq!(store.get("usage:x").await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore] // Requires Redis running
    async fn test_decrement_compensates() {
        let store = setup_store().await;

        store.increment_with_ttl("usage:y", 60).await.unwrap();
        store.increment_with_ttl("usage:y", 60).await.unwrap();
        let after = store.decrement("usage:y").await.unwrap();
        assert_eq!(after, 1);
    }
}
