//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub allocator: AllocatorConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Pool Store (PostgreSQL) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_idle_timeout() -> u64 {
    600
}

/// Coordination Store (Redis) configuration
#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    /// Redis connection URL
    pub url: String,
}

/// Allocator configuration — the options recognized by the core per spec.md §6
#[derive(Debug, Deserialize, Clone)]
pub struct AllocatorConfig {
    /// TTL in seconds of a reservation lock (default 300)
    #[serde(default = "default_reservation_ttl_seconds")]
    pub reservation_ttl_seconds: u64,

    /// Per-agent requests/minute limit (default 100)
    #[serde(default = "default_agent_rate_limit_per_minute")]
    pub agent_rate_limit_per_minute: u32,

    /// Max candidates pulled per tier query (default 50)
    #[serde(default = "default_candidate_scan_limit")]
    pub candidate_scan_limit: i64,

    /// Hourly cap applied when a caller-ID is created without an explicit cap
    #[serde(default = "default_hourly_cap")]
    pub default_hourly_cap: i32,

    /// Daily cap applied when a caller-ID is created without an explicit cap
    #[serde(default = "default_daily_cap")]
    pub default_daily_cap: i32,

    /// Deadline in milliseconds bounding one `Allocate` call (default 2000)
    #[serde(default = "default_request_deadline_ms")]
    pub request_deadline_ms: u64,
}

fn default_reservation_ttl_seconds() -> u64 {
    300
}

fn default_agent_rate_limit_per_minute() -> u32 {
    100
}

fn default_candidate_scan_limit() -> i64 {
    50
}

fn default_hourly_cap() -> i32 {
    100
}

fn default_daily_cap() -> i32 {
    500
}

fn default_request_deadline_ms() -> u64 {
    2000
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            reservation_ttl_seconds: default_reservation_ttl_seconds(),
            agent_rate_limit_per_minute: default_agent_rate_limit_per_minute(),
            candidate_scan_limit: default_candidate_scan_limit(),
            default_hourly_cap: default_hourly_cap(),
            default_daily_cap: default_daily_cap(),
            request_deadline_ms: default_request_deadline_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("allocator.reservation_ttl_seconds", 300)?
            .set_default("allocator.agent_rate_limit_per_minute", 100)?
            .set_default("allocator.candidate_scan_limit", 50)?
            .set_default("allocator.default_hourly_cap", 100)?
            .set_default("allocator.default_daily_cap", 500)?
            .set_default("allocator.request_deadline_ms", 2000)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with CALLERID_ prefix
            .add_source(
                Environment::with_prefix("CALLERID")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("CALLERID").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allocator_config() {
        let config = AllocatorConfig::default();
        assert_eq!(config.reservation_ttl_seconds, 300);
        assert_eq!(config.agent_rate_limit_per_minute, 100);
        assert_eq!(config.candidate_scan_limit, 50);
        assert_eq!(config.request_deadline_ms, 2000);
    }
}
