//! Unified error handling for the caller-ID allocation engine
//!
//! This module provides a comprehensive error type that covers all possible
//! failure scenarios in the application, with automatic HTTP response mapping.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Main application error type
///
/// All errors in the application should be converted to this type.
/// It implements `ResponseError` for automatic HTTP response generation.
#[derive(Error, Debug)]
pub enum AppError {
    // ==================== Store Errors (ambient) ====================
    #[error("Database error: {0}")]
    Database(String),

    #[error("Database pool error: {0}")]
    Pool(String),

    #[error("Transaction failed: {0}")]
    Transaction(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Cache connection failed: {0}")]
    CacheConnection(String),

    // ==================== Allocator Errors (spec.md §7) ====================
    /// destination/campaign/agent failed validation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// destination is specifically malformed
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),

    /// per-agent minute cap exceeded
    #[error("Rate limited: agent {agent} exceeded {limit} requests/minute, retry after {retry_after_secs}s")]
    RateLimited {
        agent: String,
        limit: u32,
        retry_after_secs: u64,
    },

    /// all candidates reserved, capped, or inactive
    #[error("No caller-ID available")]
    NoneAvailable,

    /// transient store failure; safe to retry
    #[error("Store temporarily unavailable: {0}")]
    Unavailable(String),

    /// admin-path only: attempt to create an existing caller-ID
    #[error("Conflict: {0}")]
    Conflict(String),

    // ==================== Resource Errors ====================
    #[error("Not found: {0}")]
    NotFound(String),

    // ==================== Internal Errors (ambient) ====================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl AppError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) | AppError::InvalidDestination(_) => {
                StatusCode::BAD_REQUEST
            }

            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            AppError::Conflict(_) => StatusCode::CONFLICT,

            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            AppError::NoneAvailable => StatusCode::SERVICE_UNAVAILABLE,

            AppError::Unavailable(_)
            | AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Transaction(_)
            | AppError::Cache(_)
            | AppError::CacheConnection(_) => StatusCode::SERVICE_UNAVAILABLE,

            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "pool_error",
            AppError::Transaction(_) => "transaction_error",
            AppError::Cache(_) => "cache_error",
            AppError::CacheConnection(_) => "cache_connection_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::InvalidDestination(_) => "invalid_destination",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::NoneAvailable => "none_available",
            AppError::Unavailable(_) => "unavailable",
            AppError::Conflict(_) => "conflict",
            AppError::NotFound(_) => "not_found",
            AppError::Internal(_) => "internal_error",
            AppError::Config(_) => "config_error",
            AppError::Serialization(_) => "serialization_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let body = json!({
            "error": self.error_code(),
            "message": self.to_string(),
            "status": status.as_u16(),
        });

        HttpResponse::build(status).json(body)
    }
}

// ==================== From implementations ====================

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            AppError::InvalidDestination("too short".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NoneAvailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::RateLimited {
                agent: "a1".into(),
                limit: 100,
                retry_after_secs: 60,
            }
            .status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(AppError::NoneAvailable.error_code(), "none_available");
        assert_eq!(
            AppError::InvalidInput("bad".into()).error_code(),
            "invalid_input"
        );
    }
}
