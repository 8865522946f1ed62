//! Caller-ID Allocation Engine — Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! shared by the Pool Store adapter, the Coordination Store adapter, and
//! the Allocator. It includes:
//!
//! - Domain models (`CallerId`, `Reservation`, `Allocation`, ...)
//! - Common traits for repositories and the coordination store
//! - Unified error handling with HTTP response mapping
//! - Application configuration
//! - Phone-number normalization shared by every layer

pub mod config;
pub mod error;
pub mod models;
pub mod phone;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
