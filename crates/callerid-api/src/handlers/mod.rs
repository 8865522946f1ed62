//! HTTP request handlers

pub mod allocation;

pub use allocation::configure as configure_allocations;
