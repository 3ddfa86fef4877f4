//! Transport hardening for Content Gateway calls
//!
//! Provides the retry policy wrapped around every HTTP request and the
//! configuration it is built from.

pub mod config;
pub mod retry;

pub use config::{RequestLogging, ResilienceConfig};
pub use retry::{RetryConfig, RetryPolicy};
