//! Content Gateway REST API module
//!
//! Provides the [`CatalogApi`] abstraction the sync engine talks to, the
//! reqwest-backed [`CgwClient`] implementation and the transport retry policy.

pub mod catalog;
pub mod client;
pub mod error;
pub mod models;
pub mod resilience;

pub use catalog::CatalogApi;
pub use client::CgwClient;
pub use error::ClientError;
pub use models::{Metadata, Record, RecordId, parse_record_id};
pub use resilience::{RequestLogging, ResilienceConfig, RetryConfig};
