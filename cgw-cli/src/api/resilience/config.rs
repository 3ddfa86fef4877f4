//! Transport settings shared by every Gateway call

use super::retry::RetryConfig;

/// What the client logs about each request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLogging {
    /// Method and endpoint of every call, at debug level
    pub requests: bool,
    /// Response body of failed calls, at error level
    pub error_bodies: bool,
}

impl Default for RequestLogging {
    fn default() -> Self {
        Self {
            requests: true,
            error_bodies: true,
        }
    }
}

/// Retry policy, request logging and TLS checking for a [`CgwClient`](crate::api::CgwClient)
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,
    pub logging: RequestLogging,
    /// Reject invalid server certificates
    pub verify_tls: bool,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            logging: RequestLogging::default(),
            verify_tls: true,
        }
    }
}
