//! Errors raised by the Content Gateway client

use thiserror::Error;

/// Any failure talking to the Content Gateway
#[derive(Debug, Error)]
pub enum ClientError {
    /// The Gateway answered with a non-2xx status
    #[error("content gateway API returned error: status_code: {status}, reason: {reason}, error: {body}")]
    Api {
        status: u16,
        reason: String,
        body: String,
    },

    /// The request never produced a response (connection, TLS, timeout)
    #[error("exception occurred during API call: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body could not be interpreted
    #[error("unexpected response from content gateway: {0}")]
    Decode(String),

    /// Credentials are missing or unusable
    #[error("{0}")]
    Auth(String),
}

impl ClientError {
    /// Build an API error from a status code and the raw body
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();

        Self::Api {
            status,
            reason,
            body: body.into(),
        }
    }

    /// HTTP status of the failed call, if the Gateway answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the transport layer should try the call again
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { status, .. } => (500..=511).contains(status),
            Self::Request(err) => err.is_connect() || err.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_message() {
        let err = ClientError::api(404, "product not found");
        assert_eq!(
            err.to_string(),
            "content gateway API returned error: status_code: 404, reason: Not Found, error: product not found"
        );
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_only_server_errors_are_retryable() {
        assert!(ClientError::api(500, "").is_retryable());
        assert!(ClientError::api(503, "").is_retryable());
        assert!(ClientError::api(511, "").is_retryable());
        assert!(!ClientError::api(400, "").is_retryable());
        assert!(!ClientError::api(404, "").is_retryable());
        assert!(!ClientError::Decode("x".to_string()).is_retryable());
    }
}
