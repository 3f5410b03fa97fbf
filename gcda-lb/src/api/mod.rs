//! Backend HTTP services
//!
//! A single [`BackendClient`] is shared by all API services. Every transport
//! error is converted into the common error taxonomy at this boundary; raw
//! `reqwest` errors never leave this module tree.

pub mod auth;
pub mod preselect;
pub mod submit;
pub mod task;

pub use task::TaskOutcome;

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use gcda_common::Error;

/// Default timeout for backend API requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// User-Agent header sent on every request
const USER_AGENT: &str = concat!("gcda-lb/", env!("CARGO_PKG_VERSION"));

/// Shared backend API client
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the given backend base URL
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .user_agent(USER_AGENT)
                .build()
                .expect("Failed to create HTTP client"),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Backend base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Classify a transport-level failure as transient
    ///
    /// Applies to errors surfaced by `send()`: connection refused/reset,
    /// timeouts, interrupted requests. Response-body decode failures are
    /// mapped separately to [`Error::Malformed`].
    fn transport_error(context: &str, e: reqwest::Error) -> Error {
        Error::Transient(format!("{}: {}", context, e))
    }

    /// Turn a non-2xx response into a terminal rejection
    ///
    /// Extracts the backend's `{"detail": ...}` message when present,
    /// falling back to the bare status code.
    async fn rejection(status: reqwest::StatusCode, response: reqwest::Response) -> Error {
        let detail = response
            .json::<ErrorDetail>()
            .await
            .ok()
            .and_then(|d| d.detail)
            .unwrap_or_else(|| format!("HTTP {}", status));
        Error::Terminal(detail)
    }
}

// ============================================================================
// Backend Error Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: Option<String>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/auth/login"), "http://localhost:8000/auth/login");
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        // Port 9 (discard) has no listener; the connect error must classify
        // as retryable
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client.health().await.unwrap_err();
        assert!(err.is_retryable());
    }
}
