//! Label submission: one attempt per call
//!
//! The bounded retry loop lives in the workflow layer; this module performs
//! a single form-encoded POST and classifies the outcome.

use tracing::{debug, info};

use gcda_common::api::types::{MessageResponse, SubmitLabelForm};
use gcda_common::{Error, Result};

use super::BackendClient;

impl BackendClient {
    /// Submit a completed label form, once
    ///
    /// Returns the backend's confirmation message. A 2xx with an
    /// undecodable body still counts as success (the label was recorded);
    /// a stock message is substituted.
    ///
    /// # Errors
    /// - `Transient` for network failures and HTTP 503
    /// - `Terminal` for HTTP 429 (rate limiting is surfaced, never
    ///   hammered) and all other non-2xx statuses
    pub async fn submit_label(&self, form: &SubmitLabelForm) -> Result<String> {
        debug!(website_id = form.website_id, "Submitting label");
        let response = self
            .http
            .post(self.url("/labeler/submit_label"))
            .form(form)
            .send()
            .await
            .map_err(|e| Self::transport_error("Submission request failed", e))?;

        let status = response.status();
        if status.is_success() {
            let message = response
                .json::<MessageResponse>()
                .await
                .map(|m| m.message)
                .unwrap_or_else(|_| "Label submitted".to_string());
            info!(website_id = form.website_id, "Label accepted");
            return Ok(message);
        }

        let detail = response
            .json::<super::ErrorDetail>()
            .await
            .ok()
            .and_then(|d| d.detail);
        Err(classify_rejection(status.as_u16(), detail))
    }
}

/// Classify a non-2xx submission response
///
/// 503 reads as backend overload and is retryable. 429 means the client is
/// being rate limited: surfaced as terminal with a distinct message rather
/// than retried into the limiter. Everything else is a definitive
/// rejection.
fn classify_rejection(status: u16, detail: Option<String>) -> Error {
    match status {
        503 => Error::Transient(
            detail.unwrap_or_else(|| "Submission service unavailable (HTTP 503)".to_string()),
        ),
        429 => Error::Terminal(
            "Submission rate limited; wait a moment before submitting again".to_string(),
        ),
        _ => Error::Terminal(detail.unwrap_or_else(|| format!("HTTP {}", status))),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_503_is_retryable() {
        let err = classify_rejection(503, None);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_429_is_terminal_with_rate_limit_message() {
        let err = classify_rejection(429, None);
        assert!(!err.is_retryable());
        match err {
            Error::Terminal(message) => assert!(message.contains("rate limited")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_client_rejection_is_terminal_and_keeps_detail() {
        let err = classify_rejection(400, Some("User or Website not found.".to_string()));
        assert!(!err.is_retryable());
        match err {
            Error::Terminal(message) => assert_eq!(message, "User or Website not found."),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_500_is_terminal() {
        // Only 503 among the 5xx family signals "try again shortly"
        assert!(!classify_rejection(500, None).is_retryable());
        assert!(!classify_rejection(502, None).is_retryable());
    }
}
