//! AI indicator preselection
//!
//! Asks the backend's scorer which indicators likely apply to the
//! reviewer's current task. The wire carries no task identity; the backend
//! infers the task server-side, and staleness is handled entirely by the
//! workflow controller.

use serde::Serialize;
use tracing::debug;

use gcda_common::api::types::PreselectPayload;
use gcda_common::models::PreselectionResult;
use gcda_common::{Error, Result};

use super::BackendClient;

impl BackendClient {
    /// Request AI-assisted indicator preselection
    ///
    /// # Arguments
    /// * `token` - Bearer token of the active session
    /// * `api_key` - Scorer API key, forwarded when configured
    ///
    /// # Errors
    /// - `AuthRequired` for 401 (stale token)
    /// - `Transient` for network failures
    /// - `Terminal` for backend rejections and `success: false` payloads
    /// - `Malformed` when a 2xx body does not decode
    pub async fn preselect(&self, token: &str, api_key: Option<&str>) -> Result<PreselectionResult> {
        debug!(has_api_key = api_key.is_some(), "Requesting indicator preselection");
        let response = self
            .http
            .post(self.url("/ai/preselect-indicators"))
            .bearer_auth(token)
            .json(&PreselectRequest { api_key })
            .send()
            .await
            .map_err(|e| Self::transport_error("Preselection request failed", e))?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(Error::AuthRequired(
                "Session token no longer valid".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(Self::rejection(status, response).await);
        }

        let payload: PreselectPayload = response
            .json()
            .await
            .map_err(|e| Error::Malformed(format!("Preselection response: {}", e)))?;

        result_from_payload(payload)
    }
}

/// Normalize the raw payload into the canonical result
///
/// Both observed response shapes are accepted: flat
/// `preselected_ai_indicators` / `preselected_human_indicators` arrays win
/// when present, the nested `preselected_indicators` block fills in
/// otherwise.
fn result_from_payload(payload: PreselectPayload) -> Result<PreselectionResult> {
    if payload.success == Some(false) {
        return Err(Error::Terminal(payload.message.unwrap_or_else(|| {
            "Preselection declined by backend".to_string()
        })));
    }

    let nested = payload.preselected_indicators.unwrap_or_default();
    Ok(PreselectionResult {
        classification: payload.classification,
        confidence_score: payload.confidence_score,
        ai_indicator_ids: payload
            .preselected_ai_indicators
            .unwrap_or(nested.ai_indicators),
        human_indicator_ids: payload
            .preselected_human_indicators
            .unwrap_or(nested.human_indicators),
        reasoning: payload.reasoning,
    })
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Serialize)]
struct PreselectRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

// ============================================================================
// Tests
// ============================================================================
