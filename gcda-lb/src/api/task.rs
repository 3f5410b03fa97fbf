//! Task acquisition: one labeling task per request

use tracing::{debug, info};

use gcda_common::api::types::TaskPayload;
use gcda_common::models::Task;
use gcda_common::{Error, Result};

use super::BackendClient;

/// Outcome of a task request
///
/// "No task available" is a legitimate steady state, not an error, so it is
/// a variant here rather than an `Error`. Surfaces present it
/// informationally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// A task was assigned to this reviewer
    Assigned(Task),
    /// The backend has nothing for this reviewer right now
    NoneAvailable { title: String, message: String },
}

impl BackendClient {
    /// Request a labeling task for the given reviewer
    ///
    /// Never retries internally; re-requesting after a failure is the
    /// caller's explicit decision.
    ///
    /// # Errors
    /// - `Validation` when `reviewer_id` is empty (no network call is made)
    /// - `Transient` for network failures and any non-2xx status (404, 429,
    ///   5xx); the task service's hiccups all read as "ask again later"
    /// - `Malformed` when a 2xx payload matches neither expected shape
    pub async fn request_task(&self, reviewer_id: &str) -> Result<TaskOutcome> {
        let reviewer_id = reviewer_id.trim();
        if reviewer_id.is_empty() {
            return Err(Error::Validation(
                "Reviewer id must not be empty".to_string(),
            ));
        }

        debug!(reviewer_id = %reviewer_id, "Requesting labeling task");
        let response = self
            .http
            .get(self.url("/labeler/task"))
            .query(&[("user_id", reviewer_id)])
            .send()
            .await
            .map_err(|e| Self::transport_error("Task request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transient(format!(
                "Task service returned HTTP {}",
                status
            )));
        }

        let payload: TaskPayload = response
            .json()
            .await
            .map_err(|e| Error::Malformed(format!("Task response: {}", e)))?;

        outcome_from_payload(payload)
    }
}

/// Map the dual-shape task payload into a typed outcome
///
/// Task fields win when fully present; otherwise a message body yields the
/// "none available" outcome. Anything else violates the wire contract.
fn outcome_from_payload(payload: TaskPayload) -> Result<TaskOutcome> {
    if let (Some(website_id), Some(url), Some(reviewer_id), Some(start_time)) = (
        payload.website_id,
        payload.website_url,
        payload.user_id,
        payload.task_start_time,
    ) {
        info!(website_id, "Task assigned");
        return Ok(TaskOutcome::Assigned(Task {
            website_id,
            url,
            reviewer_id,
            start_time,
        }));
    }

    if let Some(message) = payload.message_body {
        return Ok(TaskOutcome::NoneAvailable {
            title: payload
                .message_title
                .unwrap_or_else(|| "No tasks".to_string()),
            message,
        });
    }

    Err(Error::Malformed(
        "Task payload matches neither the task nor the message shape".to_string(),
    ))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn task_payload() -> TaskPayload {
        TaskPayload {
            website_id: Some(12),
            website_url: Some("https://example.com/article".to_string()),
            user_id: Some(7),
            task_start_time: Some("2026-08-01T10:15:00".to_string()),
            message_title: None,
            message_body: None,
        }
    }

    #[test]
    fn test_task_shape_yields_assigned() {
        let outcome = outcome_from_payload(task_payload()).unwrap();
        match outcome {
            TaskOutcome::Assigned(task) => {
                assert_eq!(task.website_id, 12);
                assert_eq!(task.reviewer_id, 7);
                assert_eq!(task.start_time, "2026-08-01T10:15:00");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_message_shape_yields_none_available() {
        let payload = TaskPayload {
            message_title: Some("No Tasks".to_string()),
            message_body: Some("No tasks available at the moment.".to_string()),
            ..Default::default()
        };
        let outcome = outcome_from_payload(payload).unwrap();
        assert_eq!(
            outcome,
            TaskOutcome::NoneAvailable {
                title: "No Tasks".to_string(),
                message: "No tasks available at the moment.".to_string(),
            }
        );
    }

    #[test]
    fn test_message_shape_without_title_gets_default() {
        let payload = TaskPayload {
            message_body: Some("Check back later.".to_string()),
            ..Default::default()
        };
        match outcome_from_payload(payload).unwrap() {
            TaskOutcome::NoneAvailable { title, .. } => assert_eq!(title, "No tasks"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_partial_task_shape_is_malformed() {
        // Task fields present but incomplete, and no message either
        let payload = TaskPayload {
            website_id: Some(12),
            website_url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        let err = outcome_from_payload(payload).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
    }

    #[tokio::test]
    async fn test_empty_reviewer_id_rejected_locally() {
        // Points at a closed port; the validation error must win before
        // any connection is attempted.
        let client = BackendClient::new("http://127.0.0.1:9");
        let err = client.request_task("   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
