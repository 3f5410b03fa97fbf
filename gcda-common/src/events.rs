//! Event types for the GCDA labeling workflow
//!
//! Provides the shared [`WorkflowEvent`] enum and the [`EventBus`] used to
//! broadcast workflow progress to whatever surface is attached (terminal
//! driver, tests, future UIs).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::Classification;

// ========================================
// Workflow State
// ========================================

/// Labeling workflow controller states
///
/// Success path: `Idle -> Loading -> Ready -> Submitting -> Idle`.
/// A failed or rejected submission returns to `Ready` with the draft intact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// No current task
    Idle,
    /// Task request in flight
    Loading,
    /// Task loaded, draft editable
    Ready,
    /// Submission pipeline running; draft mutation locked out
    Submitting,
}

impl WorkflowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Loading => "loading",
            WorkflowState::Ready => "ready",
            WorkflowState::Submitting => "submitting",
        }
    }
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ========================================
// Workflow Events
// ========================================

/// GCDA workflow event types
///
/// Events are broadcast via [`EventBus`] and can be serialized for
/// transmission to detached surfaces. All workflow progress flows through
/// this central enum for exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// Workflow controller moved between states
    StateChanged {
        old_state: WorkflowState,
        new_state: WorkflowState,
    },

    /// A task was assigned and is ready for review
    ///
    /// Triggers:
    /// - Surface: render the page under review and a fresh label form
    TaskLoaded { website_id: i64, url: String },

    /// The backend reported no task currently available
    ///
    /// A legitimate steady state, not an error; surfaces present it
    /// informationally.
    NoTaskAvailable { title: String, message: String },

    /// Task acquisition failed
    ///
    /// Not retried automatically; the surface offers an explicit re-request.
    TaskRequestFailed { reason: String },

    /// AI preselection call dispatched for the given task
    PreselectionStarted { website_id: i64 },

    /// Preselection suggestions merged into the current draft
    ///
    /// The suggested verdict (if any) is reported here but never applied to
    /// the draft's label value.
    PreselectionApplied {
        website_id: i64,
        classification: Option<Classification>,
        confidence_score: Option<u8>,
        ai_count: usize,
        human_count: usize,
    },

    /// A preselection result arrived too late and was dropped
    ///
    /// Emitted when the result's task was superseded or a newer trigger
    /// replaced interest in this one. The current draft is untouched.
    PreselectionDiscarded { website_id: i64, reason: String },

    /// Preselection failed; manual labeling continues unassisted
    PreselectionFailed { website_id: i64, reason: String },

    /// Submission pipeline started for the current draft
    SubmissionStarted { website_id: i64 },

    /// A submission attempt failed transiently; another follows after a delay
    ///
    /// Triggers:
    /// - Surface: render "retrying in Ns (attempt k/max)" rather than a
    ///   bare spinner
    SubmissionRetrying {
        attempt: u32,
        max_attempts: u32,
        delay_secs: u64,
    },

    /// The backend accepted the label
    SubmissionSucceeded { website_id: i64, message: String },

    /// The submission pipeline gave up; draft preserved for correction
    SubmissionFailed { website_id: i64, reason: String },
}

// ========================================
// EventBus Implementation
// ========================================

/// Broadcast bus for workflow events
///
/// Wraps `tokio::sync::broadcast`, providing:
/// - Multiple independent subscribers
/// - Non-blocking emission
/// - Bounded buffering (old events dropped past capacity)
///
/// # Examples
///
/// ```
/// use gcda_common::events::EventBus;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Returns a receiver that will receive all events emitted after
    /// subscription. Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` otherwise.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: WorkflowEvent,
    ) -> Result<usize, broadcast::error::SendError<WorkflowEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// The workflow controller uses this for all progress events: a detached
    /// surface is acceptable and must not fail the workflow.
    ///
    /// # Examples
    ///
    /// ```
    /// use gcda_common::events::{EventBus, WorkflowEvent, WorkflowState};
    ///
    /// let event_bus = EventBus::new(100);
    /// event_bus.emit_lossy(WorkflowEvent::StateChanged {
    ///     old_state: WorkflowState::Idle,
    ///     new_state: WorkflowState::Loading,
    /// });
    /// ```
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.emit_lossy(WorkflowEvent::TaskLoaded {
            website_id: 42,
            url: "https://example.com/a".to_string(),
        });

        match rx.try_recv() {
            Ok(WorkflowEvent::TaskLoaded { website_id, url }) => {
                assert_eq!(website_id, 42);
                assert_eq!(url, "https://example.com/a");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_reports_error() {
        let bus = EventBus::new(16);
        assert!(bus
            .emit(WorkflowEvent::SubmissionStarted { website_id: 1 })
            .is_err());
        // Lossy emission never fails regardless of subscribers
        bus.emit_lossy(WorkflowEvent::SubmissionStarted { website_id: 1 });
    }

    #[test]
    fn test_event_serialization_carries_type_tag() {
        let event = WorkflowEvent::SubmissionRetrying {
            attempt: 1,
            max_attempts: 3,
            delay_secs: 2,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"SubmissionRetrying\""));
        assert!(json.contains("\"delay_secs\":2"));

        let back: WorkflowEvent = serde_json::from_str(&json).unwrap();
        match back {
            WorkflowEvent::SubmissionRetrying { attempt, .. } => assert_eq!(attempt, 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_workflow_state_wire_format() {
        assert_eq!(
            serde_json::to_string(&WorkflowState::Submitting).unwrap(),
            "\"submitting\""
        );
        let state: WorkflowState = serde_json::from_str("\"idle\"").unwrap();
        assert_eq!(state, WorkflowState::Idle);
    }
}
