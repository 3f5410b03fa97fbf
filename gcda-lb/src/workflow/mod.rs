//! Labeling workflow orchestration
//!
//! Coordinates task retrieval, draft editing, AI preselection, and label
//! submission for one signed-in reviewer. All mutation flows through
//! [`WorkflowController`], which is the only writer of the current task, the
//! label draft, and the workflow state, so the three can never disagree
//! about which page is being labeled.

pub mod retry;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use gcda_common::events::{EventBus, WorkflowEvent, WorkflowState};
use gcda_common::models::{LabelValue, PreselectionResult, Session, Task};
use gcda_common::{Error, Result};

use crate::api::{BackendClient, TaskOutcome};
use crate::catalog::IndicatorCatalog;
use crate::draft::LabelDraft;

/// Pause between a task becoming current and its preselection call firing,
/// so rapid task skips do not spend scoring calls on pages nobody reviews
pub const PRESELECT_SETTLE_DELAY: Duration = Duration::from_millis(500);

// ============================================================================
// Preselect Delivery
// ============================================================================

/// A finished preselection call, tagged with the trigger it answers
///
/// Deliveries travel back to the controller over a channel. The tag (trigger
/// sequence number plus task id) lets the controller drop results whose
/// trigger was superseded while the call was in flight.
#[derive(Debug)]
pub struct PreselectDelivery {
    seq: u64,
    website_id: i64,
    outcome: Result<PreselectionResult>,
}

// ============================================================================
// Workflow Controller
// ============================================================================

/// Drives one reviewer's labeling session
///
/// Owns the current task, the label draft, and the workflow state. Surfaces
/// call its operations and render progress from the [`EventBus`]; preselection
/// results arrive asynchronously through the receiver returned by [`new`] and
/// are folded back in via [`apply_preselect_delivery`].
///
/// [`new`]: WorkflowController::new
/// [`apply_preselect_delivery`]: WorkflowController::apply_preselect_delivery
pub struct WorkflowController {
    backend: BackendClient,
    events: EventBus,
    catalog: IndicatorCatalog,

    /// Signed-in reviewer identity; its id joins every task request and its
    /// token authenticates preselection calls
    session: Session,

    /// Optional scoring key forwarded with preselection requests
    api_key: Option<String>,

    state: WorkflowState,
    task: Option<Task>,
    draft: LabelDraft,

    /// Latest preselection trigger; deliveries tagged with an older value
    /// are stale. Shared with in-flight fetch tasks so a superseded fetch
    /// can abandon itself before spending the HTTP call.
    preselect_seq: Arc<AtomicU64>,
    preselect_tx: mpsc::UnboundedSender<PreselectDelivery>,
}

impl WorkflowController {
    /// Create a controller for a signed-in reviewer
    ///
    /// Returns the controller and the receiver carrying preselection
    /// deliveries; the surface's event loop forwards each delivery to
    /// [`apply_preselect_delivery`](Self::apply_preselect_delivery).
    pub fn new(
        backend: BackendClient,
        events: EventBus,
        catalog: IndicatorCatalog,
        session: Session,
        api_key: Option<String>,
    ) -> (Self, mpsc::UnboundedReceiver<PreselectDelivery>) {
        let (preselect_tx, preselect_rx) = mpsc::unbounded_channel();
        let controller = Self {
            backend,
            events,
            catalog,
            session,
            api_key,
            state: WorkflowState::Idle,
            task: None,
            draft: LabelDraft::new(),
            preselect_seq: Arc::new(AtomicU64::new(0)),
            preselect_tx,
        };
        (controller, preselect_rx)
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn draft(&self) -> &LabelDraft {
        &self.draft
    }

    pub fn catalog(&self) -> &IndicatorCatalog {
        &self.catalog
    }

    // ------------------------------------------------------------------
    // Task acquisition
    // ------------------------------------------------------------------

    /// Request the next task from the backend
    ///
    /// Allowed while idle (nothing under review) or ready (skip the current
    /// page without labeling it). Task acquisition is never retried
    /// automatically: a failure surfaces once and waits for an explicit
    /// re-request, leaving the previous task and draft untouched.
    pub async fn next_task(&mut self) -> Result<()> {
        match self.state {
            WorkflowState::Idle | WorkflowState::Ready => {}
            WorkflowState::Loading => {
                return Err(Error::Validation(
                    "A task request is already in flight".to_string(),
                ));
            }
            WorkflowState::Submitting => {
                return Err(Error::Validation(
                    "Cannot change task while a submission is in progress".to_string(),
                ));
            }
        }

        let resume_state = self.state;
        self.set_state(WorkflowState::Loading);

        let reviewer_id = self.session.user_id.to_string();
        let outcome = match self.backend.request_task(&reviewer_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Task request failed");
                self.events.emit_lossy(WorkflowEvent::TaskRequestFailed {
                    reason: e.to_string(),
                });
                self.set_state(resume_state);
                return Err(e);
            }
        };

        match outcome {
            TaskOutcome::Assigned(task) => {
                self.adopt_task(task);
            }
            TaskOutcome::NoneAvailable { title, message } => {
                info!(title = %title, "No task available");
                self.task = None;
                self.draft = LabelDraft::new();
                self.events
                    .emit_lossy(WorkflowEvent::NoTaskAvailable { title, message });
                self.set_state(WorkflowState::Idle);
            }
        }
        Ok(())
    }

    /// Make an assigned task the current one
    ///
    /// The draft is reset only when the task id actually changes; the backend
    /// re-serving the same task (e.g. after a failed submission elsewhere)
    /// keeps the reviewer's partial work.
    fn adopt_task(&mut self, task: Task) {
        let same_task = self
            .task
            .as_ref()
            .map(|current| current.website_id == task.website_id)
            .unwrap_or(false);
        if !same_task {
            self.draft = LabelDraft::new();
        }

        info!(website_id = task.website_id, url = %task.url, "Task loaded");
        self.events.emit_lossy(WorkflowEvent::TaskLoaded {
            website_id: task.website_id,
            url: task.url.clone(),
        });

        self.task = Some(task);
        self.set_state(WorkflowState::Ready);
        self.schedule_preselection();
    }

    // ------------------------------------------------------------------
    // Preselection
    // ------------------------------------------------------------------

    /// Manually re-run preselection for the current task
    ///
    /// Replaces interest in any in-flight result; the draft keeps whatever is
    /// already selected and fresh suggestions merge on arrival.
    pub fn refresh_suggestions(&mut self) -> Result<()> {
        self.editable()?;
        self.schedule_preselection();
        Ok(())
    }

    /// Kick off a preselection fetch for the current task
    ///
    /// Requires a live session token; with an expired one the failure is
    /// reported without any network call. The fetch waits out a short
    /// settling delay before calling the backend; if a newer trigger has
    /// replaced this one by then, the HTTP call is skipped entirely. Results
    /// are delivered through the channel rather than applied here, keeping
    /// all draft mutation on the caller's side.
    fn schedule_preselection(&mut self) {
        let website_id = match self.task.as_ref() {
            Some(task) => task.website_id,
            None => return,
        };

        if self.session.is_expired() {
            warn!(website_id, "Preselection skipped: session token expired");
            self.events.emit_lossy(WorkflowEvent::PreselectionFailed {
                website_id,
                reason: "session expired; sign in again".to_string(),
            });
            return;
        }

        let seq = self.preselect_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let current_seq = Arc::clone(&self.preselect_seq);
        let backend = self.backend.clone();
        let token = self.session.token.clone();
        let api_key = self.api_key.clone();
        let tx = self.preselect_tx.clone();

        debug!(website_id, seq, "Scheduling preselection");
        self.events
            .emit_lossy(WorkflowEvent::PreselectionStarted { website_id });

        tokio::spawn(async move {
            tokio::time::sleep(PRESELECT_SETTLE_DELAY).await;
            if current_seq.load(Ordering::Relaxed) != seq {
                debug!(website_id, seq, "Skipping superseded preselection fetch");
                return;
            }
            let outcome = backend.preselect(&token, api_key.as_deref()).await;
            // Receiver gone means the session is shutting down
            let _ = tx.send(PreselectDelivery {
                seq,
                website_id,
                outcome,
            });
        });
    }

    /// Fold a finished preselection call into the workflow
    ///
    /// Stale deliveries (superseded trigger, a task other than the current
    /// one, or a workflow no longer in the editable state) are dropped
    /// without touching the draft. A fresh successful delivery merges the
    /// suggested indicators into the draft; the suggested verdict is
    /// reported via the bus but never applied to the draft's label value.
    pub fn apply_preselect_delivery(&mut self, delivery: PreselectDelivery) {
        let PreselectDelivery {
            seq,
            website_id,
            outcome,
        } = delivery;

        if seq != self.preselect_seq.load(Ordering::Relaxed) {
            debug!(website_id, seq, "Discarding superseded preselection result");
            self.events.emit_lossy(WorkflowEvent::PreselectionDiscarded {
                website_id,
                reason: "superseded by a newer request".to_string(),
            });
            return;
        }

        if self.task.as_ref().map(|t| t.website_id) != Some(website_id) {
            debug!(website_id, "Discarding preselection result for a replaced task");
            self.events.emit_lossy(WorkflowEvent::PreselectionDiscarded {
                website_id,
                reason: "the task under review changed".to_string(),
            });
            return;
        }

        if self.state != WorkflowState::Ready {
            debug!(website_id, state = %self.state, "Discarding preselection result outside editable state");
            self.events.emit_lossy(WorkflowEvent::PreselectionDiscarded {
                website_id,
                reason: "the draft is not editable right now".to_string(),
            });
            return;
        }

        match outcome {
            Ok(result) => {
                self.draft.apply_preselection(&result);
                info!(
                    website_id,
                    ai = result.ai_indicator_ids.len(),
                    human = result.human_indicator_ids.len(),
                    "Preselection applied"
                );
                self.events.emit_lossy(WorkflowEvent::PreselectionApplied {
                    website_id,
                    classification: result.classification,
                    confidence_score: result.confidence_score,
                    ai_count: result.ai_indicator_ids.len(),
                    human_count: result.human_indicator_ids.len(),
                });
            }
            Err(e) => {
                warn!(website_id, error = %e, "Preselection failed");
                self.events.emit_lossy(WorkflowEvent::PreselectionFailed {
                    website_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    // ------------------------------------------------------------------
    // Draft editing
    // ------------------------------------------------------------------

    /// Set the draft's verdict
    pub fn set_label(&mut self, value: LabelValue) -> Result<()> {
        self.editable()?;
        self.draft.set_label(value);
        Ok(())
    }

    /// Toggle a free-form tag; returns whether it is selected afterwards
    pub fn toggle_tag(&mut self, tag: &str) -> Result<bool> {
        self.editable()?;
        Ok(self.draft.toggle_tag(tag))
    }

    /// Toggle an AI-indicator checkbox; returns whether it is selected afterwards
    pub fn toggle_ai_indicator(&mut self, id: &str) -> Result<bool> {
        self.editable()?;
        Ok(self.draft.toggle_ai_indicator(id))
    }

    /// Toggle a human-indicator checkbox; returns whether it is selected afterwards
    pub fn toggle_human_indicator(&mut self, id: &str) -> Result<bool> {
        self.editable()?;
        Ok(self.draft.toggle_human_indicator(id))
    }

    fn editable(&self) -> Result<()> {
        if self.state != WorkflowState::Ready {
            return Err(Error::Validation(
                "No task is open for editing".to_string(),
            ));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Submission
    // ------------------------------------------------------------------

    /// Submit the current draft as the label for the current task
    ///
    /// Validation runs before the submission pipeline starts, so an
    /// incomplete draft never consumes a retry attempt. On success the
    /// workflow returns to idle and immediately requests the next task; on
    /// failure the task and draft stay intact for correction.
    pub async fn submit(&mut self) -> Result<String> {
        self.editable()?;
        let task = match self.task.as_ref() {
            Some(task) => task.clone(),
            None => {
                return Err(Error::Validation("No task is open for editing".to_string()));
            }
        };
        let form = self.draft.to_form(&task)?;

        self.set_state(WorkflowState::Submitting);
        self.events.emit_lossy(WorkflowEvent::SubmissionStarted {
            website_id: task.website_id,
        });

        let backend = self.backend.clone();
        let submitted = retry::run_attempts("submit_label", &self.events, |_| {
            let backend = backend.clone();
            let form = form.clone();
            async move { backend.submit_label(&form).await }
        })
        .await;

        match submitted {
            Ok(message) => {
                info!(website_id = task.website_id, "Label submitted");
                self.events.emit_lossy(WorkflowEvent::SubmissionSucceeded {
                    website_id: task.website_id,
                    message: message.clone(),
                });
                self.task = None;
                self.draft = LabelDraft::new();
                self.set_state(WorkflowState::Idle);

                // Line up the next task right away; a failure here surfaces
                // through the bus and leaves the workflow idle for a manual
                // re-request rather than clouding the successful submission.
                if let Err(e) = self.next_task().await {
                    warn!(error = %e, "Follow-up task request failed");
                }
                Ok(message)
            }
            Err(e) => {
                warn!(website_id = task.website_id, error = %e, "Submission failed");
                self.events.emit_lossy(WorkflowEvent::SubmissionFailed {
                    website_id: task.website_id,
                    reason: e.to_string(),
                });
                self.set_state(WorkflowState::Ready);
                Err(e)
            }
        }
    }

    fn set_state(&mut self, new_state: WorkflowState) {
        if self.state == new_state {
            return;
        }
        let old_state = self.state;
        self.state = new_state;
        debug!(old = %old_state, new = %new_state, "Workflow state changed");
        self.events.emit_lossy(WorkflowEvent::StateChanged {
            old_state,
            new_state,
        });
    }
}

// ============================================================================
// Tests
// ============================================================================
