//! Bounded submission retry
//!
//! Exponential backoff without jitter. The delay after a failed attempt is
//! a pure function of the 1-based attempt number (2^attempt seconds), and
//! the loop is an explicit bounded loop: at most three attempts in total,
//! strictly sequential, never continuing past a success.

use std::time::Duration;

use gcda_common::events::{EventBus, WorkflowEvent};
use gcda_common::Result;

/// Maximum number of submission attempts (one initial + two retries)
pub const MAX_SUBMIT_ATTEMPTS: u32 = 3;

/// Backoff delay after a failed attempt
///
/// `attempt` is 1-based: 2s after the first attempt, 4s after the second.
pub fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64 << attempt)
}

/// Run an operation with bounded exponential-backoff retry
///
/// Only errors classified retryable ([`Error::is_retryable`]) are retried;
/// validation and terminal failures propagate immediately without consuming
/// the attempt budget. A `SubmissionRetrying` event is emitted before each
/// delay so surfaces can render "retrying in Ns (attempt k/max)" instead of
/// a bare spinner.
///
/// # Arguments
/// * `operation_name` - Name for logging
/// * `events` - Bus receiving retry progress
/// * `operation` - Async closure performing one attempt; receives the
///   1-based attempt number
///
/// [`Error::is_retryable`]: gcda_common::Error::is_retryable
pub async fn run_attempts<F, Fut, T>(
    operation_name: &str,
    events: &EventBus,
    mut operation: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        if attempt > 1 {
            tracing::debug!(operation = operation_name, attempt, "Retrying");
        }

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) if err.is_retryable() && attempt < MAX_SUBMIT_ATTEMPTS => {
                let delay = backoff_delay(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "Transient failure, will retry after backoff"
                );
                events.emit_lossy(WorkflowEvent::SubmissionRetrying {
                    attempt,
                    max_attempts: MAX_SUBMIT_ATTEMPTS,
                    delay_secs: delay.as_secs(),
                });
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if err.is_retryable() {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        "Giving up after final transient failure"
                    );
                }
                return Err(err);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gcda_common::Error;
    use std::cell::RefCell;
    use tokio::time::Instant;

    fn drain_retry_events(
        rx: &mut tokio::sync::broadcast::Receiver<WorkflowEvent>,
    ) -> Vec<(u32, u64)> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let WorkflowEvent::SubmissionRetrying {
                attempt,
                delay_secs,
                ..
            } = event
            {
                seen.push((attempt, delay_secs));
            }
        }
        seen
    }

    #[test]
    fn test_backoff_schedule_is_pure_powers_of_two() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(2), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_skips_backoff() {
        let events = EventBus::new(16);
        let mut rx = events.subscribe();

        let result = run_attempts("submit", &events, |_| async { Ok::<i32, Error>(42) }).await;

        assert_eq!(result.unwrap(), 42);
        assert!(drain_retry_events(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_transient_failures_follow_schedule() {
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let start = Instant::now();
        let attempt_times = RefCell::new(Vec::new());

        let result = run_attempts("submit", &events, |_| {
            attempt_times.borrow_mut().push(start.elapsed());
            async { Err::<i32, Error>(Error::Transient("backend unavailable".to_string())) }
        })
        .await;

        assert!(result.is_err());
        // Attempts at t=0, then after 2s, then after a further 4s; no fourth
        let times = attempt_times.borrow();
        assert_eq!(times.len(), 3);
        assert_eq!(times[0], Duration::from_secs(0));
        assert_eq!(times[1], Duration::from_secs(2));
        assert_eq!(times[2], Duration::from_secs(6));

        assert_eq!(drain_retry_events(&mut rx), vec![(1, 2), (2, 4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_one_transient_failure() {
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let calls = RefCell::new(0u32);

        let result = run_attempts("submit", &events, |_| {
            *calls.borrow_mut() += 1;
            let n = *calls.borrow();
            async move {
                if n == 1 {
                    Err(Error::Transient("blip".to_string()))
                } else {
                    Ok("accepted")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "accepted");
        assert_eq!(*calls.borrow(), 2);
        assert_eq!(drain_retry_events(&mut rx), vec![(1, 2)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_failure_is_not_retried() {
        let events = EventBus::new(16);
        let calls = RefCell::new(0u32);

        let result = run_attempts("submit", &events, |_| {
            *calls.borrow_mut() += 1;
            async { Err::<i32, Error>(Error::Terminal("rejected".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.borrow(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validation_failure_is_not_retried() {
        let events = EventBus::new(16);
        let calls = RefCell::new(0u32);

        let result = run_attempts("submit", &events, |_| {
            *calls.borrow_mut() += 1;
            async { Err::<i32, Error>(Error::Validation("missing verdict".to_string())) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(*calls.borrow(), 1);
    }
}
