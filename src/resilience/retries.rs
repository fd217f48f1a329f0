//! Retry loop engine.
//!
//! # States
//! ```text
//! Idle → Attempting → Succeeded
//!                   → Waiting → Attempting        (delay elapsed first)
//!                             → Failed(Deadline)  (global deadline first)
//!                   → Failed(MaxAttempts)         (budget used up)
//! ```
//!
//! # Design Decisions
//! - The attempt counter is the primary budget; the global deadline is a
//!   hard ceiling on top of it
//! - Both suspension points (attempt in flight, waiting) are bounded by
//!   the global deadline
//! - Intermediate failures never leave the engine; only the last one is
//!   carried in the terminal result

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time;

use crate::probe::{Probe, ProbeFailure, ProbeOutcome};
use crate::resilience::backoff::BackoffPolicy;
use crate::resilience::deadline::{compose, AttemptDeadline, GlobalDeadline};

/// Retry budget shared read-only by every target of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed before giving up.
    pub max_attempts: u32,
    /// Upper bound for a single attempt.
    pub attempt_timeout: Duration,
    /// Pause between two attempts.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            attempt_timeout: Duration::from_secs(10),
            backoff: BackoffPolicy::default(),
        }
    }
}

/// Why a target ended up failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    MaxAttemptsExceeded,
    GlobalDeadlineExceeded,
    /// The engine task died before reporting.
    Aborted,
}

/// Terminal outcome of one engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResult {
    Success {
        attempts: u32,
    },
    Failed {
        kind: FailureKind,
        attempts: u32,
        last_reason: Option<ProbeFailure>,
    },
}

impl TargetResult {
    pub fn failed(kind: FailureKind, attempts: u32, last_reason: Option<ProbeFailure>) -> Self {
        TargetResult::Failed {
            kind,
            attempts,
            last_reason,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TargetResult::Success { .. })
    }

    pub fn attempts_used(&self) -> u32 {
        match self {
            TargetResult::Success { attempts } | TargetResult::Failed { attempts, .. } => *attempts,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            TargetResult::Success { .. } => None,
            TargetResult::Failed { kind, .. } => Some(*kind),
        }
    }
}

impl fmt::Display for TargetResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (kind, last_reason) = match self {
            TargetResult::Success { .. } => return f.write_str("completed"),
            TargetResult::Failed {
                kind, last_reason, ..
            } => (kind, last_reason),
        };

        let summary = match kind {
            FailureKind::MaxAttemptsExceeded => "reached max number of retries",
            FailureKind::GlobalDeadlineExceeded => "connection not finished in time",
            FailureKind::Aborted => "probe aborted",
        };

        match last_reason {
            Some(reason) => write!(f, "{} error was: {}", summary, reason),
            None => f.write_str(summary),
        }
    }
}

/// Drive `probe` until it succeeds or a budget runs out.
pub async fn run_retry_loop(
    probe: &Probe,
    policy: &RetryPolicy,
    deadline: GlobalDeadline,
) -> TargetResult {
    retry_with(policy, deadline, |attempt_deadline| probe.attempt(attempt_deadline)).await
}

/// Engine core, generic over the attempt so it can be driven by any future.
pub async fn retry_with<F, Fut>(
    policy: &RetryPolicy,
    global: GlobalDeadline,
    mut attempt: F,
) -> TargetResult
where
    F: FnMut(AttemptDeadline) -> Fut,
    Fut: Future<Output = ProbeOutcome>,
{
    let mut attempts: u32 = 0;
    let mut last_failure: Option<ProbeFailure> = None;

    loop {
        if attempts >= policy.max_attempts {
            return TargetResult::failed(FailureKind::MaxAttemptsExceeded, attempts, last_failure);
        }

        let attempt_deadline = compose(global, policy.attempt_timeout);
        let outcome = attempt(attempt_deadline).await;
        attempts += 1;

        match outcome {
            Ok(()) => return TargetResult::Success { attempts },
            Err(failure) => {
                tracing::debug!(attempt = attempts, error = %failure, "Attempt failed");
                last_failure = Some(failure);
            }
        }

        if global.has_elapsed() {
            return TargetResult::failed(
                FailureKind::GlobalDeadlineExceeded,
                attempts,
                last_failure,
            );
        }
        if attempts >= policy.max_attempts {
            return TargetResult::failed(FailureKind::MaxAttemptsExceeded, attempts, last_failure);
        }

        let delay = policy.backoff.delay(attempts);
        tokio::select! {
            biased;
            _ = time::sleep_until(global.instant()) => {
                return TargetResult::failed(
                FailureKind::GlobalDeadlineExceeded,
                attempts,
                last_failure,
            );
            }
            _ = time::sleep(delay) => {}
        }
    }
}
