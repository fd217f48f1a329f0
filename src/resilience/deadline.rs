//! Deadline composition.
//!
//! # Responsibilities
//! - Hold the single run-wide deadline, fixed at run start
//! - Bound each attempt by `min(global deadline, now + per-attempt timeout)`
//!
//! # Design Decisions
//! - `GlobalDeadline` is `Copy` and never mutated, so engines get their own
//!   copy at spawn time and no locking is involved
//! - The composed deadline is recomputed for every attempt

use std::time::Duration;
use tokio::time::Instant;

/// The wall-clock ceiling shared by every engine in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalDeadline(Instant);

impl GlobalDeadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    pub fn has_elapsed(&self) -> bool {
        Instant::now() >= self.0
    }

    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }
}

/// Which bound produced an [`AttemptDeadline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineBound {
    PerAttempt,
    Global,
}

/// Effective deadline for a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptDeadline {
    pub at: Instant,
    pub bound: DeadlineBound,
    /// Configured per-attempt budget, kept for error messages.
    pub attempt_timeout: Duration,
}

impl AttemptDeadline {
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

/// Combine the global deadline with the per-attempt timeout.
///
/// Ties go to the global deadline so a cut-off attempt is reported as
/// canceled rather than timed out.
pub fn compose(global: GlobalDeadline, attempt_timeout: Duration) -> AttemptDeadline {
    let per_attempt = Instant::now() + attempt_timeout;
    if global.instant() <= per_attempt {
        AttemptDeadline {
            at: global.instant(),
            bound: DeadlineBound::Global,
            attempt_timeout,
        }
    } else {
        AttemptDeadline {
            at: per_attempt,
            bound: DeadlineBound::PerAttempt,
            attempt_timeout,
        }
    }
}
