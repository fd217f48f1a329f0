//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! One target:
//!     → deadline.rs (min(global deadline, now + attempt timeout))
//!     → retries.rs (attempt, then wait or stop)
//!     → backoff.rs (how long to wait)
//!     → TargetResult
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - The global deadline is computed once and copied into every engine
//! - Fixed 1s delay by default; exponential backoff is opt-in

pub mod backoff;
pub mod deadline;
pub mod retries;

pub use backoff::BackoffPolicy;
pub use deadline::{compose, AttemptDeadline, DeadlineBound, GlobalDeadline};
pub use retries::{run_retry_loop, FailureKind, RetryPolicy, TargetResult};
