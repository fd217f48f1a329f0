//! Readiness gate for HTTP(S) and TCP endpoints.
//!
//! Blocks until every target answers, or until the retry budget or the
//! global deadline runs out.

pub mod config;
pub mod coordinator;
pub mod observability;
pub mod probe;
pub mod resilience;

pub use config::WaitConfig;
pub use coordinator::{Coordinator, RunPlan, RunVerdict};
pub use resilience::{GlobalDeadline, RetryPolicy, TargetResult};
