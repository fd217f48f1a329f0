//! Concurrency coordinator.
//!
//! # Data Flow
//! ```text
//! RunPlan (targets + policies)
//!     → fanout.rs (one task per target, join all)
//!     → verdict.rs (AllSucceeded | SomeFailed)
//!     → Reporter
//! ```
//!
//! # Design Decisions
//! - Wait for all, fail if any: no short-circuit on the first failure
//! - Results are matched to targets by position, not completion order

pub mod fanout;
pub mod verdict;

pub use fanout::{Coordinator, RunPlan};
pub use verdict::{FailedTarget, RunVerdict};
