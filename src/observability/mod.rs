//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engines and coordinator produce:
//!     → logging.rs (structured log events, stderr)
//!     → report.rs (one event per target, one per run)
//!
//! Consumers:
//!     → operator / CI logs
//!     → JSON summary on stdout (--output json)
//! ```
//!
//! # Design Decisions
//! - Every run carries a `run_id` span field
//! - Each engine runs inside a span naming its target

pub mod logging;
pub mod report;

pub use report::{JsonReporter, Reporter, TargetReport, TracingReporter};
