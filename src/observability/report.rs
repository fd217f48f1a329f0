//! Per-target and per-run reporting.
//!
//! # Responsibilities
//! - Receive one terminal event per target and one per run
//! - Render them to logs (`TracingReporter`) or as a JSON summary
//!   (`JsonReporter`)
//!
//! # Design Decisions
//! - The engines and coordinator never format output themselves
//! - Reporters are called concurrently from engine tasks, hence `Sync`

use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::coordinator::RunVerdict;
use crate::probe::Target;
use crate::resilience::{FailureKind, TargetResult};

/// Terminal event for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    /// Position of the target in the run plan.
    pub index: usize,
    pub target: Target,
    pub result: TargetResult,
    pub elapsed: Duration,
}

impl TargetReport {
    pub fn attempts_used(&self) -> u32 {
        self.result.attempts_used()
    }
}

/// Sink for terminal events.
pub trait Reporter: Send + Sync {
    fn run_started(&self, _run_id: Uuid, _targets: usize) {}

    fn target_finished(&self, report: &TargetReport);

    fn run_finished(&self, verdict: &RunVerdict);
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn run_started(&self, run_id: Uuid, targets: usize) {
        tracing::info!(run_id = %run_id, targets, "Waiting for targets");
    }

    fn target_finished(&self, report: &TargetReport) {
        let elapsed_ms = report.elapsed.as_millis() as u64;
        if report.result.is_success() {
            tracing::info!(
                attempts = report.attempts_used(),
                elapsed_ms,
                "{} completed",
                report.target
            );
        } else {
            tracing::warn!(
                attempts = report.attempts_used(),
                elapsed_ms,
                "{} error: {}",
                report.target,
                report.result
            );
        }
    }

    fn run_finished(&self, verdict: &RunVerdict) {
        match verdict {
            RunVerdict::AllSucceeded => tracing::info!("All tests completed"),
            RunVerdict::SomeFailed { failed } => {
                let names: Vec<&str> = failed.iter().map(|f| f.target.raw()).collect();
                tracing::error!(failed = failed.len(), "Targets not ready: {}", names.join(", "));
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct TargetJson {
    target: Target,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    attempts_used: u32,
    elapsed_ms: u64,
}

impl From<&TargetReport> for TargetJson {
    fn from(report: &TargetReport) -> Self {
        let (status, failure, reason) = match &report.result {
            TargetResult::Success { .. } => ("success", None, None),
            TargetResult::Failed {
                kind, last_reason, ..
            } => (
                "failed",
                Some(*kind),
                last_reason.as_ref().map(|r| r.to_string()),
            ),
        };

        Self {
            target: report.target.clone(),
            status,
            failure,
            reason,
            attempts_used: report.attempts_used(),
            elapsed_ms: report.elapsed.as_millis() as u64,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunJson<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    run_id: Option<Uuid>,
    verdict: &'static str,
    targets: Vec<&'a TargetJson>,
}

#[derive(Debug, Default)]
struct JsonState {
    run_id: Option<Uuid>,
    targets: Vec<(usize, TargetJson)>,
}

/// Logs like [`TracingReporter`] and writes one JSON document per run.
pub struct JsonReporter<W: Write + Send> {
    state: Mutex<JsonState>,
    out: Mutex<W>,
}

impl JsonReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            state: Mutex::new(JsonState::default()),
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Reporter for JsonReporter<W> {
    fn run_started(&self, run_id: Uuid, targets: usize) {
        TracingReporter.run_started(run_id, targets);
        if let Ok(mut state) = self.state.lock() {
            state.run_id = Some(run_id);
        }
    }

    fn target_finished(&self, report: &TargetReport) {
        TracingReporter.target_finished(report);
        if let Ok(mut state) = self.state.lock() {
            state.targets.push((report.index, TargetJson::from(report)));
        }
    }

    fn run_finished(&self, verdict: &RunVerdict) {
        TracingReporter.run_finished(verdict);

        let Ok(mut state) = self.state.lock() else {
            return;
        };
        // Reports arrive in completion order; emit them in plan order.
        state.targets.sort_by_key(|(index, _)| *index);

        let document = RunJson {
            run_id: state.run_id,
            verdict: if verdict.is_success() {
                "all_succeeded"
            } else {
                "some_failed"
            },
            targets: state.targets.iter().map(|(_, t)| t).collect(),
        };

        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = write_document(&mut *out, &document) {
            tracing::error!(error = %e, "Failed to write JSON report");
        }
    }
}

fn write_document<W: Write>(out: &mut W, document: &RunJson<'_>) -> std::io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, document)?;
    writeln!(out)?;
    out.flush()
}
