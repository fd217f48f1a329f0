//! Aggregation of terminal target results.

use crate::probe::{ProbeFailure, Target};
use crate::resilience::{FailureKind, TargetResult};

/// A target that did not become ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedTarget {
    pub target: Target,
    pub kind: FailureKind,
    pub attempts: u32,
    pub last_reason: Option<ProbeFailure>,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunVerdict {
    AllSucceeded,
    SomeFailed { failed: Vec<FailedTarget> },
}

impl RunVerdict {
    /// Fold terminal results into a verdict. Order of failures follows input order.
    pub fn from_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = (Target, TargetResult)>,
    {
        let failed: Vec<FailedTarget> = results
            .into_iter()
            .filter_map(|(target, result)| match result {
                TargetResult::Success { .. } => None,
                TargetResult::Failed {
                    kind,
                    attempts,
                    last_reason,
                } => Some(FailedTarget {
                    target,
                    kind,
                    attempts,
                    last_reason,
                }),
            })
            .collect();

        if failed.is_empty() {
            RunVerdict::AllSucceeded
        } else {
            RunVerdict::SomeFailed { failed }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunVerdict::AllSucceeded)
    }

    pub fn failed_targets(&self) -> &[FailedTarget] {
        match self {
            RunVerdict::AllSucceeded => &[],
            RunVerdict::SomeFailed { failed } => failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(raw: &str) -> Target {
        Target::parse(raw).unwrap()
    }

    #[test]
    fn all_success() {
        let verdict = RunVerdict::from_results(vec![
            (target("tcp://a:1"), TargetResult::Success { attempts: 1 }),
            (target("http://b"), TargetResult::Success { attempts: 7 }),
        ]);
        assert!(verdict.is_success());
        assert!(verdict.failed_targets().is_empty());
    }

    #[test]
    fn any_failure_fails_the_run() {
        let verdict = RunVerdict::from_results(vec![
            (target("tcp://a:1"), TargetResult::Success { attempts: 1 }),
            (
                target("tcp://b:2"),
                TargetResult::failed(
                    FailureKind::GlobalDeadlineExceeded,
                    4,
                    Some(ProbeFailure::Canceled),
                ),
            ),
            (
                target("http://c"),
                TargetResult::failed(FailureKind::MaxAttemptsExceeded, 2, None),
            ),
        ]);

        assert!(!verdict.is_success());
        let failed = verdict.failed_targets();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].target.raw(), "tcp://b:2");
        assert_eq!(failed[0].kind, FailureKind::GlobalDeadlineExceeded);
        assert_eq!(failed[0].last_reason, Some(ProbeFailure::Canceled));
        assert_eq!(failed[1].kind, FailureKind::MaxAttemptsExceeded);
    }
}
