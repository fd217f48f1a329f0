//! Concurrent fan-out and join over all targets.
//!
//! # Responsibilities
//! - Spawn one retry engine per target
//! - Wait for every engine to reach its own terminal state
//! - Report each target and the aggregate verdict
//!
//! # Design Decisions
//! - No early cancellation: a failed target never stops its siblings
//! - The global deadline is the only shared state, copied into each task

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{Instrument, Span};
use uuid::Uuid;

use super::verdict::RunVerdict;
use crate::observability::{Reporter, TargetReport};
use crate::probe::{Probe, ProbeFailure, Target, TargetError};
use crate::resilience::{
    run_retry_loop, FailureKind, GlobalDeadline, RetryPolicy, TargetResult,
};

/// Targets paired with the policy each one runs under.
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    entries: Vec<(Target, RetryPolicy)>,
}

impl RunPlan {
    /// Every target under the same policy.
    pub fn new(targets: Vec<Target>, policy: RetryPolicy) -> Self {
        Self {
            entries: targets.into_iter().map(|t| (t, policy)).collect(),
        }
    }

    /// Parse raw endpoints, failing on the first bad one before anything runs.
    pub fn parse<S: AsRef<str>>(raw: &[S], policy: RetryPolicy) -> Result<Self, TargetError> {
        let targets = raw
            .iter()
            .map(|r| Target::parse(r.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(targets, policy))
    }

    pub fn push(&mut self, target: Target, policy: RetryPolicy) {
        self.entries.push((target, policy));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Runs every target of a plan concurrently and aggregates the results.
pub struct Coordinator {
    reporter: Arc<dyn Reporter>,
}

impl Coordinator {
    pub fn new(reporter: Arc<dyn Reporter>) -> Self {
        Self { reporter }
    }

    /// Block until every engine is done, then return the verdict.
    pub async fn run(&self, plan: RunPlan, deadline: GlobalDeadline) -> RunVerdict {
        let run_id = Uuid::new_v4();
        let run_span = tracing::info_span!("run", run_id = %run_id);
        self.reporter.run_started(run_id, plan.len());

        let mut targets = Vec::with_capacity(plan.len());
        let mut handles = Vec::with_capacity(plan.len());

        for (index, (target, policy)) in plan.entries.into_iter().enumerate() {
            let span = tracing::info_span!(parent: &run_span, "target", endpoint = %target);
            let reporter = Arc::clone(&self.reporter);
            let task_target = target.clone();

            handles.push(tokio::spawn(
                async move {
                    let probe = Probe::for_target(&task_target);
                    probe_target(index, task_target, probe, policy, deadline, reporter.as_ref())
                        .await
                }
                .instrument(span),
            ));
            targets.push(target);
        }

        let results = self.join_targets(targets, handles, &run_span).await;
        let verdict = RunVerdict::from_results(results);
        self.reporter.run_finished(&verdict);
        verdict
    }

    /// Wait for every handle and pair results with their targets by position.
    ///
    /// A task that died without reporting is reported here as `Aborted`.
    async fn join_targets(
        &self,
        targets: Vec<Target>,
        handles: Vec<JoinHandle<TargetResult>>,
        run_span: &Span,
    ) -> Vec<(Target, TargetResult)> {
        let started = Instant::now();
        let joined = join_all(handles).await;

        targets
            .into_iter()
            .zip(joined)
            .enumerate()
            .map(|(index, (target, joined))| {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(
                            parent: run_span,
                            endpoint = %target,
                            error = %e,
                            "Probe task aborted"
                        );
                        let result = TargetResult::failed(FailureKind::Aborted, 0, None);
                        self.reporter.target_finished(&TargetReport {
                            index,
                            target: target.clone(),
                            result: result.clone(),
                            elapsed: started.elapsed(),
                        });
                        result
                    }
                };
                (target, result)
            })
            .collect()
    }
}

async fn probe_target(
    index: usize,
    target: Target,
    probe: Result<Probe, ProbeFailure>,
    policy: RetryPolicy,
    deadline: GlobalDeadline,
    reporter: &dyn Reporter,
) -> TargetResult {
    let started = Instant::now();

    let result = match probe {
        Ok(probe) => run_retry_loop(&probe, &policy, deadline).await,
        Err(failure) => {
            tracing::error!(error = %failure, "Could not build probe");
            TargetResult::failed(FailureKind::Aborted, 0, Some(failure))
        }
    };

    reporter.target_finished(&TargetReport {
        index,
        target,
        result: result.clone(),
        elapsed: started.elapsed(),
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[derive(Default)]
    struct Recorder {
        targets: Mutex<Vec<TargetReport>>,
        verdicts: Mutex<Vec<RunVerdict>>,
    }

    impl Reporter for Recorder {
        fn target_finished(&self, report: &TargetReport) {
            self.targets.lock().unwrap().push(report.clone());
        }

        fn run_finished(&self, verdict: &RunVerdict) {
            self.verdicts.lock().unwrap().push(verdict.clone());
        }
    }

    fn quick_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            attempt_timeout: Duration::from_millis(500),
            backoff: crate::resilience::BackoffPolicy::Fixed(Duration::from_millis(50)),
        }
    }

    #[test]
    fn plan_parse_rejects_bad_scheme_up_front() {
        let err = RunPlan::parse(&["tcp://a:1", "udp://b:2"], quick_policy(1)).unwrap_err();
        assert!(matches!(err, TargetError::UnsupportedScheme { .. }));
    }

    #[tokio::test]
    async fn reports_every_target_once_and_the_verdict() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let up = format!("tcp://{}", listener.local_addr().unwrap());
        let gone = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let down = format!("tcp://{}", gone);

        let recorder = Arc::new(Recorder::default());
        let coordinator = Coordinator::new(recorder.clone());
        let plan = RunPlan::parse(&[up.clone(), down.clone()], quick_policy(2)).unwrap();

        let verdict = coordinator
            .run(plan, GlobalDeadline::after(Duration::from_secs(10)))
            .await;

        let failed = verdict.failed_targets();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].target.raw(), down);
        assert_eq!(failed[0].kind, FailureKind::MaxAttemptsExceeded);
        assert_eq!(failed[0].attempts, 2);

        let reports = recorder.targets.lock().unwrap();
        assert_eq!(reports.len(), 2);
        let up_report = reports.iter().find(|r| r.target.raw() == up).unwrap();
        assert_eq!(up_report.result, TargetResult::Success { attempts: 1 });
        assert_eq!(up_report.index, 0);
        assert_eq!(recorder.verdicts.lock().unwrap().as_slice(), &[verdict.clone()]);
    }

    #[tokio::test]
    async fn empty_plan_succeeds_vacuously() {
        let coordinator = Coordinator::new(Arc::new(Recorder::default()));
        let verdict = coordinator
            .run(RunPlan::default(), GlobalDeadline::after(Duration::from_secs(1)))
            .await;
        assert!(verdict.is_success());
    }

    fn crashing_engine() -> TargetResult {
        panic!("engine crashed");
    }

    #[tokio::test]
    async fn panicked_task_is_reported_as_aborted() {
        let crashed = Target::parse("tcp://10.0.0.1:5432").unwrap();
        let healthy = Target::parse("tcp://10.0.0.2:6379").unwrap();

        let recorder = Arc::new(Recorder::default());
        let coordinator = Coordinator::new(recorder.clone());
        let handles = vec![
            tokio::spawn(async { crashing_engine() }),
            tokio::spawn(async { TargetResult::Success { attempts: 2 } }),
        ];

        let results = coordinator
            .join_targets(vec![crashed.clone(), healthy.clone()], handles, &Span::none())
            .await;
        assert_eq!(results[1], (healthy, TargetResult::Success { attempts: 2 }));

        let verdict = RunVerdict::from_results(results);
        let failed = verdict.failed_targets();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].target, crashed);
        assert_eq!(failed[0].kind, FailureKind::Aborted);

        let reports = recorder.targets.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].target, crashed);
        assert_eq!(reports[0].index, 0);
        assert_eq!(reports[0].result.failure_kind(), Some(FailureKind::Aborted));
    }

    #[tokio::test]
    async fn setup_failure_is_aborted_and_reported_once() {
        let target = Target::parse("https://api.internal/ready").unwrap();
        let recorder = Recorder::default();

        let result = probe_target(
            3,
            target.clone(),
            Err(ProbeFailure::Setup("no TLS backend".into())),
            quick_policy(5),
            GlobalDeadline::after(Duration::from_secs(1)),
            &recorder,
        )
        .await;

        assert_eq!(
            result,
            TargetResult::failed(
                FailureKind::Aborted,
                0,
                Some(ProbeFailure::Setup("no TLS backend".into()))
            )
        );
        let reports = recorder.targets.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].index, 3);
        assert_eq!(reports[0].target, target);
    }
}
