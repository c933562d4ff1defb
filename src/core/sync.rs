//! # Synchronization Orchestrator / 同步编排器
//!
//! Runs one synchronization pass:
//! `ParseReports → CreateRun → ListTests → Merge → SubmitResults → CloseRun`.
//!
//! Each step depends on the output of the one before it. A failure to read the
//! TAP log, create the run or list its tests aborts the pass. Problems with
//! the HTML report only drop the step commentary. A failed submission is
//! reported after the run has been closed.
//!
//! 执行一次同步过程。每一步都依赖于前一步的输出。
//! 读取 TAP 日志、创建运行或列出测试失败会中止整个过程；HTML 报告的问题只会丢弃步骤注释；
//! 提交失败会在关闭运行之后报告。

use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::config::SyncConfig;
use crate::core::links::CommentLinks;
use crate::core::merge;
use crate::core::models::{BuildContext, ResultStatus, RunId, StepReports, TapOutcomes};
use crate::infra::fs::{self, ArtifactReadError};
use crate::infra::remote::{NewRun, RemoteError, RunApi};
use crate::ingest::{html, tap};

/// The phases of a pass, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ParseReports,
    CreateRun,
    ListTests,
    Merge,
    SubmitResults,
    CloseRun,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::ParseReports => "parse-reports",
            Phase::CreateRun => "create-run",
            Phase::ListTests => "list-tests",
            Phase::Merge => "merge",
            Phase::SubmitResults => "submit-results",
            Phase::CloseRun => "close-run",
        })
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    ArtifactRead(#[from] ArtifactReadError),
    #[error("{phase} failed")]
    Remote {
        phase: Phase,
        /// The run, once it exists on the remote side.
        run_id: Option<RunId>,
        #[source]
        source: RemoteError,
    },
}

impl SyncError {
    pub fn phase(&self) -> Phase {
        match self {
            SyncError::ArtifactRead(_) => Phase::ParseReports,
            SyncError::Remote { phase, .. } => *phase,
        }
    }
}

/// Local view of a build after both reports have been read.
#[derive(Debug, Clone, Default)]
pub struct ParsedReports {
    pub outcomes: TapOutcomes,
    pub steps: StepReports,
    /// Set when the HTML report was missing or malformed and steps were dropped.
    pub steps_degraded: bool,
}

/// What a completed pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSummary {
    pub run_id: RunId,
    pub run_url: Option<String>,
    pub cases_parsed: usize,
    pub step_reports: usize,
    pub steps_degraded: bool,
    pub tests_listed: usize,
    pub passed: usize,
    pub failed: usize,
    /// Remote tests with no local outcome.
    pub skipped: usize,
}

impl SyncSummary {
    pub fn submitted(&self) -> usize {
        self.passed + self.failed
    }
}

/// Reads and parses both reports concurrently. Only a TAP read failure is an error.
pub async fn parse_reports(
    tap_path: &Path,
    html_path: &Path,
) -> Result<ParsedReports, ArtifactReadError> {
    let (outcomes, steps) = tokio::join!(
        async {
            let text = fs::read_artifact(tap_path).await?;
            Ok::<_, ArtifactReadError>(tap::parse(&text))
        },
        async {
            match fs::read_artifact(html_path).await {
                Ok(text) => html::parse(&text).map_err(|e| {
                    warn!(path = %html_path.display(), "step report unusable, continuing without step detail: {e}");
                }),
                Err(e) => {
                    warn!("{e}, continuing without step detail");
                    Err(())
                }
            }
        }
    );

    let outcomes = outcomes?;
    let steps_degraded = steps.is_err();
    Ok(ParsedReports {
        outcomes,
        steps: steps.unwrap_or_default(),
        steps_degraded,
    })
}

/// Sequences one synchronization pass against a [`RunApi`].
pub struct SyncOrchestrator<'a, A> {
    api: &'a A,
    config: &'a SyncConfig,
    build: &'a BuildContext,
}

impl<'a, A: RunApi> SyncOrchestrator<'a, A> {
    pub fn new(api: &'a A, config: &'a SyncConfig, build: &'a BuildContext) -> Self {
        Self { api, config, build }
    }

    /// Parses the build's reports, then pushes them to the remote service.
    pub async fn run(&self) -> Result<SyncSummary, SyncError> {
        info!(phase = %Phase::ParseReports, build_id = %self.build.build_id, "reading reports");
        let tap_path = fs::resolve_artifact(&self.build.build_root, &self.config.tap_report);
        let html_path = fs::resolve_artifact(&self.build.build_root, &self.config.html_report);
        let reports = parse_reports(&tap_path, &html_path).await?;
        info!(
            phase = %Phase::ParseReports,
            cases = reports.outcomes.len(),
            step_reports = reports.steps.len(),
            degraded = reports.steps_degraded,
            "reports parsed"
        );
        self.push(reports).await
    }

    /// Runs the remote part of the pass on already parsed reports.
    pub async fn push(&self, reports: ParsedReports) -> Result<SyncSummary, SyncError> {
        let new_run = NewRun {
            suite_id: self.config.suite_id,
            name: self.build.run_name(),
            assignedto_id: self.config.assignee_id,
            include_all: false,
            case_ids: reports.outcomes.keys().cloned().collect(),
        };
        let run = self
            .api
            .create_run(self.config.project_id, &new_run)
            .await
            .map_err(|source| SyncError::Remote {
                phase: Phase::CreateRun,
                run_id: None,
                source,
            })?;
        info!(phase = %Phase::CreateRun, run_id = run.id.0, name = %new_run.name, cases = new_run.case_ids.len(), "run created");

        let tests = self
            .api
            .list_tests(run.id)
            .await
            .map_err(|source| SyncError::Remote {
                phase: Phase::ListTests,
                run_id: Some(run.id),
                source,
            })?;
        info!(phase = %Phase::ListTests, run_id = run.id.0, tests = tests.len(), "tests listed");

        let links = CommentLinks::new(self.config, self.build);
        let records = merge::merge(&reports.outcomes, &reports.steps, &tests, &links);
        let passed = records
            .iter()
            .filter(|r| r.status_id == ResultStatus::Passed)
            .count();
        let failed = records.len() - passed;
        let skipped = tests.len() - records.len();
        for test in tests.iter().filter(|t| !reports.outcomes.contains_key(&t.case_id)) {
            debug!(
                test_id = %test.id,
                case_id = %test.case_id,
                title = test.title.as_deref().unwrap_or_default(),
                "no local outcome, test left untouched"
            );
        }
        info!(phase = %Phase::Merge, results = records.len(), passed, failed, skipped, "results merged");

        let submitted = self.api.submit_results(run.id, &records).await;
        match &submitted {
            Ok(()) => info!(phase = %Phase::SubmitResults, run_id = run.id.0, results = records.len(), "results submitted"),
            Err(e) => warn!(phase = %Phase::SubmitResults, run_id = run.id.0, "{e}"),
        }

        let closed = self.api.close_run(run.id).await;
        match &closed {
            Ok(()) => info!(phase = %Phase::CloseRun, run_id = run.id.0, "run closed"),
            Err(e) => warn!(phase = %Phase::CloseRun, run_id = run.id.0, "{e}"),
        }

        submitted.map_err(|source| SyncError::Remote {
            phase: Phase::SubmitResults,
            run_id: Some(run.id),
            source,
        })?;
        closed.map_err(|source| SyncError::Remote {
            phase: Phase::CloseRun,
            run_id: Some(run.id),
            source,
        })?;

        Ok(SyncSummary {
            run_id: run.id,
            run_url: run.url,
            cases_parsed: reports.outcomes.len(),
            step_reports: reports.steps.len(),
            steps_degraded: reports.steps_degraded,
            tests_listed: tests.len(),
            passed,
            failed,
            skipped,
        })
    }
}
