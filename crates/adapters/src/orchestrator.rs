// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! The comparison pipeline.
//!
//! ```text
//! ValidateWorkspace → ResolveTarget → RunCurrent
//!   ├─ self-compare:   Compare → Report
//!   └─ cross-revision: PrepareWorktree → RunTarget → Compare → Report
//! Cleanup (always)
//! ```
//!
//! The cancellation token is checked before every phase. Any fatal error is
//! reported once through [`Delivery::post_error`]; delivery failures are only
//! logged and never replace the pipeline outcome.

use crate::delivery::Delivery;
use crate::executor::BenchmarkRunner;
use crate::git::Repository;
use crate::resolver::resolve_target;
use crate::worktree::WorktreeManager;
use funcbench_benchmarks::{
    compare_benchmarks, compare_sub_benchmarks, parse_benchmarks, ComparisonReport,
};
use funcbench_core::config::validate_worktree_dir;
use funcbench_core::{Error, Phase, Result, RunRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Default directory of the secondary worktree, relative to the repository root.
pub const DEFAULT_WORKTREE_DIR: &str = "_funcbench-cmp";

const CURRENT_LABEL: &str = "current";

/// Drives one comparison run over its collaborators.
pub struct Orchestrator<'a> {
    repo: &'a dyn Repository,
    runner: &'a dyn BenchmarkRunner,
    delivery: &'a dyn Delivery,
    target: String,
    worktree_dir: String,
    cancel: CancellationToken,
}

impl<'a> Orchestrator<'a> {
    /// Pipeline comparing the current workspace against `target`.
    pub fn new(
        repo: &'a dyn Repository,
        runner: &'a dyn BenchmarkRunner,
        delivery: &'a dyn Delivery,
        target: impl Into<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            repo,
            runner,
            delivery,
            target: target.into(),
            worktree_dir: DEFAULT_WORKTREE_DIR.to_string(),
            cancel,
        }
    }

    /// Place the secondary worktree at `dir` under the repository root.
    ///
    /// The value is checked when the pipeline starts; see
    /// [`validate_worktree_dir`].
    pub fn with_worktree_dir(mut self, dir: impl Into<String>) -> Self {
        self.worktree_dir = dir.into();
        self
    }

    /// Run the pipeline to completion.
    pub async fn run(&self) -> Result<ComparisonReport> {
        let mut record = RunRecord::new(&self.target);
        info!(run_id = %record.run_id, target = %self.target, "starting benchmark comparison");

        let mut worktrees = WorktreeManager::new(self.repo);
        let outcome = self.execute(&mut record, &mut worktrees).await;

        if let Err(e) = &outcome {
            if let Some(span) = record.fail(e.to_string()) {
                error!(phase = %span.phase, error = %e, "phase failed");
            }
            if let Err(post) = self.delivery.post_error(&e.to_string()).await {
                warn!(error = %post, "failed to deliver error report");
            }
        }

        record.begin(Phase::Cleanup);
        worktrees.cleanup().await;
        record.complete();

        info!(
            run_id = %record.run_id,
            success = outcome.is_ok(),
            total_ms = record.total_duration_ms(),
            phases = %record.summary(),
            "benchmark comparison finished"
        );
        outcome
    }

    async fn execute(
        &self,
        record: &mut RunRecord,
        worktrees: &mut WorktreeManager<'_>,
    ) -> Result<ComparisonReport> {
        self.enter(record, Phase::ValidateWorkspace)?;
        validate_worktree_dir(&self.worktree_dir)?;
        worktrees.ensure_clean().await?;

        self.enter(record, Phase::ResolveTarget)?;
        let target = resolve_target(self.repo, &self.target).await?;

        self.enter(record, Phase::RunCurrent)?;
        let root = self.repo.root();
        let current = self.runner.run(&root, CURRENT_LABEL).await?;

        let report = match target.revision {
            None => {
                self.enter(record, Phase::Compare)?;
                compare_sub_benchmarks(&parse_benchmarks(&current), &self.target)?
            }
            Some(revision) => {
                self.enter(record, Phase::PrepareWorktree)?;
                let path = root.join(&self.worktree_dir);
                worktrees.prepare(&path, &revision).await?;

                self.enter(record, Phase::RunTarget)?;
                let label = revision.to_string();
                let baseline = self.runner.run(&path, &label).await?;

                self.enter(record, Phase::Compare)?;
                compare_benchmarks(
                    &parse_benchmarks(&baseline),
                    &parse_benchmarks(&current),
                    label,
                )?
            }
        };
        info!(
            mode = %report.mode,
            compared = report.metrics.len(),
            excluded = report.excluded.len(),
            "comparison complete"
        );

        self.enter(record, Phase::Report)?;
        if let Err(e) = self.delivery.post_result(&report).await {
            warn!(error = %e, "failed to deliver results");
        }
        Ok(report)
    }

    /// Close the running phase and open `phase`, unless cancellation was requested.
    fn enter(&self, record: &mut RunRecord, phase: Phase) -> Result<()> {
        if let Some(span) = record.complete() {
            debug!(
                phase = %span.phase,
                duration_ms = span.duration_ms.unwrap_or(0),
                "phase completed"
            );
        }
        if self.cancel.is_cancelled() {
            record.cancel(phase);
            return Err(Error::Cancelled {
                phase: phase.to_string(),
            });
        }
        info!(%phase, "entering phase");
        record.begin(phase);
        Ok(())
    }
}
