// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Pipeline phase tracking.
//!
//! A [`RunRecord`] is created per invocation and collects one [`PhaseSpan`]
//! for every phase the orchestrator enters. It is purely diagnostic: spans are
//! logged as they close and summarized at the end of a run, never persisted.
//!
//! # Phase order
//!
//! ```text
//! ValidateWorkspace → ResolveTarget → RunCurrent
//!   ├─ self-compare:   Compare → Report
//!   └─ cross-revision: PrepareWorktree → RunTarget → Compare → Report
//! Cleanup (always)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one pipeline invocation.
pub type RunId = String;

/// A stage of the comparison pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Check that the primary workspace is clean.
    ValidateWorkspace,
    /// Resolve the comparison target.
    ResolveTarget,
    /// Benchmark the current workspace.
    RunCurrent,
    /// Create the secondary worktree at the target revision.
    PrepareWorktree,
    /// Benchmark the target revision.
    RunTarget,
    /// Parse and compare the outputs.
    Compare,
    /// Hand the outcome to the delivery collaborator.
    Report,
    /// Remove the secondary worktree.
    Cleanup,
}

impl Phase {
    /// Stable name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::ValidateWorkspace => "validate_workspace",
            Phase::ResolveTarget => "resolve_target",
            Phase::RunCurrent => "run_current",
            Phase::PrepareWorktree => "prepare_worktree",
            Phase::RunTarget => "run_target",
            Phase::Compare => "compare",
            Phase::Report => "report",
            Phase::Cleanup => "cleanup",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a phase span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PhaseStatus {
    /// Phase is in progress.
    #[default]
    Running,
    /// Phase finished successfully.
    Completed,
    /// Phase failed.
    Failed,
    /// Phase was skipped because of an interrupt.
    Cancelled,
}

/// One phase of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSpan {
    /// The phase.
    pub phase: Phase,
    /// Current status.
    pub status: PhaseStatus,
    /// Start time.
    pub start_time: DateTime<Utc>,
    /// End time, set once the span closes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Duration in milliseconds, set once the span closes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Error message when the phase failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl PhaseSpan {
    /// Open a running span for `phase`.
    pub fn start(phase: Phase) -> Self {
        Self {
            phase,
            status: PhaseStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            error_message: None,
        }
    }

    fn close(&mut self, status: PhaseStatus) {
        let now = Utc::now();
        self.end_time = Some(now);
        self.duration_ms = Some(
            now.signed_duration_since(self.start_time)
                .num_milliseconds()
                .unsigned_abs(),
        );
        self.status = status;
    }

    /// Mark the span completed.
    pub fn complete(&mut self) {
        self.close(PhaseStatus::Completed);
    }

    /// Mark the span failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.close(PhaseStatus::Failed);
        self.error_message = Some(error.into());
    }

    /// Mark the span cancelled.
    pub fn cancel(&mut self) {
        self.close(PhaseStatus::Cancelled);
    }

    /// Whether the span is still open.
    pub fn is_running(&self) -> bool {
        self.status == PhaseStatus::Running
    }
}

/// All phases entered by one pipeline invocation, in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Generated run id (UUID v4).
    pub run_id: RunId,
    /// Comparison target as given by the user.
    pub target: String,
    /// Time the run started.
    pub started_at: DateTime<Utc>,
    /// Phase spans in the order they were entered.
    pub spans: Vec<PhaseSpan>,
}

impl RunRecord {
    /// Start a record for a run against `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            target: target.into(),
            started_at: Utc::now(),
            spans: Vec::new(),
        }
    }

    /// Open a span for `phase`. Any span still running is closed as completed.
    pub fn begin(&mut self, phase: Phase) {
        if let Some(open) = self.spans.last_mut().filter(|s| s.is_running()) {
            open.complete();
        }
        self.spans.push(PhaseSpan::start(phase));
    }

    /// Close the current span as completed and return it.
    pub fn complete(&mut self) -> Option<&PhaseSpan> {
        let span = self.spans.last_mut().filter(|s| s.is_running())?;
        span.complete();
        Some(&*span)
    }

    /// Close the current span as failed and return it.
    pub fn fail(&mut self, error: impl Into<String>) -> Option<&PhaseSpan> {
        let span = self.spans.last_mut().filter(|s| s.is_running())?;
        span.fail(error);
        Some(&*span)
    }

    /// Record `phase` as cancelled before it started.
    pub fn cancel(&mut self, phase: Phase) {
        let mut span = PhaseSpan::start(phase);
        span.cancel();
        self.spans.push(span);
    }

    /// Phases in the order they were entered.
    pub fn phases(&self) -> Vec<Phase> {
        self.spans.iter().map(|s| s.phase).collect()
    }

    /// The first failed span, if any.
    pub fn failed_span(&self) -> Option<&PhaseSpan> {
        self.spans.iter().find(|s| s.status == PhaseStatus::Failed)
    }

    /// Sum of closed span durations in milliseconds.
    pub fn total_duration_ms(&self) -> u64 {
        self.spans.iter().filter_map(|s| s.duration_ms).sum()
    }

    /// One-line summary such as `resolve_target=2ms run_current=1500ms(FAILED)`.
    pub fn summary(&self) -> String {
        self.spans
            .iter()
            .map(|s| {
                let ms = s.duration_ms.unwrap_or(0);
                match s.status {
                    PhaseStatus::Completed | PhaseStatus::Running => format!("{}={}ms", s.phase, ms),
                    PhaseStatus::Failed => format!("{}={}ms(FAILED)", s.phase, ms),
                    PhaseStatus::Cancelled => format!("{}(CANCELLED)", s.phase),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_generates_uuid_run_id() {
        let record = RunRecord::new("main");
        assert!(Uuid::parse_str(&record.run_id).is_ok());
        assert_eq!(record.target, "main");
        assert!(record.spans.is_empty());
    }

    #[test]
    fn test_span_complete() {
        let mut span = PhaseSpan::start(Phase::Compare);
        assert_eq!(span.status, PhaseStatus::Running);
        span.complete();
        assert_eq!(span.status, PhaseStatus::Completed);
        assert!(span.end_time.is_some());
        assert!(span.duration_ms.is_some());
    }

    #[test]
    fn test_span_fail() {
        let mut span = PhaseSpan::start(Phase::RunCurrent);
        span.fail("benchmark exited with code 1");
        assert_eq!(span.status, PhaseStatus::Failed);
        assert_eq!(
            span.error_message.as_deref(),
            Some("benchmark exited with code 1")
        );
    }

    #[test]
    fn test_begin_closes_previous_span() {
        let mut record = RunRecord::new(".");
        record.begin(Phase::ValidateWorkspace);
        record.begin(Phase::ResolveTarget);
        assert_eq!(record.spans[0].status, PhaseStatus::Completed);
        assert!(record.spans[1].is_running());
        assert_eq!(
            record.phases(),
            vec![Phase::ValidateWorkspace, Phase::ResolveTarget]
        );
    }

    #[test]
    fn test_fail_marks_current_span() {
        let mut record = RunRecord::new("main");
        record.begin(Phase::ResolveTarget);
        let span = record.fail("unknown branch").unwrap();
        assert_eq!(span.phase, Phase::ResolveTarget);
        assert_eq!(record.failed_span().unwrap().phase, Phase::ResolveTarget);
        assert!(record.complete().is_none());
    }

    #[test]
    fn test_cancel_and_summary() {
        let mut record = RunRecord::new("main");
        record.begin(Phase::ValidateWorkspace);
        record.complete();
        record.cancel(Phase::ResolveTarget);
        let summary = record.summary();
        assert!(summary.starts_with("validate_workspace="));
        assert!(summary.ends_with("resolve_target(CANCELLED)"));
    }

    #[test]
    fn test_record_serialization() {
        let mut record = RunRecord::new("main");
        record.begin(Phase::Compare);
        record.complete();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"phase\":\"compare\""));
        assert!(json.contains("\"status\":\"COMPLETED\""));
        let back: RunRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, record.run_id);
    }
}
