// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Delivery capability for comparison outcomes.

use async_trait::async_trait;
use funcbench_benchmarks::ComparisonReport;
use funcbench_core::Result;

/// Receives the outcome of a pipeline run.
///
/// Failures are reported to the caller but never change the pipeline outcome.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Delivery: Send + Sync {
    /// Publish a completed comparison.
    async fn post_result(&self, report: &ComparisonReport) -> Result<()>;

    /// Publish a fatal pipeline error.
    async fn post_error(&self, message: &str) -> Result<()>;
}
