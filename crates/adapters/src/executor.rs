// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Go benchmark execution.

use crate::process::ProcessRunner;
use async_trait::async_trait;
use funcbench_core::config::{format_go_duration, BenchConfig};
use funcbench_core::Result;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Filter used when none is given.
pub const MATCH_ALL: &str = ".*";

/// Runs the benchmark suite of one workspace.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    /// Run the suite in `workspace` and return its raw output.
    ///
    /// `label` names the revision in logs.
    async fn run(&self, workspace: &Path, label: &str) -> Result<String>;
}

/// [`BenchmarkRunner`] invoking `go test -bench`.
#[derive(Debug, Clone)]
pub struct GoBenchmarkExecutor {
    runner: ProcessRunner,
    go_binary: String,
    packages: Vec<String>,
    filter: String,
    bench_time: Duration,
}

impl GoBenchmarkExecutor {
    /// Executor for benchmarks matching `filter` over `./...`.
    pub fn new(runner: ProcessRunner, filter: impl Into<String>, bench_time: Duration) -> Self {
        Self {
            runner,
            go_binary: "go".to_string(),
            packages: vec!["./...".to_string()],
            filter: filter.into(),
            bench_time,
        }
    }

    /// Executor configured from `config`, running benchmarks matching `filter`.
    pub fn from_config(config: &BenchConfig, filter: &str, verbose: bool) -> Result<Self> {
        let runner = ProcessRunner::new(verbose).with_timeout(config.timeout()?);
        Ok(Self::new(runner, filter, config.bench_time()?)
            .with_go_binary(&config.go_binary)
            .with_packages(config.packages.split_whitespace()))
    }

    /// Use a different Go toolchain binary.
    pub fn with_go_binary(mut self, go_binary: impl Into<String>) -> Self {
        self.go_binary = go_binary.into();
        self
    }

    /// Benchmark these package patterns instead of `./...`.
    pub fn with_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let packages: Vec<String> = packages.into_iter().map(Into::into).collect();
        if !packages.is_empty() {
            self.packages = packages;
        }
        self
    }

    /// Arguments passed to the Go binary.
    pub fn args(&self) -> Vec<String> {
        let filter = if self.filter.is_empty() {
            MATCH_ALL
        } else {
            self.filter.as_str()
        };
        let mut args = vec![
            "test".to_string(),
            "-run".to_string(),
            "^$".to_string(),
            "-bench".to_string(),
            format!("^{}$", filter),
            "-benchmem".to_string(),
            "-benchtime".to_string(),
            format_go_duration(self.bench_time),
            // The process runner enforces the per-run bound.
            "-timeout".to_string(),
            "0".to_string(),
        ];
        args.extend(self.packages.iter().cloned());
        args
    }
}

#[async_trait]
impl BenchmarkRunner for GoBenchmarkExecutor {
    async fn run(&self, workspace: &Path, label: &str) -> Result<String> {
        info!(
            revision = label,
            workspace = %workspace.display(),
            timeout = ?self.runner.timeout(),
            "running benchmarks"
        );
        let result = self.runner.run(&self.go_binary, &self.args(), workspace).await?;
        info!(
            revision = label,
            elapsed_ms = result.elapsed.as_millis() as u64,
            "benchmarks finished"
        );
        Ok(result.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let executor = GoBenchmarkExecutor::new(
            ProcessRunner::new(false),
            "BenchmarkQuery.*",
            Duration::from_secs(1),
        );
        assert_eq!(
            executor.args().join(" "),
            "test -run ^$ -bench ^BenchmarkQuery.*$ -benchmem -benchtime 1s -timeout 0 ./..."
        );
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let executor =
            GoBenchmarkExecutor::new(ProcessRunner::new(false), "", Duration::from_millis(500));
        let args = executor.args();
        assert!(args.contains(&"^.*$".to_string()));
        assert!(args.contains(&"500ms".to_string()));
    }

    #[test]
    fn test_from_config() {
        let config = BenchConfig {
            bench_time: "2s".to_string(),
            timeout: "10m".to_string(),
            go_binary: "go1.22".to_string(),
            packages: "./tsdb/... ./promql/...".to_string(),
            ..BenchConfig::default()
        };
        let executor = GoBenchmarkExecutor::from_config(&config, "BenchmarkX", true).unwrap();
        assert_eq!(executor.go_binary, "go1.22");
        assert_eq!(executor.packages, vec!["./tsdb/...", "./promql/..."]);
        assert_eq!(executor.runner.timeout(), Some(Duration::from_secs(600)));
        assert!(executor.runner.is_verbose());
        assert!(executor.args().contains(&"2s".to_string()));
    }

    #[test]
    fn test_from_config_rejects_bad_duration() {
        let config = BenchConfig {
            bench_time: "soon".to_string(),
            ..BenchConfig::default()
        };
        assert!(GoBenchmarkExecutor::from_config(&config, ".*", false).is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_runs_configured_binary_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let executor = GoBenchmarkExecutor::new(ProcessRunner::new(false), ".*", Duration::from_secs(1))
            .with_go_binary("echo");
        let output = executor.run(dir.path(), "current").await.unwrap();
        assert!(output.starts_with("test -run ^$ -bench ^.*$"));
    }
}
