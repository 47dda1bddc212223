// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI for funcbench.
//!
//! `funcbench <TARGET> [FUNCTION_REGEX]` benchmarks the current workspace and
//! compares it against `TARGET`, a branch or commit, or `.` to compare the
//! sub-benchmarks of one run against each other.

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod logging;
pub mod signal;

use anyhow::Context;
use clap::Parser;
use funcbench_adapters::{
    EnvironmentSettings, Environment, GitHubActionsEnvironment, GitHubClient,
    GoBenchmarkExecutor, LocalEnvironment, Orchestrator,
};
use funcbench_benchmarks::io::write_report_json;
use funcbench_core::config::LogFormat;
use funcbench_core::{Error, FuncbenchConfig};
use std::ffi::OsString;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Benchmark a change against a baseline revision.
#[derive(Parser, Debug)]
#[command(name = "funcbench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Branch or commit to compare against, or `.` to compare sub-benchmarks.
    pub target: String,

    /// Regex selecting the benchmarks to run (anchored on both ends).
    pub function_regex: Option<String>,

    /// Stream benchmark output and log at debug level.
    #[arg(short, long)]
    pub verbose: bool,

    /// Log PR comments instead of posting them.
    #[arg(long)]
    pub dryrun: bool,

    /// GitHub repository owner.
    #[arg(long)]
    pub owner: Option<String>,

    /// GitHub repository name.
    #[arg(long)]
    pub repo: Option<String>,

    /// Pull request number; selects the GitHub Actions environment.
    #[arg(long = "github-pr", env = "GITHUB_PR")]
    pub github_pr: Option<u64>,

    /// Minimum run time per benchmark (e.g. 1s, 500ms).
    #[arg(short = 't', long)]
    pub bench_time: Option<String>,

    /// Wall-clock bound for one benchmark run (e.g. 2h); 0 disables it.
    #[arg(long)]
    pub timeout: Option<String>,

    /// Configuration file (defaults to ./funcbench.toml when present).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log format: text or json.
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Write the comparison report as JSON to this path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Override `config` with the flags given on the command line.
    pub fn apply(&self, config: &mut FuncbenchConfig) {
        if let Some(regex) = &self.function_regex {
            config.bench.filter = regex.clone();
        }
        if let Some(bench_time) = &self.bench_time {
            config.bench.bench_time = bench_time.clone();
        }
        if let Some(timeout) = &self.timeout {
            config.bench.timeout = timeout.clone();
        }
        if let Some(owner) = &self.owner {
            config.github.owner = owner.clone();
        }
        if let Some(repo) = &self.repo {
            config.github.repo = repo.clone();
        }
        if self.github_pr.is_some() {
            config.github.pr = self.github_pr;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        config.github.dry_run |= self.dryrun;
        config.logging.verbose |= self.verbose;
    }
}

/// Check that `filter` compiles as an anchored benchmark name pattern.
pub fn validate_filter(filter: &str) -> funcbench_core::Result<()> {
    regex::Regex::new(&format!("^(?:{})$", filter))
        .map(drop)
        .map_err(|e| Error::invalid_input(format!("invalid function regex {:?}: {}", filter, e)))
}

/// Load configuration, build the environment and run the pipeline.
pub async fn run(cli: Cli, cancel: CancellationToken) -> anyhow::Result<()> {
    let mut config =
        FuncbenchConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply(&mut config);
    logging::init(&config.logging)?;

    validate_filter(&config.bench.filter)?;
    let settings = EnvironmentSettings {
        compare_target: cli.target.clone(),
        bench_filter: config.bench.filter.clone(),
    };

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let env = match config.github.pr {
        Some(pr) => {
            let client = GitHubClient::new(&config.github, pr)?;
            let workspace = github_workspace(std::env::var_os(GITHUB_WORKSPACE_ENV))?;
            Environment::GitHubActions(
                GitHubActionsEnvironment::new(settings, client, &workspace)
                    .await
                    .context("failed to prepare pull request checkout")?,
            )
        }
        None => Environment::Local(
            LocalEnvironment::new(settings, &cwd)
                .await
                .context("current directory is not inside a git repository")?,
        ),
    };
    info!(
        environment = env.name(),
        target = %env.settings().compare_target,
        filter = %env.settings().bench_filter,
        "starting funcbench"
    );

    let executor = GoBenchmarkExecutor::from_config(
        &config.bench,
        &env.settings().bench_filter,
        config.logging.verbose,
    )?;
    let report = Orchestrator::new(
        env.repository(),
        &executor,
        &env,
        env.settings().compare_target.clone(),
        cancel,
    )
    .with_worktree_dir(config.bench.worktree_dir.clone())
    .run()
    .await?;

    if let Some(path) = &cli.output {
        write_report_json(&report, path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "wrote report");
    }
    Ok(())
}

const GITHUB_WORKSPACE_ENV: &str = "GITHUB_WORKSPACE";

fn github_workspace(value: Option<OsString>) -> funcbench_core::Result<PathBuf> {
    value
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| {
            Error::config(format!(
                "{} is not set: funcbench is not running inside GitHub Actions",
                GITHUB_WORKSPACE_ENV
            ))
        })
}
