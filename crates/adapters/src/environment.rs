// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Execution environments.
//!
//! The environment is chosen once at startup. [`Environment::Local`] works on
//! the repository containing the current directory and prints results to the
//! console. [`Environment::GitHubActions`] clones the pull request under test
//! and reports back through PR comments.

use crate::delivery::Delivery;
use crate::git::GitCli;
use crate::github::{error_comment, GitHubClient};
use async_trait::async_trait;
use colored::Colorize;
use funcbench_benchmarks::{generate_comment, render_exclusions, render_plain, ComparisonReport};
use funcbench_core::Result;
use std::path::Path;
use tracing::{info, warn};

/// Local branch the pull request head is fetched into.
pub const PR_BRANCH: &str = "pullrequest";

/// Settings shared by every environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSettings {
    /// Comparison target as given by the user.
    pub compare_target: String,
    /// Benchmark name filter.
    pub bench_filter: String,
}

/// Developer machine.
#[derive(Debug)]
pub struct LocalEnvironment {
    settings: EnvironmentSettings,
    repo: GitCli,
}

impl LocalEnvironment {
    /// Use the repository containing `dir`.
    pub async fn new(settings: EnvironmentSettings, dir: &Path) -> Result<Self> {
        let repo = GitCli::discover(dir).await?;
        Ok(Self { settings, repo })
    }
}

/// Console text for a completed comparison.
pub fn local_results_text(report: &ComparisonReport) -> String {
    let mut text = render_plain(report);
    let notes = render_exclusions(report);
    if !notes.is_empty() {
        text.push('\n');
        text.push_str(&notes);
    }
    text
}

#[async_trait]
impl Delivery for LocalEnvironment {
    async fn post_result(&self, report: &ComparisonReport) -> Result<()> {
        println!("{}", "Results:".bold().green());
        print!("{}", local_results_text(report));
        Ok(())
    }

    async fn post_error(&self, _message: &str) -> Result<()> {
        Ok(())
    }
}

/// GitHub Actions run for a pull request.
#[derive(Debug)]
pub struct GitHubActionsEnvironment {
    settings: EnvironmentSettings,
    repo: GitCli,
    client: GitHubClient,
}

impl GitHubActionsEnvironment {
    /// Clone the repository into `workspace/<repo>` and check out the pull request.
    ///
    /// A setup failure is reported as a PR comment before it is returned.
    pub async fn new(
        settings: EnvironmentSettings,
        client: GitHubClient,
        workspace: &Path,
    ) -> Result<Self> {
        match Self::checkout_pull_request(&client, workspace).await {
            Ok(repo) => Ok(Self {
                settings,
                repo,
                client,
            }),
            Err(e) => {
                if let Err(post) = client.post_comment(&error_comment(&e.to_string())).await {
                    warn!(error = %post, "failed to report setup error");
                }
                Err(e)
            }
        }
    }

    async fn checkout_pull_request(client: &GitHubClient, workspace: &Path) -> Result<GitCli> {
        let dest = workspace.join(client.repo());
        let repo = GitCli::clone_repo(&client.clone_url(), &dest).await?;
        let refspec = format!("+refs/pull/{}/head:refs/heads/{}", client.pr(), PR_BRANCH);
        repo.fetch("origin", &refspec).await?;
        repo.checkout(PR_BRANCH).await?;
        info!(pr = client.pr(), path = %dest.display(), "checked out pull request");
        Ok(repo)
    }
}

#[async_trait]
impl Delivery for GitHubActionsEnvironment {
    async fn post_result(&self, report: &ComparisonReport) -> Result<()> {
        self.client.post_comment(&generate_comment(report)).await
    }

    async fn post_error(&self, message: &str) -> Result<()> {
        self.client.post_comment(&error_comment(message)).await
    }
}

/// Where the pipeline runs and reports.
#[derive(Debug)]
pub enum Environment {
    /// Developer machine.
    Local(LocalEnvironment),
    /// GitHub Actions pull request run.
    GitHubActions(GitHubActionsEnvironment),
}

impl Environment {
    /// Shared settings.
    pub fn settings(&self) -> &EnvironmentSettings {
        match self {
            Environment::Local(env) => &env.settings,
            Environment::GitHubActions(env) => &env.settings,
        }
    }

    /// Repository holding the current workspace.
    pub fn repository(&self) -> &GitCli {
        match self {
            Environment::Local(env) => &env.repo,
            Environment::GitHubActions(env) => &env.repo,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Environment::Local(_) => "local",
            Environment::GitHubActions(_) => "github-actions",
        }
    }
}

#[async_trait]
impl Delivery for Environment {
    async fn post_result(&self, report: &ComparisonReport) -> Result<()> {
        match self {
            Environment::Local(env) => env.post_result(report).await,
            Environment::GitHubActions(env) => env.post_result(report).await,
        }
    }

    async fn post_error(&self, message: &str) -> Result<()> {
        match self {
            Environment::Local(env) => env.post_error(message).await,
            Environment::GitHubActions(env) => env.post_error(message).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use funcbench_benchmarks::{compare_benchmarks, parse_benchmarks};
    use funcbench_core::config::GitHubConfig;

    fn settings() -> EnvironmentSettings {
        EnvironmentSettings {
            compare_target: "main".to_string(),
            bench_filter: ".*".to_string(),
        }
    }

    fn report() -> ComparisonReport {
        let old = parse_benchmarks("BenchmarkA-8  10  100 ns/op\nBenchmarkOld-8  10  1 ns/op\n");
        let new = parse_benchmarks("BenchmarkA-8  10  50 ns/op\n");
        compare_benchmarks(&old, &new, "main").unwrap()
    }

    #[test]
    fn test_local_results_text() {
        let text = local_results_text(&report());
        assert!(text.starts_with("benchmark"));
        assert!(text.contains("-50.00%"));
        assert!(text.ends_with("excluded BenchmarkOld-8: only in target run\n"));
    }

    #[tokio::test]
    async fn test_local_delivery() {
        let env = Environment::Local(LocalEnvironment {
            settings: settings(),
            repo: GitCli::new("/repo"),
        });
        assert_eq!(env.name(), "local");
        assert_eq!(env.settings().compare_target, "main");
        assert_eq!(env.repository().root(), std::path::PathBuf::from("/repo"));
        tokio_test::assert_ok!(env.post_result(&report()).await);
        tokio_test::assert_ok!(env.post_error("ignored").await);
    }

    #[tokio::test]
    async fn test_github_delivery_dry_run() {
        let config = GitHubConfig {
            dry_run: true,
            ..GitHubConfig::default()
        };
        let client = GitHubClient::with_token(&config, 12, None).unwrap();
        let env = Environment::GitHubActions(GitHubActionsEnvironment {
            settings: settings(),
            repo: GitCli::new("/work/prometheus"),
            client,
        });
        assert_eq!(env.name(), "github-actions");
        tokio_test::assert_ok!(env.post_result(&report()).await);
        tokio_test::assert_ok!(env.post_error("benchmark failed").await);
    }

    #[tokio::test]
    async fn test_github_setup_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let config = GitHubConfig {
            dry_run: true,
            owner: "funcbench-invalid owner".to_string(),
            ..GitHubConfig::default()
        };
        let client = GitHubClient::with_token(&config, 1, None).unwrap();
        // Clone into a path that is a regular file, which git refuses before any network access.
        std::fs::write(dir.path().join(client.repo()), "occupied").unwrap();
        let result = GitHubActionsEnvironment::new(settings(), client, dir.path()).await;
        assert!(result.is_err());
    }
}
