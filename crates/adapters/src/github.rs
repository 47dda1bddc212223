// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! GitHub pull request comments.

use funcbench_core::config::GitHubConfig;
use funcbench_core::{Error, Result};
use serde::Serialize;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("funcbench/", env!("CARGO_PKG_VERSION"));
const ERROR_SUFFIX: &str = "Benchmark did not complete, please check action logs.";

#[derive(Serialize)]
struct CommentBody<'a> {
    body: &'a str,
}

/// Client posting comments on one pull request.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    owner: String,
    repo: String,
    pr: u64,
    token: Option<String>,
    dry_run: bool,
}

impl GitHubClient {
    /// Client for pull request `pr`, taking the token from `config` or `GITHUB_TOKEN`.
    pub fn new(config: &GitHubConfig, pr: u64) -> Result<Self> {
        Self::with_token(config, pr, config.resolve_token())
    }

    /// Client for pull request `pr` with an explicit token.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when no token is given outside dry-run mode.
    pub fn with_token(config: &GitHubConfig, pr: u64, token: Option<String>) -> Result<Self> {
        if token.is_none() && !config.dry_run {
            return Err(Error::config(
                "a GitHub token is required to post comments (set GITHUB_TOKEN)",
            ));
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            owner: config.owner.clone(),
            repo: config.repo.clone(),
            pr,
            token,
            dry_run: config.dry_run,
        })
    }

    /// Repository name.
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// Pull request number.
    pub fn pr(&self) -> u64 {
        self.pr
    }

    /// HTTPS clone URL of the repository.
    pub fn clone_url(&self) -> String {
        format!("https://github.com/{}/{}.git", self.owner, self.repo)
    }

    /// Endpoint for issue comments on the pull request.
    pub fn comments_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.owner, self.repo, self.pr
        )
    }

    /// Post `body` as a comment. In dry-run mode the comment is only logged.
    pub async fn post_comment(&self, body: &str) -> Result<()> {
        if self.dry_run {
            info!(pr = self.pr, comment = body, "dry run, not posting comment");
            return Ok(());
        }

        let mut request = self
            .http
            .post(self.comments_url())
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&CommentBody { body });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Delivery(format!("posting comment failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Delivery(format!(
                "GitHub API returned {}: {}",
                status,
                text.trim()
            )));
        }
        debug!(pr = self.pr, %status, "posted comment");
        Ok(())
    }
}

/// Comment posted when the pipeline fails.
pub fn error_comment(message: &str) -> String {
    format!("{}. {}", message, ERROR_SUFFIX)
}
