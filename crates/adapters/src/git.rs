// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Repository capability and its `git` command-line implementation.

use crate::process::ProcessRunner;
use async_trait::async_trait;
use funcbench_core::{Error, Head, Result, Revision};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const HEADS_PREFIX: &str = "refs/heads/";
const REMOTE_PREFIX: &str = "refs/remotes/origin/";

/// Operations the pipeline needs from a version-controlled checkout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Repository: Send + Sync {
    /// Root of the primary workspace.
    fn root(&self) -> PathBuf;

    /// Currently checked-out revision and branch.
    async fn head(&self) -> Result<Head>;

    /// Resolve a branch name, local first, then the `origin` remote-tracking ref.
    async fn resolve_branch(&self, name: &str) -> Result<Option<Revision>>;

    /// Resolve a commit id or abbreviation.
    async fn resolve_commit(&self, id: &str) -> Result<Option<Revision>>;

    /// Porcelain status lines of tracked files with staged or unstaged changes.
    async fn dirty_entries(&self) -> Result<Vec<String>>;

    /// Create a detached worktree at `path` checked out at `revision`.
    async fn add_worktree(&self, path: &Path, revision: &Revision) -> Result<()>;

    /// Remove the worktree at `path` and prune stale registrations.
    async fn remove_worktree(&self, path: &Path) -> Result<()>;
}

/// [`Repository`] backed by the `git` binary.
///
/// Every command runs with the repository root as its working directory.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
    runner: ProcessRunner,
}

impl GitCli {
    /// Use the repository rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            runner: ProcessRunner::new(false),
        }
    }

    /// Find the repository containing `dir`.
    pub async fn discover(dir: &Path) -> Result<Self> {
        let result = ProcessRunner::new(false)
            .run("git", &args(&["rev-parse", "--show-toplevel"]), dir)
            .await
            .map_err(|e| Error::git("rev-parse", e))?;
        let root = PathBuf::from(result.output.trim());
        debug!(root = %root.display(), "discovered repository");
        Ok(Self::new(root))
    }

    /// Clone `url` into `dest`, running from `dest`'s parent directory.
    pub async fn clone_repo(url: &str, dest: &Path) -> Result<Self> {
        let parent = dest
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        info!(url, dest = %dest.display(), "cloning repository");
        ProcessRunner::new(false)
            .run(
                "git",
                &args(&["clone", url, &*dest.to_string_lossy()]),
                parent,
            )
            .await
            .map_err(|e| Error::git("clone", e))?;
        Ok(Self::new(dest))
    }

    /// Fetch `refspec` from `remote`.
    pub async fn fetch(&self, remote: &str, refspec: &str) -> Result<()> {
        self.git(&["fetch", remote, refspec]).await.map(drop)
    }

    /// Check out `branch` in the primary workspace.
    pub async fn checkout(&self, branch: &str) -> Result<()> {
        self.git(&["checkout", branch]).await.map(drop)
    }

    async fn git(&self, argv: &[&str]) -> Result<String> {
        let subcommand = argv.first().copied().unwrap_or_default();
        self.runner
            .run("git", &args(argv), &self.root)
            .await
            .map(|r| r.output)
            .map_err(|e| Error::git(subcommand, e))
    }

    /// Like [`Self::git`], but a normal non-zero exit yields `None`.
    async fn git_opt(&self, argv: &[&str]) -> Result<Option<String>> {
        let subcommand = argv.first().copied().unwrap_or_default();
        match self.runner.run("git", &args(argv), &self.root).await {
            Ok(result) => Ok(Some(result.output)),
            Err(Error::Execution(e)) if !e.timed_out && e.exit_code.is_some() => Ok(None),
            Err(e) => Err(Error::git(subcommand, e)),
        }
    }

    async fn rev_parse_commit(&self, spec: &str) -> Result<Option<String>> {
        let spec = format!("{}^{{commit}}", spec);
        Ok(self
            .git_opt(&["rev-parse", "--verify", "--quiet", spec.as_str()])
            .await?
            .map(|out| out.trim().to_string())
            .filter(|hash| !hash.is_empty()))
    }
}

#[async_trait]
impl Repository for GitCli {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    async fn head(&self) -> Result<Head> {
        let hash = self.git(&["rev-parse", "HEAD"]).await?.trim().to_string();
        let symbolic_ref = self
            .git_opt(&["symbolic-ref", "-q", "HEAD"])
            .await?
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let revision = match symbolic_ref.as_deref() {
            Some(r) => Revision::named(hash, r.strip_prefix(HEADS_PREFIX).unwrap_or(r)),
            None => Revision::new(hash),
        };
        Ok(Head {
            revision,
            symbolic_ref,
        })
    }

    async fn resolve_branch(&self, name: &str) -> Result<Option<Revision>> {
        let short = name.strip_prefix(HEADS_PREFIX).unwrap_or(name);
        for candidate in [
            format!("{}{}", HEADS_PREFIX, short),
            format!("{}{}", REMOTE_PREFIX, short),
        ] {
            if let Some(hash) = self.rev_parse_commit(&candidate).await? {
                debug!(branch = short, reference = %candidate, %hash, "resolved branch");
                return Ok(Some(Revision::named(hash, short)));
            }
        }
        Ok(None)
    }

    async fn resolve_commit(&self, id: &str) -> Result<Option<Revision>> {
        Ok(self.rev_parse_commit(id).await?.map(Revision::new))
    }

    async fn dirty_entries(&self) -> Result<Vec<String>> {
        // Refresh stat info so touched but unchanged files are not reported.
        self.git_opt(&["update-index", "-q", "--refresh"]).await?;
        let status = self
            .git(&["status", "--porcelain", "--untracked-files=no"])
            .await?;
        Ok(status
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn add_worktree(&self, path: &Path, revision: &Revision) -> Result<()> {
        let path = path.to_string_lossy();
        self.git(&["worktree", "add", "-f", "--detach", &*path, revision.hash.as_str()])
            .await
            .map(drop)
    }

    async fn remove_worktree(&self, path: &Path) -> Result<()> {
        let path = path.to_string_lossy();
        let removed = self.git(&["worktree", "remove", "--force", &*path]).await;
        self.git_opt(&["worktree", "prune"]).await?;
        removed.map(drop)
    }
}

fn args(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|a| a.to_string()).collect()
}
