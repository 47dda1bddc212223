// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Secondary worktree lifecycle.

use crate::git::Repository;
use funcbench_core::{Error, Result, Revision, WorkspaceHandle};
use std::path::Path;
use tracing::{debug, info, warn};

/// Owns the single secondary worktree of one pipeline run.
pub struct WorktreeManager<'a> {
    repo: &'a dyn Repository,
    current: Option<WorkspaceHandle>,
}

impl<'a> WorktreeManager<'a> {
    /// Manager for worktrees of `repo`.
    pub fn new(repo: &'a dyn Repository) -> Self {
        Self {
            repo,
            current: None,
        }
    }

    /// Fail with [`Error::WorkspaceDirty`] if tracked files in the primary
    /// workspace have staged or unstaged changes.
    pub async fn ensure_clean(&self) -> Result<()> {
        let entries = self.repo.dirty_entries().await?;
        if entries.is_empty() {
            debug!("workspace is clean");
            return Ok(());
        }
        Err(Error::WorkspaceDirty {
            path: self.repo.root(),
            entries,
        })
    }

    /// Create a fresh detached checkout of `revision` at `path`.
    ///
    /// Whatever was at `path` before is removed first; a missing worktree is
    /// not an error.
    pub async fn prepare(&mut self, path: &Path, revision: &Revision) -> Result<&WorkspaceHandle> {
        if let Some(previous) = self.current.take() {
            if previous.path() != path {
                self.remove_best_effort(previous.path()).await;
            }
        }
        self.remove_best_effort(path).await;

        info!(path = %path.display(), revision = %revision, "creating worktree");
        self.repo
            .add_worktree(path, revision)
            .await
            .map_err(|e| Error::WorktreeCreation {
                revision: revision.hash.clone(),
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let handle = self
            .current
            .insert(WorkspaceHandle::new(path, revision.clone()));
        Ok(&*handle)
    }

    /// Remove the current worktree, if any. Failures are only logged.
    pub async fn cleanup(&mut self) {
        let Some(handle) = self.current.take() else {
            return;
        };
        match self.repo.remove_worktree(handle.path()).await {
            Ok(()) => debug!(path = %handle.path().display(), "removed worktree"),
            Err(e) => warn!(
                path = %handle.path().display(),
                error = %e,
                "failed to remove worktree"
            ),
        }
    }

    async fn remove_best_effort(&self, path: &Path) {
        if let Err(e) = self.repo.remove_worktree(path).await {
            debug!(path = %path.display(), error = %e, "no worktree removed");
        }
        if !path.exists() {
            return;
        }
        let root = self.repo.root();
        if !is_strictly_below(path, &root).await {
            warn!(
                path = %path.display(),
                root = %root.display(),
                "refusing to delete a directory that is not below the repository root"
            );
            return;
        }
        if let Err(e) = tokio::fs::remove_dir_all(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove stale worktree directory");
        }
    }
}

/// Whether `path` resolves to a directory strictly inside `root`.
async fn is_strictly_below(path: &Path, root: &Path) -> bool {
    let (Ok(path), Ok(root)) = (
        tokio::fs::canonicalize(path).await,
        tokio::fs::canonicalize(root).await,
    ) else {
        return false;
    };
    path != root && path.starts_with(&root)
}
