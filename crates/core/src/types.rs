// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Revision, target and workspace types shared by the pipeline stages.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Length of the abbreviated hash used in logs and labels.
const SHORT_HASH_LEN: usize = 12;

/// An immutable, content-addressed commit identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision {
    /// Full commit hash.
    pub hash: String,
    /// Branch or ref name the revision was resolved from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Revision {
    /// Create a revision without a ref name.
    pub fn new(hash: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            name: None,
        }
    }

    /// Create a revision resolved from a named ref.
    pub fn named(hash: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            name: Some(name.into()),
        }
    }

    /// Abbreviated hash.
    pub fn short(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(SHORT_HASH_LEN)
            .map(|(i, _)| i)
            .unwrap_or(self.hash.len());
        &self.hash[..end]
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} ({})", name, self.short()),
            None => write!(f, "{}", self.short()),
        }
    }
}

/// The checked-out head of a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    /// Commit the head points at.
    pub revision: Revision,
    /// Full symbolic ref (e.g. `refs/heads/main`), `None` when detached.
    pub symbolic_ref: Option<String>,
}

impl Head {
    /// Branch name with the `refs/heads/` namespace stripped.
    pub fn branch(&self) -> Option<&str> {
        self.symbolic_ref
            .as_deref()
            .map(|r| r.strip_prefix("refs/heads/").unwrap_or(r))
    }
}

/// How a comparison is carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonMode {
    /// Compare repeated samples of one run against each other.
    SelfCompare,
    /// Compare the current workspace against another revision.
    CrossRevision,
}

impl std::fmt::Display for ComparisonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonMode::SelfCompare => write!(f, "self-compare"),
            ComparisonMode::CrossRevision => write!(f, "cross-revision"),
        }
    }
}

/// Resolved form of the user-supplied comparison target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonTarget {
    /// Comparison mode.
    pub mode: ComparisonMode,
    /// Baseline revision; `None` for self-comparison.
    pub revision: Option<Revision>,
}

impl ComparisonTarget {
    /// Self-comparison target.
    pub fn self_compare() -> Self {
        Self {
            mode: ComparisonMode::SelfCompare,
            revision: None,
        }
    }

    /// Cross-revision target against `revision`.
    pub fn cross_revision(revision: Revision) -> Self {
        Self {
            mode: ComparisonMode::CrossRevision,
            revision: Some(revision),
        }
    }
}

/// A secondary checkout bound to a single revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceHandle {
    path: PathBuf,
    revision: Revision,
}

impl WorkspaceHandle {
    /// Bind `path` to `revision`.
    pub fn new(path: impl Into<PathBuf>, revision: Revision) -> Self {
        Self {
            path: path.into(),
            revision,
        }
    }

    /// Location of the checkout.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Revision checked out at [`Self::path`].
    pub fn revision(&self) -> &Revision {
        &self.revision
    }
}

/// Outcome of one successful external command run.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Combined stdout and stderr.
    pub output: String,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Whether the run hit its timeout. Always `false` for a returned result.
    pub timed_out: bool,
}
