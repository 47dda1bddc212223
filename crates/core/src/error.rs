// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the comparison pipeline.
//!
//! Every failure the engine can produce is a variant of [`Error`]. All of them
//! are fatal to the current invocation except [`Error::Delivery`], which the
//! orchestrator only logs.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type used across the funcbench crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the comparison engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The primary workspace has uncommitted changes to tracked files.
    #[error("workspace {} is not clean ({} dirty entries: {})", .path.display(), .entries.len(), .entries.join(", "))]
    WorkspaceDirty {
        /// Repository root that was checked.
        path: PathBuf,
        /// Porcelain status lines of the dirty entries.
        entries: Vec<String>,
    },

    /// The comparison target resolves to the revision already checked out.
    #[error("target {target} is identical to current revision {current}; no difference would be observed")]
    AmbiguousTarget {
        /// Target string as given by the user.
        target: String,
        /// Current head hash.
        current: String,
    },

    /// The comparison target could not be resolved to a revision.
    #[error("could not resolve target {target}: {reason}")]
    RevisionResolution {
        /// Target string as given by the user.
        target: String,
        /// Why resolution failed.
        reason: String,
    },

    /// The secondary worktree could not be created.
    #[error("failed to check out {revision} in worktree {}: {reason}", .path.display())]
    WorktreeCreation {
        /// Revision hash that was being checked out.
        revision: String,
        /// Worktree location.
        path: PathBuf,
        /// Underlying cause.
        reason: String,
    },

    /// The benchmark command failed or timed out.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A self-comparison found no benchmark with two or more samples.
    #[error("no sub-benchmarks to compare: every benchmark name appeared only once")]
    NoSubBenchmarks,

    /// A cross-revision comparison found no benchmark name on both sides.
    #[error("no comparable benchmarks: {old_count} benchmarks in target run, {new_count} in current run, none in common")]
    NoComparableBenchmarks {
        /// Distinct names in the old (target) report.
        old_count: usize,
        /// Distinct names in the new (current) report.
        new_count: usize,
    },

    /// Posting a result or error to the delivery collaborator failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// A git plumbing command failed outside of the cases above.
    #[error("git {command} failed: {reason}")]
    Git {
        /// Git subcommand that failed.
        command: String,
        /// Underlying cause.
        reason: String,
    },

    /// An interrupt was observed before the named phase started.
    #[error("cancelled before {phase}")]
    Cancelled {
        /// Phase that was about to start.
        phase: String,
    },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Invalid input such as a malformed filter or duration.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a git error for the given subcommand.
    pub fn git(command: impl Into<String>, reason: impl ToString) -> Self {
        Error::Git {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error is a timed-out benchmark execution.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Execution(e) if e.timed_out)
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Failure of one external command run.
///
/// `output` is only populated when the output was not already streamed to the
/// console, so verbose runs do not print it twice.
#[derive(Debug, Clone)]
pub struct ExecutionError {
    /// Rendered command line.
    pub command: String,
    /// Wall-clock time until the command exited or was killed.
    pub elapsed: Duration,
    /// Whether the configured timeout expired.
    pub timed_out: bool,
    /// Exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Captured combined output (non-verbose runs only).
    pub output: Option<String>,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.timed_out {
            write!(f, "command `{}` timed out after {:.1?}", self.command, self.elapsed)?;
        } else {
            match self.exit_code {
                Some(code) => write!(
                    f,
                    "command `{}` exited with code {} after {:.1?}",
                    self.command, code, self.elapsed
                )?,
                None => write!(
                    f,
                    "command `{}` was terminated after {:.1?}",
                    self.command, self.elapsed
                )?,
            }
        }
        if let Some(output) = self.output.as_deref().filter(|o| !o.trim().is_empty()) {
            write!(f, "; command output:\n{}", output.trim_end())?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionError {}
