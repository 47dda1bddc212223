// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Resolution of the user-supplied comparison target.

use crate::git::Repository;
use funcbench_core::{ComparisonTarget, Error, Head, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

/// Target that selects a self-comparison of the current workspace.
pub const SELF_COMPARE_TARGET: &str = ".";

static COMMIT_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{4,40}$").unwrap_or_else(|e| panic!("invalid commit pattern: {}", e))
});

/// Resolve `target` against `repo`.
///
/// - `.` selects [`ComparisonMode::SelfCompare`](funcbench_core::ComparisonMode)
///   without touching the repository.
/// - A branch name (optionally prefixed with `refs/heads/`) resolves locally,
///   then against `origin`. Hex strings that match no branch resolve as commits.
///
/// # Errors
///
/// [`Error::AmbiguousTarget`] when the target names the current branch or
/// resolves to the current head commit, [`Error::RevisionResolution`] when
/// nothing matches.
pub async fn resolve_target(repo: &dyn Repository, target: &str) -> Result<ComparisonTarget> {
    if target == SELF_COMPARE_TARGET {
        debug!("self-comparison requested");
        return Ok(ComparisonTarget::self_compare());
    }
    if target.trim().is_empty() {
        return Err(Error::RevisionResolution {
            target: target.to_string(),
            reason: "empty target".to_string(),
        });
    }

    let head = repo.head().await?;
    if names_head(&head, target) {
        return Err(ambiguous(target, &head));
    }

    let revision = match repo.resolve_branch(target).await? {
        Some(revision) => Some(revision),
        None if COMMIT_ID.is_match(target) => repo.resolve_commit(target).await?,
        None => None,
    };
    let Some(revision) = revision else {
        return Err(Error::RevisionResolution {
            target: target.to_string(),
            reason: "no branch or commit with that name".to_string(),
        });
    };

    if revision.hash == head.revision.hash {
        return Err(ambiguous(target, &head));
    }

    info!(target, revision = %revision, "resolved comparison target");
    Ok(ComparisonTarget::cross_revision(revision))
}

fn names_head(head: &Head, target: &str) -> bool {
    let name = target.strip_prefix("refs/heads/").unwrap_or(target);
    head.branch() == Some(name) || target == head.revision.hash
}

fn ambiguous(target: &str, head: &Head) -> Error {
    Error::AmbiguousTarget {
        target: target.to_string(),
        current: head.revision.hash.clone(),
    }
}
