// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Adapters and orchestration for funcbench.
//!
//! This crate connects the comparison engine to the outside world: the `git`
//! binary, the Go toolchain, and the place results are reported to.
//!
//! # Modules
//!
//! - [`process`] - timed subprocess execution
//! - [`git`] - the [`Repository`] capability and its `git` implementation
//! - [`resolver`] - comparison target resolution
//! - [`worktree`] - secondary worktree lifecycle
//! - [`executor`] - the [`BenchmarkRunner`] capability for `go test -bench`
//! - [`delivery`], [`github`], [`environment`] - result delivery
//! - [`orchestrator`] - the pipeline

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod delivery;
pub mod environment;
pub mod executor;
pub mod git;
pub mod github;
pub mod orchestrator;
pub mod process;
pub mod resolver;
pub mod worktree;

pub use delivery::Delivery;
pub use environment::{Environment, EnvironmentSettings, GitHubActionsEnvironment, LocalEnvironment};
pub use executor::{BenchmarkRunner, GoBenchmarkExecutor};
pub use git::{GitCli, Repository};
pub use github::GitHubClient;
pub use orchestrator::Orchestrator;
pub use process::ProcessRunner;
pub use resolver::resolve_target;
pub use worktree::WorktreeManager;
