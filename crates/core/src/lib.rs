// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Core types for funcbench.
//!
//! This crate holds what every other funcbench crate shares:
//!
//! - [`types`] - revisions, comparison targets, workspace handles, execution results
//! - [`error`] - the [`Error`] taxonomy and [`Result`] alias
//! - [`config`] - layered configuration loading
//! - [`execution`] - per-run pipeline phase tracking

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod execution;
pub mod types;

pub use crate::config::FuncbenchConfig;
pub use error::{Error, ExecutionError, Result};
pub use execution::{Phase, PhaseSpan, PhaseStatus, RunRecord};
pub use types::{
    ComparisonMode, ComparisonTarget, ExecutionResult, Head, Revision, WorkspaceHandle,
};
