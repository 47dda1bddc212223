// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Go benchmark output handling for funcbench.
//!
//! This crate turns raw `go test -bench` output into comparison reports and
//! renders them for the console and for pull request comments.
//!
//! # Quick Start
//!
//! ```
//! use funcbench_benchmarks::{compare_benchmarks, parse_benchmarks, render_plain};
//!
//! let old = parse_benchmarks("BenchmarkA-8  1000  120 ns/op\n");
//! let new = parse_benchmarks("BenchmarkA-8  1000  100 ns/op\n");
//! let report = compare_benchmarks(&old, &new, "main").unwrap();
//! assert!(render_plain(&report).contains("-16.67%"));
//! ```
//!
//! # Modules
//!
//! - [`parser`] - benchmark output parsing
//! - [`result`] - samples, deltas and the `ComparisonReport`
//! - [`compare`] - cross-revision and self comparison
//! - [`render`] - plain-text tables
//! - [`markdown`] - markdown conversion and comment bodies
//! - [`io`] - JSON report export

#![warn(missing_docs, rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod compare;
pub mod io;
pub mod markdown;
pub mod parser;
pub mod render;
pub mod result;

pub use compare::{compare_benchmarks, compare_sub_benchmarks};
pub use markdown::{generate_comment, to_markdown};
pub use parser::parse_benchmarks;
pub use render::{render_exclusions, render_plain};
pub use result::{
    BenchmarkMetric, BenchmarkSample, BenchmarkSet, ComparisonReport, Delta, ExcludedBenchmark,
    ExclusionReason, MetricDelta, MetricKind,
};
