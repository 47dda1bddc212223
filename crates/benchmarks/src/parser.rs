// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Parser for `go test -bench` output.
//!
//! Only result lines are recognized:
//!
//! ```text
//! BenchmarkParse-8    1000000    1234 ns/op    56.7 MB/s    128 B/op    3 allocs/op
//! ```
//!
//! Everything else (`goos:`, `PASS`, `ok  pkg  1.2s`, test logs) is ignored.
//! Units other than `ns/op`, `MB/s`, `B/op` and `allocs/op` are skipped.

use crate::result::{BenchmarkSample, BenchmarkSet, MetricKind};
use std::collections::BTreeMap;
use tracing::debug;

const NAME_PREFIX: &str = "Benchmark";

/// Parse combined benchmark output into a [`BenchmarkSet`].
pub fn parse_benchmarks(output: &str) -> BenchmarkSet {
    let set: BenchmarkSet = output.lines().filter_map(parse_line).collect();
    debug!(benchmarks = set.len(), "parsed benchmark output");
    set
}

/// Parse a single result line.
///
/// Returns `None` for lines that are not benchmark results, including a
/// benchmark line with no recognized metric.
pub fn parse_line(line: &str) -> Option<BenchmarkSample> {
    let mut fields = line.split_whitespace();

    let name = fields.next()?;
    if !name.starts_with(NAME_PREFIX) || name.len() == NAME_PREFIX.len() {
        return None;
    }
    let iterations: u64 = fields.next()?.parse().ok()?;

    let rest: Vec<&str> = fields.collect();
    let mut values = BTreeMap::new();
    for pair in rest.chunks(2) {
        let [value, unit] = pair else {
            break;
        };
        let Ok(value) = value.parse::<f64>() else {
            break;
        };
        if let Some(kind) = MetricKind::from_unit(unit) {
            values.entry(kind).or_insert(value);
        }
    }

    if values.is_empty() {
        return None;
    }

    Some(BenchmarkSample {
        name: name.to_string(),
        iterations,
        values,
    })
}
