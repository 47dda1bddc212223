// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark comparison.
//!
//! [`compare_benchmarks`] matches two runs by benchmark name;
//! [`compare_sub_benchmarks`] compares the sub-benchmarks of one parent
//! within a single run against the first of them.

use crate::result::{
    BenchmarkMetric, BenchmarkSample, BenchmarkSet, ComparisonReport, ExcludedBenchmark,
    ExclusionReason, MetricDelta, MetricKind,
};
use funcbench_core::{ComparisonMode, Error, Result};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Compare the target run (`old`) with the current run (`new`).
///
/// Rows follow the current run's order. Each row carries one column per
/// metric kind reported on both sides. When a name has several samples on a
/// side, the first one is used.
///
/// # Errors
///
/// Returns [`Error::NoComparableBenchmarks`] when no name has a shared metric.
pub fn compare_benchmarks(
    old: &BenchmarkSet,
    new: &BenchmarkSet,
    label: impl Into<String>,
) -> Result<ComparisonReport> {
    let mut metrics = Vec::new();
    let mut excluded = Vec::new();

    for (name, new_samples) in new.iter() {
        let Some(old_samples) = old.get(name) else {
            excluded.push(ExcludedBenchmark {
                name: name.to_string(),
                reason: ExclusionReason::OnlyInNew,
            });
            continue;
        };
        if old_samples.len() > 1 || new_samples.len() > 1 {
            warn!(
                benchmark = name,
                old_samples = old_samples.len(),
                new_samples = new_samples.len(),
                "multiple samples for benchmark, comparing the first of each"
            );
        }
        let row = compare_samples(name, &old_samples[0], &new_samples[0]);
        if row.columns.is_empty() {
            excluded.push(ExcludedBenchmark {
                name: name.to_string(),
                reason: ExclusionReason::NoCommonMetrics,
            });
        } else {
            metrics.push(row);
        }
    }

    for name in old.names().iter().filter(|n| !new.contains(n)) {
        excluded.push(ExcludedBenchmark {
            name: name.clone(),
            reason: ExclusionReason::OnlyInOld,
        });
    }

    if metrics.is_empty() {
        return Err(Error::NoComparableBenchmarks {
            old_count: old.len(),
            new_count: new.len(),
        });
    }

    debug!(
        compared = metrics.len(),
        excluded = excluded.len(),
        "cross-revision comparison complete"
    );
    Ok(ComparisonReport::new(
        label,
        ComparisonMode::CrossRevision,
        metrics,
        excluded,
    ))
}

/// Compare sub-benchmarks within one run.
///
/// Samples are grouped by parent benchmark: the name up to the first `/`,
/// without its `-<procs>` suffix. The first sample of a group is the baseline
/// and every later sample becomes a row under its own name. A name seen again
/// in the same group gets a `#<n>` suffix, `n` being its occurrence count.
/// Groups with a single sample are excluded.
///
/// # Errors
///
/// Returns [`Error::NoSubBenchmarks`] when no group has two or more samples.
pub fn compare_sub_benchmarks(
    set: &BenchmarkSet,
    label: impl Into<String>,
) -> Result<ComparisonReport> {
    let mut metrics = Vec::new();
    let mut excluded = Vec::new();

    for (parent, samples) in group_by_parent(set) {
        let Some((baseline, rest)) = samples.split_first().filter(|(_, r)| !r.is_empty()) else {
            excluded.push(ExcludedBenchmark {
                name: samples
                    .first()
                    .map_or_else(|| parent.to_string(), |s| s.name.clone()),
                reason: ExclusionReason::SingleSample,
            });
            continue;
        };
        debug!(
            group = parent,
            baseline = %baseline.name,
            samples = samples.len(),
            "comparing sub-benchmarks"
        );

        let mut seen: HashMap<&str, usize> = HashMap::new();
        seen.insert(baseline.name.as_str(), 1);
        for sample in rest {
            let count = seen.entry(sample.name.as_str()).or_insert(0);
            *count += 1;
            let row_name = if *count > 1 {
                format!("{}#{}", sample.name, count)
            } else {
                sample.name.clone()
            };
            metrics.push(compare_samples(&row_name, baseline, sample));
        }
    }

    if metrics.is_empty() {
        return Err(Error::NoSubBenchmarks);
    }

    debug!(
        compared = metrics.len(),
        excluded = excluded.len(),
        "self comparison complete"
    );
    Ok(ComparisonReport::new(
        label,
        ComparisonMode::SelfCompare,
        metrics,
        excluded,
    ))
}

/// Parent benchmark of `name`: `BenchmarkQuery/small-8` and `BenchmarkQuery-8`
/// both belong to `BenchmarkQuery`.
fn parent_name(name: &str) -> &str {
    let top = name.split('/').next().unwrap_or(name);
    match top.rsplit_once('-') {
        Some((base, procs))
            if !base.is_empty() && !procs.is_empty() && procs.bytes().all(|b| b.is_ascii_digit()) =>
        {
            base
        }
        _ => top,
    }
}

fn group_by_parent(set: &BenchmarkSet) -> Vec<(&str, Vec<&BenchmarkSample>)> {
    let mut groups: Vec<(&str, Vec<&BenchmarkSample>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for (name, samples) in set.iter() {
        let parent = parent_name(name);
        let slot = *index.entry(parent).or_insert_with(|| {
            groups.push((parent, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.extend(samples.iter());
    }
    groups
}

fn compare_samples(name: &str, old: &BenchmarkSample, new: &BenchmarkSample) -> BenchmarkMetric {
    let columns = MetricKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let (o, n) = (old.value(kind)?, new.value(kind)?);
            Some(MetricDelta::new(kind, o, n))
        })
        .collect();
    BenchmarkMetric {
        name: name.to_string(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_benchmarks;
    use crate::result::Delta;

    const OLD: &str = "\
BenchmarkA-8   1000   100 ns/op   64 B/op   2 allocs/op
BenchmarkB-8   1000   200 ns/op
BenchmarkGone-8   1000   50 ns/op
";

    const NEW: &str = "\
BenchmarkA-8   1000   110 ns/op   64 B/op   1 allocs/op
BenchmarkB-8   1000   100 ns/op
BenchmarkFresh-8   1000   75 ns/op
";

    #[test]
    fn test_cross_revision_deltas() {
        let report =
            compare_benchmarks(&parse_benchmarks(OLD), &parse_benchmarks(NEW), "main").unwrap();
        assert_eq!(report.mode, ComparisonMode::CrossRevision);
        assert_eq!(report.metrics.len(), 2);

        let a = &report.metrics[0];
        assert_eq!(a.name, "BenchmarkA-8");
        let time = a.column(MetricKind::Time).unwrap();
        assert_eq!(time.old, 100.0);
        assert_eq!(time.new, 110.0);
        assert!((time.delta.percent().unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(
            a.column(MetricKind::Allocs).unwrap().delta,
            Delta::Percent(-50.0)
        );
        assert_eq!(a.column(MetricKind::Bytes).unwrap().delta, Delta::Percent(0.0));

        let b = &report.metrics[1];
        assert_eq!(b.columns.len(), 1);
        assert_eq!(b.column(MetricKind::Time).unwrap().delta, Delta::Percent(-50.0));
    }

    #[test]
    fn test_one_sided_names_are_excluded() {
        let report =
            compare_benchmarks(&parse_benchmarks(OLD), &parse_benchmarks(NEW), "main").unwrap();
        assert!(report.metrics.iter().all(|m| m.name != "BenchmarkFresh-8"));
        assert!(report.excluded.contains(&ExcludedBenchmark {
            name: "BenchmarkFresh-8".to_string(),
            reason: ExclusionReason::OnlyInNew,
        }));
        assert!(report.excluded.contains(&ExcludedBenchmark {
            name: "BenchmarkGone-8".to_string(),
            reason: ExclusionReason::OnlyInOld,
        }));
    }

    #[test]
    fn test_identical_reports_have_zero_deltas() {
        let set = parse_benchmarks(OLD);
        let report = compare_benchmarks(&set, &set, "self").unwrap();
        assert_eq!(report.metrics.len(), 3);
        for metric in &report.metrics {
            for column in &metric.columns {
                assert_eq!(column.delta, Delta::Percent(0.0));
            }
        }
        assert!(report.excluded.is_empty());
    }

    #[test]
    fn test_zero_baseline_gives_undefined_delta() {
        let old = parse_benchmarks("BenchmarkZ-8  10  0 ns/op  0 allocs/op\n");
        let new = parse_benchmarks("BenchmarkZ-8  10  5 ns/op  0 allocs/op\n");
        let report = compare_benchmarks(&old, &new, "main").unwrap();
        let row = &report.metrics[0];
        assert_eq!(row.column(MetricKind::Time).unwrap().delta, Delta::Undefined);
        assert_eq!(row.column(MetricKind::Allocs).unwrap().delta, Delta::Undefined);
    }

    #[test]
    fn test_disjoint_reports_fail() {
        let old = parse_benchmarks("BenchmarkA-8  10  5 ns/op\n");
        let new = parse_benchmarks("BenchmarkB-8  10  5 ns/op\nBenchmarkC-8  10  5 ns/op\n");
        match compare_benchmarks(&old, &new, "main") {
            Err(Error::NoComparableBenchmarks { old_count, new_count }) => {
                assert_eq!(old_count, 1);
                assert_eq!(new_count, 2);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_matched_name_without_shared_metric() {
        let old = parse_benchmarks("BenchmarkA-8  10  5 ns/op\nBenchmarkB-8  10  5 ns/op\n");
        let new = parse_benchmarks("BenchmarkA-8  10  5 MB/s\nBenchmarkB-8  10  6 ns/op\n");
        let report = compare_benchmarks(&old, &new, "main").unwrap();
        assert_eq!(report.metrics.len(), 1);
        assert_eq!(report.excluded[0].reason, ExclusionReason::NoCommonMetrics);
    }

    #[test]
    fn test_first_sample_used_when_repeated() {
        let old = parse_benchmarks("BenchmarkA-8  10  100 ns/op\nBenchmarkA-8  10  900 ns/op\n");
        let new = parse_benchmarks("BenchmarkA-8  10  150 ns/op\n");
        let report = compare_benchmarks(&old, &new, "main").unwrap();
        assert_eq!(
            report.metrics[0].column(MetricKind::Time).unwrap().delta,
            Delta::Percent(50.0)
        );
    }

    #[test]
    fn test_sub_benchmarks_against_first_sample() {
        let set = parse_benchmarks(
            "\
BenchmarkA-8  10  100 ns/op
BenchmarkA-8  10  120 ns/op
BenchmarkA-8  10  80 ns/op
BenchmarkB-8  10  42 ns/op
",
        );
        let report = compare_sub_benchmarks(&set, "self").unwrap();
        assert_eq!(report.mode, ComparisonMode::SelfCompare);
        let names: Vec<_> = report.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["BenchmarkA-8#2", "BenchmarkA-8#3"]);
        assert_eq!(
            report.metrics[0].column(MetricKind::Time).unwrap().delta,
            Delta::Percent(20.0)
        );
        assert_eq!(
            report.metrics[1].column(MetricKind::Time).unwrap().delta,
            Delta::Percent(-20.0)
        );
        assert_eq!(
            report.excluded,
            vec![ExcludedBenchmark {
                name: "BenchmarkB-8".to_string(),
                reason: ExclusionReason::SingleSample,
            }]
        );
    }

    #[test]
    fn test_single_run_sub_benchmarks() {
        let set = parse_benchmarks(
            "\
goos: linux
goarch: amd64
pkg: example.com/query
BenchmarkQuery/small-8         	    1000	       100 ns/op	      16 B/op	       1 allocs/op
BenchmarkQuery/large-8         	    1000	       900 ns/op	      16 B/op	       1 allocs/op
BenchmarkParse-8               	    5000	        42 ns/op
PASS
ok  	example.com/query	2.345s
",
        );
        let report = compare_sub_benchmarks(&set, ".").unwrap();
        assert_eq!(report.metrics.len(), 1);
        let row = &report.metrics[0];
        assert_eq!(row.name, "BenchmarkQuery/large-8");
        let time = row.column(MetricKind::Time).unwrap();
        assert_eq!(time.old, 100.0);
        assert_eq!(time.new, 900.0);
        assert_eq!(time.delta, Delta::Percent(800.0));
        assert_eq!(row.column(MetricKind::Bytes).unwrap().delta, Delta::Percent(0.0));
        assert_eq!(
            report.excluded,
            vec![ExcludedBenchmark {
                name: "BenchmarkParse-8".to_string(),
                reason: ExclusionReason::SingleSample,
            }]
        );
    }

    #[test]
    fn test_parent_name() {
        assert_eq!(parent_name("BenchmarkQuery/small-8"), "BenchmarkQuery");
        assert_eq!(parent_name("BenchmarkQuery/a/b"), "BenchmarkQuery");
        assert_eq!(parent_name("BenchmarkQuery-16"), "BenchmarkQuery");
        assert_eq!(parent_name("BenchmarkQuery"), "BenchmarkQuery");
        assert_eq!(parent_name("BenchmarkFoo-bar"), "BenchmarkFoo-bar");
    }

    #[test]
    fn test_no_repeated_samples_fails() {
        let set = parse_benchmarks("BenchmarkA-8  10  1 ns/op\nBenchmarkB-8  10  1 ns/op\n");
        assert!(matches!(
            compare_sub_benchmarks(&set, "self"),
            Err(Error::NoSubBenchmarks)
        ));
        assert!(matches!(
            compare_sub_benchmarks(&BenchmarkSet::new(), "self"),
            Err(Error::NoSubBenchmarks)
        ));
    }
}
