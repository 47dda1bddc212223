// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Benchmark sample and comparison report types.
//!
//! Parsed output is held in a [`BenchmarkSet`]; comparing sets yields a
//! [`ComparisonReport`], the only artifact handed to renderers and delivery.

use chrono::{DateTime, Utc};
use funcbench_core::ComparisonMode;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A measured quantity reported by `go test -bench`.
///
/// Declaration order is the rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Time per operation (`ns/op`).
    Time,
    /// Throughput (`MB/s`).
    Throughput,
    /// Allocations per operation (`allocs/op`).
    Allocs,
    /// Bytes allocated per operation (`B/op`).
    Bytes,
}

impl MetricKind {
    /// All kinds in rendering order.
    pub const ALL: [MetricKind; 4] = [
        MetricKind::Time,
        MetricKind::Throughput,
        MetricKind::Allocs,
        MetricKind::Bytes,
    ];

    /// Unit as printed by the Go benchmark runner.
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKind::Time => "ns/op",
            MetricKind::Throughput => "MB/s",
            MetricKind::Allocs => "allocs/op",
            MetricKind::Bytes => "B/op",
        }
    }

    /// Unit label used in table headers.
    pub fn header_unit(&self) -> &'static str {
        match self {
            MetricKind::Time => "ns/op",
            MetricKind::Throughput => "MB/s",
            MetricKind::Allocs => "allocs",
            MetricKind::Bytes => "bytes",
        }
    }

    /// Kind for a Go benchmark unit, if known.
    pub fn from_unit(unit: &str) -> Option<Self> {
        match unit {
            "ns/op" => Some(MetricKind::Time),
            "MB/s" => Some(MetricKind::Throughput),
            "allocs/op" => Some(MetricKind::Allocs),
            "B/op" => Some(MetricKind::Bytes),
            _ => None,
        }
    }
}

/// One benchmark result line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSample {
    /// Benchmark name including the `-GOMAXPROCS` suffix.
    pub name: String,
    /// Iterations the runner executed.
    pub iterations: u64,
    /// Reported values by kind.
    pub values: BTreeMap<MetricKind, f64>,
}

impl BenchmarkSample {
    /// Value reported for `kind`, if any.
    pub fn value(&self, kind: MetricKind) -> Option<f64> {
        self.values.get(&kind).copied()
    }
}

/// Parsed benchmark report: samples grouped by name, in first-appearance order.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkSet {
    order: Vec<String>,
    samples: HashMap<String, Vec<BenchmarkSample>>,
}

impl BenchmarkSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample; repeated names accumulate.
    pub fn push(&mut self, sample: BenchmarkSample) {
        if !self.samples.contains_key(&sample.name) {
            self.order.push(sample.name.clone());
        }
        self.samples
            .entry(sample.name.clone())
            .or_default()
            .push(sample);
    }

    /// Samples recorded under `name`.
    pub fn get(&self, name: &str) -> Option<&[BenchmarkSample]> {
        self.samples.get(name).map(Vec::as_slice)
    }

    /// Whether `name` has at least one sample.
    pub fn contains(&self, name: &str) -> bool {
        self.samples.contains_key(name)
    }

    /// Distinct names in first-appearance order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// `(name, samples)` pairs in first-appearance order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BenchmarkSample])> {
        self.order
            .iter()
            .filter_map(|name| self.get(name).map(|s| (name.as_str(), s)))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no sample was parsed.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl FromIterator<BenchmarkSample> for BenchmarkSet {
    fn from_iter<I: IntoIterator<Item = BenchmarkSample>>(iter: I) -> Self {
        let mut set = BenchmarkSet::new();
        for sample in iter {
            set.push(sample);
        }
        set
    }
}

/// Signed percentage change from old to new.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delta {
    /// `(new - old) / old * 100`.
    Percent(f64),
    /// Old value was zero (or the result was not finite).
    Undefined,
}

impl Delta {
    /// Delta between `old` and `new`.
    pub fn between(old: f64, new: f64) -> Self {
        if old == 0.0 {
            return Delta::Undefined;
        }
        let pct = (new - old) / old * 100.0;
        if pct.is_finite() {
            Delta::Percent(pct)
        } else {
            Delta::Undefined
        }
    }

    /// Percentage, unless undefined.
    pub fn percent(&self) -> Option<f64> {
        match self {
            Delta::Percent(p) => Some(*p),
            Delta::Undefined => None,
        }
    }
}

impl std::fmt::Display for Delta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delta::Percent(p) => write!(f, "{:+.2}%", p),
            Delta::Undefined => write!(f, "n/a"),
        }
    }
}

/// Old/new values and delta for one metric kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Metric kind.
    pub kind: MetricKind,
    /// Baseline value.
    pub old: f64,
    /// Candidate value.
    pub new: f64,
    /// Change from old to new.
    pub delta: Delta,
}

impl MetricDelta {
    /// Compare `old` and `new` for `kind`.
    pub fn new(kind: MetricKind, old: f64, new: f64) -> Self {
        Self {
            kind,
            old,
            new,
            delta: Delta::between(old, new),
        }
    }
}

/// One compared benchmark row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkMetric {
    /// Row name.
    pub name: String,
    /// One entry per kind reported on both sides, in [`MetricKind`] order.
    pub columns: Vec<MetricDelta>,
}

impl BenchmarkMetric {
    /// Column for `kind`, if both sides reported it.
    pub fn column(&self, kind: MetricKind) -> Option<&MetricDelta> {
        self.columns.iter().find(|c| c.kind == kind)
    }
}

/// Why a benchmark name is missing from the numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Present in the target run only.
    OnlyInOld,
    /// Present in the current run only.
    OnlyInNew,
    /// Present on both sides without a shared metric kind.
    NoCommonMetrics,
    /// Self-compare: a single sample, nothing to compare against.
    SingleSample,
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ExclusionReason::OnlyInOld => "only in target run",
            ExclusionReason::OnlyInNew => "only in current run",
            ExclusionReason::NoCommonMetrics => "no metric reported by both runs",
            ExclusionReason::SingleSample => "single sample",
        };
        f.write_str(text)
    }
}

/// A benchmark left out of the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcludedBenchmark {
    /// Benchmark name.
    pub name: String,
    /// Reason it was excluded.
    pub reason: ExclusionReason,
}

/// Result of comparing two benchmark runs, or the samples of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Human-readable description of what was compared.
    pub label: String,
    /// Comparison mode.
    pub mode: ComparisonMode,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Compared rows, in order.
    pub metrics: Vec<BenchmarkMetric>,
    /// Benchmarks left out, with reasons.
    #[serde(default)]
    pub excluded: Vec<ExcludedBenchmark>,
}

impl ComparisonReport {
    /// Create a report stamped with the current time.
    pub fn new(
        label: impl Into<String>,
        mode: ComparisonMode,
        metrics: Vec<BenchmarkMetric>,
        excluded: Vec<ExcludedBenchmark>,
    ) -> Self {
        Self {
            label: label.into(),
            mode,
            generated_at: Utc::now(),
            metrics,
            excluded,
        }
    }

    /// Rows carrying `kind`.
    pub fn rows_with(&self, kind: MetricKind) -> impl Iterator<Item = (&str, &MetricDelta)> {
        self.metrics
            .iter()
            .filter_map(move |m| m.column(kind).map(|c| (m.name.as_str(), c)))
    }

    /// Metric kinds present in at least one row, in rendering order.
    pub fn kinds(&self) -> Vec<MetricKind> {
        MetricKind::ALL
            .into_iter()
            .filter(|kind| self.metrics.iter().any(|m| m.column(*kind).is_some()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, ns: f64) -> BenchmarkSample {
        BenchmarkSample {
            name: name.to_string(),
            iterations: 1000,
            values: BTreeMap::from([(MetricKind::Time, ns)]),
        }
    }

    #[test]
    fn test_delta_between() {
        assert_eq!(Delta::between(100.0, 110.0), Delta::Percent(10.0));
        assert_eq!(Delta::between(200.0, 100.0), Delta::Percent(-50.0));
        assert_eq!(Delta::between(42.0, 42.0), Delta::Percent(0.0));
    }

    #[test]
    fn test_zero_old_is_undefined() {
        assert_eq!(Delta::between(0.0, 5.0), Delta::Undefined);
        assert_eq!(Delta::between(0.0, 0.0), Delta::Undefined);
        assert_eq!(Delta::Undefined.percent(), None);
    }

    #[test]
    fn test_delta_display() {
        assert_eq!(Delta::Percent(-10.5).to_string(), "-10.50%");
        assert_eq!(Delta::Percent(0.0).to_string(), "+0.00%");
        assert_eq!(Delta::Undefined.to_string(), "n/a");
    }

    #[test]
    fn test_set_preserves_first_appearance_order() {
        let set: BenchmarkSet = vec![
            sample("BenchmarkB-8", 1.0),
            sample("BenchmarkA-8", 2.0),
            sample("BenchmarkB-8", 3.0),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.names(), &["BenchmarkB-8", "BenchmarkA-8"]);
        assert_eq!(set.get("BenchmarkB-8").unwrap().len(), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_unit_mapping() {
        for kind in MetricKind::ALL {
            assert_eq!(MetricKind::from_unit(kind.unit()), Some(kind));
        }
        assert_eq!(MetricKind::from_unit("ops/s"), None);
    }

    #[test]
    fn test_report_kinds_in_render_order() {
        let report = ComparisonReport::new(
            "main",
            ComparisonMode::CrossRevision,
            vec![BenchmarkMetric {
                name: "BenchmarkA-8".to_string(),
                columns: vec![
                    MetricDelta::new(MetricKind::Bytes, 10.0, 12.0),
                    MetricDelta::new(MetricKind::Time, 10.0, 12.0),
                ],
            }],
            Vec::new(),
        );
        assert_eq!(report.kinds(), vec![MetricKind::Time, MetricKind::Bytes]);
        assert_eq!(report.rows_with(MetricKind::Bytes).count(), 1);
        assert_eq!(report.rows_with(MetricKind::Allocs).count(), 0);
    }
}
