// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Writing comparison reports.

use crate::result::ComparisonReport;
use std::fs;
use std::io;
use std::path::Path;

/// Write a report as pretty-printed JSON, creating parent directories.
pub fn write_report_json(report: &ComparisonReport, path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_benchmarks;
    use crate::parser::parse_benchmarks;
    use crate::result::{Delta, MetricKind};

    #[test]
    fn test_report_written_to_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/report.json");
        let old = parse_benchmarks("BenchmarkA-8  10  0 ns/op\n");
        let new = parse_benchmarks("BenchmarkA-8  10  3 ns/op\n");
        let report = compare_benchmarks(&old, &new, "main").unwrap();

        write_report_json(&report, &path).unwrap();
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"mode\": \"cross_revision\""));
        assert!(raw.contains("\"undefined\""));

        let back: ComparisonReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(back.label, "main");
        assert_eq!(
            back.metrics[0].column(MetricKind::Time).unwrap().delta,
            Delta::Undefined
        );
    }

    #[test]
    fn test_unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let old = parse_benchmarks("BenchmarkA-8  10  1 ns/op\n");
        let report = compare_benchmarks(&old, &old, "main").unwrap();
        assert!(write_report_json(&report, blocker.join("report.json")).is_err());
    }
}
