// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Plain-text comparison tables.
//!
//! One aligned section per metric kind present in the report:
//!
//! ```text
//! benchmark         old ns/op     new ns/op     delta
//! BenchmarkA-8      100           110           +10.00%
//! ```

use crate::result::{ComparisonReport, MetricKind};

const COLUMN_PADDING: usize = 5;

/// Render the numeric part of a report as aligned plain-text sections.
pub fn render_plain(report: &ComparisonReport) -> String {
    report
        .kinds()
        .into_iter()
        .map(|kind| render_section(report, kind))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the exclusion notes, one line per excluded benchmark.
///
/// Returns an empty string when nothing was excluded.
pub fn render_exclusions(report: &ComparisonReport) -> String {
    report
        .excluded
        .iter()
        .map(|e| format!("excluded {}: {}\n", e.name, e.reason))
        .collect()
}

/// Format a metric value the way the Go benchmark tooling does.
pub fn format_value(kind: MetricKind, value: f64) -> String {
    match kind {
        MetricKind::Time => {
            let precision = if value < 10.0 {
                2
            } else if value < 100.0 {
                1
            } else {
                0
            };
            format!("{:.*}", precision, value)
        }
        MetricKind::Throughput => format!("{:.2}", value),
        MetricKind::Allocs | MetricKind::Bytes => format!("{:.0}", value),
    }
}

fn render_section(report: &ComparisonReport, kind: MetricKind) -> String {
    let unit = kind.header_unit();
    let mut rows = vec![[
        "benchmark".to_string(),
        format!("old {}", unit),
        format!("new {}", unit),
        "delta".to_string(),
    ]];
    rows.extend(report.rows_with(kind).map(|(name, column)| {
        [
            name.to_string(),
            format_value(kind, column.old),
            format_value(kind, column.new),
            column.delta.to_string(),
        ]
    }));
    align(&rows)
}

fn align(rows: &[[String; 4]]) -> String {
    let mut widths = [0usize; 4];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in rows {
        let last = row.len() - 1;
        for (i, cell) in row.iter().enumerate() {
            out.push_str(cell);
            if i < last {
                let pad = widths[i] - cell.chars().count() + COLUMN_PADDING;
                out.extend(std::iter::repeat(' ').take(pad));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_benchmarks;
    use crate::parser::parse_benchmarks;

    fn report() -> ComparisonReport {
        let old = parse_benchmarks(
            "BenchmarkA-8  10  100 ns/op  2 allocs/op\nBenchmarkLonger-8  10  5 ns/op\n",
        );
        let new = parse_benchmarks(
            "BenchmarkA-8  10  110 ns/op  1 allocs/op\nBenchmarkLonger-8  10  5 ns/op\nBenchmarkNew-8  10  1 ns/op\n",
        );
        compare_benchmarks(&old, &new, "main").unwrap()
    }

    #[test]
    fn test_sections_in_kind_order() {
        let plain = render_plain(&report());
        let time = plain.find("old ns/op").unwrap();
        let allocs = plain.find("old allocs").unwrap();
        assert!(time < allocs);
        assert!(!plain.contains("MB/s"));
        assert!(!plain.contains("bytes"));
    }

    #[test]
    fn test_rows_are_aligned() {
        let plain = render_plain(&report());
        let lines: Vec<&str> = plain.lines().take(3).collect();
        assert!(lines[0].starts_with("benchmark"));
        let col = lines[0].find("old ns/op").unwrap();
        assert_eq!(&lines[1][col..col + 3], "100");
        assert_eq!(&lines[2][col..col + 4], "5.00");
        assert!(lines[1].ends_with("+10.00%"));
        assert!(lines[2].ends_with("+0.00%"));
    }

    #[test]
    fn test_format_value_precision() {
        assert_eq!(format_value(MetricKind::Time, 5.0), "5.00");
        assert_eq!(format_value(MetricKind::Time, 42.34), "42.3");
        assert_eq!(format_value(MetricKind::Time, 1234.6), "1235");
        assert_eq!(format_value(MetricKind::Throughput, 12.5), "12.50");
        assert_eq!(format_value(MetricKind::Bytes, 488.0), "488");
    }

    #[test]
    fn test_exclusion_notes() {
        let notes = render_exclusions(&report());
        assert_eq!(notes, "excluded BenchmarkNew-8: only in current run\n");
    }
}
