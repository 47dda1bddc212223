// Copyright 2025 Funcbench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown output for pull request comments.
//!
//! [`to_markdown`] turns the plain-text table produced by
//! [`render_plain`](crate::render::render_plain) into GitHub-flavored markdown
//! line by line: header lines become a table header plus separator, other
//! lines have whitespace runs replaced with `|`.
//!
//! A header is any line carrying `old <unit>` whose first token is not a
//! benchmark name; the unit is taken from the line itself.

use crate::render::{render_exclusions, render_plain};
use crate::result::ComparisonReport;
use funcbench_core::ComparisonMode;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

static HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\s)old\s+(\S+)")
        .unwrap_or_else(|e| panic!("invalid header pattern: {}", e))
});

const BENCHMARK_PREFIX: &str = "Benchmark";

fn header_unit(line: &str) -> Option<&str> {
    let first = line.split_whitespace().next()?;
    if first.starts_with(BENCHMARK_PREFIX) {
        return None;
    }
    HEADER
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|unit| unit.as_str())
}

/// Convert plain comparison output to markdown.
///
/// Blank lines are kept as they are.
pub fn to_markdown(plain: &str) -> String {
    plain
        .split('\n')
        .map(|line| {
            if let Some(unit) = header_unit(line) {
                format!("| Benchmark | Old {unit} | New {unit} | Delta |\n|-|-|-|-|")
            } else if line.trim().is_empty() {
                line.to_string()
            } else {
                line.split_whitespace().collect::<Vec<_>>().join("|")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Markdown comment body for a completed comparison.
pub fn generate_comment(report: &ComparisonReport) -> String {
    let mut output = String::new();

    let heading = match report.mode {
        ComparisonMode::SelfCompare => "Sub-benchmark comparison".to_string(),
        ComparisonMode::CrossRevision => format!("Comparison against `{}`", report.label),
    };
    let _ = writeln!(output, "### {}", heading);
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", to_markdown(&render_plain(report)).trim_end());

    let notes = render_exclusions(report);
    if !notes.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "<details><summary>Excluded benchmarks</summary>");
        let _ = writeln!(output);
        for line in notes.lines() {
            let _ = writeln!(output, "- {}", line);
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "</details>");
    }

    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Generated: {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::{compare_benchmarks, compare_sub_benchmarks};
    use crate::parser::parse_benchmarks;

    #[test]
    fn test_header_line_becomes_table_header() {
        let md = to_markdown("benchmark     old ns/op     new ns/op     delta");
        assert_eq!(md, "| Benchmark | Old ns/op | New ns/op | Delta |\n|-|-|-|-|");
    }

    #[test]
    fn test_data_lines_are_collapsed() {
        let plain = "\
benchmark      old ns/op     new ns/op     delta
BenchmarkX-8   12.3          11.0          -10.57%

benchmark      old allocs     new allocs     delta
BenchmarkX-8   3              2              -33.33%
";
        let md = to_markdown(plain);
        let lines: Vec<&str> = md.split('\n').collect();
        assert_eq!(lines[0], "| Benchmark | Old ns/op | New ns/op | Delta |");
        assert_eq!(lines[1], "|-|-|-|-|");
        assert_eq!(lines[2], "BenchmarkX-8|12.3|11.0|-10.57%");
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "| Benchmark | Old allocs | New allocs | Delta |");
        assert_eq!(lines[6], "BenchmarkX-8|3|2|-33.33%");
        assert!(md.ends_with('\n'));
    }

    #[test]
    fn test_header_detected_by_old_unit() {
        let md = to_markdown("name   old ns/op   new ns/op   delta\nBenchmarkQ-8  5  4  -20.00%");
        let lines: Vec<&str> = md.split('\n').collect();
        assert_eq!(lines[0], "| Benchmark | Old ns/op | New ns/op | Delta |");
        assert_eq!(lines[1], "|-|-|-|-|");
        assert_eq!(lines[2], "BenchmarkQ-8|5|4|-20.00%");

        let md = to_markdown("  old MB/s  new MB/s  speedup");
        assert_eq!(md, "| Benchmark | Old MB/s | New MB/s | Delta |\n|-|-|-|-|");
    }

    #[test]
    fn test_data_line_with_inline_units() {
        let plain = "\
benchmark   old ns/op   new ns/op   delta
BenchmarkX-8  1000  12.3 old ns/op  11.0 new ns/op  -10.5%";
        let md = to_markdown(plain);
        let lines: Vec<&str> = md.split('\n').collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "| Benchmark | Old ns/op | New ns/op | Delta |");
        assert_eq!(lines[1], "|-|-|-|-|");
        assert_eq!(
            lines[2],
            "BenchmarkX-8|1000|12.3|old|ns/op|11.0|new|ns/op|-10.5%"
        );
    }

    #[test]
    fn test_old_inside_a_word_is_not_a_header() {
        assert_eq!(to_markdown("threshold ns/op 5"), "threshold|ns/op|5");
    }

    #[test]
    fn test_benchmark_name_line_is_not_a_header() {
        let md = to_markdown("BenchmarkOld-8   old ns/op   x   y");
        assert_eq!(md, "BenchmarkOld-8|old|ns/op|x|y");
    }

    #[test]
    fn test_comment_for_cross_revision() {
        let old = parse_benchmarks("BenchmarkA-8  10  100 ns/op\nBenchmarkGone-8  10  1 ns/op\n");
        let new = parse_benchmarks("BenchmarkA-8  10  90 ns/op\n");
        let report = compare_benchmarks(&old, &new, "main").unwrap();
        let comment = generate_comment(&report);
        assert!(comment.starts_with("### Comparison against `main`"));
        assert!(comment.contains("| Benchmark | Old ns/op | New ns/op | Delta |"));
        assert!(comment.contains("BenchmarkA-8|100|90.0|-10.00%"));
        assert!(comment.contains("- excluded BenchmarkGone-8: only in target run"));
        assert!(comment.contains("Generated: "));
    }

    #[test]
    fn test_comment_for_self_compare() {
        let set = parse_benchmarks("BenchmarkA-8  10  100 ns/op\nBenchmarkA-8  10  100 ns/op\n");
        let report = compare_sub_benchmarks(&set, "self").unwrap();
        let comment = generate_comment(&report);
        assert!(comment.starts_with("### Sub-benchmark comparison"));
        assert!(comment.contains("BenchmarkA-8#2|100|100|+0.00%"));
        assert!(!comment.contains("Excluded benchmarks"));
    }
}
