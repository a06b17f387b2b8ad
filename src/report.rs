//! Console rendering of profiles and comparison outcomes.
//!
//! Text output is a set of aligned tables; JSON output serialises the same
//! data with `serde_json` for downstream tooling.

use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::{profile::FileProfile, scheduler::ComparisonOutcome};

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
}

fn render_table(headers: &[&str], rows: &[Vec<String>], align: &[Align]) -> String {
    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    let header_cells = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    push_line(&mut output, &header_cells, &widths, align);
    let rule = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    push_line(&mut output, &rule, &widths, align);
    for row in rows {
        push_line(&mut output, row, &widths, align);
    }
    output
}

fn push_line(output: &mut String, cells: &[String], widths: &[usize], align: &[Align]) {
    let mut line = String::new();
    for (idx, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if idx > 0 {
            line.push_str("  ");
        }
        let cell = cell.replace(['\n', '\r', '\t'], " ");
        match align.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => {
                let _ = write!(line, "{cell:<width$}");
            }
            Align::Right => {
                let _ = write!(line, "{cell:>width$}");
            }
        }
    }
    output.push_str(line.trim_end());
    output.push('\n');
}

pub fn render_types(profile: &FileProfile) -> String {
    let rows = profile
        .columns
        .iter()
        .map(|column| {
            vec![
                column.name.clone(),
                column.label.to_string(),
                column.non_empty.to_string(),
                column
                    .distinct_values()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect::<Vec<_>>();
    let mut output = format!("Column types for {} ({} rows)\n", profile.source, profile.rows_read);
    output.push_str(&render_table(
        &["column", "type", "non-empty", "distinct"],
        &rows,
        &[Align::Left, Align::Left, Align::Right, Align::Right],
    ));
    output
}

pub fn render_matches(outcome: &ComparisonOutcome) -> String {
    if outcome.matches.is_empty() {
        return format!(
            "No similar columns between {} and {} (threshold {:.2}, {} pair(s) evaluated)\n",
            outcome.left_source, outcome.right_source, outcome.threshold, outcome.evaluated
        );
    }
    let rows = outcome
        .matches
        .iter()
        .map(|m| {
            vec![
                m.pair.left.clone(),
                m.pair.right.clone(),
                m.pair.label.to_string(),
                format!("{:.2}", m.score),
            ]
        })
        .collect::<Vec<_>>();
    let mut output = format!(
        "Similar columns between {} and {} (threshold {:.2})\n",
        outcome.left_source, outcome.right_source, outcome.threshold
    );
    output.push_str(&render_table(
        &["left column", "right column", "type", "similarity"],
        &rows,
        &[Align::Left, Align::Left, Align::Left, Align::Right],
    ));
    output
}

pub fn render_failures(outcome: &ComparisonOutcome) -> String {
    let mut output = String::new();
    if outcome.failures.is_empty() {
        return output;
    }
    let _ = writeln!(output, "{} pair(s) could not be compared:", outcome.failures.len());
    for failure in &outcome.failures {
        let _ = writeln!(output, "  {failure}");
    }
    output
}

#[derive(Debug, Serialize)]
pub struct ComparisonReport<'a> {
    pub left: &'a FileProfile,
    pub right: &'a FileProfile,
    pub outcome: &'a ComparisonOutcome,
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Serializing report to JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        classify::{TypeClassifier, TypeLabel},
        error::PairFailure,
        pairs::CandidatePair,
        profile::{ProfileOptions, build_profile},
        rows::MemoryRowSource,
        similarity::SimilarityResult,
    };

    fn outcome() -> ComparisonOutcome {
        ComparisonOutcome {
            left_source: "a.csv".to_string(),
            right_source: "b.csv".to_string(),
            threshold: 0.5,
            evaluated: 2,
            matches: vec![SimilarityResult {
                pair: CandidatePair::new(0, "customer_id", 1, "id", TypeLabel::Integer),
                score: 2.0 / 3.0,
            }],
            failures: vec![PairFailure {
                pair: CandidatePair::new(0, "customer_id", 2, "ref", TypeLabel::Integer),
                left_file: "a.csv".to_string(),
                right_file: "b.csv".to_string(),
                message: "panicked: boom".to_string(),
            }],
        }
    }

    #[test]
    fn render_table_aligns_numeric_columns_right() {
        let rendered = render_table(
            &["name", "n"],
            &[vec!["alpha".into(), "7".into()], vec!["b".into(), "123".into()]],
            &[Align::Left, Align::Right],
        );
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "name     n");
        assert_eq!(lines[1], "-----  ---");
        assert_eq!(lines[2], "alpha    7");
        assert_eq!(lines[3], "b      123");
    }

    #[test]
    fn render_matches_formats_two_decimals() {
        let rendered = render_matches(&outcome());
        assert!(rendered.contains("customer_id"));
        assert!(rendered.contains("0.67"));
        assert!(rendered.starts_with("Similar columns between a.csv and b.csv"));
    }

    #[test]
    fn render_matches_reports_empty_outcome() {
        let mut empty = outcome();
        empty.matches.clear();
        assert!(render_matches(&empty).starts_with("No similar columns"));
    }

    #[test]
    fn render_failures_lists_each_pair() {
        let rendered = render_failures(&outcome());
        assert!(rendered.contains("1 pair(s) could not be compared"));
        assert!(rendered.contains("'customer_id' (a.csv) with 'ref' (b.csv)"));
    }

    #[test]
    fn render_types_shows_distinct_counts() {
        let mut source = MemoryRowSource::from_columns("a.csv", &[("id", vec!["1", "1", "2"])]);
        let profile = build_profile(
            &mut source,
            &TypeClassifier::default(),
            &ProfileOptions::default(),
        )
        .unwrap();
        let rendered = render_types(&profile);
        let row = rendered.lines().nth(3).expect("data row");
        assert_eq!(
            row.split_whitespace().collect::<Vec<_>>(),
            vec!["id", "Integer", "3", "2"]
        );
        assert!(rendered.starts_with("Column types for a.csv (3 rows)"));
    }

    #[test]
    fn json_report_includes_types_and_scores() {
        let mut source = MemoryRowSource::from_columns("a.csv", &[("id", vec!["1"])]);
        let profile = build_profile(
            &mut source,
            &TypeClassifier::default(),
            &ProfileOptions::default(),
        )
        .unwrap();
        let outcome = outcome();
        let json = render_json(&ComparisonReport {
            left: &profile,
            right: &profile,
            outcome: &outcome,
        })
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["left"]["columns"][0]["label"], "Integer");
        assert_eq!(value["outcome"]["matches"][0]["pair"]["right"], "id");
        assert_eq!(value["outcome"]["failures"][0]["message"], "panicked: boom");
    }
}
