use informe_core::display::DisplaySubset;
use informe_core::filter::ColumnProfile;
use informe_core::model::SourceKind;
use informe_core::quartile::{QuartileOutcome, QUARTILE_COLUMN, QUARTILE_LABELS};
use informe_core::report::{LineKind, Report};

use crate::commands::profile::ColumnSummary;

/// Distinct values listed before the profile is abbreviated.
const MAX_LISTED_VALUES: usize = 8;

pub fn print_display(display: &DisplaySubset, total_rows: usize) {
    let table = display.table();

    if let Some(text) = table.text_content() {
        println!("=== {} ({} characters) ===\n", display.source_kind(), text.chars().count());
        println!("{text}");
        return;
    }

    let shown = table.row_count();
    if shown < total_rows {
        println!(
            "=== {} ({} columns, {} rows, showing first {}) ===\n",
            display.source_kind(),
            table.column_count(),
            total_rows,
            shown
        );
    } else {
        println!(
            "=== {} ({} columns, {} rows) ===\n",
            display.source_kind(),
            table.column_count(),
            shown
        );
    }
    print!("{}", display.render());
}

pub fn print_profiles(summaries: &[ColumnSummary], kind: SourceKind, rows: usize) {
    println!("=== {} ({} rows) ===\n", kind, rows);

    let max_name = summaries.iter().map(|s| s.name.chars().count()).max().unwrap_or(10);

    for summary in summaries {
        let missing = if summary.missing > 0 {
            format!(", {} missing", summary.missing)
        } else {
            String::new()
        };
        let detail = match &summary.profile {
            ColumnProfile::Numeric { min, max } => format!("{min} .. {max}"),
            ColumnProfile::Date { min, max } => format!("{min} .. {max}"),
            ColumnProfile::Text { distinct } => {
                let listed: Vec<&str> = distinct
                    .iter()
                    .take(MAX_LISTED_VALUES)
                    .map(String::as_str)
                    .collect();
                let more = distinct.len().saturating_sub(MAX_LISTED_VALUES);
                if more > 0 {
                    format!("{} distinct: {}, ... (+{more})", distinct.len(), listed.join(", "))
                } else {
                    format!("{} distinct: {}", distinct.len(), listed.join(", "))
                }
            }
        };
        println!(
            "  {:<width$}  {:<8}{}  {}",
            summary.name,
            summary.column_type.to_string(),
            missing,
            detail,
            width = max_name
        );
    }
}

pub fn print_segments(outcome: &QuartileOutcome, column: &str) {
    println!("=== Quartiles of {column} ({} bins) ===\n", outcome.bins);

    let edges: Vec<String> = outcome.edges.iter().map(|e| e.to_string()).collect();
    println!("  Edges: {}\n", edges.join(", "));

    let labels = outcome
        .table
        .column(QUARTILE_COLUMN)
        .map(|c| c.values())
        .unwrap_or_default();
    for label in QUARTILE_LABELS {
        let count = labels.iter().filter(|v| v.to_string() == label).count();
        if count > 0 {
            println!("  {:<10}  {} row(s)", label, count);
        }
    }
}

pub fn print_report(report: &Report) {
    println!("=== Informe ===\n");
    for line in report.lines() {
        let text = line.screen_text();
        match line.kind {
            LineKind::Title => {
                println!("{}", text.trim());
                println!("{}", "=".repeat(text.trim().chars().count()));
            }
            LineKind::Subtitle(level) => {
                let underline = match level {
                    1 => '-',
                    2 => '~',
                    _ => '.',
                };
                println!();
                println!("{}", text.trim());
                println!("{}", underline.to_string().repeat(text.trim().chars().count()));
            }
            LineKind::Body => println!("{text}"),
        }
    }
}
