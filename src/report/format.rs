//! Plain-text rendering of `PipelineSummary` and `MergeReport`.

use crate::data::merge::MergeReport;
use crate::report::PipelineSummary;

const WIDE_RULE: usize = 80;
const NARROW_RULE: usize = 60;

/// Format the full run summary printed at the end of a pipeline run.
pub fn format_summary(summary: &PipelineSummary) -> String {
    let mut out = String::new();
    let rule = "=".repeat(WIDE_RULE);

    out.push_str(&format!("\n{rule}\nSTALLION BEVERAGES - DATA LOADER SUMMARY\n{rule}\n"));

    out.push_str("\nUnified table:\n");
    out.push_str(&format!("  Rows: {}\n", group_thousands(summary.unified_rows)));
    out.push_str(&format!("  Columns: {}\n", summary.unified_columns));

    out.push_str("\nIndividual datasets:\n");
    for shape in &summary.datasets {
        out.push_str(&format!(
            "  {:30} {:>8} rows x {:>3} cols\n",
            shape.dataset.as_str(),
            group_thousands(shape.rows),
            shape.columns
        ));
    }

    out.push_str("\nData characteristics:\n");
    out.push_str(&format!("  Unique agencies: {}\n", summary.unique_agencies));
    out.push_str(&format!("  Unique SKUs: {}\n", summary.unique_skus));
    match (&summary.year_month_min, &summary.year_month_max) {
        (Some(min), Some(max)) => out.push_str(&format!("  Date range: {min} to {max}\n")),
        _ => out.push_str("  Date range: n/a\n"),
    }
    out.push_str(&format!("  Total months: {}\n", summary.distinct_months));

    if summary.missing.is_empty() {
        out.push_str("\nMissing values: none\n");
    } else {
        out.push_str("\nMissing values:\n");
        for m in &summary.missing {
            out.push_str(&format!(
                "  {:30} {:>8} ({:>5.1}%)\n",
                m.column,
                group_thousands(m.missing),
                m.percent
            ));
        }
    }

    out.push('\n');
    out.push_str(&format_merge_report(&summary.merge));
    out
}

pub fn format_merge_report(report: &MergeReport) -> String {
    let mut out = String::new();
    let rule = "=".repeat(NARROW_RULE);

    out.push_str(&format!("{rule}\nDATA MERGE REPORT\n{rule}\n"));
    out.push_str(&format!("Initial rows: {}\n", report.initial_rows));
    out.push_str(&format!("Final rows: {}\n", report.final_rows));
    out.push_str(&format!("Final columns: {}\n", report.final_columns));
    out.push_str("\nMissing data summary:\n");
    for join in &report.joins {
        out.push_str(&format!("  - {}: {} records\n", join.label, join.missing));
    }
    out.push_str(&format!("{rule}\n"));
    out
}

/// `1234567` → `1,234,567`.
fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
