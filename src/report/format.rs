//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the statistics code stays free of presentation concerns
//! - output changes are localized (and easy to snapshot in tests)
//!
//! Undefined numbers are printed as `-`.

use crate::domain::Table;
use crate::math::LineFit;
use crate::projection::{IndicatorSummary, ProjectionPlan};
use crate::stats::{ColumnSummary, CorrelationMatrix, StructureReport};

/// Header + per-indicator counts of a projection run.
pub fn format_projection_summary(plan: &ProjectionPlan, rows: usize, summaries: &[IndicatorSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "=== Projection {} -> {} -> {} ({rows} rows) ===\n",
        plan.base_year, plan.last_year, plan.target_year
    ));
    out.push_str(&format!(
        "{:<16} {:>8} {:>10} {:>12} {:>12}\n",
        "indicator", "rows", "missing", "no linear", "no exp"
    ));
    out.push_str(&format!("{:-<16} {:-<8} {:-<10} {:-<12} {:-<12}\n", "", "", "", "", ""));
    for s in summaries {
        out.push_str(&format!(
            "{:<16} {:>8} {:>10} {:>12} {:>12}\n",
            truncate(&s.indicator, 16),
            s.rows,
            s.missing_input,
            s.undefined_linear,
            s.undefined_exponential
        ));
    }
    out
}

/// First `max_rows` rows of the selected `columns` (all when empty).
pub fn format_table_preview(table: &Table, columns: &[String], max_rows: usize) -> String {
    let indices: Vec<usize> = if columns.is_empty() {
        (0..table.width()).collect()
    } else {
        columns.iter().filter_map(|c| table.column_index(c)).collect()
    };

    let cells: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(max_rows)
        .map(|row| {
            indices
                .iter()
                .map(|&i| match row[i].as_f64() {
                    Some(v) => format!("{v:.4}"),
                    None if row[i].is_missing() => "-".to_string(),
                    None => truncate(&row[i].to_string(), 28),
                })
                .collect()
        })
        .collect();

    let headers: Vec<String> = indices.iter().map(|&i| truncate(&table.columns()[i], 28)).collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(j, h)| {
            cells
                .iter()
                .map(|r| r[j].chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_row(&mut out, &headers, &widths);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    if table.len() > max_rows {
        out.push_str(&format!("... ({} more rows)\n", table.len() - max_rows));
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect();
    out.push_str(line.join("  ").trim_end());
    out.push('\n');
}

/// Shape, column kinds, missing cells and duplicates of one dataset.
pub fn format_structure(report: &StructureReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", report.name));
    out.push_str(&format!(
        "Shape: {} rows x {} columns\n",
        report.rows,
        report.columns.len()
    ));
    out.push_str(&format!("Missing cells: {}\n", report.missing));
    out.push_str(&format!("Duplicate rows: {}\n", report.duplicates));
    out.push('\n');

    out.push_str(&format!("{:<32} {:<8} {:>8}\n", "column", "kind", "missing"));
    out.push_str(&format!("{:-<32} {:-<8} {:-<8}\n", "", "", ""));
    for c in &report.columns {
        out.push_str(&format!(
            "{:<32} {:<8} {:>8}\n",
            truncate(&c.name, 32),
            c.kind.label(),
            c.missing
        ));
    }
    out
}

/// The describe table: one line per numeric column.
pub fn format_describe(summaries: &[ColumnSummary]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<28} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}\n",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    ));
    out.push_str(&format!(
        "{:-<28} {:-<6} {:-<8} {:-<8} {:-<8} {:-<8} {:-<8} {:-<8} {:-<8}\n",
        "", "", "", "", "", "", "", "", ""
    ));
    for s in summaries {
        out.push_str(&format!(
            "{:<28} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}\n",
            truncate(&s.name, 28),
            s.count,
            fmt_opt(s.mean, 3),
            fmt_opt(s.std, 3),
            fmt_opt(s.min, 3),
            fmt_opt(s.q25, 3),
            fmt_opt(s.median, 3),
            fmt_opt(s.q75, 3),
            fmt_opt(s.max, 3),
        ));
    }
    out
}

/// Square correlation matrix with truncated labels.
pub fn format_correlation(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:<20}", ""));
    for name in &matrix.names {
        out.push_str(&format!(" {:>12}", truncate(name, 12)));
    }
    out.push('\n');
    for (i, name) in matrix.names.iter().enumerate() {
        out.push_str(&format!("{:<20}", truncate(name, 20)));
        for j in 0..matrix.names.len() {
            out.push_str(&format!(" {:>12}", fmt_opt(matrix.get(i, j), 3)));
        }
        out.push('\n');
    }
    out
}

pub fn format_line_fit(x: &str, y: &str, fit: &LineFit) -> String {
    format!(
        "Trend {y} ~ {x}: y = {:.4} + {:.4}x | R² = {:.3} | n = {}\n",
        fit.intercept, fit.slope, fit.r_squared, fit.n
    )
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => format!("{v:.decimals$}"),
        None => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;
    use crate::stats::{correlation_matrix, inspect, summarize};

    #[test]
    fn truncate_marks_cut_labels() {
        assert_eq!(truncate("Sé", 5), "Sé");
        assert_eq!(truncate("Capela do Socorro", 8), "Capela .");
        assert_eq!(truncate("Capela do Socorro", 8).chars().count(), 8);
    }

    #[test]
    fn preview_prints_missing_as_dash_and_counts_hidden_rows() {
        let mut t = Table::new(vec!["region".into(), "IDHM_2000".into()]);
        t.push_row(vec![Value::Text("Lapa".into()), Value::Number(0.8)]);
        t.push_row(vec![Value::Text("Sé".into()), Value::Missing]);
        t.push_row(vec![Value::Text("Mooca".into()), Value::Number(0.75)]);

        let txt = format_table_preview(&t, &[], 2);
        let expected = concat!(
            "region  IDHM_2000\n",
            "------  ---------\n",
            "Lapa    0.8000\n",
            "Sé      -\n",
            "... (1 more rows)\n",
        );
        assert_eq!(txt, expected);

        let only = format_table_preview(&t, &["IDHM_2000".to_string()], 5);
        assert!(only.starts_with("IDHM_2000\n"));
        assert!(!only.contains("Lapa"));
    }

    #[test]
    fn describe_and_structure_render_every_column() {
        let s = summarize("IDEB_2005_finais", &[Some(3.0), None, Some(5.0)]);
        let txt = format_describe(&[s]);
        assert!(txt.contains("IDEB_2005_finais"));
        assert!(txt.contains("4.000"));
        assert_eq!(txt.lines().count(), 3);

        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(vec![Value::Number(1.0), Value::Missing]);
        let report = format_structure(&inspect("demo", &t));
        assert!(report.starts_with("=== demo ===\nShape: 1 rows x 2 columns\n"));
        assert!(report.contains("Missing cells: 1"));
    }

    #[test]
    fn correlation_shows_undefined_cells() {
        let mut t = Table::new(vec!["a".into(), "b".into()]);
        t.push_row(vec![Value::Number(1.0), Value::Number(2.0)]);
        t.push_row(vec![Value::Number(2.0), Value::Number(2.0)]);
        let txt = format_correlation(&correlation_matrix(&t));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_end().ends_with('-'));
    }
}
