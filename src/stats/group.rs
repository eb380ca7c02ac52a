//! Group rows by a key column and aggregate numeric columns per group.
//!
//! Groups are returned sorted by key. Rows whose key is missing are dropped.

use std::collections::BTreeMap;

use crate::domain::{Table, Value};
use crate::error::AppError;
use crate::stats::describe::{mean, median, mode, present, quantile};

/// Row indices per key, sorted by key.
pub fn group_rows(table: &Table, key: &str) -> Result<BTreeMap<String, Vec<usize>>, AppError> {
    let idx = table
        .column_index(key)
        .ok_or_else(|| AppError::input(format!("Missing grouping column: `{key}`")))?;

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, row) in table.rows().iter().enumerate() {
        if let Some(k) = row[idx].key() {
            groups.entry(k).or_default().push(i);
        }
    }
    Ok(groups)
}

fn group_values(table: &Table, rows: &[usize], col: usize) -> Vec<f64> {
    let cells: Vec<Option<f64>> = rows.iter().map(|&r| table.cell(r, col).as_f64()).collect();
    present(&cells)
}

fn column_indices(table: &Table, columns: &[String]) -> Result<Vec<usize>, AppError> {
    columns
        .iter()
        .map(|c| {
            table
                .column_index(c)
                .ok_or_else(|| AppError::input(format!("Missing column: `{c}`")))
        })
        .collect()
}

/// One row per group: the key, then the mean of each column.
pub fn group_means(table: &Table, key: &str, columns: &[String]) -> Result<Table, AppError> {
    let groups = group_rows(table, key)?;
    let indices = column_indices(table, columns)?;

    let mut header = vec![key.to_string()];
    header.extend(columns.iter().cloned());
    let mut out = Table::new(header);

    for (k, rows) in &groups {
        let mut row = vec![Value::Text(k.clone())];
        row.extend(
            indices
                .iter()
                .map(|&c| Value::from_opt(mean(&group_values(table, rows, c)))),
        );
        out.push_row(row);
    }
    Ok(out)
}

/// Statistics computed per group and column, in output order.
pub const GROUP_STATS: [&str; 7] = ["mean", "median", "mode", "p25", "p75", "p10", "p90"];

fn group_stat(stat: &str, values: &[f64]) -> Option<f64> {
    match stat {
        "mean" => mean(values),
        "median" => median(values),
        "mode" => mode(values),
        "p25" => quantile(values, 0.25),
        "p75" => quantile(values, 0.75),
        "p10" => quantile(values, 0.10),
        "p90" => quantile(values, 0.90),
        _ => None,
    }
}

/// One row per group with `{column}_{stat}` for every stat in `GROUP_STATS`.
pub fn group_summaries(table: &Table, key: &str, columns: &[String]) -> Result<Table, AppError> {
    let groups = group_rows(table, key)?;
    let indices = column_indices(table, columns)?;

    let mut header = vec![key.to_string()];
    for c in columns {
        header.extend(GROUP_STATS.iter().map(|s| format!("{c}_{s}")));
    }
    let mut out = Table::new(header);

    for (k, rows) in &groups {
        let mut row = vec![Value::Text(k.clone())];
        for &c in &indices {
            let values = group_values(table, rows, c);
            row.extend(GROUP_STATS.iter().map(|s| Value::from_opt(group_stat(s, &values))));
        }
        out.push_row(row);
    }
    Ok(out)
}
