//! Histograms and frequency tables.

use std::collections::HashMap;

use crate::domain::Table;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// `bins + 1` ascending edges.
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

/// Equal-width histogram over the observed range.
///
/// The last bin is closed on the right. A constant sample is spread over
/// `[v - 0.5, v + 0.5]`. Returns `None` for an empty sample or zero bins.
pub fn histogram(values: &[f64], bins: usize) -> Option<Histogram> {
    if bins == 0 {
        return None;
    }
    let lo = values.iter().copied().reduce(f64::min)?;
    let hi = values.iter().copied().reduce(f64::max)?;
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Some(Histogram { edges, counts })
}

/// Occurrences of each value of a column, most frequent first.
///
/// Ties keep the order in which values first appear. Missing cells are skipped.
pub fn value_counts(table: &Table, column: &str) -> Result<Vec<(String, usize)>, AppError> {
    let cells = table
        .column(column)
        .ok_or_else(|| AppError::input(format!("Missing column: `{column}`")))?;

    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for cell in cells {
        let Some(k) = cell.key() else { continue };
        let n = counts.entry(k.clone()).or_insert(0);
        if *n == 0 {
            order.push(k);
        }
        *n += 1;
    }

    let mut out: Vec<(String, usize)> = order
        .into_iter()
        .map(|k| {
            let n = counts.get(&k).copied().unwrap_or(0);
            (k, n)
        })
        .collect();
    // Stable sort keeps first-appearance order among equal counts.
    out.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(out)
}
