//! Position and dispersion measures over columns with missing values.
//!
//! All functions skip missing values and return `None` when nothing is left
//! to measure. Conventions:
//! - quantiles interpolate linearly between order statistics (`q * (n - 1)`)
//! - the standard deviation is the sample one (`n - 1` denominator)
//! - the mode is the most frequent value; ties go to the smallest value

use std::cmp::Ordering;

use crate::domain::Table;

pub fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().filter(|v| v.is_finite()).collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (n as f64 - 1.0)).sqrt())
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    v
}

/// Quantile `q ∈ [0, 1]` with linear interpolation.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let v = sorted(values);
    Some(quantile_sorted(&v, q))
}

fn quantile_sorted(v: &[f64], q: f64) -> f64 {
    let pos = q * (v.len() as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    v[lo] + (v[hi] - v[lo]) * (pos - lo as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

pub fn mode(values: &[f64]) -> Option<f64> {
    let v = sorted(values);
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < v.len() {
        let mut j = i + 1;
        while j < v.len() && v[j] == v[i] {
            j += 1;
        }
        let run = j - i;
        // Strictly greater keeps the smallest value among ties.
        if best.is_none_or(|(_, n)| run > n) {
            best = Some((v[i], run));
        }
        i = j;
    }
    best.map(|(value, _)| value)
}

/// Summary of one numeric column (the usual "describe" table).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

pub fn summarize(name: &str, values: &[Option<f64>]) -> ColumnSummary {
    let v = present(values);
    ColumnSummary {
        name: name.to_string(),
        count: v.len(),
        mean: mean(&v),
        std: std_dev(&v),
        min: min(&v),
        q25: quantile(&v, 0.25),
        median: quantile(&v, 0.5),
        q75: quantile(&v, 0.75),
        max: max(&v),
    }
}

/// Summaries for every numeric column of `table`.
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .numeric_columns()
        .iter()
        .filter_map(|name| table.numeric_column(name).map(|col| summarize(name, &col)))
        .collect()
}

/// Spread of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispersion {
    pub name: String,
    /// `max - min`
    pub range: Option<f64>,
    /// Coefficient of variation in percent: `std / mean * 100`.
    pub cv_percent: Option<f64>,
}

pub fn dispersion(table: &Table) -> Vec<Dispersion> {
    describe(table)
        .into_iter()
        .map(|s| Dispersion {
            range: s.max.zip(s.min).map(|(hi, lo)| hi - lo),
            cv_percent: s
                .std
                .zip(s.mean)
                .map(|(sd, m)| sd / m * 100.0)
                .filter(|v| v.is_finite()),
            name: s.name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;

    fn close(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert!(close(quantile(&v, 0.25), 1.75));
        assert!(close(quantile(&v, 0.5), 2.5));
        assert!(close(quantile(&v, 0.75), 3.25));
        assert!(close(quantile(&v, 0.1), 1.3));
        assert!(close(quantile(&v, 0.9), 3.7));
        assert!(close(quantile(&[5.0], 0.9), 5.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn mode_prefers_smallest_among_ties() {
        assert_eq!(mode(&[3.0, 1.0, 3.0, 1.0, 2.0]), Some(1.0));
        assert_eq!(mode(&[4.5, 4.7, 4.7]), Some(4.7));
        assert_eq!(mode(&[]), None);
    }

    #[test]
    fn sample_standard_deviation() {
        assert!(close(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), (32.0_f64 / 7.0).sqrt()));
        assert_eq!(std_dev(&[1.0]), None);
    }

    #[test]
    fn summarize_skips_missing() {
        let s = summarize("x", &[Some(1.0), None, Some(3.0)]);
        assert_eq!(s.count, 2);
        assert!(close(s.mean, 2.0));
        assert!(close(s.median, 2.0));
        assert!(close(s.min, 1.0));
        assert!(close(s.max, 3.0));
    }

    #[test]
    fn dispersion_of_numeric_columns_only() {
        let mut t = Table::new(vec!["r".into(), "x".into()]);
        t.push_row(vec![Value::Text("a".into()), Value::Number(2.0)]);
        t.push_row(vec![Value::Text("b".into()), Value::Number(4.0)]);
        let d = dispersion(&t);
        assert_eq!(d.len(), 1);
        assert!(close(d[0].range, 2.0));
        // std = sqrt(2), mean = 3
        assert!(close(d[0].cv_percent, 2.0_f64.sqrt() / 3.0 * 100.0));
    }

    #[test]
    fn zero_mean_has_no_coefficient_of_variation() {
        let mut t = Table::new(vec!["x".into()]);
        t.push_row(vec![Value::Number(-1.0)]);
        t.push_row(vec![Value::Number(1.0)]);
        assert_eq!(dispersion(&t)[0].cv_percent, None);
    }
}
