//! Pearson correlation over pairwise-complete observations.

use nalgebra::DMatrix;

use crate::domain::{Table, Value};

/// Pearson's r between two columns, using only rows where both are present.
///
/// Returns `None` with fewer than two complete pairs or when either side has
/// zero variance.
pub fn pearson(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n as f64;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for &(a, b) in &pairs {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx * syy).sqrt();
    Some(r.clamp(-1.0, 1.0))
}

/// Correlation matrix of the numeric columns of a table.
///
/// Undefined coefficients are stored as `NaN`.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: DMatrix<f64>,
}

impl CorrelationMatrix {
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        let v = self.values[(i, j)];
        v.is_finite().then_some(v)
    }

    /// As a table: a `column` label followed by one column per variable.
    pub fn to_table(&self) -> Table {
        let mut header = vec!["column".to_string()];
        header.extend(self.names.iter().cloned());
        let mut out = Table::new(header);
        for (i, name) in self.names.iter().enumerate() {
            let mut row = vec![Value::Text(name.clone())];
            row.extend((0..self.names.len()).map(|j| Value::from_opt(self.get(i, j))));
            out.push_row(row);
        }
        out
    }
}

pub fn correlation_matrix(table: &Table) -> CorrelationMatrix {
    let names = table.numeric_columns();
    let cols: Vec<Vec<Option<f64>>> = names
        .iter()
        .map(|n| table.numeric_column(n).unwrap_or_default())
        .collect();

    let k = names.len();
    let mut values = DMatrix::from_element(k, k, f64::NAN);
    for i in 0..k {
        for j in i..k {
            let r = pearson(&cols[i], &cols[j]).unwrap_or(f64::NAN);
            values[(i, j)] = r;
            values[(j, i)] = r;
        }
    }

    CorrelationMatrix { names, values }
}
