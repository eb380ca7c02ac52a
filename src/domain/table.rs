//! In-memory tabular data.
//!
//! A `Table` is an ordered list of column names plus rows of `Value`s. It is
//! deliberately small: the datasets handled here have tens to a few thousand
//! rows, and every operation (grouping, joins, projections) builds a new table
//! rather than mutating one that was already handed to a writer.

use std::collections::HashMap;
use std::fmt;

/// A single cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Missing,
}

impl Value {
    /// Build a numeric cell, mapping non-finite values to `Missing`.
    pub fn from_f64(v: f64) -> Self {
        if v.is_finite() { Value::Number(v) } else { Value::Missing }
    }

    pub fn from_opt(v: Option<f64>) -> Self {
        v.map(Value::from_f64).unwrap_or(Value::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Key used for grouping and joining: text as-is, numbers rendered.
    pub fn key(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::Number(v) => Some(v.to_string()),
            Value::Missing => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Missing => Ok(()),
        }
    }
}

/// Inferred kind of a column, based on the cells it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every non-missing cell is a number (and there is at least one).
    Numeric,
    /// At least one non-missing cell is text.
    Text,
    /// Every cell is missing.
    Empty,
}

impl ColumnKind {
    pub fn label(self) -> &'static str {
        match self {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Append a row. Short rows are padded with `Missing`, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    pub fn cell(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Value::Missing)
    }

    /// Append a column. `values` shorter than the table are padded with `Missing`.
    ///
    /// Appending a name that already exists replaces that column's values.
    pub fn add_column(&mut self, name: impl Into<String>, values: Vec<Value>) {
        let name = name.into();
        let mut values = values.into_iter();
        match self.column_index(&name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = values.next().unwrap_or(Value::Missing);
                }
            }
            None => {
                self.index.insert(name.clone(), self.columns.len());
                self.columns.push(name);
                for row in &mut self.rows {
                    row.push(values.next().unwrap_or(Value::Missing));
                }
            }
        }
    }

    /// Cells of a column, or `None` if the column does not exist.
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Numeric view of a column: non-number cells read as `None`.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r[idx].as_f64()).collect())
    }

    /// Force the named columns to numbers: parseable text becomes `Number`,
    /// anything else becomes `Missing`. Unknown names are ignored.
    pub fn coerce_numeric(&mut self, names: &[String]) {
        let indices: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        for row in &mut self.rows {
            for &idx in &indices {
                let coerced = match &row[idx] {
                    Value::Number(v) => Value::Number(*v),
                    Value::Text(s) => parse_number(s).map(Value::Number).unwrap_or(Value::Missing),
                    Value::Missing => Value::Missing,
                };
                row[idx] = coerced;
            }
        }
    }

    pub fn column_kind(&self, idx: usize) -> ColumnKind {
        let mut saw_number = false;
        for row in &self.rows {
            match &row[idx] {
                Value::Text(_) => return ColumnKind::Text,
                Value::Number(_) => saw_number = true,
                Value::Missing => {}
            }
        }
        if saw_number { ColumnKind::Numeric } else { ColumnKind::Empty }
    }

    /// Names of the numeric columns, in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        (0..self.columns.len())
            .filter(|&i| self.column_kind(i) == ColumnKind::Numeric)
            .map(|i| self.columns[i].clone())
            .collect()
    }

    /// Keep only the named columns (in the given order).
    pub fn select(&self, names: &[String]) -> Result<Table, String> {
        let mut indices = Vec::with_capacity(names.len());
        for name in names {
            let idx = self
                .column_index(name)
                .ok_or_else(|| format!("Missing column: `{name}`"))?;
            indices.push(idx);
        }
        let mut out = Table::new(names.to_vec());
        for row in &self.rows {
            out.push_row(indices.iter().map(|&i| row[i].clone()).collect());
        }
        Ok(out)
    }
}

/// Parse a numeric cell. Non-finite results (`NaN`, `inf`) count as missing.
pub fn parse_number(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
