//! Structural checks run before any analysis: shape, column kinds,
//! missing cells and duplicated rows.

use std::collections::HashSet;

use crate::domain::{ColumnKind, Table};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnProfile {
    pub name: String,
    pub kind: ColumnKind,
    pub missing: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    pub name: String,
    pub rows: usize,
    pub columns: Vec<ColumnProfile>,
    pub missing: usize,
    /// Rows identical to an earlier row.
    pub duplicates: usize,
}

pub fn inspect(name: &str, table: &Table) -> StructureReport {
    let columns: Vec<ColumnProfile> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(i, col)| ColumnProfile {
            name: col.clone(),
            kind: table.column_kind(i),
            missing: table.rows().iter().filter(|r| r[i].is_missing()).count(),
        })
        .collect();

    let missing = columns.iter().map(|c| c.missing).sum();

    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut duplicates = 0;
    for row in table.rows() {
        // Missing is tagged so it never equals an empty text cell.
        let key: Vec<String> = row
            .iter()
            .map(|v| match v {
                crate::domain::Value::Missing => "\u{0}".to_string(),
                other => other.to_string(),
            })
            .collect();
        if !seen.insert(key) {
            duplicates += 1;
        }
    }

    StructureReport {
        name: name.to_string(),
        rows: table.len(),
        columns,
        missing,
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Value;

    #[test]
    fn counts_missing_and_duplicates() {
        let mut t = Table::new(vec!["region".into(), "v".into(), "note".into()]);
        t.push_row(vec![Value::Text("Sé".into()), Value::Number(1.0), Value::Missing]);
        t.push_row(vec![Value::Text("Sé".into()), Value::Number(1.0), Value::Missing]);
        t.push_row(vec![Value::Text("Lapa".into()), Value::Missing, Value::Missing]);
        t.push_row(vec![Value::Text("Sé".into()), Value::Number(1.0), Value::Missing]);

        let r = inspect("IDHM", &t);
        assert_eq!(r.rows, 4);
        assert_eq!(r.columns.len(), 3);
        assert_eq!(r.missing, 5);
        assert_eq!(r.duplicates, 2);
        assert_eq!(r.columns[0].kind, ColumnKind::Text);
        assert_eq!(r.columns[1].kind, ColumnKind::Numeric);
        assert_eq!(r.columns[2].kind, ColumnKind::Empty);
        assert_eq!(r.columns[1].missing, 1);
    }
}
