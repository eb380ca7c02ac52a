//! Inner join of two tables on a shared key column.

use std::collections::HashMap;

use crate::domain::Table;
use crate::error::AppError;

/// Inner join on `key`.
///
/// - output rows follow the left table's order; a key present several times
///   on either side yields every pairing
/// - output columns: all left columns, then right columns except the key
/// - non-key names present on both sides get `_x` (left) / `_y` (right) suffixes
pub fn inner_join(left: &Table, right: &Table, key: &str) -> Result<Table, AppError> {
    let lk = left
        .column_index(key)
        .ok_or_else(|| AppError::input(format!("Left table has no join column `{key}`")))?;
    let rk = right
        .column_index(key)
        .ok_or_else(|| AppError::input(format!("Right table has no join column `{key}`")))?;

    let right_cols: Vec<usize> = (0..right.width()).filter(|&i| i != rk).collect();

    let mut header: Vec<String> = left
        .columns()
        .iter()
        .map(|c| {
            if c != key && right.has_column(c) {
                format!("{c}_x")
            } else {
                c.clone()
            }
        })
        .collect();
    header.extend(right_cols.iter().map(|&i| {
        let c = &right.columns()[i];
        if left.has_column(c) { format!("{c}_y") } else { c.clone() }
    }));

    let mut index: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, row) in right.rows().iter().enumerate() {
        if let Some(k) = row[rk].key() {
            index.entry(k).or_default().push(i);
        }
    }

    let mut out = Table::new(header);
    for lrow in left.rows() {
        let Some(k) = lrow[lk].key() else { continue };
        let Some(matches) = index.get(&k) else { continue };
        for &ri in matches {
            let rrow = &right.rows()[ri];
            let mut row = lrow.clone();
            row.extend(right_cols.iter().map(|&i| rrow[i].clone()));
            out.push_row(row);
        }
    }
    Ok(out)
}
