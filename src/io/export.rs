//! Export tables to CSV.
//!
//! Exports are meant to be easy to consume in spreadsheets or downstream scripts:
//! comma-separated, one header row, missing cells left empty.
//!
//! Every file is written to a temporary sibling first and renamed into place,
//! so a failed run never leaves a truncated export behind.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::Table;
use crate::error::AppError;

/// Create the output directory (and parents) if needed.
pub fn ensure_dir(dir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::output(format!("Failed to create output directory '{}': {e}", dir.display())))
}

/// Write a table, as a workbook when `path` ends in `.xlsx` and as CSV otherwise.
pub fn write_table(path: &Path, table: &Table) -> Result<(), AppError> {
    let xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
    if xlsx {
        crate::io::workbook::write_table_xlsx(path, table)
    } else {
        write_table_csv(path, table)
    }
}

/// Write a table to a CSV file.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(table.columns())
        .map_err(|e| AppError::output(format!("Failed to write CSV header for '{}': {e}", path.display())))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .map_err(|e| AppError::output(format!("Failed to write CSV row for '{}': {e}", path.display())))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::output(format!("Failed to finish CSV '{}': {e}", path.display())))?;

    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), rows = table.len(), "wrote table");
    Ok(())
}

/// Write a labelled series (`label,value`), e.g. a per-column range.
pub fn write_series_csv(path: &Path, header: [&str; 2], series: &[(String, Option<f64>)]) -> Result<(), AppError> {
    let mut table = Table::new(header.iter().map(|s| s.to_string()).collect());
    for (label, value) in series {
        table.push_row(vec![
            crate::domain::Value::Text(label.clone()),
            crate::domain::Value::from_opt(*value),
        ]);
    }
    write_table_csv(path, &table)
}

/// Write bytes to `path` via a temporary file in the same directory.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let tmp = temp_sibling(path);
    fs::write(&tmp, bytes)
        .map_err(|e| AppError::output(format!("Failed to write '{}': {e}", tmp.display())))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        AppError::output(format!("Failed to move output into place at '{}': {e}", path.display()))
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
