//! Spreadsheet (`.xlsx`) input and output.
//!
//! Workbook cells are turned into the same raw text cells the CSV reader
//! produces, so numeric inference and missing-value handling are shared.
//! Only one worksheet is read per file.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use tracing::debug;

use crate::domain::{Table, Value};
use crate::error::AppError;
use crate::io::export::write_atomic;

/// Extensions read through the workbook reader.
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xls", "ods"];

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
}

/// Header and data rows of one worksheet, as trimmed text cells.
pub(crate) struct SheetCells {
    pub sheet: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// Read `sheet` (or the first worksheet) of a workbook.
pub(crate) fn read_sheet(path: &Path, sheet: Option<&str>) -> Result<SheetCells, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::input(format!("Failed to open workbook '{}': {e}", path.display())))?;

    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names.iter().find(|n| n.as_str() == wanted).cloned().ok_or_else(|| {
            AppError::input(format!(
                "Worksheet '{wanted}' not found in '{}' (available: {}).",
                path.display(),
                names.join(", ")
            ))
        })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| AppError::input(format!("Workbook '{}' has no worksheets.", path.display())))?,
    };

    let range = workbook
        .worksheet_range(&name)
        .map_err(|e| AppError::input(format!("Failed to read worksheet '{name}' of '{}': {e}", path.display())))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(|c| cell_text(c).unwrap_or_default()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<Option<String>>> = rows.map(|r| r.iter().map(cell_text).collect()).collect();

    debug!(path = %path.display(), sheet = %name, rows = rows.len(), "read worksheet");
    Ok(SheetCells {
        sheet: name,
        headers,
        rows,
    })
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Data::Float(v) => Some(v.to_string()),
        Data::Int(v) => Some(v.to_string()),
        other => Some(other.to_string()),
    }
}

/// Write a table as a single-sheet `.xlsx` workbook.
pub fn write_table_xlsx(path: &Path, table: &Table) -> Result<(), AppError> {
    let fail = |e: rust_xlsxwriter::XlsxError| AppError::output(format!("Failed to write workbook '{}': {e}", path.display()));
    let too_large = || AppError::output(format!("Table too large for a worksheet: '{}'", path.display()));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    for (c, name) in table.columns().iter().enumerate() {
        let col = u16::try_from(c).map_err(|_| too_large())?;
        sheet.write_string(0, col, name.as_str()).map_err(fail)?;
    }
    for (r, row) in table.rows().iter().enumerate() {
        let line = u32::try_from(r + 1).map_err(|_| too_large())?;
        for (c, value) in row.iter().enumerate() {
            let col = u16::try_from(c).map_err(|_| too_large())?;
            match value {
                Value::Number(v) => {
                    sheet.write_number(line, col, *v).map_err(fail)?;
                }
                Value::Text(s) => {
                    sheet.write_string(line, col, s.as_str()).map_err(fail)?;
                }
                Value::Missing => {}
            }
        }
    }

    let bytes = workbook.save_to_buffer().map_err(fail)?;
    write_atomic(path, &bytes)?;
    debug!(path = %path.display(), rows = table.len(), "wrote workbook");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ColumnKind, ReadOptions};
    use crate::io::load_table;

    fn temp_dir(tag: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ri-workbook-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn extension_decides_the_reader() {
        assert!(is_workbook(Path::new("data/idhm.xlsx")));
        assert!(is_workbook(Path::new("IDEB.XLSX")));
        assert!(!is_workbook(Path::new("idhm.csv")));
        assert!(!is_workbook(Path::new("idhm")));
    }

    #[test]
    fn workbook_written_and_loaded_back() {
        let dir = temp_dir("roundtrip");
        let path = dir.join("idhm.xlsx");

        let mut t = Table::new(vec!["Prefeitura Regional".into(), "IDHM_2000".into(), "IDHM_2010".into()]);
        t.push_row(vec![Value::Text("Sé".into()), Value::Number(0.7), Value::Number(0.75)]);
        t.push_row(vec![Value::Text("Lapa".into()), Value::Missing, Value::Number(0.8)]);
        write_table_xlsx(&path, &t).unwrap();
        assert!(!dir.join(".idhm.xlsx.tmp").exists());

        let back = load_table(&path, &ReadOptions::default()).unwrap().table;
        assert_eq!(back.columns(), t.columns());
        assert_eq!(back.column_kind(0), ColumnKind::Text);
        assert_eq!(back.numeric_column("IDHM_2000").unwrap(), vec![Some(0.7), None]);
        assert_eq!(back.numeric_column("IDHM_2010").unwrap(), vec![Some(0.75), Some(0.8)]);
    }

    #[test]
    fn named_sheet_must_exist() {
        let dir = temp_dir("sheet");
        let path = dir.join("ideb.xlsx");
        let mut t = Table::new(vec!["a".into()]);
        t.push_row(vec![Value::Number(1.0)]);
        write_table_xlsx(&path, &t).unwrap();

        let first = read_sheet(&path, None).unwrap();
        assert_eq!(first.sheet, "Sheet1");
        assert_eq!(first.headers, vec!["a"]);
        assert_eq!(first.rows, vec![vec![Some("1".to_string())]]);

        let options = ReadOptions {
            sheet: Some("subprefeitura".to_string()),
            ..ReadOptions::default()
        };
        let err = load_table(&path, &options).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("Sheet1"));
    }
}
