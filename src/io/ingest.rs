//! CSV / workbook ingest and numeric inference.
//!
//! This module turns a delimited text file (or one worksheet) into a `Table`:
//! - **File-level errors are fatal** (missing file, unreadable header; exit code 2)
//! - **Row-level errors are local** (malformed records are skipped and reported)
//! - **Cells are typed conservatively**: a column becomes numeric only when every
//!   non-empty cell parses; callers can force more columns with `Table::coerce_numeric`
//! - no analysis logic here

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::{ReadOptions, Table, Value, parse_number};
use crate::error::AppError;
use crate::io::workbook::{is_workbook, read_sheet};

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the table plus what happened while reading it.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub path: PathBuf,
    pub table: Table,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a CSV file or a workbook (`.xlsx`, by extension) into a `Table`.
pub fn load_table(path: &Path, options: &ReadOptions) -> Result<IngestedTable, AppError> {
    let mut ingested = if is_workbook(path) {
        if !path.exists() {
            return Err(not_found(path));
        }
        let sheet = read_sheet(path, options.sheet.as_deref())?;
        let rows_read = sheet.rows.len();
        let name = sheet.sheet;
        build_table(&sheet.headers, sheet.rows, Vec::new(), rows_read, options.decimal_comma).map_err(|e| {
            AppError::input(format!("Failed to read worksheet '{name}' of '{}': {e}", path.display()))
        })?
    } else {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                not_found(path)
            } else {
                AppError::input(format!("Failed to read '{}': {e}", path.display()))
            }
        })?;

        let header_line = content.lines().next().unwrap_or_default();
        let delimiter = options.delimiter.resolve(header_line);

        parse_table(&content, delimiter, options.decimal_comma)
            .map_err(|e| AppError::input(format!("Failed to read '{}': {e}", path.display())))?
    };
    ingested.path = path.to_path_buf();

    debug!(
        path = %path.display(),
        rows = ingested.table.len(),
        columns = ingested.table.width(),
        "loaded table"
    );
    if !ingested.row_errors.is_empty() {
        warn!(
            path = %path.display(),
            skipped = ingested.row_errors.len(),
            "skipped malformed rows"
        );
    }

    Ok(ingested)
}

fn not_found(path: &Path) -> AppError {
    AppError::input(format!(
        "Input file not found: '{}'. Check the file name and path.",
        path.display()
    ))
}

/// Parse CSV text (already read into memory) into a table.
pub fn parse_table(content: &str, delimiter: u8, decimal_comma: bool) -> Result<IngestedTable, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| format!("could not read CSV headers: {e}"))?
        .iter()
        .map(str::to_string)
        .collect();
    let width = headers.len();

    let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        if record.len() > width {
            row_errors.push(RowError {
                line,
                message: format!("row has {} fields but the header has {width}", record.len()),
            });
            continue;
        }

        raw_rows.push(
            (0..width)
                .map(|i| record.get(i).filter(|s| !s.is_empty()).map(str::to_string))
                .collect(),
        );
    }

    build_table(&headers, raw_rows, row_errors, rows_read, decimal_comma)
}

/// Shared by the CSV and workbook readers: name columns, drop blank rows,
/// infer numeric columns and type every cell.
fn build_table(
    headers: &[String],
    raw_rows: Vec<Vec<Option<String>>>,
    row_errors: Vec<RowError>,
    rows_read: usize,
    decimal_comma: bool,
) -> Result<IngestedTable, String> {
    let columns = build_columns(headers);
    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err("the file has no header row".to_string());
    }

    // Fully blank lines (e.g. trailing separators from spreadsheet exports).
    let raw_rows: Vec<Vec<Option<String>>> = raw_rows
        .into_iter()
        .filter(|row| row.iter().any(Option::is_some))
        .map(|row| {
            let mut row: Vec<Option<String>> = row.into_iter().take(columns.len()).collect();
            row.resize(columns.len(), None);
            if decimal_comma {
                for cell in row.iter_mut().flatten() {
                    if let Some(fixed) = decimal_point(cell) {
                        *cell = fixed;
                    }
                }
            }
            row
        })
        .collect();

    let numeric = infer_numeric_columns(columns.len(), &raw_rows);

    let mut table = Table::new(columns);
    for raw in raw_rows {
        let row = raw
            .into_iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                None => Value::Missing,
                Some(s) if numeric[i] => parse_number(&s).map(Value::Number).unwrap_or(Value::Missing),
                Some(s) => Value::Text(s),
            })
            .collect();
        table.push_row(row);
    }

    Ok(IngestedTable {
        path: PathBuf::new(),
        table,
        row_errors,
        rows_read,
    })
}

/// `1.234,5` -> `1234.5`. `None` when the cell has no comma or is not a number.
fn decimal_point(cell: &str) -> Option<String> {
    if !cell.contains(',') {
        return None;
    }
    let fixed = cell.replace('.', "").replace(',', ".");
    fixed.trim().parse::<f64>().ok().map(|_| fixed)
}

fn build_columns(headers: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .iter()
        .map(|name| {
            let name = normalize_header_name(name);
            let count = seen.entry(name.clone()).or_insert(0);
            *count += 1;
            if *count == 1 { name } else { format!("{name}.{}", *count - 1) }
        })
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet tools often emit UTF-8 CSVs with a BOM on the first header.
    // Left in place, the first column (usually the region) would never match.
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

/// A column is numeric when it has at least one value and every value parses.
fn infer_numeric_columns(width: usize, rows: &[Vec<Option<String>>]) -> Vec<bool> {
    (0..width)
        .map(|i| {
            let mut any = false;
            for row in rows {
                if let Some(s) = &row[i] {
                    if s.trim().parse::<f64>().is_err() {
                        return false;
                    }
                    any = true;
                }
            }
            any
        })
        .collect()
}
