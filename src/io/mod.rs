//! File IO: CSV and workbook ingest, table export and run manifests.

pub mod export;
pub mod ingest;
pub mod manifest;
pub mod workbook;

pub use export::{ensure_dir, write_series_csv, write_table, write_table_csv};
pub use ingest::{IngestedTable, RowError, load_table};
pub use manifest::{RunManifest, write_manifest};
