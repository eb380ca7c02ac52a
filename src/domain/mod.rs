//! Domain types used throughout the analyses.
//!
//! This module defines:
//!
//! - the tabular model (`Table`, `Value`, `ColumnKind`)
//! - shared configuration (`AnalysisConfig`, `Delimiter`, `Stage`)
//! - dataset naming conventions (year columns, census periods, file names)

pub mod table;
pub mod types;

pub use table::*;
pub use types::*;
