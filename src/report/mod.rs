//! Terminal reports.

pub mod format;

pub use format::*;
