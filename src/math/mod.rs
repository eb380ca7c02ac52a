//! Mathematical utilities: least squares and trend lines.

pub mod ols;

pub use ols::*;
