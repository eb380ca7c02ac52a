//! `regional-indices` library crate.
//!
//! The binary (`ri`) is a thin wrapper around this library so that:
//!
//! - core logic (projection, statistics, joins) is testable without spawning processes
//! - pipelines can be reused by other front-ends
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod projection;
pub mod report;
pub mod stats;
