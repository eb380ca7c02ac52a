//! Linear and exponential projection of indicators observed at two years.
//!
//! The projector is a small pure function (`model`); `batch` applies it to
//! every row of a table and names the output columns.

pub mod batch;
pub mod model;

pub use batch::{IndicatorSummary, ProjectionOutput, ProjectionPlan, project_table};
pub use model::{Projection, RowProjection, project, project_row};
