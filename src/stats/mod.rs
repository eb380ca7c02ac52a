//! Descriptive statistics over tables: grouping, position/dispersion,
//! distributions, correlation, joins and structural checks.

pub mod correlation;
pub mod describe;
pub mod distribution;
pub mod group;
pub mod join;
pub mod structure;

pub use correlation::{CorrelationMatrix, correlation_matrix, pearson};
pub use describe::{ColumnSummary, Dispersion, describe, dispersion, summarize};
pub use distribution::{Histogram, histogram, value_counts};
pub use group::{GROUP_STATS, group_means, group_rows, group_summaries};
pub use join::inner_join;
pub use structure::{ColumnProfile, StructureReport, inspect};
