//! Chart rendering: ASCII scatter for the terminal and SVG files for reports.

pub mod ascii;
pub mod svg;

pub use ascii::render_ascii_scatter;
pub use svg::{EvolutionSeries, render_evolution, render_heatmap, render_histograms, render_scatter};
