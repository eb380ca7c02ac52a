//! SVG charts rendered with Plotters.
//!
//! Each chart is data-driven: series and bounds are computed by the caller,
//! and the functions here only draw. Drawing errors surface as `AppError`
//! with the output exit code.

use std::error::Error;
use std::path::Path;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::AppError;
use crate::math::LineFit;
use crate::stats::{CorrelationMatrix, Histogram};

type DrawResult = Result<(), Box<dyn Error>>;

/// tab20 followed by Set1, cycled for series colors.
const PALETTE: [RGBColor; 29] = [
    RGBColor(31, 119, 180),
    RGBColor(174, 199, 232),
    RGBColor(255, 127, 14),
    RGBColor(255, 187, 120),
    RGBColor(44, 160, 44),
    RGBColor(152, 223, 138),
    RGBColor(214, 39, 40),
    RGBColor(255, 152, 150),
    RGBColor(148, 103, 189),
    RGBColor(197, 176, 213),
    RGBColor(140, 86, 75),
    RGBColor(196, 156, 148),
    RGBColor(227, 119, 194),
    RGBColor(247, 182, 210),
    RGBColor(127, 127, 127),
    RGBColor(199, 199, 199),
    RGBColor(188, 189, 34),
    RGBColor(219, 219, 141),
    RGBColor(23, 190, 207),
    RGBColor(158, 218, 229),
    RGBColor(228, 26, 28),
    RGBColor(55, 126, 184),
    RGBColor(77, 175, 74),
    RGBColor(152, 78, 163),
    RGBColor(255, 127, 0),
    RGBColor(255, 255, 51),
    RGBColor(166, 86, 40),
    RGBColor(247, 129, 191),
    RGBColor(153, 153, 153),
];

fn series_color(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

fn render_error(path: &Path, e: Box<dyn Error>) -> AppError {
    AppError::output(format!("Failed to render chart '{}': {e}", path.display()))
}

/// One line per region over the observed years.
#[derive(Debug, Clone)]
pub struct EvolutionSeries {
    pub label: String,
    /// One value per entry of `years`; `None` leaves a gap in the line.
    pub values: Vec<Option<f64>>,
}

pub fn render_evolution(
    path: &Path,
    title: &str,
    y_label: &str,
    years: &[i32],
    series: &[EvolutionSeries],
) -> Result<(), AppError> {
    draw_evolution(path, title, y_label, years, series).map_err(|e| render_error(path, e))
}

fn draw_evolution(path: &Path, title: &str, y_label: &str, years: &[i32], series: &[EvolutionSeries]) -> DrawResult {
    let root = SVGBackend::new(path, (1400, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;
    let (plot_area, legend_area) = root.split_horizontally(1080);

    let (x0, x1) = match (years.iter().min(), years.iter().max()) {
        (Some(&lo), Some(&hi)) if hi > lo => (f64::from(lo), f64::from(hi)),
        (Some(&lo), _) => (f64::from(lo) - 1.0, f64::from(lo) + 1.0),
        _ => (0.0, 1.0),
    };
    let (y0, y1) = padded_bounds(series.iter().flat_map(|s| s.values.iter().flatten().copied()));

    let mut chart = ChartBuilder::on(&plot_area)
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(55)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(y_label)
        .x_labels(years.len().max(2))
        .x_label_formatter(&|v| format!("{v:.0}"))
        .y_label_formatter(&|v| format!("{v:.2}"))
        .draw()?;

    for (i, s) in series.iter().enumerate() {
        let color = series_color(i);
        let points: Vec<(f64, Option<f64>)> = years.iter().map(|&y| f64::from(y)).zip(s.values.iter().copied()).collect();

        for run in present_runs(&points) {
            chart.draw_series(LineSeries::new(run.iter().copied(), color.stroke_width(2)))?;
        }
        chart.draw_series(
            points
                .iter()
                .filter_map(|&(x, y)| y.map(|y| Circle::new((x, y), 3, color.filled()))),
        )?;
    }

    // Legend in its own column so it never hides a line.
    for (i, s) in series.iter().enumerate() {
        let color = series_color(i);
        let y = 20 + 22 * i as i32;
        legend_area.draw(&PathElement::new(vec![(10, y), (34, y)], color.stroke_width(3)))?;
        legend_area.draw(&Text::new(
            s.label.clone(),
            (42, y),
            ("sans-serif", 13)
                .into_font()
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center)),
        ))?;
    }

    root.present()?;
    Ok(())
}

/// Split a series into runs of consecutive present values.
fn present_runs(points: &[(f64, Option<f64>)]) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for &(x, y) in points {
        match y {
            Some(y) => current.push((x, y)),
            None if !current.is_empty() => runs.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Scatter of `points` with an optional least-squares trend line.
pub fn render_scatter(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
    trend: Option<&LineFit>,
) -> Result<(), AppError> {
    draw_scatter(path, title, x_label, y_label, points, trend).map_err(|e| render_error(path, e))
}

fn draw_scatter(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    points: &[(f64, f64)],
    trend: Option<&LineFit>,
) -> DrawResult {
    let root = SVGBackend::new(path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let (x0, x1) = padded_bounds(points.iter().map(|p| p.0));
    let (y0, y1) = padded_bounds(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .x_label_formatter(&|v| format!("{v:.2}"))
        .y_label_formatter(&|v| format!("{v:.3}"))
        .draw()?;

    let point_color = series_color(0);
    chart
        .draw_series(
            points
                .iter()
                .map(|&(x, y)| Circle::new((x, y), 4, point_color.mix(0.7).filled())),
        )?
        .label("regions")
        .legend(move |(x, y)| Circle::new((x + 8, y), 4, point_color.filled()));

    if let Some(fit) = trend {
        let line_color = series_color(6);
        chart
            .draw_series(LineSeries::new(
                [x0, x1].into_iter().map(|x| (x, fit.predict(x))),
                line_color.stroke_width(2),
            ))?
            .label(format!(
                "y = {:.4} + {:.4}x (R² = {:.3})",
                fit.intercept, fit.slope, fit.r_squared
            ))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], line_color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.85))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Annotated correlation heatmap (blue = -1, red = +1).
pub fn render_heatmap(path: &Path, title: &str, matrix: &CorrelationMatrix) -> Result<(), AppError> {
    draw_heatmap(path, title, matrix).map_err(|e| render_error(path, e))
}

fn draw_heatmap(path: &Path, title: &str, matrix: &CorrelationMatrix) -> DrawResult {
    let k = matrix.names.len().max(1) as i32;
    let side = (120 + 90 * k as u32).clamp(500, 1400);
    let root = SVGBackend::new(path, (side + 140, side)).into_drawing_area();
    root.fill(&WHITE)?;

    let last = (k - 1).max(1);
    let names = &matrix.names;
    let label = |v: &SegmentValue<i32>, flip: bool| -> String {
        match v {
            SegmentValue::CenterOf(i) => {
                let idx = if flip { k - 1 - *i } else { *i };
                names.get(idx as usize).cloned().unwrap_or_default()
            }
            _ => String::new(),
        }
    };

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 20))
        .margin(15)
        .x_label_area_size(120)
        .y_label_area_size(140)
        // Integer ranges are inclusive here: `0..=k-1` gives exactly `k` cells.
        .build_cartesian_2d((0..last).into_segmented(), (0..last).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(k as usize)
        .y_labels(k as usize)
        .x_label_formatter(&|v| label(v, false))
        .y_label_formatter(&|v| label(v, true))
        .x_label_style(("sans-serif", 12).into_font().transform(FontTransform::Rotate90))
        .draw()?;

    // Row 0 of the matrix is drawn at the top.
    let n = matrix.names.len() as i32;
    for i in 0..n {
        for j in 0..n {
            let value = matrix.get(i as usize, j as usize);
            let row = n - 1 - i;
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(j), SegmentValue::Exact(row)),
                    (SegmentValue::Exact(j + 1), SegmentValue::Exact(row + 1)),
                ],
                diverging_color(value).filled(),
            )))?;
            let text = value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string());
            chart.draw_series(std::iter::once(Text::new(
                text,
                (SegmentValue::CenterOf(j), SegmentValue::CenterOf(row)),
                ("sans-serif", 13)
                    .into_font()
                    .color(&BLACK)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

/// Blue-white-red scale over `[-1, 1]`; undefined cells are light grey.
fn diverging_color(value: Option<f64>) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const HOT: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let Some(v) = value else {
        return RGBColor(240, 240, 240);
    };
    let v = v.clamp(-1.0, 1.0);
    let (from, to, u) = if v < 0.0 { (MID, COLD, -v) } else { (MID, HOT, v) };
    let mix = |a: f64, b: f64| (a + (b - a) * u).round() as u8;
    RGBColor(mix(from.0, to.0), mix(from.1, to.1), mix(from.2, to.2))
}

/// A grid of histograms, one panel per column.
pub fn render_histograms(path: &Path, title: &str, panels: &[(String, Histogram)]) -> Result<(), AppError> {
    draw_histograms(path, title, panels).map_err(|e| render_error(path, e))
}

fn draw_histograms(path: &Path, title: &str, panels: &[(String, Histogram)]) -> DrawResult {
    let n = panels.len().max(1);
    let cols = (n as f64).sqrt().ceil() as usize;
    let rows = n.div_ceil(cols);

    let root = SVGBackend::new(path, (380 * cols as u32, 300 * rows as u32 + 50)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(title, ("sans-serif", 24))?;
    let areas = root.split_evenly((rows, cols));

    let fill = series_color(0);
    for (area, (name, hist)) in areas.iter().zip(panels) {
        let (Some(&lo), Some(&hi)) = (hist.edges.first(), hist.edges.last()) else {
            continue;
        };
        let top = hist.counts.iter().copied().max().unwrap_or(0).max(1) as f64 * 1.1;

        let mut chart = ChartBuilder::on(area)
            .caption(name, ("sans-serif", 14))
            .margin(8)
            .x_label_area_size(28)
            .y_label_area_size(32)
            .build_cartesian_2d(lo..hi, 0.0..top)?;

        chart
            .configure_mesh()
            .x_labels(4)
            .y_labels(4)
            .x_label_formatter(&|v| format!("{v:.2}"))
            .y_label_formatter(&|v| format!("{v:.0}"))
            .draw()?;

        let bars: Vec<((f64, f64), f64)> = hist
            .edges
            .windows(2)
            .zip(&hist.counts)
            .map(|(w, &c)| ((w[0], w[1]), c as f64))
            .collect();

        chart.draw_series(
            bars.iter()
                .map(|&((a, b), c)| Rectangle::new([(a, 0.0), (b, c)], fill.mix(0.8).filled())),
        )?;
        chart.draw_series(
            bars.iter()
                .map(|&((a, b), c)| Rectangle::new([(a, 0.0), (b, c)], BLACK.stroke_width(1))),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Min/max of the finite values, padded by 5% (or ±1 for a flat sample).
fn padded_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for v in values.filter(|v| v.is_finite()) {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    if hi - lo < 1e-12 {
        return (lo - 1.0, hi + 1.0);
    }
    let pad = (hi - lo) * 0.05;
    (lo - pad, hi + pad)
}
