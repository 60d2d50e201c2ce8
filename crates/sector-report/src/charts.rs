//! SVG figures for a sector analysis.

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use sector_analysis::SectorAnalysis;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::error::ReportError;
use crate::fmt_opt;

pub const PERFORMANCE_OVERVIEW: &str = "performance_overview.svg";
pub const RISK_ADJUSTED: &str = "risk_adjusted.svg";
pub const CORRELATION_HEATMAP: &str = "correlation_heatmap.svg";

const WIDE: (u32, u32) = (1500, 600);
const SQUARE: (u32, u32) = (800, 700);
const FONT: &str = "sans-serif";
/// Half the thickness of a bar, in category units.
const BAR_HALF_WIDTH: f64 = 0.35;

fn chart_err<E: std::fmt::Display>(e: E) -> ReportError {
    ReportError::Chart(e.to_string())
}

/// Write all three figures into `dir`, creating it if needed.
pub fn render_all(analysis: &SectorAnalysis, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
    std::fs::create_dir_all(dir).map_err(|e| ReportError::io(dir, e))?;

    let overview = dir.join(PERFORMANCE_OVERVIEW);
    performance_overview(analysis, &overview)?;

    let risk = dir.join(RISK_ADJUSTED);
    risk_adjusted(analysis, &risk)?;

    let heatmap = dir.join(CORRELATION_HEATMAP);
    correlation_heatmap(analysis, &heatmap)?;

    tracing::info!(dir = %dir.display(), "Charts written");
    Ok(vec![overview, risk, heatmap])
}

/// Total-return bars next to a risk/return scatter.
pub fn performance_overview(analysis: &SectorAnalysis, path: &Path) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let panels = root.split_evenly((1, 2));

    let names: Vec<String> = analysis.stats.iter().map(|s| s.sector.clone()).collect();
    let n = names.len();

    let returns: Vec<f64> = analysis.stats.iter().map(|s| s.total_return).collect();
    let mut bars = ChartBuilder::on(&panels[0])
        .caption("Total Return by Sector", (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(category_range(n), padded_range(&returns, true))
        .map_err(chart_err)?;

    bars.configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&|v| category_label(v, &names))
        .y_desc("Total Return (%)")
        .draw()
        .map_err(chart_err)?;

    bars.draw_series(analysis.stats.iter().enumerate().map(|(i, s)| {
        let x = i as f64;
        Rectangle::new(
            [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, s.total_return)],
            Palette99::pick(i).mix(0.8).filled(),
        )
    }))
    .map_err(chart_err)?;

    // Sectors without a volatility have no place on the risk axis.
    let points: Vec<(usize, &str, f64, f64)> = analysis
        .stats
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.volatility.map(|v| (i, s.sector.as_str(), v, s.total_return)))
        .collect();
    let xs: Vec<f64> = points.iter().map(|p| p.2).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.3).collect();

    let mut scatter = ChartBuilder::on(&panels[1])
        .caption("Risk vs Return", (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(padded_range(&xs, false), padded_range(&ys, true))
        .map_err(chart_err)?;

    scatter
        .configure_mesh()
        .x_desc("Volatility (%)")
        .y_desc("Total Return (%)")
        .draw()
        .map_err(chart_err)?;

    scatter
        .draw_series(points.iter().map(|(i, name, x, y)| {
            EmptyElement::at((*x, *y))
                + Circle::new((0, 0), 9, Palette99::pick(*i).mix(0.8).filled())
                + Text::new(name.to_string(), (10, -14), (FONT, 15).into_font())
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Horizontal Sharpe bars next to cumulative returns over time.
pub fn risk_adjusted(analysis: &SectorAnalysis, path: &Path) -> Result<(), ReportError> {
    let root = SVGBackend::new(path, WIDE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;
    let panels = root.split_evenly((1, 2));

    // Ascending so the best Sharpe ends up on top.
    let mut sharpes: Vec<(usize, &str, f64)> = analysis
        .stats
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.sharpe_ratio.map(|v| (i, s.sector.as_str(), v)))
        .collect();
    sharpes.sort_by(|a, b| a.2.partial_cmp(&b.2).unwrap_or(std::cmp::Ordering::Equal));

    let labels: Vec<String> = sharpes.iter().map(|s| s.1.to_string()).collect();
    let values: Vec<f64> = sharpes.iter().map(|s| s.2).collect();
    let m = sharpes.len();

    let mut bars = ChartBuilder::on(&panels[0])
        .caption("Sharpe Ratio by Sector", (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(110)
        .build_cartesian_2d(padded_range(&values, true), category_range(m))
        .map_err(chart_err)?;

    bars.configure_mesh()
        .disable_y_mesh()
        .y_labels(m.max(1))
        .y_label_formatter(&|v| category_label(v, &labels))
        .x_desc("Sharpe Ratio")
        .draw()
        .map_err(chart_err)?;

    bars.draw_series(sharpes.iter().enumerate().map(|(row, (i, _, v))| {
        let y = row as f64;
        Rectangle::new(
            [(0.0, y - BAR_HALF_WIDTH), (*v, y + BAR_HALF_WIDTH)],
            Palette99::pick(*i).mix(0.8).filled(),
        )
    }))
    .map_err(chart_err)?;

    let value_style = TextStyle::from((FONT, 14).into_font()).pos(Pos::new(HPos::Left, VPos::Center));
    bars.draw_series(sharpes.iter().enumerate().map(|(row, (_, _, v))| {
        Text::new(
            fmt_opt(Some(*v), 2),
            (*v, row as f64),
            value_style.clone(),
        )
    }))
    .map_err(chart_err)?;

    let dates = analysis
        .series
        .first()
        .map(|s| s.dates.clone())
        .unwrap_or_default();
    let curves: Vec<Vec<f64>> = analysis
        .series
        .iter()
        .map(|s| s.cumulative().iter().map(|c| c * 100.0).collect())
        .collect();
    let all: Vec<f64> = curves.iter().flatten().copied().collect();

    let mut lines = ChartBuilder::on(&panels[1])
        .caption("Cumulative Returns Over Time", (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0..dates.len().saturating_sub(1).max(1), padded_range(&all, true))
        .map_err(chart_err)?;

    lines
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&|i| {
            dates
                .get(*i)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default()
        })
        .y_desc("Cumulative Return (%)")
        .draw()
        .map_err(chart_err)?;

    for (i, (series, curve)) in analysis.series.iter().zip(&curves).enumerate() {
        let color = Palette99::pick(i).to_rgba();
        lines
            .draw_series(LineSeries::new(
                curve.iter().enumerate().map(|(t, c)| (t, *c)),
                color.stroke_width(2),
            ))
            .map_err(chart_err)?
            .label(series.sector.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    lines
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Annotated correlation grid on a blue-white-red scale centred on zero.
pub fn correlation_heatmap(analysis: &SectorAnalysis, path: &Path) -> Result<(), ReportError> {
    let matrix = &analysis.correlation;
    let n = matrix.len();

    let root = SVGBackend::new(path, SQUARE).into_drawing_area();
    root.fill(&WHITE).map_err(chart_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Sector Correlation Matrix", (FONT, 24))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(110)
        .build_cartesian_2d(category_range(n), category_range(n))
        .map_err(chart_err)?;

    // Row 0 is drawn at the top.
    let row_labels: Vec<String> = matrix.sectors.iter().rev().cloned().collect();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n.max(1))
        .y_labels(n.max(1))
        .x_label_formatter(&|v| category_label(v, &matrix.sectors))
        .y_label_formatter(&|v| category_label(v, &row_labels))
        .draw()
        .map_err(chart_err)?;

    let cells: Vec<(usize, usize, Option<f64>)> = (0..n)
        .flat_map(|row| (0..n).map(move |col| (row, col)))
        .map(|(row, col)| (row, col, matrix.get(row, col)))
        .collect();

    chart
        .draw_series(cells.iter().map(|(row, col, value)| {
            let (x, y) = (*col as f64, (n - 1 - row) as f64);
            let fill = (*value).map_or(RGBColor(235, 235, 235), diverging_color);
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], fill.filled())
        }))
        .map_err(chart_err)?;

    let centered = TextStyle::from((FONT, 16).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
    chart
        .draw_series(cells.iter().map(|(row, col, value)| {
            Text::new(
                fmt_opt(*value, 2),
                (*col as f64, (n - 1 - row) as f64),
                centered.clone(),
            )
        }))
        .map_err(chart_err)?;

    root.present().map_err(chart_err)?;
    Ok(())
}

/// Category `i` is centred on `i`, with half a slot of room on each side.
/// An empty axis keeps one slot.
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Label for a key point of a `category_range` axis. Only whole positions
/// name a category.
fn category_label(value: &f64, labels: &[String]) -> String {
    let index = value.round();
    if index < 0.0 || (value - index).abs() > 1e-6 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

/// Axis range covering `values` with 10% headroom. With `include_zero` the
/// range always spans zero so bars have a baseline.
pub fn padded_range(values: &[f64], include_zero: bool) -> Range<f64> {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (mut lo, mut hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    if lo > hi {
        return -1.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }

    let span = hi - lo;
    let pad = if span > 0.0 { span * 0.1 } else { lo.abs().max(1.0) * 0.1 };
    (lo - pad)..(hi + pad)
}

/// Blue for -1, near-white for 0, red for +1.
pub fn diverging_color(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const HOT: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = if value.is_finite() { value.clamp(-1.0, 1.0) } else { 0.0 };
    let (from, to, s) = if t < 0.0 { (MID, COLD, -t) } else { (MID, HOT, t) };
    let lerp = |a: f64, b: f64| (a + (b - a) * s).round() as u8;

    RGBColor(lerp(from.0, to.0), lerp(from.1, to.1), lerp(from.2, to.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::sample_analysis;

    #[test]
    fn test_padded_range_includes_zero() {
        let r = padded_range(&[5.0, 15.0], true);
        assert!(r.start < 0.0 && r.end > 15.0);

        let r = padded_range(&[5.0, 15.0], false);
        assert!(r.start > 0.0 && r.start < 5.0);
    }

    #[test]
    fn test_padded_range_degenerate_inputs() {
        assert_eq!(padded_range(&[], true), -1.0..1.0);
        assert_eq!(padded_range(&[f64::NAN], false), -1.0..1.0);
        let r = padded_range(&[0.0, 0.0], true);
        assert!(r.start < 0.0 && r.end > 0.0);
    }

    #[test]
    fn test_diverging_color_scale() {
        assert_eq!(diverging_color(-1.0), RGBColor(59, 76, 192));
        assert_eq!(diverging_color(0.0), RGBColor(221, 221, 221));
        assert_eq!(diverging_color(1.0), RGBColor(180, 4, 38));
        assert_eq!(diverging_color(2.0), diverging_color(1.0));
        assert_eq!(diverging_color(f64::NAN), diverging_color(0.0));
    }

    #[test]
    fn test_category_range_has_one_slot_per_category() {
        assert_eq!(category_range(5), -0.5..4.5);
        assert_eq!(category_range(1), -0.5..0.5);
        assert_eq!(category_range(0), -0.5..0.5);
        for n in 1..8 {
            let r = category_range(n);
            assert_eq!(r.end - r.start, n as f64);
        }
    }

    #[test]
    fn test_category_label() {
        let labels = vec!["Tech".to_string(), "Banks".to_string()];
        assert_eq!(category_label(&0.0, &labels), "Tech");
        assert_eq!(category_label(&1.0000000001, &labels), "Banks");
        assert_eq!(category_label(&0.5, &labels), "");
        assert_eq!(category_label(&-1.0, &labels), "");
        assert_eq!(category_label(&3.0, &labels), "");
    }

    #[test]
    fn test_render_all_writes_three_svgs() {
        let dir = tempfile::tempdir().unwrap();
        let analysis = sample_analysis();

        let paths = render_all(&analysis, &dir.path().join("charts")).unwrap();

        let names: Vec<_> = paths.iter().map(|p| p.file_name().unwrap().to_str().unwrap()).collect();
        assert_eq!(names, vec![PERFORMANCE_OVERVIEW, RISK_ADJUSTED, CORRELATION_HEATMAP]);
        for path in &paths {
            let svg = std::fs::read_to_string(path).unwrap();
            assert!(svg.starts_with("<svg"), "{} is not an SVG", path.display());
            assert!(svg.contains("Technology"), "{} lacks sector labels", path.display());
            assert!(svg.contains("Utilities"), "{} lacks sector labels", path.display());
        }
    }

    #[test]
    fn test_render_single_sector() {
        let dir = tempfile::tempdir().unwrap();
        let mut analysis = sample_analysis();
        analysis.stats.truncate(1);
        analysis.series.truncate(1);
        analysis.correlation.sectors.truncate(1);
        analysis.correlation.values = vec![vec![Some(1.0)]];

        let paths = render_all(&analysis, dir.path()).unwrap();
        let heatmap = std::fs::read_to_string(&paths[2]).unwrap();
        assert!(heatmap.contains("Technology"));
        assert!(!heatmap.contains("Utilities"));
        // One cell, one annotation.
        assert_eq!(heatmap.matches("\n1.00</text>").count(), 1);
    }
}
