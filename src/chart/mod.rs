// SVG dashboards, one file per analysis
use crate::model::ChartError;
use chrono::NaiveDate;
use colorgrad::Gradient;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::f64::consts::PI;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

mod monitor;
mod refined;
mod sectors;
mod trends;

pub use monitor::draw_monitor;
pub use refined::draw_refined;
pub use sectors::draw_sectors;
pub use trends::draw_trends;

type DrawResult<T> = Result<T, Box<dyn Error>>;
type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

const FONT: &str = "sans-serif";
const DASHBOARD_SIZE: (u32, u32) = (1500, 1200);

/// Creates `dir` if needed and renders `draw` into `<dir>/<name>.svg`.
fn render(
    dir: &Path,
    name: &str,
    size: (u32, u32),
    draw: impl FnOnce(&Area) -> DrawResult<()>,
) -> Result<PathBuf, ChartError> {
    fs::create_dir_all(dir).map_err(|source| ChartError::OutputDir {
        path: dir.display().to_string(),
        source,
    })?;
    let path = dir.join(format!("{name}.svg"));
    draw_to(&path, size, draw).map_err(|e| ChartError::Render {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    info!(path = %path.display(), "chart written");
    Ok(path)
}

fn draw_to(path: &Path, size: (u32, u32), draw: impl FnOnce(&Area) -> DrawResult<()>) -> DrawResult<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    draw(&root)?;
    root.present()?;
    Ok(())
}

fn title_font(size: u32) -> TextStyle<'static> {
    TextStyle::from((FONT, size).into_font())
}

fn centered(size: u32) -> TextStyle<'static> {
    title_font(size).pos(Pos::new(HPos::Center, VPos::Center))
}

fn gradient(colors: &[&str]) -> DrawResult<colorgrad::LinearGradient> {
    colorgrad::GradientBuilder::new()
        .html_colors(colors)
        .build::<colorgrad::LinearGradient>()
        .map_err(|e| format!("invalid gradient: {e}").into())
}

/// Color at `t` in `[0, 1]`.
fn shade(grad: &impl Gradient, t: f64) -> RGBColor {
    let [r, g, b, _] = grad.at(t.clamp(0.0, 1.0) as f32).to_rgba8();
    RGBColor(r, g, b)
}

/// Traffic-light color for a 0-100 risk score.
fn risk_color(score: f64) -> RGBColor {
    if score >= 80.0 {
        RED
    } else if score >= 60.0 {
        RGBColor(255, 165, 0)
    } else if score >= 40.0 {
        YELLOW
    } else {
        GREEN
    }
}

fn signed_color(value: f64) -> RGBColor {
    if value > 0.0 { GREEN } else { RED }
}

/// Upper bound for a value axis, never collapsing to zero.
fn headroom(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values.into_iter().filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max > 0.0 { max * 1.1 } else { 1.0 }
}

/// Contiguous runs of present points, so gaps are not bridged.
fn runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut current = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

struct Line<'a> {
    label: &'a str,
    values: &'a [Option<f64>],
    color: RGBColor,
    fill: bool,
}

/// Weekly series sharing one time axis.
fn week_panel(area: &Area, title: &str, weeks: &[NaiveDate], lines: &[Line]) -> DrawResult<()> {
    let x_max = weeks.len().saturating_sub(1).max(1) as f64;
    let y_max = headroom(lines.iter().flat_map(|l| l.values.iter().flatten().copied()));
    let mut chart = ChartBuilder::on(area)
        .caption(title, title_font(16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)?;
    let week_label = |x: &f64| {
        weeks
            .get(x.round().max(0.0) as usize)
            .map(|w| w.format("%Y-%m").to_string())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_labels(6)
        .x_label_formatter(&week_label)
        .y_desc("Search Interest")
        .draw()?;

    for line in lines {
        let color = line.color;
        for (n, run) in runs(line.values).into_iter().enumerate() {
            if line.fill {
                chart.draw_series(AreaSeries::new(run.clone(), 0.0, color.mix(0.2)))?;
            }
            let series = chart.draw_series(LineSeries::new(run, color.stroke_width(2)))?;
            if n == 0 && lines.len() > 1 {
                series
                    .label(line.label)
                    .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            }
        }
    }
    if lines.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

struct Bar {
    label: String,
    value: f64,
    color: RGBColor,
}

/// Vertical category bars; the value range always includes zero.
fn bar_panel(area: &Area, title: &str, bars: &[Bar], y_desc: &str) -> DrawResult<()> {
    let hi = headroom(bars.iter().map(|b| b.value));
    let lo = if bars.iter().any(|b| b.value < 0.0) {
        -headroom(bars.iter().map(|b| -b.value))
    } else {
        0.0
    };
    let mut chart = ChartBuilder::on(area)
        .caption(title, title_font(16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(45)
        .build_cartesian_2d((0..bars.len() as i32).into_segmented(), lo..hi)?;
    let label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => bars
            .get(*i as usize)
            .map(|b| b.label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(bars.len().max(1))
        .x_label_formatter(&label)
        .y_desc(y_desc)
        .draw()?;
    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let i = i as i32;
        let mut rect = Rectangle::new(
            [(SegmentValue::Exact(i), 0.0), (SegmentValue::Exact(i + 1), bar.value)],
            bar.color.mix(0.75).filled(),
        );
        rect.set_margin(0, 0, 4, 4);
        rect
    }))?;
    Ok(())
}

/// Horizontal category bars over a fixed value range.
fn hbar_panel(area: &Area, title: &str, bars: &[Bar], range: std::ops::Range<f64>) -> DrawResult<()> {
    let mut chart = ChartBuilder::on(area)
        .caption(title, title_font(16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(170)
        .build_cartesian_2d(range, (0..bars.len() as i32).into_segmented())?;
    let label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => bars
            .get(*i as usize)
            .map(|b| b.label.clone())
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(bars.len().max(1))
        .y_label_formatter(&label)
        .draw()?;
    chart.draw_series(bars.iter().enumerate().map(|(i, bar)| {
        let i = i as i32;
        let mut rect = Rectangle::new(
            [(0.0, SegmentValue::Exact(i)), (bar.value, SegmentValue::Exact(i + 1))],
            bar.color.mix(0.8).filled(),
        );
        rect.set_margin(3, 3, 0, 0);
        rect
    }))?;
    Ok(())
}

/// Annotated grid; rows are listed top to bottom. Missing cells are grey.
fn heatmap_panel(
    area: &Area,
    title: &str,
    rows: &[String],
    columns: &[String],
    cells: &[Vec<Option<f64>>],
    grad: &impl Gradient,
    (lo, hi): (f64, f64),
) -> DrawResult<()> {
    let n_rows = rows.len() as i32;
    let mut chart = ChartBuilder::on(area)
        .caption(title, title_font(16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(120)
        .build_cartesian_2d(
            (0..columns.len() as i32).into_segmented(),
            (0..n_rows).into_segmented(),
        )?;
    let col_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => columns.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    };
    let row_label = |v: &SegmentValue<i32>| match v {
        SegmentValue::CenterOf(i) => rows
            .get((n_rows - 1 - *i) as usize)
            .cloned()
            .unwrap_or_default(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(columns.len().max(1))
        .y_labels(rows.len().max(1))
        .x_label_formatter(&col_label)
        .y_label_formatter(&row_label)
        .draw()?;

    for (r, row) in cells.iter().enumerate() {
        let y = n_rows - 1 - r as i32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as i32;
            let color = match cell {
                Some(v) => shade(grad, (v - lo) / (hi - lo)),
                None => RGBColor(200, 200, 200),
            };
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(c), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(c + 1), SegmentValue::Exact(y + 1)),
                ],
                color.filled(),
            )))?;
            let text = cell.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));
            chart.draw_series(std::iter::once(Text::new(
                text,
                (SegmentValue::CenterOf(c), SegmentValue::CenterOf(y)),
                centered(12),
            )))?;
        }
    }
    Ok(())
}

/// Ring segment between two angles in degrees, counter-clockwise from east.
fn wedge(center: (i32, i32), outer: f64, inner: f64, from: f64, to: f64) -> Vec<(i32, i32)> {
    let steps = ((to - from).abs() / 2.0).ceil().max(1.0) as usize;
    let point = |radius: f64, deg: f64| {
        let rad = deg * PI / 180.0;
        (
            center.0 + (radius * rad.cos()).round() as i32,
            center.1 - (radius * rad.sin()).round() as i32,
        )
    };
    let angle = |k: usize| from + (to - from) * k as f64 / steps as f64;
    let mut points: Vec<(i32, i32)> = (0..=steps).map(|k| point(outer, angle(k))).collect();
    if inner > 0.0 {
        points.extend((0..=steps).rev().map(|k| point(inner, angle(k))));
    } else {
        points.push(center);
    }
    points
}

/// Boxed block of text lines.
fn text_panel(area: &Area, title: &str, lines: &[String]) -> DrawResult<()> {
    let area = area.titled(title, title_font(16))?;
    let (w, h) = area.dim_in_pixel();
    area.draw(&Rectangle::new(
        [(20, 10), (w as i32 - 20, h as i32 - 10)],
        RGBColor(245, 222, 179).mix(0.5).filled(),
    ))?;
    let step = (h as i32 - 40) / lines.len().max(1) as i32;
    for (i, line) in lines.iter().enumerate() {
        area.draw(&Text::new(
            line.clone(),
            (w as i32 / 2, 30 + step * i as i32),
            centered(15),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_split_on_missing_values() {
        let values = [Some(1.0), None, Some(2.0), Some(3.0), None];
        let out = runs(&values);
        assert_eq!(out, vec![vec![(0.0, 1.0)], vec![(2.0, 2.0), (3.0, 3.0)]]);
    }

    #[test]
    fn wedge_closes_at_center_without_hole() {
        let pie = wedge((100, 100), 50.0, 0.0, 0.0, 90.0);
        assert_eq!(pie.first(), Some(&(150, 100)));
        assert_eq!(pie.last(), Some(&(100, 100)));
        assert!(pie.contains(&(100, 50)));

        let ring = wedge((0, 0), 10.0, 5.0, 0.0, 180.0);
        assert_eq!(ring.last(), Some(&(5, 0)));
    }

    #[test]
    fn headroom_never_collapses() {
        assert_eq!(headroom([0.0, -3.0]), 1.0);
        assert!((headroom([10.0, f64::NAN]) - 11.0).abs() < 1e-9);
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let err = render(&blocker.join("nested"), "x", (10, 10), |_| Ok(())).unwrap_err();
        assert!(matches!(err, ChartError::OutputDir { .. }));
    }
}
