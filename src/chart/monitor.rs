use super::{
    Area, Bar, DASHBOARD_SIZE, DrawResult, bar_panel, centered, gradient, hbar_panel,
    heatmap_panel, render, risk_color, title_font, wedge,
};
use crate::analyzer::composite::{HISTORICAL_PEAKS, Indicator, MonitorResult};
use crate::model::ChartError;
use crate::utils::to_title_case;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};

const GAUGE_COLORS: [RGBColor; 5] = [
    GREEN,
    RGBColor(154, 205, 50),
    YELLOW,
    RGBColor(255, 165, 0),
    RED,
];

const PHASE_STEPS: [(&str, f64); 6] = [
    ("Early", 20.0),
    ("Middle", 35.0),
    ("Late-Middle", 50.0),
    ("Late", 65.0),
    ("Peak", 80.0),
    ("Burst Risk", 90.0),
];

/// Half-donut gauge from 0 (left) to 100 (right) with a needle at `value`.
fn gauge_panel(area: &Area, title: &str, value: f64) -> DrawResult<()> {
    let area = area.titled(title, title_font(16))?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 * 2 / 3);
    let outer = (w.min(h) as f64 * 0.45).max(10.0);
    let inner = outer * 0.7;

    for (i, color) in GAUGE_COLORS.iter().enumerate() {
        let from = 180.0 - i as f64 * 36.0;
        area.draw(&Polygon::new(
            wedge(center, outer, inner, from, from - 36.0),
            color.filled(),
        ))?;
    }

    let angle = (180.0 - value.clamp(0.0, 100.0) * 1.8) * PI / 180.0;
    let tip = (
        center.0 + (outer * 0.9 * angle.cos()).round() as i32,
        center.1 - (outer * 0.9 * angle.sin()).round() as i32,
    );
    area.draw(&PathElement::new(vec![center, tip], BLACK.stroke_width(3)))?;
    area.draw(&Circle::new(center, 5, BLACK.filled()))?;
    area.draw(&Text::new(
        format!("{value:.1}"),
        (center.0, center.1 + 30),
        centered(24),
    ))?;
    Ok(())
}

/// Projected composite with a plus or minus 5 band and the risk thresholds.
fn projection_panel(area: &Area, projection: &[f64]) -> DrawResult<()> {
    let lo = projection.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = projection.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if lo.is_finite() && hi.is_finite() {
        ((lo - 10.0).max(0.0), (hi + 10.0).min(100.0))
    } else {
        (0.0, 100.0)
    };
    let x_max = projection.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(area)
        .caption("6-Month Projection", title_font(16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0.0..x_max, lo..hi.max(lo + 1.0))?;
    let month = |x: &f64| match x.round() as i64 {
        0 => "Now".to_string(),
        m => format!("+{m}m"),
    };
    chart
        .configure_mesh()
        .x_labels(projection.len().max(1))
        .x_label_formatter(&month)
        .y_desc("Projected Bubble Score")
        .draw()?;

    let points: Vec<(f64, f64)> = projection.iter().enumerate().map(|(i, v)| (i as f64, *v)).collect();
    let band: Vec<(f64, f64)> = points
        .iter()
        .map(|(x, y)| (*x, y + 5.0))
        .chain(points.iter().rev().map(|(x, y)| (*x, y - 5.0)))
        .collect();
    chart.draw_series(std::iter::once(Polygon::new(band, BLUE.mix(0.2).filled())))?;
    chart.draw_series(LineSeries::new(points.clone(), BLUE.stroke_width(2)))?;
    chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, BLUE.filled())))?;

    for (threshold, color, label) in [
        (80.0, RED, "High Risk"),
        (90.0, RGBColor(139, 0, 0), "Extreme Risk"),
    ] {
        if (lo..hi).contains(&threshold) {
            chart
                .draw_series(LineSeries::new(
                    vec![(0.0, threshold), (x_max, threshold)],
                    color.mix(0.6).stroke_width(1),
                ))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
        }
    }
    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;
    Ok(())
}

/// Six panels: gauge, indicators, phase ladder, history, risk grid and projection.
pub fn draw_monitor(result: &MonitorResult, dir: &Path) -> Result<PathBuf, ChartError> {
    render(dir, "ai_bubble_monitor", DASHBOARD_SIZE, |root| {
        let root = root.titled("AI Bubble Monitoring Dashboard", title_font(22))?;
        let panels = root.split_evenly((2, 3));
        let composite = result.composite;

        gauge_panel(&panels[0], "Composite Score", composite)?;

        let indicators: Vec<Bar> = result
            .indicators
            .iter()
            .map(|i| Bar {
                label: format!("{} ({:.0})", to_title_case(&i.name), i.score),
                value: i.score,
                color: risk_color(i.score),
            })
            .collect();
        hbar_panel(&panels[1], "Individual Indicator Scores", &indicators, 0.0..100.0)?;

        let current = PHASE_STEPS
            .iter()
            .rposition(|(_, threshold)| composite >= *threshold)
            .unwrap_or(0);
        let phases: Vec<Bar> = PHASE_STEPS
            .iter()
            .enumerate()
            .map(|(i, (label, threshold))| Bar {
                label: label.to_string(),
                value: *threshold,
                color: if i == current { RED } else { RGBColor(200, 200, 200) },
            })
            .collect();
        hbar_panel(
            &panels[2],
            &format!("Bubble Phase Progression (current {composite:.0})"),
            &phases,
            0.0..100.0,
        )?;

        let history: Vec<Bar> = HISTORICAL_PEAKS
            .iter()
            .map(|(name, score)| Bar {
                label: name.to_string(),
                value: *score,
                color: RGBColor(128, 128, 128),
            })
            .chain(std::iter::once(Bar {
                label: "Current AI".to_string(),
                value: composite,
                color: RED,
            }))
            .collect();
        bar_panel(&panels[3], "Historical Bubble Comparison", &history, "Bubble Score")?;

        let score = |i: Indicator| result.score_of(i);
        let grad = gradient(&["#1a9850", "#ffffbf", "#d73027"])?;
        heatmap_panel(
            &panels[4],
            "Risk Heatmap",
            &["Valuations".to_string(), "ROI Delivery".to_string()],
            &["Market Sentiment".to_string(), "Public Concern".to_string()],
            &[
                vec![score(Indicator::SearchTrends), score(Indicator::SentimentAnalysis)],
                vec![score(Indicator::ValuationMetrics), score(Indicator::RoiDelivery)],
            ],
            &grad,
            (0.0, 100.0),
        )?;

        projection_panel(&panels[5], &result.projection)?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::composite::run_monitor;
    use crate::config::MonitorConfig;

    #[test]
    fn writes_dashboard_svg() {
        let dir = tempfile::tempdir().unwrap();
        let result = run_monitor(&MonitorConfig::default()).unwrap();
        let path = draw_monitor(&result, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "ai_bubble_monitor.svg");
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Risk Heatmap"));
        assert!(svg.contains("Composite Score"));
    }
}
