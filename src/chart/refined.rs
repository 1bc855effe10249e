use super::{
    Area, Bar, DASHBOARD_SIZE, DrawResult, Line, bar_panel, headroom, render, text_panel,
    title_font, week_panel,
};
use crate::analyzer::refined::RefinedAnalysis;
use crate::analyzer::stats::PeriodMean;
use crate::model::ChartError;
use crate::utils::text_bar;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

/// Period means joined by a marked line.
fn progression_panel(area: &Area, title: &str, periods: &[PeriodMean]) -> DrawResult<()> {
    let points: Vec<(f64, f64)> = periods
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.mean.value().map(|v| (i as f64, v)))
        .collect();
    let x_max = periods.len().saturating_sub(1).max(1) as f64;
    let mut chart = ChartBuilder::on(area)
        .caption(title, title_font(16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(-0.5..x_max + 0.5, 0.0..headroom(points.iter().map(|p| p.1)))?;
    let label = |x: &f64| {
        periods
            .get(x.round().max(0.0) as usize)
            .map(|p| p.label.clone())
            .unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_labels(periods.len().clamp(1, 8))
        .x_label_formatter(&label)
        .y_desc("Average Search Interest")
        .draw()?;
    chart.draw_series(LineSeries::new(points.clone(), RED.stroke_width(2)))?;
    chart.draw_series(points.into_iter().map(|p| Circle::new(p, 5, RED.filled())))?;
    Ok(())
}

/// Main trend across the top, six detail panels below.
pub fn draw_refined(analysis: &RefinedAnalysis, dir: &Path) -> Result<PathBuf, ChartError> {
    render(dir, "ai_bubble_refined_analysis", DASHBOARD_SIZE, |root| {
        let (top, bottom) = root.split_vertically(DASHBOARD_SIZE.1 / 3);
        let panels = bottom.split_evenly((2, 3));
        let series = &analysis.series;

        week_panel(
            &top,
            "AI Bubble Search Trend - Post ChatGPT Era",
            &series.weeks,
            &[
                Line {
                    label: "AI Bubble",
                    values: &series.values,
                    color: RED,
                    fill: true,
                },
                Line {
                    label: "3-month MA",
                    values: &analysis.ma13,
                    color: RGBColor(139, 0, 0),
                    fill: false,
                },
            ],
        )?;

        let monthly: Vec<Bar> = analysis
            .monthly
            .iter()
            .map(|m| Bar {
                label: m.label.clone(),
                value: m.mean.value().unwrap_or(0.0),
                color: RED,
            })
            .collect();
        bar_panel(&panels[0], "Monthly Average - AI Bubble Searches", &monthly, "Average")?;

        week_panel(
            &panels[1],
            "Bubble Concerns vs Technical Reality",
            &series.weeks,
            &[
                Line {
                    label: "Bubble Concerns",
                    values: &series.values,
                    color: RED,
                    fill: false,
                },
                Line {
                    label: "Technical Development",
                    values: &analysis.technical.values,
                    color: BLUE,
                    fill: false,
                },
                Line {
                    label: "Hype Index",
                    values: &analysis.hype.values,
                    color: RGBColor(255, 140, 0),
                    fill: false,
                },
            ],
        )?;

        let growth: Vec<Bar> = analysis
            .growth_26
            .iter()
            .zip([RED, BLUE, GREEN])
            .map(|((label, g), color)| Bar {
                label: format!("{label} ({g:.0}%)"),
                value: g.value().unwrap_or(0.0),
                color,
            })
            .collect();
        bar_panel(&panels[2], "6-Month Growth Comparison", &growth, "Growth %")?;

        progression_panel(&panels[3], "Quarterly Average Progression", &analysis.quarterly)?;

        let detail = &analysis.latest_year;
        let year = detail
            .weeks
            .first()
            .map(|w| w.format("%Y").to_string())
            .unwrap_or_default();
        week_panel(
            &panels[4],
            &format!("{year} Detail - The Surge"),
            &detail.weeks,
            &[Line {
                label: "AI Bubble",
                values: &detail.values,
                color: RED,
                fill: true,
            }],
        )?;

        let bubble = analysis.bubble_probability();
        let increase = analysis.increase_probability();
        text_panel(
            &panels[5],
            "Probability Assessment",
            &[
                "AI Bubble".to_string(),
                format!("{bubble}%"),
                text_bar(bubble as f64, 5.0),
                "Trend Increase".to_string(),
                format!("{increase}%"),
                text_bar(increase as f64, 5.0),
                format!("Status: {}", analysis.alert_status()),
            ],
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::refined::analyze_refined;
    use crate::config::AppConfig;
    use crate::model::{TimeSeries, TrendsDataset};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn writes_refined_svg() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let weeks: Vec<NaiveDate> = (0..70).map(|i| start + Duration::weeks(i)).collect();
        let column = |name: &str, f: fn(usize) -> f64| {
            TimeSeries::new(name, weeks.clone(), (0..70).map(|i| Some(f(i))).collect())
        };
        let dataset = TrendsDataset {
            columns: vec![
                column("ai_bubble", |i| 1.0 + i as f64 * 0.3),
                column("ai_startup", |i| 15.0 + (i % 6) as f64),
                column("prompt_engineering", |i| 40.0 - i as f64 * 0.2),
                column("ai_roadmap", |_| 3.0),
                column("langchain", |i| 8.0 + (i % 2) as f64),
            ],
            weeks,
        };
        let analysis = analyze_refined(&dataset, &AppConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = draw_refined(&analysis, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "ai_bubble_refined_analysis.svg");
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Quarterly Average Progression"));
        assert!(svg.contains("Probability Assessment"));
    }
}
