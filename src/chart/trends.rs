use super::{Bar, DASHBOARD_SIZE, Line, bar_panel, gradient, heatmap_panel, render, signed_color, week_panel};
use crate::analyzer::trend_analysis::TrendAnalysis;
use crate::model::{ChartError, TrendsDataset};
use crate::utils::to_title_case;
use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const PALETTE: [RGBColor; 6] = [
    RED,
    BLUE,
    GREEN,
    RGBColor(255, 140, 0),
    RGBColor(148, 0, 211),
    RGBColor(0, 139, 139),
];

/// Six panels: bubble series, all series, recent focus, momentum, correlations and divergence.
pub fn draw_trends(
    analysis: &TrendAnalysis,
    dataset: &TrendsDataset,
    dir: &Path,
) -> Result<PathBuf, ChartError> {
    render(dir, "ai_bubble_analysis", DASHBOARD_SIZE, |root| {
        let panels = root.split_evenly((3, 2));
        let series = &analysis.series;
        let weeks = &series.weeks;

        week_panel(
            &panels[0],
            "AI Bubble Search Trend",
            weeks,
            &[Line {
                label: &series.name,
                values: &series.values,
                color: RED,
                fill: true,
            }],
        )?;

        let titles: Vec<String> = dataset.columns.iter().map(|c| to_title_case(&c.name)).collect();
        let lines: Vec<Line> = dataset
            .columns
            .iter()
            .zip(&titles)
            .zip(PALETTE.iter().cycle())
            .map(|((column, title), color)| Line {
                label: title,
                values: &column.values,
                color: *color,
                fill: false,
            })
            .collect();
        week_panel(&panels[1], "All AI-Related Search Trends", &dataset.weeks, &lines)?;

        let recent_start = series
            .latest_week()
            .and_then(|w| NaiveDate::from_ymd_opt(w.year() - 1, 1, 1));
        let recent = match recent_start {
            Some(start) => series.since(start),
            None => series.clone(),
        };
        week_panel(
            &panels[2],
            "Recent Acceleration",
            &recent.weeks,
            &[Line {
                label: &recent.name,
                values: &recent.values,
                color: RED,
                fill: false,
            }],
        )?;

        let momentum: Vec<Bar> = analysis
            .momentum_1m
            .iter()
            .zip(weeks)
            .rev()
            .take(52)
            .rev()
            .map(|(m, week)| {
                let value = m.unwrap_or(0.0);
                Bar {
                    label: week.format("%m/%y").to_string(),
                    value,
                    color: signed_color(value),
                }
            })
            .collect();
        bar_panel(&panels[3], "Weekly Momentum (1-Month Change)", &momentum, "Momentum")?;

        let grad = gradient(&["#3b4cc0", "#f7f7f7", "#b40426"])?;
        let cells: Vec<Vec<Option<f64>>> = analysis
            .matrix
            .iter()
            .map(|row| row.iter().map(|m| m.value()).collect())
            .collect();
        heatmap_panel(
            &panels[4],
            "Correlation Matrix",
            &analysis.matrix_names,
            &analysis.matrix_names,
            &cells,
            &grad,
            (-1.0, 1.0),
        )?;

        week_panel(
            &panels[5],
            "Bubble Concerns vs Technical Development",
            weeks,
            &[
                Line {
                    label: "AI Bubble",
                    values: &series.values,
                    color: RED,
                    fill: false,
                },
                Line {
                    label: "Technical Indicators (Avg)",
                    values: &analysis.technical.values,
                    color: BLUE,
                    fill: false,
                },
            ],
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::trend_analysis::analyze_trends;
    use crate::config::AppConfig;
    use crate::model::TimeSeries;
    use chrono::Duration;

    #[test]
    fn writes_analysis_svg() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let weeks: Vec<NaiveDate> = (0..60).map(|i| start + Duration::weeks(i)).collect();
        let column = |name: &str, f: fn(usize) -> f64| {
            TimeSeries::new(name, weeks.clone(), (0..60).map(|i| Some(f(i))).collect())
        };
        let dataset = TrendsDataset {
            columns: vec![
                column("ai_bubble", |i| 1.0 + (i % 7) as f64 + i as f64 * 0.5),
                column("ai_startup", |i| 20.0 + (i % 5) as f64),
                column("prompt_engineering", |i| 30.0 + (i % 3) as f64),
                column("ai_roadmap", |_| 4.0),
                column("langchain", |i| 10.0 + (i % 4) as f64),
            ],
            weeks,
        };
        let analysis = analyze_trends(&dataset, &AppConfig::default()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = draw_trends(&analysis, &dataset, dir.path()).unwrap();

        assert_eq!(path.file_name().unwrap(), "ai_bubble_analysis.svg");
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Correlation Matrix"));
        assert!(svg.contains("Recent Acceleration"));
    }
}
