use super::{
    Area, Bar, DASHBOARD_SIZE, DrawResult, bar_panel, centered, gradient, hbar_panel,
    heatmap_panel, render, shade, signed_color, title_font, wedge,
};
use crate::analyzer::sectors::{Correction, RiskTolerance};
use crate::model::ChartError;
use plotters::prelude::*;
use std::path::{Path, PathBuf};

const HEATMAP_SECTORS: [(&str, &str); 7] = [
    ("Tech", "Technology"),
    ("Financials", "Financials"),
    ("Healthcare", "Healthcare"),
    ("Staples", "Consumer Staples"),
    ("Energy", "Energy"),
    ("Utilities", "Utilities"),
    ("Gold", "Gold/Precious Metals"),
];

const PIE_COLORS: [&str; 8] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
];

/// Pie of percentage slices, counter-clockwise from 12 o'clock.
fn allocation_panel(area: &Area, title: &str, slices: &[(&str, u32)]) -> DrawResult<()> {
    let area = area.titled(title, title_font(16))?;
    let (w, h) = area.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = (w.min(h) as f64 * 0.32).max(10.0);
    let total: u32 = slices.iter().map(|(_, pct)| pct).sum();
    let grad = gradient(&PIE_COLORS)?;
    let last = slices.len().saturating_sub(1).max(1) as f64;

    let mut start = 90.0;
    for (i, (label, pct)) in slices.iter().enumerate() {
        if *pct == 0 {
            continue;
        }
        let sweep = 360.0 * *pct as f64 / total.max(1) as f64;
        let color = shade(&grad, i as f64 / last);
        area.draw(&Polygon::new(
            wedge(center, radius, 0.0, start, start + sweep),
            color.filled(),
        ))?;

        let mid = (start + sweep / 2.0).to_radians();
        let at = |r: f64| {
            (
                center.0 + (r * mid.cos()).round() as i32,
                center.1 - (r * mid.sin()).round() as i32,
            )
        };
        area.draw(&Text::new(format!("{pct}%"), at(radius * 0.65), centered(13)))?;
        area.draw(&Text::new(label.to_string(), at(radius * 1.25), centered(13)))?;
        start += sweep;
    }
    Ok(())
}

/// Four panels: past tech drawdowns, sector heatmap, projection and allocation pie.
pub fn draw_sectors(
    corrections: &[Correction],
    projections: &[(&'static str, f64)],
    magnitude: f64,
    tolerance: RiskTolerance,
    dir: &Path,
) -> Result<PathBuf, ChartError> {
    render(dir, "sector_rotation_analysis", DASHBOARD_SIZE, |root| {
        let panels = root.split_evenly((2, 2));

        let drawdowns: Vec<Bar> = corrections
            .iter()
            .map(|c| Bar {
                label: format!("{} ({:.0}%)", c.short_name(), c.tech_performance),
                value: c.tech_performance,
                color: RGBColor(178, 34, 34),
            })
            .collect();
        bar_panel(&panels[0], "Historical Tech Corrections", &drawdowns, "Tech Sector Decline (%)")?;

        let rows: Vec<String> = corrections.iter().map(|c| c.short_name().to_string()).collect();
        let columns: Vec<String> = HEATMAP_SECTORS.iter().map(|(short, _)| short.to_string()).collect();
        let cells: Vec<Vec<Option<f64>>> = corrections
            .iter()
            .map(|c| HEATMAP_SECTORS.iter().map(|(_, sector)| c.performance(sector)).collect())
            .collect();
        let grad = gradient(&["#d73027", "#ffffbf", "#1a9850"])?;
        heatmap_panel(
            &panels[1],
            "Sector Performance Across Corrections",
            &rows,
            &columns,
            &cells,
            &grad,
            (-80.0, 50.0),
        )?;

        let mut sorted = projections.to_vec();
        sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
        let extent = sorted.iter().map(|(_, v)| v.abs()).fold(1.0, f64::max) * 1.1;
        let projected: Vec<Bar> = sorted
            .iter()
            .map(|(sector, value)| Bar {
                label: sector.to_string(),
                value: *value,
                color: signed_color(*value),
            })
            .collect();
        hbar_panel(
            &panels[2],
            &format!("Projected Performance in AI Bubble Correction (-{magnitude:.0}%)"),
            &projected,
            -extent..extent,
        )?;

        allocation_panel(
            &panels[3],
            &format!("Recommended Portfolio Allocation ({tolerance})"),
            &tolerance.allocation(),
        )?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::sectors::{CORRECTIONS, project_correction};

    #[test]
    fn writes_rotation_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = draw_sectors(
            &CORRECTIONS,
            &project_correction(40.0),
            40.0,
            RiskTolerance::Moderate,
            dir.path(),
        )
        .unwrap();

        assert_eq!(path.file_name().unwrap(), "sector_rotation_analysis.svg");
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Cash/T-Bills"));
        assert!(svg.contains("Dot-com Crash"));
    }
}
