// Post-launch focus window: milestones, monthly phases, divergence and the bubble checklist
use crate::analyzer::bands::BandTable;
use crate::analyzer::stats::{
    self, Period, PeriodMean, correlation, diff, growth_between, growth_rate, max_with_index,
    resample, rolling_mean, std_dev, trailing, trailing_mean,
};
use crate::analyzer::trend_analysis::{Check, PROMPT_COLUMN, STARTUP_COLUMN};
use crate::config::AppConfig;
use crate::model::{AppError, BandError, Metric, TimeSeries, TrendsDataset};
use crate::normalizer;
use chrono::NaiveDate;
use strum_macros::Display;
use tracing::{info, warn};

const DIVERGENCE_WARNING: f64 = 50.0;
const PROJECTION_WINDOW: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MonthlyPhase {
    #[strum(to_string = "Pre-awareness")]
    PreAwareness,
    #[strum(to_string = "Early Concern")]
    EarlyConcern,
    #[strum(to_string = "Growing Anxiety")]
    GrowingAnxiety,
    #[strum(to_string = "High Alert")]
    HighAlert,
    #[strum(to_string = "Peak Fear")]
    PeakFear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stability {
    Stable,
    Moderate,
    #[strum(to_string = "Highly Volatile")]
    HighlyVolatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Strength {
    Weak,
    Moderate,
    Strong,
}

pub fn monthly_phase_table() -> Result<BandTable<MonthlyPhase>, BandError> {
    BandTable::from_static(
        &[
            (2.0, MonthlyPhase::PreAwareness),
            (5.0, MonthlyPhase::EarlyConcern),
            (10.0, MonthlyPhase::GrowingAnxiety),
            (20.0, MonthlyPhase::HighAlert),
        ],
        MonthlyPhase::PeakFear,
    )
}

/// Coefficient of variation, in percent.
pub fn stability_table() -> Result<BandTable<Stability>, BandError> {
    BandTable::from_static(
        &[(50.0, Stability::Stable), (100.0, Stability::Moderate)],
        Stability::HighlyVolatile,
    )
}

/// Absolute correlation coefficient; a tie stays in the weaker band.
pub fn strength_table() -> Result<BandTable<Strength>, BandError> {
    BandTable::from_static_inclusive(
        &[(0.4, Strength::Weak), (0.7, Strength::Moderate)],
        Strength::Strong,
    )
}

#[derive(Debug, Clone)]
pub struct MilestoneMeans {
    pub label: String,
    pub means: Vec<(String, Metric)>,
}

#[derive(Debug, Clone)]
pub struct MonthPhase {
    pub label: String,
    pub mean: f64,
    pub phase: MonthlyPhase,
}

#[derive(Debug, Clone)]
pub struct YearStats {
    pub year: i32,
    pub bubble_mean: Metric,
    pub bubble_max: Option<f64>,
    pub prompt_mean: Metric,
    pub startup_mean: Metric,
}

#[derive(Debug, Clone)]
pub struct Volatility {
    pub label: String,
    pub cv: f64,
    pub stability: Stability,
}

#[derive(Debug, Clone)]
pub struct CorrelationRow {
    pub label: &'static str,
    pub r: Metric,
    pub strength: Option<Strength>,
}

#[derive(Debug, Clone)]
pub struct DivergenceWindow {
    pub label: String,
    pub bubble_growth: f64,
    pub technical_growth: f64,
}

impl DivergenceWindow {
    pub fn divergence(&self) -> f64 {
        self.bubble_growth - self.technical_growth
    }

    pub fn is_warning(&self) -> bool {
        self.divergence() > DIVERGENCE_WARNING
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShortProjection {
    pub weekly_change: f64,
    pub four_week: f64,
    pub accelerating: bool,
}

#[derive(Debug, Clone)]
pub struct RefinedAnalysis {
    pub series: TimeSeries,
    pub ma13: Vec<Option<f64>>,
    pub technical: TimeSeries,
    pub hype: TimeSeries,
    pub latest_year: TimeSeries,
    pub milestones: Vec<MilestoneMeans>,
    pub monthly: Vec<PeriodMean>,
    pub quarterly: Vec<PeriodMean>,
    pub monthly_phases: Vec<MonthPhase>,
    pub years: Vec<YearStats>,
    pub qoq_growth: Vec<(String, f64)>,
    pub volatility: Vec<Volatility>,
    pub correlations: Vec<CorrelationRow>,
    pub divergences: Vec<DivergenceWindow>,
    /// Bubble, technical and startup growth over 26 weeks.
    pub growth_26: [(&'static str, Metric); 3],
    pub current: Option<f64>,
    pub peak: Option<(NaiveDate, f64)>,
    pub year_ratio: Metric,
    pub checklist: Vec<Check>,
    pub projection: Option<ShortProjection>,
    pub increase_factors: Vec<Check>,
}

impl RefinedAnalysis {
    pub fn bubble_probability(&self) -> u32 {
        points(&self.checklist)
    }

    pub fn increase_probability(&self) -> u32 {
        points(&self.increase_factors)
    }

    pub fn status_word(&self) -> &'static str {
        match self.bubble_probability() {
            p if p >= 80 => "DEFINITELY",
            p if p >= 60 => "LIKELY",
            _ => "POSSIBLY",
        }
    }

    pub fn alert_status(&self) -> &'static str {
        match self.bubble_probability() {
            p if p >= 80 => "HIGH ALERT",
            p if p >= 60 => "CAUTION",
            _ => "MONITORING",
        }
    }

    pub fn confidence(&self) -> &'static str {
        let (b, i) = (self.bubble_probability(), self.increase_probability());
        if b >= 70 && i >= 70 {
            "HIGH"
        } else if b >= 50 || i >= 50 {
            "MODERATE"
        } else {
            "LOW"
        }
    }

    pub fn conclusion(&self) -> &'static str {
        let (b, i) = (self.bubble_probability(), self.increase_probability());
        if b >= 80 && i >= 60 {
            "DEFINITIVELY experiencing an AI bubble phenomenon with strong likelihood of continued growth in bubble concerns."
        } else if b >= 60 {
            "LIKELY in an AI bubble awareness phase with probable continued growth in concerns."
        } else {
            "seeing ELEVATED bubble concerns but not yet at critical bubble levels."
        }
    }

    pub fn outlook(&self) -> &'static str {
        if self.increase_probability() >= 60 {
            "likely CONTINUE TO RISE"
        } else {
            "potentially STABILIZE"
        }
    }
}

/// Each met item is worth 20 points.
fn points(checks: &[Check]) -> u32 {
    checks.iter().filter(|c| c.met).count() as u32 * 20
}

fn check(met: bool, text: &'static str) -> Check {
    Check { met, text }
}

fn divergence_window(
    label: &str,
    bubble: &TimeSeries,
    technical: &TimeSeries,
    start: usize,
) -> Option<DivergenceWindow> {
    if start + 1 >= bubble.len() {
        return None;
    }
    let bubble_growth = growth_between(bubble.values[start], bubble.latest()).value()?;
    let technical_growth = growth_between(technical.values[start], technical.latest()).value()?;
    Some(DivergenceWindow {
        label: label.to_string(),
        bubble_growth,
        technical_growth,
    })
}

fn short_projection(values: &[Option<f64>], current: f64) -> Option<ShortProjection> {
    let recent = trailing(values, PROJECTION_WINDOW)?;
    let changes = diff(recent, 1);
    let weekly_change = stats::mean(&changes).value()?;
    let last = changes.len() - 1;
    let accelerating = matches!((changes[last], changes[last - 3]), (Some(a), Some(b)) if a > b);
    Some(ShortProjection {
        weekly_change,
        four_week: current + weekly_change * 4.0,
        accelerating,
    })
}

pub fn analyze_refined(dataset: &TrendsDataset, cfg: &AppConfig) -> Result<RefinedAnalysis, AppError> {
    let bubble_name = cfg.bubble_column();
    let focus = dataset.since(cfg.focus_start);
    let series = focus.require(bubble_name)?.clone();
    if series.is_empty() {
        return Err(AppError::NoData(bubble_name.to_string()));
    }
    let startup = focus.require(STARTUP_COLUMN)?;
    let prompt = focus.require(PROMPT_COLUMN)?;
    let technical = normalizer::technical_index(&focus, &cfg.technical_columns)?;
    let hype = normalizer::hype_index(&focus, bubble_name, STARTUP_COLUMN)?;
    info!(weeks = series.len(), since = %cfg.focus_start, "analyzing focus window");

    let milestones = cfg
        .milestones
        .iter()
        .map(|m| MilestoneMeans {
            label: m.label.clone(),
            means: dataset
                .columns
                .iter()
                .map(|c| (c.name.clone(), stats::mean(&c.between(Some(m.start), m.end).values)))
                .collect(),
        })
        .collect();

    let monthly = resample(&series, Period::Month);
    let quarterly = resample(&series, Period::Quarter);
    let phases = monthly_phase_table()?;
    let monthly_phases: Vec<MonthPhase> = monthly
        .iter()
        .filter_map(|m| {
            let mean = m.mean.value()?;
            Some(MonthPhase {
                label: m.label.clone(),
                mean,
                phase: *phases.classify(mean),
            })
        })
        .collect();
    let monthly_phases = monthly_phases[monthly_phases.len().saturating_sub(12)..].to_vec();

    let years: Vec<YearStats> = series
        .years()
        .into_iter()
        .map(|year| {
            let bubble = series.year(year);
            YearStats {
                year,
                bubble_mean: stats::mean(&bubble.values),
                bubble_max: max_with_index(&bubble.values).map(|(_, v)| v),
                prompt_mean: stats::mean(&prompt.year(year).values),
                startup_mean: stats::mean(&startup.year(year).values),
            }
        })
        .collect();

    let qoq_growth: Vec<(String, f64)> = quarterly
        .windows(2)
        .filter_map(|pair| {
            let previous = pair[0].mean.value().filter(|p| *p > 0.0)?;
            let growth = growth_between(Some(previous), pair[1].mean.value()).value()?;
            Some((pair[1].label.clone(), growth))
        })
        .collect();
    let qoq_growth = qoq_growth[qoq_growth.len().saturating_sub(6)..].to_vec();

    let stability = stability_table()?;
    let mut cv_periods: Vec<(String, Vec<Option<f64>>)> = years
        .iter()
        .map(|y| (y.year.to_string(), series.year(y.year).values))
        .collect();
    cv_periods.push((
        "Last 3 months".to_string(),
        trailing(&series.values, 13).unwrap_or(&series.values).to_vec(),
    ));
    let volatility = cv_periods
        .into_iter()
        .filter_map(|(label, values)| {
            let cv = stats::coefficient_of_variation(&values).value()?;
            Some(Volatility {
                label,
                cv,
                stability: *stability.classify(cv),
            })
        })
        .collect();

    let strength = strength_table()?;
    let correlations = [
        ("Bubble vs Technical Development", &technical),
        ("Bubble vs Startup Activity", startup),
        ("Bubble vs Prompt Engineering", prompt),
    ]
    .into_iter()
    .map(|(label, other)| {
        let r = correlation(&series.values, &other.values);
        CorrelationRow {
            label,
            r,
            strength: r.value().map(|v| *strength.classify(v.abs())),
        }
    })
    .collect();

    let len = series.len();
    let mut windows = vec![
        ("Last 3 months".to_string(), len.checked_sub(13).filter(|i| *i > 0)),
        ("Last 6 months".to_string(), len.checked_sub(26).filter(|i| *i > 0)),
    ];
    if let Some(anchor) = cfg.divergence_anchor() {
        let index = series.weeks.iter().position(|w| *w >= anchor);
        windows.push(("Since GPT-4".to_string(), index.filter(|i| *i > 0)));
    }
    let divergences: Vec<DivergenceWindow> = windows
        .into_iter()
        .filter_map(|(label, start)| divergence_window(&label, &series, &technical, start?))
        .collect();
    for window in divergences.iter().filter(|w| w.is_warning()) {
        warn!(window = %window.label, divergence = window.divergence(), "significant divergence");
    }

    let current = series.latest();
    let peak = max_with_index(&series.values).map(|(i, v)| (series.weeks[i], v));
    let year_ratio = match years.as_slice() {
        [.., previous, latest] => match (previous.bubble_mean, latest.bubble_mean) {
            (Metric::Value(p), Metric::Value(l)) if p > 0.0 => Metric::from_f64(l / p),
            (Metric::Value(_), Metric::Value(_)) => Metric::Undefined,
            _ => Metric::NotComputable,
        },
        _ => Metric::NotComputable,
    };
    let latest_technical = technical.latest();
    let checklist = vec![
        check(year_ratio.holds(|r| r > 2.0), "Exponential Growth"),
        check(
            matches!((current, peak), (Some(c), Some((_, p))) if c > p * 0.8),
            "Near Peak Values",
        ),
        check(trailing_mean(&series.values, 4).holds(|m| m > 20.0), "Sustained High Level"),
        check(
            matches!((current, latest_technical), (Some(c), Some(t)) if c > t * 2.0),
            "Divergence from Fundamentals",
        ),
        check(
            len > 52
                && matches!(
                    (
                        trailing(&series.values, 13).map(std_dev),
                        trailing(&series.values, 52).map(std_dev),
                    ),
                    (Some(Metric::Value(short)), Some(Metric::Value(long))) if short > long
                ),
            "Increasing Volatility",
        ),
    ];

    let projection = current.and_then(|c| short_projection(&series.values, c));
    let increase_factors = vec![
        check(projection.is_some_and(|p| p.weekly_change > 0.0), "Positive momentum"),
        check(
            matches!((current, peak), (Some(c), Some((_, p))) if c < p),
            "Below historical peak",
        ),
        check(technical.rose_over(13), "Technical growth continues"),
        check(series.rose_over(4), "Recent acceleration"),
        check(startup.rose_over(13), "Startup activity rising"),
    ];

    let growth_26 = [
        ("AI Bubble", growth_rate(&series.values, 26)),
        ("Technical", growth_rate(&technical.values, 26)),
        ("Startups", growth_rate(&startup.values, 26)),
    ];
    let latest_year = series
        .years()
        .last()
        .map(|y| series.year(*y))
        .unwrap_or_else(|| series.clone());

    Ok(RefinedAnalysis {
        ma13: rolling_mean(&series.values, 13),
        latest_year,
        milestones,
        monthly,
        quarterly,
        monthly_phases,
        years,
        qoq_growth,
        volatility,
        correlations,
        divergences,
        growth_26,
        current,
        peak,
        year_ratio,
        checklist,
        projection,
        increase_factors,
        technical,
        hype,
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Duration};

    /// Flat 2023 and 2024 followed by a steady 2025 ramp.
    fn dataset() -> TrendsDataset {
        let start = NaiveDate::from_ymd_opt(2022, 11, 6).unwrap();
        let weeks: Vec<NaiveDate> = (0..158).map(|i| start + Duration::weeks(i)).collect();
        let first_2025 = weeks.iter().position(|w| w.year() == 2025).unwrap();
        let bubble: Vec<Option<f64>> = weeks
            .iter()
            .enumerate()
            .map(|(i, w)| {
                Some(match w.year() {
                    2022 | 2023 => 2.0,
                    2024 => 3.0,
                    _ => 5.0 + (i - first_2025) as f64,
                })
            })
            .collect();
        let col = |name: &str, values: Vec<Option<f64>>| TimeSeries::new(name, weeks.clone(), values);
        let flat = |v: f64| vec![Some(v); weeks.len()];
        TrendsDataset {
            columns: vec![
                col("ai_bubble", bubble),
                col("ai_startup", (0..weeks.len()).map(|i| Some(10.0 + i as f64 * 0.1)).collect()),
                col("prompt_engineering", flat(5.0)),
                col("ai_roadmap", flat(5.0)),
                col("langchain", flat(5.0)),
            ],
            weeks,
        }
    }

    #[test]
    fn band_tables() {
        let phases = monthly_phase_table().unwrap();
        assert_eq!(*phases.classify(1.9), MonthlyPhase::PreAwareness);
        assert_eq!(*phases.classify(2.0), MonthlyPhase::EarlyConcern);
        assert_eq!(*phases.classify(25.0), MonthlyPhase::PeakFear);
        assert_eq!(*stability_table().unwrap().classify(120.0), Stability::HighlyVolatile);
        let strength = strength_table().unwrap();
        assert_eq!(*strength.classify(0.75), Strength::Strong);
        assert_eq!(*strength.classify(0.7), Strength::Moderate);
        assert_eq!(*strength.classify(0.4), Strength::Weak);
        assert_eq!(*strength.classify(0.41), Strength::Moderate);
        assert_eq!(*strength.classify(0.1), Strength::Weak);
    }

    #[test]
    fn focus_window_excludes_earlier_rows() {
        let analysis = analyze_refined(&dataset(), &AppConfig::default()).unwrap();
        let first = analysis.series.weeks[0];
        assert_eq!(first, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(analysis.years.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2023, 2024, 2025]);
        assert_eq!(analysis.monthly_phases.len(), 12);
        assert_eq!(analysis.qoq_growth.len(), 6);
        assert_eq!(analysis.latest_year.weeks[0].year(), 2025);
    }

    #[test]
    fn milestones_use_full_history() {
        let analysis = analyze_refined(&dataset(), &AppConfig::default()).unwrap();
        let chatgpt = &analysis.milestones[0];
        assert_eq!(chatgpt.means[0], ("ai_bubble".to_string(), Metric::Value(2.0)));
    }

    #[test]
    fn surge_checklist_and_factors() {
        let analysis = analyze_refined(&dataset(), &AppConfig::default()).unwrap();
        let met: Vec<&str> = analysis.checklist.iter().filter(|c| c.met).map(|c| c.text).collect();
        assert_eq!(
            met,
            vec![
                "Exponential Growth",
                "Near Peak Values",
                "Sustained High Level",
                "Divergence from Fundamentals",
            ]
        );
        assert_eq!(analysis.bubble_probability(), 80);

        let rising: Vec<&str> = analysis
            .increase_factors
            .iter()
            .filter(|c| c.met)
            .map(|c| c.text)
            .collect();
        assert_eq!(
            rising,
            vec!["Positive momentum", "Recent acceleration", "Startup activity rising"]
        );
        assert_eq!(analysis.increase_probability(), 60);
        assert_eq!(analysis.confidence(), "MODERATE");
        assert_eq!(analysis.status_word(), "DEFINITELY");
        assert!(analysis.conclusion().starts_with("DEFINITIVELY"));

        let projection = analysis.projection.unwrap();
        assert!((projection.weekly_change - 1.0).abs() < 1e-9);
        assert!(!projection.accelerating);
    }

    #[test]
    fn correlation_with_flat_technicals_is_undefined() {
        let analysis = analyze_refined(&dataset(), &AppConfig::default()).unwrap();
        assert_eq!(analysis.correlations[0].r, Metric::Undefined);
        assert_eq!(analysis.correlations[0].strength, None);
        assert!(analysis.divergences.iter().all(|d| d.technical_growth == 0.0));
        assert!(analysis.divergences.iter().any(|d| d.is_warning()));
    }

    #[test]
    fn divergence_windows_start_at_nth_last_week() {
        let analysis = analyze_refined(&dataset(), &AppConfig::default()).unwrap();
        let s = &analysis.series;
        let latest = s.latest().unwrap();
        for (label, n) in [("Last 3 months", 13), ("Last 6 months", 26)] {
            let start = s.nth_last(n).unwrap();
            let window = analysis.divergences.iter().find(|w| w.label == label).unwrap();
            assert!((window.bubble_growth - (latest / start - 1.0) * 100.0).abs() < 1e-9, "{label}");
        }
    }

    #[test]
    fn empty_focus_window_is_reported() {
        let cfg = AppConfig {
            focus_start: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            ..AppConfig::default()
        };
        assert!(matches!(analyze_refined(&dataset(), &cfg), Err(AppError::NoData(_))));
    }
}
