// Full-history trend analysis of the bubble-concern series
use crate::analyzer::bands::BandTable;
use crate::analyzer::stats::{
    self, Regression, correlation, correlation_matrix, diff, growth_rate, lag_correlation,
    linear_regression, log_linear_slope, max_with_index, percentile, rolling_std, trailing_mean,
};
use crate::config::AppConfig;
use crate::model::{AppError, Metric, TimeSeries, TrendsDataset};
use crate::normalizer;
use chrono::NaiveDate;
use strum_macros::Display;
use tracing::{debug, info};

pub const STARTUP_COLUMN: &str = "ai_startup";
pub const PROMPT_COLUMN: &str = "prompt_engineering";

const GROWTH_WINDOWS: [usize; 4] = [4, 13, 26, 52];
const LAGS: [usize; 4] = [0, 4, 8, 12];
const LAG_COLUMNS: [&str; 3] = [STARTUP_COLUMN, PROMPT_COLUMN, "langchain"];
const PEAK_PROMINENCE: f64 = 5.0;
const PROJECTION_WEEKS: i32 = 13;
const SIGNIFICANCE: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LifecyclePhase {
    #[strum(to_string = "Skepticism/Ignorance")]
    Skepticism,
    #[strum(to_string = "Early Awareness")]
    EarlyAwareness,
    #[strum(to_string = "Growing Concern")]
    GrowingConcern,
    #[strum(to_string = "High Alert")]
    HighAlert,
    #[strum(to_string = "Peak Fear/Panic")]
    PeakFear,
}

/// How far bubble concern outruns technical adoption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Divergence {
    #[strum(to_string = "SIGNIFICANT DIVERGENCE")]
    Significant,
    #[strum(to_string = "MODERATE DIVERGENCE")]
    Moderate,
    #[strum(to_string = "MILD DIVERGENCE")]
    Mild,
    #[strum(to_string = "CONVERGENT")]
    Convergent,
}

impl Divergence {
    pub fn describe(self) -> &'static str {
        match self {
            Divergence::Significant => "Bubble concerns growing much faster than technical adoption",
            Divergence::Moderate => "Bubble concerns outpacing technical growth",
            Divergence::Mild => "Bubble concerns slightly ahead of technical growth",
            Divergence::Convergent => "Technical growth keeping pace or exceeding bubble concerns",
        }
    }
}

/// One line of a scored checklist.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub met: bool,
    pub text: &'static str,
}

impl Check {
    fn new(met: bool, yes: &'static str, no: &'static str) -> Self {
        Self {
            met,
            text: if met { yes } else { no },
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrendAnalysis {
    pub series: TimeSeries,
    pub technical: TimeSeries,
    pub mean_all: Metric,
    pub mean_52: Metric,
    pub mean_26: Metric,
    pub mean_13: Metric,
    pub current: Option<f64>,
    pub peak: Option<(NaiveDate, f64)>,
    pub recent_peaks: Vec<(NaiveDate, f64)>,
    pub growth: Vec<(usize, Metric)>,
    pub correlations: Vec<(String, Metric)>,
    pub lag_correlations: Vec<(usize, Vec<(String, Metric)>)>,
    pub matrix_names: Vec<String>,
    pub matrix: Vec<Vec<Metric>>,
    /// p25, p50, p75, p90.
    pub percentiles: [f64; 4],
    pub phase: Option<LifecyclePhase>,
    pub yearly_phases: Vec<(i32, f64, LifecyclePhase)>,
    pub momentum_1m: Vec<Option<f64>>,
    pub momentum_3m: Vec<Option<f64>>,
    pub avg_momentum: Metric,
    pub volatility_historical: Metric,
    pub volatility_recent: Metric,
    pub volatility_ratio: Metric,
    pub acceleration: Option<f64>,
    pub bubble_growth: Metric,
    pub technical_growth: Metric,
    pub startup_growth: Metric,
    pub divergence: Option<Divergence>,
    pub trend: Option<Regression>,
    pub exp_rate: Option<f64>,
    pub linear_projection: Metric,
    pub exp_projection: Metric,
    pub bubble_checks: Vec<Check>,
    pub bubble_score: u32,
    pub increase_probability: u32,
}

impl TrendAnalysis {
    pub fn latest_momentum(&self) -> Option<f64> {
        self.momentum_1m.last().copied().flatten()
    }

    /// Strong evidence needs both a high bubble score and a likely increase.
    pub fn is_strong(&self) -> bool {
        self.bubble_score > 60 && self.increase_probability > 50
    }

    pub fn outpaces_technical(&self) -> bool {
        outpaces(self.bubble_growth, self.technical_growth, 1.5)
    }
}

fn outpaces(bubble: Metric, technical: Metric, factor: f64) -> bool {
    match (bubble, technical) {
        (Metric::Value(b), Metric::Value(t)) => b > t * factor,
        _ => false,
    }
}

pub fn divergence_status(bubble: Metric, technical: Metric) -> Option<Divergence> {
    let (Metric::Value(b), Metric::Value(t)) = (bubble, technical) else {
        return None;
    };
    Some(if b > t * 2.0 {
        Divergence::Significant
    } else if b > t * 1.5 {
        Divergence::Moderate
    } else if b > t {
        Divergence::Mild
    } else {
        Divergence::Convergent
    })
}

/// Quartile-style cutoffs taken from the series' own distribution.
pub fn lifecycle_table(series: &TimeSeries) -> Result<(BandTable<LifecyclePhase>, [f64; 4]), AppError> {
    let mut cuts = [0.0; 4];
    for (slot, q) in cuts.iter_mut().zip([0.25, 0.50, 0.75, 0.90]) {
        *slot = percentile(&series.values, q)
            .value()
            .ok_or_else(|| AppError::NoData(series.name.clone()))?;
    }
    let table = BandTable::new(
        vec![
            (cuts[0], LifecyclePhase::Skepticism),
            (cuts[1], LifecyclePhase::EarlyAwareness),
            (cuts[2], LifecyclePhase::GrowingConcern),
            (cuts[3], LifecyclePhase::HighAlert),
        ],
        LifecyclePhase::PeakFear,
    )?;
    Ok((table, cuts))
}

pub fn analyze_trends(dataset: &TrendsDataset, cfg: &AppConfig) -> Result<TrendAnalysis, AppError> {
    let bubble_name = cfg.bubble_column();
    let series = dataset.require(bubble_name)?.clone();
    let values = &series.values;
    let technical = normalizer::technical_index(dataset, &cfg.technical_columns)?;
    let startup = dataset.require(STARTUP_COLUMN)?;
    info!(weeks = series.len(), column = bubble_name, "analyzing full history");

    let current = series.latest();
    let peak = max_with_index(values).map(|(i, v)| (series.weeks[i], v));
    let peaks = stats::find_peaks(values, PEAK_PROMINENCE);
    let recent_peaks = peaks
        .iter()
        .rev()
        .take(5)
        .rev()
        .filter_map(|&i| values[i].map(|v| (series.weeks[i], v)))
        .collect();

    let growth = GROWTH_WINDOWS
        .iter()
        .map(|&w| (w, growth_rate(values, w)))
        .collect();

    let correlations = dataset
        .columns
        .iter()
        .filter(|c| c.name != bubble_name)
        .map(|c| (c.name.clone(), correlation(values, &c.values)))
        .collect();
    let lag_correlations = LAGS
        .iter()
        .map(|&lag| {
            let row = LAG_COLUMNS
                .iter()
                .filter_map(|name| dataset.series(name))
                .map(|c| (c.name.clone(), lag_correlation(values, &c.values, lag)))
                .collect();
            (lag, row)
        })
        .collect();
    let columns: Vec<&TimeSeries> = dataset.columns.iter().collect();
    let matrix = correlation_matrix(&columns);
    let matrix_names = dataset.columns.iter().map(|c| c.name.clone()).collect();

    let (table, percentiles) = lifecycle_table(&series)?;
    let phase = current.map(|c| *table.classify(c));
    let yearly_phases = series
        .years()
        .into_iter()
        .filter_map(|year| {
            let avg = stats::mean(&series.year(year).values).value()?;
            Some((year, avg, *table.classify(avg)))
        })
        .collect();

    let momentum_1m = diff(values, 4);
    let momentum_3m = diff(values, 13);
    let avg_momentum = trailing_mean(&momentum_1m, 26);
    let volatility = rolling_std(values, 4);
    let volatility_historical = stats::mean(&volatility);
    let volatility_recent = trailing_mean(&volatility, 26);
    let volatility_ratio = match (volatility_recent, volatility_historical) {
        (Metric::Value(_), Metric::Value(h)) if h == 0.0 => Metric::Undefined,
        (Metric::Value(r), Metric::Value(h)) => Metric::from_f64(r / h),
        _ => Metric::NotComputable,
    };
    let acceleration = diff(&momentum_1m, 4).last().copied().flatten();

    let bubble_growth = growth_rate(values, 26);
    let technical_growth = growth_rate(&technical.values, 26);
    let startup_growth = growth_rate(&startup.values, 26);
    let divergence = divergence_status(bubble_growth, technical_growth);

    let trend = linear_regression(values, 52);
    let exp_rate = log_linear_slope(values, 26);
    let linear_projection = match (current, trend) {
        (Some(c), Some(fit)) => Metric::from_f64(c + fit.slope * PROJECTION_WEEKS as f64),
        _ => Metric::NotComputable,
    };
    let exp_projection = match (current, exp_rate) {
        (Some(c), Some(rate)) => Metric::from_f64(c * rate.exp().powi(PROJECTION_WEEKS)),
        _ => linear_projection,
    };

    let latest_momentum = momentum_1m.last().copied().flatten();
    let bubble_checks = vec![
        Check::new(
            current.is_some_and(|c| c > percentiles[2]),
            "High search volume (above 75th percentile)",
            "Moderate search volume",
        ),
        if bubble_growth.holds(|g| g > 100.0) {
            Check::new(true, "Rapid growth in bubble concerns (>100% in 6 months)", "")
        } else {
            Check::new(
                bubble_growth.holds(|g| g > 50.0),
                "Significant growth in bubble concerns (>50% in 6 months)",
                "Moderate growth in bubble concerns",
            )
        },
        Check::new(
            outpaces(bubble_growth, technical_growth, 1.5),
            "Bubble concerns outpacing technical development",
            "Balanced growth with technical indicators",
        ),
        Check::new(
            acceleration.is_some_and(|a| a > 0.0) && latest_momentum.is_some_and(|m| m > 0.0),
            "Accelerating concern trajectory",
            "Stable or decelerating trajectory",
        ),
        Check::new(
            matches!(phase, Some(LifecyclePhase::HighAlert | LifecyclePhase::PeakFear)),
            "In high alert/peak fear phase",
            "Not yet in peak fear phase",
        ),
    ];
    let bubble_score = bubble_score(&bubble_checks, bubble_growth);

    let technical_rising = technical.rose_over(26);
    let increase_probability = [
        (trend.is_some_and(|t| t.slope > 0.0 && t.is_significant(SIGNIFICANCE)), 30),
        (latest_momentum.is_some_and(|m| m > 0.0), 20),
        (acceleration.is_some_and(|a| a > 0.0), 20),
        (current.is_some_and(|c| c < 50.0), 15),
        (technical_rising, 15),
    ]
    .iter()
    .filter(|(met, _)| *met)
    .map(|(_, points)| points)
    .sum();
    debug!(bubble_score, increase_probability, "trend synthesis");

    Ok(TrendAnalysis {
        mean_all: stats::mean(values),
        mean_52: trailing_mean(values, 52),
        mean_26: trailing_mean(values, 26),
        mean_13: trailing_mean(values, 13),
        current,
        peak,
        recent_peaks,
        growth,
        correlations,
        lag_correlations,
        matrix_names,
        matrix,
        percentiles,
        phase,
        yearly_phases,
        momentum_1m,
        momentum_3m,
        avg_momentum,
        volatility_historical,
        volatility_recent,
        volatility_ratio,
        acceleration,
        bubble_growth,
        technical_growth,
        startup_growth,
        divergence,
        trend,
        exp_rate,
        linear_projection,
        exp_projection,
        bubble_checks,
        bubble_score,
        increase_probability,
        technical,
        series,
    })
}

/// Rapid growth is worth more than significant growth; every other check is flat.
fn bubble_score(checks: &[Check], growth: Metric) -> u32 {
    let growth_points = if growth.holds(|g| g > 100.0) { 25 } else { 15 };
    let weights = [20, growth_points, 20, 15, 20];
    checks
        .iter()
        .zip(weights)
        .filter(|(c, _)| c.met)
        .map(|(_, w)| w)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dataset(bubble: &[f64], tech: f64) -> TrendsDataset {
        let start = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let weeks: Vec<NaiveDate> = (0..bubble.len())
            .map(|i| start + Duration::weeks(i as i64))
            .collect();
        let col = |name: &str, f: &dyn Fn(usize) -> f64| {
            TimeSeries::new(name, weeks.clone(), (0..weeks.len()).map(|i| Some(f(i))).collect())
        };
        TrendsDataset {
            columns: vec![
                col("ai_bubble", &|i| bubble[i]),
                col("ai_startup", &|i| 10.0 + i as f64 * 0.1),
                col("prompt_engineering", &|_| tech),
                col("ai_roadmap", &|_| tech),
                col("langchain", &|_| tech),
            ],
            weeks,
        }
    }

    #[test]
    fn divergence_thresholds() {
        let v = Metric::Value;
        assert_eq!(divergence_status(v(250.0), v(100.0)), Some(Divergence::Significant));
        assert_eq!(divergence_status(v(160.0), v(100.0)), Some(Divergence::Moderate));
        assert_eq!(divergence_status(v(110.0), v(100.0)), Some(Divergence::Mild));
        assert_eq!(divergence_status(v(100.0), v(100.0)), Some(Divergence::Convergent));
        assert_eq!(divergence_status(Metric::Undefined, v(1.0)), None);
    }

    #[test]
    fn lifecycle_uses_series_percentiles() {
        let weeks: Vec<NaiveDate> = (1..=5)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0].map(Some).to_vec();
        let series = TimeSeries::new("x", weeks, values);
        let (table, cuts) = lifecycle_table(&series).unwrap();
        assert_eq!(cuts[1], 3.0);
        assert_eq!(*table.classify(1.0), LifecyclePhase::Skepticism);
        assert_eq!(*table.classify(3.5), LifecyclePhase::GrowingConcern);
        assert_eq!(*table.classify(5.0), LifecyclePhase::PeakFear);
    }

    #[test]
    fn all_missing_series_is_reported() {
        let weeks = vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        let series = TimeSeries::new("empty", weeks, vec![None]);
        assert!(matches!(lifecycle_table(&series), Err(AppError::NoData(_))));
    }

    #[test]
    fn exponential_surge_scores_high() {
        let bubble: Vec<f64> = (0..80).map(|i| 1.0 + (i as f64 / 8.0).exp()).collect();
        let analysis = analyze_trends(&dataset(&bubble, 5.0), &AppConfig::default()).unwrap();

        assert_eq!(analysis.phase, Some(LifecyclePhase::PeakFear));
        assert!(analysis.bubble_growth.holds(|g| g > 100.0));
        assert_eq!(analysis.technical_growth, Metric::Value(0.0));
        assert_eq!(analysis.divergence, Some(Divergence::Significant));
        assert!(analysis.bubble_checks.iter().all(|c| c.met));
        assert_eq!(analysis.bubble_score, 100);
        // Momentum, acceleration and a significant slope; no room to grow, flat technicals.
        assert_eq!(analysis.increase_probability, 70);
        assert!(analysis.is_strong());
        assert_eq!(analysis.growth.len(), 4);
        assert!(analysis.trend.unwrap().slope > 0.0);
    }

    #[test]
    fn flat_series_scores_low() {
        let bubble = vec![10.0; 60];
        let analysis = analyze_trends(&dataset(&bubble, 5.0), &AppConfig::default()).unwrap();
        assert_eq!(analysis.bubble_growth, Metric::Value(0.0));
        assert_eq!(analysis.volatility_ratio, Metric::Undefined);
        assert_eq!(analysis.phase, Some(LifecyclePhase::PeakFear));
        // Only the phase check fires since every percentile equals the value.
        assert_eq!(analysis.bubble_score, 20);
        assert_eq!(analysis.increase_probability, 15);
        assert!(matches!(analysis.correlations[0].1, Metric::Undefined));
    }
}
