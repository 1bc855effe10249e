// Descriptive statistics over weekly series with missing cells
use crate::model::{Metric, TimeSeries};
use chrono::Datelike;
use find_peaks::PeakFinder;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Present values only.
fn present(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

/// The last `window` entries, or `None` when the history is shorter.
pub fn trailing(values: &[Option<f64>], window: usize) -> Option<&[Option<f64>]> {
    if window == 0 || window > values.len() {
        return None;
    }
    Some(&values[values.len() - window..])
}

pub fn mean(values: &[Option<f64>]) -> Metric {
    let data = present(values);
    if data.is_empty() {
        return Metric::NotComputable;
    }
    Metric::from_f64(data.iter().sum::<f64>() / data.len() as f64)
}

pub fn trailing_mean(values: &[Option<f64>], window: usize) -> Metric {
    trailing(values, window).map_or(Metric::NotComputable, mean)
}

/// Sample standard deviation (n - 1 denominator).
pub fn std_dev(values: &[Option<f64>]) -> Metric {
    let data = present(values);
    if data.len() < 2 {
        return Metric::NotComputable;
    }
    let n = data.len() as f64;
    let avg = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1.0);
    Metric::from_f64(variance.sqrt())
}

/// Standard deviation as a percentage of the mean.
pub fn coefficient_of_variation(values: &[Option<f64>]) -> Metric {
    match (std_dev(values), mean(values)) {
        (Metric::Value(_), Metric::Value(m)) if m <= 0.0 => Metric::Undefined,
        (Metric::Value(s), Metric::Value(m)) => Metric::from_f64(s / m * 100.0),
        (Metric::Value(_), other) | (other, _) => other,
    }
}

/// Largest present value and its position.
pub fn max_with_index(values: &[Option<f64>]) -> Option<(usize, f64)> {
    values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
}

/// Quantile `q` in `[0, 1]` with linear interpolation between order statistics.
pub fn percentile(values: &[Option<f64>], q: f64) -> Metric {
    let mut data = present(values);
    if data.is_empty() || !(0.0..=1.0).contains(&q) {
        return Metric::NotComputable;
    }
    data.sort_by(f64::total_cmp);
    let pos = q * (data.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Metric::from_f64(data[lo] + (data[hi] - data[lo]) * (pos - lo as f64))
}

/// `(latest / earlier - 1) * 100`, guarded against a zero base.
pub fn growth_between(earlier: Option<f64>, latest: Option<f64>) -> Metric {
    match (earlier, latest) {
        (Some(e), Some(_)) if e == 0.0 => Metric::Undefined,
        (Some(e), Some(l)) => Metric::from_f64((l / e - 1.0) * 100.0),
        _ => Metric::NotComputable,
    }
}

/// Growth of the latest value over the value `window` periods earlier.
pub fn growth_rate(values: &[Option<f64>], window: usize) -> Metric {
    let len = values.len();
    if window == 0 || window >= len {
        return Metric::NotComputable;
    }
    growth_between(values[len - 1 - window], values[len - 1])
}

/// `values[t] - values[t - periods]`, `None` where either side is missing.
pub fn diff(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if t < periods {
                return None;
            }
            Some(values[t]? - values[t - periods]?)
        })
        .collect()
}

fn rolling(
    values: &[Option<f64>],
    window: usize,
    f: impl Fn(&[f64]) -> f64,
) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|t| {
            if window == 0 || t + 1 < window {
                return None;
            }
            let slice = &values[t + 1 - window..=t];
            let full: Option<Vec<f64>> = slice.iter().copied().collect();
            full.map(|w| f(&w)).filter(|v| v.is_finite())
        })
        .collect()
}

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; values.len()];
    }
    rolling(values, window, |w| {
        let n = w.len() as f64;
        let avg = w.iter().sum::<f64>() / n;
        (w.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_err: f64,
}

impl Regression {
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Ordinary least squares of `y` on `x`.
fn least_squares(points: &[(f64, f64)]) -> Option<Regression> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    let nf = n as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / nf;
    let (mut sxx, mut sxy, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        sxx += (x - mean_x).powi(2);
        sxy += (x - mean_x) * (y - mean_y);
        syy += (y - mean_y).powi(2);
    }
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let df = nf - 2.0;

    if syy == 0.0 {
        return Some(Regression {
            slope,
            intercept,
            r_squared: 0.0,
            p_value: 1.0,
            std_err: 0.0,
        });
    }

    let r = (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0);
    let residual = (syy - slope * sxy).max(0.0);
    let std_err = (residual / df / sxx).sqrt();
    let p_value = if std_err == 0.0 {
        0.0
    } else {
        let t = slope / std_err;
        let dist = StudentsT::new(0.0, 1.0, df).ok()?;
        2.0 * (1.0 - dist.cdf(t.abs()))
    };

    Some(Regression {
        slope,
        intercept,
        r_squared: r * r,
        p_value,
        std_err,
    })
}

/// Linear fit of the trailing `window` values against their position.
pub fn linear_regression(values: &[Option<f64>], window: usize) -> Option<Regression> {
    let tail = trailing(values, window)?;
    let points: Vec<(f64, f64)> = tail
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
        .collect();
    least_squares(&points)
}

/// Weekly log growth rate: slope of `ln(y + 1)` over the trailing window.
/// Requires every value in the window to be present and positive.
pub fn log_linear_slope(values: &[Option<f64>], window: usize) -> Option<f64> {
    let tail = trailing(values, window)?;
    let points: Option<Vec<(f64, f64)>> = tail
        .iter()
        .enumerate()
        .map(|(i, v)| v.filter(|v| *v > 0.0).map(|v| (i as f64, (v + 1.0).ln())))
        .collect();
    least_squares(&points?).map(|r| r.slope)
}

/// Pearson correlation over pairwise-complete observations.
pub fn correlation(x: &[Option<f64>], y: &[Option<f64>]) -> Metric {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter_map(|(a, b)| Some(((*a)?, (*b)?)))
        .collect();
    if pairs.len() < 2 {
        return Metric::NotComputable;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let numerator: f64 = pairs.iter().map(|(a, b)| (a - mean_x) * (b - mean_y)).sum();
    let denominator_x: f64 = pairs.iter().map(|(a, _)| (a - mean_x).powi(2)).sum();
    let denominator_y: f64 = pairs.iter().map(|(_, b)| (b - mean_y).powi(2)).sum();
    let denominator = (denominator_x * denominator_y).sqrt();
    if denominator == 0.0 {
        Metric::Undefined
    } else {
        Metric::from_f64(numerator / denominator)
    }
}

/// Correlation of `x[t]` with `y[t - lag]`.
pub fn lag_correlation(x: &[Option<f64>], y: &[Option<f64>], lag: usize) -> Metric {
    if x.len() != y.len() || lag >= x.len() {
        return Metric::NotComputable;
    }
    correlation(&x[lag..], &y[..y.len() - lag])
}

/// Symmetric matrix of pairwise correlations, in column order.
pub fn correlation_matrix(columns: &[&TimeSeries]) -> Vec<Vec<Metric>> {
    columns
        .iter()
        .map(|a| {
            columns
                .iter()
                .map(|b| correlation(&a.values, &b.values))
                .collect()
        })
        .collect()
}

/// Positions of local maxima standing out by at least `prominence`, ascending.
pub fn find_peaks(values: &[Option<f64>], prominence: f64) -> Vec<usize> {
    if values.len() < 3 {
        return Vec::new();
    }
    let filled: Vec<f64> = values.iter().map(|v| v.unwrap_or(0.0)).collect();
    let mut finder = PeakFinder::new(&filled);
    finder.with_min_prominence(prominence);
    let mut peaks: Vec<usize> = finder
        .find_peaks()
        .iter()
        .map(|p| p.middle_position())
        .collect();
    peaks.sort_unstable();
    peaks
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Month,
    Quarter,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodMean {
    pub label: String,
    pub mean: Metric,
}

/// Calendar-bucket means, in chronological order.
pub fn resample(series: &TimeSeries, period: Period) -> Vec<PeriodMean> {
    let key = |d: &chrono::NaiveDate| match period {
        Period::Month => (d.year(), d.month()),
        Period::Quarter => (d.year(), (d.month() - 1) / 3 + 1),
    };
    let mut buckets: Vec<((i32, u32), Vec<Option<f64>>)> = Vec::new();
    for (week, value) in series.weeks.iter().zip(series.values.iter()) {
        let k = key(week);
        match buckets.last_mut() {
            Some((last, vals)) if *last == k => vals.push(*value),
            _ => buckets.push((k, vec![*value])),
        }
    }
    buckets
        .into_iter()
        .map(|((year, idx), vals)| PeriodMean {
            label: match period {
                Period::Month => format!("{year}-{idx:02}"),
                Period::Quarter => format!("{year} Q{idx}"),
            },
            mean: mean(&vals),
        })
        .collect()
}
