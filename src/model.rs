// Core structs: TimeSeries, TrendsDataset, Metric, IndicatorScore and the error enums
use chrono::{Datelike, NaiveDate};
use std::fmt;
use thiserror::Error;

/// A computed scalar, or the reason it could not be computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    /// Not enough history for the requested window.
    NotComputable,
    /// Division by zero or a degenerate variance.
    Undefined,
}

impl Metric {
    /// Wraps a raw float, turning NaN and infinities into `Undefined`.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Metric::Value(value)
        } else {
            Metric::Undefined
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Metric::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Metric {
        match self {
            Metric::Value(v) => Metric::from_f64(f(v)),
            other => other,
        }
    }

    /// True only when the metric holds a value satisfying `pred`.
    pub fn holds(self, pred: impl FnOnce(f64) -> bool) -> bool {
        self.value().is_some_and(pred)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Value(v) => match f.precision() {
                Some(p) if f.sign_plus() => write!(f, "{:+.*}", p, v),
                Some(p) => write!(f, "{:.*}", p, v),
                None => write!(f, "{}", v),
            },
            Metric::NotComputable => f.write_str("n/a"),
            Metric::Undefined => f.write_str("undefined"),
        }
    }
}

/// One search term (or derived index) over the weekly axis.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    pub weeks: Vec<NaiveDate>,
    pub values: Vec<Option<f64>>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, weeks: Vec<NaiveDate>, values: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(weeks.len(), values.len());
        Self {
            name: name.into(),
            weeks,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.last().copied().flatten()
    }

    pub fn latest_week(&self) -> Option<NaiveDate> {
        self.weeks.last().copied()
    }

    /// The `n`-th value counting from the end (1 = latest).
    pub fn nth_last(&self, n: usize) -> Option<f64> {
        if n == 0 {
            return None;
        }
        self.values[self.values.len().checked_sub(n)?]
    }

    /// Latest value strictly above the `n`-th from the end; false when either is missing.
    pub fn rose_over(&self, n: usize) -> bool {
        matches!((self.latest(), self.nth_last(n)), (Some(now), Some(then)) if now > then)
    }

    /// Points whose week lies in `[start, end]`; `None` leaves that side open.
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> TimeSeries {
        let (weeks, values) = self
            .weeks
            .iter()
            .zip(self.values.iter())
            .filter(|(w, _)| start.is_none_or(|s| **w >= s) && end.is_none_or(|e| **w <= e))
            .map(|(w, v)| (*w, *v))
            .unzip();
        TimeSeries::new(self.name.clone(), weeks, values)
    }

    pub fn since(&self, start: NaiveDate) -> TimeSeries {
        self.between(Some(start), None)
    }

    pub fn year(&self, year: i32) -> TimeSeries {
        let (weeks, values) = self
            .weeks
            .iter()
            .zip(self.values.iter())
            .filter(|(w, _)| w.year() == year)
            .map(|(w, v)| (*w, *v))
            .unzip();
        TimeSeries::new(self.name.clone(), weeks, values)
    }

    /// Calendar years covered by the series, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.weeks.iter().map(|w| w.year()).collect();
        years.dedup();
        years
    }
}

/// All columns of one search-interest export, sharing a week axis.
#[derive(Debug, Clone)]
pub struct TrendsDataset {
    pub weeks: Vec<NaiveDate>,
    pub columns: Vec<TimeSeries>,
}

impl TrendsDataset {
    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn series(&self, name: &str) -> Option<&TimeSeries> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Looks a column up by name, failing the run when it is absent.
    pub fn require(&self, name: &str) -> Result<&TimeSeries, LoadError> {
        self.series(name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    }

    pub fn since(&self, start: NaiveDate) -> TrendsDataset {
        let columns: Vec<TimeSeries> = self.columns.iter().map(|c| c.since(start)).collect();
        let weeks = columns
            .first()
            .map(|c| c.weeks.clone())
            .unwrap_or_default();
        TrendsDataset { weeks, columns }
    }
}

/// A single key figure shown under an indicator in the monitor report.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyFigure {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorScore {
    pub name: String,
    pub score: f64,
    pub interpretation: String,
    pub figures: Vec<KeyFigure>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("expected {expected} columns in header, found {found}")]
    ColumnCount { expected: usize, found: usize },
    #[error("line {line}: malformed date {value:?}")]
    Date { line: u64, value: String },
    #[error("line {line}: week {week} does not follow {previous}")]
    NotIncreasing {
        line: u64,
        week: NaiveDate,
        previous: NaiveDate,
    },
    #[error("no data rows found")]
    Empty,
    #[error("column {0:?} not present in dataset")]
    MissingColumn(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum BandError {
    #[error("band bound #{0} is NaN")]
    NanBound(usize),
    #[error("band bound #{index} ({bound}) is below the previous bound ({previous})")]
    Decreasing {
        index: usize,
        bound: f64,
        previous: f64,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("no weight configured for indicator {0:?}")]
    MissingWeight(String),
    #[error("weight {0:?} has no matching score")]
    MissingScore(String),
    #[error("weights sum to {0}, expected 1.0")]
    WeightSum(f64),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render {path}: {message}")]
    Render { path: String, message: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Band(#[from] BandError),
    #[error(transparent)]
    Score(#[from] ScoreError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("series {0:?} has no numeric values")]
    NoData(String),
}
