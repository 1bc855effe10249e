// Derived composite series built from the loaded columns
use crate::model::{LoadError, TimeSeries, TrendsDataset};

/// Per-week mean of the present values across `series`; `None` when all are missing.
pub fn row_mean(name: &str, series: &[&TimeSeries]) -> TimeSeries {
    let weeks = series.first().map(|s| s.weeks.clone()).unwrap_or_default();
    let values = (0..weeks.len())
        .map(|row| {
            let present: Vec<f64> = series.iter().filter_map(|s| s.values[row]).collect();
            if present.is_empty() {
                None
            } else {
                Some(present.iter().sum::<f64>() / present.len() as f64)
            }
        })
        .collect();
    TimeSeries::new(name, weeks, values)
}

/// Per-week mean requiring every input to be present.
pub fn strict_mean(name: &str, series: &[&TimeSeries]) -> TimeSeries {
    let weeks = series.first().map(|s| s.weeks.clone()).unwrap_or_default();
    let values = (0..weeks.len())
        .map(|row| {
            let all: Option<Vec<f64>> = series.iter().map(|s| s.values[row]).collect();
            all.filter(|v| !v.is_empty())
                .map(|v| v.iter().sum::<f64>() / v.len() as f64)
        })
        .collect();
    TimeSeries::new(name, weeks, values)
}

/// Average of the technical-adoption columns.
pub fn technical_index(dataset: &TrendsDataset, columns: &[String]) -> Result<TimeSeries, LoadError> {
    let series = columns
        .iter()
        .map(|c| dataset.require(c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(row_mean("technical_index", &series))
}

/// Average of bubble concern and startup interest.
pub fn hype_index(dataset: &TrendsDataset, bubble: &str, startup: &str) -> Result<TimeSeries, LoadError> {
    let series = [dataset.require(bubble)?, dataset.require(startup)?];
    Ok(strict_mean("hype_index", &series))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dataset() -> TrendsDataset {
        let weeks: Vec<NaiveDate> = (1..=3)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d * 7).unwrap())
            .collect();
        let col = |name: &str, v: [Option<f64>; 3]| TimeSeries::new(name, weeks.clone(), v.to_vec());
        TrendsDataset {
            columns: vec![
                col("ai_bubble", [Some(2.0), None, Some(6.0)]),
                col("ai_startup", [Some(4.0), Some(8.0), Some(10.0)]),
                col("langchain", [None, None, Some(1.0)]),
            ],
            weeks,
        }
    }

    #[test]
    fn row_mean_skips_missing_cells() {
        let ds = dataset();
        let index = technical_index(&ds, &["ai_bubble".into(), "langchain".into()]).unwrap();
        assert_eq!(index.values, vec![Some(2.0), None, Some(3.5)]);
        assert_eq!(index.name, "technical_index");
    }

    #[test]
    fn strict_mean_needs_every_input() {
        let ds = dataset();
        let hype = hype_index(&ds, "ai_bubble", "ai_startup").unwrap();
        assert_eq!(hype.values, vec![Some(3.0), None, Some(8.0)]);
    }

    #[test]
    fn unknown_column_is_reported() {
        let ds = dataset();
        assert!(matches!(
            technical_index(&ds, &["missing".into()]),
            Err(LoadError::MissingColumn(_))
        ));
    }
}
