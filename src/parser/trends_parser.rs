// Search-interest CSV parsing
use crate::model::{LoadError, TimeSeries, TrendsDataset};
use crate::utils::parse_week_date;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

pub trait Parser {
    fn parse(&self, raw: &str) -> Result<TrendsDataset, LoadError>;
}

/// Parses a weekly export: one preamble line, one header line, then
/// `week, value, value, ...` rows. Columns are named by position.
pub struct TrendsParser {
    columns: Vec<String>,
}

impl TrendsParser {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn load(&self, path: &Path) -> Result<TrendsDataset, LoadError> {
        let raw = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let dataset = self.parse(&raw)?;
        info!(
            "Loaded {} weeks x {} series from {}",
            dataset.len(),
            dataset.columns.len(),
            path.display()
        );
        Ok(dataset)
    }

    fn check_header(&self, header: &StringRecord) -> Result<(), LoadError> {
        let expected = self.columns.len() + 1;
        if header.len() != expected {
            return Err(LoadError::ColumnCount {
                expected,
                found: header.len(),
            });
        }
        Ok(())
    }
}

impl Parser for TrendsParser {
    fn parse(&self, raw: &str) -> Result<TrendsDataset, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(raw.as_bytes());

        let mut records = reader.records();
        // Preamble ("Category: ...") then the column header.
        records.next().transpose()?.ok_or(LoadError::Empty)?;
        let header = records.next().transpose()?.ok_or(LoadError::Empty)?;
        self.check_header(&header)?;

        let mut weeks: Vec<NaiveDate> = Vec::new();
        let mut values: Vec<Vec<Option<f64>>> = vec![Vec::new(); self.columns.len()];
        let mut coerced = 0usize;

        for result in records {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let date_cell = record.get(0).unwrap_or("");
            let week = parse_week_date(date_cell).ok_or_else(|| LoadError::Date {
                line,
                value: date_cell.to_string(),
            })?;
            if let Some(&previous) = weeks.last() {
                if week <= previous {
                    return Err(LoadError::NotIncreasing {
                        line,
                        week,
                        previous,
                    });
                }
            }
            weeks.push(week);

            for (idx, column) in values.iter_mut().enumerate() {
                let cell = record.get(idx + 1).unwrap_or("");
                let value = cell.parse::<f64>().ok().filter(|v| v.is_finite());
                if value.is_none() {
                    coerced += 1;
                }
                column.push(value);
            }
        }

        if weeks.is_empty() {
            return Err(LoadError::Empty);
        }
        if coerced > 0 {
            debug!("Coerced {} non-numeric cells to missing", coerced);
        }

        let columns = self
            .columns
            .iter()
            .zip(values)
            .map(|(name, vals)| TimeSeries::new(name.clone(), weeks.clone(), vals))
            .collect();

        Ok(TrendsDataset { weeks, columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "Category: All categories\n\
        \n\
        Week,ai bubble: (Worldwide),ai startup: (Worldwide)\n\
        2025-01-05,3,40\n\
        2025-01-12,<1,42\n\
        2025-01-19,5,\n\
        2025-01-26,8,45\n";

    fn parser() -> TrendsParser {
        TrendsParser::new(vec!["ai_bubble".into(), "ai_startup".into()])
    }

    #[test]
    fn parses_rows_in_order_with_missing_cells() {
        let dataset = parser().parse(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 4);
        assert!(dataset.weeks.windows(2).all(|w| w[0] < w[1]));

        let bubble = dataset.series("ai_bubble").unwrap();
        assert_eq!(bubble.values, vec![Some(3.0), None, Some(5.0), Some(8.0)]);
        let startup = dataset.series("ai_startup").unwrap();
        assert_eq!(startup.len(), 4);
        assert_eq!(startup.values[2], None);
    }

    #[test]
    fn malformed_date_aborts() {
        let raw = "Category\nWeek,a,b\n2025-01-05,1,2\nnot-a-date,1,2\n";
        let err = parser().parse(raw).unwrap_err();
        assert!(matches!(err, LoadError::Date { ref value, .. } if value == "not-a-date"));
    }

    #[test]
    fn out_of_order_weeks_abort() {
        let raw = "Category\nWeek,a,b\n2025-01-12,1,2\n2025-01-05,1,2\n";
        assert!(matches!(
            parser().parse(raw),
            Err(LoadError::NotIncreasing { .. })
        ));
    }

    #[test]
    fn header_width_must_match_columns() {
        let raw = "Category\nWeek,a\n2025-01-05,1\n";
        assert!(matches!(
            parser().parse(raw),
            Err(LoadError::ColumnCount { expected: 3, found: 2 })
        ));
    }

    #[test]
    fn header_without_rows_is_empty() {
        let raw = "Category\nWeek,a,b\n";
        assert!(matches!(parser().parse(raw), Err(LoadError::Empty)));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let dataset = parser().load(file.path()).unwrap();
        assert_eq!(dataset.columns.len(), 2);

        let missing = parser().load(Path::new("/definitely/not/here.csv"));
        assert!(matches!(missing, Err(LoadError::Io { .. })));
    }
}
