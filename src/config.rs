use crate::model::ConfigError;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Named date window used for milestone averages in the refined analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct Milestone {
    pub label: String,
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchTrendInputs {
    pub current_level: f64,
    pub growth_rate: f64,
}

impl Default for SearchTrendInputs {
    fn default() -> Self {
        Self {
            current_level: 37.0,
            growth_rate: 254.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ValuationInputs {
    pub pe_ratios: BTreeMap<String, f64>,
    pub historical_pe: f64,
}

impl Default for ValuationInputs {
    fn default() -> Self {
        let pe_ratios = [
            ("NVIDIA", 53.0),
            ("Microsoft", 35.0),
            ("Google", 28.0),
            ("Meta", 27.0),
            ("OpenAI_implied", 100.0),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            pe_ratios,
            historical_pe: 20.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SentimentInputs {
    pub fund_manager_bubble_pct: f64,
    pub expert_warnings: u32,
    pub media_mentions: f64,
}

impl Default for SentimentInputs {
    fn default() -> Self {
        Self {
            fund_manager_bubble_pct: 54.0,
            expert_warnings: 7,
            media_mentions: 85.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FundingInputs {
    /// Quarterly venture investment in billions of dollars.
    pub quarterly_investment: f64,
    pub yoy_growth: f64,
}

impl Default for FundingInputs {
    fn default() -> Self {
        Self {
            quarterly_investment: 88.0,
            yoy_growth: 67.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConcentrationInputs {
    pub top7_market_share: f64,
    pub ai_exposure_pct: f64,
}

impl Default for ConcentrationInputs {
    fn default() -> Self {
        Self {
            top7_market_share: 35.0,
            ai_exposure_pct: 50.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoiInputs {
    pub project_failure_rate: f64,
    pub paid_user_pct: f64,
    pub revenue_multiple: f64,
}

impl Default for RoiInputs {
    fn default() -> Self {
        Self {
            project_failure_rate: 95.0,
            paid_user_pct: 10.0,
            revenue_multiple: 100.0,
        }
    }
}

/// Everything the composite monitor scores. Defaults are the reference figures.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub weights: BTreeMap<String, f64>,
    pub search: SearchTrendInputs,
    pub valuation: ValuationInputs,
    pub sentiment: SentimentInputs,
    pub funding: FundingInputs,
    pub concentration: ConcentrationInputs,
    pub roi: RoiInputs,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let weights = [
            ("search_trends", 0.15),
            ("valuation_metrics", 0.25),
            ("sentiment_analysis", 0.15),
            ("vc_funding", 0.15),
            ("market_concentration", 0.15),
            ("roi_delivery", 0.15),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            weights,
            search: SearchTrendInputs::default(),
            valuation: ValuationInputs::default(),
            sentiment: SentimentInputs::default(),
            funding: FundingInputs::default(),
            concentration: ConcentrationInputs::default(),
            roi: RoiInputs::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SectorConfig {
    pub correction_magnitude: f64,
    pub risk_tolerance: String,
}

impl Default for SectorConfig {
    fn default() -> Self {
        Self {
            correction_magnitude: 40.0,
            risk_tolerance: "moderate".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub input_csv: PathBuf,
    pub output_dir: PathBuf,
    /// Positional names for the value columns of the CSV.
    pub columns: Vec<String>,
    /// Columns averaged into the technical-adoption index.
    pub technical_columns: Vec<String>,
    pub focus_start: NaiveDate,
    pub milestones: Vec<Milestone>,
    pub monitor: MonitorConfig,
    pub sectors: SectorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        Self {
            input_csv: PathBuf::from("multiTimeline-googleTrends.csv"),
            output_dir: PathBuf::from("."),
            columns: ["ai_bubble", "ai_startup", "prompt_engineering", "ai_roadmap", "langchain"]
                .into_iter()
                .map(String::from)
                .collect(),
            technical_columns: ["prompt_engineering", "langchain", "ai_roadmap"]
                .into_iter()
                .map(String::from)
                .collect(),
            focus_start: date(2023, 1, 1),
            milestones: vec![
                Milestone {
                    label: "ChatGPT Launch Period (Dec 2022 - Jan 2023)".to_string(),
                    start: date(2022, 12, 1),
                    end: Some(date(2023, 1, 31)),
                },
                Milestone {
                    label: "GPT-4 Launch Period (Mar-Apr 2023)".to_string(),
                    start: date(2023, 3, 1),
                    end: Some(date(2023, 4, 30)),
                },
                Milestone {
                    label: "Recent Surge (May 2025 - Present)".to_string(),
                    start: date(2025, 5, 1),
                    end: None,
                },
            ],
            monitor: MonitorConfig::default(),
            sectors: SectorConfig::default(),
        }
    }
}

impl AppConfig {
    /// The column every analysis centres on.
    pub fn bubble_column(&self) -> &str {
        self.columns.first().map(String::as_str).unwrap_or("ai_bubble")
    }

    /// The milestone whose start anchors the "since GPT-4" divergence window.
    pub fn divergence_anchor(&self) -> Option<NaiveDate> {
        self.milestones.get(1).map(|m| m.start)
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Loads `path` when it exists, otherwise returns the built-in defaults.
pub fn load_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_weights_sum_to_one() {
        let total: f64 = MonitorConfig::default().weights.values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "output_dir": "out", "monitor": {{ "search": {{ "current_level": 80 }} }} }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.monitor.search.current_level, 80.0);
        assert_eq!(config.monitor.search.growth_rate, 254.0);
        assert_eq!(config.columns.len(), 5);
        assert_eq!(config.sectors.correction_magnitude, 40.0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_or_default(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.focus_start, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(load_config(file.path()), Err(ConfigError::Json(_))));
    }
}
