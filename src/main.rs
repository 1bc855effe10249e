mod analyzer;
mod chart;
mod config;
mod model;
mod normalizer;
mod parser;
mod report;
mod utils;

use analyzer::sectors::{CORRECTIONS, RiskTolerance, average_performance, project_correction};
use analyzer::stats::growth_rate;
use analyzer::{analyze_refined, analyze_trends, run_monitor};
use chrono::Local;
use clap::{Parser, Subcommand};
use config::{AppConfig, SearchTrendInputs, load_or_default};
use model::{AppError, TrendsDataset};
use parser::TrendsParser;
use report::{MonitorReport, RefinedReport, SectorReport, TrendsReport};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};

const YEAR_WEEKS: usize = 52;

#[derive(Parser, Debug)]
#[command(name = "bubble-watch", version, about = "AI bubble indicators from search-interest data")]
struct Cli {
    /// JSON config; built-in defaults are used when the file is absent
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Overrides `input_csv` from the config
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Overrides `output_dir` from the config
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// First-principles analysis of the full search history
    Trends,
    /// Post-ChatGPT analysis with milestones and refined probabilities
    Refined,
    /// Composite bubble score dashboard
    Monitor {
        /// Derive the search-trend inputs from the CSV instead of the config
        #[arg(long)]
        from_csv: bool,
    },
    /// Sector rotation during tech corrections
    Sectors,
    /// Run every analysis in order
    All,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    let mut cfg = load_or_default(&cli.config)?;
    if let Some(csv) = cli.csv {
        cfg.input_csv = csv;
    }
    if let Some(dir) = cli.output_dir {
        cfg.output_dir = dir;
    }
    info!("🚀 bubble-watch started: {:?}", cli.command);

    match cli.command {
        Command::Trends => run_trends(&cfg, &load_dataset(&cfg)?),
        Command::Refined => run_refined(&cfg, &load_dataset(&cfg)?),
        Command::Monitor { from_csv } => {
            if from_csv {
                let dataset = load_dataset(&cfg)?;
                apply_search_inputs(&mut cfg, &dataset);
            }
            run_monitor_report(&cfg)
        }
        Command::Sectors => run_sectors(&cfg),
        Command::All => {
            let dataset = load_dataset(&cfg)?;
            run_trends(&cfg, &dataset)?;
            run_refined(&cfg, &dataset)?;
            run_monitor_report(&cfg)?;
            run_sectors(&cfg)
        }
    }
}

fn load_dataset(cfg: &AppConfig) -> Result<TrendsDataset, AppError> {
    Ok(TrendsParser::new(cfg.columns.clone()).load(&cfg.input_csv)?)
}

fn run_trends(cfg: &AppConfig, dataset: &TrendsDataset) -> Result<(), AppError> {
    let analysis = analyze_trends(dataset, cfg)?;
    print!("{}", TrendsReport(&analysis));
    chart::draw_trends(&analysis, dataset, &cfg.output_dir)?;
    Ok(())
}

fn run_refined(cfg: &AppConfig, dataset: &TrendsDataset) -> Result<(), AppError> {
    let analysis = analyze_refined(dataset, cfg)?;
    print!("{}", RefinedReport(&analysis));
    chart::draw_refined(&analysis, &cfg.output_dir)?;
    Ok(())
}

fn run_monitor_report(cfg: &AppConfig) -> Result<(), AppError> {
    let result = run_monitor(&cfg.monitor)?;
    let report = MonitorReport {
        result: &result,
        generated: Local::now().naive_local(),
    };
    print!("{report}");
    chart::draw_monitor(&result, &cfg.output_dir)?;
    Ok(())
}

fn run_sectors(cfg: &AppConfig) -> Result<(), AppError> {
    let magnitude = cfg.sectors.correction_magnitude;
    let tolerance = RiskTolerance::parse(&cfg.sectors.risk_tolerance);
    let averages = average_performance(&CORRECTIONS)?;
    let projections = project_correction(magnitude);
    let report = SectorReport {
        averages: &averages,
        magnitude,
        projections: &projections,
        tolerance,
    };
    print!("{report}");
    chart::draw_sectors(&CORRECTIONS, &projections, magnitude, tolerance, &cfg.output_dir)?;
    Ok(())
}

/// Current level and 52-week growth of the bubble column, when both are computable.
fn search_inputs(dataset: &TrendsDataset, column: &str) -> Option<SearchTrendInputs> {
    let series = dataset.series(column)?;
    let current_level = series.latest()?;
    let growth = growth_rate(&series.values, YEAR_WEEKS).value()?;
    Some(SearchTrendInputs {
        current_level,
        growth_rate: growth,
    })
}

fn apply_search_inputs(cfg: &mut AppConfig, dataset: &TrendsDataset) {
    match search_inputs(dataset, cfg.bubble_column()) {
        Some(inputs) => {
            info!(
                "Search inputs from CSV: level {:.0}, growth {:.0}%",
                inputs.current_level, inputs.growth_rate
            );
            cfg.monitor.search = inputs;
        }
        None => warn!(
            "Search inputs not computable from {}, keeping configured values",
            cfg.input_csv.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};
    use crate::model::TimeSeries;

    fn dataset(values: Vec<Option<f64>>) -> TrendsDataset {
        let start = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let weeks: Vec<NaiveDate> = (0..values.len())
            .map(|i| start + Duration::weeks(i as i64))
            .collect();
        TrendsDataset {
            columns: vec![TimeSeries::new("ai_bubble", weeks.clone(), values)],
            weeks,
        }
    }

    #[test]
    fn cli_parses_global_flags_and_monitor_switch() {
        let cli = Cli::try_parse_from([
            "bubble-watch",
            "--csv",
            "data.csv",
            "--output-dir",
            "out",
            "monitor",
            "--from-csv",
        ])
        .unwrap();
        assert_eq!(cli.csv, Some(PathBuf::from("data.csv")));
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert!(matches!(cli.command, Command::Monitor { from_csv: true }));
        assert!(Cli::try_parse_from(["bubble-watch", "bogus"]).is_err());
    }

    #[test]
    fn search_inputs_follow_latest_year() {
        let mut values = vec![Some(10.0); 53];
        values[52] = Some(37.0);
        let inputs = search_inputs(&dataset(values), "ai_bubble").unwrap();
        assert_eq!(inputs.current_level, 37.0);
        assert!((inputs.growth_rate - 270.0).abs() < 1e-9);
    }

    #[test]
    fn short_history_keeps_configured_inputs() {
        let mut cfg = AppConfig::default();
        let before = cfg.monitor.search.clone();
        apply_search_inputs(&mut cfg, &dataset(vec![Some(5.0); 10]));
        assert_eq!(cfg.monitor.search, before);
    }
}
