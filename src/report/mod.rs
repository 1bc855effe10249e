// Text reports printed to stdout, one per analysis
use crate::utils::banner;
use std::fmt;

mod monitor;
mod refined;
mod sectors;
mod trends;

pub use monitor::MonitorReport;
pub use refined::RefinedReport;
pub use sectors::SectorReport;
pub use trends::TrendsReport;

fn section(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    write!(f, "\n{}", banner(title))
}

fn mark(met: bool) -> &'static str {
    if met { "✓" } else { "✗" }
}

fn or_na(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.precision$}"))
}

fn sub_rule(f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "{}", "-".repeat(40))
}
