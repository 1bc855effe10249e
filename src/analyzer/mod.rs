// Analyzer module: aggregates submodules for the statistics and each analysis.

pub mod bands;
pub mod composite;
pub mod refined;
pub mod sectors;
pub mod stats;
pub mod trend_analysis;

// Re-export the analysis entry points for ease of use.
pub use composite::run_monitor;
pub use refined::analyze_refined;
pub use trend_analysis::analyze_trends;
