use super::{section, sub_rule};
use crate::analyzer::sectors::{
    OPPORTUNITIES, RiskTolerance, STRATEGIES, SectorAverage, SectorRole,
};
use crate::utils::{banner, text_bar};
use std::fmt;

const TAKEAWAYS: [(&str, [&str; 2]); 5] = [
    (
        "DEFENSIVE POSITIONING IS CRITICAL",
        [
            "History shows tech corrections spread to other sectors",
            "Consumer staples, utilities, and healthcare typically outperform",
        ],
    ),
    (
        "CASH IS A POSITION",
        [
            "Having 20-30% cash provides optionality",
            "Allows aggressive buying during capitulation",
        ],
    ),
    (
        "GEOGRAPHIC DIVERSIFICATION HELPS",
        [
            "International markets often correct less",
            "Currency effects can provide cushion",
        ],
    ),
    (
        "QUALITY MATTERS IN CORRECTIONS",
        [
            "Companies with real revenue hold up better",
            "Speculative names get hit hardest",
        ],
    ),
    (
        "TIMING IS DIFFICULT",
        [
            "Begin rotation early rather than late",
            "Don't try to catch falling knives",
        ],
    ),
];

fn arrow(role: SectorRole) -> &'static str {
    match role {
        SectorRole::Outperformer => "▲",
        SectorRole::Defensive => "►",
        SectorRole::Underperformer => "▼",
    }
}

/// Sector rotation report for one assumed correction.
pub struct SectorReport<'a> {
    pub averages: &'a [SectorAverage],
    pub magnitude: f64,
    pub projections: &'a [(&'static str, f64)],
    /// Tolerance the user configured; listed first.
    pub tolerance: RiskTolerance,
}

impl SectorReport<'_> {
    fn allocation(f: &mut fmt::Formatter<'_>, tolerance: RiskTolerance) -> fmt::Result {
        writeln!(
            f,
            "\nRecommended Allocation for {} investors:",
            tolerance.to_string().to_uppercase()
        )?;
        sub_rule(f)?;
        let allocation = tolerance.allocation();
        for (asset, pct) in &allocation {
            writeln!(f, "{asset:25}: {pct:3}% {}", text_bar(*pct as f64, 5.0))?;
        }
        let total: u32 = allocation.iter().map(|(_, pct)| pct).sum();
        writeln!(f, "{:25}: {total:3}%", "Total")
    }
}

impl fmt::Display for SectorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", banner("HISTORICAL SECTOR ROTATION PATTERNS DURING TECH CORRECTIONS"))?;
        writeln!(f, "\nAverage Sector Performance During Tech Corrections:")?;
        writeln!(f, "{}", "-".repeat(50))?;
        for avg in self.averages {
            writeln!(
                f,
                "{} {:25}: {:+6.1}%  [{}]",
                arrow(avg.role),
                avg.sector,
                avg.average,
                avg.role
            )?;
        }

        section(f, "PROJECTED SECTOR PERFORMANCE IN AI BUBBLE CORRECTION")?;
        writeln!(f, "Assumption: {:.0}% tech sector correction", self.magnitude)?;
        writeln!(f, "{}", "-".repeat(50))?;
        writeln!(f, "\nProjected Performance by Sector/Asset Class:")?;
        for (sector, perf) in self.projections {
            let direction = if *perf > 0.0 { "▲" } else { "▼" };
            writeln!(f, "{direction} {sector:25}: {perf:+6.1}% {}", text_bar(*perf, 5.0))?;
        }

        section(f, "RECOMMENDED SECTOR ROTATION STRATEGIES")?;
        for (timeframe, actions) in STRATEGIES {
            writeln!(f, "\n{timeframe}:")?;
            for (i, action) in actions.iter().enumerate() {
                writeln!(f, "  {}. {action}", i + 1)?;
            }
        }

        section(f, "SPECIFIC OPPORTUNITIES BY CATEGORY")?;
        for group in &OPPORTUNITIES {
            writeln!(f, "\n{} [{}]:", group.category, group.rating)?;
            for (name, tickers) in group.entries {
                writeln!(f, "  • {name}: {}", tickers.join(", "))?;
            }
        }

        section(f, "PORTFOLIO ALLOCATIONS BY RISK PROFILE")?;
        Self::allocation(f, self.tolerance)?;
        for tolerance in RiskTolerance::ALL.into_iter().filter(|t| *t != self.tolerance) {
            Self::allocation(f, tolerance)?;
        }

        section(f, "KEY TAKEAWAYS")?;
        for (i, (heading, points)) in TAKEAWAYS.iter().enumerate() {
            writeln!(f, "\n{}. {heading}", i + 1)?;
            for point in points {
                writeln!(f, "   - {point}")?;
            }
        }
        writeln!(f)?;
        write!(f, "{}", banner("Disclaimer: For research purposes only. Not financial advice."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::sectors::{CORRECTIONS, average_performance, project_correction};

    #[test]
    fn lists_every_section_and_totals() {
        let averages = average_performance(&CORRECTIONS).unwrap();
        let projections = project_correction(40.0);
        let report = SectorReport {
            averages: &averages,
            magnitude: 40.0,
            projections: &projections,
            tolerance: RiskTolerance::Aggressive,
        };
        let text = report.to_string();

        assert!(text.contains("Assumption: 40% tech sector correction"));
        assert!(text.contains("[OUTPERFORMER]"));
        assert!(text.contains("GLD, IAU, SGOL"));
        assert!(text.contains("1. Reduce exposure to high P/E AI stocks"));
        assert_eq!(text.matches("Total                    : 100%").count(), 3);

        let aggressive = text.find("for AGGRESSIVE investors").unwrap();
        let conservative = text.find("for CONSERVATIVE investors").unwrap();
        assert!(aggressive < conservative);
    }
}
