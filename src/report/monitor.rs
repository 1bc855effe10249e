use super::{section, sub_rule};
use crate::analyzer::composite::{HISTORICAL_PEAKS, MonitorResult, RiskLevel};
use crate::utils::{banner, to_title_case};
use chrono::NaiveDateTime;
use std::fmt;

fn recommendations(risk: RiskLevel) -> &'static [&'static str] {
    match risk {
        RiskLevel::Low => &[
            "Continue normal investment strategy",
            "Monitor for early warning signs",
            "Consider gradual AI exposure increase",
        ],
        RiskLevel::Moderate => &[
            "Begin portfolio rebalancing",
            "Reduce concentration in high-P/E AI stocks",
            "Increase allocation to value sectors",
        ],
        RiskLevel::High => &[
            "Implement defensive strategies",
            "Consider barbell portfolio approach",
            "Increase cash/bond allocation",
            "Take profits on speculative positions",
        ],
        RiskLevel::Extreme => &[
            "URGENT: High bubble burst risk",
            "Maximize defensive positioning",
            "Significant reduction in AI/tech exposure",
            "Increase safe haven allocations",
            "Prepare for potential 30-50% correction",
        ],
    }
}

fn timeline(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "No immediate bubble risk. Normal market conditions.",
        RiskLevel::Moderate => "Early bubble formation. Monitor closely over next 12-18 months.",
        RiskLevel::High => "Active bubble conditions. Risk of correction within 6-12 months.",
        RiskLevel::Extreme => "EXTREME bubble conditions. Correction likely within 3-6 months.",
    }
}

/// Composite dashboard report, stamped with the time it was generated.
pub struct MonitorReport<'a> {
    pub result: &'a MonitorResult,
    pub generated: NaiveDateTime,
}

impl fmt::Display for MonitorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.result;
        write!(f, "{}", banner("AI BUBBLE MONITORING DASHBOARD"))?;
        writeln!(f, "Report Date: {}", self.generated.format("%Y-%m-%d %H:%M:%S"))?;

        writeln!(f, "\nOVERALL ASSESSMENT")?;
        sub_rule(f)?;
        writeln!(f, "Composite Bubble Score: {:.1}/100", r.composite)?;
        writeln!(f, "Current Phase: {}", r.phase)?;
        writeln!(f, "Bubble Probability: {:.0}%", r.probability)?;
        writeln!(f, "Risk Level: {}", r.risk)?;

        writeln!(f, "\nINDIVIDUAL INDICATORS")?;
        sub_rule(f)?;
        for indicator in &r.indicators {
            writeln!(f, "\n{}:", to_title_case(&indicator.name))?;
            writeln!(f, "  Score: {:.1}/100", indicator.score)?;
            writeln!(f, "  Status: {}", indicator.interpretation)?;
            for figure in &indicator.figures {
                writeln!(f, "  {}: {}", figure.label, figure.value)?;
            }
        }

        writeln!(f, "\nRECOMMENDED ACTIONS")?;
        sub_rule(f)?;
        for action in recommendations(r.risk) {
            writeln!(f, "• {action}")?;
        }

        section(f, "6-MONTH PROJECTION")?;
        for (month, score) in r.projection.iter().enumerate() {
            writeln!(f, "  Month +{month}: {score:.1} (range {:.1} - {:.1})", score - 5.0, score + 5.0)?;
        }

        section(f, "HISTORICAL CONTEXT")?;
        writeln!(f, "\nFor comparison, at their peaks:")?;
        for (name, score) in HISTORICAL_PEAKS {
            writeln!(f, "• {name} bubble: Score would have been ~{score:.0}")?;
        }
        writeln!(f, "• Current AI market: Score is {:.1}", r.composite)?;

        section(f, "TIMELINE ESTIMATES")?;
        writeln!(f, "{}", timeline(r.risk))?;

        section(f, "DISCLAIMER")?;
        writeln!(f, "This analysis is for research purposes only and should not be considered")?;
        writeln!(f, "as financial advice. Consult with qualified professionals before making")?;
        writeln!(f, "investment decisions.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::composite::run_monitor;
    use crate::config::MonitorConfig;
    use chrono::NaiveDate;

    #[test]
    fn default_inputs_render_extreme_dashboard() {
        let result = run_monitor(&MonitorConfig::default()).unwrap();
        let generated = NaiveDate::from_ymd_opt(2025, 10, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let text = MonitorReport { result: &result, generated }.to_string();

        assert!(text.contains("Report Date: 2025-10-01 09:30:00"));
        assert!(text.contains("Composite Bubble Score: 81.1/100"));
        assert!(text.contains("Current Phase: Peak Formation"));
        assert!(text.contains("Risk Level: EXTREME"));
        assert!(text.contains("Search Trends:"));
        assert!(text.contains("Expert Warnings: 7"));
        assert!(text.contains("Prepare for potential 30-50% correction"));
        assert!(text.contains("Correction likely within 3-6 months"));
        assert!(text.contains("Dot-com (2000) bubble: Score would have been ~95"));
    }

    #[test]
    fn quiet_market_gets_normal_advice() {
        assert_eq!(recommendations(RiskLevel::Low).len(), 3);
        assert!(timeline(RiskLevel::Moderate).contains("12-18 months"));
    }
}
