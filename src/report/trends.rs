use super::{mark, or_na, section};
use crate::analyzer::trend_analysis::TrendAnalysis;
use crate::utils::{banner, to_title_case};
use std::fmt;

/// Full-history report.
pub struct TrendsReport<'a>(pub &'a TrendAnalysis);

impl fmt::Display for TrendsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        let s = &a.series;
        write!(f, "{}", banner("AI BUBBLE ANALYSIS - FIRST PRINCIPLES APPROACH"))?;
        if let (Some(first), Some(last)) = (s.weeks.first(), s.latest_week()) {
            writeln!(f, "\nData Range: {first} to {last}")?;
        }
        writeln!(f, "Total weeks analyzed: {}", s.len())?;

        section(f, "1. TREND TRAJECTORY ANALYSIS")?;
        writeln!(f, "\n{} Search Trends:", to_title_case(&s.name))?;
        writeln!(f, "  - All-time average: {:.2}", a.mean_all)?;
        writeln!(f, "  - Last year average: {:.2}", a.mean_52)?;
        writeln!(f, "  - Last 6 months average: {:.2}", a.mean_26)?;
        writeln!(f, "  - Last 3 months average: {:.2}", a.mean_13)?;
        writeln!(f, "  - Current value (most recent): {}", or_na(a.current, 0))?;
        if let Some((week, value)) = a.peak {
            writeln!(f, "  - Peak value: {value:.0} (on {week})")?;
        }
        if !a.recent_peaks.is_empty() {
            writeln!(f, "\nMajor peaks detected at:")?;
            for (week, value) in &a.recent_peaks {
                writeln!(f, "  - {week}: Value = {value:.0}")?;
            }
        }
        writeln!(f, "\nGrowth Rates:")?;
        for (window, growth) in &a.growth {
            writeln!(f, "  - {window}-week growth: {growth:.1}%")?;
        }

        section(f, "2. CORRELATION WITH AI DEVELOPMENT INDICATORS")?;
        writeln!(f, "\nCorrelation with {} searches:", to_title_case(&s.name))?;
        for (name, r) in &a.correlations {
            writeln!(f, "  - {name}: {r:.3}")?;
        }
        writeln!(f, "\nLag Correlation Analysis (lagged indicator vs current concern):")?;
        for (lag, row) in &a.lag_correlations {
            writeln!(f, "\n  Lag {lag} weeks:")?;
            for (name, r) in row {
                writeln!(f, "    - {name}: {r:.3}")?;
            }
        }

        section(f, "3. BUBBLE LIFECYCLE PATTERN RECOGNITION")?;
        let [p25, p50, p75, p90] = a.percentiles;
        writeln!(f, "\nBubble Lifecycle Analysis:")?;
        writeln!(f, "  - 25th percentile: {p25:.1}")?;
        writeln!(f, "  - 50th percentile (median): {p50:.1}")?;
        writeln!(f, "  - 75th percentile: {p75:.1}")?;
        writeln!(f, "  - 90th percentile: {p90:.1}")?;
        writeln!(f, "  - Current value: {}", or_na(a.current, 0))?;
        if let Some(phase) = a.phase {
            writeln!(f, "  - Current Phase: {phase}")?;
        }
        writeln!(f, "\nPhase Transition Timeline:")?;
        for (year, avg, phase) in &a.yearly_phases {
            writeln!(f, "  - {year}: {phase} (avg: {avg:.1})")?;
        }

        section(f, "4. SENTIMENT VELOCITY ANALYSIS")?;
        writeln!(f, "\nMomentum Indicators:")?;
        writeln!(f, "  - Current 1-month momentum: {}", or_na(a.latest_momentum(), 1))?;
        writeln!(
            f,
            "  - Current 3-month momentum: {}",
            or_na(a.momentum_3m.last().copied().flatten(), 1)
        )?;
        writeln!(f, "  - Average 1-month momentum (last 6 months): {:.2}", a.avg_momentum)?;
        writeln!(f, "\nVolatility Analysis:")?;
        writeln!(f, "  - Historical volatility (std): {:.2}", a.volatility_historical)?;
        writeln!(f, "  - Recent volatility (last 6 months): {:.2}", a.volatility_recent)?;
        writeln!(f, "  - Volatility ratio (recent/historical): {:.2}", a.volatility_ratio)?;
        writeln!(f, "\nAcceleration Analysis:")?;
        writeln!(f, "  - Current acceleration: {}", or_na(a.acceleration, 2))?;
        writeln!(f, "  - Is accelerating: {}", a.acceleration.is_some_and(|x| x > 0.0))?;

        section(f, "5. TECHNICAL MATURITY VS HYPE DIVERGENCE")?;
        writeln!(f, "\n6-Month Growth Comparison:")?;
        writeln!(f, "  - Bubble searches: {:.1}%", a.bubble_growth)?;
        writeln!(f, "  - Technical indicators (avg): {:.1}%", a.technical_growth)?;
        writeln!(f, "  - Startup searches: {:.1}%", a.startup_growth)?;
        let gap = match (a.bubble_growth.value(), a.technical_growth.value()) {
            (Some(b), Some(t)) => format!("{:.1}%", b - t),
            _ => "n/a".to_string(),
        };
        writeln!(f, "  - Divergence (Bubble - Technical): {gap}")?;
        if let Some(divergence) = a.divergence {
            writeln!(f, "\nDivergence Analysis:")?;
            writeln!(f, "  - Status: {divergence} - {}", divergence.describe())?;
        }

        section(f, "6. PREDICTIVE MODELING & TREND PROJECTION")?;
        match a.trend {
            Some(fit) => {
                writeln!(f, "\nLinear Trend Analysis (Last Year):")?;
                writeln!(f, "  - Slope: {:.3} (points per week)", fit.slope)?;
                writeln!(f, "  - R-squared: {:.3}", fit.r_squared)?;
                writeln!(f, "  - P-value: {:.6}", fit.p_value)?;
                let significance = if fit.is_significant(0.05) { "Significant" } else { "Not significant" };
                writeln!(f, "  - Trend significance: {significance}")?;
            }
            None => writeln!(f, "\nLinear Trend Analysis: not enough history")?,
        }
        if let Some(rate) = a.exp_rate {
            writeln!(f, "\nExponential Growth Analysis (Last 6 Months):")?;
            writeln!(f, "  - Exponential growth rate: {rate:.4}")?;
            writeln!(f, "  - Weekly growth %: {:.2}%", (rate.exp() - 1.0) * 100.0)?;
        }
        writeln!(f, "\n3-Month Projections:")?;
        writeln!(f, "  - Linear projection: {:.1}", a.linear_projection)?;
        writeln!(f, "  - Exponential projection: {:.1}", a.exp_projection)?;
        writeln!(f, "  - Current value: {}", or_na(a.current, 0))?;

        section(f, "FINAL SYNTHESIS & PROBABILITY ASSESSMENT")?;
        writeln!(f, "\nBubble Indicators Assessment:")?;
        for check in &a.bubble_checks {
            writeln!(f, "  {} {}", mark(check.met), check.text)?;
        }
        writeln!(f, "\nBUBBLE PROBABILITY SCORE: {}/100", a.bubble_score)?;
        writeln!(f, "\nPROBABILITY OF TREND INCREASE: {}%", a.increase_probability)?;

        section(f, "FINAL VERDICT")?;
        let reasoning = if a.increase_probability > 50 {
            "The trend shows significant upward momentum with positive acceleration."
        } else {
            "The trend shows signs of potential stabilization."
        };
        let trajectory = if a.trend.is_some_and(|t| t.slope > 0.0) {
            "continued growth"
        } else {
            "potential plateau"
        };
        let pace = if a.outpaces_technical() { "significantly outpacing" } else { "roughly tracking with" };
        let pattern = if a.bubble_score > 60 {
            "a classic bubble fear cycle"
        } else {
            "growing but measured concern"
        };
        writeln!(f, "\n1. ARE WE IN AN AI BUBBLE?")?;
        writeln!(f, "   Probability: {}%", a.bubble_score)?;
        writeln!(f, "\n2. WILL BUBBLE SEARCHES CONTINUE TO INCREASE?")?;
        writeln!(f, "   Probability: {}%", a.increase_probability)?;
        writeln!(f, "   Reasoning: {reasoning}")?;
        writeln!(f, "   The current trajectory suggests {trajectory} in the near term.")?;
        writeln!(f, "\n3. KEY INSIGHTS:")?;
        writeln!(f, "   - Bubble concerns are {pace} actual technical development")?;
        writeln!(f, "   - The pattern resembles {pattern}")?;
        if let Some(phase) = a.phase {
            writeln!(f, "   - Current phase: {phase}")?;
        }
        let conclusion = if a.is_strong() {
            "Strong evidence suggests we are IN an AI bubble awareness phase, with high probability of continued search growth."
        } else {
            "Moderate evidence of bubble concerns, but not yet at critical levels."
        };
        writeln!(f, "\nCONCLUSION: {conclusion}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::trend_analysis::analyze_trends;
    use crate::config::AppConfig;
    use crate::model::{TimeSeries, TrendsDataset};
    use chrono::{Duration, NaiveDate};

    #[test]
    fn renders_every_section() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        let weeks: Vec<NaiveDate> = (0..60).map(|i| start + Duration::weeks(i)).collect();
        let column = |name: &str, f: fn(usize) -> f64| {
            TimeSeries::new(name, weeks.clone(), (0..60).map(|i| Some(f(i))).collect())
        };
        let dataset = TrendsDataset {
            columns: vec![
                column("ai_bubble", |i| 1.0 + (i % 7) as f64 + i as f64 * 0.5),
                column("ai_startup", |i| 20.0 + (i % 5) as f64),
                column("prompt_engineering", |i| 30.0 + (i % 3) as f64),
                column("ai_roadmap", |_| 4.0),
                column("langchain", |i| 10.0 + (i % 4) as f64),
            ],
            weeks,
        };
        let analysis = analyze_trends(&dataset, &AppConfig::default()).unwrap();
        let text = TrendsReport(&analysis).to_string();

        for heading in [
            "1. TREND TRAJECTORY ANALYSIS",
            "3. BUBBLE LIFECYCLE PATTERN RECOGNITION",
            "5. TECHNICAL MATURITY VS HYPE DIVERGENCE",
            "FINAL VERDICT",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("Lag 12 weeks:"));
        assert!(text.contains("52-week growth:"));
        assert!(text.contains(&format!("BUBBLE PROBABILITY SCORE: {}/100", analysis.bubble_score)));
        assert!(text.contains("Total weeks analyzed: 60"));
    }
}
