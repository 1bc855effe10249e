use super::{mark, or_na, section};
use crate::analyzer::refined::RefinedAnalysis;
use crate::model::Metric;
use crate::utils::{banner, text_bar, to_title_case};
use std::fmt;

pub struct RefinedReport<'a>(pub &'a RefinedAnalysis);

impl fmt::Display for RefinedReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.0;
        let s = &a.series;
        write!(f, "{}", banner("AI BUBBLE ANALYSIS - REFINED POST-CHATGPT ERA FOCUS"))?;
        if let (Some(first), Some(last)) = (s.weeks.first(), s.latest_week()) {
            writeln!(f, "\nAnalysis Period: {first} to {last}")?;
        }
        writeln!(f, "Weeks analyzed: {}", s.len())?;

        section(f, "1. CRITICAL PERIODS ANALYSIS")?;
        writeln!(f, "\nKey AI Development Milestones & Bubble Response:")?;
        for milestone in &a.milestones {
            writeln!(f, "\n{}:", milestone.label)?;
            for (name, mean) in &milestone.means {
                writeln!(f, "  - {}: {mean:.1}", to_title_case(name))?;
            }
        }

        section(f, "2. BUBBLE EVOLUTION PHASES (Monthly Averages)")?;
        writeln!(f, "\nMonthly Phase Progression (Last 12 months):")?;
        for month in &a.monthly_phases {
            let bar = text_bar(month.mean, 2.0);
            writeln!(f, "  {}: {bar:<20} {:5.1} - {}", month.label, month.mean, month.phase)?;
        }

        section(f, "3. YEAR-OVER-YEAR COMPARISON")?;
        for year in &a.years {
            writeln!(f, "\n{} Statistics:", year.year)?;
            writeln!(f, "  - AI Bubble avg: {:.2}", year.bubble_mean)?;
            writeln!(f, "  - AI Bubble max: {}", or_na(year.bubble_max, 0))?;
            writeln!(f, "  - Prompt Engineering avg: {:.1}", year.prompt_mean)?;
            writeln!(f, "  - AI Startup avg: {:.1}", year.startup_mean)?;
        }

        section(f, "4. ACCELERATION ANALYSIS (Post-2023)")?;
        writeln!(f, "\nQuarter-over-Quarter Growth in AI Bubble Searches:")?;
        for (quarter, growth) in &a.qoq_growth {
            let direction = if *growth > 0.0 { "↑" } else { "↓" };
            writeln!(f, "  {quarter}: {direction} {:.1}%", growth.abs())?;
        }

        section(f, "5. VOLATILITY & STABILITY ANALYSIS")?;
        writeln!(f, "\nVolatility Analysis (Coefficient of Variation):")?;
        for v in &a.volatility {
            writeln!(f, "  {}: {:.1}% - {}", v.label, v.cv, v.stability)?;
        }

        section(f, "6. BUBBLE vs REALITY CHECK (Post-2023 Correlations)")?;
        writeln!(f, "\nCorrelation Analysis:")?;
        for row in &a.correlations {
            match row.strength {
                Some(strength) => writeln!(f, "  {}: {:.3} ({strength})", row.label, row.r)?,
                None => writeln!(f, "  {}: {:.3}", row.label, row.r)?,
            }
        }

        section(f, "7. DIVERGENCE ANALYSIS: HYPE vs FUNDAMENTALS")?;
        for window in &a.divergences {
            writeln!(f, "\n{}:", window.label)?;
            writeln!(f, "  - Bubble concern growth: {:.1}%", window.bubble_growth)?;
            writeln!(f, "  - Technical growth: {:.1}%", window.technical_growth)?;
            writeln!(f, "  - Divergence: {:+.1}%", window.divergence())?;
            if window.is_warning() {
                writeln!(f, "  - WARNING: Significant divergence detected!")?;
            }
        }

        section(f, "8. PATTERN RECOGNITION & BUBBLE INDICATORS")?;
        writeln!(f, "\nBubble Indicator Checklist:")?;
        for check in &a.checklist {
            writeln!(f, "  {} {}", mark(check.met), check.text)?;
        }

        section(f, "9. PREDICTIVE ANALYSIS")?;
        match (a.projection, a.current) {
            (Some(p), Some(current)) => {
                writeln!(f, "\nBased on 8-week trend:")?;
                writeln!(f, "  - Average weekly change: {:+.2}", p.weekly_change)?;
                writeln!(f, "  - Current value: {current:.0}")?;
                writeln!(f, "  - 4-week projection: {:.0}", p.four_week)?;
                let momentum = if p.accelerating { "Accelerating" } else { "Stabilizing" };
                writeln!(f, "  - Momentum: {momentum}")?;
            }
            _ => writeln!(f, "\nNot enough recent history for a projection.")?,
        }

        section(f, "10. FINAL PROBABILITY ASSESSMENT")?;
        writeln!(f, "\nIncrease factors:")?;
        for factor in &a.increase_factors {
            writeln!(f, "  {} {}", mark(factor.met), factor.text)?;
        }
        writeln!(f, "\nBUBBLE PROBABILITY: {}%", a.bubble_probability())?;
        writeln!(f, "SEARCH INCREASE PROBABILITY: {}%", a.increase_probability())?;

        section(f, "FINAL VERDICT - DATA-DRIVEN CONCLUSION")?;
        writeln!(f, "\n1. AI BUBBLE STATUS:")?;
        writeln!(f, "   Probability: {}%", a.bubble_probability())?;
        if let Metric::Value(ratio) = a.year_ratio {
            writeln!(f, "   The data shows a {ratio:.1}x change between the last two yearly averages.")?;
        }
        writeln!(
            f,
            "   We are {} in an AI bubble awareness phase.",
            a.status_word()
        )?;
        writeln!(f, "\n2. FUTURE TREND PROJECTION:")?;
        writeln!(f, "   Probability of Increase: {}%", a.increase_probability())?;
        writeln!(f, "   Recent momentum suggests searches will {}.", a.outlook())?;
        if let Some(p) = a.projection {
            writeln!(f, "   The 8-week trend shows {:+.1} points/week average change.", p.weekly_change)?;
        }
        writeln!(f, "\n3. KEY FINDINGS:")?;
        if let Some((week, value)) = a.peak {
            writeln!(f, "   - Peak bubble searches reached {value:.0} (week of {week})")?;
        }
        let finding = if a.bubble_probability() >= 80 {
            "CRITICAL: Significant divergence between bubble fears and technical fundamentals"
        } else {
            "Bubble concerns tracking with broader AI development"
        };
        writeln!(f, "   - {finding}")?;
        writeln!(f, "\n4. CONFIDENCE LEVEL: {}", a.confidence())?;
        writeln!(f, "   Dashboard status: {}", a.alert_status())?;
        writeln!(f, "\nCONCLUSION: We are {}", a.conclusion())
    }
}
