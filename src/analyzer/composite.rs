// Composite bubble score: per-indicator rules, weighted combination, phase tables
use crate::analyzer::bands::BandTable;
use crate::config::{
    ConcentrationInputs, FundingInputs, MonitorConfig, RoiInputs, SearchTrendInputs,
    SentimentInputs, ValuationInputs,
};
use crate::model::{AppError, BandError, IndicatorScore, KeyFigure, ScoreError};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Reference scores for past bubbles at their peaks.
pub const HISTORICAL_PEAKS: [(&str, f64); 3] = [
    ("Dot-com (2000)", 95.0),
    ("Housing (2008)", 85.0),
    ("Crypto (2021)", 75.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Indicator {
    SearchTrends,
    ValuationMetrics,
    SentimentAnalysis,
    VcFunding,
    MarketConcentration,
    RoiDelivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Concern {
    #[strum(to_string = "No bubble")]
    NoBubble,
    #[strum(to_string = "Minimal concern")]
    Minimal,
    #[strum(to_string = "Moderate concern")]
    Moderate,
    #[strum(to_string = "High concern")]
    High,
    #[strum(to_string = "Extreme bubble")]
    Extreme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BubblePhase {
    #[strum(to_string = "No Bubble")]
    NoBubble,
    #[strum(to_string = "Early Formation")]
    EarlyFormation,
    #[strum(to_string = "Middle Stage")]
    MiddleStage,
    #[strum(to_string = "Late-Middle Stage")]
    LateMiddleStage,
    #[strum(to_string = "Late Stage")]
    LateStage,
    #[strum(to_string = "Peak Formation")]
    PeakFormation,
    #[strum(to_string = "Imminent Burst Risk")]
    ImminentBurstRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

pub fn concern_table() -> Result<BandTable<Concern>, BandError> {
    BandTable::from_static(
        &[
            (20.0, Concern::NoBubble),
            (40.0, Concern::Minimal),
            (60.0, Concern::Moderate),
            (80.0, Concern::High),
        ],
        Concern::Extreme,
    )
}

pub fn phase_table() -> Result<BandTable<BubblePhase>, BandError> {
    BandTable::from_static(
        &[
            (20.0, BubblePhase::NoBubble),
            (35.0, BubblePhase::EarlyFormation),
            (50.0, BubblePhase::MiddleStage),
            (65.0, BubblePhase::LateMiddleStage),
            (80.0, BubblePhase::LateStage),
            (90.0, BubblePhase::PeakFormation),
        ],
        BubblePhase::ImminentBurstRisk,
    )
}

pub fn risk_table() -> Result<BandTable<RiskLevel>, BandError> {
    BandTable::from_static(
        &[
            (40.0, RiskLevel::Low),
            (60.0, RiskLevel::Moderate),
            (80.0, RiskLevel::High),
        ],
        RiskLevel::Extreme,
    )
}

/// Five-step score table with `top` for values at or above the last cutoff.
fn step_scores(cutoffs: [f64; 4], top: f64) -> Result<BandTable<f64>, BandError> {
    BandTable::new(
        cutoffs.into_iter().zip([20.0, 40.0, 60.0, 80.0]).collect(),
        top,
    )
}

/// Weighted sum of named sub-scores. Weights are matched by name and must
/// cover exactly the scored indicators and sum to 1.
pub fn composite(scores: &[(&str, f64)], weights: &BTreeMap<String, f64>) -> Result<f64, ScoreError> {
    let total: f64 = weights.values().sum();
    if (total - 1.0).abs() > WEIGHT_TOLERANCE {
        return Err(ScoreError::WeightSum(total));
    }
    for name in weights.keys() {
        if !scores.iter().any(|(n, _)| *n == name.as_str()) {
            return Err(ScoreError::MissingScore(name.clone()));
        }
    }
    scores.iter().try_fold(0.0, |acc, (name, score)| {
        let weight = weights
            .get(*name)
            .ok_or_else(|| ScoreError::MissingWeight(name.to_string()))?;
        Ok(acc + score * weight)
    })
}

fn indicator_score(
    indicator: Indicator,
    score: f64,
    figures: Vec<KeyFigure>,
) -> Result<IndicatorScore, BandError> {
    Ok(IndicatorScore {
        name: indicator.to_string(),
        score,
        interpretation: concern_table()?.classify(score).to_string(),
        figures,
    })
}

fn figure(label: &'static str, value: String) -> KeyFigure {
    KeyFigure { label, value }
}

pub fn search_trend_score(inputs: &SearchTrendInputs) -> Result<IndicatorScore, BandError> {
    let level_score = inputs.current_level.min(100.0);
    let growth_score = *step_scores([50.0, 100.0, 200.0, 300.0], 100.0)?.classify(inputs.growth_rate);
    indicator_score(
        Indicator::SearchTrends,
        level_score * 0.4 + growth_score * 0.6,
        vec![
            figure("Current Level", format!("{:.0}/100", inputs.current_level)),
            figure("YoY Growth", format!("{:.0}%", inputs.growth_rate)),
        ],
    )
}

pub fn valuation_score(inputs: &ValuationInputs) -> Result<IndicatorScore, BandError> {
    let n = inputs.pe_ratios.len().max(1) as f64;
    let base = inputs.historical_pe;
    let avg_deviation = inputs
        .pe_ratios
        .values()
        .map(|pe| ((pe - base) / base * 100.0).max(0.0))
        .sum::<f64>()
        / n;
    let avg_pe = inputs.pe_ratios.values().sum::<f64>() / n;
    let score = *step_scores([25.0, 50.0, 100.0, 150.0], 95.0)?.classify(avg_deviation);
    indicator_score(
        Indicator::ValuationMetrics,
        score,
        vec![
            figure("Avg P/E Ratio", format!("{avg_pe:.1}")),
            figure("Deviation from Norm", format!("{avg_deviation:.0}%")),
        ],
    )
}

pub fn sentiment_score(inputs: &SentimentInputs) -> Result<IndicatorScore, BandError> {
    let expert_score = (inputs.expert_warnings as f64 * 10.0).min(100.0);
    let score = inputs.fund_manager_bubble_pct * 0.5 + expert_score * 0.3 + inputs.media_mentions * 0.2;
    indicator_score(
        Indicator::SentimentAnalysis,
        score,
        vec![
            figure("Fund Managers (Bubble)", format!("{:.0}%", inputs.fund_manager_bubble_pct)),
            figure("Expert Warnings", inputs.expert_warnings.to_string()),
        ],
    )
}

pub fn funding_score(inputs: &FundingInputs) -> Result<IndicatorScore, BandError> {
    let table = step_scores([20.0, 40.0, 60.0, 80.0], 95.0)?;
    let investment = *table.classify(inputs.quarterly_investment);
    let growth = *table.classify(inputs.yoy_growth);
    indicator_score(
        Indicator::VcFunding,
        investment * 0.6 + growth * 0.4,
        vec![
            figure("Quarterly Investment", format!("${:.0}B", inputs.quarterly_investment)),
            figure("YoY Growth", format!("{:.0}%", inputs.yoy_growth)),
        ],
    )
}

pub fn concentration_score(inputs: &ConcentrationInputs) -> Result<IndicatorScore, BandError> {
    let share = *step_scores([20.0, 25.0, 30.0, 35.0], 95.0)?.classify(inputs.top7_market_share);
    let exposure = (inputs.ai_exposure_pct * 2.0).min(100.0);
    indicator_score(
        Indicator::MarketConcentration,
        share * 0.6 + exposure * 0.4,
        vec![
            figure("Top 7 Market Share", format!("{:.0}%", inputs.top7_market_share)),
            figure("S&P 500 AI Exposure", format!("{:.0}%", inputs.ai_exposure_pct)),
        ],
    )
}

pub fn roi_score(inputs: &RoiInputs) -> Result<IndicatorScore, BandError> {
    let multiple = *step_scores([20.0, 40.0, 60.0, 80.0], 95.0)?.classify(inputs.revenue_multiple);
    let score = inputs.project_failure_rate * 0.4 + (100.0 - inputs.paid_user_pct) * 0.3 + multiple * 0.3;
    indicator_score(
        Indicator::RoiDelivery,
        score,
        vec![
            figure("Project Failure Rate", format!("{:.0}%", inputs.project_failure_rate)),
            figure("Paid User %", format!("{:.0}%", inputs.paid_user_pct)),
        ],
    )
}

#[derive(Debug, Clone)]
pub struct MonitorResult {
    pub indicators: Vec<IndicatorScore>,
    pub composite: f64,
    pub phase: BubblePhase,
    pub probability: f64,
    pub risk: RiskLevel,
    /// Six monthly points starting at the current composite.
    pub projection: Vec<f64>,
}

impl MonitorResult {
    pub fn score_of(&self, indicator: Indicator) -> Option<f64> {
        let name = indicator.to_string();
        self.indicators.iter().find(|i| i.name == name).map(|i| i.score)
    }
}

/// Presented as a percentage; capped at 99.
pub fn bubble_probability(composite: f64) -> f64 {
    (composite * 1.1).min(99.0)
}

pub fn project_composite(composite: f64, months: usize) -> Vec<f64> {
    let step = if composite > 60.0 { 2.0 } else { 1.0 };
    (0..months).map(|i| composite + i as f64 * step).collect()
}

/// Scores every indicator and combines them into the composite assessment.
pub fn run_monitor(cfg: &MonitorConfig) -> Result<MonitorResult, AppError> {
    let indicators = vec![
        search_trend_score(&cfg.search)?,
        valuation_score(&cfg.valuation)?,
        sentiment_score(&cfg.sentiment)?,
        funding_score(&cfg.funding)?,
        concentration_score(&cfg.concentration)?,
        roi_score(&cfg.roi)?,
    ];
    let named: Vec<(&str, f64)> = indicators.iter().map(|i| (i.name.as_str(), i.score)).collect();
    let composite = composite(&named, &cfg.weights)?;

    Ok(MonitorResult {
        phase: *phase_table()?.classify(composite),
        risk: *risk_table()?.classify(composite),
        probability: bubble_probability(composite),
        projection: project_composite(composite, 6),
        indicators,
        composite,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn weights(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn weighted_example_sits_below_middle_stage() {
        let w = weights(&[("a", 0.5), ("b", 0.3), ("c", 0.2)]);
        let score = composite(&[("a", 20.0), ("b", 40.0), ("c", 60.0)], &w).unwrap();
        assert!(close(score, 34.0));
        // 34 sits under the 35 cutoff.
        assert_eq!(*phase_table().unwrap().classify(score), BubblePhase::EarlyFormation);
        assert_eq!(*phase_table().unwrap().classify(35.0), BubblePhase::MiddleStage);
    }

    #[test]
    fn order_of_scores_does_not_matter() {
        let w = weights(&[("a", 0.5), ("b", 0.3), ("c", 0.2)]);
        let forward = composite(&[("a", 20.0), ("b", 40.0), ("c", 60.0)], &w).unwrap();
        let shuffled = composite(&[("c", 60.0), ("a", 20.0), ("b", 40.0)], &w).unwrap();
        assert!(close(forward, shuffled));
    }

    #[test]
    fn composite_stays_in_range() {
        let w = weights(&[("a", 0.25), ("b", 0.25), ("c", 0.5)]);
        for a in [0.0, 50.0, 100.0] {
            for c in [0.0, 33.3, 100.0] {
                let s = composite(&[("a", a), ("b", 100.0 - a), ("c", c)], &w).unwrap();
                assert!((0.0..=100.0).contains(&s));
            }
        }
    }

    #[test]
    fn weight_mismatches_are_errors() {
        let w = weights(&[("a", 0.5), ("b", 0.4)]);
        assert!(matches!(
            composite(&[("a", 1.0), ("b", 1.0)], &w),
            Err(ScoreError::WeightSum(_))
        ));
        let w = weights(&[("a", 0.5), ("b", 0.5)]);
        assert_eq!(
            composite(&[("a", 1.0), ("z", 1.0)], &w),
            Err(ScoreError::MissingScore("b".to_string()))
        );
        assert_eq!(
            composite(&[("a", 1.0), ("b", 1.0), ("z", 1.0)], &w),
            Err(ScoreError::MissingWeight("z".to_string()))
        );
    }

    #[test]
    fn reference_inputs_reproduce_known_scores() {
        let cfg = MonitorConfig::default();
        let result = run_monitor(&cfg).unwrap();

        // 37 * 0.4 + 80 * 0.6
        assert!(close(result.score_of(Indicator::SearchTrends).unwrap(), 62.8));
        // mean deviation 115% -> 80
        assert!(close(result.score_of(Indicator::ValuationMetrics).unwrap(), 80.0));
        // 54 * 0.5 + 70 * 0.3 + 85 * 0.2
        assert!(close(result.score_of(Indicator::SentimentAnalysis).unwrap(), 65.0));
        // 95 * 0.6 + 80 * 0.4
        assert!(close(result.score_of(Indicator::VcFunding).unwrap(), 89.0));
        // 95 * 0.6 + 100 * 0.4
        assert!(close(result.score_of(Indicator::MarketConcentration).unwrap(), 97.0));
        // 95 * 0.4 + 90 * 0.3 + 95 * 0.3
        assert!(close(result.score_of(Indicator::RoiDelivery).unwrap(), 93.5));

        let expected = 0.15 * (62.8 + 65.0 + 89.0 + 97.0 + 93.5) + 0.25 * 80.0;
        assert!(close(result.composite, expected));
        assert_eq!(result.phase, BubblePhase::PeakFormation);
        assert_eq!(result.risk, RiskLevel::Extreme);
        assert!(close(result.probability, expected * 1.1));
        assert_eq!(result.projection.len(), 6);
        assert!(close(result.projection[5], expected + 10.0));
        assert_eq!(result.indicators.len(), Indicator::iter().count());
    }

    #[test]
    fn interpretations_follow_concern_bands() {
        let low = sentiment_score(&SentimentInputs {
            fund_manager_bubble_pct: 10.0,
            expert_warnings: 0,
            media_mentions: 10.0,
        })
        .unwrap();
        assert!(close(low.score, 7.0));
        assert_eq!(low.interpretation, "No bubble");
        assert_eq!(Concern::Extreme.to_string(), "Extreme bubble");
        assert_eq!(RiskLevel::Moderate.to_string(), "MODERATE");
        assert_eq!(Indicator::VcFunding.to_string(), "vc_funding");
    }

    #[test]
    fn probability_is_capped() {
        assert!(close(bubble_probability(50.0), 55.0));
        assert!(close(bubble_probability(95.0), 99.0));
        assert_eq!(project_composite(40.0, 3), vec![40.0, 41.0, 42.0]);
    }
}
