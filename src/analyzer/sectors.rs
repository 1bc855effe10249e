// Sector behaviour during past tech corrections and projections for the next one
use crate::analyzer::bands::BandTable;
use crate::model::BandError;
use strum_macros::Display;

pub struct Correction {
    pub name: &'static str,
    pub tech_performance: f64,
    pub sector_performance: &'static [(&'static str, f64)],
}

pub const CORRECTIONS: [Correction; 4] = [
    Correction {
        name: "Dot-com Crash (2000-2002)",
        tech_performance: -78.0,
        sector_performance: &[
            ("Technology", -78.0),
            ("Consumer Discretionary", -45.0),
            ("Financials", -35.0),
            ("Healthcare", -20.0),
            ("Industrials", -30.0),
            ("Energy", 15.0),
            ("Utilities", 10.0),
            ("Consumer Staples", 5.0),
            ("Real Estate", 8.0),
            ("Materials", -10.0),
            ("Gold/Precious Metals", 25.0),
        ],
    },
    Correction {
        name: "Financial Crisis (2008-2009)",
        tech_performance: -55.0,
        sector_performance: &[
            ("Technology", -55.0),
            ("Financials", -83.0),
            ("Consumer Discretionary", -54.0),
            ("Industrials", -57.0),
            ("Energy", -56.0),
            ("Materials", -60.0),
            ("Healthcare", -39.0),
            ("Consumer Staples", -29.0),
            ("Utilities", -38.0),
            ("Real Estate", -68.0),
            ("Gold/Precious Metals", 25.0),
        ],
    },
    Correction {
        name: "COVID Crash (2020)",
        tech_performance: -30.0,
        sector_performance: &[
            ("Technology", -30.0),
            ("Energy", -65.0),
            ("Financials", -40.0),
            ("Industrials", -38.0),
            ("Real Estate", -35.0),
            ("Materials", -33.0),
            ("Utilities", -30.0),
            ("Consumer Discretionary", -28.0),
            ("Healthcare", -23.0),
            ("Consumer Staples", -20.0),
            ("Gold/Precious Metals", 5.0),
        ],
    },
    Correction {
        name: "Tech Correction (2022)",
        tech_performance: -35.0,
        sector_performance: &[
            ("Technology", -35.0),
            ("Consumer Discretionary", -37.0),
            ("Real Estate", -28.0),
            ("Financials", -12.0),
            ("Materials", -14.0),
            ("Industrials", -7.0),
            ("Healthcare", -5.0),
            ("Consumer Staples", -3.0),
            ("Utilities", 2.0),
            ("Energy", 48.0),
            ("Gold/Precious Metals", -5.0),
        ],
    },
];

impl Correction {
    pub fn performance(&self, sector: &str) -> Option<f64> {
        self.sector_performance
            .iter()
            .find(|(s, _)| *s == sector)
            .map(|(_, p)| *p)
    }

    /// Episode name without the date range in parentheses.
    pub fn short_name(&self) -> &'static str {
        self.name.split('(').next().unwrap_or(self.name).trim()
    }
}

/// Multipliers applied to the tech drawdown magnitude.
pub const PROJECTION_MULTIPLIERS: [(&str, f64); 13] = [
    ("AI/Tech Leaders", -1.2),
    ("Broader Technology", -1.0),
    ("Consumer Discretionary", -0.8),
    ("Financials", -0.6),
    ("Industrials", -0.5),
    ("Healthcare", -0.3),
    ("Consumer Staples", -0.2),
    ("Utilities", 0.1),
    ("Energy", 0.2),
    ("Gold/Precious Metals", 0.3),
    ("Value Stocks", -0.25),
    ("International (Non-US)", -0.4),
    ("Bonds/Treasuries", 0.15),
];

pub const STRATEGIES: [(&str, &[&str]); 4] = [
    (
        "Immediate Actions (Now)",
        &[
            "Reduce exposure to high P/E AI stocks (NVIDIA, AI startups)",
            "Take profits on stocks up >100% in past year",
            "Rotate into defensive sectors (Staples, Utilities, Healthcare)",
            "Increase allocation to value stocks (P/E < 20)",
            "Add international diversification (Europe, Asia)",
            "Consider gold/precious metals allocation (5-10%)",
        ],
    ),
    (
        "3-Month Strategy",
        &[
            "Monitor tech earnings for disappointments",
            "Build cash position for opportunities (20-30%)",
            "Research quality tech names for post-correction buying",
            "Increase bond allocation if yields rise",
            "Focus on companies with real AI revenue (not promises)",
        ],
    ),
    (
        "6-Month Strategy",
        &[
            "Prepare shopping list of quality AI stocks",
            "Look for 30-50% discounts from peaks",
            "Begin selective re-entry into tech leaders",
            "Maintain defensive tilt until stabilization",
            "Watch for capitulation indicators",
        ],
    ),
    (
        "Post-Correction (12+ months)",
        &[
            "Aggressive re-entry into quality tech",
            "Focus on AI infrastructure plays",
            "Identify next-generation AI winners",
            "Reduce defensive positions",
            "Return to growth-oriented allocation",
        ],
    ),
];

pub struct OpportunityGroup {
    pub category: &'static str,
    pub rating: &'static str,
    pub entries: &'static [(&'static str, &'static [&'static str])],
}

pub const OPPORTUNITIES: [OpportunityGroup; 5] = [
    OpportunityGroup {
        category: "Safe Haven Assets",
        rating: "DEFENSIVE",
        entries: &[
            ("Gold ETFs", &["GLD", "IAU", "SGOL"]),
            ("Treasury Bonds", &["TLT", "IEF", "SHY"]),
            ("Cash Equivalents", &["Money Market Funds", "T-Bills"]),
        ],
    },
    OpportunityGroup {
        category: "Defensive Sectors",
        rating: "RESILIENT",
        entries: &[
            ("Consumer Staples", &["XLP", "VDC", "PG", "KO", "PEP"]),
            ("Utilities", &["XLU", "VPU", "NEE", "DUK"]),
            ("Healthcare", &["XLV", "VHT", "JNJ", "UNH", "PFE"]),
        ],
    },
    OpportunityGroup {
        category: "Value Opportunities",
        rating: "VALUE PLAYS",
        entries: &[
            ("Financial Value", &["JPM", "BAC", "WFC", "BRK.B"]),
            ("Energy", &["XLE", "VDE", "XOM", "CVX"]),
            ("International Value", &["VEA", "EFA", "VWO"]),
        ],
    },
    OpportunityGroup {
        category: "Contrarian Plays",
        rating: "CONTRARIAN",
        entries: &[
            ("Beaten-down Quality Tech", &["INTC", "IBM", "CSCO"]),
            ("Non-AI Growth", &["Healthcare innovation", "Clean energy"]),
            ("Small-cap Value", &["IWM", "VB"]),
        ],
    },
    OpportunityGroup {
        category: "Post-Correction Shopping List",
        rating: "FUTURE LEADERS",
        entries: &[
            ("Quality AI Infrastructure", &["MSFT", "GOOGL", "AMZN"]),
            ("Semiconductor Leaders", &["NVDA (after 40%+ drop)", "AMD"]),
            ("AI Software", &["SNOW", "MDB", "PLTR"]),
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SectorRole {
    Underperformer,
    Defensive,
    Outperformer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorAverage {
    pub sector: &'static str,
    pub average: f64,
    pub role: SectorRole,
}

/// Gains outperform; losses shallower than 20% are defensive. Flat is defensive.
fn role_table() -> Result<BandTable<SectorRole>, BandError> {
    BandTable::from_static_inclusive(
        &[
            (-20.0, SectorRole::Underperformer),
            (0.0, SectorRole::Defensive),
        ],
        SectorRole::Outperformer,
    )
}

fn classify_role(average: f64) -> Result<SectorRole, BandError> {
    Ok(*role_table()?.classify(average))
}

/// Unweighted mean per sector over the episodes that report it, best first.
pub fn average_performance(corrections: &[Correction]) -> Result<Vec<SectorAverage>, BandError> {
    let mut sectors: Vec<&'static str> = Vec::new();
    for correction in corrections {
        for (sector, _) in correction.sector_performance {
            if !sectors.contains(sector) {
                sectors.push(*sector);
            }
        }
    }

    let mut averages = sectors
        .into_iter()
        .map(|sector| {
            let values: Vec<f64> = corrections
                .iter()
                .filter_map(|c| c.performance(sector))
                .collect();
            let average = values.iter().sum::<f64>() / values.len().max(1) as f64;
            Ok(SectorAverage {
                sector,
                average,
                role: classify_role(average)?,
            })
        })
        .collect::<Result<Vec<_>, BandError>>()?;
    averages.sort_by(|a, b| b.average.total_cmp(&a.average));
    Ok(averages)
}

/// Scales a tech drawdown of `magnitude` percent by the fixed multipliers, best first.
pub fn project_correction(magnitude: f64) -> Vec<(&'static str, f64)> {
    let mut projections: Vec<(&'static str, f64)> = PROJECTION_MULTIPLIERS
        .iter()
        .map(|(sector, m)| (*sector, magnitude * m))
        .collect();
    projections.sort_by(|a, b| b.1.total_cmp(&a.1));
    projections
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RiskTolerance {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskTolerance {
    pub const ALL: [RiskTolerance; 3] = [
        RiskTolerance::Conservative,
        RiskTolerance::Moderate,
        RiskTolerance::Aggressive,
    ];

    /// Unknown names fall back to `Moderate`.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "conservative" => RiskTolerance::Conservative,
            "aggressive" => RiskTolerance::Aggressive,
            _ => RiskTolerance::Moderate,
        }
    }

    /// Target allocation in percent, largest first.
    pub fn allocation(self) -> Vec<(&'static str, u32)> {
        let table: &[(&'static str, u32)] = match self {
            RiskTolerance::Conservative => &[
                ("Cash/T-Bills", 30),
                ("Bonds/Treasuries", 30),
                ("Defensive Sectors", 20),
                ("International", 10),
                ("Gold", 10),
                ("Tech/Growth", 0),
            ],
            RiskTolerance::Moderate => &[
                ("Cash/T-Bills", 20),
                ("Bonds/Treasuries", 20),
                ("Defensive Sectors", 25),
                ("Value Stocks", 15),
                ("International", 10),
                ("Gold", 5),
                ("Tech/Growth", 5),
            ],
            RiskTolerance::Aggressive => &[
                ("Cash/T-Bills", 10),
                ("Bonds/Treasuries", 10),
                ("Defensive Sectors", 15),
                ("Value Stocks", 20),
                ("International", 15),
                ("Beaten-down Tech", 20),
                ("Gold", 5),
                ("High-Risk AI", 5),
            ],
        };
        let mut allocation = table.to_vec();
        // Stable sort keeps the table order among equal weights.
        allocation.sort_by(|a, b| b.1.cmp(&a.1));
        allocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn averages_cover_every_sector_best_first() {
        let averages = average_performance(&CORRECTIONS).unwrap();
        assert_eq!(averages.len(), 11);
        assert!(averages.windows(2).all(|w| w[0].average >= w[1].average));

        let gold = averages.iter().find(|a| a.sector == "Gold/Precious Metals").unwrap();
        assert!(close(gold.average, 12.5));
        assert_eq!(gold.role, SectorRole::Outperformer);
        assert_eq!(averages[0].sector, "Gold/Precious Metals");

        let tech = averages.iter().find(|a| a.sector == "Technology").unwrap();
        assert!(close(tech.average, -49.5));
        assert_eq!(tech.role, SectorRole::Underperformer);

        let staples = averages.iter().find(|a| a.sector == "Consumer Staples").unwrap();
        assert!(close(staples.average, -11.75));
        assert_eq!(staples.role, SectorRole::Defensive);
    }

    #[test]
    fn role_boundaries() {
        assert_eq!(classify_role(0.1).unwrap(), SectorRole::Outperformer);
        assert_eq!(classify_role(0.0).unwrap(), SectorRole::Defensive);
        assert_eq!(classify_role(-19.9).unwrap(), SectorRole::Defensive);
        assert_eq!(classify_role(-20.0).unwrap(), SectorRole::Underperformer);
    }

    #[test]
    fn projection_scales_by_magnitude() {
        let projected = project_correction(40.0);
        assert_eq!(projected.len(), 13);
        assert_eq!(projected[0].0, "Gold/Precious Metals");
        assert!(close(projected[0].1, 12.0));
        let (last, value) = projected[projected.len() - 1];
        assert_eq!(last, "AI/Tech Leaders");
        assert!(close(value, -48.0));
    }

    #[test]
    fn allocations_total_one_hundred() {
        for tolerance in RiskTolerance::ALL {
            let total: u32 = tolerance.allocation().iter().map(|(_, p)| p).sum();
            assert_eq!(total, 100, "{tolerance}");
        }
        assert_eq!(RiskTolerance::parse("reckless"), RiskTolerance::Moderate);
        assert_eq!(RiskTolerance::parse(" Aggressive "), RiskTolerance::Aggressive);
        assert_eq!(RiskTolerance::Moderate.allocation()[0], ("Defensive Sectors", 25));
    }

    #[test]
    fn short_names_drop_date_range() {
        assert_eq!(CORRECTIONS[0].short_name(), "Dot-com Crash");
        assert_eq!(CORRECTIONS[1].performance("Financials"), Some(-83.0));
        assert_eq!(CORRECTIONS[1].performance("Crypto"), None);
    }
}
