use serde::{Deserialize, Serialize};

/// Score given to a missing profile or an unrecognised factor value.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Annual revenue band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RevenueSizeBand {
    #[serde(rename = "UNDER_500K")]
    Under500k,
    #[serde(rename = "500K_TO_1M")]
    From500kTo1m,
    #[serde(rename = "1M_TO_3M")]
    From1mTo3m,
    #[serde(rename = "3M_TO_10M")]
    From3mTo10m,
    #[serde(rename = "10M_TO_25M")]
    From10mTo25m,
    #[serde(rename = "OVER_25M")]
    Over25m,
    #[serde(other, rename = "UNKNOWN")]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RevenueModel {
    ProjectBased,
    Transactional,
    RecurringContracts,
    Subscription,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LaborIntensity {
    VeryHigh,
    High,
    Moderate,
    Low,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetIntensity {
    AssetHeavy,
    Moderate,
    AssetLight,
    #[serde(other)]
    Unknown,
}

/// How much the business depends on its owner day to day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OwnerInvolvement {
    Critical,
    High,
    Moderate,
    Low,
    Minimal,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrossMarginBand {
    #[serde(rename = "UNDER_30")]
    Under30,
    #[serde(rename = "30_TO_50")]
    From30To50,
    #[serde(rename = "50_TO_70")]
    From50To70,
    #[serde(rename = "OVER_70")]
    Over70,
    #[serde(other, rename = "UNKNOWN")]
    Unknown,
}

// One table per factor. Every valuation path reads these and nothing else.

impl RevenueSizeBand {
    pub fn score(self) -> f64 {
        match self {
            RevenueSizeBand::Under500k => 0.2,
            RevenueSizeBand::From500kTo1m => 0.4,
            RevenueSizeBand::From1mTo3m => 0.6,
            RevenueSizeBand::From3mTo10m => 0.8,
            RevenueSizeBand::From10mTo25m => 0.9,
            RevenueSizeBand::Over25m => 1.0,
            RevenueSizeBand::Unknown => NEUTRAL_SCORE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RevenueSizeBand::Under500k => "under $500K",
            RevenueSizeBand::From500kTo1m => "$500K-$1M",
            RevenueSizeBand::From1mTo3m => "$1M-$3M",
            RevenueSizeBand::From3mTo10m => "$3M-$10M",
            RevenueSizeBand::From10mTo25m => "$10M-$25M",
            RevenueSizeBand::Over25m => "over $25M",
            RevenueSizeBand::Unknown => "unknown",
        }
    }
}

impl RevenueModel {
    pub fn score(self) -> f64 {
        match self {
            RevenueModel::ProjectBased => 0.25,
            RevenueModel::Transactional => 0.5,
            RevenueModel::RecurringContracts => 0.75,
            RevenueModel::Subscription => 1.0,
            RevenueModel::Unknown => NEUTRAL_SCORE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RevenueModel::ProjectBased => "project-based",
            RevenueModel::Transactional => "transactional",
            RevenueModel::RecurringContracts => "recurring contracts",
            RevenueModel::Subscription => "subscription",
            RevenueModel::Unknown => "unknown",
        }
    }
}

impl LaborIntensity {
    pub fn score(self) -> f64 {
        match self {
            LaborIntensity::VeryHigh => 0.0,
            LaborIntensity::High => 0.33,
            LaborIntensity::Moderate => 0.67,
            LaborIntensity::Low => 1.0,
            LaborIntensity::Unknown => NEUTRAL_SCORE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LaborIntensity::VeryHigh => "very high",
            LaborIntensity::High => "high",
            LaborIntensity::Moderate => "moderate",
            LaborIntensity::Low => "low",
            LaborIntensity::Unknown => "unknown",
        }
    }
}

impl AssetIntensity {
    pub fn score(self) -> f64 {
        match self {
            AssetIntensity::AssetHeavy => 0.33,
            AssetIntensity::Moderate => 0.67,
            AssetIntensity::AssetLight => 1.0,
            AssetIntensity::Unknown => NEUTRAL_SCORE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetIntensity::AssetHeavy => "asset heavy",
            AssetIntensity::Moderate => "moderate",
            AssetIntensity::AssetLight => "asset light",
            AssetIntensity::Unknown => "unknown",
        }
    }
}

impl OwnerInvolvement {
    pub fn score(self) -> f64 {
        match self {
            OwnerInvolvement::Critical => 0.0,
            OwnerInvolvement::High => 0.25,
            OwnerInvolvement::Moderate => 0.5,
            OwnerInvolvement::Low => 0.75,
            OwnerInvolvement::Minimal => 1.0,
            OwnerInvolvement::Unknown => NEUTRAL_SCORE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OwnerInvolvement::Critical => "critical",
            OwnerInvolvement::High => "high",
            OwnerInvolvement::Moderate => "moderate",
            OwnerInvolvement::Low => "low",
            OwnerInvolvement::Minimal => "minimal",
            OwnerInvolvement::Unknown => "unknown",
        }
    }
}

impl GrossMarginBand {
    pub fn score(self) -> f64 {
        match self {
            GrossMarginBand::Under30 => 0.25,
            GrossMarginBand::From30To50 => 0.5,
            GrossMarginBand::From50To70 => 0.75,
            GrossMarginBand::Over70 => 1.0,
            GrossMarginBand::Unknown => NEUTRAL_SCORE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GrossMarginBand::Under30 => "under 30%",
            GrossMarginBand::From30To50 => "30-50%",
            GrossMarginBand::From50To70 => "50-70%",
            GrossMarginBand::Over70 => "over 70%",
            GrossMarginBand::Unknown => "unknown",
        }
    }
}

/// Structural profile of a company. Gross margin is often not collected,
/// so the Core Score is the mean of five or six factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreFactors {
    pub revenue_size: RevenueSizeBand,
    pub revenue_model: RevenueModel,
    pub labor_intensity: LaborIntensity,
    pub asset_intensity: AssetIntensity,
    pub owner_involvement: OwnerInvolvement,
    #[serde(default)]
    pub gross_margin: Option<GrossMarginBand>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub factor: String, // e.g. "Owner involvement"
    pub value: String,  // e.g. "critical"
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreScoreBreakdown {
    pub score: f64,
    /// False when no profile was supplied and the neutral default was used.
    pub profiled: bool,
    pub factors: Vec<FactorScore>,
}

impl CoreFactors {
    /// Per-factor lookup results, in display order.
    pub fn factor_scores(&self) -> Vec<FactorScore> {
        let mut factors = vec![
            factor("Revenue size", self.revenue_size.label(), self.revenue_size.score()),
            factor("Revenue model", self.revenue_model.label(), self.revenue_model.score()),
            factor(
                "Labor intensity",
                self.labor_intensity.label(),
                self.labor_intensity.score(),
            ),
            factor(
                "Asset intensity",
                self.asset_intensity.label(),
                self.asset_intensity.score(),
            ),
            factor(
                "Owner involvement",
                self.owner_involvement.label(),
                self.owner_involvement.score(),
            ),
        ];
        if let Some(margin) = self.gross_margin {
            factors.push(factor("Gross margin", margin.label(), margin.score()));
        }
        factors
    }
}

fn factor(name: &str, value: &str, score: f64) -> FactorScore {
    FactorScore {
        factor: name.to_string(),
        value: value.to_string(),
        score,
    }
}

/// Core Score in [0, 1]: unweighted mean of the available factor scores.
pub fn core_score(factors: Option<&CoreFactors>) -> f64 {
    core_score_breakdown(factors).score
}

pub fn core_score_breakdown(factors: Option<&CoreFactors>) -> CoreScoreBreakdown {
    let Some(factors) = factors else {
        return CoreScoreBreakdown {
            score: NEUTRAL_SCORE,
            profiled: false,
            factors: Vec::new(),
        };
    };

    let scores = factors.factor_scores();
    let mean = scores.iter().map(|f| f.score).sum::<f64>() / scores.len() as f64;

    CoreScoreBreakdown {
        score: mean.clamp(0.0, 1.0),
        profiled: true,
        factors: scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_factors() -> CoreFactors {
        CoreFactors {
            revenue_size: RevenueSizeBand::From1mTo3m,
            revenue_model: RevenueModel::RecurringContracts,
            labor_intensity: LaborIntensity::Moderate,
            asset_intensity: AssetIntensity::AssetLight,
            owner_involvement: OwnerInvolvement::Moderate,
            gross_margin: None,
        }
    }

    #[test]
    fn test_missing_profile_is_neutral() {
        let breakdown = core_score_breakdown(None);
        assert_eq!(breakdown.score, 0.5);
        assert!(!breakdown.profiled);
        assert!(breakdown.factors.is_empty());
    }

    #[test]
    fn test_mean_of_five_factors() {
        let factors = sample_factors();
        // (0.6 + 0.75 + 0.67 + 1.0 + 0.5) / 5
        let expected = (0.6 + 0.75 + 0.67 + 1.0 + 0.5) / 5.0;
        assert!((core_score(Some(&factors)) - expected).abs() < 1e-12);
        assert_eq!(core_score_breakdown(Some(&factors)).factors.len(), 5);
    }

    #[test]
    fn test_gross_margin_joins_the_mean() {
        let mut factors = sample_factors();
        factors.gross_margin = Some(GrossMarginBand::Over70);
        let expected = (0.6 + 0.75 + 0.67 + 1.0 + 0.5 + 1.0) / 6.0;
        assert!((core_score(Some(&factors)) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_owner_involvement_extremes() {
        assert_eq!(OwnerInvolvement::Critical.score(), 0.0);
        assert_eq!(OwnerInvolvement::Minimal.score(), 1.0);
    }

    #[test]
    fn test_unknown_values_fall_back_per_factor() {
        let yaml = r#"
revenue_size: "SOMETHING_NEW"
revenue_model: SUBSCRIPTION
labor_intensity: LOW
asset_intensity: "???"
owner_involvement: MINIMAL
"#;
        let factors: CoreFactors = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(factors.revenue_size, RevenueSizeBand::Unknown);
        assert_eq!(factors.asset_intensity, AssetIntensity::Unknown);
        // (0.5 + 1.0 + 1.0 + 0.5 + 1.0) / 5
        assert!((core_score(Some(&factors)) - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_band_names_parse() {
        let yaml = r#"
revenue_size: 3M_TO_10M
revenue_model: PROJECT_BASED
labor_intensity: VERY_HIGH
asset_intensity: ASSET_HEAVY
owner_involvement: CRITICAL
gross_margin: UNDER_30
"#;
        let factors: CoreFactors = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(factors.revenue_size, RevenueSizeBand::From3mTo10m);
        assert_eq!(factors.gross_margin, Some(GrossMarginBand::Under30));
    }

    #[test]
    fn test_core_score_stays_in_unit_interval() {
        let best = CoreFactors {
            revenue_size: RevenueSizeBand::Over25m,
            revenue_model: RevenueModel::Subscription,
            labor_intensity: LaborIntensity::Low,
            asset_intensity: AssetIntensity::AssetLight,
            owner_involvement: OwnerInvolvement::Minimal,
            gross_margin: Some(GrossMarginBand::Over70),
        };
        assert_eq!(core_score(Some(&best)), 1.0);

        let worst = CoreFactors {
            revenue_size: RevenueSizeBand::Under500k,
            revenue_model: RevenueModel::ProjectBased,
            labor_intensity: LaborIntensity::VeryHigh,
            asset_intensity: AssetIntensity::AssetHeavy,
            owner_involvement: OwnerInvolvement::Critical,
            gross_margin: Some(GrossMarginBand::Under30),
        };
        let score = core_score(Some(&worst));
        assert!(score > 0.0 && score < 0.2);
    }
}
