use serde::{Deserialize, Serialize};

use super::multiple::IndustryMultipleRange;
use crate::scoring::factors::{OwnerInvolvement, RevenueModel, RevenueSizeBand};

/// Upper bound on any single discount rate.
pub const MAX_DISCOUNT_RATE: f64 = 0.95;
/// The stacked risk multiplier never collapses below this.
pub const MIN_RISK_MULTIPLIER: f64 = 0.05;
/// The EV band never widens beyond ±50% of the midpoint.
pub const MAX_SPREAD: f64 = 0.5;

pub const DEFAULT_DLOM_RATE: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Quality,
    Risk,
    Marketability,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentValue {
    /// Additive change to the multiple.
    Impact(f64),
    /// Multiplicative discount, in [0, 1).
    Rate(f64),
}

/// One named, explainable adjustment, kept for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentEntry {
    pub name: String,
    pub kind: AdjustmentKind,
    pub value: AdjustmentValue,
    pub explanation: String,
}

/// A risk discount feeding the risk multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskDiscount {
    pub name: String,
    pub rate: f64,
    /// Whether the company can realistically remove it before a sale.
    pub remediable: bool,
    pub explanation: String,
}

/// Width of the EV band around its midpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SpreadConfig {
    /// Spread with every category assessed.
    pub base: f64,
    /// Extra spread at zero assessment coverage, scaled linearly.
    pub coverage_penalty: f64,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            base: 0.10,
            coverage_penalty: 0.20,
        }
    }
}

impl SpreadConfig {
    pub fn spread_factor(&self, coverage: f64) -> f64 {
        let coverage = coverage.clamp(0.0, 1.0);
        (self.base + (1.0 - coverage) * self.coverage_penalty).clamp(0.0, MAX_SPREAD)
    }
}

/// Everything the adjuster looks at besides the baseline multiple.
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentProfile {
    pub adjusted_ebitda: f64,
    pub range: IndustryMultipleRange,
    pub revenue_size: RevenueSizeBand,
    pub revenue_model: RevenueModel,
    pub owner_involvement: OwnerInvolvement,
    /// Share of revenue from the largest customer, in [0, 1].
    pub top_customer_share: Option<f64>,
    /// Category scores; `None` for unassessed categories.
    pub transferability_score: Option<f64>,
    pub legal_tax_score: Option<f64>,
    pub financial_score: Option<f64>,
    /// Weight share of assessed categories, in [0, 1].
    pub assessed_coverage: f64,
    pub dlom_rate: f64,
    pub spread: SpreadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustedValuation {
    pub quality_adjusted_multiple: f64,
    pub risk_adjusted_multiple: f64,
    pub risk_multiplier: f64,
    pub size_discount_rate: f64,
    pub spread_factor: f64,
    pub ev_low: f64,
    pub ev_mid: f64,
    pub ev_high: f64,
    pub dlom_rate: f64,
    pub dlom_amount: f64,
    pub risk_discounts: Vec<RiskDiscount>,
    pub adjustments: Vec<AdjustmentEntry>,
}

pub fn size_discount_rate(revenue_size: RevenueSizeBand) -> f64 {
    match revenue_size {
        RevenueSizeBand::Under500k => 0.30,
        RevenueSizeBand::From500kTo1m => 0.25,
        RevenueSizeBand::From1mTo3m => 0.20,
        RevenueSizeBand::From3mTo10m => 0.10,
        RevenueSizeBand::From10mTo25m => 0.05,
        RevenueSizeBand::Over25m => 0.0,
        RevenueSizeBand::Unknown => 0.15,
    }
}

fn revenue_model_impact(model: RevenueModel) -> f64 {
    match model {
        RevenueModel::Subscription => 0.50,
        RevenueModel::RecurringContracts => 0.25,
        RevenueModel::Transactional => 0.0,
        RevenueModel::ProjectBased => -0.25,
        RevenueModel::Unknown => 0.0,
    }
}

fn owner_dependency_rate(involvement: OwnerInvolvement) -> f64 {
    match involvement {
        OwnerInvolvement::Critical => 0.25,
        OwnerInvolvement::High => 0.15,
        OwnerInvolvement::Moderate => 0.08,
        OwnerInvolvement::Low => 0.03,
        OwnerInvolvement::Minimal => 0.0,
        OwnerInvolvement::Unknown => 0.08,
    }
}

fn customer_concentration_rate(top_customer_share: f64) -> f64 {
    if top_customer_share > 0.50 {
        0.25
    } else if top_customer_share > 0.30 {
        0.15
    } else if top_customer_share > 0.20 {
        0.08
    } else if top_customer_share > 0.10 {
        0.03
    } else {
        0.0
    }
}

fn small_company_rate(revenue_size: RevenueSizeBand) -> f64 {
    match revenue_size {
        RevenueSizeBand::Under500k => 0.10,
        RevenueSizeBand::From500kTo1m => 0.07,
        RevenueSizeBand::From1mTo3m => 0.04,
        _ => 0.0,
    }
}

/// Apply structural quality adjustments, then the stacked risk discounts.
///
/// The quality-adjusted multiple stays within the industry band. The risk
/// multiplier is in `(0, 1]`, so the risk-adjusted multiple never exceeds the
/// quality-adjusted one, and `0 <= ev_low <= ev_mid <= ev_high`.
///
/// `profile.range` must already have passed [`IndustryMultipleRange::validate`].
pub fn apply_adjustments(baseline: f64, profile: &AdjustmentProfile) -> AdjustedValuation {
    debug_assert!(
        profile.range.low <= profile.range.high,
        "inverted industry band: low {} > high {}",
        profile.range.low,
        profile.range.high
    );
    let low = profile.range.low;
    let high = profile.range.high.max(low);
    let mut adjustments = Vec::new();

    // Quality: size discount, then additive impacts, then clamp into the band.
    let size_rate = size_discount_rate(profile.revenue_size);
    let mut multiple = baseline * (1.0 - size_rate);
    if size_rate > 0.0 {
        adjustments.push(AdjustmentEntry {
            name: "Size discount".to_string(),
            kind: AdjustmentKind::Quality,
            value: AdjustmentValue::Rate(size_rate),
            explanation: format!(
                "Revenue {} trades below larger peers",
                profile.revenue_size.label()
            ),
        });
    }

    let model_impact = revenue_model_impact(profile.revenue_model);
    if model_impact != 0.0 {
        multiple += model_impact;
        adjustments.push(AdjustmentEntry {
            name: "Revenue model".to_string(),
            kind: AdjustmentKind::Quality,
            value: AdjustmentValue::Impact(model_impact),
            explanation: format!(
                "{} revenue is {} predictable than average",
                capitalize(profile.revenue_model.label()),
                if model_impact > 0.0 { "more" } else { "less" }
            ),
        });
    }

    if let Some(score) = profile.transferability_score {
        let impact = (score.clamp(0.0, 1.0) - 0.5) * 0.5;
        if impact != 0.0 {
            multiple += impact;
            adjustments.push(AdjustmentEntry {
                name: "Transferability".to_string(),
                kind: AdjustmentKind::Quality,
                value: AdjustmentValue::Impact(impact),
                explanation: format!(
                    "Transferability scored {:.0}/100; buyers pay for a business that runs without its owner",
                    score * 100.0
                ),
            });
        }
    }

    let quality_adjusted_multiple = multiple.max(low).min(high);
    if quality_adjusted_multiple != multiple {
        adjustments.push(AdjustmentEntry {
            name: "Industry band".to_string(),
            kind: AdjustmentKind::Quality,
            value: AdjustmentValue::Impact(quality_adjusted_multiple - multiple),
            explanation: format!(
                "Quality-adjusted multiple held within the industry range {:.2}x-{:.2}x",
                low, high
            ),
        });
    }

    // Risk: named discounts stacked multiplicatively, DLOM last.
    let risk_discounts = risk_discounts(profile);
    let product: f64 = risk_discounts.iter().map(|d| 1.0 - d.rate).product();
    let risk_multiplier = product.clamp(MIN_RISK_MULTIPLIER, 1.0);

    for discount in &risk_discounts {
        adjustments.push(AdjustmentEntry {
            name: discount.name.clone(),
            kind: if discount.name == DLOM_NAME {
                AdjustmentKind::Marketability
            } else {
                AdjustmentKind::Risk
            },
            value: AdjustmentValue::Rate(discount.rate),
            explanation: discount.explanation.clone(),
        });
    }

    let risk_adjusted_multiple = quality_adjusted_multiple * risk_multiplier;

    let dlom_rate = profile.dlom_rate.clamp(0.0, MAX_DISCOUNT_RATE);
    let ev_mid = profile.adjusted_ebitda.max(0.0) * risk_adjusted_multiple;
    let dlom_amount = ev_mid * dlom_rate / (1.0 - dlom_rate);

    let spread_factor = profile.spread.spread_factor(profile.assessed_coverage);
    let ev_low = ev_mid * (1.0 - spread_factor);
    let ev_high = ev_mid * (1.0 + spread_factor);

    tracing::debug!(
        quality_adjusted_multiple,
        risk_adjusted_multiple,
        risk_multiplier,
        discounts = risk_discounts.len(),
        "applied quality and risk adjustments"
    );

    AdjustedValuation {
        quality_adjusted_multiple,
        risk_adjusted_multiple,
        risk_multiplier,
        size_discount_rate: size_rate,
        spread_factor,
        ev_low,
        ev_mid,
        ev_high,
        dlom_rate,
        dlom_amount,
        risk_discounts,
        adjustments,
    }
}

pub const DLOM_NAME: &str = "Lack of marketability (DLOM)";

fn risk_discounts(profile: &AdjustmentProfile) -> Vec<RiskDiscount> {
    let mut discounts = Vec::new();
    let mut push = |name: &str, rate: f64, remediable: bool, explanation: String| {
        let rate = rate.clamp(0.0, MAX_DISCOUNT_RATE);
        if rate > 0.0 {
            discounts.push(RiskDiscount {
                name: name.to_string(),
                rate,
                remediable,
                explanation,
            });
        }
    };

    push(
        "Owner dependency",
        owner_dependency_rate(profile.owner_involvement),
        true,
        format!(
            "Owner involvement is {}; buyers discount businesses that need the owner",
            profile.owner_involvement.label()
        ),
    );

    if let Some(share) = profile.top_customer_share {
        push(
            "Customer concentration",
            customer_concentration_rate(share),
            true,
            format!("Largest customer is {:.0}% of revenue", share * 100.0),
        );
    }

    if let Some(score) = profile.legal_tax_score {
        push(
            "Legal and tax exposure",
            (1.0 - score.clamp(0.0, 1.0)) * 0.15,
            true,
            format!("Legal/Tax readiness scored {:.0}/100", score * 100.0),
        );
    }

    if let Some(score) = profile.financial_score {
        push(
            "Financial records",
            (1.0 - score.clamp(0.0, 1.0)) * 0.20,
            true,
            format!("Financial readiness scored {:.0}/100", score * 100.0),
        );
    }

    push(
        "Small company risk",
        small_company_rate(profile.revenue_size),
        false,
        format!(
            "Revenue {} carries small-company risk",
            profile.revenue_size.label()
        ),
    );

    push(
        DLOM_NAME,
        profile.dlom_rate,
        false,
        "Private company interests lack a liquid market".to_string(),
    );

    discounts
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
