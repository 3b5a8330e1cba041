use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scoring::factors::RevenueSizeBand;

/// A named add-back or deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LineItem {
    pub name: String,
    pub amount: f64,
}

/// Financial inputs the caller knows about the company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EbitdaInputs {
    /// Reported EBITDA; `None` when the company has not shared financials.
    #[serde(default)]
    pub reported_ebitda: Option<f64>,
    #[serde(default)]
    pub add_backs: Vec<LineItem>,
    #[serde(default)]
    pub deductions: Vec<LineItem>,
    /// What the owner actually pays themselves.
    #[serde(default)]
    pub owner_compensation: Option<f64>,
}

/// How reported EBITDA became adjusted EBITDA, line by line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EbitdaBridge {
    pub reported_ebitda: Option<f64>,
    pub add_backs: Vec<LineItem>,
    pub deductions: Vec<LineItem>,
    pub owner_compensation: Option<f64>,
    pub market_salary_benchmark: f64,
    /// `owner_compensation - benchmark`; negative for an underpaid owner.
    pub owner_comp_adjustment: f64,
    pub adjusted_ebitda: Option<f64>,
}

/// Market salary for a replacement general manager, by revenue band.
pub fn default_market_salary(revenue_size: RevenueSizeBand) -> f64 {
    match revenue_size {
        RevenueSizeBand::Under500k => 60_000.0,
        RevenueSizeBand::From500kTo1m => 85_000.0,
        RevenueSizeBand::From1mTo3m => 120_000.0,
        RevenueSizeBand::From3mTo10m => 175_000.0,
        RevenueSizeBand::From10mTo25m => 250_000.0,
        RevenueSizeBand::Over25m => 350_000.0,
        RevenueSizeBand::Unknown => 120_000.0,
    }
}

/// Benchmark for `revenue_size`, preferring configured overrides.
pub fn market_salary_benchmark(
    revenue_size: RevenueSizeBand,
    overrides: &BTreeMap<RevenueSizeBand, f64>,
) -> f64 {
    overrides
        .get(&revenue_size)
        .copied()
        .unwrap_or_else(|| default_market_salary(revenue_size))
}

/// Normalize reported EBITDA for a buyer.
///
/// The owner-compensation adjustment is bidirectional: an overpaid owner's
/// excess is added back, an underpaid owner's shortfall is deducted because a
/// buyer must budget a market-rate replacement.
pub fn adjusted_ebitda(
    inputs: &EbitdaInputs,
    revenue_size: RevenueSizeBand,
    benchmark_overrides: &BTreeMap<RevenueSizeBand, f64>,
) -> EbitdaBridge {
    let benchmark = market_salary_benchmark(revenue_size, benchmark_overrides);
    let owner_comp_adjustment = inputs
        .owner_compensation
        .map(|actual| actual - benchmark)
        .unwrap_or(0.0);

    let adjusted = inputs.reported_ebitda.map(|reported| {
        let add_backs: f64 = inputs.add_backs.iter().map(|i| i.amount).sum();
        let deductions: f64 = inputs.deductions.iter().map(|i| i.amount).sum();
        reported + add_backs - deductions + owner_comp_adjustment
    });

    EbitdaBridge {
        reported_ebitda: inputs.reported_ebitda,
        add_backs: inputs.add_backs.clone(),
        deductions: inputs.deductions.clone(),
        owner_compensation: inputs.owner_compensation,
        market_salary_benchmark: benchmark,
        owner_comp_adjustment,
        adjusted_ebitda: adjusted,
    }
}

impl EbitdaInputs {
    /// Every number that must be finite for the bridge to mean anything.
    pub fn non_finite_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.reported_ebitda.is_some_and(|v| !v.is_finite()) {
            fields.push("ebitda.reported_ebitda".to_string());
        }
        if self.owner_compensation.is_some_and(|v| !v.is_finite()) {
            fields.push("ebitda.owner_compensation".to_string());
        }
        for (i, item) in self.add_backs.iter().enumerate() {
            if !item.amount.is_finite() {
                fields.push(format!("ebitda.add_backs[{}].amount", i));
            }
        }
        for (i, item) in self.deductions.iter().enumerate() {
            if !item.amount.is_finite() {
                fields.push(format!("ebitda.deductions[{}].amount", i));
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(reported: f64, owner_comp: Option<f64>) -> EbitdaInputs {
        EbitdaInputs {
            reported_ebitda: Some(reported),
            add_backs: vec![LineItem {
                name: "One-time legal settlement".to_string(),
                amount: 40_000.0,
            }],
            deductions: vec![LineItem {
                name: "Below-market rent from owner".to_string(),
                amount: 15_000.0,
            }],
            owner_compensation: owner_comp,
        }
    }

    #[test]
    fn test_overpaid_owner_adds_back() {
        let bridge = adjusted_ebitda(
            &inputs(500_000.0, Some(200_000.0)),
            RevenueSizeBand::From1mTo3m,
            &BTreeMap::new(),
        );
        assert_eq!(bridge.market_salary_benchmark, 120_000.0);
        assert_eq!(bridge.owner_comp_adjustment, 80_000.0);
        assert_eq!(bridge.adjusted_ebitda, Some(605_000.0));
    }

    #[test]
    fn test_underpaid_owner_reduces_ebitda() {
        let bridge = adjusted_ebitda(
            &inputs(500_000.0, Some(50_000.0)),
            RevenueSizeBand::From1mTo3m,
            &BTreeMap::new(),
        );
        assert_eq!(bridge.owner_comp_adjustment, -70_000.0);
        assert_eq!(bridge.adjusted_ebitda, Some(455_000.0));
    }

    #[test]
    fn test_unknown_owner_comp_is_no_adjustment() {
        let bridge = adjusted_ebitda(
            &inputs(500_000.0, None),
            RevenueSizeBand::Over25m,
            &BTreeMap::new(),
        );
        assert_eq!(bridge.owner_comp_adjustment, 0.0);
        assert_eq!(bridge.adjusted_ebitda, Some(525_000.0));
    }

    #[test]
    fn test_unknown_reported_ebitda() {
        let bridge = adjusted_ebitda(
            &EbitdaInputs::default(),
            RevenueSizeBand::Unknown,
            &BTreeMap::new(),
        );
        assert_eq!(bridge.adjusted_ebitda, None);
    }

    #[test]
    fn test_configured_benchmark_wins() {
        let mut overrides = BTreeMap::new();
        overrides.insert(RevenueSizeBand::From1mTo3m, 150_000.0);
        let bridge = adjusted_ebitda(
            &inputs(500_000.0, Some(100_000.0)),
            RevenueSizeBand::From1mTo3m,
            &overrides,
        );
        assert_eq!(bridge.owner_comp_adjustment, -50_000.0);
    }

    #[test]
    fn test_non_finite_fields_reported() {
        let mut bad = inputs(f64::NAN, Some(100_000.0));
        bad.add_backs[0].amount = f64::INFINITY;
        let fields = bad.non_finite_fields();
        assert_eq!(
            fields,
            vec![
                "ebitda.reported_ebitda".to_string(),
                "ebitda.add_backs[0].amount".to_string()
            ]
        );
    }
}
