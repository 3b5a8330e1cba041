use serde::{Deserialize, Serialize};

use super::adjust::{RiskDiscount, MAX_DISCOUNT_RATE};
use crate::scoring::categories::{CategoryScore, CategoryWeights};
use crate::scoring::responses::Category;

/// The distance from today's risk-adjusted value to the industry ceiling,
/// split by how achievable each part is. All amounts are in dollars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapDecomposition {
    /// Recoverable by resolving the named, remediable risk discounts.
    pub addressable_gap: f64,
    /// Tied to size, marketability and business positioning below the
    /// industry median; none of it moves with buyer perception.
    pub structural_gap: f64,
    /// Above the industry median; needs multi-year transformation.
    pub aspirational_gap: f64,
    pub total_gap: f64,
}

/// Share of the addressable gap that a category's weakness accounts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGap {
    pub category: Category,
    pub share: f64,
    pub amount: f64,
}

/// Split `high - risk_adjusted_multiple` (in dollars) into three buckets.
///
/// In multiple space:
/// - the risk span `quality - risk` is divided across the discounts by
///   log-share; remediable discounts are addressable, the rest structural;
/// - the quality span `high - quality` reflects Core Score positioning, so
///   none of it is addressable: the size discount and the slice up to the
///   industry median are structural, the remainder above the median is
///   aspirational.
///
/// The three buckets are non-negative and sum to `total_gap`. Without a
/// remediable risk discount the addressable gap is zero.
pub fn decompose_gap(
    adjusted_ebitda: f64,
    industry_median_multiple: f64,
    high: f64,
    quality_adjusted_multiple: f64,
    risk_adjusted_multiple: f64,
    risk_discounts: &[RiskDiscount],
    size_discount_rate: f64,
) -> GapDecomposition {
    let ebitda = adjusted_ebitda.max(0.0);
    let quality = quality_adjusted_multiple.min(high);
    let risk = risk_adjusted_multiple.min(quality);

    // Risk span.
    let risk_span = quality - risk;
    let (remediable_weight, total_weight) =
        risk_discounts
            .iter()
            .fold((0.0, 0.0), |(remediable, total), discount| {
                let weight = -(1.0 - discount.rate.clamp(0.0, MAX_DISCOUNT_RATE)).ln();
                if discount.remediable {
                    (remediable + weight, total + weight)
                } else {
                    (remediable, total + weight)
                }
            });
    let addressable_risk = if total_weight > 0.0 {
        risk_span * (remediable_weight / total_weight)
    } else {
        0.0
    };
    let structural_risk = risk_span - addressable_risk;

    // Quality span.
    let quality_span = (high - quality).max(0.0);
    let size_rate = size_discount_rate.clamp(0.0, MAX_DISCOUNT_RATE);
    let size_lost = quality * size_rate / (1.0 - size_rate);
    let size_part = size_lost.clamp(0.0, quality_span);
    let rest = quality_span - size_part;
    let below_median = (industry_median_multiple - (quality + size_part)).clamp(0.0, rest);
    let above_median = rest - below_median;

    GapDecomposition {
        addressable_gap: ebitda * addressable_risk,
        structural_gap: ebitda * (structural_risk + size_part + below_median),
        aspirational_gap: ebitda * above_median,
        total_gap: ebitda * (high - risk),
    }
}

/// Distribute the addressable gap across assessed categories in proportion
/// to `weight * (1 - score)`, i.e. where remediation pays the most.
pub fn attribute_addressable_gap(
    addressable_gap: f64,
    scores: &[CategoryScore],
    weights: &CategoryWeights,
) -> Vec<CategoryGap> {
    let shortfalls: Vec<(Category, f64)> = scores
        .iter()
        .filter(|s| s.is_assessed())
        .map(|s| (s.category, weights.weight(s.category) * (1.0 - s.score)))
        .filter(|(_, shortfall)| *shortfall > 0.0)
        .collect();

    let total: f64 = shortfalls.iter().map(|(_, s)| s).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    shortfalls
        .into_iter()
        .map(|(category, shortfall)| {
            let share = shortfall / total;
            CategoryGap {
                category,
                share,
                amount: addressable_gap * share,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn discount(name: &str, rate: f64, remediable: bool) -> RiskDiscount {
        RiskDiscount {
            name: name.to_string(),
            rate,
            remediable,
            explanation: String::new(),
        }
    }

    fn assert_partition(gap: &GapDecomposition) {
        let sum = gap.addressable_gap + gap.structural_gap + gap.aspirational_gap;
        let tolerance = 1e-6 * gap.total_gap.abs().max(1.0);
        assert!((sum - gap.total_gap).abs() <= tolerance, "{:?}", gap);
        assert!(gap.addressable_gap >= 0.0);
        assert!(gap.structural_gap >= 0.0);
        assert!(gap.aspirational_gap >= 0.0);
    }

    #[test]
    fn test_worked_decomposition() {
        // quality 4.0, risk 3.0, ceiling 6.0, median 5.0, size discount 20%.
        let discounts = vec![
            discount("Owner dependency", 0.15, true),
            discount("DLOM", 0.15, false),
        ];
        let gap = decompose_gap(100_000.0, 5.0, 6.0, 4.0, 3.0, &discounts, 0.20);

        // Risk span 1.0 split evenly (equal rates).
        // Size part: 4.0 * 0.2 / 0.8 = 1.0; then 5.0 - 5.0 = 0 below median.
        assert!((gap.total_gap - 300_000.0).abs() < 1e-6);
        assert!((gap.addressable_gap - 50_000.0).abs() < 1e-6);
        assert!((gap.structural_gap - 150_000.0).abs() < 1e-6);
        assert!((gap.aspirational_gap - 100_000.0).abs() < 1e-6);
        assert_partition(&gap);
    }

    #[test]
    fn test_below_median_is_structural() {
        let gap = decompose_gap(1_000_000.0, 5.0, 6.0, 3.5, 3.5, &[], 0.0);
        assert_eq!(gap.addressable_gap, 0.0);
        assert!((gap.structural_gap - 1_500_000.0).abs() < 1e-6);
        assert!((gap.aspirational_gap - 1_000_000.0).abs() < 1e-6);
        assert_partition(&gap);
    }

    #[test]
    fn test_no_remediable_discount_means_nothing_addressable() {
        let discounts = vec![
            discount("DLOM", 0.15, false),
            discount("Small company", 0.10, false),
        ];
        let gap = decompose_gap(400_000.0, 4.5, 6.0, 3.8, 2.9, &discounts, 0.15);
        assert_eq!(gap.addressable_gap, 0.0);
        assert!(gap.structural_gap > 0.0);
        assert_partition(&gap);
    }

    #[test]
    fn test_at_ceiling_has_no_gap() {
        let gap = decompose_gap(500_000.0, 4.5, 6.0, 6.0, 6.0, &[], 0.0);
        assert_eq!(gap.total_gap, 0.0);
        assert_partition(&gap);
    }

    #[test]
    fn test_zero_ebitda_has_no_gap() {
        let gap = decompose_gap(-5.0, 4.5, 6.0, 4.0, 3.0, &[discount("x", 0.2, true)], 0.1);
        assert_eq!(gap.total_gap, 0.0);
        assert_eq!(gap.addressable_gap, 0.0);
    }

    #[test]
    fn test_attribution_follows_weighted_shortfall() {
        let scores = vec![
            CategoryScore {
                category: Category::Financial,
                earned_points: 1.0,
                total_points: 2.0,
                answered: 2,
                score: 0.5,
            },
            CategoryScore {
                category: Category::Market,
                earned_points: 1.0,
                total_points: 1.0,
                answered: 1,
                score: 1.0,
            },
            CategoryScore {
                category: Category::Personal,
                earned_points: 0.0,
                total_points: 0.0,
                answered: 0,
                score: 0.5,
            },
        ];
        let gaps = attribute_addressable_gap(1_000.0, &scores, &CategoryWeights::default());
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].category, Category::Financial);
        assert!((gaps[0].amount - 1_000.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_components_partition_total(
            ebitda in 0.0f64..10_000_000.0,
            low in 0.0f64..5.0,
            span in 0.0f64..8.0,
            quality_pos in 0.0f64..=1.0,
            multiplier in 0.05f64..=1.0,
            median_pos in 0.0f64..=1.0,
            size in 0.0f64..0.5,
            rates in prop::collection::vec((0.0f64..0.9, any::<bool>()), 0..6),
        ) {
            let high = low + span;
            let quality = low + quality_pos * span;
            let risk = quality * multiplier;
            let median = low + median_pos * span;
            let discounts: Vec<RiskDiscount> = rates
                .iter()
                .map(|(rate, remediable)| discount("d", *rate, *remediable))
                .collect();
            let gap = decompose_gap(ebitda, median, high, quality, risk, &discounts, size);
            let sum = gap.addressable_gap + gap.structural_gap + gap.aspirational_gap;
            prop_assert!((sum - gap.total_gap).abs() <= 1e-6 * gap.total_gap.max(1.0));
            prop_assert!(gap.addressable_gap >= 0.0);
            prop_assert!(gap.structural_gap >= 0.0);
            prop_assert!(gap.aspirational_gap >= 0.0);
            if rates.iter().all(|(_, remediable)| !remediable) {
                prop_assert_eq!(gap.addressable_gap, 0.0);
            }
        }
    }
}
