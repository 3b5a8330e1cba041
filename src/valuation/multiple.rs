use serde::{Deserialize, Serialize};

/// Default exponent of the buyer-skepticism curve.
pub const DEFAULT_ALPHA: f64 = 1.4;
/// Range product is expected to tune alpha within.
pub const ALPHA_PRODUCT_RANGE: (f64, f64) = (1.3, 1.6);
/// Range accepted by validation. Anything outside is misconfiguration.
pub const ALPHA_ACCEPTED_RANGE: (f64, f64) = (1.0, 2.0);

/// EBITDA multiple band for an industry classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndustryMultipleRange {
    pub low: f64,
    pub high: f64,
    /// Industry median multiple. Defaults to the midpoint of the band.
    #[serde(default)]
    pub median: Option<f64>,
}

impl IndustryMultipleRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self {
            low,
            high,
            median: None,
        }
    }

    pub fn median(&self) -> f64 {
        self.median.unwrap_or((self.low + self.high) / 2.0)
    }

    /// Returns every violation found, prefixed with `field`.
    pub fn validate(&self, field: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.low.is_finite() || !self.high.is_finite() {
            errors.push(format!("{}: low and high must be finite numbers", field));
            return errors;
        }
        if self.low < 0.0 {
            errors.push(format!("{}.low: must be non-negative, got {}", field, self.low));
        }
        if self.low > self.high {
            errors.push(format!(
                "{}: low ({}) must not exceed high ({})",
                field, self.low, self.high
            ));
        }
        if let Some(median) = self.median {
            if !median.is_finite() || median < self.low || median > self.high {
                errors.push(format!(
                    "{}.median: must lie within [{}, {}], got {}",
                    field, self.low, self.high, median
                ));
            }
        }
        errors
    }
}

/// Returns a violation message if `alpha` is outside the accepted range.
pub fn validate_alpha(alpha: f64, field: &str) -> Option<String> {
    let (min, max) = ALPHA_ACCEPTED_RANGE;
    if !alpha.is_finite() || alpha < min || alpha > max {
        Some(format!(
            "{}: must be within [{}, {}], got {}",
            field, min, max, alpha
        ))
    } else {
        None
    }
}

/// Result of positioning and discounting a multiple inside an industry band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultipleValuation {
    pub base_multiple: f64,
    pub discount_fraction: f64,
    pub final_multiple: f64,
    pub current_value: f64,
    pub potential_value: f64,
    pub value_gap: f64,
}

/// Convex skepticism curve: `(1 - bri)^alpha`.
///
/// Exact exponentiation; 0 at a perfect BRI and 1 at a BRI of zero.
pub fn discount_fraction(bri_score: f64, alpha: f64) -> f64 {
    (1.0 - bri_score.clamp(0.0, 1.0)).powf(alpha)
}

/// Position the base multiple with the Core Score, then discount the span
/// above the industry floor by the BRI skepticism curve.
///
/// `final_multiple` never drops below `range.low` and never exceeds
/// `base_multiple`. Dollar values are 0 when `adjusted_ebitda <= 0`.
///
/// `range` must already have passed [`IndustryMultipleRange::validate`].
pub fn valuation(
    adjusted_ebitda: f64,
    range: &IndustryMultipleRange,
    core_score: f64,
    bri_score: f64,
    alpha: f64,
) -> MultipleValuation {
    debug_assert!(
        range.low <= range.high,
        "inverted industry band: low {} > high {}",
        range.low,
        range.high
    );
    let low = range.low;
    let high = range.high.max(low);
    let core_score = core_score.clamp(0.0, 1.0);

    let base_multiple = low + core_score * (high - low);
    let discount_fraction = discount_fraction(bri_score, alpha);
    let final_multiple = (low + (base_multiple - low) * (1.0 - discount_fraction))
        .max(low)
        .min(base_multiple);

    let ebitda = adjusted_ebitda.max(0.0);
    let current_value = ebitda * final_multiple;
    let potential_value = ebitda * base_multiple;

    MultipleValuation {
        base_multiple,
        discount_fraction,
        final_multiple,
        current_value,
        potential_value,
        value_gap: (potential_value - current_value).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_scenario() {
        let range = IndustryMultipleRange::new(3.0, 6.0);
        let result = valuation(400_000.0, &range, 0.6, 0.62, 1.4);

        assert!((result.base_multiple - 4.8).abs() < 1e-12);
        let expected_discount = 0.38_f64.powf(1.4);
        assert!((result.discount_fraction - expected_discount).abs() < 1e-12);
        assert!((result.discount_fraction - 0.2580).abs() < 1e-3);

        let expected_final = 3.0 + 1.8 * (1.0 - expected_discount);
        assert!((result.final_multiple - expected_final).abs() < 1e-12);
        assert!((result.final_multiple - 4.3355).abs() < 1e-3);

        assert!((result.potential_value - 1_920_000.0).abs() < 1e-6);
        assert!((result.current_value - 400_000.0 * expected_final).abs() < 1e-6);
        assert!((result.value_gap - (1_920_000.0 - 400_000.0 * expected_final)).abs() < 1e-6);
    }

    #[test]
    fn test_discount_endpoints() {
        for alpha in [1.0, 1.3, 1.4, 1.6, 2.0] {
            assert_eq!(discount_fraction(1.0, alpha), 0.0);
            assert_eq!(discount_fraction(0.0, alpha), 1.0);
        }
    }

    #[test]
    fn test_discount_is_convex_not_linear() {
        // Below the linear discount everywhere strictly inside (0, 1).
        let d = discount_fraction(0.5, 1.4);
        assert!(d < 0.5);
        assert!((d - 0.5_f64.powf(1.4)).abs() < 1e-15);
    }

    #[test]
    fn test_zero_bri_lands_on_floor() {
        let range = IndustryMultipleRange::new(3.0, 6.0);
        let result = valuation(1_000_000.0, &range, 1.0, 0.0, 1.4);
        assert_eq!(result.base_multiple, 6.0);
        assert_eq!(result.final_multiple, 3.0);
        assert_eq!(result.value_gap, 3_000_000.0);
    }

    #[test]
    fn test_non_positive_ebitda_yields_zero_dollars() {
        let range = IndustryMultipleRange::new(3.0, 6.0);
        let result = valuation(-250_000.0, &range, 0.6, 0.62, 1.4);
        assert_eq!(result.current_value, 0.0);
        assert_eq!(result.potential_value, 0.0);
        assert_eq!(result.value_gap, 0.0);
        assert!(result.final_multiple >= 3.0);
    }

    #[test]
    fn test_industry_range_validation() {
        assert!(IndustryMultipleRange::new(3.0, 6.0).validate("industry").is_empty());
        let errors = IndustryMultipleRange::new(6.0, 3.0).validate("industry");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("must not exceed"));

        let mut bad_median = IndustryMultipleRange::new(3.0, 6.0);
        bad_median.median = Some(7.5);
        assert!(bad_median.validate("industry")[0].contains("industry.median"));
        assert_eq!(IndustryMultipleRange::new(3.0, 6.0).median(), 4.5);
    }

    #[test]
    fn test_alpha_validation() {
        assert!(validate_alpha(1.4, "alpha").is_none());
        assert!(validate_alpha(1.0, "alpha").is_none());
        assert!(validate_alpha(2.0, "alpha").is_none());
        assert!(validate_alpha(0.9, "alpha").is_some());
        assert!(validate_alpha(2.5, "alpha").is_some());
        assert!(validate_alpha(f64::NAN, "alpha").is_some());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "inverted industry band")]
    fn test_inverted_band_is_caller_error() {
        let range = IndustryMultipleRange::new(6.0, 3.0);
        valuation(400_000.0, &range, 0.6, 0.62, 1.4);
    }

    proptest! {
        #[test]
        fn prop_final_multiple_within_floor_and_base(
            low in 0.0f64..10.0,
            span in 0.0f64..10.0,
            core in 0.0f64..=1.0,
            bri in 0.0f64..=1.0,
            alpha in 1.0f64..=2.0,
        ) {
            let range = IndustryMultipleRange::new(low, low + span);
            let result = valuation(500_000.0, &range, core, bri, alpha);
            prop_assert!(result.final_multiple >= low);
            prop_assert!(result.final_multiple <= result.base_multiple);
            prop_assert!(result.value_gap >= 0.0);
        }

        #[test]
        fn prop_bri_monotone(
            core in 0.0f64..=1.0,
            bri_a in 0.0f64..=1.0,
            bri_b in 0.0f64..=1.0,
            alpha in 1.0f64..=2.0,
        ) {
            let range = IndustryMultipleRange::new(3.0, 6.0);
            let (lo, hi) = if bri_a <= bri_b { (bri_a, bri_b) } else { (bri_b, bri_a) };
            let low_result = valuation(1.0, &range, core, lo, alpha);
            let high_result = valuation(1.0, &range, core, hi, alpha);
            prop_assert!(high_result.final_multiple >= low_result.final_multiple - 1e-12);
        }

        #[test]
        fn prop_core_monotone(
            core_a in 0.0f64..=1.0,
            core_b in 0.0f64..=1.0,
            bri in 0.0f64..=1.0,
        ) {
            let range = IndustryMultipleRange::new(2.5, 7.0);
            let (lo, hi) = if core_a <= core_b { (core_a, core_b) } else { (core_b, core_a) };
            let low_result = valuation(1.0, &range, lo, bri, DEFAULT_ALPHA);
            let high_result = valuation(1.0, &range, hi, bri, DEFAULT_ALPHA);
            prop_assert!(high_result.base_multiple >= low_result.base_multiple);
        }
    }
}
