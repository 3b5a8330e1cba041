use super::config::EngineConfig;
use crate::valuation::adjust::MAX_SPREAD;
use crate::valuation::multiple::{validate_alpha, ALPHA_PRODUCT_RANGE};

/// Highest DLOM rate accepted from configuration.
pub const MAX_DLOM_RATE: f64 = 0.9;

/// Validate engine configuration before any computation.
/// Returns all validation errors at once (not just the first).
pub fn validate_engine_config(config: &EngineConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(e) = validate_alpha(config.alpha, "engine.alpha") {
        errors.push(e);
    } else if config.alpha < ALPHA_PRODUCT_RANGE.0 || config.alpha > ALPHA_PRODUCT_RANGE.1 {
        tracing::warn!(
            alpha = config.alpha,
            "alpha is outside the usual {}-{} range",
            ALPHA_PRODUCT_RANGE.0,
            ALPHA_PRODUCT_RANGE.1
        );
    }

    errors.extend(config.category_weights.validate("engine.category_weights"));

    if let Some(score) = config.unassessed_category_score {
        if !(0.0..=1.0).contains(&score) {
            errors.push(format!(
                "engine.unassessed_category_score: must be within [0, 1], got {}",
                score
            ));
        }
    }

    if !(0.0..=MAX_DLOM_RATE).contains(&config.dlom_rate) {
        errors.push(format!(
            "engine.dlom_rate: must be within [0, {}], got {}",
            MAX_DLOM_RATE, config.dlom_rate
        ));
    }

    if !(0.0..=MAX_SPREAD).contains(&config.spread.base) {
        errors.push(format!(
            "engine.spread.base: must be within [0, {}], got {}",
            MAX_SPREAD, config.spread.base
        ));
    }
    if !(0.0..=MAX_SPREAD).contains(&config.spread.coverage_penalty) {
        errors.push(format!(
            "engine.spread.coverage_penalty: must be within [0, {}], got {}",
            MAX_SPREAD, config.spread.coverage_penalty
        ));
    }

    for (band, salary) in &config.owner_comp_benchmarks {
        if !salary.is_finite() || *salary < 0.0 {
            errors.push(format!(
                "engine.owner_comp_benchmarks.{}: must be a non-negative amount, got {}",
                band.label(),
                salary
            ));
        }
    }

    for (name, range) in &config.industries {
        errors.extend(range.validate(&format!("engine.industries.{}", name)));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
