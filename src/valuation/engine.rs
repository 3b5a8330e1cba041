use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::adjust::{apply_adjustments, AdjustmentProfile};
use super::ebitda::{adjusted_ebitda, EbitdaInputs};
use super::gap::{attribute_addressable_gap, decompose_gap};
use super::multiple::{validate_alpha, valuation, IndustryMultipleRange};
use super::snapshot::{ValuationSnapshot, SNAPSHOT_VERSION};
use crate::error::{ValuationError, ValuationResult};
use crate::scoring::categories::{
    assessed_coverage, assessed_score, category_scores, weighted_bri, CategoryWeights,
};
use crate::scoring::config::EngineConfig;
use crate::scoring::factors::{
    core_score_breakdown, CoreFactors, OwnerInvolvement, RevenueModel, RevenueSizeBand,
};
use crate::scoring::reconcile::reconcile;
use crate::scoring::responses::{AssessmentResponse, Category};
use crate::scoring::validation::validate_engine_config;

/// Everything the orchestrating layer knows about one company for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValuationRequest {
    pub company_id: String,
    pub round_id: String,
    /// Supplied by the caller so that reruns are reproducible.
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub core_factors: Option<CoreFactors>,
    /// Response lists in priority order, most authoritative first.
    #[serde(default)]
    pub response_lists: Vec<Vec<AssessmentResponse>>,
    #[serde(default)]
    pub ebitda: EbitdaInputs,
    /// Industry classification, looked up in the configured industries.
    pub industry: String,
    /// Band supplied inline; wins over the configured one.
    #[serde(default)]
    pub industry_range: Option<IndustryMultipleRange>,
    /// Revenue share of the largest customer, in [0, 1].
    #[serde(default)]
    pub top_customer_share: Option<f64>,
    /// Company-specific category weights, merged over the configured ones.
    #[serde(default)]
    pub category_weights: BTreeMap<Category, f64>,
    /// Per-run override of the skepticism exponent.
    #[serde(default)]
    pub alpha: Option<f64>,
}

/// Run the whole pipeline for one request.
///
/// Configuration problems are reported before anything is computed. Missing
/// data (no profile, unanswered categories, no EBITDA) falls back to neutral
/// defaults instead of failing.
pub fn compute_snapshot(
    request: &ValuationRequest,
    config: &EngineConfig,
    previous: Option<&ValuationSnapshot>,
) -> ValuationResult<ValuationSnapshot> {
    validate_engine_config(config).map_err(ValuationError::InvalidConfig)?;
    let weights = resolve_weights(request, config)?;
    let alpha = resolve_alpha(request, config)?;
    let range = resolve_industry(request, config)?;
    check_inputs(request, previous)?;

    let span = tracing::debug_span!(
        "valuation",
        company = %request.company_id,
        round = %request.round_id
    );
    let _guard = span.enter();

    // Factors and responses.
    let core = core_score_breakdown(request.core_factors.as_ref());
    let reconciled = reconcile(&request.response_lists);
    let scores = category_scores(&reconciled);
    let bri_score = weighted_bri(&scores, &weights, config.unassessed_category_score);
    let coverage = assessed_coverage(&scores, &weights);
    tracing::debug!(
        core_score = core.score,
        bri_score,
        coverage,
        "scored factors and categories"
    );

    // Multiples.
    let revenue_size = request
        .core_factors
        .as_ref()
        .map(|f| f.revenue_size)
        .unwrap_or(RevenueSizeBand::Unknown);
    let bridge = adjusted_ebitda(&request.ebitda, revenue_size, &config.owner_comp_benchmarks);
    let ebitda = match bridge.adjusted_ebitda {
        Some(value) => value,
        None => {
            tracing::warn!("no reported EBITDA; dollar values will be zero");
            0.0
        }
    };
    let multiple = valuation(ebitda, &range, core.score, bri_score, alpha);

    let profile = AdjustmentProfile {
        adjusted_ebitda: ebitda,
        range: range.clone(),
        revenue_size,
        revenue_model: request
            .core_factors
            .as_ref()
            .map(|f| f.revenue_model)
            .unwrap_or(RevenueModel::Unknown),
        owner_involvement: request
            .core_factors
            .as_ref()
            .map(|f| f.owner_involvement)
            .unwrap_or(OwnerInvolvement::Unknown),
        top_customer_share: request.top_customer_share,
        transferability_score: assessed_score(&scores, Category::Transferability),
        legal_tax_score: assessed_score(&scores, Category::LegalTax),
        financial_score: assessed_score(&scores, Category::Financial),
        assessed_coverage: coverage,
        dlom_rate: config.dlom_rate,
        spread: config.spread.clone(),
    };
    let adjusted = apply_adjustments(multiple.base_multiple, &profile);

    // Gap.
    let gap = decompose_gap(
        ebitda,
        range.median(),
        range.high,
        adjusted.quality_adjusted_multiple,
        adjusted.risk_adjusted_multiple,
        &adjusted.risk_discounts,
        adjusted.size_discount_rate,
    );
    let category_gaps = attribute_addressable_gap(gap.addressable_gap, &scores, &weights);

    tracing::debug!(
        final_multiple = multiple.final_multiple,
        ev_mid = adjusted.ev_mid,
        total_gap = gap.total_gap,
        "valuation complete"
    );

    Ok(ValuationSnapshot {
        version: SNAPSHOT_VERSION,
        engine_version: env!("CARGO_PKG_VERSION").to_string(),
        id: ValuationSnapshot::snapshot_id(&request.company_id, &request.round_id),
        company_id: request.company_id.clone(),
        round_id: request.round_id.clone(),
        as_of: request.as_of,
        previous_snapshot_id: previous.map(|p| p.id.clone()),
        industry: request.industry.clone(),
        industry_range: range,
        alpha,
        core,
        bri_score,
        answered_questions: reconciled.len(),
        category_scores: scores,
        assessed_coverage: coverage,
        ebitda: bridge,
        multiple,
        adjusted,
        gap,
        category_gaps,
    })
}

/// Compute several independent requests in parallel.
///
/// Results come back in request order. Each request is paired with its own
/// previous snapshot, if any.
pub fn compute_batch(
    requests: &[(ValuationRequest, Option<ValuationSnapshot>)],
    config: &EngineConfig,
) -> Vec<ValuationResult<ValuationSnapshot>> {
    requests
        .par_iter()
        .map(|(request, previous)| compute_snapshot(request, config, previous.as_ref()))
        .collect()
}

fn resolve_weights(
    request: &ValuationRequest,
    config: &EngineConfig,
) -> ValuationResult<CategoryWeights> {
    if request.category_weights.is_empty() {
        return Ok(config.category_weights.clone());
    }
    let weights = config.category_weights.merged_with(&request.category_weights);
    let errors = weights.validate("request.category_weights");
    if errors.is_empty() {
        Ok(weights)
    } else {
        Err(ValuationError::InvalidConfig(errors))
    }
}

fn resolve_alpha(request: &ValuationRequest, config: &EngineConfig) -> ValuationResult<f64> {
    match request.alpha {
        Some(alpha) => match validate_alpha(alpha, "request.alpha") {
            Some(error) => Err(ValuationError::InvalidConfig(vec![error])),
            None => Ok(alpha),
        },
        None => Ok(config.alpha),
    }
}

fn resolve_industry(
    request: &ValuationRequest,
    config: &EngineConfig,
) -> ValuationResult<IndustryMultipleRange> {
    let range = match (&request.industry_range, config.industries.get(&request.industry)) {
        (Some(inline), _) => inline.clone(),
        (None, Some(configured)) => configured.clone(),
        (None, None) => {
            return Err(ValuationError::InvalidConfig(vec![format!(
                "industry '{}': no multiple range configured",
                request.industry
            )]))
        }
    };
    let errors = range.validate(&format!("industry '{}'", request.industry));
    if errors.is_empty() {
        Ok(range)
    } else {
        Err(ValuationError::InvalidConfig(errors))
    }
}

fn check_inputs(request: &ValuationRequest, previous: Option<&ValuationSnapshot>) -> ValuationResult<()> {
    let mut problems = request.ebitda.non_finite_fields();
    if let Some(share) = request.top_customer_share {
        if !(0.0..=1.0).contains(&share) {
            problems.push(format!("top_customer_share must be within [0, 1], got {}", share));
        }
    }
    if let Some(prev) = previous {
        if prev.company_id != request.company_id {
            problems.push(format!(
                "previous snapshot belongs to '{}', not '{}'",
                prev.company_id, request.company_id
            ));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ValuationError::InvalidInput(problems.join("; ")))
    }
}
