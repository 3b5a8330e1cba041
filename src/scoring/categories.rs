use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::factors::NEUTRAL_SCORE;
use super::reconcile::ReconciledResponse;
use super::responses::Category;

/// Tolerance on the sum of category weights.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub earned_points: f64,
    pub total_points: f64,
    /// Number of reconciled answers that landed in this category.
    pub answered: usize,
    /// `earned_points / total_points`, or [`NEUTRAL_SCORE`] when nothing was answered.
    pub score: f64,
}

impl CategoryScore {
    pub fn is_assessed(&self) -> bool {
        self.total_points > 0.0
    }
}

/// Category weights used to fold category scores into the BRI.
///
/// Categories missing from the map use the system default weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryWeights(pub BTreeMap<Category, f64>);

impl Default for CategoryWeights {
    fn default() -> Self {
        Self(Category::ALL.iter().map(|c| (*c, default_weight(*c))).collect())
    }
}

/// System-wide default weight of a category.
pub fn default_weight(category: Category) -> f64 {
    match category {
        Category::Financial => 0.25,
        Category::Transferability => 0.20,
        Category::Operational => 0.20,
        Category::Market => 0.15,
        Category::LegalTax => 0.10,
        Category::Personal => 0.10,
    }
}

impl CategoryWeights {
    pub fn weight(&self, category: Category) -> f64 {
        self.0
            .get(&category)
            .copied()
            .unwrap_or_else(|| default_weight(category))
    }

    /// Apply company-specific overrides on top of these weights.
    /// The result still has to pass [`CategoryWeights::validate`].
    pub fn merged_with(&self, overrides: &BTreeMap<Category, f64>) -> CategoryWeights {
        let mut merged: BTreeMap<Category, f64> =
            Category::ALL.iter().map(|c| (*c, self.weight(*c))).collect();
        for (category, weight) in overrides {
            merged.insert(*category, *weight);
        }
        CategoryWeights(merged)
    }

    /// Sum over the six canonical categories.
    pub fn total(&self) -> f64 {
        Category::ALL.iter().map(|c| self.weight(*c)).sum()
    }

    /// Returns every violation found, prefixed with `field`.
    pub fn validate(&self, field: &str) -> Vec<String> {
        let mut errors = Vec::new();

        for category in Category::ALL {
            let weight = self.weight(category);
            if !weight.is_finite() || weight < 0.0 {
                errors.push(format!(
                    "{}.{:?}: must be a non-negative number, got {}",
                    field, category, weight
                ));
            }
        }

        let total = self.total();
        if errors.is_empty() && (total - 1.0).abs() > WEIGHT_SUM_EPSILON {
            errors.push(format!(
                "{}: weights must sum to 1.0 (±{}), got {:.4}",
                field, WEIGHT_SUM_EPSILON, total
            ));
        }

        errors
    }
}

/// Per-category earned/total points over the reconciled answers.
///
/// Always returns the six canonical categories in canonical order.
pub fn category_scores(reconciled: &BTreeMap<String, ReconciledResponse>) -> Vec<CategoryScore> {
    let mut sums: BTreeMap<Category, (f64, f64, usize)> = Category::ALL
        .iter()
        .map(|c| (*c, (0.0, 0.0, 0)))
        .collect();

    for response in reconciled.values() {
        let entry = sums.entry(response.category).or_insert((0.0, 0.0, 0));
        entry.0 += response.weight * response.score_value;
        entry.1 += response.weight;
        entry.2 += 1;
    }

    sums.into_iter()
        .map(|(category, (earned_points, total_points, answered))| {
            let score = if total_points > 0.0 {
                (earned_points / total_points).clamp(0.0, 1.0)
            } else {
                NEUTRAL_SCORE
            };
            CategoryScore {
                category,
                earned_points,
                total_points,
                answered,
                score,
            }
        })
        .collect()
}

/// Weighted Buyer Readiness Index in [0, 1].
///
/// Unassessed categories are skipped and the remaining weights renormalized,
/// unless `unassessed_score` imputes a value for them. With nothing to
/// weigh, the BRI is [`NEUTRAL_SCORE`].
pub fn weighted_bri(
    scores: &[CategoryScore],
    weights: &CategoryWeights,
    unassessed_score: Option<f64>,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for score in scores {
        let weight = weights.weight(score.category);
        let value = if score.is_assessed() {
            Some(score.score)
        } else {
            unassessed_score
        };
        if let Some(value) = value {
            weighted_sum += value * weight;
            weight_sum += weight;
        }
    }

    if weight_sum > 0.0 {
        (weighted_sum / weight_sum).clamp(0.0, 1.0)
    } else {
        NEUTRAL_SCORE
    }
}

/// Share of total category weight that has actually been assessed, in [0, 1].
pub fn assessed_coverage(scores: &[CategoryScore], weights: &CategoryWeights) -> f64 {
    let total: f64 = scores.iter().map(|s| weights.weight(s.category)).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let assessed: f64 = scores
        .iter()
        .filter(|s| s.is_assessed())
        .map(|s| weights.weight(s.category))
        .sum();
    (assessed / total).clamp(0.0, 1.0)
}

/// Score of one category, if it was assessed.
pub fn assessed_score(scores: &[CategoryScore], category: Category) -> Option<f64> {
    scores
        .iter()
        .find(|s| s.category == category && s.is_assessed())
        .map(|s| s.score)
}
