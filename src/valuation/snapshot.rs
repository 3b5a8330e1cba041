use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::adjust::AdjustedValuation;
use super::ebitda::EbitdaBridge;
use super::gap::{CategoryGap, GapDecomposition};
use super::multiple::{IndustryMultipleRange, MultipleValuation};
use crate::scoring::categories::CategoryScore;
use crate::scoring::factors::CoreScoreBreakdown;
use crate::scoring::responses::Category;

/// On-disk format version of [`ValuationSnapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything one engine run computed, plus the adjustments that produced it.
///
/// Built once per completed assessment round and never modified; a new round
/// produces a new snapshot pointing at its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationSnapshot {
    pub version: u32,
    pub engine_version: String,
    pub id: String,
    pub company_id: String,
    pub round_id: String,
    pub as_of: DateTime<Utc>,
    #[serde(default)]
    pub previous_snapshot_id: Option<String>,

    pub industry: String,
    pub industry_range: IndustryMultipleRange,
    pub alpha: f64,

    pub core: CoreScoreBreakdown,
    pub bri_score: f64,
    pub category_scores: Vec<CategoryScore>,
    pub assessed_coverage: f64,
    pub answered_questions: usize,

    pub ebitda: EbitdaBridge,
    pub multiple: MultipleValuation,
    pub adjusted: AdjustedValuation,
    pub gap: GapDecomposition,
    pub category_gaps: Vec<CategoryGap>,
}

impl ValuationSnapshot {
    pub fn snapshot_id(company_id: &str, round_id: &str) -> String {
        format!("{}:{}", company_id, round_id)
    }

    /// Core Score on the 0-100 scale used in reports.
    pub fn core_points(&self) -> f64 {
        self.core.score * 100.0
    }

    /// BRI on the 0-100 scale used in reports.
    pub fn bri_points(&self) -> f64 {
        self.bri_score * 100.0
    }

    /// False when dollar values are zero because EBITDA was never supplied.
    pub fn has_ebitda(&self) -> bool {
        self.ebitda.adjusted_ebitda.is_some()
    }

    pub fn category_score(&self, category: Category) -> Option<&CategoryScore> {
        self.category_scores.iter().find(|s| s.category == category)
    }

    /// Before/after report against an earlier snapshot.
    pub fn delta_from(&self, previous: &ValuationSnapshot) -> SnapshotDelta {
        let categories = Category::ALL
            .iter()
            .filter_map(|category| {
                let before = previous.category_score(*category)?;
                let after = self.category_score(*category)?;
                if !before.is_assessed() && !after.is_assessed() {
                    return None;
                }
                Some(CategoryChange {
                    category: *category,
                    change: Change::new(before.score * 100.0, after.score * 100.0),
                })
            })
            .collect();

        SnapshotDelta {
            previous_id: previous.id.clone(),
            current_id: self.id.clone(),
            core_score: Change::new(previous.core_points(), self.core_points()),
            bri: Change::new(previous.bri_points(), self.bri_points()),
            final_multiple: Change::new(
                previous.multiple.final_multiple,
                self.multiple.final_multiple,
            ),
            current_value: Change::new(
                previous.multiple.current_value,
                self.multiple.current_value,
            ),
            ev_mid: Change::new(previous.adjusted.ev_mid, self.adjusted.ev_mid),
            addressable_gap: Change::new(previous.gap.addressable_gap, self.gap.addressable_gap),
            structural_gap: Change::new(previous.gap.structural_gap, self.gap.structural_gap),
            aspirational_gap: Change::new(
                previous.gap.aspirational_gap,
                self.gap.aspirational_gap,
            ),
            categories,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub before: f64,
    pub after: f64,
    pub delta: f64,
}

impl Change {
    pub fn new(before: f64, after: f64) -> Self {
        Self {
            before,
            after,
            delta: after - before,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub category: Category,
    pub change: Change,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDelta {
    pub previous_id: String,
    pub current_id: String,
    pub core_score: Change,
    pub bri: Change,
    pub final_multiple: Change,
    pub current_value: Change,
    pub ev_mid: Change,
    pub addressable_gap: Change,
    pub structural_gap: Change,
    pub aspirational_gap: Change,
    pub categories: Vec<CategoryChange>,
}
