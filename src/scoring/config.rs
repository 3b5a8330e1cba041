use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::categories::CategoryWeights;
use super::factors::RevenueSizeBand;
use crate::valuation::adjust::{SpreadConfig, DEFAULT_DLOM_RATE};
use crate::valuation::multiple::{IndustryMultipleRange, DEFAULT_ALPHA};

/// Engine configuration.
///
/// Passed by value into every computation so that a run can be reproduced
/// from its recorded inputs. Every field has a default, so a partial file
/// only needs to name what it changes.
///
/// Example YAML:
/// ```yaml
/// engine:
///   alpha: 1.4
///   category_weights:
///     FINANCIAL: 0.25
///     TRANSFERABILITY: 0.20
///     OPERATIONAL: 0.20
///     MARKET: 0.15
///     LEGAL_TAX: 0.10
///     PERSONAL: 0.10
///   dlom_rate: 0.15
///   spread: { base: 0.10, coverage_penalty: 0.20 }
///   industries:
///     hvac_services: { low: 3.0, high: 6.0, median: 4.5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct EngineConfig {
    /// Exponent of the buyer-skepticism curve (default: 1.4)
    pub alpha: f64,

    /// System-wide category weights; company overrides are merged over these
    pub category_weights: CategoryWeights,

    /// Score imputed for unassessed categories. When unset they are left out
    /// of the BRI and the remaining weights renormalized.
    pub unassessed_category_score: Option<f64>,

    /// Discount for lack of marketability (default: 0.15)
    pub dlom_rate: f64,

    /// EV band width
    pub spread: SpreadConfig,

    /// Market salary for a replacement manager, per revenue band. Bands not
    /// listed use the built-in table.
    pub owner_comp_benchmarks: BTreeMap<RevenueSizeBand, f64>,

    /// Industry multiple bands keyed by classification name
    pub industries: BTreeMap<String, IndustryMultipleRange>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            category_weights: CategoryWeights::default(),
            unassessed_category_score: None,
            dlom_rate: DEFAULT_DLOM_RATE,
            spread: SpreadConfig::default(),
            owner_comp_benchmarks: BTreeMap::new(),
            industries: BTreeMap::new(),
        }
    }
}
