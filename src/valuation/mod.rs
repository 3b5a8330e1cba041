pub mod adjust;
pub mod ebitda;
pub mod engine;
pub mod gap;
pub mod multiple;
pub mod snapshot;

pub use adjust::{apply_adjustments, AdjustedValuation, AdjustmentProfile, RiskDiscount};
pub use ebitda::{adjusted_ebitda, EbitdaBridge, EbitdaInputs};
pub use engine::{compute_batch, compute_snapshot, ValuationRequest};
pub use gap::{attribute_addressable_gap, decompose_gap, CategoryGap, GapDecomposition};
pub use multiple::{valuation, IndustryMultipleRange, MultipleValuation};
pub use snapshot::{SnapshotDelta, ValuationSnapshot};
