pub mod categories;
pub mod config;
pub mod factors;
pub mod reconcile;
pub mod responses;
pub mod validation;

pub use categories::{category_scores, weighted_bri, CategoryScore, CategoryWeights};
pub use config::EngineConfig;
pub use factors::{core_score, core_score_breakdown, CoreFactors, CoreScoreBreakdown};
pub use reconcile::{reconcile, ReconciledResponse, Resolution};
pub use responses::{AnswerOption, AssessmentResponse, Category};
pub use validation::validate_engine_config;
