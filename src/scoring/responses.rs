use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The six buyer-readiness categories, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Financial,
    Transferability,
    Operational,
    Market,
    LegalTax,
    Personal,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Financial,
        Category::Transferability,
        Category::Operational,
        Category::Market,
        Category::LegalTax,
        Category::Personal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Financial => "Financial",
            Category::Transferability => "Transferability",
            Category::Operational => "Operational",
            Category::Market => "Market",
            Category::LegalTax => "Legal/Tax",
            Category::Personal => "Personal",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A concrete answer choice and the readiness score it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerOption {
    pub id: String,
    pub score_value: f64,
}

/// One answer to one question, as recorded in a single assessment round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssessmentResponse {
    pub question_id: String,
    pub category: Category,
    /// Maximum impact points of the question.
    pub weight: f64,
    /// `None` when the question was skipped.
    #[serde(default)]
    pub selected: Option<AnswerOption>,
    pub source_round: String,
    pub updated_at: DateTime<Utc>,
    /// Upgrade recorded after the original answer, e.g. on completing a
    /// remediation task. Wins over `selected`.
    #[serde(default, rename = "override")]
    pub override_option: Option<AnswerOption>,
}

impl AssessmentResponse {
    pub fn score_value(&self) -> Option<f64> {
        self.selected.as_ref().map(|o| o.score_value)
    }

    pub fn override_option_id(&self) -> Option<&str> {
        self.override_option.as_ref().map(|o| o.id.as_str())
    }

    /// True when neither a selection nor an override can be resolved.
    pub fn is_unanswered(&self) -> bool {
        self.selected.is_none() && self.override_option.is_none()
    }
}
