use thiserror::Error;

/// Errors surfaced by the valuation engine.
///
/// Both variants are contract violations: the engine is pure math, so
/// nothing here is worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValuationError {
    /// Operator misconfiguration (weights, alpha, industry band, ...).
    /// Carries every violation found, not just the first.
    #[error("invalid configuration: {}", .0.join("; "))]
    InvalidConfig(Vec<String>),

    /// A request value the engine cannot reason about (NaN, infinity, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ValuationError {
    /// Individual messages, one per violation.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ValuationError::InvalidConfig(errors) => errors.clone(),
            ValuationError::InvalidInput(msg) => vec![msg.clone()],
        }
    }
}

pub type ValuationResult<T> = Result<T, ValuationError>;
