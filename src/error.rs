//! Error kinds surfaced by the generation engine

use thiserror::Error;

use crate::store::StoreError;

/// Failures of the generation engine.
///
/// `generate` returns only `SchemaInvalid` and `InvalidRequest`. Provider
/// outages and budget denials degrade to deterministic drafts; their variants
/// label the usage event and the warning logged for the fallback. `Store`
/// carries persistence failures from background work, which are logged and
/// dropped.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("model output failed schema validation: {0}")]
    SchemaInvalid(String),

    #[error("{0}")]
    BudgetExceeded(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GenerationError {
    /// Stable code written to usage events
    pub fn code(&self) -> &'static str {
        match self {
            GenerationError::ProviderUnavailable(_) => "provider_unavailable",
            GenerationError::SchemaInvalid(_) => "schema_invalid",
            GenerationError::BudgetExceeded(_) => "budget_exceeded",
            GenerationError::Store(_) => "store_error",
            GenerationError::InvalidRequest(_) => "invalid_request",
        }
    }
}
