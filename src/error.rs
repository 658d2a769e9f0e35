//! Error taxonomy for Atlas CORE.
//!
//! Startup-fatal configuration errors are separated from per-request failures
//! so callers can tell a broken deployment from a busy one.

use thiserror::Error;

use crate::backend::BackendError;

/// Errors surfaced by the registry, router, residency manager and dispatcher.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("No models configured")]
    NoModelsConfigured,

    #[error("No viable model: budget {budget} bytes is below smallest footprint {smallest} bytes")]
    NoViableModel { budget: u64, smallest: u64 },

    #[error("Duplicate model id in roster: {0}")]
    DuplicateModel(String),

    #[error("Load failed for model {model_id}: {reason}")]
    LoadFailure { model_id: String, reason: String },

    #[error("Timed out after {waited_ms}ms waiting for a resident model")]
    TimedOut { waited_ms: u64 },

    #[error("All candidates failed: {tried:?}")]
    AllCandidatesFailed { tried: Vec<String> },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid roster manifest: {0}")]
    Manifest(String),
}

impl CoreError {
    /// Returns true for configuration errors that must abort startup.
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Self::NoModelsConfigured
                | Self::NoViableModel { .. }
                | Self::DuplicateModel(_)
                | Self::InvalidConfig(_)
                | Self::Manifest(_)
        )
    }

    /// Returns true if this error should be logged as a warning.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::TimedOut { .. } | Self::LoadFailure { .. })
    }

    /// Returns true if the external caller may reasonably retry the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
