//! Inbound request shape.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::Payload;

/// One inference request from the workflow executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Correlation id. Generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub payload: Payload,
    /// Coarse task signal for the fallback rule table.
    #[serde(default)]
    pub task_hint: Option<String>,
    /// Explicit model choice, ranked first when registered.
    #[serde(default)]
    pub model: Option<String>,
    /// Opt in to memory retrieval and remembering.
    #[serde(default)]
    pub use_context: bool,
    /// Overrides the configured acquire timeout.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl InferenceRequest {
    pub fn new(payload: Payload) -> Self {
        Self { payload, ..Default::default() }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_task_hint(mut self, hint: impl Into<String>) -> Self {
        self.task_hint = Some(hint.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_context(mut self) -> Self {
        self.use_context = true;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
