//! Inference backend seam.
//!
//! The backend owns model weights and kernels. Atlas CORE only asks it to
//! load, unload and invoke, and never interprets payload contents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ModelId;

/// Errors reported by an inference backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend load failed: {0}")]
    Load(String),

    #[error("Backend unload failed: {0}")]
    Unload(String),

    #[error("Backend invocation failed: {0}")]
    Invoke(String),

    #[error("Backend timed out after {0}ms")]
    Timeout(u64),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Chat message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Opaque request payload forwarded to the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub messages: Vec<ChatMessage>,
    /// Sampling parameters and other backend-specific options.
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl Payload {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages, parameters: serde_json::Map::new() }
    }

    /// Content of the most recent user message, if any.
    pub fn latest_user_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

/// Result of one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceOutput {
    pub content: String,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Consumed interface of the external inference backend.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Make a model resident. Called at most once per Loading transition.
    async fn load(&self, model_id: &ModelId) -> Result<(), BackendError>;

    /// Release a resident model's memory.
    async fn unload(&self, model_id: &ModelId) -> Result<(), BackendError>;

    /// Run inference on a resident model.
    async fn invoke(
        &self,
        model_id: &ModelId,
        payload: &Payload,
    ) -> Result<InferenceOutput, BackendError>;

    /// Whether the backend still holds `model_id` in memory.
    ///
    /// Asked before an idle resident model is handed out again. Backends
    /// whose model servers can die underneath them should override this;
    /// `false` demotes the model to unloaded and it is reloaded.
    async fn is_resident(&self, _model_id: &ModelId) -> bool {
        true
    }
}
