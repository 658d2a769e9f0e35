//! Long-term memory store seam and context injection.
//!
//! Retrieved snippets are prepended to the payload as a system message.
//! They never influence routing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, ChatMessage, Payload};

/// A retrieved piece of prior context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSnippet {
    pub text: String,
    /// Vector distance from the query; lower is closer.
    pub distance: f32,
}

/// Context retrieval limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Maximum snippets injected per request.
    pub top_k: usize,
    /// Snippets at or beyond this distance are discarded.
    pub max_distance: f32,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self { top_k: 3, max_distance: 0.45 }
    }
}

/// Consumed interface of the external memory store.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Snippets ordered by relevance, closest first.
    async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<ContextSnippet>, BackendError>;

    /// Persist a completed response. The default store keeps nothing.
    async fn remember(&self, _request_id: &str, _text: &str) -> Result<(), BackendError> {
        Ok(())
    }
}

const CONTEXT_PREAMBLE: &str = "Relevant past memory (use if helpful):";

/// Keep at most `top_k` snippets closer than `max_distance`, in store order.
pub fn select_snippets(snippets: Vec<ContextSnippet>, config: &ContextConfig) -> Vec<ContextSnippet> {
    snippets
        .into_iter()
        .filter(|s| s.distance < config.max_distance)
        .take(config.top_k)
        .collect()
}

/// Prepend selected snippets as one system message. Returns the number injected.
pub fn inject(payload: &mut Payload, snippets: &[ContextSnippet]) -> usize {
    if snippets.is_empty() {
        return 0;
    }
    let body = snippets
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    payload
        .messages
        .insert(0, ChatMessage::system(format!("{}\n{}", CONTEXT_PREAMBLE, body)));
    snippets.len()
}
