//! Compact request features consumed by the router.

use unicode_normalization::UnicodeNormalization;

use crate::backend::Payload;

/// Conservative bytes-per-token estimate, ~4 bytes per token for English text.
const BYTES_PER_TOKEN_ESTIMATE: usize = 4;

/// Routing-relevant signals extracted from a request.
///
/// Extraction is pure, so identical requests produce identical features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestFeatures {
    /// NFKC-normalized, lowercased text of the latest user message.
    pub text: String,
    /// Caller-provided task hint (e.g. "code", "summarize").
    pub task_hint: Option<String>,
    /// Model explicitly requested by the caller.
    pub explicit_model: Option<String>,
    /// Estimated prompt size across all messages.
    pub approx_tokens: usize,
    pub message_count: usize,
}

impl RequestFeatures {
    pub fn extract(payload: &Payload, task_hint: Option<&str>, explicit_model: Option<&str>) -> Self {
        let text = payload
            .latest_user_text()
            .map(normalize)
            .unwrap_or_default();
        let total_bytes: usize = payload.messages.iter().map(|m| m.content.len()).sum();

        Self {
            text,
            task_hint: task_hint
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty()),
            explicit_model: explicit_model
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty()),
            approx_tokens: total_bytes / BYTES_PER_TOKEN_ESTIMATE,
            message_count: payload.messages.len(),
        }
    }

    /// Features for bare text, used by tests and the route-model classifier.
    pub fn from_text(text: &str) -> Self {
        Self {
            text: normalize(text),
            task_hint: None,
            explicit_model: None,
            approx_tokens: text.len() / BYTES_PER_TOKEN_ESTIMATE,
            message_count: 1,
        }
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.task_hint = Some(hint.trim().to_lowercase());
        self
    }
}

fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}
