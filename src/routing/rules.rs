//! Static fallback rules keyed on coarse request signals.

use std::collections::BTreeMap;

use super::features::RequestFeatures;
use crate::models::Capability;

/// Task-hint → capability table used when the classifier is unsure.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: BTreeMap<String, Vec<Capability>>,
    long_context_tokens: usize,
}

impl RuleTable {
    pub fn empty(long_context_tokens: usize) -> Self {
        Self { rules: BTreeMap::new(), long_context_tokens }
    }

    /// Built-in hint vocabulary.
    pub fn with_defaults(long_context_tokens: usize) -> Self {
        Self::empty(long_context_tokens)
            .with_rule("chat", &[Capability::General])
            .with_rule("code", &[Capability::Code])
            .with_rule("debug", &[Capability::Code, Capability::Reasoning])
            .with_rule("math", &[Capability::Math, Capability::Reasoning])
            .with_rule("analyze", &[Capability::Reasoning])
            .with_rule("summarize", &[Capability::Summarization, Capability::LongContext])
            .with_rule("write", &[Capability::Creative])
            .with_rule("image", &[Capability::Vision])
    }

    pub fn with_rule(mut self, hint: &str, caps: &[Capability]) -> Self {
        self.rules.insert(hint.to_lowercase(), caps.to_vec());
        self
    }

    /// Capabilities implied by the request's coarse signals, most specific first.
    ///
    /// Unknown hints that name a capability directly are accepted as that
    /// capability. May be empty; the router appends the default model.
    pub fn candidates(&self, features: &RequestFeatures) -> Vec<Capability> {
        let mut caps = Vec::new();
        if let Some(hint) = features.task_hint.as_deref() {
            if let Some(mapped) = self.rules.get(hint) {
                caps.extend(mapped.iter().copied());
            } else if let Ok(cap) = hint.parse::<Capability>() {
                caps.push(cap);
            }
        }
        if features.approx_tokens >= self.long_context_tokens && !caps.contains(&Capability::LongContext) {
            caps.push(Capability::LongContext);
        }
        caps
    }
}
