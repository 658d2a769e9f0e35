//! Capability classifiers used by the router's primary path.

use aho_corasick::{AhoCorasick, MatchKind};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use super::features::RequestFeatures;
use crate::backend::{ChatMessage, InferenceBackend, Payload};
use crate::error::CoreError;
use crate::models::{Capability, ModelId};

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Classifier reply unparseable: {0}")]
    Unparseable(String),

    #[error("No capability signal in request")]
    NoSignal,
}

/// Probability distribution over capability tags, highest first.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityScores(Vec<(Capability, f32)>);

impl CapabilityScores {
    /// Normalize raw non-negative weights into probabilities.
    ///
    /// Equal probabilities are ordered by `Capability` declaration order.
    pub fn from_weights(weights: impl IntoIterator<Item = (Capability, f32)>) -> Self {
        let mut merged: HashMap<Capability, f32> = HashMap::new();
        for (cap, w) in weights {
            if w > 0.0 {
                *merged.entry(cap).or_insert(0.0) += w;
            }
        }
        let total: f32 = merged.values().sum();
        let mut scores: Vec<(Capability, f32)> = merged
            .into_iter()
            .map(|(cap, w)| (cap, if total > 0.0 { w / total } else { 0.0 }))
            .collect();
        scores.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Self(scores)
    }

    /// Probability of the top tag, 0.0 when empty.
    pub fn confidence(&self) -> f32 {
        self.0.first().map(|(_, p)| *p).unwrap_or(0.0)
    }

    pub fn ranked(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().map(|(cap, _)| *cap)
    }

    pub fn as_slice(&self) -> &[(Capability, f32)] {
        &self.0
    }
}

/// Maps request features to a capability distribution.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, features: &RequestFeatures) -> Result<CapabilityScores, ClassifierError>;
}

/// Smoothing weight added to General whenever any keyword matched.
const GENERAL_PRIOR: f32 = 0.5;

/// Deterministic keyword classifier.
///
/// Counts whole-word keyword hits per capability and adds a long-context
/// signal for oversized prompts.
pub struct KeywordClassifier {
    matcher: AhoCorasick,
    pattern_caps: Vec<Capability>,
    long_context_tokens: usize,
}

impl KeywordClassifier {
    pub fn new(
        table: Vec<(Capability, Vec<String>)>,
        long_context_tokens: usize,
    ) -> Result<Self, CoreError> {
        let mut patterns = Vec::new();
        let mut pattern_caps = Vec::new();
        for (cap, words) in table {
            for word in words {
                patterns.push(word.to_lowercase());
                pattern_caps.push(cap);
            }
        }
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(&patterns)
            .map_err(|e| CoreError::InvalidConfig(format!("keyword table: {}", e)))?;
        Ok(Self { matcher, pattern_caps, long_context_tokens })
    }

    /// Classifier with the built-in keyword table.
    pub fn with_defaults(long_context_tokens: usize) -> Result<Self, CoreError> {
        Self::new(default_keywords(), long_context_tokens)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, features: &RequestFeatures) -> Result<CapabilityScores, ClassifierError> {
        let text = features.text.as_str();
        let mut weights: Vec<(Capability, f32)> = Vec::new();

        for m in self.matcher.find_iter(text) {
            if is_word_boundary(text, m.start(), m.end()) {
                weights.push((self.pattern_caps[m.pattern().as_usize()], 1.0));
            }
        }
        if features.approx_tokens >= self.long_context_tokens {
            weights.push((Capability::LongContext, 2.0));
        }
        if weights.is_empty() {
            return Err(ClassifierError::NoSignal);
        }
        weights.push((Capability::General, GENERAL_PRIOR));
        Ok(CapabilityScores::from_weights(weights))
    }
}

fn is_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

fn default_keywords() -> Vec<(Capability, Vec<String>)> {
    let table: [(Capability, &[&str]); 7] = [
        (
            Capability::Code,
            &["code", "function", "compile", "bug", "rust", "python", "refactor", "stack trace", "regex", "sql"],
        ),
        (Capability::Reasoning, &["why", "explain", "prove", "analyze", "step by step", "plan"]),
        (Capability::Math, &["calculate", "equation", "integral", "derivative", "probability", "solve"]),
        (Capability::Creative, &["story", "poem", "lyrics", "imagine", "fiction"]),
        (Capability::Summarization, &["summarize", "summary", "tl;dr", "condense"]),
        (Capability::LongContext, &["entire document", "whole file", "full transcript"]),
        (Capability::Vision, &["image", "photo", "screenshot", "diagram"]),
    ];
    table
        .iter()
        .map(|(cap, words)| (*cap, words.iter().map(|w| w.to_string()).collect()))
        .collect()
}

/// Asks an auxiliary routing model which capability fits the request.
///
/// The routing model is expected to stay loaded by the backend outside the
/// residency budget. A recognized reply yields a single tag at confidence 1.0.
pub struct RouteModelClassifier {
    backend: Arc<dyn InferenceBackend>,
    router_model: ModelId,
    reply_pattern: Regex,
}

impl RouteModelClassifier {
    pub fn new(backend: Arc<dyn InferenceBackend>, router_model: impl Into<ModelId>) -> Result<Self, CoreError> {
        let reply_pattern = Regex::new(r#"(?s)\{.*?"route"\s*:\s*"([^"]+)""#)
            .map_err(|e| CoreError::InvalidConfig(e.to_string()))?;
        Ok(Self { backend, router_model: router_model.into(), reply_pattern })
    }

    fn prompt(&self, features: &RequestFeatures) -> Payload {
        let routes = Capability::ALL
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let instruction = format!(
            "You are a precise route selector. Use ONLY these routes: {}. \
             If no route fits, answer \"other\". \
             Output EXACTLY {{\"route\": \"<name>\"}} and nothing else.",
            routes
        );
        let mut payload = Payload::new(vec![
            ChatMessage::system(instruction),
            ChatMessage::user(features.text.clone()),
        ]);
        payload.parameters.insert("temperature".into(), 0.0.into());
        payload.parameters.insert("max_tokens".into(), 64.into());
        payload
    }

    /// Extract the route name from a possibly noisy model reply.
    pub fn parse_reply(&self, reply: &str) -> Result<Capability, ClassifierError> {
        let route = match self.reply_pattern.captures(reply) {
            Some(caps) => caps[1].to_string(),
            None => {
                let cleaned = reply.replace(['\'', '`'], "\"");
                let value: serde_json::Value = serde_json::from_str(cleaned.trim())
                    .map_err(|_| ClassifierError::Unparseable(reply.to_string()))?;
                value
                    .get("route")
                    .and_then(|r| r.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| ClassifierError::Unparseable(reply.to_string()))?
            }
        };
        if route.eq_ignore_ascii_case("other") {
            return Err(ClassifierError::NoSignal);
        }
        route
            .parse::<Capability>()
            .map_err(|_| ClassifierError::Unparseable(route))
    }
}

#[async_trait]
impl Classifier for RouteModelClassifier {
    async fn classify(&self, features: &RequestFeatures) -> Result<CapabilityScores, ClassifierError> {
        let output = self
            .backend
            .invoke(&self.router_model, &self.prompt(features))
            .await
            .map_err(|e| ClassifierError::Unavailable(e.to_string()))?;
        let cap = self.parse_reply(&output.content)?;
        Ok(CapabilityScores::from_weights([(cap, 1.0)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendError, InferenceOutput};

    struct Unused;

    #[async_trait]
    impl InferenceBackend for Unused {
        async fn load(&self, _: &ModelId) -> Result<(), BackendError> {
            Ok(())
        }
        async fn unload(&self, _: &ModelId) -> Result<(), BackendError> {
            Ok(())
        }
        async fn invoke(&self, _: &ModelId, _: &Payload) -> Result<InferenceOutput, BackendError> {
            Err(BackendError::Unavailable("unused".into()))
        }
    }

    fn route_classifier() -> RouteModelClassifier {
        RouteModelClassifier::new(Arc::new(Unused), "arch-router").unwrap()
    }

    #[tokio::test]
    async fn keyword_hits_rank_capabilities() {
        let classifier = KeywordClassifier::with_defaults(4096).unwrap();
        let features = RequestFeatures::from_text("Fix this Rust function, it has a bug");
        let scores = classifier.classify(&features).await.unwrap();
        assert_eq!(scores.ranked().next(), Some(Capability::Code));
        assert!(scores.confidence() > 0.8);
    }

    #[tokio::test]
    async fn keywords_require_word_boundaries() {
        let classifier = KeywordClassifier::with_defaults(4096).unwrap();
        let features = RequestFeatures::from_text("please decode nothing");
        assert!(matches!(
            classifier.classify(&features).await,
            Err(ClassifierError::NoSignal)
        ));
    }

    #[tokio::test]
    async fn long_prompts_signal_long_context() {
        let classifier = KeywordClassifier::with_defaults(10).unwrap();
        let features = RequestFeatures::from_text(&"lorem ipsum ".repeat(10));
        let scores = classifier.classify(&features).await.unwrap();
        assert_eq!(scores.ranked().next(), Some(Capability::LongContext));
    }

    #[test]
    fn equal_scores_break_ties_by_declaration_order() {
        let scores = CapabilityScores::from_weights([
            (Capability::Math, 1.0),
            (Capability::Code, 1.0),
        ]);
        let ranked: Vec<_> = scores.ranked().collect();
        assert_eq!(ranked, vec![Capability::Code, Capability::Math]);
        assert!((scores.confidence() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn parses_clean_and_noisy_replies() {
        let c = route_classifier();
        assert_eq!(c.parse_reply(r#"{"route": "code"}"#).unwrap(), Capability::Code);
        assert_eq!(
            c.parse_reply("Sure!\n```{\"route\" : \"long_context\"}```").unwrap(),
            Capability::LongContext
        );
        assert_eq!(c.parse_reply("{'route': 'math'}").unwrap(), Capability::Math);
    }

    #[test]
    fn other_and_garbage_replies_are_errors() {
        let c = route_classifier();
        assert!(matches!(c.parse_reply(r#"{"route": "other"}"#), Err(ClassifierError::NoSignal)));
        assert!(matches!(c.parse_reply("no idea"), Err(ClassifierError::Unparseable(_))));
        assert!(matches!(
            c.parse_reply(r#"{"route": "astrology"}"#),
            Err(ClassifierError::Unparseable(_))
        ));
    }

    #[tokio::test]
    async fn unavailable_backend_is_reported() {
        let c = route_classifier();
        let result = c.classify(&RequestFeatures::from_text("hello")).await;
        assert!(matches!(result, Err(ClassifierError::Unavailable(_))));
    }
}
