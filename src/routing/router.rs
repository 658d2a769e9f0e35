//! Request → ranked candidate models.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::classifier::Classifier;
use super::features::RequestFeatures;
use super::rules::RuleTable;
use crate::error::CoreError;
use crate::models::{Capability, ModelId, ModelRegistry};

/// Which path produced a routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteSource {
    Explicit,
    Classifier,
    Fallback,
}

impl RouteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteSource::Explicit => "explicit",
            RouteSource::Classifier => "classifier",
            RouteSource::Fallback => "fallback",
        }
    }
}

/// Ordered candidates for one request. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    pub candidates: Vec<ModelId>,
    pub confidence: f32,
    pub source: RouteSource,
}

/// Classifier-driven router with a static rule-table fallback.
pub struct Router {
    registry: Arc<ModelRegistry>,
    classifier: Option<Arc<dyn Classifier>>,
    rules: RuleTable,
    confidence_threshold: f32,
    default_model: ModelId,
}

impl Router {
    pub fn new(
        registry: Arc<ModelRegistry>,
        classifier: Option<Arc<dyn Classifier>>,
        rules: RuleTable,
        confidence_threshold: f32,
        default_model: impl Into<ModelId>,
    ) -> Self {
        Self {
            registry,
            classifier,
            rules,
            confidence_threshold,
            default_model: default_model.into(),
        }
    }

    /// Rank candidate models for a request.
    ///
    /// Deterministic for identical features as long as the classifier is.
    pub async fn route(&self, features: &RequestFeatures) -> Result<RoutingDecision, CoreError> {
        if self.registry.is_empty() {
            return Err(CoreError::NoModelsConfigured);
        }
        let general = self.general_model()?;
        let mut candidates: Vec<ModelId> = Vec::new();

        let explicit = match features.explicit_model.as_deref() {
            Some(name) if self.registry.contains(name) => {
                candidates.push(ModelId::new(name));
                true
            }
            Some(name) => {
                debug!(model_id = %name, "explicit model unknown, ignoring");
                false
            }
            None => false,
        };

        let scores = match &self.classifier {
            Some(classifier) => match classifier.classify(features).await {
                Ok(scores) => Some(scores),
                Err(e) => {
                    debug!(error = %e, "classifier gave no ranking");
                    None
                }
            },
            None => None,
        };
        let confidence = scores.as_ref().map(|s| s.confidence()).unwrap_or(0.0);

        let source = match scores {
            Some(scores) if confidence >= self.confidence_threshold => {
                self.extend_with(&mut candidates, scores.ranked());
                if !candidates.contains(&general) {
                    candidates.push(general);
                }
                RouteSource::Classifier
            }
            _ => {
                self.extend_with(&mut candidates, self.rules.candidates(features).into_iter());
                // The general model always closes a fallback ranking,
                // unless the caller explicitly asked for it.
                let explicit_general = explicit && candidates.first() == Some(&general);
                if !explicit_general {
                    candidates.retain(|c| *c != general);
                    candidates.push(general);
                }
                RouteSource::Fallback
            }
        };

        let (source, confidence) = if explicit {
            (RouteSource::Explicit, 1.0)
        } else {
            (source, confidence)
        };
        debug!(source = source.as_str(), confidence, candidates = ?candidates, "routed");

        Ok(RoutingDecision { candidates, confidence, source })
    }

    fn extend_with(&self, candidates: &mut Vec<ModelId>, caps: impl Iterator<Item = Capability>) {
        for cap in caps {
            for model in self.registry.with_capability(cap) {
                if !candidates.contains(&model.id) {
                    candidates.push(model.id.clone());
                }
            }
        }
    }

    /// The configured default, or the first General-capable model, or the first model.
    fn general_model(&self) -> Result<ModelId, CoreError> {
        if self.registry.contains(self.default_model.as_str()) {
            return Ok(self.default_model.clone());
        }
        self.registry
            .with_capability(Capability::General)
            .next()
            .or_else(|| self.registry.all().first())
            .map(|m| m.id.clone())
            .ok_or(CoreError::NoModelsConfigured)
    }
}
