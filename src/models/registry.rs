//! Read-only catalogue of known models.

use std::collections::HashMap;

use super::descriptor::{Capability, ModelDescriptor, ModelId};
use crate::error::CoreError;

/// Static registry of model descriptors, fixed after startup.
///
/// Lookup order is declaration order, so iteration is deterministic.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: Vec<ModelDescriptor>,
    index: HashMap<ModelId, usize>,
}

impl ModelRegistry {
    /// Build a registry, rejecting duplicate ids.
    ///
    /// An empty roster is accepted here; startup validation reports it as
    /// `NoModelsConfigured`.
    pub fn new(models: Vec<ModelDescriptor>) -> Result<Self, CoreError> {
        let mut index = HashMap::with_capacity(models.len());
        for (i, model) in models.iter().enumerate() {
            if index.insert(model.id.clone(), i).is_some() {
                return Err(CoreError::DuplicateModel(model.id.to_string()));
            }
        }
        Ok(Self { models, index })
    }

    /// Apply per-model footprint overrides. Unknown ids are rejected.
    pub fn with_footprint_overrides(
        mut self,
        overrides: &HashMap<String, u64>,
    ) -> Result<Self, CoreError> {
        for (id, bytes) in overrides {
            let i = *self
                .index
                .get(id.as_str())
                .ok_or_else(|| CoreError::NotFound(id.clone()))?;
            self.models[i].footprint_bytes = *bytes;
        }
        Ok(self)
    }

    pub fn describe(&self, model_id: &str) -> Result<&ModelDescriptor, CoreError> {
        self.index
            .get(model_id)
            .map(|&i| &self.models[i])
            .ok_or_else(|| CoreError::NotFound(model_id.to_string()))
    }

    pub fn all(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.index.contains_key(model_id)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models declaring `cap`, in declaration order.
    pub fn with_capability(&self, cap: Capability) -> impl Iterator<Item = &ModelDescriptor> {
        self.models.iter().filter(move |m| m.has_capability(cap))
    }

    /// Footprint of the smallest model, if any.
    pub fn smallest_footprint(&self) -> Option<u64> {
        self.models.iter().map(|m| m.footprint_bytes).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("general", 4, vec![Capability::General]),
            ModelDescriptor::new("coder", 6, vec![Capability::Code, Capability::Reasoning]),
            ModelDescriptor::new("coder-small", 2, vec![Capability::Code]),
        ]
    }

    #[test]
    fn describe_known_and_unknown() {
        let registry = ModelRegistry::new(roster()).unwrap();
        assert_eq!(registry.describe("coder").unwrap().footprint_bytes, 6);
        assert!(matches!(registry.describe("nope"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut models = roster();
        models.push(ModelDescriptor::new("general", 1, vec![]));
        assert!(matches!(
            ModelRegistry::new(models),
            Err(CoreError::DuplicateModel(id)) if id == "general"
        ));
    }

    #[test]
    fn capability_lookup_preserves_declaration_order() {
        let registry = ModelRegistry::new(roster()).unwrap();
        let ids: Vec<_> = registry
            .with_capability(Capability::Code)
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, vec!["coder", "coder-small"]);
    }

    #[test]
    fn overrides_replace_footprints() {
        let overrides = HashMap::from([("coder".to_string(), 9)]);
        let registry = ModelRegistry::new(roster())
            .unwrap()
            .with_footprint_overrides(&overrides)
            .unwrap();
        assert_eq!(registry.describe("coder").unwrap().footprint_bytes, 9);
        assert_eq!(registry.smallest_footprint(), Some(2));

        let bad = HashMap::from([("ghost".to_string(), 1)]);
        let err = ModelRegistry::new(roster()).unwrap().with_footprint_overrides(&bad);
        assert!(matches!(err, Err(CoreError::NotFound(_))));
    }
}
