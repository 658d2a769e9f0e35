//! Roster manifest parsing and validation.
//!
//! A roster lists every model the engine may route to, in TOML or JSON.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::descriptor::{Capability, ModelDescriptor};
use super::registry::ModelRegistry;
use crate::error::CoreError;

/// One model entry in a roster manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Unique model identifier (e.g., "general_fast").
    pub id: String,
    /// Resident memory footprint in bytes.
    pub footprint_bytes: u64,
    pub capabilities: Vec<Capability>,
    /// Approximate load time in milliseconds.
    #[serde(default)]
    pub load_cost_ms: u64,
    #[serde(default)]
    pub description: String,
}

/// Model roster loaded at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterManifest {
    #[serde(default)]
    pub models: Vec<ManifestEntry>,
}

impl RosterManifest {
    /// Load a manifest file; `.json` files are parsed as JSON, anything else as TOML.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Manifest(format!("failed to read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Manifest(format!("invalid TOML: {}", e)))
    }

    pub fn from_json(content: &str) -> Result<Self, CoreError> {
        serde_json::from_str(content)
            .map_err(|e| CoreError::Manifest(format!("invalid JSON: {}", e)))
    }

    /// Validate entry fields for correctness.
    pub fn validate(&self) -> Result<(), CoreError> {
        for entry in &self.models {
            if entry.id.trim().is_empty() {
                return Err(CoreError::Manifest("model id cannot be empty".into()));
            }
            if entry.footprint_bytes == 0 {
                return Err(CoreError::Manifest(format!(
                    "model {} has zero footprint",
                    entry.id
                )));
            }
            if entry.capabilities.is_empty() {
                return Err(CoreError::Manifest(format!(
                    "model {} declares no capabilities",
                    entry.id
                )));
            }
        }
        Ok(())
    }

    pub fn descriptors(&self) -> Vec<ModelDescriptor> {
        self.models
            .iter()
            .map(|e| ModelDescriptor {
                id: e.id.as_str().into(),
                footprint_bytes: e.footprint_bytes,
                capabilities: e.capabilities.clone(),
                load_cost: Duration::from_millis(e.load_cost_ms),
                description: e.description.clone(),
            })
            .collect()
    }

    /// Validate and build the registry.
    pub fn into_registry(self) -> Result<ModelRegistry, CoreError> {
        self.validate()?;
        ModelRegistry::new(self.descriptors())
    }
}
