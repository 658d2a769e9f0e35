//! Static model descriptors: identity, footprint, capabilities, load cost.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Unique model identity, cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelId(Arc<str>);

impl ModelId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ModelId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ModelId {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

/// Task category a model is suited for.
///
/// Declaration order is the tie-break order when the classifier reports
/// equal probabilities for two tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    General,
    Code,
    Reasoning,
    Math,
    LongContext,
    Creative,
    Summarization,
    Vision,
}

impl Capability {
    pub const ALL: [Capability; 8] = [
        Capability::General,
        Capability::Code,
        Capability::Reasoning,
        Capability::Math,
        Capability::LongContext,
        Capability::Creative,
        Capability::Summarization,
        Capability::Vision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::General => "general",
            Capability::Code => "code",
            Capability::Reasoning => "reasoning",
            Capability::Math => "math",
            Capability::LongContext => "long_context",
            Capability::Creative => "creative",
            Capability::Summarization => "summarization",
            Capability::Vision => "vision",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = ();

    /// Accepts snake_case names plus the hyphenated spellings used in task hints.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Capability::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or(())
    }
}

/// Immutable description of a model known to the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    pub id: ModelId,
    /// Bytes counted against the memory budget while Loading or Resident.
    pub footprint_bytes: u64,
    pub capabilities: Vec<Capability>,
    /// Approximate wall time to become resident.
    pub load_cost: Duration,
    pub description: String,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<ModelId>, footprint_bytes: u64, capabilities: Vec<Capability>) -> Self {
        Self {
            id: id.into(),
            footprint_bytes,
            capabilities,
            load_cost: Duration::ZERO,
            description: String::new(),
        }
    }

    pub fn with_load_cost(mut self, load_cost: Duration) -> Self {
        self.load_cost = load_cost;
        self
    }

    pub fn has_capability(&self, cap: Capability) -> bool {
        self.capabilities.contains(&cap)
    }
}
