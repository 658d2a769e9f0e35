//! Model catalogue for Atlas CORE.
//!
//! Descriptors, the read-only registry, and roster manifest parsing.

mod descriptor;
mod manifest;
mod registry;

pub use descriptor::{Capability, ModelDescriptor, ModelId};
pub use manifest::{ManifestEntry, RosterManifest};
pub use registry::ModelRegistry;
