//! Runtime configuration.
//!
//! Values come from `ATLAS_CORE_*` environment variables or a TOML file,
//! with safe defaults. Invalid environment values fall back to defaults
//! without crashing; [`CoreConfig::validate`] is the startup gate.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `ATLAS_CORE_MEMORY_BUDGET` | 8589934592 | Residency budget (bytes) |
//! | `ATLAS_CORE_FOOTPRINT_OVERRIDES` | (none) | `id=bytes,id=bytes` |
//! | `ATLAS_CORE_ROUTER_THRESHOLD` | 0.35 | Minimum classifier confidence |
//! | `ATLAS_CORE_DEFAULT_MODEL` | general_fast | General-purpose fallback model |
//! | `ATLAS_CORE_ACQUIRE_TIMEOUT` | 30 | Residency wait limit (secs) |
//! | `ATLAS_CORE_MAX_RESIDENT` | 0 | Resident model cap (0 = unlimited) |
//! | `ATLAS_CORE_IDLE_TIMEOUT` | 600 | Idle eviction age (secs, 0 = off) |
//! | `ATLAS_CORE_IDLE_SWEEP` | 60 | Idle reaper interval (secs) |
//! | `ATLAS_CORE_CONTEXT_TOP_K` | 3 | Max memory snippets per request |
//! | `ATLAS_CORE_CONTEXT_MAX_DISTANCE` | 0.45 | Snippet distance cutoff |
//! | `ATLAS_CORE_LONG_CONTEXT_TOKENS` | 4096 | Long-context routing threshold |
//! | `ATLAS_CORE_LOG_LEVEL` | info | Log filter directives |
//! | `ATLAS_CORE_LOG_FORMAT` | json | `json` or `pretty` |
//! | `ATLAS_CORE_LOG_FILE` | (stderr) | Main log output path |
//! | `ATLAS_CORE_AUDIT_LOG` | (none) | Separate audit record file |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::context::ContextConfig;
use crate::error::CoreError;
use crate::models::ModelRegistry;
use crate::residency::ResidencyConfig;
use crate::telemetry::{LogConfig, LogFormat};

const DEFAULT_BUDGET_BYTES: u64 = 8 * 1024 * 1024 * 1024;
const DEFAULT_THRESHOLD: f32 = 0.35;
const DEFAULT_MODEL: &str = "general_fast";

/// All runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub memory_budget_bytes: u64,
    /// Replace declared footprints by model id.
    pub footprint_overrides: HashMap<String, u64>,
    pub router_confidence_threshold: f32,
    pub default_model: String,
    #[serde(rename = "acquire_timeout_secs", with = "secs")]
    pub acquire_timeout: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_resident_models: Option<usize>,
    #[serde(rename = "idle_timeout_secs", with = "opt_secs", skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<Duration>,
    #[serde(rename = "idle_sweep_interval_secs", with = "secs")]
    pub idle_sweep_interval: Duration,
    pub context: ContextConfig,
    pub long_context_tokens: usize,
    pub logging: LogConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            memory_budget_bytes: DEFAULT_BUDGET_BYTES,
            footprint_overrides: HashMap::new(),
            router_confidence_threshold: DEFAULT_THRESHOLD,
            default_model: DEFAULT_MODEL.to_string(),
            acquire_timeout: Duration::from_secs(30),
            max_resident_models: None,
            idle_timeout: Some(Duration::from_secs(600)),
            idle_sweep_interval: Duration::from_secs(60),
            context: ContextConfig::default(),
            long_context_tokens: 4096,
            logging: LogConfig::default(),
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::InvalidConfig(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn residency(&self) -> ResidencyConfig {
        ResidencyConfig {
            budget_bytes: self.memory_budget_bytes,
            max_resident_models: self.max_resident_models,
        }
    }

    /// Startup validation against the model roster.
    ///
    /// Footprint overrides are taken into account whether or not they have
    /// already been applied to `registry`.
    pub fn validate(&self, registry: &ModelRegistry) -> Result<(), CoreError> {
        if registry.is_empty() {
            return Err(CoreError::NoModelsConfigured);
        }
        if !(0.0..=1.0).contains(&self.router_confidence_threshold) {
            return Err(CoreError::InvalidConfig(format!(
                "router_confidence_threshold {} outside [0, 1]",
                self.router_confidence_threshold
            )));
        }
        if self.max_resident_models == Some(0) {
            return Err(CoreError::InvalidConfig("max_resident_models must be at least 1".into()));
        }
        for id in self.footprint_overrides.keys() {
            if !registry.contains(id) {
                return Err(CoreError::NotFound(id.clone()));
            }
        }

        let footprint = |id: &str, declared: u64| self.footprint_overrides.get(id).copied().unwrap_or(declared);
        let smallest = registry
            .all()
            .iter()
            .map(|d| footprint(d.id.as_str(), d.footprint_bytes))
            .min()
            .unwrap_or(0);
        if smallest > self.memory_budget_bytes {
            return Err(CoreError::NoViableModel { budget: self.memory_budget_bytes, smallest });
        }

        let default = registry.describe(&self.default_model)?;
        let default_footprint = footprint(default.id.as_str(), default.footprint_bytes);
        if default_footprint > self.memory_budget_bytes {
            return Err(CoreError::NoViableModel {
                budget: self.memory_budget_bytes,
                smallest: default_footprint,
            });
        }
        Ok(())
    }
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse an `f32` env var, returning `default` on missing, invalid or non-finite.
fn parse_f32(key: &str, default: f32) -> f32 {
    match std::env::var(key) {
        Ok(val) => val
            .trim()
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse `id=bytes,id=bytes`. Malformed pairs are skipped.
fn parse_overrides(key: &str) -> HashMap<String, u64> {
    let Ok(raw) = std::env::var(key) else {
        return HashMap::new();
    };
    raw.split(',')
        .filter_map(|pair| {
            let (id, bytes) = pair.split_once('=')?;
            let id = id.trim();
            let bytes = bytes.trim().parse::<u64>().ok()?;
            (!id.is_empty() && bytes > 0).then(|| (id.to_string(), bytes))
        })
        .collect()
}

/// Load configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> CoreConfig {
    let budget = parse_u64("ATLAS_CORE_MEMORY_BUDGET", DEFAULT_BUDGET_BYTES).max(1);
    let threshold = parse_f32("ATLAS_CORE_ROUTER_THRESHOLD", DEFAULT_THRESHOLD).clamp(0.0, 1.0);
    let default_model = std::env::var("ATLAS_CORE_DEFAULT_MODEL")
        .ok()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let acquire_secs = parse_u64("ATLAS_CORE_ACQUIRE_TIMEOUT", 30).max(1);
    let max_resident = parse_usize("ATLAS_CORE_MAX_RESIDENT", 0);
    let idle_secs = parse_u64("ATLAS_CORE_IDLE_TIMEOUT", 600);
    let sweep_secs = parse_u64("ATLAS_CORE_IDLE_SWEEP", 60).max(1);
    let top_k = parse_usize("ATLAS_CORE_CONTEXT_TOP_K", 3);
    let max_distance = parse_f32("ATLAS_CORE_CONTEXT_MAX_DISTANCE", 0.45).max(0.0);
    let long_context = parse_usize("ATLAS_CORE_LONG_CONTEXT_TOKENS", 4096).max(1);

    CoreConfig {
        memory_budget_bytes: budget,
        footprint_overrides: parse_overrides("ATLAS_CORE_FOOTPRINT_OVERRIDES"),
        router_confidence_threshold: threshold,
        default_model,
        acquire_timeout: Duration::from_secs(acquire_secs),
        max_resident_models: (max_resident > 0).then_some(max_resident),
        idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
        idle_sweep_interval: Duration::from_secs(sweep_secs),
        context: ContextConfig { top_k, max_distance },
        long_context_tokens: long_context,
        logging: load_logging(),
    }
}

fn load_logging() -> LogConfig {
    let non_empty = |key: &str| {
        std::env::var(key)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    let defaults = LogConfig::default();
    LogConfig {
        format: non_empty("ATLAS_CORE_LOG_FORMAT")
            .and_then(|f| LogFormat::parse(&f))
            .unwrap_or(defaults.format),
        level: non_empty("ATLAS_CORE_LOG_LEVEL").unwrap_or(defaults.level),
        output_path: non_empty("ATLAS_CORE_LOG_FILE").map(PathBuf::from),
        audit_path: non_empty("ATLAS_CORE_AUDIT_LOG").map(PathBuf::from),
    }
}

/// Durations as (possibly fractional) seconds in config files.
mod secs {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = f64::deserialize(d)?;
        if !raw.is_finite() || raw < 0.0 {
            return Err(D::Error::custom("duration must be a non-negative number of seconds"));
        }
        Duration::try_from_secs_f64(raw).map_err(D::Error::custom)
    }
}

mod opt_secs {
    use serde::{Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => super::secs::serialize(d, s),
            None => s.serialize_none(),
        }
    }

    /// Zero disables.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let value = super::secs::deserialize(d)?;
        Ok((!value.is_zero()).then_some(value))
    }
}
