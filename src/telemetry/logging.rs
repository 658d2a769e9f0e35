//! Logging initialization.
//!
//! JSON for production, pretty for development. Dispatch audit records go to
//! the main output unless `audit_path` is set, in which case they are written
//! as JSON lines to that file only.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry};

use crate::dispatch::AUDIT_TARGET;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    /// Parses `json` / `pretty`, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Logging configuration, the `[logging]` table of the core config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter directives (e.g., "info", "atlas_core::residency=debug").
    pub level: String,
    /// Log file for the main output. If None, logs to stderr.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,
    /// Separate JSON-lines file for dispatch audit records.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Json,
            level: "info".to_string(),
            output_path: None,
            audit_path: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("Failed to open log file: {0}")]
    FileOpen(String),
    #[error("Subscriber already initialized")]
    AlreadyInitialized,
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Install the global subscriber. Call once at startup.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    tracing_subscriber::registry()
        .with(build_layers(config)?)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)
}

/// Main output plus, when configured, the audit file layer.
pub(crate) fn build_layers(config: &LogConfig) -> Result<Vec<BoxedLayer>, LogError> {
    let mut filter =
        EnvFilter::try_new(&config.level).map_err(|e| LogError::InvalidFilter(e.to_string()))?;
    let mut layers = Vec::with_capacity(2);

    if let Some(path) = &config.audit_path {
        let directive = format!("{}=off", AUDIT_TARGET)
            .parse()
            .map_err(|e: tracing_subscriber::filter::ParseError| LogError::InvalidFilter(e.to_string()))?;
        filter = filter.add_directive(directive);
        layers.push(
            fmt::layer()
                .json()
                .with_writer(Mutex::new(open(path)?))
                .with_filter(Targets::new().with_target(AUDIT_TARGET, LevelFilter::INFO))
                .boxed(),
        );
    }

    let writer = match &config.output_path {
        Some(path) => BoxMakeWriter::new(Mutex::new(open(path)?)),
        None => BoxMakeWriter::new(std::io::stderr),
    };
    let main = match config.format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).with_filter(filter).boxed(),
        LogFormat::Pretty => fmt::layer().pretty().with_writer(writer).with_filter(filter).boxed(),
    };
    layers.push(main);
    Ok(layers)
}

fn open(path: &Path) -> Result<File, LogError> {
    File::create(path).map_err(|e| LogError::FileOpen(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::info;

    #[test]
    fn invalid_filter_rejected() {
        let config = LogConfig { level: "atlas_core=loud".into(), ..LogConfig::default() };
        assert!(matches!(init_logging(&config), Err(LogError::InvalidFilter(_))));
    }

    #[test]
    fn unwritable_audit_path_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = LogConfig {
            audit_path: Some(dir.path().join("missing").join("audit.log")),
            ..LogConfig::default()
        };
        assert!(matches!(build_layers(&config), Err(LogError::FileOpen(_))));
    }

    #[test]
    fn audit_records_split_into_their_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let audit = dir.path().join("audit.log");
        let main = dir.path().join("core.log");
        let config = LogConfig {
            output_path: Some(main.clone()),
            audit_path: Some(audit.clone()),
            ..LogConfig::default()
        };

        let subscriber = tracing_subscriber::registry().with(build_layers(&config).unwrap());
        tracing::subscriber::with_default(subscriber, || {
            info!(target: AUDIT_TARGET, request_id = "req-9", model_id = "code_expert", "dispatch");
            info!(model_id = "code_expert", "model resident");
        });

        let audit = std::fs::read_to_string(audit).unwrap();
        let main = std::fs::read_to_string(main).unwrap();
        assert_eq!(audit.lines().count(), 1);
        assert!(audit.contains("req-9"));
        assert!(!main.contains("req-9"));
        assert!(main.contains("model resident"));
    }

    #[test]
    fn second_init_reports_already_initialized() {
        let config = LogConfig { format: LogFormat::Pretty, level: "warn".into(), ..LogConfig::default() };
        assert!(init_logging(&config).is_ok());
        assert!(matches!(init_logging(&config), Err(LogError::AlreadyInitialized)));
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!(LogFormat::parse(" Pretty "), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("xml"), None);
    }
}
