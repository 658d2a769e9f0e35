//! Atlas CORE
//!
//! Budgeted model routing and residency for a single machine. For every
//! request the core decides *which model answers* and *whether that model
//! is currently resident*, without exceeding a fixed memory budget.
//!
//! # Components
//!
//! - **Model Registry**: static roster of models with footprints and capabilities
//! - **Router**: ranks candidate models with a classifier and a rule-table fallback
//! - **Residency Manager**: admits, evicts and queues loads under the budget
//! - **Dispatch Coordinator**: route, acquire, invoke, release
//!
//! Model weights and kernels live behind [`backend::InferenceBackend`];
//! long-term memory lives behind [`context::MemoryStore`].

pub mod backend;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod residency;
pub mod routing;
pub mod telemetry;

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use backend::InferenceBackend;
use config::CoreConfig;
use context::MemoryStore;
use dispatch::{DispatchCoordinator, DispatchResponse, InferenceRequest};
use error::CoreError;
use models::{ModelRegistry, RosterManifest};
use residency::ResidencyManager;
use routing::{Classifier, KeywordClassifier, Router, RuleTable};

/// Wired-up core: registry, router, residency manager, coordinator.
pub struct Runtime {
    config: CoreConfig,
    registry: Arc<ModelRegistry>,
    router: Arc<Router>,
    residency: ResidencyManager,
    coordinator: DispatchCoordinator,
    reaper: Option<JoinHandle<()>>,
}

impl Runtime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: InferenceRequest) -> Result<DispatchResponse, CoreError> {
        self.coordinator.handle(request).await
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn residency(&self) -> &ResidencyManager {
        &self.residency
    }

    pub fn coordinator(&self) -> &DispatchCoordinator {
        &self.coordinator
    }

    /// Start the idle reaper if an idle timeout is configured.
    ///
    /// Must be called from within a tokio runtime. Returns whether a
    /// reaper is running afterwards.
    pub fn start_idle_reaper(&mut self) -> bool {
        if self.reaper.is_some() {
            return true;
        }
        let Some(idle) = self.config.idle_timeout else {
            return false;
        };
        self.reaper = Some(
            self.residency
                .spawn_idle_reaper(idle, self.config.idle_sweep_interval),
        );
        true
    }

    /// Stop background work. Resident models are left to the backend.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.reaper.take() {
            handle.abort();
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Builder for [`Runtime`]. A backend and a roster are required.
#[derive(Default)]
pub struct RuntimeBuilder {
    config: CoreConfig,
    registry: Option<ModelRegistry>,
    manifest: Option<RosterManifest>,
    backend: Option<Arc<dyn InferenceBackend>>,
    classifier: Option<Arc<dyn Classifier>>,
    rules: Option<RuleTable>,
    memory: Option<Arc<dyn MemoryStore>>,
}

impl RuntimeBuilder {
    pub fn config(mut self, config: CoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Roster from a manifest; ignored when a registry is also given.
    pub fn manifest(mut self, manifest: RosterManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn InferenceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Replaces the default [`KeywordClassifier`].
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn rules(mut self, rules: RuleTable) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn memory_store(mut self, store: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(store);
        self
    }

    /// Validate the configuration against the roster and wire everything.
    pub fn build(self) -> Result<Runtime, CoreError> {
        let Self { config, registry, manifest, backend, classifier, rules, memory } = self;

        let backend = backend.ok_or_else(|| CoreError::InvalidConfig("inference backend not set".into()))?;
        let registry = match (registry, manifest) {
            (Some(registry), _) => registry,
            (None, Some(manifest)) => manifest.into_registry()?,
            (None, None) => return Err(CoreError::NoModelsConfigured),
        };
        let registry = registry.with_footprint_overrides(&config.footprint_overrides)?;
        config.validate(&registry)?;
        let registry = Arc::new(registry);

        let classifier = match classifier {
            Some(c) => c,
            None => Arc::new(KeywordClassifier::with_defaults(config.long_context_tokens)?) as Arc<dyn Classifier>,
        };
        let rules = rules.unwrap_or_else(|| RuleTable::with_defaults(config.long_context_tokens));
        let router = Arc::new(Router::new(
            registry.clone(),
            Some(classifier),
            rules,
            config.router_confidence_threshold,
            config.default_model.as_str(),
        ));

        let residency = ResidencyManager::new(&registry, backend.clone(), config.residency())?;
        let mut coordinator = DispatchCoordinator::new(
            router.clone(),
            residency.clone(),
            backend,
            config.acquire_timeout,
        );
        if let Some(store) = memory {
            coordinator = coordinator.with_memory(store, config.context.clone());
        }

        info!(
            models = registry.len(),
            budget_bytes = config.memory_budget_bytes,
            default_model = %config.default_model,
            "atlas core ready"
        );

        Ok(Runtime {
            config,
            registry,
            router,
            residency,
            coordinator,
            reaper: None,
        })
    }
}
