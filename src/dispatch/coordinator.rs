//! Dispatch coordinator.
//!
//! Glues routing to residency: every request is routed, secures a
//! reservation, invokes the backend, and releases on every exit path.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn, Instrument, Span};
use uuid::Uuid;

use super::audit::DispatchRecord;
use super::request::InferenceRequest;
use crate::backend::{InferenceBackend, InferenceOutput, Payload};
use crate::context::{self, ContextConfig, MemoryStore};
use crate::error::CoreError;
use crate::models::ModelId;
use crate::residency::ResidencyManager;
use crate::routing::{RequestFeatures, Router};
use crate::telemetry::{self, DispatchSpan, SpanExt};

/// Result of one handled request.
#[derive(Debug, Clone)]
pub struct DispatchResponse {
    pub request_id: String,
    pub model_id: ModelId,
    pub output: InferenceOutput,
    pub record: DispatchRecord,
}

pub struct DispatchCoordinator {
    router: Arc<Router>,
    residency: ResidencyManager,
    backend: Arc<dyn InferenceBackend>,
    memory: Option<Arc<dyn MemoryStore>>,
    context: ContextConfig,
    acquire_timeout: Duration,
}

impl DispatchCoordinator {
    pub fn new(
        router: Arc<Router>,
        residency: ResidencyManager,
        backend: Arc<dyn InferenceBackend>,
        acquire_timeout: Duration,
    ) -> Self {
        Self {
            router,
            residency,
            backend,
            memory: None,
            context: ContextConfig::default(),
            acquire_timeout,
        }
    }

    /// Attach a memory store for requests that opt in to context.
    pub fn with_memory(mut self, store: Arc<dyn MemoryStore>, config: ContextConfig) -> Self {
        self.memory = Some(store);
        self.context = config;
        self
    }

    pub fn residency(&self) -> &ResidencyManager {
        &self.residency
    }

    /// Handle one request end to end.
    ///
    /// Backend errors pass through unchanged as [`CoreError::Backend`]; the
    /// coordinator never retries an invocation.
    pub async fn handle(&self, request: InferenceRequest) -> Result<DispatchResponse, CoreError> {
        let request_id = request
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = DispatchSpan::new(&request_id);
        let started = Instant::now();
        let mut record = DispatchRecord::new(&request_id);

        let result = self
            .dispatch(request, &mut record)
            .instrument(span.clone())
            .await;

        span.record("latency_ms", started.elapsed().as_millis() as u64);
        span.record_result(&result);
        if let Err(e) = &result {
            let _enter = span.enter();
            if e.is_warning() {
                warn!(error = %e, "dispatch failed");
            } else {
                error!(error = %e, "dispatch failed");
            }
        }
        record.finish(&result);
        record.emit();

        result.map(|(model_id, output)| DispatchResponse {
            request_id,
            model_id,
            output,
            record,
        })
    }

    async fn dispatch(
        &self,
        request: InferenceRequest,
        record: &mut DispatchRecord,
    ) -> Result<(ModelId, InferenceOutput), CoreError> {
        let span = Span::current();
        let InferenceRequest {
            payload: mut payload,
            task_hint,
            model,
            use_context,
            timeout,
            ..
        } = request;

        // Features come from the caller's payload, before any context is added.
        let features = RequestFeatures::extract(&payload, task_hint.as_deref(), model.as_deref());
        let decision = self.router.route(&features).await?;
        record.route_source = Some(decision.source);
        record.confidence = Some(decision.confidence);
        record.candidates = decision.candidates.iter().map(|c| c.to_string()).collect();
        span.record("route_source", decision.source.as_str());
        span.record("confidence", decision.confidence as f64);
        debug!(candidates = ?record.candidates, "routed");

        if use_context {
            record.context_snippets = self.inject_context(&mut payload).await;
        }

        let wait_started = Instant::now();
        let acquired = self
            .residency
            .acquire(&decision.candidates, timeout.unwrap_or(self.acquire_timeout))
            .await;
        record.wait_ms = wait_started.elapsed().as_millis() as u64;
        span.record("wait_ms", record.wait_ms);
        telemetry::record_acquire_wait(record.wait_ms);
        let reservation = acquired?;

        let model_id = reservation.model_id().clone();
        record.model_id = Some(model_id.to_string());
        span.record("model_id", model_id.as_str());

        let invoke_started = Instant::now();
        let result = self.backend.invoke(&model_id, &payload).await;
        record.invoke_ms = invoke_started.elapsed().as_millis() as u64;
        reservation.release();
        let output = result?;

        if use_context {
            if let Some(store) = &self.memory {
                if let Err(e) = store.remember(&record.request_id, &output.content).await {
                    warn!(error = %e, "failed to persist response to memory");
                }
            }
        }

        Ok((model_id, output))
    }

    /// Prepend relevant memory to the payload. Store failures are non-fatal.
    async fn inject_context(&self, payload: &mut Payload) -> usize {
        let Some(store) = &self.memory else {
            return 0;
        };
        let Some(query) = payload.latest_user_text().map(str::to_owned) else {
            return 0;
        };
        match store.retrieve(&query, self.context.top_k).await {
            Ok(snippets) => {
                let selected = context::select_snippets(snippets, &self.context);
                context::inject(payload, &selected)
            }
            Err(e) => {
                warn!(error = %e, "memory retrieval failed, continuing without context");
                0
            }
        }
    }
}
