//! Audit trail and tracing output of handled requests.

mod common;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use atlas_core::backend::{ChatMessage, Payload};
use atlas_core::config::CoreConfig;
use atlas_core::dispatch::{DispatchOutcome, InferenceRequest, AUDIT_TARGET};
use atlas_core::models::{Capability, ModelDescriptor, ModelRegistry};
use atlas_core::Runtime;
use common::{ids, ScriptedBackend};

type Fields = HashMap<String, String>;

/// Collects the fields of every event on the audit target.
#[derive(Clone, Default)]
struct AuditCapture(Arc<Mutex<Vec<Fields>>>);

impl AuditCapture {
    fn events(&self) -> Vec<Fields> {
        self.0.lock().clone()
    }
}

impl<S: Subscriber> Layer<S> for AuditCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if event.metadata().target() != AUDIT_TARGET {
            return;
        }
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.0.lock().push(visitor.0);
    }
}

#[derive(Default)]
struct FieldVisitor(Fields);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

fn runtime(backend: Arc<ScriptedBackend>, registry: ModelRegistry) -> Runtime {
    Runtime::builder()
        .config(CoreConfig { memory_budget_bytes: 10, ..CoreConfig::default() })
        .registry(registry)
        .backend(backend)
        .build()
        .unwrap()
}

fn contended_roster() -> ModelRegistry {
    ModelRegistry::new(vec![
        ModelDescriptor::new("general_fast", 6, vec![Capability::General]),
        ModelDescriptor::new("big", 6, vec![Capability::Code]),
    ])
    .unwrap()
}

fn ask(text: &str) -> InferenceRequest {
    InferenceRequest::new(Payload::new(vec![ChatMessage::user(text)]))
}

#[tokio::test(start_paused = true)]
async fn test_queued_dispatch_emits_one_audit_event_with_wait() {
    let capture = AuditCapture::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

    let registry = contended_roster();
    let backend = Arc::new(ScriptedBackend::new(&registry));
    let rt = runtime(backend.clone(), registry);

    let pinned = rt.residency().acquire(&ids(&["big"]), Duration::from_secs(5)).await.unwrap();
    let release = async {
        tokio::time::sleep(Duration::from_millis(250)).await;
        drop(pinned);
    };
    let (response, ()) = tokio::join!(rt.handle(ask("hello there").with_id("req-queued")), release);
    let response = response.unwrap();

    assert_eq!(response.model_id.as_str(), "general_fast");
    assert!(response.record.wait_ms >= 250, "wait_ms = {}", response.record.wait_ms);
    assert_eq!(response.record.outcome, DispatchOutcome::Ok);

    let events = capture.events();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event["request_id"], "req-queued");
    assert_eq!(event["model_id"], "general_fast");
    assert_eq!(event["outcome"], "ok");
    let wait_ms: u64 = event["wait_ms"].parse().unwrap();
    assert_eq!(wait_ms, response.record.wait_ms);
}

#[tokio::test(start_paused = true)]
async fn test_timed_out_dispatch_is_audited_without_model() {
    let capture = AuditCapture::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

    let registry = contended_roster();
    let backend = Arc::new(ScriptedBackend::new(&registry));
    let rt = runtime(backend.clone(), registry);

    let pinned = rt.residency().acquire(&ids(&["big"]), Duration::from_secs(5)).await.unwrap();
    let err = rt
        .handle(ask("hello there").with_id("req-late").with_timeout(Duration::from_millis(100)))
        .await
        .unwrap_err();
    assert!(err.is_warning());
    drop(pinned);

    let events = capture.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["request_id"], "req-late");
    assert_eq!(events[0]["model_id"], "none");
    assert_eq!(events[0]["outcome"], "timed_out");
    assert!(events[0]["wait_ms"].parse::<u64>().unwrap() >= 100);
}

#[tokio::test(start_paused = true)]
async fn test_each_request_gets_its_own_audit_event() {
    let capture = AuditCapture::default();
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(capture.clone()));

    let registry = contended_roster();
    let backend = Arc::new(ScriptedBackend::new(&registry));
    let rt = runtime(backend, registry);

    let first = rt.handle(ask("hi")).await.unwrap();
    let second = rt.handle(ask("hi again")).await.unwrap();
    assert_ne!(first.request_id, second.request_id);

    let ids: Vec<String> = capture.events().iter().map(|e| e["request_id"].clone()).collect();
    assert_eq!(ids, vec![first.request_id, second.request_id]);
}
