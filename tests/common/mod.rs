//! Shared fixtures: an in-memory scripted backend and roster helpers.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use atlas_core::backend::{BackendError, InferenceBackend, InferenceOutput, Payload};
use atlas_core::models::{Capability, ModelDescriptor, ModelId, ModelRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Load(String),
    Unload(String),
    Invoke(String),
}

#[derive(Default)]
struct Script {
    calls: Vec<Call>,
    failing_loads: HashSet<String>,
    failing_invokes: HashSet<String>,
    /// Models the backend has dropped without being asked to.
    lost: HashSet<String>,
    replies: HashMap<String, String>,
    payloads: Vec<Payload>,
    /// Bytes the backend currently holds, counted from load start to unload end.
    physical_bytes: u64,
    peak_bytes: u64,
    loads_in_flight: HashMap<String, usize>,
    overlapping_loads: usize,
}

/// Backend that records every call and sleeps on a (paused) tokio clock.
pub struct ScriptedBackend {
    footprints: HashMap<String, u64>,
    load_delay: Duration,
    unload_delay: Duration,
    invoke_delay: Duration,
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new(registry: &ModelRegistry) -> Self {
        Self {
            footprints: registry
                .all()
                .iter()
                .map(|d| (d.id.to_string(), d.footprint_bytes))
                .collect(),
            load_delay: Duration::from_millis(50),
            unload_delay: Duration::from_millis(10),
            invoke_delay: Duration::from_millis(5),
            script: Mutex::new(Script::default()),
        }
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    pub fn with_invoke_delay(mut self, delay: Duration) -> Self {
        self.invoke_delay = delay;
        self
    }

    pub fn fail_loads(self, model: &str) -> Self {
        self.script.lock().failing_loads.insert(model.to_string());
        self
    }

    pub fn fail_invokes(self, model: &str) -> Self {
        self.script.lock().failing_invokes.insert(model.to_string());
        self
    }

    /// Canned invoke reply for `model`.
    pub fn reply(self, model: &str, content: &str) -> Self {
        self.script.lock().replies.insert(model.to_string(), content.to_string());
        self
    }

    /// Simulate a crashed model server: `model` silently leaves memory.
    pub fn lose(&self, model: &str) {
        let mut s = self.script.lock();
        if s.lost.insert(model.to_string()) {
            s.physical_bytes -= self.footprints.get(model).copied().unwrap_or(0);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn loads(&self, model: &str) -> usize {
        self.count(|c| matches!(c, Call::Load(m) if m == model))
    }

    pub fn unloads(&self, model: &str) -> usize {
        self.count(|c| matches!(c, Call::Unload(m) if m == model))
    }

    pub fn invokes(&self, model: &str) -> usize {
        self.count(|c| matches!(c, Call::Invoke(m) if m == model))
    }

    pub fn peak_bytes(&self) -> u64 {
        self.script.lock().peak_bytes
    }

    /// Times a load started while another load of the same model was running.
    pub fn overlapping_loads(&self) -> usize {
        self.script.lock().overlapping_loads
    }

    pub fn last_payload(&self) -> Option<Payload> {
        self.script.lock().payloads.last().cloned()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.script.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn footprint(&self, model: &ModelId) -> u64 {
        self.footprints.get(model.as_str()).copied().unwrap_or(0)
    }
}

#[async_trait]
impl InferenceBackend for ScriptedBackend {
    async fn load(&self, model_id: &ModelId) -> Result<(), BackendError> {
        let fail = {
            let mut s = self.script.lock();
            s.calls.push(Call::Load(model_id.to_string()));
            let in_flight = s.loads_in_flight.entry(model_id.to_string()).or_default();
            *in_flight += 1;
            if *in_flight > 1 {
                s.overlapping_loads += 1;
            }
            s.physical_bytes += self.footprint(model_id);
            s.peak_bytes = s.peak_bytes.max(s.physical_bytes);
            s.failing_loads.contains(model_id.as_str())
        };

        tokio::time::sleep(self.load_delay).await;

        let mut s = self.script.lock();
        if let Some(n) = s.loads_in_flight.get_mut(model_id.as_str()) {
            *n -= 1;
        }
        if fail {
            s.physical_bytes -= self.footprint(model_id);
            return Err(BackendError::Load(format!("{} refused to load", model_id)));
        }
        s.lost.remove(model_id.as_str());
        Ok(())
    }

    async fn unload(&self, model_id: &ModelId) -> Result<(), BackendError> {
        self.script.lock().calls.push(Call::Unload(model_id.to_string()));
        tokio::time::sleep(self.unload_delay).await;
        let mut s = self.script.lock();
        if !s.lost.remove(model_id.as_str()) {
            s.physical_bytes -= self.footprint(model_id);
        }
        Ok(())
    }

    async fn is_resident(&self, model_id: &ModelId) -> bool {
        !self.script.lock().lost.contains(model_id.as_str())
    }

    async fn invoke(&self, model_id: &ModelId, payload: &Payload) -> Result<InferenceOutput, BackendError> {
        let (fail, reply) = {
            let mut s = self.script.lock();
            s.calls.push(Call::Invoke(model_id.to_string()));
            s.payloads.push(payload.clone());
            (
                s.failing_invokes.contains(model_id.as_str()),
                s.replies.get(model_id.as_str()).cloned(),
            )
        };
        tokio::time::sleep(self.invoke_delay).await;
        if fail {
            return Err(BackendError::Invoke(format!("{} crashed", model_id)));
        }
        Ok(InferenceOutput {
            content: reply.unwrap_or_else(|| format!("{} says hi", model_id)),
            usage: None,
        })
    }
}

/// General-purpose roster from `(id, footprint)` pairs.
pub fn roster(models: &[(&str, u64)]) -> ModelRegistry {
    ModelRegistry::new(
        models
            .iter()
            .map(|(id, fp)| ModelDescriptor::new(*id, *fp, vec![Capability::General]))
            .collect(),
    )
    .unwrap()
}

pub fn ids(names: &[&str]) -> Vec<ModelId> {
    names.iter().map(|n| ModelId::new(n)).collect()
}

pub fn setup(models: &[(&str, u64)]) -> (ModelRegistry, Arc<ScriptedBackend>) {
    let registry = roster(models);
    let backend = Arc::new(ScriptedBackend::new(&registry));
    (registry, backend)
}
