//! Budgeted residency scheduler.
//!
//! All state transitions and budget accounting happen under one mutex that
//! is never held across an await. Loads run in detached tasks so a caller
//! timing out cannot strand a model in `Loading`; every caller interested in
//! a load receives its reservation through a oneshot, and a reservation that
//! cannot be delivered is dropped, which releases it.

use futures::FutureExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::queue::WaitQueue;
use super::reservation::Reservation;
use super::state::{Lifecycle, LoadOutcome, ModelState};
use crate::backend::InferenceBackend;
use crate::error::CoreError;
use crate::models::{ModelId, ModelRegistry};
use crate::telemetry;

/// Stand-in deadline for timeouts too large to add to the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Residency limits.
#[derive(Debug, Clone)]
pub struct ResidencyConfig {
    /// Ceiling on the summed footprint of Loading and Resident models.
    pub budget_bytes: u64,
    /// Optional cap on the number of Loading and Resident models.
    pub max_resident_models: Option<usize>,
}

/// Point-in-time view of one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelStatus {
    pub model_id: ModelId,
    pub lifecycle: Lifecycle,
    pub refs: u32,
    pub footprint_bytes: u64,
    pub idle_for: Duration,
}

/// Point-in-time view of the residency manager.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidencySnapshot {
    pub budget_bytes: u64,
    pub used_bytes: u64,
    pub waiting: usize,
    /// In registry declaration order.
    pub models: Vec<ModelStatus>,
}

impl ResidencySnapshot {
    pub fn status(&self, model_id: &str) -> Option<&ModelStatus> {
        self.models.iter().find(|m| m.model_id.as_str() == model_id)
    }
}

pub(crate) struct Shared {
    backend: Arc<dyn InferenceBackend>,
    budget_bytes: u64,
    max_resident: Option<usize>,
    order: Vec<ModelId>,
    state: Mutex<State>,
}

impl Shared {
    /// Drop one reference. The model stays resident until space is needed.
    pub(crate) fn release(&self, model_id: &ModelId) {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if let Some(ms) = state.models.get_mut(model_id) {
            debug_assert!(ms.refs > 0, "release without reservation on {}", model_id);
            ms.refs = ms.refs.saturating_sub(1);
            ms.touch();
            debug!(model_id = %model_id, refs = ms.refs, "reservation released");
            if ms.refs == 0 {
                state.waiters.wake_all();
            }
        }
    }

    /// Demote a model the backend no longer holds, unless someone is using it.
    fn forget_lost(&self, model_id: &ModelId) {
        let mut state = self.state.lock();
        if !state.models.get(model_id).is_some_and(|m| m.is_evictable()) {
            return;
        }
        warn!(model_id = %model_id, "backend lost resident model, marking unloaded");
        state.transition(model_id, Lifecycle::Unloaded, self.budget_bytes);
        state.waiters.wake_all();
        telemetry::record_eviction(model_id.as_str(), "lost");
    }
}

struct State {
    models: HashMap<ModelId, ModelState>,
    used_bytes: u64,
    waiters: WaitQueue,
}

impl State {
    /// Apply a lifecycle transition and keep the budget total in step.
    fn transition(&mut self, model_id: &ModelId, to: Lifecycle, budget: u64) {
        let Some(ms) = self.models.get_mut(model_id) else {
            return;
        };
        let from = ms.lifecycle;
        match (from.holds_budget(), to.holds_budget()) {
            (false, true) => self.used_bytes += ms.footprint,
            (true, false) => self.used_bytes -= ms.footprint,
            _ => {}
        }
        ms.lifecycle = to;
        debug_assert!(self.used_bytes <= budget, "budget exceeded: {} > {}", self.used_bytes, budget);
        debug_assert!(to.holds_budget() || ms.refs == 0, "{} left residency with live reservations", model_id);
        debug!(
            model_id = %model_id,
            from = from.as_str(),
            to = to.as_str(),
            used_bytes = self.used_bytes,
            budget_bytes = budget,
            "residency transition"
        );
        telemetry::record_resident_bytes(self.used_bytes);
    }

    /// Bytes still physically held by models being unloaded.
    fn unloading_bytes(&self) -> u64 {
        self.models
            .values()
            .filter(|m| m.lifecycle == Lifecycle::Unloading)
            .map(|m| m.footprint)
            .sum()
    }

    /// Least-recently-used victims whose eviction lets `target` fit.
    ///
    /// Returns `None` without touching anything when no eviction set works.
    /// Ties on last use go to the smaller footprint, then to the cheaper
    /// reload, then to the id.
    fn plan_evictions(&self, target: &ModelId, budget: u64, cap: Option<usize>) -> Option<Vec<ModelId>> {
        let required = self.models.get(target)?.footprint;
        let cap = cap.unwrap_or(usize::MAX);
        let mut free = budget.saturating_sub(self.used_bytes + self.unloading_bytes());
        let mut resident = self.models.values().filter(|m| m.lifecycle.holds_budget()).count();
        let fits = |free: u64, resident: usize| required <= free && resident < cap;
        if fits(free, resident) {
            return Some(Vec::new());
        }

        let mut evictable: Vec<(&ModelId, &ModelState)> = self
            .models
            .iter()
            .filter(|(id, m)| *id != target && m.is_evictable())
            .collect();
        evictable.sort_by(|(a_id, a), (b_id, b)| {
            a.last_used
                .cmp(&b.last_used)
                .then(a.footprint.cmp(&b.footprint))
                .then(a.load_cost.cmp(&b.load_cost))
                .then(a_id.cmp(b_id))
        });

        let mut victims = Vec::new();
        for (id, m) in evictable {
            victims.push(id.clone());
            free += m.footprint;
            resident -= 1;
            if fits(free, resident) {
                return Some(victims);
            }
        }
        None
    }
}

/// A caller's place in the FIFO wait queue. Leaving the queue wakes the rest.
struct QueueSlot {
    shared: Arc<Shared>,
    ticket: u64,
    notify: Arc<Notify>,
    queued: bool,
}

impl Drop for QueueSlot {
    fn drop(&mut self) {
        if self.queued {
            let mut state = self.shared.state.lock();
            state.waiters.remove(self.ticket);
            state.waiters.wake_all();
        }
    }
}

enum Step {
    /// `verify` is set when the model was idle before this reservation.
    Reserved { reservation: Reservation, verify: bool },
    Load {
        model: ModelId,
        victims: Vec<ModelId>,
        rx: oneshot::Receiver<LoadOutcome>,
    },
    Join {
        model: ModelId,
        rx: oneshot::Receiver<LoadOutcome>,
    },
    Wait(Arc<Notify>),
    Exhausted(Vec<String>),
}

/// Decides admit / evict / wait for residency requests under a hard budget.
#[derive(Clone)]
pub struct ResidencyManager {
    shared: Arc<Shared>,
}

impl ResidencyManager {
    /// Validate limits against the roster and start with every model unloaded.
    pub fn new(
        registry: &ModelRegistry,
        backend: Arc<dyn InferenceBackend>,
        config: ResidencyConfig,
    ) -> Result<Self, CoreError> {
        let smallest = registry.smallest_footprint().ok_or(CoreError::NoModelsConfigured)?;
        if smallest > config.budget_bytes {
            return Err(CoreError::NoViableModel { budget: config.budget_bytes, smallest });
        }
        if config.max_resident_models == Some(0) {
            return Err(CoreError::InvalidConfig("max_resident_models must be at least 1".into()));
        }

        let models = registry
            .all()
            .iter()
            .map(|d| (d.id.clone(), ModelState::new(d.footprint_bytes, d.load_cost)))
            .collect();
        let order = registry.all().iter().map(|d| d.id.clone()).collect();

        Ok(Self {
            shared: Arc::new(Shared {
                backend,
                budget_bytes: config.budget_bytes,
                max_resident: config.max_resident_models,
                order,
                state: Mutex::new(State {
                    models,
                    used_bytes: 0,
                    waiters: WaitQueue::default(),
                }),
            }),
        })
    }

    /// Secure a reservation on the best available candidate.
    ///
    /// Walks `candidates` in order: an already-resident candidate is reserved
    /// immediately; otherwise the first candidate that fits (after evicting
    /// idle models) is loaded. Callers that cannot be served wait in arrival
    /// order until capacity frees or `timeout` elapses.
    pub async fn acquire(&self, candidates: &[ModelId], timeout: Duration) -> Result<Reservation, CoreError> {
        let started = Instant::now();
        // Durations past the clock's range mean wait indefinitely.
        let deadline = started
            .checked_add(timeout)
            .unwrap_or_else(|| started + FAR_FUTURE);
        let timed_out = || CoreError::TimedOut { waited_ms: started.elapsed().as_millis() as u64 };
        let mut failed: HashSet<ModelId> = HashSet::new();
        let mut slot: Option<QueueSlot> = None;

        loop {
            let (model, rx) = match self.plan(candidates, &failed, &mut slot) {
                Step::Reserved { reservation, verify } => {
                    if !verify || self.still_resident(reservation.model_id()).await {
                        return Ok(reservation);
                    }
                    let lost = reservation.model_id().clone();
                    reservation.release();
                    self.shared.forget_lost(&lost);
                    continue;
                }
                Step::Exhausted(tried) => return Err(CoreError::AllCandidatesFailed { tried }),
                Step::Wait(notify) => {
                    tokio::time::timeout_at(deadline, notify.notified())
                        .await
                        .map_err(|_| timed_out())?;
                    continue;
                }
                Step::Load { model, victims, rx } => {
                    tokio::spawn(drive_load(self.shared.clone(), model.clone(), victims));
                    (model, rx)
                }
                Step::Join { model, rx } => (model, rx),
            };

            let reason = match tokio::time::timeout_at(deadline, rx).await {
                Err(_) => return Err(timed_out()),
                Ok(Ok(Ok(reservation))) => return Ok(reservation),
                Ok(Ok(Err(reason))) => reason,
                Ok(Err(_)) => "load task ended without reporting".to_string(),
            };
            let err = CoreError::LoadFailure { model_id: model.to_string(), reason };
            warn!(error = %err, "skipping candidate");
            failed.insert(model);
        }
    }

    async fn still_resident(&self, model_id: &ModelId) -> bool {
        AssertUnwindSafe(self.shared.backend.is_resident(model_id))
            .catch_unwind()
            .await
            .unwrap_or(false)
    }

    /// One decision under the lock.
    fn plan(&self, candidates: &[ModelId], failed: &HashSet<ModelId>, slot: &mut Option<QueueSlot>) -> Step {
        let shared = &self.shared;
        let budget = shared.budget_bytes;
        let mut guard = shared.state.lock();
        let state = &mut *guard;

        // Zero-cost path: any resident candidate, in rank order.
        for id in candidates {
            if let Some(ms) = state.models.get_mut(id) {
                if ms.lifecycle == Lifecycle::Resident {
                    let verify = ms.refs == 0;
                    ms.refs += 1;
                    ms.touch();
                    debug!(model_id = %id, refs = ms.refs, "resident hit");
                    return Step::Reserved {
                        reservation: Reservation::new(shared.clone(), id.clone()),
                        verify,
                    };
                }
            }
        }

        let my_turn = match slot.as_ref() {
            Some(s) if s.queued => state.waiters.is_head(s.ticket),
            _ => state.waiters.is_empty(),
        };
        let mut viable = false;

        for id in candidates {
            if failed.contains(id) {
                continue;
            }
            let Some(ms) = state.models.get(id) else {
                warn!(model_id = %id, "candidate not in registry");
                continue;
            };
            let (lifecycle, footprint) = (ms.lifecycle, ms.footprint);
            if footprint > budget {
                debug!(model_id = %id, footprint, budget, "candidate can never fit");
                continue;
            }
            viable = true;

            match lifecycle {
                Lifecycle::Loading => {
                    let (tx, rx) = oneshot::channel();
                    if let Some(ms) = state.models.get_mut(id) {
                        ms.load_waiters.push(tx);
                    }
                    leave_queue(state, slot);
                    debug!(model_id = %id, "joining in-flight load");
                    return Step::Join { model: id.clone(), rx };
                }
                Lifecycle::Unloaded if my_turn => {
                    if let Some(victims) = state.plan_evictions(id, budget, shared.max_resident) {
                        for victim in &victims {
                            state.transition(victim, Lifecycle::Unloading, budget);
                        }
                        state.transition(id, Lifecycle::Loading, budget);
                        let (tx, rx) = oneshot::channel();
                        if let Some(ms) = state.models.get_mut(id) {
                            ms.load_waiters.push(tx);
                        }
                        leave_queue(state, slot);
                        return Step::Load { model: id.clone(), victims, rx };
                    }
                }
                _ => {}
            }
        }

        if !viable {
            return Step::Exhausted(candidates.iter().map(|c| c.to_string()).collect());
        }

        match slot {
            Some(s) if s.queued => Step::Wait(s.notify.clone()),
            Some(s) => {
                let (ticket, notify) = state.waiters.push();
                s.ticket = ticket;
                s.notify = notify.clone();
                s.queued = true;
                Step::Wait(notify)
            }
            None => {
                let (ticket, notify) = state.waiters.push();
                *slot = Some(QueueSlot {
                    shared: shared.clone(),
                    ticket,
                    notify: notify.clone(),
                    queued: true,
                });
                Step::Wait(notify)
            }
        }
    }

    /// Unload every unreserved resident model idle for at least `max_idle`.
    pub async fn evict_idle(&self, max_idle: Duration) -> Vec<ModelId> {
        let budget = self.shared.budget_bytes;
        let victims: Vec<ModelId> = {
            let mut guard = self.shared.state.lock();
            let state = &mut *guard;
            let now = Instant::now();
            let mut idle: Vec<ModelId> = state
                .models
                .iter()
                .filter(|(_, m)| m.is_evictable() && now.duration_since(m.last_used) >= max_idle)
                .map(|(id, _)| id.clone())
                .collect();
            idle.sort();
            for id in &idle {
                state.transition(id, Lifecycle::Unloading, budget);
            }
            idle
        };

        for id in &victims {
            unload_victim(&self.shared, id, "idle").await;
        }
        victims
    }

    /// Periodically evict idle models until the handle is aborted.
    pub fn spawn_idle_reaper(&self, max_idle: Duration, every: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        let every = every.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let evicted = manager.evict_idle(max_idle).await;
                if !evicted.is_empty() {
                    info!(count = evicted.len(), "idle reaper unloaded models");
                }
            }
        })
    }

    pub fn snapshot(&self) -> ResidencySnapshot {
        let state = self.shared.state.lock();
        let now = Instant::now();
        let models = self
            .shared
            .order
            .iter()
            .filter_map(|id| {
                state.models.get(id).map(|m| ModelStatus {
                    model_id: id.clone(),
                    lifecycle: m.lifecycle,
                    refs: m.refs,
                    footprint_bytes: m.footprint,
                    idle_for: now.duration_since(m.last_used),
                })
            })
            .collect();
        ResidencySnapshot {
            budget_bytes: self.shared.budget_bytes,
            used_bytes: state.used_bytes,
            waiting: state.waiters.len(),
            models,
        }
    }

    pub fn lifecycle(&self, model_id: &str) -> Option<Lifecycle> {
        self.shared.state.lock().models.get(model_id).map(|m| m.lifecycle)
    }

    pub fn ref_count(&self, model_id: &str) -> Option<u32> {
        self.shared.state.lock().models.get(model_id).map(|m| m.refs)
    }

    pub fn used_bytes(&self) -> u64 {
        self.shared.state.lock().used_bytes
    }

    pub fn budget_bytes(&self) -> u64 {
        self.shared.budget_bytes
    }

    /// Number of callers queued for capacity.
    pub fn waiting(&self) -> usize {
        self.shared.state.lock().waiters.len()
    }
}

/// Leave the wait queue after securing an admission, letting the next caller try.
fn leave_queue(state: &mut State, slot: &mut Option<QueueSlot>) {
    if let Some(s) = slot.as_mut() {
        if s.queued {
            s.queued = false;
            state.waiters.remove(s.ticket);
            state.waiters.wake_all();
        }
    }
}

/// Unload a model already marked `Unloading`, then mark it `Unloaded`.
///
/// A failed unload is logged and the model is still treated as unloaded.
async fn unload_victim(shared: &Arc<Shared>, model_id: &ModelId, reason: &'static str) {
    match AssertUnwindSafe(shared.backend.unload(model_id)).catch_unwind().await {
        Ok(Ok(())) => info!(model_id = %model_id, reason, "model evicted"),
        Ok(Err(e)) => warn!(model_id = %model_id, error = %e, "unload failed, marking unloaded"),
        Err(_) => warn!(model_id = %model_id, "unload panicked, marking unloaded"),
    }
    telemetry::record_eviction(model_id.as_str(), reason);

    let mut state = shared.state.lock();
    state.transition(model_id, Lifecycle::Unloaded, shared.budget_bytes);
    state.waiters.wake_all();
}

/// Evict victims, load `model`, and deliver the outcome to every joined caller.
async fn drive_load(shared: Arc<Shared>, model: ModelId, victims: Vec<ModelId>) {
    for victim in &victims {
        unload_victim(&shared, victim, "budget").await;
    }

    let started = Instant::now();
    let result = match AssertUnwindSafe(shared.backend.load(&model)).catch_unwind().await {
        Ok(r) => r.map_err(|e| e.to_string()),
        Err(_) => Err("load panicked".to_string()),
    };
    let load_ms = started.elapsed().as_millis() as u64;

    let deliveries: Vec<(oneshot::Sender<LoadOutcome>, LoadOutcome)> = {
        let mut guard = shared.state.lock();
        let state = &mut *guard;
        let waiters = state
            .models
            .get_mut(&model)
            .map(|ms| std::mem::take(&mut ms.load_waiters))
            .unwrap_or_default();

        let deliveries = match &result {
            Ok(()) => {
                state.transition(&model, Lifecycle::Resident, shared.budget_bytes);
                if let Some(ms) = state.models.get_mut(&model) {
                    ms.refs += waiters.len() as u32;
                    ms.touch();
                }
                waiters
                    .into_iter()
                    .map(|tx| (tx, Ok(Reservation::new(shared.clone(), model.clone()))))
                    .collect()
            }
            Err(reason) => {
                state.transition(&model, Lifecycle::Unloaded, shared.budget_bytes);
                waiters.into_iter().map(|tx| (tx, Err(reason.clone()))).collect()
            }
        };
        state.waiters.wake_all();
        deliveries
    };

    match &result {
        Ok(()) => {
            info!(model_id = %model, load_ms, evicted = victims.len(), "model resident");
            telemetry::record_model_load(model.as_str(), "ok");
        }
        Err(reason) => {
            warn!(model_id = %model, load_ms, reason = %reason, "model load failed");
            telemetry::record_model_load(model.as_str(), "error");
        }
    }

    // Outside the lock: an undeliverable reservation releases itself on drop.
    for (tx, outcome) in deliveries {
        let _ = tx.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Capability, ModelDescriptor};

    fn state_with(models: &[(&str, u64, Lifecycle, u32)]) -> State {
        let mut state = State {
            models: HashMap::new(),
            used_bytes: 0,
            waiters: WaitQueue::default(),
        };
        for (id, fp, lifecycle, refs) in models {
            let mut ms = ModelState::new(*fp, Duration::ZERO);
            ms.lifecycle = *lifecycle;
            ms.refs = *refs;
            if lifecycle.holds_budget() {
                state.used_bytes += fp;
            }
            state.models.insert(ModelId::new(id), ms);
        }
        state
    }

    #[test]
    fn no_eviction_when_candidate_fits() {
        let state = state_with(&[("a", 4, Lifecycle::Resident, 0), ("b", 4, Lifecycle::Unloaded, 0)]);
        assert_eq!(state.plan_evictions(&"b".into(), 10, None), Some(vec![]));
    }

    #[test]
    fn pinned_models_are_never_victims() {
        let state = state_with(&[("a", 6, Lifecycle::Resident, 1), ("b", 5, Lifecycle::Unloaded, 0)]);
        assert_eq!(state.plan_evictions(&"b".into(), 10, None), None);
    }

    #[tokio::test(start_paused = true)]
    async fn lru_ties_prefer_smaller_footprint() {
        // Paused clock: every touch happens at the same instant.
        let state = state_with(&[
            ("big", 5, Lifecycle::Resident, 0),
            ("small", 3, Lifecycle::Resident, 0),
            ("new", 4, Lifecycle::Unloaded, 0),
        ]);
        assert_eq!(state.plan_evictions(&"new".into(), 10, None), Some(vec!["small".into()]));
    }

    #[tokio::test(start_paused = true)]
    async fn equal_footprints_prefer_cheaper_reload() {
        let mut state = state_with(&[
            ("slow", 4, Lifecycle::Resident, 0),
            ("quick", 4, Lifecycle::Resident, 0),
            ("new", 4, Lifecycle::Unloaded, 0),
        ]);
        state.models.get_mut("slow").unwrap().load_cost = Duration::from_secs(20);
        state.models.get_mut("quick").unwrap().load_cost = Duration::from_secs(2);
        assert_eq!(state.plan_evictions(&"new".into(), 10, None), Some(vec!["quick".into()]));
    }

    #[tokio::test(start_paused = true)]
    async fn older_models_evicted_first() {
        let mut state = state_with(&[
            ("old", 3, Lifecycle::Resident, 0),
            ("recent", 3, Lifecycle::Resident, 0),
            ("new", 6, Lifecycle::Unloaded, 0),
        ]);
        tokio::time::advance(Duration::from_secs(1)).await;
        state.models.get_mut("recent").unwrap().touch();
        assert_eq!(state.plan_evictions(&"new".into(), 10, None), Some(vec!["old".into()]));
    }

    #[test]
    fn resident_cap_forces_eviction() {
        let state = state_with(&[("a", 1, Lifecycle::Resident, 0), ("b", 1, Lifecycle::Unloaded, 0)]);
        assert_eq!(state.plan_evictions(&"b".into(), 100, Some(1)), Some(vec!["a".into()]));
    }

    #[test]
    fn unloading_bytes_are_still_occupied() {
        let state = state_with(&[("a", 6, Lifecycle::Unloading, 0), ("b", 6, Lifecycle::Unloaded, 0)]);
        assert_eq!(state.plan_evictions(&"b".into(), 10, None), None);
    }

    #[test]
    fn transition_keeps_budget_in_step() {
        let mut state = state_with(&[("a", 6, Lifecycle::Unloaded, 0)]);
        let id = ModelId::new("a");
        state.transition(&id, Lifecycle::Loading, 10);
        assert_eq!(state.used_bytes, 6);
        state.transition(&id, Lifecycle::Resident, 10);
        assert_eq!(state.used_bytes, 6);
        state.transition(&id, Lifecycle::Unloading, 10);
        assert_eq!(state.used_bytes, 0);
        state.transition(&id, Lifecycle::Unloaded, 10);
        assert_eq!(state.used_bytes, 0);
    }

    #[test]
    fn startup_rejects_unviable_budget() {
        struct Nop;
        #[async_trait::async_trait]
        impl InferenceBackend for Nop {
            async fn load(&self, _: &ModelId) -> Result<(), crate::backend::BackendError> {
                Ok(())
            }
            async fn unload(&self, _: &ModelId) -> Result<(), crate::backend::BackendError> {
                Ok(())
            }
            async fn invoke(
                &self,
                _: &ModelId,
                _: &crate::backend::Payload,
            ) -> Result<crate::backend::InferenceOutput, crate::backend::BackendError> {
                unreachable!()
            }
        }

        let registry = ModelRegistry::new(vec![ModelDescriptor::new("a", 8, vec![Capability::General])]).unwrap();
        let config = ResidencyConfig { budget_bytes: 4, max_resident_models: None };
        assert!(matches!(
            ResidencyManager::new(&registry, Arc::new(Nop), config),
            Err(CoreError::NoViableModel { budget: 4, smallest: 8 })
        ));

        let empty = ModelRegistry::new(vec![]).unwrap();
        let config = ResidencyConfig { budget_bytes: 4, max_resident_models: None };
        assert!(matches!(
            ResidencyManager::new(&empty, Arc::new(Nop), config),
            Err(CoreError::NoModelsConfigured)
        ));
    }
}
