//! Per-model residency state.

use std::fmt;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::reservation::Reservation;

/// Lifecycle: `Unloaded → Loading → Resident → Unloading → Unloaded`.
///
/// `Loading` falls back to `Unloaded` when the load primitive fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Unloaded,
    Loading,
    Resident,
    Unloading,
}

impl Lifecycle {
    /// Whether the model's footprint counts against the budget.
    pub fn holds_budget(&self) -> bool {
        matches!(self, Lifecycle::Loading | Lifecycle::Resident)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Unloaded => "unloaded",
            Lifecycle::Loading => "loading",
            Lifecycle::Resident => "resident",
            Lifecycle::Unloading => "unloading",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome delivered to every caller waiting on one load.
pub(crate) type LoadOutcome = Result<Reservation, String>;

/// Mutable runtime record, one per registered model.
pub(crate) struct ModelState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) refs: u32,
    pub(crate) last_used: Instant,
    pub(crate) footprint: u64,
    /// Estimated reload time, used to break eviction ties.
    pub(crate) load_cost: Duration,
    /// Callers coalesced onto the in-flight load, served in arrival order.
    pub(crate) load_waiters: Vec<oneshot::Sender<LoadOutcome>>,
}

impl ModelState {
    pub(crate) fn new(footprint: u64, load_cost: Duration) -> Self {
        Self {
            lifecycle: Lifecycle::Unloaded,
            refs: 0,
            last_used: Instant::now(),
            footprint,
            load_cost,
            load_waiters: Vec::new(),
        }
    }

    pub(crate) fn is_evictable(&self) -> bool {
        self.lifecycle == Lifecycle::Resident && self.refs == 0
    }

    pub(crate) fn touch(&mut self) {
        self.last_used = Instant::now();
    }
}
