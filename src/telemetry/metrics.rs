//! Metric names and recording helpers.

use metrics::{counter, gauge, histogram};

pub const DISPATCH_TOTAL: &str = "atlas_dispatch_total";
pub const MODEL_LOADS_TOTAL: &str = "atlas_model_loads_total";
pub const EVICTIONS_TOTAL: &str = "atlas_evictions_total";
pub const ACQUIRE_WAIT_MS: &str = "atlas_acquire_wait_ms";
pub const RESIDENT_BYTES: &str = "atlas_resident_bytes";

/// Count one dispatched request by serving model and outcome.
pub fn record_dispatch(model_id: &str, outcome: &'static str) {
    counter!(DISPATCH_TOTAL, "model" => model_id.to_string(), "outcome" => outcome).increment(1);
}

pub fn record_model_load(model_id: &str, outcome: &'static str) {
    counter!(MODEL_LOADS_TOTAL, "model" => model_id.to_string(), "outcome" => outcome).increment(1);
}

/// `reason` is `budget` for admission evictions and `idle` for the reaper.
pub fn record_eviction(model_id: &str, reason: &'static str) {
    counter!(EVICTIONS_TOTAL, "model" => model_id.to_string(), "reason" => reason).increment(1);
}

pub fn record_acquire_wait(wait_ms: u64) {
    histogram!(ACQUIRE_WAIT_MS).record(wait_ms as f64);
}

pub fn record_resident_bytes(used_bytes: u64) {
    gauge!(RESIDENT_BYTES).set(used_bytes as f64);
}
