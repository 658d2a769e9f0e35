//! Telemetry for Atlas CORE.
//!
//! Structured logging via `tracing`, request spans, and counters/gauges via
//! the `metrics` facade. Installing a metrics recorder is left to the host.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{
    record_acquire_wait, record_dispatch, record_eviction, record_model_load, record_resident_bytes,
};
pub use spans::{DispatchSpan, SpanExt};
