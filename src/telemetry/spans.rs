//! Span utilities for dispatch tracing.

use tracing::{info_span, Span};

/// Extension trait for recording outcomes on spans.
pub trait SpanExt {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for dispatch spans.
pub struct DispatchSpan;

impl DispatchSpan {
    /// Fields filled in as the request progresses:
    /// - `model_id`: model that served the request
    /// - `route_source`, `confidence`: how candidates were chosen
    /// - `wait_ms`: time spent acquiring residency
    /// - `latency_ms`: end-to-end handling time
    /// - `status`, `error.message`: via `SpanExt::record_result`
    pub fn new(request_id: &str) -> Span {
        info_span!(
            "dispatch",
            request_id = %request_id,
            model_id = tracing::field::Empty,
            route_source = tracing::field::Empty,
            confidence = tracing::field::Empty,
            wait_ms = tracing::field::Empty,
            latency_ms = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
