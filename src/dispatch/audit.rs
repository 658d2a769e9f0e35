//! Per-request audit record of routing and residency decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::CoreError;
use crate::routing::RouteSource;
use crate::telemetry;

/// Tracing target for audit records.
pub const AUDIT_TARGET: &str = "atlas_core::audit";

/// Terminal outcome of one handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    Ok,
    BackendError,
    TimedOut,
    AllCandidatesFailed,
    /// Routing or configuration rejected the request before residency.
    Rejected,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchOutcome::Ok => "ok",
            DispatchOutcome::BackendError => "backend_error",
            DispatchOutcome::TimedOut => "timed_out",
            DispatchOutcome::AllCandidatesFailed => "all_candidates_failed",
            DispatchOutcome::Rejected => "rejected",
        }
    }

    pub fn from_error(err: &CoreError) -> Self {
        match err {
            CoreError::Backend(_) => DispatchOutcome::BackendError,
            CoreError::TimedOut { .. } => DispatchOutcome::TimedOut,
            CoreError::AllCandidatesFailed { .. } => DispatchOutcome::AllCandidatesFailed,
            _ => DispatchOutcome::Rejected,
        }
    }
}

/// Which model served which request, and what it cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRecord {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub model_id: Option<String>,
    pub route_source: Option<RouteSource>,
    pub confidence: Option<f32>,
    pub candidates: Vec<String>,
    pub context_snippets: usize,
    pub wait_ms: u64,
    pub invoke_ms: u64,
    pub outcome: DispatchOutcome,
    pub error: Option<String>,
}

impl DispatchRecord {
    pub(crate) fn new(request_id: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            model_id: None,
            route_source: None,
            confidence: None,
            candidates: Vec::new(),
            context_snippets: 0,
            wait_ms: 0,
            invoke_ms: 0,
            outcome: DispatchOutcome::Rejected,
            error: None,
        }
    }

    pub(crate) fn finish<T>(&mut self, result: &Result<T, CoreError>) {
        match result {
            Ok(_) => self.outcome = DispatchOutcome::Ok,
            Err(e) => {
                self.outcome = DispatchOutcome::from_error(e);
                self.error = Some(e.to_string());
            }
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Log on the audit target and count the dispatch.
    pub(crate) fn emit(&self) {
        let model = self.model_id.as_deref().unwrap_or("none");
        info!(
            target: AUDIT_TARGET,
            request_id = %self.request_id,
            model_id = model,
            route_source = self.route_source.map(|s| s.as_str()).unwrap_or("none"),
            confidence = self.confidence.unwrap_or(0.0) as f64,
            candidates = ?self.candidates,
            context_snippets = self.context_snippets,
            wait_ms = self.wait_ms,
            invoke_ms = self.invoke_ms,
            outcome = self.outcome.as_str(),
            error = self.error.as_deref().unwrap_or(""),
            timestamp = %self.timestamp.to_rfc3339(),
            "dispatch"
        );
        telemetry::record_dispatch(model, self.outcome.as_str());
    }
}
