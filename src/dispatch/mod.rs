//! Request dispatch: route, secure residency, invoke, release.

mod audit;
mod coordinator;
mod request;

pub use audit::{DispatchOutcome, DispatchRecord, AUDIT_TARGET};
pub use coordinator::{DispatchCoordinator, DispatchResponse};
pub use request::InferenceRequest;
