//! Scoped claim on a resident model.

use std::fmt;
use std::sync::Arc;

use super::manager::Shared;
use crate::models::ModelId;

/// RAII reservation: while held, the model cannot be evicted.
///
/// Dropping the reservation releases it, so every exit path of the owning
/// request (success, error, panic, cancellation) gives the slot back.
pub struct Reservation {
    shared: Arc<Shared>,
    model_id: ModelId,
    released: bool,
}

impl Reservation {
    /// Caller must already have incremented the model's reference count.
    pub(crate) fn new(shared: Arc<Shared>, model_id: ModelId) -> Self {
        Self { shared, model_id, released: false }
    }

    pub fn model_id(&self) -> &ModelId {
        &self.model_id
    }

    /// Release explicitly. Equivalent to dropping.
    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.shared.release(&self.model_id);
        }
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl fmt::Debug for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reservation")
            .field("model_id", &self.model_id)
            .field("released", &self.released)
            .finish()
    }
}
