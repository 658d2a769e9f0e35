//! Model residency under a memory budget.
//!
//! Models move `Unloaded → Loading → Resident → Unloading → Unloaded`.
//! Callers hold a [`Reservation`] while they use a model; unreserved
//! resident models are evicted least-recently-used first when space is
//! needed, or by the idle reaper.

mod manager;
mod queue;
mod reservation;
mod state;

pub use manager::{ModelStatus, ResidencyConfig, ResidencyManager, ResidencySnapshot};
pub use reservation::Reservation;
pub use state::Lifecycle;
