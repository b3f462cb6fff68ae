mod bookings;
mod candidates;
mod error;
mod gaps;
mod selection;
mod store;

pub use bookings::BookingRequest;
pub use candidates::find_candidates;
pub use error::EngineError;
pub use gaps::{discretize, free_intervals, intersect};
pub use selection::{candidate_order, rank, select_best};
pub use store::{AllocationStore, LeaseGuard};

/// The allocation engine: a pure discovery/selection pipeline over the one
/// piece of shared mutable state, the [`AllocationStore`].
pub struct Engine {
    store: AllocationStore,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self {
            store: AllocationStore::new(),
        }
    }

    pub fn store(&self) -> &AllocationStore {
        &self.store
    }
}
