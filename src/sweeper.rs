use std::sync::Arc;

use tracing::debug;

use crate::engine::Engine;
use crate::model::now_ms;
use crate::policy::SWEEP_PERIOD;

/// Background task that periodically evicts expired leases and idempotency
/// records. Best-effort housekeeping: expired entries are also rejected
/// lazily on read, so this only bounds memory, never correctness.
pub async fn run_sweeper(engine: Arc<Engine>) {
    let mut interval = tokio::time::interval(SWEEP_PERIOD);
    loop {
        interval.tick().await;
        let evicted = engine.store().sweep_expired(now_ms());
        if evicted > 0 {
            debug!("swept {evicted} expired entries");
            metrics::counter!(crate::observability::SWEEP_EVICTIONS_TOTAL)
                .increment(evicted as u64);
        }
    }
}
