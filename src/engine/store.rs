use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use time::Date;
use ulid::Ulid;

use crate::model::*;

use super::EngineError;

#[derive(Debug, Clone)]
pub struct IdempotencyRecord {
    pub reservation_id: Ulid,
    pub expires_at: Ms,
}

/// The only mutable shared state in the system: the sector catalog,
/// the reservation set, the lease map and the idempotency map.
///
/// Reservation mutation is not lock-protected here — engine operations hold
/// the relevant `(sector, date)` lease across the whole read-compute-write
/// sequence.
pub struct AllocationStore {
    sectors: DashMap<String, Sector>,
    reservations: DashMap<Ulid, Reservation>,
    /// Lease key → expiry instant. An entry past its expiry counts as free.
    leases: DashMap<String, Ms>,
    /// Idempotency key → first committed result, bounded by TTL.
    idempotency: DashMap<String, IdempotencyRecord>,
}

impl Default for AllocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationStore {
    pub fn new() -> Self {
        Self {
            sectors: DashMap::new(),
            reservations: DashMap::new(),
            leases: DashMap::new(),
            idempotency: DashMap::new(),
        }
    }

    // ── Sector catalog ───────────────────────────────────────

    pub fn insert_sector(&self, sector: Sector) {
        self.sectors.insert(sector.id.clone(), sector);
    }

    pub fn get_sector(&self, id: &str) -> Option<Sector> {
        self.sectors.get(id).map(|e| e.value().clone())
    }

    pub fn sector_count(&self) -> usize {
        self.sectors.len()
    }

    // ── Reservations ─────────────────────────────────────────

    pub fn insert_reservation(&self, reservation: Reservation) {
        self.reservations.insert(reservation.id, reservation);
    }

    pub fn get_reservation(&self, id: &Ulid) -> Option<Reservation> {
        self.reservations.get(id).map(|e| e.value().clone())
    }

    /// Full reservation set for a sector and date, status-tagged — cancelled
    /// records included so history stays visible to callers that want it.
    pub fn reservations_for(&self, sector_id: &str, date: Date) -> Vec<Reservation> {
        self.reservations
            .iter()
            .filter(|e| e.value().sector_id == sector_id && e.value().date == date)
            .map(|e| e.value().clone())
            .collect()
    }

    /// Soft delete: flip `Active → Cancelled` in place and refresh
    /// `updated_at`. Cancelling an already-cancelled reservation is a no-op.
    /// Returns `None` for an unknown id.
    pub fn set_cancelled(&self, id: &Ulid, now: Ms) -> Option<()> {
        let mut entry = self.reservations.get_mut(id)?;
        if entry.is_active() {
            entry.status = ReservationStatus::Cancelled;
            entry.updated_at = now;
        }
        Some(())
    }

    // ── Leases ───────────────────────────────────────────────

    /// Non-blocking, fail-fast mutual exclusion per key. Succeeds iff no
    /// unexpired entry exists; the entry API makes the check-and-set atomic.
    /// The returned guard releases the lease on every exit path.
    pub fn try_lease(&self, key: &str, ttl: Ms, now: Ms) -> Result<LeaseGuard<'_>, EngineError> {
        match self.leases.entry(key.to_string()) {
            Entry::Occupied(mut e) => {
                if *e.get() > now {
                    return Err(EngineError::Conflict(key.to_string()));
                }
                e.insert(now + ttl);
            }
            Entry::Vacant(v) => {
                v.insert(now + ttl);
            }
        }
        Ok(LeaseGuard {
            store: self,
            key: key.to_string(),
        })
    }

    pub fn release(&self, key: &str) {
        self.leases.remove(key);
    }

    pub fn lease_held(&self, key: &str, now: Ms) -> bool {
        self.leases.get(key).is_some_and(|e| *e.value() > now)
    }

    // ── Idempotency ──────────────────────────────────────────

    /// The reservation previously committed under `key`, if the record is
    /// still live. An expired record is evicted lazily here; the background
    /// sweep only bounds memory, never correctness.
    pub fn idempotent_reservation(&self, key: &str, now: Ms) -> Option<Reservation> {
        let hit = self.idempotency.get(key).map(|e| e.value().clone())?;
        if hit.expires_at <= now {
            self.idempotency.remove_if(key, |_, v| v.expires_at <= now);
            return None;
        }
        self.get_reservation(&hit.reservation_id)
    }

    pub fn remember_idempotent(&self, key: &str, reservation_id: Ulid, ttl: Ms, now: Ms) {
        self.idempotency.insert(
            key.to_string(),
            IdempotencyRecord {
                reservation_id,
                expires_at: now + ttl,
            },
        );
    }

    // ── Housekeeping ─────────────────────────────────────────

    /// Evict expired idempotency records and leases. Returns the eviction
    /// count. Invoked periodically by the sweeper.
    pub fn sweep_expired(&self, now: Ms) -> usize {
        let mut evicted = 0;
        self.idempotency.retain(|_, v| {
            let keep = v.expires_at > now;
            if !keep {
                evicted += 1;
            }
            keep
        });
        self.leases.retain(|_, expiry| {
            let keep = *expiry > now;
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }
}

/// Scoped lease: releasing on `Drop` guarantees release on success, error
/// and panic paths alike.
pub struct LeaseGuard<'a> {
    store: &'a AllocationStore,
    key: String,
}

impl Drop for LeaseGuard<'_> {
    fn drop(&mut self) {
        self.store.release(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use time::macros::date;

    fn reservation(id: Ulid, sector: &str) -> Reservation {
        Reservation {
            id,
            sector_id: sector.into(),
            table_ids: vec!["T1".into()],
            date: date!(2025 - 10 - 22),
            span: Span::new(1000, 2000),
            party_size: 2,
            status: ReservationStatus::Active,
            created_at: 0,
            updated_at: 0,
        }
    }

    // ── Leases ────────────────────────────────────────────

    #[test]
    fn lease_excludes_second_acquirer() {
        let store = AllocationStore::new();
        let guard = store.try_lease("main:2025-10-22", 10_000, 1_000).unwrap();
        let second = store.try_lease("main:2025-10-22", 10_000, 2_000);
        assert!(matches!(second, Err(EngineError::Conflict(_))));
        drop(guard);
    }

    #[test]
    fn different_keys_lease_independently() {
        let store = AllocationStore::new();
        let a = store.try_lease("main:2025-10-22", 10_000, 1_000).unwrap();
        let b = store.try_lease("terrace:2025-10-22", 10_000, 1_000);
        assert!(b.is_ok());
        drop(a);
    }

    #[test]
    fn expired_lease_can_be_reacquired() {
        let store = AllocationStore::new();
        let guard = store.try_lease("k", 5_000, 1_000).unwrap();
        // Abandon without releasing: simulate a crashed holder.
        std::mem::forget(guard);
        assert!(store.try_lease("k", 5_000, 3_000).is_err());
        let after_expiry = store.try_lease("k", 5_000, 7_000);
        assert!(after_expiry.is_ok());
    }

    #[test]
    fn guard_drop_releases() {
        let store = AllocationStore::new();
        {
            let _guard = store.try_lease("k", 10_000, 1_000).unwrap();
            assert!(store.lease_held("k", 1_500));
        }
        assert!(!store.lease_held("k", 1_500));
        assert!(store.try_lease("k", 10_000, 1_500).is_ok());
    }

    #[test]
    fn racing_acquirers_one_winner() {
        let store = Arc::new(AllocationStore::new());
        let barrier = Arc::new(Barrier::new(8));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let barrier = barrier.clone();
            handles.push(std::thread::spawn(move || {
                let lease = store.try_lease("hot", 60_000, 1_000);
                let acquired = lease.is_ok();
                // Hold the lease until every thread has tried.
                barrier.wait();
                drop(lease);
                acquired
            }));
        }
        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|w| *w)
            .count();
        assert_eq!(wins, 1);
    }

    // ── Idempotency ───────────────────────────────────────

    #[test]
    fn idempotency_roundtrip() {
        let store = AllocationStore::new();
        let id = Ulid::new();
        store.insert_reservation(reservation(id, "main"));
        store.remember_idempotent("req-1", id, 10_000, 1_000);

        let hit = store.idempotent_reservation("req-1", 5_000).unwrap();
        assert_eq!(hit.id, id);
        assert!(store.idempotent_reservation("req-2", 5_000).is_none());
    }

    #[test]
    fn expired_idempotency_record_evicted_on_read() {
        let store = AllocationStore::new();
        let id = Ulid::new();
        store.insert_reservation(reservation(id, "main"));
        store.remember_idempotent("req-1", id, 1_000, 1_000);

        assert!(store.idempotent_reservation("req-1", 3_000).is_none());
        // Lazily evicted: a later read within a fresh TTL still misses.
        assert!(store.idempotent_reservation("req-1", 500).is_none());
    }

    #[test]
    fn sweep_evicts_only_expired() {
        let store = AllocationStore::new();
        let id = Ulid::new();
        store.insert_reservation(reservation(id, "main"));
        store.remember_idempotent("old", id, 1_000, 0);
        store.remember_idempotent("new", id, 100_000, 0);
        let guard = store.try_lease("stale", 1_000, 0).unwrap();
        std::mem::forget(guard);

        let evicted = store.sweep_expired(50_000);
        assert_eq!(evicted, 2); // "old" record + "stale" lease
        assert!(store.idempotent_reservation("new", 50_000).is_some());
        assert!(store.idempotent_reservation("old", 50_000).is_none());
        assert!(store.try_lease("stale", 1_000, 50_000).is_ok());
    }

    // ── Reservations ──────────────────────────────────────

    #[test]
    fn cancel_is_soft_delete() {
        let store = AllocationStore::new();
        let id = Ulid::new();
        store.insert_reservation(reservation(id, "main"));

        store.set_cancelled(&id, 9_000).unwrap();
        let r = store.get_reservation(&id).unwrap();
        assert_eq!(r.status, ReservationStatus::Cancelled);
        assert_eq!(r.updated_at, 9_000);

        // Record survives cancellation and stays listed for the scope.
        let all = store.reservations_for("main", date!(2025 - 10 - 22));
        assert_eq!(all.len(), 1);
    }

    #[test]
    fn cancel_twice_is_noop() {
        let store = AllocationStore::new();
        let id = Ulid::new();
        store.insert_reservation(reservation(id, "main"));

        store.set_cancelled(&id, 9_000).unwrap();
        store.set_cancelled(&id, 12_000).unwrap();
        // Second cancel does not touch updated_at.
        assert_eq!(store.get_reservation(&id).unwrap().updated_at, 9_000);
    }

    #[test]
    fn cancel_unknown_is_none() {
        let store = AllocationStore::new();
        assert!(store.set_cancelled(&Ulid::new(), 0).is_none());
    }

    #[test]
    fn reservations_scoped_by_sector_and_date() {
        let store = AllocationStore::new();
        store.insert_reservation(reservation(Ulid::new(), "main"));
        store.insert_reservation(reservation(Ulid::new(), "terrace"));

        assert_eq!(store.reservations_for("main", date!(2025 - 10 - 22)).len(), 1);
        assert_eq!(store.reservations_for("main", date!(2025 - 10 - 23)).len(), 0);
    }
}
