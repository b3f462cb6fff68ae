use std::time::Instant;

use time::Date;
use tracing::{debug, info};
use ulid::Ulid;

use crate::model::*;
use crate::observability;
use crate::policy::{IDEMPOTENCY_TTL_MS, LEASE_TTL_MS, duration_for_party};

use super::candidates::find_candidates;
use super::selection::{rank, select_best};
use super::{Engine, EngineError};

/// A party asking to be seated. Seating duration is derived from the party
/// size by the fixed policy, never supplied by the caller.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub sector_id: String,
    pub date: Date,
    pub party_size: u32,
    /// Explicit search windows. Falls back to the sector's service windows,
    /// then to the full day.
    pub windows: Option<Vec<DayWindow>>,
    /// Retried submissions under the same key return the original result.
    pub idempotency_key: Option<String>,
}

impl Engine {
    /// All bookable options for a party, ranked best-first.
    pub fn find_availability(
        &self,
        sector_id: &str,
        date: Date,
        party_size: u32,
        windows: Option<&[DayWindow]>,
    ) -> Result<Vec<Candidate>, EngineError> {
        let started = Instant::now();
        let sector = self
            .store()
            .get_sector(sector_id)
            .ok_or_else(|| EngineError::NotFound(format!("sector {sector_id}")))?;
        let spans = resolve_windows(&sector, date, windows)?;
        let reservations = self.store().reservations_for(sector_id, date);

        let mut candidates = find_candidates(
            &sector.tables,
            &reservations,
            &spans,
            party_size,
            duration_for_party(party_size),
        );
        rank(&mut candidates);

        metrics::histogram!(observability::DISCOVERY_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::histogram!(observability::DISCOVERY_CANDIDATES).record(candidates.len() as f64);
        Ok(candidates)
    }

    /// Commit the best available option for the request, or report why not.
    ///
    /// The whole read-compute-write sequence runs under the `(sector, date)`
    /// lease; a racing request for the same key gets `Conflict` and retries.
    /// Requests for different keys proceed fully in parallel.
    pub fn create_booking(&self, request: &BookingRequest) -> Result<Reservation, EngineError> {
        let now = now_ms();

        // Fast path: a retried request is answered without taking the lease.
        if let Some(key) = &request.idempotency_key
            && let Some(existing) = self.store().idempotent_reservation(key, now) {
                debug!("idempotent replay for key {key}");
                metrics::counter!(observability::IDEMPOTENT_REPLAYS_TOTAL).increment(1);
                return Ok(existing);
            }

        let lease_key = format!("{}:{}", request.sector_id, request.date);
        let _lease = match self
            .store()
            .try_lease(&lease_key, LEASE_TTL_MS, now)
        {
            Ok(guard) => guard,
            Err(e) => {
                // Routine under contention; the caller retries.
                debug!("lease contention on {lease_key}");
                metrics::counter!(observability::LEASE_CONFLICTS_TOTAL).increment(1);
                return Err(e);
            }
        };

        // First commit under a key is authoritative — re-check now that we
        // hold the lease, in case a racing retry just won.
        if let Some(key) = &request.idempotency_key
            && let Some(existing) = self.store().idempotent_reservation(key, now) {
                metrics::counter!(observability::IDEMPOTENT_REPLAYS_TOTAL).increment(1);
                return Ok(existing);
            }

        let candidates = self.find_availability(
            &request.sector_id,
            request.date,
            request.party_size,
            request.windows.as_deref(),
        )?;
        let best = match select_best(&candidates) {
            Some(c) => c.clone(),
            None => {
                debug!(
                    "no capacity in {} on {} for party of {}",
                    request.sector_id, request.date, request.party_size
                );
                metrics::counter!(observability::NO_CAPACITY_TOTAL).increment(1);
                return Err(EngineError::NoCapacity);
            }
        };

        let reservation = Reservation {
            id: Ulid::new(),
            sector_id: request.sector_id.clone(),
            table_ids: best.table_ids,
            date: request.date,
            span: best.span,
            party_size: request.party_size,
            status: ReservationStatus::Active,
            created_at: now,
            updated_at: now,
        };
        self.store().insert_reservation(reservation.clone());
        if let Some(key) = &request.idempotency_key {
            self.store()
                .remember_idempotent(key, reservation.id, IDEMPOTENCY_TTL_MS, now);
        }

        info!(
            "booked {} in {} on {} ({:?}, party {})",
            reservation.id, reservation.sector_id, reservation.date,
            reservation.table_ids, reservation.party_size
        );
        metrics::counter!(observability::BOOKINGS_TOTAL).increment(1);
        Ok(reservation)
        // Lease guard drops here — released on success and on every early
        // error return above it.
    }

    /// Active reservations for a sector and date, sorted by start.
    pub fn list_reservations(
        &self,
        sector_id: &str,
        date: Date,
    ) -> Result<Vec<Reservation>, EngineError> {
        if self.store().get_sector(sector_id).is_none() {
            return Err(EngineError::NotFound(format!("sector {sector_id}")));
        }
        let mut reservations: Vec<Reservation> = self
            .store()
            .reservations_for(sector_id, date)
            .into_iter()
            .filter(Reservation::is_active)
            .collect();
        reservations.sort_by_key(|r| r.span.start);
        Ok(reservations)
    }

    /// Cancel by identity. Soft delete; repeated cancels succeed quietly.
    pub fn cancel_reservation(&self, id: &Ulid) -> Result<(), EngineError> {
        self.store()
            .set_cancelled(id, now_ms())
            .ok_or_else(|| EngineError::NotFound(format!("reservation {id}")))?;
        info!("cancelled reservation {id}");
        metrics::counter!(observability::CANCELLATIONS_TOTAL).increment(1);
        Ok(())
    }
}

/// Explicit windows → sector service windows → full day, validated.
fn resolve_windows(
    sector: &Sector,
    date: Date,
    windows: Option<&[DayWindow]>,
) -> Result<Vec<Span>, EngineError> {
    let chosen: &[DayWindow] = match windows {
        Some(ws) if !ws.is_empty() => ws,
        _ => &sector.service_windows,
    };
    if chosen.is_empty() {
        return Ok(vec![full_day(date)]);
    }
    let mut spans = Vec::with_capacity(chosen.len());
    for w in chosen {
        if w.start >= w.end {
            return Err(EngineError::InvalidInterval {
                start: instant(date, w.start),
                end: instant(date, w.end),
            });
        }
        spans.push(w.span_on(date));
    }
    Ok(spans)
}
