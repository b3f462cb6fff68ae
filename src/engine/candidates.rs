use crate::model::*;

use super::gaps::{discretize, free_intervals, intersect};

// ── Candidate generation ──────────────────────────────────────────

/// Enumerate every bookable option for a party: single tables whose capacity
/// range contains the party, then table combinations booked as one unit.
///
/// Combo enumeration is the full powerset of subsets of size ≥ 2 — `2^n` in
/// the sector's table count. Sectors hold low tens of tables, where this is
/// cheap; a larger deployment would need capacity-bucketed or pruned search.
///
/// Pure function of its inputs; ordering of the result is not significant
/// (the selection policy re-sorts).
pub fn find_candidates(
    tables: &[Table],
    reservations: &[Reservation],
    windows: &[Span],
    party_size: u32,
    duration_ms: Ms,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    // Phase 1: single tables.
    for table in tables {
        if !table.fits(party_size) {
            continue;
        }
        let gaps = free_intervals(&table.id, reservations, windows, duration_ms);
        let ids = vec![table.id.clone()];
        candidates.extend(discretize(
            &gaps,
            duration_ms,
            &ids,
            CandidateKind::Single,
            table.max_size - party_size,
        ));
    }

    // Phase 2: combinations of two or more tables.
    for mask in 1u64..(1u64 << tables.len()) {
        if mask.count_ones() < 2 {
            continue;
        }
        let members: Vec<&Table> = tables
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1u64 << i) != 0)
            .map(|(_, t)| t)
            .collect();

        let combined_min: u32 = members.iter().map(|t| t.min_size).sum();
        let combined_max: u32 = members.iter().map(|t| t.max_size).sum();
        if party_size < combined_min || party_size > combined_max {
            continue;
        }

        let gap_lists: Vec<Vec<Span>> = members
            .iter()
            .map(|t| free_intervals(&t.id, reservations, windows, duration_ms))
            .collect();
        let common = intersect(&gap_lists, duration_ms);
        if common.is_empty() {
            continue;
        }

        let mut ids: Vec<String> = members.iter().map(|t| t.id.clone()).collect();
        ids.sort();
        candidates.extend(discretize(
            &common,
            duration_ms,
            &ids,
            CandidateKind::Combo,
            combined_max - party_size,
        ));
    }

    candidates
}
