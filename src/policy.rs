//! Contractual constants of the allocation engine. These are system policy,
//! not caller-supplied configuration.

use crate::model::Ms;

const MINUTE_MS: Ms = 60_000;

/// Candidate start times snap to this grid. Fixed so candidate density stays
/// predictable regardless of caller.
pub const GRID_STEP_MS: Ms = 15 * MINUTE_MS;

/// Seating duration by party size.
pub fn duration_for_party(party_size: u32) -> Ms {
    let minutes: Ms = match party_size {
        0..=2 => 75,
        3..=4 => 90,
        5..=8 => 120,
        _ => 150,
    };
    minutes * MINUTE_MS
}

/// How long a `(sector, date)` lease lives if the holder never releases it.
/// The guarded section is in-memory discovery plus one map insert, so this
/// only matters after a crashed holder.
pub const LEASE_TTL_MS: Ms = 15_000;

/// Idempotency records answer retries for this long after the first commit.
pub const IDEMPOTENCY_TTL_MS: Ms = 24 * 3_600_000;

/// Background sweep period for expired leases and idempotency records.
pub const SWEEP_PERIOD: std::time::Duration = std::time::Duration::from_secs(60);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_policy_boundaries() {
        assert_eq!(duration_for_party(1), 75 * MINUTE_MS);
        assert_eq!(duration_for_party(2), 75 * MINUTE_MS);
        assert_eq!(duration_for_party(3), 90 * MINUTE_MS);
        assert_eq!(duration_for_party(4), 90 * MINUTE_MS);
        assert_eq!(duration_for_party(5), 120 * MINUTE_MS);
        assert_eq!(duration_for_party(8), 120 * MINUTE_MS);
        assert_eq!(duration_for_party(9), 150 * MINUTE_MS);
        assert_eq!(duration_for_party(20), 150 * MINUTE_MS);
    }

    #[test]
    fn grid_divides_every_duration() {
        for p in 1..=12 {
            assert_eq!(duration_for_party(p) % GRID_STEP_MS, 0);
        }
    }
}
