use crate::model::*;
use crate::policy::GRID_STEP_MS;

// ── Gap computation ───────────────────────────────────────────────

/// Compute free intervals for one table across the given search windows.
///
/// Filters the reservation set internally: only `Active` reservations that
/// occupy `table_id` block time. Each window is swept independently with a
/// cursor; the cursor only moves forward, which absorbs overlapping and
/// nested reservations without double-counting. Returned gaps are disjoint,
/// sorted by start, each at least `min_duration_ms` long, and contained in
/// the union of the windows.
pub fn free_intervals(
    table_id: &str,
    reservations: &[Reservation],
    windows: &[Span],
    min_duration_ms: Ms,
) -> Vec<Span> {
    let mut occupied: Vec<Span> = reservations
        .iter()
        .filter(|r| r.is_active() && r.occupies(table_id))
        .map(|r| r.span)
        .collect();
    occupied.sort_by_key(|s| s.start);

    let mut gaps = Vec::new();
    for window in windows {
        let mut cursor = window.start;
        for span in &occupied {
            if span.end <= window.start {
                continue; // entirely before this window
            }
            if span.start >= window.end {
                break; // sorted: nothing later can overlap this window
            }
            if span.start > cursor && span.start - cursor >= min_duration_ms {
                gaps.push(Span::new(cursor, span.start));
            }
            cursor = cursor.max(span.end);
        }
        if window.end > cursor && window.end - cursor >= min_duration_ms {
            gaps.push(Span::new(cursor, window.end));
        }
    }
    gaps
}

/// Fold per-table gap lists into the intervals where every table is
/// simultaneously free for at least `min_duration_ms`.
///
/// Pairwise product per fold step — worst case O(∏ list sizes), fine because
/// a table's gap list per day is bounded by its reservation count + 1.
/// Output order is unspecified; callers that need ordering re-sort.
pub fn intersect(gap_lists: &[Vec<Span>], min_duration_ms: Ms) -> Vec<Span> {
    let Some((first, rest)) = gap_lists.split_first() else {
        return Vec::new();
    };
    let mut common = first.clone();
    for gaps in rest {
        let mut next = Vec::new();
        for a in &common {
            for b in gaps {
                let start = a.start.max(b.start);
                let end = a.end.min(b.end);
                if start < end && end - start >= min_duration_ms {
                    next.push(Span::new(start, end));
                }
            }
        }
        common = next;
        if common.is_empty() {
            break;
        }
    }
    common
}

/// Slide a `duration_ms` window across each gap in `GRID_STEP_MS` steps,
/// emitting one candidate per position where the window fully fits.
///
/// Overlapping start times are intentional — choosing among them is the
/// selection policy's job, not this one's.
pub fn discretize(
    gaps: &[Span],
    duration_ms: Ms,
    table_ids: &[String],
    kind: CandidateKind,
    waste: u32,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for gap in gaps {
        let mut start = gap.start;
        while start + duration_ms <= gap.end {
            candidates.push(Candidate {
                table_ids: table_ids.to_vec(),
                kind,
                span: Span::new(start, start + duration_ms),
                waste,
            });
            start += GRID_STEP_MS;
        }
    }
    candidates
}
