use std::cmp::Ordering;

use crate::model::Candidate;

// ── Selection policy ──────────────────────────────────────────────

/// The total order candidates are ranked by: single tables before combos,
/// then least wasted capacity, then earliest start, then the joined table-id
/// set lexicographically. The last key makes the order strict — no two
/// distinct candidates compare equal.
pub fn candidate_order(a: &Candidate, b: &Candidate) -> Ordering {
    a.kind
        .cmp(&b.kind)
        .then(a.waste.cmp(&b.waste))
        .then(a.span.start.cmp(&b.span.start))
        .then_with(|| a.table_ids.join("+").cmp(&b.table_ids.join("+")))
}

/// Sort candidates best-first.
pub fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(candidate_order);
}

/// The single best candidate, or `None` if there are no candidates.
pub fn select_best(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().min_by(|a, b| candidate_order(a, b))
}
