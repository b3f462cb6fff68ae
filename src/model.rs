use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime, Time};
use ulid::Ulid;

/// Unix milliseconds — the only absolute time type.
pub type Ms = i64;

pub fn now_ms() -> Ms {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as Ms
}

/// Absolute instant for a calendar date at a time of day (UTC).
pub fn instant(date: Date, tod: Time) -> Ms {
    PrimitiveDateTime::new(date, tod).assume_utc().unix_timestamp() * 1000
}

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// A time-of-day pair, anchored to a date to produce an absolute `Span`.
/// Half-open like everything else: a window ending at 14:30 admits a
/// reservation ending exactly at 14:30.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: Time,
    pub end: Time,
}

impl DayWindow {
    pub fn new(start: Time, end: Time) -> Self {
        Self { start, end }
    }

    pub fn span_on(&self, date: Date) -> Span {
        Span::new(instant(date, self.start), instant(date, self.end))
    }
}

/// Full-day search window `[date 00:00, date+1 00:00)`.
pub fn full_day(date: Date) -> Span {
    let start = instant(date, Time::MIDNIGHT);
    Span::new(start, start + 24 * 3_600_000)
}

/// A bookable table. Capacity range is inclusive on both ends; a table
/// seating `[2, 4]` takes parties of 2, 3 or 4. Immutable after seeding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub id: String,
    pub min_size: u32,
    pub max_size: u32,
}

impl Table {
    pub fn fits(&self, party_size: u32) -> bool {
        self.min_size <= party_size && party_size <= self.max_size
    }
}

/// A scheduling scope (dining sector). Allocation never crosses sectors.
#[derive(Debug, Clone)]
pub struct Sector {
    pub id: String,
    pub service_windows: Vec<DayWindow>,
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

/// A committed booking over one or more tables. Cancellation is a status
/// flip, never a physical delete — history stays queryable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub sector_id: String,
    pub table_ids: Vec<String>,
    pub date: Date,
    pub span: Span,
    pub party_size: u32,
    pub status: ReservationStatus,
    pub created_at: Ms,
    pub updated_at: Ms,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }

    pub fn occupies(&self, table_id: &str) -> bool {
        self.table_ids.iter().any(|t| t == table_id)
    }
}

/// Derive order matters: `Single` sorts before `Combo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CandidateKind {
    Single,
    Combo,
}

/// An ephemeral bookable option: produced by discretization, consumed by
/// selection, never persisted. `table_ids` is kept sorted so equal table
/// sets compare equal and the selection tie-break is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub table_ids: Vec<String>,
    pub kind: CandidateKind,
    pub span: Span,
    pub waste: u32,
}
