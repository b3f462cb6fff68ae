pub mod engine;
pub mod model;
pub mod observability;
pub mod policy;
pub mod seed;
pub mod sweeper;

pub use engine::{AllocationStore, BookingRequest, Engine, EngineError};
pub use model::{
    Candidate, CandidateKind, DayWindow, Reservation, ReservationStatus, Sector, Span, Table,
};
