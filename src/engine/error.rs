use crate::model::Ms;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Zero qualifying candidates for the request. A routine outcome under
    /// normal load, not a fault.
    NoCapacity,
    /// The `(sector, date)` lease is already held. Transient; callers retry.
    Conflict(String),
    /// Unknown sector or reservation identity.
    NotFound(String),
    /// Malformed or inverted time bounds.
    InvalidInterval { start: Ms, end: Ms },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NoCapacity => write!(f, "no capacity for request"),
            EngineError::Conflict(key) => write!(f, "allocation in progress for {key}"),
            EngineError::NotFound(what) => write!(f, "not found: {what}"),
            EngineError::InvalidInterval { start, end } => {
                write!(f, "invalid interval [{start}, {end})")
            }
        }
    }
}

impl std::error::Error for EngineError {}
