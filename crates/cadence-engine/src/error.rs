//! Error types for occurrence generation and reconciliation.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::series::SeriesId;

/// Errors surfaced by the engine. Everything here is a programming or data
/// error detected over already-fetched data; there are no transient failures
/// and nothing is ever retried. Window misses, empty results, and exhausted
/// streams are normal terminal values, not errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An interval whose end does not come strictly after its start.
    #[error("invalid interval: end {end} is not after start {start}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// The recurrence definition was rejected by the enumeration backend.
    #[error("invalid recurrence rule: {0}")]
    InvalidRule(String),

    /// A naive timestamp reached a comparison boundary under the strict
    /// timezone policy, or could not be placed in the reference zone.
    #[error("naive timestamp cannot be compared with aware instants under the active timezone policy")]
    TimezoneMismatch,

    /// Attempt to cancel (or uncancel) the group-source occurrence that
    /// stands for the whole series rather than a derived instance.
    #[error("occurrence is the group source of series {0} and cannot be cancelled")]
    CancelGroupSource(SeriesId),

    /// An overlay identity probe that cannot be evaluated while persisted
    /// entries exist. An empty overlay tolerates the same probe as a miss.
    #[error("ambiguous overlay lookup: incomparable key against {entries} persisted entries")]
    AmbiguousLookup { entries: usize },
}

/// Convenience alias used throughout cadence-engine.
pub type Result<T> = std::result::Result<T, EngineError>;
