//! Naive/aware timestamp boundary and the coercion policy applied to it.
//!
//! All engine arithmetic happens in `DateTime<Utc>`. Callers, however, may
//! hold wall-clock readings with no zone attached (from user input or legacy
//! rows). [`Timestamp`] is the boundary type for such values and
//! [`TimePolicy`] decides what happens to the naive ones: rejection, or a
//! lossy coercion into a fixed reference zone.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// A point in time as supplied by a caller: either an aware UTC instant or a
/// naive wall-clock reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timestamp {
    Utc(DateTime<Utc>),
    Naive(NaiveDateTime),
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Timestamp::Utc(dt)
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(dt: NaiveDateTime) -> Self {
        Timestamp::Naive(dt)
    }
}

/// How naive timestamps are treated at comparison boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NaiveMode {
    /// Reject naive timestamps with [`EngineError::TimezoneMismatch`].
    #[default]
    Strict,
    /// Interpret naive timestamps as wall-clock readings in the reference
    /// zone. Lossy: the reading carried no zone, so the reference zone is an
    /// assumption the caller opts into.
    Coerce,
}

/// Boundary policy for timestamps entering the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePolicy {
    pub naive: NaiveMode,
    /// Reference zone used by [`NaiveMode::Coerce`].
    pub reference: Tz,
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            naive: NaiveMode::Strict,
            reference: Tz::UTC,
        }
    }
}

impl TimePolicy {
    /// Compatibility policy: coerce naive readings into UTC.
    pub fn coercing() -> Self {
        Self {
            naive: NaiveMode::Coerce,
            reference: Tz::UTC,
        }
    }

    /// Resolve a caller-supplied timestamp to a canonical UTC instant.
    ///
    /// Ambiguous local readings (the repeated hour of a DST fall-back)
    /// resolve to the earlier instant. Nonexistent readings (the skipped
    /// hour of a spring-forward) are a [`EngineError::TimezoneMismatch`]
    /// even under [`NaiveMode::Coerce`].
    pub fn resolve(&self, ts: Timestamp) -> Result<DateTime<Utc>> {
        match ts {
            Timestamp::Utc(dt) => Ok(dt),
            Timestamp::Naive(naive) => match self.naive {
                NaiveMode::Strict => Err(EngineError::TimezoneMismatch),
                NaiveMode::Coerce => match self.reference.from_local_datetime(&naive) {
                    LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
                    LocalResult::Ambiguous(earlier, _) => Ok(earlier.with_timezone(&Utc)),
                    LocalResult::None => Err(EngineError::TimezoneMismatch),
                },
            },
        }
    }
}
