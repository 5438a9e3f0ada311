//! Occurrence: one concrete time interval instance of a series.
//!
//! An occurrence is created transiently for every generated start instant
//! and becomes persistent only when a caller saves it (after a move or a
//! cancel). Its identity within the series is the *original* slot, which
//! never changes once set; `start`/`end` may drift through moves.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::series::{Series, SeriesId};

/// Distinguishes derived instances from the canonical group-source row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OccurrenceKind {
    /// A single instance of the series, generated or persisted.
    #[default]
    Instance,
    /// The canonical occurrence standing for the whole series. It is never
    /// produced by generation and cannot be cancelled.
    GroupSource,
}

/// Stable identity of an occurrence: the slot it would have occupied had it
/// never been edited. Two occurrences with equal keys are the same instance
/// of the same series, whatever their current intervals say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OccurrenceKey {
    pub series: SeriesId,
    pub original_start: DateTime<Utc>,
    pub original_end: DateTime<Utc>,
}

/// One concrete time interval instance of a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    series: SeriesId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    original_start: DateTime<Utc>,
    original_end: DateTime<Utc>,
    cancelled: bool,
    kind: OccurrenceKind,
}

impl Occurrence {
    /// Build the transient occurrence for one generated start instant. A
    /// missing `end` derives from the series duration. Pure function of the
    /// series snapshot and the instants; nothing is persisted.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidInterval`] unless the resulting end
    /// comes strictly after `start`.
    pub fn generate(
        series: &Series,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let end = end.unwrap_or(start + series.duration());
        if end <= start {
            return Err(EngineError::InvalidInterval { start, end });
        }
        Ok(Self {
            series: series.id(),
            start,
            end,
            original_start: start,
            original_end: end,
            cancelled: false,
            kind: OccurrenceKind::Instance,
        })
    }

    /// The canonical row standing for the whole series. Only the store
    /// creates these, through its group-source accessor.
    pub(crate) fn group_source(series: &Series) -> Self {
        Self {
            series: series.id(),
            start: series.start(),
            end: series.end(),
            original_start: series.start(),
            original_end: series.end(),
            cancelled: false,
            kind: OccurrenceKind::GroupSource,
        }
    }

    pub fn series(&self) -> SeriesId {
        self.series
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn original_start(&self) -> DateTime<Utc> {
        self.original_start
    }

    pub fn original_end(&self) -> DateTime<Utc> {
        self.original_end
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn kind(&self) -> OccurrenceKind {
        self.kind
    }

    /// The identity key used to match generated occurrences against
    /// persisted ones.
    pub fn key(&self) -> OccurrenceKey {
        OccurrenceKey {
            series: self.series,
            original_start: self.original_start,
            original_end: self.original_end,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True when the occurrence no longer occupies its original slot.
    pub fn moved(&self) -> bool {
        self.original_start != self.start || self.original_end != self.end
    }

    /// True when both occurrences occupy the same timeslot, whatever series
    /// they belong to.
    pub fn same_timeslot(&self, other: &Occurrence) -> bool {
        self.start == other.start && self.end == other.end
    }

    /// Move to a new slot. A missing `new_end` keeps the current duration.
    /// The original slot, and with it the identity key, is untouched.
    pub fn move_to(
        &mut self,
        new_start: DateTime<Utc>,
        new_end: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let new_end = new_end.unwrap_or(new_start + self.duration());
        if new_end <= new_start {
            return Err(EngineError::InvalidInterval {
                start: new_start,
                end: new_end,
            });
        }
        self.start = new_start;
        self.end = new_end;
        Ok(())
    }

    /// Shift both endpoints by `delta`.
    pub fn move_by(&mut self, delta: Duration) -> Result<()> {
        let (start, end) = (self.start + delta, self.end + delta);
        self.move_to(start, Some(end))
    }

    /// Mark the instance cancelled.
    ///
    /// # Errors
    /// Returns [`EngineError::CancelGroupSource`] for the group-source row:
    /// the canonical occurrence stands for the whole series and is not an
    /// instance that can be struck out.
    pub fn cancel(&mut self) -> Result<()> {
        self.ensure_instance()?;
        self.cancelled = true;
        Ok(())
    }

    /// Clear the cancelled flag. A no-op on instances that were never
    /// cancelled; rejected for the group-source row like [`cancel`].
    ///
    /// [`cancel`]: Occurrence::cancel
    pub fn uncancel(&mut self) -> Result<()> {
        self.ensure_instance()?;
        self.cancelled = false;
        Ok(())
    }

    fn ensure_instance(&self) -> Result<()> {
        match self.kind {
            OccurrenceKind::Instance => Ok(()),
            OccurrenceKind::GroupSource => Err(EngineError::CancelGroupSource(self.series)),
        }
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}
