//! Exception overlay: persisted occurrences indexed by identity key.
//!
//! Built once per query from one bulk fetch of persisted rows. During
//! generation, each generated occurrence is resolved against the overlay;
//! a matching entry is *consumed* as it substitutes, so a single persisted
//! row can never shadow two generated slots. Whatever is left after a full
//! pass are occurrences moved so far out of their original slot that the
//! rule engine would not re-generate them there; bounded window queries
//! surface those separately.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::occurrence::{Occurrence, OccurrenceKey, OccurrenceKind};
use crate::series::SeriesId;
use crate::time::{TimePolicy, Timestamp};

#[derive(Debug, Clone, Default)]
pub struct ExceptionOverlay {
    entries: HashMap<OccurrenceKey, Occurrence>,
}

impl ExceptionOverlay {
    /// Index persisted rows by identity key. Group-source rows stand for the
    /// series itself, not an edited instance, and are skipped.
    pub fn new<I>(persisted: I) -> Self
    where
        I: IntoIterator<Item = Occurrence>,
    {
        let entries: HashMap<OccurrenceKey, Occurrence> = persisted
            .into_iter()
            .filter(|occ| occ.kind() == OccurrenceKind::Instance)
            .map(|occ| (occ.key(), occ))
            .collect();
        debug!(entries = entries.len(), "exception overlay built");
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when a persisted entry shadows this generated occurrence.
    pub fn has(&self, occ: &Occurrence) -> bool {
        self.entries.contains_key(&occ.key())
    }

    /// Identity probe with a caller-supplied, possibly naive, original slot.
    ///
    /// A naive slot under the strict policy cannot be compared with the
    /// stored aware keys: against an empty overlay that is a plain miss,
    /// against persisted data it is an error rather than a silent mask.
    pub fn has_at(
        &self,
        policy: &TimePolicy,
        series: SeriesId,
        original_start: Timestamp,
        original_end: Timestamp,
    ) -> Result<bool> {
        let resolved = policy
            .resolve(original_start)
            .and_then(|start| policy.resolve(original_end).map(|end| (start, end)));
        match resolved {
            Ok((original_start, original_end)) => Ok(self.entries.contains_key(&OccurrenceKey {
                series,
                original_start,
                original_end,
            })),
            Err(EngineError::TimezoneMismatch) if self.entries.is_empty() => Ok(false),
            Err(EngineError::TimezoneMismatch) => Err(EngineError::AmbiguousLookup {
                entries: self.entries.len(),
            }),
            Err(other) => Err(other),
        }
    }

    /// Consume and return the override for `occ`, or hand `occ` back
    /// unchanged. At most one generated occurrence is ever substituted by a
    /// given persisted entry.
    pub fn resolve(&mut self, occ: Occurrence) -> Occurrence {
        self.entries.remove(&occ.key()).unwrap_or(occ)
    }

    /// Never-consumed entries whose *current* interval intersects
    /// `[window_start, window_end)` and which are not cancelled. These are
    /// occurrences moved into the window from slots the rule does not
    /// generate there. Sorted by current slot so results are reproducible
    /// across runs.
    pub fn remaining_in_window(
        &self,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Vec<Occurrence> {
        let mut extra: Vec<Occurrence> = self
            .entries
            .values()
            .filter(|occ| {
                !occ.cancelled() && occ.start() < window_end && occ.end() >= window_start
            })
            .cloned()
            .collect();
        extra.sort_by_key(|occ| (occ.start(), occ.end()));
        extra
    }
}
