//! Persistence collaborator interface and an in-memory reference store.
//!
//! The engine never talks to a database. Everything it needs from the
//! outside world arrives through these traits as one eager bulk fetch per
//! query; storage schema, transactions, and visibility of concurrent writes
//! are the collaborator's concern.

use std::collections::HashMap;

use crate::occurrence::{Occurrence, OccurrenceKind};
use crate::series::{Series, SeriesId};

/// Read side: persisted exception rows for a series or its recurrence group.
pub trait ExceptionSource {
    /// All persisted occurrence rows attached to `series`, or to any series
    /// grouped under it.
    fn fetch_exceptions(&self, series: SeriesId) -> Vec<Occurrence>;
}

/// Read side: series listing for multi-series merges.
pub trait SeriesSource {
    fn fetch_series(&self) -> Vec<Series>;
}

/// Write side, used by mutating flows (move, cancel, uncancel). A saved
/// occurrence becomes visible to every overlay built afterwards,
/// permanently shadowing the generated instance at its identity key.
pub trait OccurrenceSink {
    fn save_occurrence(&mut self, occ: Occurrence);
    fn save_series(&mut self, series: Series);
}

/// In-memory store backing the test suite and embedded callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    series: HashMap<SeriesId, Series>,
    occurrences: Vec<Occurrence>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the canonical group-source occurrence for `series`, creating
    /// and persisting it on first use. An explicit repository operation:
    /// building a series value never creates sibling rows as a side effect.
    pub fn get_or_create_group_source(&mut self, series: &Series) -> Occurrence {
        if let Some(existing) = self
            .occurrences
            .iter()
            .find(|occ| occ.kind() == OccurrenceKind::GroupSource && occ.series() == series.id())
        {
            return existing.clone();
        }
        let source = Occurrence::group_source(series);
        self.occurrences.push(source.clone());
        source
    }

    /// True when `owner` is `series` itself or a row grouped under it.
    fn in_group(&self, owner: SeriesId, series: SeriesId) -> bool {
        owner == series
            || self
                .series
                .get(&owner)
                .and_then(Series::group)
                .map_or(false, |group| group == series)
    }
}

impl ExceptionSource for MemoryStore {
    fn fetch_exceptions(&self, series: SeriesId) -> Vec<Occurrence> {
        self.occurrences
            .iter()
            .filter(|occ| self.in_group(occ.series(), series))
            .cloned()
            .collect()
    }
}

impl SeriesSource for MemoryStore {
    fn fetch_series(&self) -> Vec<Series> {
        let mut all: Vec<Series> = self.series.values().cloned().collect();
        all.sort_by_key(Series::id);
        all
    }
}

impl OccurrenceSink for MemoryStore {
    /// Upsert by identity key and kind: re-saving an edited occurrence
    /// replaces the previous row rather than duplicating it.
    fn save_occurrence(&mut self, occ: Occurrence) {
        let slot = self
            .occurrences
            .iter_mut()
            .find(|existing| existing.key() == occ.key() && existing.kind() == occ.kind());
        match slot {
            Some(existing) => *existing = occ,
            None => self.occurrences.push(occ),
        }
    }

    fn save_series(&mut self, series: Series) {
        self.series.insert(series.id(), series);
    }
}
