//! Per-series occurrence streams.
//!
//! Two operation modes over the same machinery:
//!
//! - [`occurrences_between`] — bounded window: generate candidates for the
//!   window, substitute persisted overrides, then append moved-in extras.
//! - [`occurrences_after`] — unbounded tail: a lazy ordered sequence that
//!   interleaves rule-generated candidates with exceptions that were moved
//!   from at-or-before the cursor to at-or-after it.
//!
//! Both build their exception overlay from one bulk fetch at construction
//! time; iteration afterwards is pure in-memory computation. A consumer
//! cancels by simply not pulling further.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::Result;
use crate::expander::{RuleExpander, StartInstants};
use crate::occurrence::{Occurrence, OccurrenceKind};
use crate::overlay::ExceptionOverlay;
use crate::series::Series;
use crate::store::ExceptionSource;
use crate::time::{TimePolicy, Timestamp};

/// Occurrences of `series` intersecting `[window_start, window_end)`.
///
/// Generated candidates whose persisted override moved out of the window are
/// dropped; persisted occurrences moved *into* the window from elsewhere are
/// appended after the generated ones. Results follow generation order with
/// appended extras last; callers needing strict order sort by start.
///
/// Cancelled overrides are returned as-is (flag set) so callers can render
/// them; moved-in extras are only returned while not cancelled.
pub fn occurrences_between<S: ExceptionSource>(
    store: &S,
    series: &Series,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Occurrence>> {
    let mut overlay = ExceptionOverlay::new(store.fetch_exceptions(series.id()));
    let candidates = generate_window(series, window_start, window_end)?;
    let mut result = Vec::with_capacity(candidates.len());
    for occ in candidates {
        if overlay.has(&occ) {
            let persisted = overlay.resolve(occ);
            // The override may have been moved out of the window entirely.
            if persisted.start() < window_end && persisted.end() >= window_start {
                result.push(persisted);
            }
        } else {
            result.push(occ);
        }
    }
    result.extend(overlay.remaining_in_window(window_start, window_end));
    Ok(result)
}

/// Rule expansion + factory only, no reconciliation. The rule is queried
/// over `[window_start - duration, window_end]` so occurrences straddling
/// the window's left edge are caught.
fn generate_window(
    series: &Series,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<Vec<Occurrence>> {
    let Some(expander) = RuleExpander::new(series)? else {
        if series.start() < window_end && series.end() > window_start {
            return Ok(vec![Occurrence::generate(
                series,
                series.start(),
                Some(series.end()),
            )?]);
        }
        return Ok(Vec::new());
    };
    expander
        .starts_between(window_start - series.duration(), window_end)
        .into_iter()
        .map(|start| Occurrence::generate(series, start, None))
        .collect()
}

/// Lazy ordered tail of a single series' occurrences ending after `after`.
///
/// Infinite unless the series' rule or recurrence horizon bounds it. The
/// sequence is restartable only by calling this again: internal cursors are
/// not shareable across restarts.
///
/// # Errors
/// Fails on a naive `after` under the strict timezone policy, or when the
/// rule is rejected by the enumeration backend.
pub fn occurrences_after<S: ExceptionSource>(
    store: &S,
    series: &Series,
    after: Timestamp,
    policy: &TimePolicy,
) -> Result<OccurrencesAfter> {
    let after = policy.resolve(after)?;
    let persisted = store.fetch_exceptions(series.id());
    // Exceptions whose original slot sits at or before the cursor but whose
    // current start was moved to at or after it: the generator either never
    // reaches their original slot again or would place them wrongly, so they
    // are queued up front and drained in current-start order.
    let mut tricky: Vec<Occurrence> = persisted
        .iter()
        .filter(|occ| {
            occ.kind() == OccurrenceKind::Instance
                && occ.original_start() <= after
                && occ.start() >= after
        })
        .cloned()
        .collect();
    tricky.sort_by_key(|occ| (occ.start(), occ.end()));
    let overlay = ExceptionOverlay::new(persisted);
    let generator = CandidateTail::new(series, after)?;
    debug!(
        series = %series.id(),
        tricky = tricky.len(),
        overlay = overlay.len(),
        "series tail stream ready"
    );
    Ok(OccurrencesAfter {
        generator,
        overlay,
        tricky: tricky.into(),
        pending: None,
        done: false,
    })
}

/// First occurrence of the series ending after `at`.
///
/// With `exact`, the result is kept only when its start equals `at` to the
/// instant; otherwise the miss is an empty result, not an error. A naive
/// `at` follows the timezone policy: coerced under the compatibility mode,
/// rejected with a type-mismatch error otherwise.
pub fn occurrence_at<S: ExceptionSource>(
    store: &S,
    series: &Series,
    at: Timestamp,
    exact: bool,
    policy: &TimePolicy,
) -> Result<Option<Occurrence>> {
    let mut tail = occurrences_after(store, series, at, policy)?;
    let Some(first) = tail.next() else {
        return Ok(None);
    };
    if !exact {
        return Ok(Some(first));
    }
    let at = policy.resolve(at)?;
    Ok((first.start() == at).then_some(first))
}

/// Raw generated candidates for one series, ending after a cursor: rule
/// expansion plus the occurrence factory, with no exception reconciliation.
/// The multi-series merge consumes these directly and reconciles at the top.
pub(crate) enum CandidateTail {
    /// Rule-less series: at most the series' own interval.
    Single(Option<Occurrence>),
    Recurring {
        series: Series,
        starts: StartInstants,
    },
}

impl CandidateTail {
    pub(crate) fn new(series: &Series, after: DateTime<Utc>) -> Result<Self> {
        match RuleExpander::new(series)? {
            None => {
                let single = if series.end() > after {
                    Some(Occurrence::generate(
                        series,
                        series.start(),
                        Some(series.end()),
                    )?)
                } else {
                    None
                };
                Ok(CandidateTail::Single(single))
            }
            // A candidate ends after the cursor iff it starts strictly
            // after `after - duration`.
            Some(expander) => Ok(CandidateTail::Recurring {
                starts: expander.starts_after(after - series.duration()),
                series: series.clone(),
            }),
        }
    }
}

impl Iterator for CandidateTail {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        match self {
            CandidateTail::Single(slot) => slot.take(),
            CandidateTail::Recurring { series, starts } => {
                let start = starts.next()?;
                // Series duration is positive, so the interval is valid.
                Occurrence::generate(series, start, None).ok()
            }
        }
    }
}

/// Lazy tail of one series' occurrences with exception reconciliation.
///
/// Each pull performs bounded work: one generator step, one overlay lookup,
/// and possibly a pop from the moved-in exception queue. The iterator is
/// fused; exhaustion is its normal terminal state.
pub struct OccurrencesAfter {
    generator: CandidateTail,
    overlay: ExceptionOverlay,
    tricky: VecDeque<Occurrence>,
    /// Candidate pulled from the generator while a moved-in exception cut in
    /// line; emitted on a later pull.
    pending: Option<Occurrence>,
    done: bool,
}

impl Iterator for OccurrencesAfter {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        if self.done {
            return None;
        }
        match self.pending.take().or_else(|| self.generator.next()) {
            None => {
                if let Some(tricky) = self.tricky.pop_front() {
                    return Some(tricky);
                }
                self.done = true;
                None
            }
            Some(candidate) => {
                if self
                    .tricky
                    .front()
                    .map_or(false, |t| candidate.start() > t.start())
                {
                    self.pending = Some(candidate);
                    return self.tricky.pop_front();
                }
                Some(self.overlay.resolve(candidate))
            }
        }
    }
}
