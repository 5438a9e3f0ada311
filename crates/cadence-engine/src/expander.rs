//! Rule expansion: turns a series' recurrence definition into start instants.
//!
//! Two query shapes, matching how the streams consume them: a bounded window
//! scan that materializes at most one window's worth of instants, and a lazy
//! unbounded tail that pages through the backend so no caller ever holds the
//! whole (possibly infinite) sequence.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use rrule::RRuleSet;
use tracing::warn;

use crate::error::Result;
use crate::rule::to_backend_utc;
use crate::series::Series;

/// Cap on instants returned by a single bounded window scan. Hitting it
/// means the window was absurdly wide for the rule's cadence; the scan is
/// truncated and logged rather than unbounded.
const WINDOW_SCAN_LIMIT: u16 = u16::MAX;

/// Page size of the lazy tail. Each refill asks the backend for this many
/// instants past the cursor, keeping per-pull work bounded.
const TAIL_PAGE: u16 = 64;

/// Start-instant enumerator for one recurring series.
///
/// Instants are non-decreasing and begin at or after the series start. The
/// series' `end_recurring_period`, when set, bounds generation inclusively:
/// the sequence ends before the first instant strictly after it, as a normal
/// end-of-sequence, not an error.
pub struct RuleExpander {
    set: RRuleSet,
    horizon: Option<DateTime<Utc>>,
}

impl RuleExpander {
    /// `None` when the series has no rule: the series itself is then the
    /// only candidate, which the stream layer handles directly.
    pub fn new(series: &Series) -> Result<Option<Self>> {
        let Some(rule) = series.rule() else {
            return Ok(None);
        };
        let set = rule.to_rrule_set(series.start())?;
        Ok(Some(Self {
            set,
            horizon: series.end_recurring_period(),
        }))
    }

    /// Start instants in `[from, to]`, both ends inclusive, clipped to the
    /// recurrence horizon. Materializes only the window.
    pub fn starts_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Vec<DateTime<Utc>> {
        let to = match self.horizon {
            Some(horizon) if horizon < to => horizon,
            _ => to,
        };
        if to < from {
            return Vec::new();
        }
        let result = self
            .set
            .clone()
            .after(to_backend_utc(from))
            .before(to_backend_utc(to))
            .all(WINDOW_SCAN_LIMIT);
        if result.limited {
            warn!(
                returned = result.dates.len(),
                "window scan hit the instance cap; tail of the window dropped"
            );
        }
        result
            .dates
            .into_iter()
            .map(|dt| dt.with_timezone(&Utc))
            .filter(|dt| *dt >= from && *dt <= to)
            .collect()
    }

    /// Lazy tail of start instants strictly after `bound`, in order.
    pub fn starts_after(self, bound: DateTime<Utc>) -> StartInstants {
        StartInstants {
            set: self.set,
            horizon: self.horizon,
            lower: bound,
            page: VecDeque::new(),
            may_fetch: true,
            done: false,
        }
    }
}

/// Pull-based tail of start instants. Each `next` does bounded work: a pop
/// from the current page, or one backend fetch of [`TAIL_PAGE`] instants.
/// Exhaustion is a terminal state; the iterator is fused.
pub struct StartInstants {
    set: RRuleSet,
    horizon: Option<DateTime<Utc>>,
    /// Exclusive lower bound of the next emission; advances as instants are
    /// handed out, so a page fetch never re-scans emitted territory.
    lower: DateTime<Utc>,
    page: VecDeque<DateTime<Utc>>,
    may_fetch: bool,
    done: bool,
}

impl StartInstants {
    fn fetch_page(&mut self) {
        let result = self
            .set
            .clone()
            .after(to_backend_utc(self.lower))
            .all(TAIL_PAGE);
        // The backend's lower bound is inclusive; drop the cursor echo.
        let lower = self.lower;
        self.page.extend(
            result
                .dates
                .into_iter()
                .map(|dt| dt.with_timezone(&Utc))
                .filter(|dt| *dt > lower),
        );
        self.may_fetch = result.limited;
    }
}

impl Iterator for StartInstants {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<DateTime<Utc>> {
        while !self.done {
            if let Some(dt) = self.page.pop_front() {
                if self.horizon.map_or(false, |h| dt > h) {
                    self.done = true;
                    break;
                }
                self.lower = dt;
                return Some(dt);
            }
            if !self.may_fetch {
                self.done = true;
                break;
            }
            self.fetch_page();
            if self.page.is_empty() {
                self.done = true;
            }
        }
        None
    }
}
