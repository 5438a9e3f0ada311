//! Series: a single or recurring event definition.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};
use crate::rule::RecurrenceRule;

/// Opaque series identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SeriesId(Uuid);

impl SeriesId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SeriesId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An event definition: one concrete interval plus an optional recurrence.
///
/// The duration contract is immutable: every occurrence generated from the
/// series spans exactly `end - start`, unless an individual instance is
/// later moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    id: SeriesId,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    rule: Option<RecurrenceRule>,
    /// Inclusive generation bound: occurrences must start at or before it.
    end_recurring_period: Option<DateTime<Utc>>,
    /// Set on derived exception rows; `None` marks a group-source series.
    group: Option<SeriesId>,
}

impl Series {
    /// A non-recurring series occupying a single interval.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidInterval`] unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end <= start {
            return Err(EngineError::InvalidInterval { start, end });
        }
        Ok(Self {
            id: SeriesId::new(),
            start,
            end,
            rule: None,
            end_recurring_period: None,
            group: None,
        })
    }

    /// A recurring series. The first interval doubles as the duration
    /// template for every generated occurrence.
    pub fn recurring(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        rule: RecurrenceRule,
        end_recurring_period: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let mut series = Self::new(start, end)?;
        series.rule = Some(rule);
        series.end_recurring_period = end_recurring_period;
        Ok(series)
    }

    /// Mark this series as a derived exception row of `source`'s group.
    pub fn with_group(mut self, source: SeriesId) -> Self {
        self.group = Some(source);
        self
    }

    pub fn id(&self) -> SeriesId {
        self.id
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn rule(&self) -> Option<&RecurrenceRule> {
        self.rule.as_ref()
    }

    pub fn end_recurring_period(&self) -> Option<DateTime<Utc>> {
        self.end_recurring_period
    }

    pub fn group(&self) -> Option<SeriesId> {
        self.group
    }

    /// True for canonical series rows; false for derived exception rows that
    /// ride along with a group source.
    pub fn is_group_source(&self) -> bool {
        self.group.is_none()
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn seconds(&self) -> i64 {
        self.duration().num_seconds()
    }

    pub fn minutes(&self) -> f64 {
        self.seconds() as f64 / 60.0
    }

    pub fn hours(&self) -> f64 {
        self.seconds() as f64 / 3600.0
    }
}

impl fmt::Display for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} - {}", self.id, self.start, self.end)
    }
}
