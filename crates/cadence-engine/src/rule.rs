//! Recurrence rule model and its bridge to the `rrule` enumeration backend.
//!
//! The engine keeps its own closed rule model rather than passing RFC 5545
//! strings around: a rule value is shared, read-only data owned by zero or
//! more series, and is lowered to an [`rrule::RRuleSet`] only at expansion
//! time, anchored at the owning series' start.

use chrono::{DateTime, Utc, Weekday};
use rrule::{NWeekday, RRule, RRuleSet};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Recurrence frequency. A closed set: sub-daily cadences are not part of
/// the calendar model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn backend(self) -> rrule::Frequency {
        match self {
            Frequency::Daily => rrule::Frequency::Daily,
            Frequency::Weekly => rrule::Frequency::Weekly,
            Frequency::Monthly => rrule::Frequency::Monthly,
            Frequency::Yearly => rrule::Frequency::Yearly,
        }
    }
}

/// Parameters for enumerating a series' start instants in non-decreasing
/// order, beginning at the series' own start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Gap between successive periods, in units of `frequency`. 1 = every.
    pub interval: u16,
    /// Cap on the number of enumerated instants.
    pub count: Option<u32>,
    /// Inclusive last instant the rule may enumerate.
    pub until: Option<DateTime<Utc>>,
    /// Weekday filter (RFC 5545 BYDAY).
    pub by_weekday: Vec<Weekday>,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            count: None,
            until: None,
            by_weekday: Vec::new(),
        }
    }

    pub fn every(mut self, interval: u16) -> Self {
        self.interval = interval;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.by_weekday = weekdays.into_iter().collect();
        self
    }

    /// Lower the rule into a backend rule set anchored at `dtstart`.
    ///
    /// # Errors
    /// Returns [`EngineError::InvalidRule`] when the backend rejects the
    /// parameter combination.
    pub(crate) fn to_rrule_set(&self, dtstart: DateTime<Utc>) -> Result<RRuleSet> {
        let anchor = to_backend_utc(dtstart);
        let mut rule = RRule::new(self.frequency.backend());
        if self.interval != 1 {
            rule = rule.interval(self.interval);
        }
        if let Some(count) = self.count {
            rule = rule.count(count);
        }
        if let Some(until) = self.until {
            rule = rule.until(to_backend_utc(until));
        }
        if !self.by_weekday.is_empty() {
            let by_weekday = self.by_weekday.iter().map(|wd| NWeekday::Every(*wd)).collect();
            rule = rule.by_weekday(by_weekday);
        }
        let validated = rule
            .validate(anchor)
            .map_err(|e| EngineError::InvalidRule(e.to_string()))?;
        Ok(RRuleSet::new(anchor).rrule(validated))
    }
}

/// Convert a canonical UTC instant into the backend's timezone-tagged form.
pub(crate) fn to_backend_utc(dt: DateTime<Utc>) -> DateTime<rrule::Tz> {
    dt.with_timezone(&rrule::Tz::Tz(chrono_tz::UTC))
}
