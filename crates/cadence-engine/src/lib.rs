//! # cadence-engine
//!
//! Occurrence generation and exception reconciliation for recurring
//! calendar series.
//!
//! A [`Series`] describes an event: one concrete interval, optionally
//! repeated by a [`RecurrenceRule`]. The engine expands a series into its
//! concrete [`Occurrence`]s and reconciles them with persisted exceptions
//! (moved, cancelled, or re-slotted instances) so callers see one
//! consistent timeline, for a bounded window or as a lazy unbounded tail.
//! Many series merge into a single globally ordered stream.
//!
//! Everything is synchronous, single-owner, pull-based computation over
//! data fetched once at query construction; the persistence side lives
//! behind the [`store`] traits.
//!
//! ## Modules
//!
//! - [`series`] — event definitions and their duration contract
//! - [`rule`] — recurrence model, lowered to the `rrule` backend
//! - [`occurrence`] — concrete instances, identity keys, move/cancel ops
//! - [`overlay`] — persisted-exception index with consuming substitution
//! - [`expander`] — rule expansion: bounded window scan + lazy tail
//! - [`stream`] — per-series occurrence queries
//! - [`merge`] — k-way merge across series
//! - [`store`] — persistence collaborator traits + in-memory store
//! - [`time`] — naive/aware timestamp boundary policy
//! - [`error`] — error types

pub mod error;
pub mod expander;
pub mod merge;
pub mod occurrence;
pub mod overlay;
pub mod rule;
pub mod series;
pub mod store;
pub mod stream;
pub mod time;

pub use error::{EngineError, Result};
pub use expander::{RuleExpander, StartInstants};
pub use merge::{merged_occurrences_after, MergedOccurrences};
pub use occurrence::{Occurrence, OccurrenceKey, OccurrenceKind};
pub use overlay::ExceptionOverlay;
pub use rule::{Frequency, RecurrenceRule};
pub use series::{Series, SeriesId};
pub use store::{ExceptionSource, MemoryStore, OccurrenceSink, SeriesSource};
pub use stream::{occurrence_at, occurrences_after, occurrences_between, OccurrencesAfter};
pub use time::{NaiveMode, TimePolicy, Timestamp};
