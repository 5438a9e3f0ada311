//! K-way merge of many series' occurrence tails into one ordered stream.
//!
//! A priority queue holds one `(next occurrence, stream)` pair per live
//! stream. Each pull pops the minimum, refills the queue from that stream
//! (or lets the stream drop out when exhausted), and resolves the popped
//! occurrence through a single overlay shared across all participating
//! series before yielding it.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::error::Result;
use crate::occurrence::Occurrence;
use crate::overlay::ExceptionOverlay;
use crate::series::Series;
use crate::store::ExceptionSource;
use crate::stream::CandidateTail;
use crate::time::{TimePolicy, Timestamp};

/// Queue entry. Ordered by occurrence start with FIFO insertion order for
/// equal starts, so ties stay deterministic within a run.
struct HeapEntry {
    occ: Occurrence,
    stream: usize,
    seq: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.occ.start() == other.occ.start() && self.seq == other.seq
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops its maximum; flip both keys for min-by-(start, seq).
        other
            .occ
            .start()
            .cmp(&self.occ.start())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Globally ordered lazy stream over many series.
///
/// Single-owner: the queue and overlay live for one merge and are never
/// shared. The stream is infinite while any participating rule is unbounded;
/// it ends once every per-series tail is exhausted.
pub struct MergedOccurrences {
    streams: Vec<CandidateTail>,
    heap: BinaryHeap<HeapEntry>,
    overlay: ExceptionOverlay,
    seq: u64,
}

/// Merge the occurrence tails of `series` into one stream of occurrences
/// ending after `after`, ordered by start.
///
/// Derived exception rows ride along with their group source; treating them
/// as independent series would double-count, so only group-source series
/// participate. Exceptions of every participant feed one shared overlay,
/// consulted as raw candidates are popped.
pub fn merged_occurrences_after<S: ExceptionSource>(
    store: &S,
    series: &[Series],
    after: Timestamp,
    policy: &TimePolicy,
) -> Result<MergedOccurrences> {
    let after = policy.resolve(after)?;
    let roots: Vec<&Series> = series.iter().filter(|s| s.is_group_source()).collect();

    let mut exceptions = Vec::new();
    for root in &roots {
        exceptions.extend(store.fetch_exceptions(root.id()));
    }
    let overlay = ExceptionOverlay::new(exceptions);

    let mut merged = MergedOccurrences {
        streams: Vec::with_capacity(roots.len()),
        heap: BinaryHeap::with_capacity(roots.len()),
        overlay,
        seq: 0,
    };
    for root in roots {
        let mut tail = CandidateTail::new(root, after)?;
        if let Some(first) = tail.next() {
            let seq = merged.next_seq();
            merged.heap.push(HeapEntry {
                occ: first,
                stream: merged.streams.len(),
                seq,
            });
        }
        merged.streams.push(tail);
    }
    debug!(streams = merged.streams.len(), "merged stream ready");
    Ok(merged)
}

impl MergedOccurrences {
    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }
}

impl Iterator for MergedOccurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        let entry = self.heap.pop()?;
        if let Some(refill) = self.streams[entry.stream].next() {
            let seq = self.next_seq();
            self.heap.push(HeapEntry {
                occ: refill,
                stream: entry.stream,
                seq,
            });
        }
        Some(self.overlay.resolve(entry.occ))
    }
}
