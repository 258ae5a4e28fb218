use std::collections::VecDeque;

use fanout_core::{Entries, Entry};

/// Per-run bookkeeping: the entries not yet started and the in-flight window.
///
/// Entries leave the worklist strictly in visitation order. Nothing leaves
/// it once the run has stopped asking, so an aborted run never starts
/// another entry.
pub(super) struct Pending<V> {
    queue: VecDeque<(usize, Entry<V>)>,
    window: usize,
    in_flight: usize,
    settled: usize,
    total: usize,
}

impl<V> Pending<V> {
    pub(super) fn new(entries: Entries<V>, window: usize) -> Self {
        let total = entries.len();
        Self {
            queue: entries.into_iter().enumerate().collect(),
            window,
            in_flight: 0,
            settled: 0,
            total,
        }
    }

    /// Take the next entry if the window has room for it.
    pub(super) fn admit(&mut self) -> Option<(usize, Entry<V>)> {
        if self.in_flight >= self.window {
            return None;
        }
        let next = self.queue.pop_front()?;
        self.in_flight += 1;
        Some(next)
    }

    /// Record that one in-flight entry settled successfully.
    pub(super) fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.settled += 1;
    }

    pub(super) fn is_complete(&self) -> bool {
        self.settled == self.total
    }

    pub(super) fn settled(&self) -> usize {
        self.settled
    }

    pub(super) fn not_started(&self) -> usize {
        self.queue.len()
    }
}
