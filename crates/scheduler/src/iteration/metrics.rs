use std::time::Duration;

use fanout_core::Policy;

/// Counters for a single iteration run, shared through
/// [`Iteration::metrics_handle`](super::Iteration::metrics_handle).
#[derive(Debug, Clone, Default)]
pub struct RunMetrics {
    /// Policy the run was started with.
    pub policy: Policy,
    /// Number of entries in the visitation order.
    pub total: usize,
    /// Entries whose operation has been called.
    pub started: usize,
    /// Entries whose successful result was merged.
    pub finished: usize,
    /// Entries started but not yet settled.
    pub in_flight: usize,
    /// Highest `in_flight` value seen during the run.
    pub max_in_flight: usize,
    /// The run resolved with an error.
    pub aborted: bool,
    /// Wall time from start to resolution, once resolved.
    pub elapsed: Option<Duration>,
}

impl RunMetrics {
    pub fn record_begin(&mut self, total: usize, policy: Policy) {
        *self = Self {
            policy,
            total,
            ..Self::default()
        };
    }

    pub fn record_start(&mut self) {
        self.started += 1;
        self.in_flight += 1;
        self.max_in_flight = self.max_in_flight.max(self.in_flight);
    }

    pub fn record_settle(&mut self, success: bool) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if success {
            self.finished += 1;
        }
    }

    pub fn record_end(&mut self, aborted: bool, elapsed: Duration) {
        self.aborted = aborted;
        self.elapsed = Some(elapsed);
    }

    /// Whether the run has resolved, successfully or not.
    pub fn is_resolved(&self) -> bool {
        self.elapsed.is_some()
    }
}
