//! Out-of-band channel for callback protocol violations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fanout_core::{Violation, ViolationConfig};
use tokio::sync::mpsc;
use tracing::warn;

/// Collects [`Violation`]s away from the normal result path.
///
/// Every report bumps a shared counter, is optionally logged at `warn`,
/// and is forwarded to a channel when one was attached. Reporting never
/// fails and never panics, so a misbehaving entry cannot disturb the
/// rest of its run.
#[derive(Debug, Clone)]
pub struct ViolationReporter {
    sink: Option<mpsc::UnboundedSender<Violation>>,
    count: Arc<AtomicUsize>,
    log: bool,
}

impl Default for ViolationReporter {
    fn default() -> Self {
        Self {
            sink: None,
            count: Arc::new(AtomicUsize::new(0)),
            log: true,
        }
    }
}

impl ViolationReporter {
    /// Reporter that only logs and counts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reporter that also forwards every violation to the returned receiver.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Violation>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let reporter = Self {
            sink: Some(tx),
            ..Self::default()
        };
        (reporter, rx)
    }

    /// Reporter configured from the `[violations]` config section.
    pub fn from_config(config: &ViolationConfig) -> Self {
        Self {
            log: config.log,
            ..Self::default()
        }
    }

    /// Record a violation.
    pub fn report(&self, violation: Violation) {
        self.count.fetch_add(1, Ordering::Relaxed);
        if self.log {
            warn!(site = %violation.site(), "callback protocol violation: {}", violation);
        }
        if let Some(sink) = &self.sink {
            // The receiver may be gone; the count above still records it.
            let _ = sink.send(violation);
        }
    }

    /// Number of violations reported through this reporter and its clones.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}
