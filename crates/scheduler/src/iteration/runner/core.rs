use std::sync::{Arc, RwLock};

use fanout_core::{Collection, Entries, FanoutConfig, FanoutError, Policy, Shape};
use tracing::debug;

use crate::iteration::metrics::RunMetrics;
use crate::violation::ViolationReporter;

/// One run of the iteration scheduler over a fixed visitation order.
///
/// Built from a [`Collection`] (or already-normalized [`Entries`]), then
/// configured with a [`Policy`] and a [`ViolationReporter`] before being
/// consumed by [`run`](Iteration::run) or [`spawn`](Iteration::spawn).
pub struct Iteration<V> {
    pub(super) entries: Entries<V>,
    pub(super) policy: Policy,
    pub(super) reporter: ViolationReporter,
    pub(super) metrics: Arc<RwLock<RunMetrics>>,
}

impl<V> Iteration<V> {
    /// Create a run over already-normalized entries.
    pub fn new(entries: Entries<V>) -> Self {
        Self {
            entries,
            policy: Policy::default(),
            reporter: ViolationReporter::default(),
            metrics: Arc::new(RwLock::new(RunMetrics::default())),
        }
    }

    /// Normalize `collection` and create a run over it.
    pub fn over(collection: impl Into<Collection<V>>) -> Self {
        Self::new(collection.into().normalize())
    }

    /// Create a run whose policy and reporter come from `config`.
    pub fn from_config(
        collection: impl Into<Collection<V>>,
        config: &FanoutConfig,
    ) -> Result<Self, FanoutError> {
        let policy = config.policy()?;
        debug!("Iteration configured from config: policy={}", policy);
        Ok(Self::over(collection)
            .policy(policy)
            .report_to(ViolationReporter::from_config(&config.violations)))
    }

    /// Set the concurrency policy (default: unbounded).
    pub fn policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Send protocol violations to `reporter` instead of a log-only default.
    pub fn report_to(mut self, reporter: ViolationReporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn shape(&self) -> Shape {
        self.entries.shape()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The visitation order this run will use.
    pub fn entries(&self) -> &Entries<V> {
        &self.entries
    }

    pub fn reporter(&self) -> &ViolationReporter {
        &self.reporter
    }

    /// Get an Arc to the run metrics (readable while the run is in flight).
    pub fn metrics_handle(&self) -> Arc<RwLock<RunMetrics>> {
        Arc::clone(&self.metrics)
    }
}
