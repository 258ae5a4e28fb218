use std::sync::{Arc, RwLock};
use std::time::Instant;

use fanout_core::{Failure, IterError, Key, Site};
use tokio::sync::mpsc;
use tracing::debug;

use crate::done::{ElementDone, Outcome};
use crate::guard::CompletionGuard;
use crate::iteration::metrics::RunMetrics;
use crate::iteration::operation::Operation;
use crate::spawned::Spawned;
use crate::violation::ViolationReporter;

use super::scheduling::Pending;
use super::Iteration;

/// One settled entry, sent from its completion handle to the run loop.
struct Settlement<R, E> {
    index: usize,
    outcome: Outcome<R, E>,
}

impl<V: Send + 'static> Iteration<V> {
    /// Visit every entry under the configured policy.
    ///
    /// `operation` is called once per started entry. Each successful result
    /// is merged with `assemble(container, position, key, result)`. The
    /// first failing entry resolves the run with [`IterError`], whose
    /// `partial` holds what was merged before the failure; entries not yet
    /// started are never started, and results still in flight are dropped.
    ///
    /// The returned future yields to the runtime once before it can
    /// resolve, so even a run whose operations all complete synchronously
    /// finishes on a later turn than the one that started it.
    pub async fn run<O, R, E, C, A>(
        self,
        operation: O,
        mut container: C,
        mut assemble: A,
    ) -> Result<C, IterError<C, E>>
    where
        O: Operation<V, R, E>,
        R: Send + 'static,
        E: Send + 'static,
        A: FnMut(&mut C, usize, &Key, R),
    {
        let Iteration {
            entries,
            policy,
            reporter,
            metrics,
        } = self;
        let started_at = Instant::now();
        let total = entries.len();
        let window = policy.window(total);

        if let Ok(mut m) = metrics.write() {
            m.record_begin(total, policy);
        }
        debug!(total, policy = %policy, shape = ?entries.shape(), "iteration starting");

        tokio::task::yield_now().await;

        if window == 0 {
            debug!(total, policy = %policy, "iteration has nothing to visit");
            if let Ok(mut m) = metrics.write() {
                m.record_end(false, started_at.elapsed());
            }
            return Ok(container);
        }

        let keys = entries.keys();
        let mut pending = Pending::new(entries, window);
        let (tx, mut rx) = mpsc::unbounded_channel::<Settlement<R, E>>();

        admit(&operation, &mut pending, &tx, &reporter, &metrics);

        // `tx` lives until this function returns, so `recv` only yields
        // `None` after the loop has already broken out.
        while let Some(Settlement { index, outcome }) = rx.recv().await {
            let failure = match outcome {
                Some(Ok(result)) => {
                    assemble(&mut container, index, &keys[index], result);
                    pending.settle();
                    if let Ok(mut m) = metrics.write() {
                        m.record_settle(true);
                    }
                    if pending.is_complete() {
                        break;
                    }
                    admit(&operation, &mut pending, &tx, &reporter, &metrics);
                    continue;
                }
                Some(Err(error)) => Failure::Failed(error),
                None => Failure::Abandoned,
            };

            let key = keys[index].clone();
            debug!(
                key = %key,
                settled = pending.settled(),
                not_started = pending.not_started(),
                abandoned = failure.is_abandoned(),
                "iteration aborted"
            );
            if let Ok(mut m) = metrics.write() {
                m.record_settle(false);
                m.record_end(true, started_at.elapsed());
            }
            return Err(IterError {
                key,
                failure,
                partial: container,
            });
        }

        debug!(total, elapsed = ?started_at.elapsed(), "iteration finished");
        if let Ok(mut m) = metrics.write() {
            m.record_end(false, started_at.elapsed());
        }
        Ok(container)
    }

    /// Run on a new tokio task and hand the result to `on_done`.
    ///
    /// `on_done` is guarded and called exactly once. The task does not
    /// start until the returned [`Spawned`] is dropped, released or awaited,
    /// so `on_done` cannot fire before the caller has let go of it.
    pub fn spawn<O, R, E, C, A, F>(
        self,
        operation: O,
        container: C,
        assemble: A,
        on_done: F,
    ) -> Spawned
    where
        O: Operation<V, R, E> + 'static,
        R: Send + 'static,
        E: Send + 'static,
        C: Send + 'static,
        A: FnMut(&mut C, usize, &Key, R) + Send + 'static,
        F: FnOnce(Result<C, IterError<C, E>>) + Send + 'static,
    {
        let completion = CompletionGuard::arm(Site::Completion, self.reporter.clone(), on_done);
        Spawned::start(async move {
            let outcome = self.run(operation, container, assemble).await;
            completion.fire(outcome);
        })
    }
}

/// Start entries until the window is full or the worklist is empty.
fn admit<V, R, E, O>(
    operation: &O,
    pending: &mut Pending<V>,
    tx: &mpsc::UnboundedSender<Settlement<R, E>>,
    reporter: &ViolationReporter,
    metrics: &Arc<RwLock<RunMetrics>>,
) where
    O: Operation<V, R, E>,
    R: Send + 'static,
    E: Send + 'static,
{
    while let Some((index, entry)) = pending.admit() {
        let (key, value) = entry.into_parts();
        let tx = tx.clone();
        let done = ElementDone::arm(
            Site::Element(key.clone()),
            reporter.clone(),
            move |outcome| {
                // A resolved run has dropped its receiver; late results are discarded.
                let _ = tx.send(Settlement { index, outcome });
            },
        );
        if let Ok(mut m) = metrics.write() {
            m.record_start();
        }
        operation.call(value, key, done);
    }
}
