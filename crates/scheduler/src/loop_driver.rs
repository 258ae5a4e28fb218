//! Test-then-iterate repetition.
//!
//! A [`LoopDriver`] alternates between calling a synchronous test and an
//! asynchronous iterate step until the test turns false or a round fails.
//! It shares the completion handle and guard machinery with the iteration
//! scheduler but nothing else.

use std::marker::PhantomData;

use fanout_core::{Failure, Site};
use tokio::sync::oneshot;
use tracing::debug;

use crate::done::ElementDone;
use crate::guard::CompletionGuard;
use crate::spawned::Spawned;
use crate::violation::ViolationReporter;

/// Completion handle for one round of a loop. Its site is
/// [`Site::Round`] with the zero-based round number.
pub type LoopDone<A, E> = ElementDone<A, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Testing,
    Iterating,
    Done,
}

/// A while-style loop over an async iterate step.
///
/// `test` receives the results of the most recent round (`None` before the
/// first one). `iterate` receives a [`LoopDone`] and settles it once, now or
/// later. The loop resolves with the last round's results when the test
/// stops it, or with the first round's failure.
pub struct LoopDriver<A, E, T, I> {
    test: T,
    iterate: I,
    initial: LoopState,
    continue_when: bool,
    reporter: ViolationReporter,
    _marker: PhantomData<fn() -> (A, E)>,
}

impl<A, E, T, I> LoopDriver<A, E, T, I>
where
    A: Send + 'static,
    E: Send + 'static,
    T: FnMut(Option<&A>) -> bool,
    I: FnMut(LoopDone<A, E>),
{
    fn build(test: T, iterate: I, initial: LoopState, continue_when: bool) -> Self {
        Self {
            test,
            iterate,
            initial,
            continue_when,
            reporter: ViolationReporter::default(),
            _marker: PhantomData,
        }
    }

    /// Test first; iterate while the test holds.
    pub fn whilst(test: T, iterate: I) -> Self {
        Self::build(test, iterate, LoopState::Testing, true)
    }

    /// Iterate once, then keep iterating while the test holds.
    pub fn do_whilst(iterate: I, test: T) -> Self {
        Self::build(test, iterate, LoopState::Iterating, true)
    }

    /// Test first; iterate until the test holds.
    pub fn until(test: T, iterate: I) -> Self {
        Self::build(test, iterate, LoopState::Testing, false)
    }

    /// Iterate once, then keep iterating until the test holds.
    pub fn do_until(iterate: I, test: T) -> Self {
        Self::build(test, iterate, LoopState::Iterating, false)
    }

    pub fn report_to(mut self, reporter: ViolationReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Drive the loop to completion.
    ///
    /// Like [`Iteration::run`](crate::Iteration::run), this yields to the
    /// runtime once before it can resolve.
    pub async fn run(self) -> Result<Option<A>, Failure<E>> {
        let LoopDriver {
            mut test,
            mut iterate,
            initial,
            continue_when,
            reporter,
            ..
        } = self;
        let mut state = initial;
        let mut last: Option<A> = None;
        let mut round = 0usize;

        tokio::task::yield_now().await;

        loop {
            match state {
                LoopState::Testing => {
                    state = if test(last.as_ref()) == continue_when {
                        LoopState::Iterating
                    } else {
                        LoopState::Done
                    };
                }
                LoopState::Iterating => {
                    let (tx, rx) = oneshot::channel();
                    let done = LoopDone::arm(Site::Round(round), reporter.clone(), move |outcome| {
                        let _ = tx.send(outcome);
                    });
                    iterate(done);

                    match rx.await {
                        Ok(Some(Ok(results))) => {
                            last = Some(results);
                            round += 1;
                            state = LoopState::Testing;
                        }
                        Ok(Some(Err(error))) => {
                            debug!(round, "loop round failed");
                            return Err(Failure::Failed(error));
                        }
                        Ok(None) | Err(_) => {
                            debug!(round, "loop round abandoned");
                            return Err(Failure::Abandoned);
                        }
                    }
                }
                LoopState::Done => {
                    debug!(rounds = round, "loop finished");
                    return Ok(last);
                }
            }
        }
    }

    /// Run on a new tokio task and hand the result to `on_done`, exactly once.
    ///
    /// The loop starts only once the returned [`Spawned`] is dropped,
    /// released or awaited.
    pub fn spawn<F>(self, on_done: F) -> Spawned
    where
        T: Send + 'static,
        I: Send + 'static,
        F: FnOnce(Result<Option<A>, Failure<E>>) + Send + 'static,
    {
        let completion = CompletionGuard::arm(Site::Completion, self.reporter.clone(), on_done);
        Spawned::start(async move {
            let outcome = self.run().await;
            completion.fire(outcome);
        })
    }
}
