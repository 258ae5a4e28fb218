//! Completion handles handed to caller-supplied work.

use std::fmt;
use std::sync::Arc;

use fanout_core::{Key, Site, Violation};

use crate::guard::CompletionGuard;
use crate::violation::ViolationReporter;

/// What a completion handle delivers: a result, or `None` when every clone
/// of the handle was dropped without being called.
pub type Outcome<R, E> = Option<Result<R, E>>;

/// The completion signal for one entry of a run or one round of a loop.
///
/// Call [`ok`](ElementDone::ok), [`err`](ElementDone::err) or
/// [`complete`](ElementDone::complete) exactly once. The handle is `Clone`
/// so it can be moved into whatever task finishes the work; only the first
/// call across all clones counts. Later calls are reported as
/// [`Violation::AlreadyCalled`]. Dropping every clone without calling it is
/// reported as [`Violation::Dropped`] and settles the entry as abandoned.
pub struct ElementDone<R, E> {
    inner: Arc<DoneInner<R, E>>,
}

struct DoneInner<R, E> {
    guard: CompletionGuard<Outcome<R, E>>,
}

impl<R, E> Drop for DoneInner<R, E> {
    fn drop(&mut self) {
        if !self.guard.is_fired() {
            self.guard
                .reporter()
                .report(Violation::Dropped(self.guard.site().clone()));
            self.guard.fire(None);
        }
    }
}

impl<R, E> Clone for ElementDone<R, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, E> fmt::Debug for ElementDone<R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDone")
            .field("site", self.inner.guard.site())
            .field("done", &self.is_done())
            .finish()
    }
}

impl<R, E> ElementDone<R, E> {
    /// Arm a handle whose first outcome is passed to `on_settle`.
    pub fn arm<F>(site: Site, reporter: ViolationReporter, on_settle: F) -> Self
    where
        F: FnOnce(Outcome<R, E>) + Send + 'static,
    {
        Self {
            inner: Arc::new(DoneInner {
                guard: CompletionGuard::arm(site, reporter, on_settle),
            }),
        }
    }

    /// Settle with a result. Returns `false` if the handle was already used.
    pub fn complete(&self, result: Result<R, E>) -> bool {
        self.inner.guard.fire(Some(result))
    }

    pub fn ok(&self, value: R) -> bool {
        self.complete(Ok(value))
    }

    pub fn err(&self, error: E) -> bool {
        self.complete(Err(error))
    }

    pub fn is_done(&self) -> bool {
        self.inner.guard.is_fired()
    }

    pub fn site(&self) -> &Site {
        self.inner.guard.site()
    }

    /// Key of the entry this handle belongs to, if it is an entry handle.
    pub fn key(&self) -> Option<&Key> {
        match self.site() {
            Site::Element(key) => Some(key),
            _ => None,
        }
    }

    /// A handle for a different success type that converts with `f` and
    /// settles this one.
    ///
    /// The derived handle has its own guard: calling it twice, or dropping
    /// it unused, is reported against the same site.
    pub fn map<S, F>(self, f: F) -> ElementDone<S, E>
    where
        F: FnOnce(S) -> R + Send + 'static,
        R: 'static,
        E: 'static,
    {
        let site = self.site().clone();
        let reporter = self.inner.guard.reporter().clone();
        ElementDone::arm(site, reporter, move |outcome: Outcome<S, E>| {
            self.inner.guard.fire(outcome.map(|result| result.map(f)));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Seen = Arc<Mutex<Vec<Outcome<u32, String>>>>;

    fn recording(reporter: ViolationReporter) -> (ElementDone<u32, String>, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let done = ElementDone::arm(Site::Element(Key::Index(0)), reporter, move |outcome| {
            sink.lock().unwrap().push(outcome);
        });
        (done, seen)
    }

    #[test]
    fn first_call_wins() {
        let (reporter, mut rx) = ViolationReporter::channel();
        let (done, seen) = recording(reporter.clone());

        assert!(done.ok(1));
        assert!(!done.err("late".into()));
        assert!(!done.clone().ok(2));

        assert_eq!(*seen.lock().unwrap(), vec![Some(Ok(1))]);
        assert_eq!(reporter.count(), 2);
        assert_eq!(
            rx.try_recv().unwrap(),
            Violation::AlreadyCalled(Site::Element(Key::Index(0)))
        );
    }

    #[test]
    fn dropping_unused_handle_settles_as_abandoned() {
        let (reporter, mut rx) = ViolationReporter::channel();
        let (done, seen) = recording(reporter.clone());
        let clone = done.clone();

        drop(done);
        assert!(seen.lock().unwrap().is_empty(), "a live clone keeps the handle open");
        drop(clone);

        assert_eq!(*seen.lock().unwrap(), vec![None]);
        assert_eq!(
            rx.try_recv().unwrap(),
            Violation::Dropped(Site::Element(Key::Index(0)))
        );
    }

    #[test]
    fn dropping_after_completion_is_silent() {
        let reporter = ViolationReporter::new();
        let (done, seen) = recording(reporter.clone());
        done.ok(4);
        drop(done);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(reporter.count(), 0);
    }

    #[test]
    fn map_converts_and_settles_parent() {
        let reporter = ViolationReporter::new();
        let (done, seen) = recording(reporter.clone());
        let mapped: ElementDone<&'static str, String> = done.map(|s: &str| s.len() as u32);

        assert_eq!(mapped.key(), Some(&Key::Index(0)));
        assert!(mapped.ok("four"));
        assert!(!mapped.ok("again"));

        assert_eq!(*seen.lock().unwrap(), vec![Some(Ok(4))]);
        assert_eq!(reporter.count(), 1);
    }

    #[test]
    fn dropped_mapped_handle_abandons_parent_once() {
        let reporter = ViolationReporter::new();
        let (done, seen) = recording(reporter.clone());
        let mapped: ElementDone<u32, String> = done.map(|n| n + 1);
        drop(mapped);

        assert_eq!(*seen.lock().unwrap(), vec![None]);
        assert_eq!(reporter.count(), 1);
    }
}
