//! Arm-once completion callbacks.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use fanout_core::{Site, Violation};

use crate::violation::ViolationReporter;

type OnFire<A> = Box<dyn FnOnce(A) + Send>;

/// Wraps a one-shot callback so it runs at most once.
///
/// The first [`fire`](CompletionGuard::fire) hands its argument to the
/// armed callback. Every later call, through this guard or any clone of it,
/// is reported as [`Violation::AlreadyCalled`] and its argument is dropped.
pub struct CompletionGuard<A> {
    inner: Arc<GuardInner<A>>,
}

struct GuardInner<A> {
    site: Site,
    on_fire: Mutex<Option<OnFire<A>>>,
    reporter: ViolationReporter,
}

impl<A> Clone for CompletionGuard<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A> fmt::Debug for CompletionGuard<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionGuard")
            .field("site", &self.inner.site)
            .field("fired", &self.is_fired())
            .finish()
    }
}

impl<A> CompletionGuard<A> {
    /// Arm `on_fire` for the callback at `site`.
    pub fn arm<F>(site: Site, reporter: ViolationReporter, on_fire: F) -> Self
    where
        F: FnOnce(A) + Send + 'static,
    {
        Self {
            inner: Arc::new(GuardInner {
                site,
                on_fire: Mutex::new(Some(Box::new(on_fire))),
                reporter,
            }),
        }
    }

    /// Fire the callback. Returns `false` and reports a violation if it
    /// had already fired.
    pub fn fire(&self, args: A) -> bool {
        // Take the callback out before running it so a re-entrant fire
        // sees an empty slot instead of a held lock.
        let on_fire = self
            .inner
            .on_fire
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match on_fire {
            Some(callback) => {
                callback(args);
                true
            }
            None => {
                self.inner
                    .reporter
                    .report(Violation::AlreadyCalled(self.inner.site.clone()));
                false
            }
        }
    }

    pub fn is_fired(&self) -> bool {
        self.inner
            .on_fire
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn site(&self) -> &Site {
        &self.inner.site
    }

    pub fn reporter(&self) -> &ViolationReporter {
        &self.inner.reporter
    }
}
