use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use fanout_core::Key;

use crate::done::ElementDone;

/// The caller's unit of work for one entry.
///
/// `call` starts the work and returns; the work reports back through
/// `done`, either before `call` returns or at any later point. Implemented
/// for every `Fn(V, Key, ElementDone<R, E>)` closure.
pub trait Operation<V, R, E>: Send + Sync {
    fn call(&self, value: V, key: Key, done: ElementDone<R, E>);
}

impl<V, R, E, F> Operation<V, R, E> for F
where
    F: Fn(V, Key, ElementDone<R, E>) + Send + Sync,
{
    fn call(&self, value: V, key: Key, done: ElementDone<R, E>) {
        self(value, key, done)
    }
}

/// Async per-entry work, usable as a trait object.
#[async_trait]
pub trait Visitor<V, R, E>: Send + Sync
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    async fn visit(&self, value: V, key: Key) -> Result<R, E>;
}

/// Run each entry's future on its own tokio task.
pub fn from_async<V, R, E, F, Fut>(f: F) -> impl Operation<V, R, E>
where
    F: Fn(V, Key) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    move |value: V, key: Key, done: ElementDone<R, E>| {
        let work = f(value, key);
        tokio::spawn(async move {
            done.complete(work.await);
        });
    }
}

/// Drive a shared [`Visitor`], one tokio task per entry.
pub fn from_visitor<V, R, E>(visitor: Arc<dyn Visitor<V, R, E>>) -> impl Operation<V, R, E>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
{
    move |value: V, key: Key, done: ElementDone<R, E>| {
        let visitor = Arc::clone(&visitor);
        tokio::spawn(async move {
            done.complete(visitor.visit(value, key).await);
        });
    }
}

/// Pass an explicit context to every call of `f`.
pub fn with_context<Ctx, V, R, E, F>(context: Ctx, f: F) -> impl Operation<V, R, E>
where
    Ctx: Send + Sync,
    F: Fn(&Ctx, V, Key, ElementDone<R, E>) + Send + Sync,
{
    move |value: V, key: Key, done: ElementDone<R, E>| f(&context, value, key, done)
}
