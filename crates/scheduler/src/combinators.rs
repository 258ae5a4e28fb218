//! Collection combinators built on [`Iteration::run`].
//!
//! Each combinator supplies an assembly policy and, where needed, wraps the
//! caller's operation. The concurrency policy is whatever the [`Iteration`]
//! was configured with, so `map` over `Iteration::over(xs).policy(Policy::Series)`
//! is the series variant and `.policy(Policy::Limited(n))` the limited one.
//! Results are stored in slots indexed by entry position and finalized in
//! visitation order, regardless of completion order.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fanout_core::{IterError, Key, Policy};
use indexmap::IndexMap;

use crate::done::ElementDone;
use crate::iteration::{Iteration, Operation};

type Slots<T> = Vec<Option<T>>;

fn slots<T>(len: usize) -> Slots<T> {
    std::iter::repeat_with(|| None).take(len).collect()
}

fn fill<T>(slots: &mut Slots<T>, position: usize, item: T) {
    if let Some(slot) = slots.get_mut(position) {
        *slot = Some(item);
    }
}

fn keyed<T>(slots: Slots<(Key, T)>) -> IndexMap<Key, T> {
    slots.into_iter().flatten().collect()
}

fn values<T>(slots: Slots<(Key, T)>) -> Vec<T> {
    slots.into_iter().flatten().map(|(_, value)| value).collect()
}

/// Visit every entry for its side effects.
pub async fn each<V, E, O>(iteration: Iteration<V>, operation: O) -> Result<(), IterError<(), E>>
where
    V: Send + 'static,
    E: Send + 'static,
    O: Operation<V, (), E>,
{
    iteration.run(operation, (), |_, _, _, _| {}).await
}

/// Transform every value. The output follows visitation order.
///
/// On failure `partial` has one slot per entry, `Some` for entries that
/// finished before the failure.
pub async fn map<V, R, E, O>(
    iteration: Iteration<V>,
    operation: O,
) -> Result<Vec<R>, IterError<Vec<Option<R>>, E>>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    O: Operation<V, R, E>,
{
    let container = slots(iteration.len());
    let filled = iteration
        .run(operation, container, |slots: &mut Slots<R>, position, _, result| {
            fill(slots, position, result)
        })
        .await?;
    Ok(filled.into_iter().flatten().collect())
}

/// Transform every value, keeping each result under its entry's key.
pub async fn map_values<V, R, E, O>(
    iteration: Iteration<V>,
    operation: O,
) -> Result<IndexMap<Key, R>, IterError<IndexMap<Key, R>, E>>
where
    V: Send + 'static,
    R: Send + 'static,
    E: Send + 'static,
    O: Operation<V, R, E>,
{
    let container = slots(iteration.len());
    iteration
        .run(operation, container, |slots: &mut Slots<(Key, R)>, position, key, result| {
            fill(slots, position, (key.clone(), result))
        })
        .await
        .map(keyed)
        .map_err(|err| err.map_partial(keyed))
}

/// Run a boolean predicate and keep `(key, value)` for entries whose answer
/// equals `keep_when`.
async fn sift<V, E, O>(
    iteration: Iteration<V>,
    predicate: O,
    keep_when: bool,
) -> Result<Slots<(Key, V)>, IterError<Slots<(Key, V)>, E>>
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    O: Operation<V, bool, E>,
{
    let carry_value = move |value: V, key: Key, done: ElementDone<(V, bool), E>| {
        let kept = value.clone();
        predicate.call(value, key, done.map(move |answer: bool| (kept, answer)));
    };
    let container = slots(iteration.len());
    iteration
        .run(
            carry_value,
            container,
            move |slots: &mut Slots<(Key, V)>, position, key, (value, answer)| {
                if answer == keep_when {
                    fill(slots, position, (key.clone(), value));
                }
            },
        )
        .await
}

/// Values whose predicate answered `true`, in visitation order.
pub async fn filter<V, E, O>(
    iteration: Iteration<V>,
    predicate: O,
) -> Result<Vec<V>, IterError<Vec<V>, E>>
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    O: Operation<V, bool, E>,
{
    sift(iteration, predicate, true)
        .await
        .map(values)
        .map_err(|err| err.map_partial(values))
}

/// Values whose predicate answered `false`, in visitation order.
pub async fn reject<V, E, O>(
    iteration: Iteration<V>,
    predicate: O,
) -> Result<Vec<V>, IterError<Vec<V>, E>>
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    O: Operation<V, bool, E>,
{
    sift(iteration, predicate, false)
        .await
        .map(values)
        .map_err(|err| err.map_partial(values))
}

/// Entries whose predicate answered `true`, keyed as in the input.
pub async fn pick<V, E, O>(
    iteration: Iteration<V>,
    predicate: O,
) -> Result<IndexMap<Key, V>, IterError<IndexMap<Key, V>, E>>
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    O: Operation<V, bool, E>,
{
    sift(iteration, predicate, true)
        .await
        .map(keyed)
        .map_err(|err| err.map_partial(keyed))
}

/// Entries whose predicate answered `false`, keyed as in the input.
pub async fn omit<V, E, O>(
    iteration: Iteration<V>,
    predicate: O,
) -> Result<IndexMap<Key, V>, IterError<IndexMap<Key, V>, E>>
where
    V: Clone + Send + 'static,
    E: Send + 'static,
    O: Operation<V, bool, E>,
{
    sift(iteration, predicate, false)
        .await
        .map(keyed)
        .map_err(|err| err.map_partial(keyed))
}

fn lock<T>(memo: &Mutex<T>) -> MutexGuard<'_, T> {
    memo.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Fold every entry into `memo`, one entry at a time.
///
/// Always runs in series whatever policy `iteration` carries, since each
/// step needs the previous step's memo. On failure `partial` is the memo
/// as of the last successful step.
pub async fn reduce<V, M, E, F>(
    iteration: Iteration<V>,
    memo: M,
    reducer: F,
) -> Result<M, IterError<M, E>>
where
    V: Send + 'static,
    M: Clone + Send + 'static,
    E: Send + 'static,
    F: Fn(M, V, Key, ElementDone<M, E>) + Send + Sync,
{
    let cell = Arc::new(Mutex::new(memo));
    let current = Arc::clone(&cell);
    let step = move |value: V, key: Key, done: ElementDone<M, E>| {
        let memo = lock(&current).clone();
        reducer(memo, value, key, done);
    };
    let take = |cell: Arc<Mutex<M>>| {
        let memo = lock(&cell).clone();
        memo
    };

    iteration
        .policy(Policy::Series)
        .run(step, cell, |cell: &mut Arc<Mutex<M>>, _, _, next| {
            *lock(&**cell) = next;
        })
        .await
        .map(take)
        .map_err(|err| err.map_partial(take))
}
