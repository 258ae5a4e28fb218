//! Handle for callback-style runs started with `spawn`.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};

/// A run started on its own tokio task.
///
/// The task is held at a gate until the caller lets go of this handle:
/// by dropping it, calling [`release`](Spawned::release), or awaiting it.
/// The run's `on_done` therefore never fires before the code that called
/// `spawn` has moved past the handle, on any runtime flavor.
#[derive(Debug)]
pub struct Spawned {
    gate: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl Spawned {
    pub(crate) fn start<W>(work: W) -> Self
    where
        W: Future<Output = ()> + Send + 'static,
    {
        let (gate, opened) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            // Resolves on send and on drop of the sender alike.
            let _ = opened.await;
            work.await;
        });
        Self {
            gate: Some(gate),
            join,
        }
    }

    /// Let the run proceed. Idempotent.
    pub fn release(&mut self) {
        if let Some(gate) = self.gate.take() {
            let _ = gate.send(());
        }
    }

    pub fn is_released(&self) -> bool {
        self.gate.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for Spawned {
    fn drop(&mut self) {
        self.release();
    }
}

impl Future for Spawned {
    type Output = Result<(), JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.release();
        Pin::new(&mut self.join).poll(cx)
    }
}
