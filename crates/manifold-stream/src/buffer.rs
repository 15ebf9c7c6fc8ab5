//! Per-subscriber ordered delivery buffer
//!
//! One buffer per subscriber: the source writes, exactly one subscription
//! drains. Built on tokio mpsc channels so queued items drain before the
//! consumer observes closure, and a bounded buffer suspends the producer
//! when full.

use std::sync::{Arc, OnceLock};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use manifold_core::SourceFault;

/// Writer half held by the source's registry (and cloned into emission
/// snapshots).
pub(crate) struct BufferHandle<T> {
    tx: BufferSender<T>,
    fault: Arc<OnceLock<SourceFault>>,
    /// Fires when the source settles; aborts a push suspended on a full
    /// bounded buffer.
    terminated: CancellationToken,
}

/// Reader half owned by one subscription.
pub(crate) struct BufferReader<T> {
    rx: BufferReceiver<T>,
    fault: Arc<OnceLock<SourceFault>>,
}

enum BufferSender<T> {
    Bounded(mpsc::Sender<T>),
    Unbounded(mpsc::UnboundedSender<T>),
}

enum BufferReceiver<T> {
    Bounded(mpsc::Receiver<T>),
    Unbounded(mpsc::UnboundedReceiver<T>),
}

/// Create a buffer pair. `capacity = None` never suspends the producer.
pub(crate) fn channel<T>(
    capacity: Option<usize>,
    terminated: CancellationToken,
) -> (BufferHandle<T>, BufferReader<T>) {
    let fault = Arc::new(OnceLock::new());
    let (tx, rx) = match capacity {
        Some(capacity) => {
            let (tx, rx) = mpsc::channel(capacity);
            (BufferSender::Bounded(tx), BufferReceiver::Bounded(rx))
        }
        None => {
            let (tx, rx) = mpsc::unbounded_channel();
            (BufferSender::Unbounded(tx), BufferReceiver::Unbounded(rx))
        }
    };

    let handle = BufferHandle {
        tx,
        fault: Arc::clone(&fault),
        terminated,
    };
    let reader = BufferReader { rx, fault };
    (handle, reader)
}

impl<T> BufferHandle<T> {
    /// Append one item.
    ///
    /// Unbounded buffers never suspend. A bounded push suspends while the
    /// buffer is full and resolves once capacity frees, the subscriber
    /// detaches, or the source settles. A push into a detached buffer is
    /// silently dropped; delivery failures never propagate to the producer.
    pub(crate) async fn push(&self, value: T) {
        match &self.tx {
            BufferSender::Unbounded(tx) => {
                let _ = tx.send(value);
            }
            BufferSender::Bounded(tx) => {
                tokio::select! {
                    biased;
                    result = tx.send(value) => {
                        let _ = result;
                    }
                    _ = self.terminated.cancelled() => {}
                }
            }
        }
    }

    /// Close the buffer, optionally recording the source fault first.
    ///
    /// The fault is stored before the sender drops so a reader that observes
    /// closure always finds the fault already in place. Items queued before
    /// the close still drain in order.
    pub(crate) fn close(self, fault: Option<SourceFault>) {
        if let Some(fault) = fault {
            let _ = self.fault.set(fault);
        }
        // Dropping the sender closes the channel once in-flight clones
        // (emission snapshots) are done with it.
    }
}

impl<T> Clone for BufferHandle<T> {
    fn clone(&self) -> Self {
        BufferHandle {
            tx: match &self.tx {
                BufferSender::Bounded(tx) => BufferSender::Bounded(tx.clone()),
                BufferSender::Unbounded(tx) => BufferSender::Unbounded(tx.clone()),
            },
            fault: Arc::clone(&self.fault),
            terminated: self.terminated.clone(),
        }
    }
}

impl<T> BufferReader<T> {
    /// Next queued item, or `None` once the buffer is closed and drained.
    pub(crate) async fn recv(&mut self) -> Option<T> {
        match &mut self.rx {
            BufferReceiver::Bounded(rx) => rx.recv().await,
            BufferReceiver::Unbounded(rx) => rx.recv().await,
        }
    }

    /// The fault the buffer was closed with, if any.
    pub(crate) fn fault(&self) -> Option<SourceFault> {
        self.fault.get().cloned()
    }
}
