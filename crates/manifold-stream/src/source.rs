//! Broadcast source - the producer-side entry point

use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use manifold_core::{SourceConfig, SourceFault, Terminal, TerminalCell};

use crate::buffer;
use crate::registry::Registry;
use crate::subscription::Subscription;

/// State shared between a source and its subscriptions.
pub(crate) struct Shared<T> {
    pub(crate) registry: Registry<T>,
    pub(crate) terminal: TerminalCell,
    /// Fires once the terminal transition is won; releases producers
    /// suspended on full bounded buffers.
    terminated: CancellationToken,
    config: SourceConfig,
}

/// Single-producer, multi-consumer broadcast source.
///
/// A producer emits values once; every subscriber attached at that moment
/// receives them in emission order through its own buffer. Subscribers may
/// attach at any time and see values from attachment onward. `complete` and
/// `fault` settle the source exactly once for everyone.
///
/// Producer-side calls (`emit`, `complete`, `fault`) must be serialized by
/// the caller: the source assumes a single logical writer. Subscribing,
/// detaching, and consuming are safe under arbitrary interleaving from any
/// number of tasks.
///
/// Cloning a `Source` yields another handle to the same underlying stream.
pub struct Source<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Source<T> {
    /// Create an unbounded source with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SourceConfig::default())
    }

    /// Create a source whose subscriber buffers hold at most `capacity`
    /// items; emission suspends while any live buffer is full.
    pub fn bounded(capacity: usize) -> Self {
        Self::with_config(SourceConfig::bounded(capacity))
    }

    /// Create a source with custom configuration.
    pub fn with_config(config: SourceConfig) -> Self {
        Source {
            shared: Arc::new(Shared {
                registry: Registry::new(),
                terminal: TerminalCell::new(),
                terminated: CancellationToken::new(),
                config,
            }),
        }
    }

    /// Attach a new subscriber.
    ///
    /// Always succeeds. On an open source this registers a fresh buffer and
    /// the subscription observes every value emitted from this point on. On
    /// a completed source the subscription ends immediately; on a faulted
    /// source its first pull surfaces the recorded fault. Terminal
    /// subscribers never touch the registry.
    pub fn subscribe(&self) -> Subscription<T> {
        self.subscribe_with(CancellationToken::new())
    }

    /// Attach a new subscriber bound to a caller-supplied cancellation
    /// signal. Cancelling it ends only this subscription; the source and
    /// every other subscriber are unaffected.
    pub fn subscribe_with(&self, cancel: CancellationToken) -> Subscription<T> {
        if let Some(terminal) = self.shared.terminal.get() {
            return Subscription::settled(terminal.clone(), cancel);
        }

        let (handle, reader) =
            buffer::channel(self.shared.config.capacity, self.shared.terminated.clone());
        let registered = self
            .shared
            .registry
            .register(handle, || self.shared.terminal.get().cloned());

        match registered {
            Ok(id) => {
                tracing::debug!(subscriber = id.value(), "subscriber attached");
                Subscription::streaming(reader, cancel, Arc::clone(&self.shared), id)
            }
            // Lost the race against a terminal transition; the unused
            // buffer is dropped without ever entering the registry.
            Err(terminal) => Subscription::settled(terminal, cancel),
        }
    }

    /// Settle the source as completed. The first caller wins; every later
    /// `complete` or `fault` is a silent no-op. Live buffers are closed so
    /// each subscriber ends after draining what was already queued.
    pub fn complete(&self) {
        if !self.shared.terminal.try_complete() {
            return;
        }
        self.shared.terminated.cancel();

        let drained = self.shared.registry.drain();
        tracing::debug!(subscribers = drained.len(), "source completed");
        for handle in drained {
            handle.close(None);
        }
    }

    /// Settle the source as faulted. Only the first recorded fault is
    /// retained and replayed; later `fault` or `complete` calls are silent
    /// no-ops. Each live subscriber drains its queued items and then
    /// observes the fault.
    pub fn fault(&self, fault: SourceFault) {
        if !self.shared.terminal.try_fault(fault.clone()) {
            return;
        }
        self.shared.terminated.cancel();

        let drained = self.shared.registry.drain();
        tracing::debug!(subscribers = drained.len(), fault = %fault, "source faulted");
        for handle in drained {
            handle.close(Some(fault.clone()));
        }
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.registry.len()
    }

    /// Whether the source has settled (completed or faulted).
    pub fn is_terminated(&self) -> bool {
        self.shared.terminal.is_terminal()
    }

    /// The settled state, if any.
    pub fn terminal(&self) -> Option<Terminal> {
        self.shared.terminal.get().cloned()
    }

    pub fn config(&self) -> &SourceConfig {
        &self.shared.config
    }
}

impl<T: Clone + Send + 'static> Source<T> {
    /// Deliver `value` to every subscriber attached right now.
    ///
    /// Takes a snapshot of the registry under the shared lock, releases it,
    /// then pushes into each buffer: sequentially below the configured
    /// dispatch threshold, concurrently across spawned tasks at or above
    /// it. A detached buffer in the snapshot is skipped silently and never
    /// affects delivery to the others.
    ///
    /// Unbounded sources resolve immediately. With bounded capacity this
    /// suspends while any target buffer is full, gating the producer on the
    /// slowest live consumer; termination releases the suspension.
    ///
    /// Emitting after `complete` or `fault` delivers to no one.
    pub async fn emit(&self, value: T) {
        if self.shared.terminal.is_terminal() {
            return;
        }

        let snapshot = self.shared.registry.snapshot();
        if snapshot.is_empty() {
            return;
        }

        if snapshot.len() < self.shared.config.dispatch_threshold {
            for handle in &snapshot {
                handle.push(value.clone()).await;
            }
        } else {
            let mut dispatch = JoinSet::new();
            for handle in snapshot {
                let value = value.clone();
                dispatch.spawn(async move { handle.push(value).await });
            }
            while dispatch.join_next().await.is_some() {}
        }
    }
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Source {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> Default for Source<T> {
    fn default() -> Self {
        Self::new()
    }
}
