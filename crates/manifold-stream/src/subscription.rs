//! Consumer-side subscription handle

use std::sync::Arc;

use futures_core::Stream;
use tokio_util::sync::CancellationToken;

use manifold_core::{Pull, SourceFault, Terminal};

use crate::buffer::BufferReader;
use crate::registry::SubscriberId;
use crate::source::Shared;

/// One subscriber's lazy, independently-paced view of a source.
///
/// Pull with [`next`](Subscription::next) until a terminal outcome, or
/// convert into a [`Stream`] with [`into_stream`](Subscription::into_stream).
/// The subscription detaches its buffer from the source on any terminal
/// outcome and on drop, so an abandoned consumer never holds up the rest.
pub struct Subscription<T> {
    state: State<T>,
    cancel: CancellationToken,
    registration: Option<(Arc<Shared<T>>, SubscriberId)>,
}

enum State<T> {
    Streaming(BufferReader<T>),
    Finished(End),
}

/// How a finished sequence ended. Kept so further pulls repeat the same
/// terminal outcome (the subscription is fused).
#[derive(Clone)]
enum End {
    Ended,
    Faulted(SourceFault),
    Cancelled,
}

impl End {
    fn to_pull<T>(&self) -> Pull<T> {
        match self {
            End::Ended => Pull::Ended,
            End::Faulted(fault) => Pull::Faulted(fault.clone()),
            End::Cancelled => Pull::Cancelled,
        }
    }
}

impl<T> Subscription<T> {
    /// Subscription bound to a live buffer.
    pub(crate) fn streaming(
        reader: BufferReader<T>,
        cancel: CancellationToken,
        shared: Arc<Shared<T>>,
        id: SubscriberId,
    ) -> Self {
        Subscription {
            state: State::Streaming(reader),
            cancel,
            registration: Some((shared, id)),
        }
    }

    /// Subscription created against an already-settled source; it was never
    /// registered and has nothing to detach.
    pub(crate) fn settled(terminal: Terminal, cancel: CancellationToken) -> Self {
        let end = match terminal {
            Terminal::Completed => End::Ended,
            Terminal::Faulted(fault) => End::Faulted(fault),
        };
        Subscription {
            state: State::Finished(end),
            cancel,
            registration: None,
        }
    }

    /// Pull the next outcome of this sequence.
    ///
    /// Suspends until an item is queued, the source settles, or the
    /// cancellation signal fires. Cancellation is checked before yielding:
    /// an item already dequeued when cancellation is observed is discarded,
    /// so the cut-off point depends on emission order, not on scheduler
    /// timing. After a terminal outcome every further pull repeats it.
    pub async fn next(&mut self) -> Pull<T> {
        let end = match &mut self.state {
            State::Finished(end) => return end.to_pull(),
            State::Streaming(reader) => {
                let pulled = if self.cancel.is_cancelled() {
                    None
                } else {
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => None,
                        item = reader.recv() => Some(item),
                    }
                };

                match pulled {
                    None => End::Cancelled,
                    Some(Some(value)) => {
                        if self.cancel.is_cancelled() {
                            // Dequeued but not yet yielded: discard.
                            End::Cancelled
                        } else {
                            return Pull::Item(value);
                        }
                    }
                    Some(None) => match reader.fault() {
                        Some(fault) => End::Faulted(fault),
                        None => End::Ended,
                    },
                }
            }
        };
        self.finish(end)
    }

    /// Request cancellation of this subscription. Ends only this sequence;
    /// the source and other subscribers are unaffected.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Adapt into a [`Stream`]: items as `Ok`, a fault as one final `Err`,
    /// completion and cancellation as a silent end.
    pub fn into_stream(mut self) -> impl Stream<Item = Result<T, SourceFault>> {
        async_stream::stream! {
            loop {
                match self.next().await {
                    Pull::Item(value) => yield Ok(value),
                    Pull::Faulted(fault) => {
                        yield Err(fault);
                        break;
                    }
                    Pull::Ended | Pull::Cancelled => break,
                }
            }
        }
    }

    fn finish(&mut self, end: End) -> Pull<T> {
        self.detach();
        let pull = end.to_pull();
        self.state = State::Finished(end);
        pull
    }

    fn detach(&mut self) {
        if let Some((shared, id)) = self.registration.take() {
            shared.registry.remove(id);
            tracing::trace!(subscriber = id.value(), "subscriber detached");
        }
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    #[tokio::test]
    async fn test_queued_item_discarded_after_cancellation() {
        let source = Source::new();
        let token = CancellationToken::new();
        let mut sub = source.subscribe_with(token.clone());

        source.emit(1u32).await;
        token.cancel();

        // The queued item is never yielded once cancellation is observed.
        assert!(matches!(sub.next().await, Pull::Cancelled));
        assert!(matches!(sub.next().await, Pull::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_detaches_from_source() {
        let source = Source::<u32>::new();
        let mut sub = source.subscribe();
        assert_eq!(source.subscriber_count(), 1);

        sub.cancel();
        assert!(matches!(sub.next().await, Pull::Cancelled));
        assert_eq!(source.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_drop_detaches_from_source() {
        let source = Source::<u32>::new();
        let sub = source.subscribe();
        assert_eq!(source.subscriber_count(), 1);

        drop(sub);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_terminal_pulls_are_fused() {
        let source = Source::new();
        let mut sub = source.subscribe();

        source.emit(5u32).await;
        source.complete();

        assert_eq!(sub.next().await.item(), Some(5));
        assert!(matches!(sub.next().await, Pull::Ended));
        assert!(matches!(sub.next().await, Pull::Ended));
    }

    #[tokio::test]
    async fn test_fault_surfaces_after_queued_items() {
        let source = Source::new();
        let mut sub = source.subscribe();

        source.emit(1u32).await;
        source.fault(SourceFault::msg("producer gave up"));

        assert_eq!(sub.next().await.item(), Some(1));
        match sub.next().await {
            Pull::Faulted(fault) => assert_eq!(fault.to_string(), "producer gave up"),
            other => panic!("expected fault, got {other:?}"),
        }
    }
}
