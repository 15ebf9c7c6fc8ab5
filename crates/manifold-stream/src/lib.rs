//! Manifold Stream - Single-producer, multi-consumer broadcast stream
//!
//! A [`Source`] lets one logical producer push values to any number of
//! independently-paced subscribers. Each subscriber attached at emission
//! time receives every value, in order, through its own buffer; subscribers
//! may attach at any time and see values from attachment onward. The source
//! settles exactly once - completed or faulted - for every past and future
//! subscriber.
//!
//! ```
//! use manifold_stream::{Pull, Source};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let source = Source::new();
//! let mut sub = source.subscribe();
//!
//! source.emit(1).await;
//! source.emit(2).await;
//! source.complete();
//!
//! assert_eq!(sub.next().await.item(), Some(1));
//! assert_eq!(sub.next().await.item(), Some(2));
//! assert!(matches!(sub.next().await, Pull::Ended));
//! # });
//! ```
//!
//! Producer-side calls (`emit`, `complete`, `fault`) assume a single logical
//! writer and must be serialized by the caller. Everything consumer-side is
//! safe under arbitrary interleaving.

mod buffer;
mod registry;

pub mod source;
pub mod subscription;

pub use manifold_core::{Pull, SourceConfig, SourceFault, Terminal, DEFAULT_DISPATCH_THRESHOLD};
pub use source::Source;
pub use subscription::Subscription;

// Subscriptions take their cancellation input as a `CancellationToken`;
// re-exported so callers need not depend on tokio-util directly.
pub use tokio_util::sync::CancellationToken;
