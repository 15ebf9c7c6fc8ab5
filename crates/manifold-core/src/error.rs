//! Fault values for Manifold sources

use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Error recorded by `Source::fault` and replayed to every past and future
/// subscriber as the terminal outcome of its sequence.
///
/// Cloning is cheap: all clones share the originally recorded error.
#[derive(Debug, Clone, Error)]
#[error(transparent)]
pub struct SourceFault {
    inner: Arc<dyn StdError + Send + Sync + 'static>,
}

impl SourceFault {
    /// Wrap an error value.
    pub fn new(error: impl StdError + Send + Sync + 'static) -> Self {
        SourceFault {
            inner: Arc::new(error),
        }
    }

    /// Build a fault from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        SourceFault::new(Message(message.to_string()))
    }

    /// Borrow the recorded error.
    pub fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.inner.as_ref()
    }

    /// Whether two handles refer to the same recorded fault.
    ///
    /// Faults replay by sharing, never by value comparison, so identity is
    /// the meaningful equivalence here.
    pub fn same(&self, other: &SourceFault) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Message-only fault payload.
#[derive(Debug, Error)]
#[error("{0}")]
struct Message(String);
