//! Tagged outcome of a single consumer pull

use crate::error::SourceFault;

/// What a subscriber observed on one pull of its sequence.
///
/// Raised errors are reserved for `Faulted`; cancellation and normal end are
/// plain outcomes, not error conditions.
#[derive(Debug)]
pub enum Pull<T> {
    /// The next item, in producer emission order.
    Item(T),
    /// The source completed normally; no further items will arrive.
    Ended,
    /// The source faulted; carries the fault recorded by the producer.
    Faulted(SourceFault),
    /// This subscriber's cancellation signal fired.
    Cancelled,
}

impl<T> Pull<T> {
    /// The item, if this pull yielded one.
    pub fn item(self) -> Option<T> {
        match self {
            Pull::Item(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the sequence is over after this pull.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Pull::Item(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_extraction() {
        assert_eq!(Pull::Item(7).item(), Some(7));
        assert_eq!(Pull::<i32>::Ended.item(), None);
    }

    #[test]
    fn test_terminal_tags() {
        assert!(!Pull::Item(0).is_terminal());
        assert!(Pull::<i32>::Ended.is_terminal());
        assert!(Pull::<i32>::Cancelled.is_terminal());
        assert!(Pull::<i32>::Faulted(SourceFault::msg("x")).is_terminal());
    }
}
