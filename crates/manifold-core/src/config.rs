//! Source configuration

/// Subscriber count at which fan-out switches from a sequential loop to
/// concurrent dispatch tasks. Tunable via [`SourceConfig`]; exists purely to
/// amortize task spawn overhead at scale.
pub const DEFAULT_DISPATCH_THRESHOLD: usize = 32;

/// Broadcast source configuration.
#[derive(Clone, Debug)]
pub struct SourceConfig {
    /// Per-subscriber buffer bound. `None` means unbounded; the producer
    /// never suspends. With a bound, emission suspends while any target
    /// buffer is full.
    pub capacity: Option<usize>,
    /// Subscriber count at which delivery fans out across tasks instead of
    /// a sequential loop.
    pub dispatch_threshold: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            capacity: None,
            dispatch_threshold: DEFAULT_DISPATCH_THRESHOLD,
        }
    }
}

impl SourceConfig {
    /// Configuration with a per-subscriber capacity bound.
    ///
    /// A zero capacity is clamped to one; a queue that can never hold an
    /// item would deadlock the producer on first emission.
    pub fn bounded(capacity: usize) -> Self {
        SourceConfig {
            capacity: Some(capacity.max(1)),
            ..SourceConfig::default()
        }
    }
}
