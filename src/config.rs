//! # Queue runtime configuration.
//!
//! Provides [`QueueConfig`] centralized settings for a [`MutationQueue`](crate::MutationQueue).
//!
//! ## Sentinel values
//! - `grace = 0s` → shutdown does not wait for the processor to stop

use std::time::Duration;

/// Configuration for one mutation queue instance.
///
/// The request buffer itself is unbounded and has no knobs: producers never
/// block and there is no per-operation timeout.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `grace`: Maximum wait for the processor to stop on shutdown (`0s` = no wait)
#[derive(Clone, Debug)]
pub struct QueueConfig {
    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// skip older events. Minimum value is 1 (enforced by Bus).
    pub bus_capacity: usize,

    /// Maximum time [`MutationQueue::shutdown`](crate::MutationQueue::shutdown)
    /// waits for the processor task to exit.
    pub grace: Duration,
}

impl QueueConfig {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the shutdown grace period as an `Option`.
    ///
    /// - `None` → do not wait for the processor
    /// - `Some(d)` → wait up to `d`
    #[inline]
    pub fn grace_period(&self) -> Option<Duration> {
        if self.grace == Duration::ZERO {
            None
        } else {
            Some(self.grace)
        }
    }
}

impl Default for QueueConfig {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `grace = 5s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            grace: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_capacity_is_clamped() {
        let cfg = QueueConfig {
            bus_capacity: 0,
            ..QueueConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn test_zero_grace_means_no_wait() {
        let cfg = QueueConfig {
            grace: Duration::ZERO,
            ..QueueConfig::default()
        };
        assert_eq!(cfg.grace_period(), None);
        assert_eq!(
            QueueConfig::default().grace_period(),
            Some(Duration::from_secs(5))
        );
    }
}
