//! # Event subscriber trait.
//!
//! [`Subscribe`] is how host code observes a queue: logging, metrics, an
//! "unsaved changes" indicator driven by `RequestQueued` / `RequestSucceeded`, and so on.
//!
//! Every subscriber is driven by its own worker with a bounded queue, so a slow
//! subscriber never delays the processor or other subscribers. Overflowing events
//! are dropped for that subscriber only and announced as `SubscriberOverflow`;
//! a panic in [`Subscribe::on_event`] is caught and announced as `SubscriberPanicked`.
//!
//! [`Subscribe::accepts`] filters before queueing, so kinds a subscriber ignores
//! never take space in its queue.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! use async_trait::async_trait;
//! use mutqueue::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct AbandonCounter(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for AbandonCounter {
//!     async fn on_event(&self, _ev: &Event) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn accepts(&self, ev: &Event) -> bool {
//!         matches!(ev.kind, EventKind::RequestAbandoned)
//!     }
//!
//!     fn name(&self) -> &'static str { "abandon-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Observer of queue events.
///
/// Implementations should use async I/O and handle their own errors.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one accepted event, on this subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Returns `false` for events this subscriber does not want queued.
    ///
    /// Called on the fan-out path for every event; keep it cheap. Default: all events.
    fn accepts(&self, _event: &Event) -> bool {
        true
    }

    /// Name reported in `SubscriberOverflow` / `SubscriberPanicked` events.
    ///
    /// Defaults to `type_name::<Self>()`.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (clamped to at least 1). Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
