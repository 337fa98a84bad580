//! # Lifecycle events emitted by the queue and its processor.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Request events**: one request's trip through the queue (queued, starting, succeeded, failed, abandoned)
//! - **Control events**: cancellation and shutdown (flush, ignored cancel, shutdown, stop)
//! - **Subscriber events**: problems inside subscriber workers (overflow, panic)
//!
//! Events are observability only. The [`ResultSink`](crate::ResultSink) is the
//! authoritative channel for outcomes; an `Event` never replaces a sink notification.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use mutqueue::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RequestFailed)
//!     .with_request("todo-7")
//!     .with_reason("rejected: locked");
//!
//! assert_eq!(ev.kind, EventKind::RequestFailed);
//! assert_eq!(ev.request.as_deref(), Some("todo-7"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of queue events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Request events ===
    /// Request appended to the buffer.
    ///
    /// Sets: `request`, `pending` (buffer length after append).
    RequestQueued,

    /// Processor took the request and started its remote operation.
    ///
    /// Sets: `request`.
    RequestStarting,

    /// Remote operation resolved with a value; sink notified.
    ///
    /// Sets: `request`, `elapsed_ms`.
    RequestSucceeded,

    /// Remote operation failed; sink notified.
    ///
    /// Sets: `request`, `reason`, `elapsed_ms`.
    RequestFailed,

    /// Cancellation won the race; the request's result will never be reported.
    ///
    /// Sets: `request`, `elapsed_ms`.
    RequestAbandoned,

    // === Control events ===
    /// Buffered requests discarded after a cancellation (or on shutdown).
    ///
    /// Sets: `discarded`, `pending` (requests left in the buffer).
    BacklogFlushed,

    /// `cancel()` raised while nothing was in flight; no effect.
    CancelIgnored,

    /// Host requested shutdown of the queue.
    ShutdownRequested,

    /// Processor loop exited (terminal).
    ProcessorStopped,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `reason` (subscriber name and cause).
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `reason` (panic message).
    SubscriberPanicked,
}

/// Queue event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Rendered id of the request, if applicable.
    pub request: Option<Arc<str>>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Requests still buffered when the event was produced.
    pub pending: Option<u32>,
    /// Requests discarded by a flush.
    pub discarded: Option<u32>,
    /// Time spent in the `Processing` state, in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            request: None,
            reason: None,
            pending: None,
            discarded: None,
            elapsed_ms: None,
        }
    }

    /// Attaches a rendered request id.
    #[inline]
    pub fn with_request(mut self, request: impl Into<Arc<str>>) -> Self {
        self.request = Some(request.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches the current buffer length.
    #[inline]
    pub fn with_pending(mut self, n: usize) -> Self {
        self.pending = Some(saturate(n));
        self
    }

    /// Attaches the number of discarded requests.
    #[inline]
    pub fn with_discarded(mut self, n: usize) -> Self {
        self.discarded = Some(saturate(n));
        self
    }

    /// Attaches the time spent processing (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

}

fn saturate(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
