//! # Unbounded FIFO request buffer.
//!
//! [`RequestQueue`] is fed by many producers and drained by exactly one consumer.
//!
//! ## Rules
//! - `enqueue` never fails and never blocks.
//! - `dequeue` suspends on a [`Notify`] until an item is available (no polling).
//! - Every item gets a sequence number (starting at 1) in enqueue order;
//!   `drain_until(mark)` removes exactly the prefix with `seq <= mark`.
//! - The buffer lock is never held across an `.await`, so no caller observes a
//!   partial state and no item is handed out twice.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

/// An item together with its enqueue sequence number.
#[derive(Debug)]
pub(crate) struct Queued<R> {
    pub seq: u64,
    pub item: R,
}

struct Buffer<R> {
    items: VecDeque<Queued<R>>,
    last_seq: u64,
}

/// Unbounded multi-producer, single-consumer FIFO.
pub struct RequestQueue<R> {
    buf: Mutex<Buffer<R>>,
    available: Notify,
}

impl<R> RequestQueue<R> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            buf: Mutex::new(Buffer {
                items: VecDeque::new(),
                last_seq: 0,
            }),
            available: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Buffer<R>> {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item` to the tail and returns its sequence number.
    pub fn enqueue(&self, item: R) -> u64 {
        let seq = {
            let mut buf = self.lock();
            buf.last_seq += 1;
            let seq = buf.last_seq;
            buf.items.push_back(Queued { seq, item });
            seq
        };
        self.available.notify_one();
        seq
    }

    /// Removes and returns the head, waiting until one is available.
    ///
    /// Intended for a single consumer. Cancel-safe: dropping the future never
    /// loses an item.
    pub async fn dequeue(&self) -> R {
        loop {
            if let Some(head) = self.pop_queued() {
                return head.item;
            }
            self.available().await;
        }
    }

    /// Removes the head without waiting.
    pub(crate) fn pop_queued(&self) -> Option<Queued<R>> {
        self.lock().items.pop_front()
    }

    /// Completes once an item may be available.
    ///
    /// A permit stored by `enqueue` since the last wait completes it immediately,
    /// so checking with `pop_queued` first and then waiting never misses an item.
    /// Wakeups can be spurious; callers re-check.
    pub(crate) async fn available(&self) {
        self.available.notified().await;
    }

    /// Atomically removes and returns every buffered item, in order.
    pub fn drain_all(&self) -> Vec<R> {
        self.lock().items.drain(..).map(|q| q.item).collect()
    }

    /// Atomically removes the buffered items with `seq <= mark`, in order.
    pub fn drain_until(&self, mark: u64) -> Vec<R> {
        let mut buf = self.lock();
        let cut = buf.items.partition_point(|q| q.seq <= mark);
        buf.items.drain(..cut).map(|q| q.item).collect()
    }

    /// Sequence number of the most recently enqueued item (`0` if none yet).
    pub fn last_seq(&self) -> u64 {
        self.lock().last_seq
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// True if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }
}

impl<R> Default for RequestQueue<R> {
    fn default() -> Self {
        Self::new()
    }
}
