//! # MutationQueue: owned queue object and its producer handle.
//!
//! [`MutationQueue`] owns the processor task, the event fan-out and the shutdown
//! path. Producers and the teardown code get cheap clones of [`QueueHandle`].
//!
//! ## Architecture
//! ```text
//! QueueHandle::submit ──► RequestQueue ──► Processor ──► RemoteOperation
//!                                             │  ▲
//!                                             │  └── Coordinator ◄── QueueHandle::cancel
//!                                             ▼
//!                                         ResultSink
//! ```
//!
//! ## Shutdown path
//! ```text
//! shutdown()
//!   ├─► publish ShutdownRequested
//!   ├─► runtime_token.cancel()     → interrupts dequeue() or the current race
//!   ├─► wait for processor (grace) → abort + GraceExceeded on timeout
//!   ├─► coordinator.stop(), drain_all() → publish BacklogFlushed
//!   └─► publish ProcessorStopped   → fan-out listener drains subscribers and exits
//! ```

use std::sync::{Arc, Mutex, PoisonError};

use tokio::{sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    config::QueueConfig,
    core::{
        coordinator::{Coordinator, ProcessorState},
        queue::RequestQueue,
    },
    error::{RuntimeError, SubmitError},
    events::{Bus, Event, EventKind},
    requests::{Request, RequestId},
};

/// Cloneable producer/teardown handle of a [`MutationQueue`].
///
/// `submit` is fire-and-forget and never blocks; `cancel` may be called from
/// anywhere at any time.
pub struct QueueHandle<I, S> {
    pub(crate) queue: Arc<RequestQueue<Request<I, S>>>,
    pub(crate) coordinator: Arc<Coordinator>,
    pub(crate) bus: Bus,
    pub(crate) runtime: CancellationToken,
}

impl<I, S> Clone for QueueHandle<I, S> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            coordinator: Arc::clone(&self.coordinator),
            bus: self.bus.clone(),
            runtime: self.runtime.clone(),
        }
    }
}

impl<I, S> QueueHandle<I, S>
where
    I: RequestId,
    S: Send + 'static,
{
    /// Appends a request to the queue.
    ///
    /// Fails only once the queue has been shut down.
    pub fn submit(&self, request: Request<I, S>) -> Result<(), SubmitError> {
        if self.runtime.is_cancelled() {
            return Err(SubmitError::Closed);
        }
        let label = request.id().to_string();
        self.queue.enqueue(request);
        self.bus.publish(
            Event::new(EventKind::RequestQueued)
                .with_request(label)
                .with_pending(self.queue.len()),
        );
        Ok(())
    }

    /// Shorthand for `submit(Request::new(id, desired))`.
    pub fn submit_parts(&self, id: I, desired: S) -> Result<(), SubmitError> {
        self.submit(Request::new(id, desired))
    }

    /// Abandons the in-flight request and discards everything buffered so far.
    ///
    /// Returns `true` if a request was in flight. With nothing in flight this is
    /// a no-op and nothing is remembered for later submissions.
    pub fn cancel(&self) -> bool {
        let hit = self.coordinator.cancel(|| self.queue.last_seq());
        if !hit {
            self.bus.publish(Event::new(EventKind::CancelIgnored));
        }
        hit
    }

    /// Number of buffered (not yet started) requests.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Current processor state.
    pub fn state(&self) -> ProcessorState {
        self.coordinator.state()
    }

    /// True once the owning queue was shut down or dropped.
    pub fn is_closed(&self) -> bool {
        self.runtime.is_cancelled()
    }
}

/// Serialized, cancellable mutation queue.
///
/// Created by [`MutationQueueBuilder`](crate::MutationQueueBuilder) or
/// [`MutationQueue::new`]. Dropping it without calling [`shutdown`](Self::shutdown)
/// stops the processor and closes every handle.
pub struct MutationQueue<I, S> {
    pub(crate) cfg: QueueConfig,
    pub(crate) handle: QueueHandle<I, S>,
    pub(crate) processor: Mutex<Option<JoinHandle<()>>>,
    pub(crate) listener: Mutex<Option<JoinHandle<()>>>,
}

impl<I, S> MutationQueue<I, S>
where
    I: RequestId,
    S: Send + 'static,
{
    /// Returns a producer/teardown handle.
    pub fn handle(&self) -> QueueHandle<I, S> {
        self.handle.clone()
    }

    /// See [`QueueHandle::submit`].
    pub fn submit(&self, request: Request<I, S>) -> Result<(), SubmitError> {
        self.handle.submit(request)
    }

    /// See [`QueueHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.handle.cancel()
    }

    /// See [`QueueHandle::state`].
    pub fn state(&self) -> ProcessorState {
        self.handle.state()
    }

    /// See [`QueueHandle::pending`].
    pub fn pending(&self) -> usize {
        self.handle.pending()
    }

    /// Creates a receiver for subsequent queue events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.handle.bus.subscribe()
    }

    /// Stops the processor, discards the backlog and closes all handles.
    ///
    /// Waits up to [`QueueConfig::grace`] for the processor to exit. The
    /// in-flight operation, if any, is abandoned like on `cancel()`.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let Some(mut processor) = take(&self.processor) else {
            return Err(RuntimeError::AlreadyShutdown);
        };
        let h = &self.handle;
        h.bus.publish(Event::new(EventKind::ShutdownRequested));
        h.runtime.cancel();

        let res = match self.cfg.grace_period() {
            None => {
                processor.abort();
                Ok(())
            }
            Some(grace) => match tokio::time::timeout(grace, &mut processor).await {
                Ok(_) => Ok(()),
                Err(_elapsed) => {
                    processor.abort();
                    Err(RuntimeError::GraceExceeded { grace })
                }
            },
        };

        h.coordinator.stop();
        let discarded = h.queue.drain_all();
        if !discarded.is_empty() {
            h.bus.publish(
                Event::new(EventKind::BacklogFlushed)
                    .with_discarded(discarded.len())
                    .with_pending(0),
            );
        }
        h.bus.publish(Event::new(EventKind::ProcessorStopped));

        if let Some(listener) = take(&self.listener) {
            match self.cfg.grace_period() {
                Some(grace) => {
                    let _ = tokio::time::timeout(grace, listener).await;
                }
                None => listener.abort(),
            }
        }
        res
    }
}

impl<I, S> Drop for MutationQueue<I, S> {
    fn drop(&mut self) {
        // Not shut down explicitly: stop the processor and release the listener.
        if take(&self.processor).is_some() {
            self.handle.runtime.cancel();
            self.handle.bus.publish(Event::new(EventKind::ProcessorStopped));
        }
    }
}

fn take(slot: &Mutex<Option<JoinHandle<()>>>) -> Option<JoinHandle<()>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}
