//! # Serial processor: the single consumer of a mutation queue.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► Coordinator::claim(pop head)           ── coordinator stopped ─► exit
//!   │     └─ queue empty: wait for enqueue     ── runtime cancelled ─► exit
//!   ├─► label the race with the rendered id
//!   ├─► token already cancelled? skip the operation
//!   ├─► publish RequestStarting, race_operation(op, token, id, desired)
//!   └─► coordinator.settle():
//!         ├─ Cancelled { mark } ─► publish RequestAbandoned
//!         │                        drain_until(mark), publish BacklogFlushed
//!         ├─ Completed + Finished(Ok)  ─► sink.deliver(Success), publish RequestSucceeded
//!         ├─ Completed + Finished(Err) ─► sink.deliver(Failure), publish RequestFailed
//!         └─ Completed + Interrupted   ─► runtime shutdown, exit
//! }
//! ```
//!
//! ## Rules
//! - Never more than one operation outstanding (next race claimed only after `settle`).
//! - A request leaves the buffer only together with arming the race, so a
//!   `cancel()` can never fall between the two.
//! - Requests are started in dequeue order, which is enqueue order.
//! - Operation failures end at this boundary: they become `Failure` outcomes.
//! - An abandoned request never reaches the sink, whatever its operation returns later.

use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        coordinator::{Claim, Coordinator, Verdict},
        queue::RequestQueue,
        runner::{RaceEnd, race_operation},
    },
    error::OperationError,
    events::{Bus, Event, EventKind},
    requests::{OperationRef, Outcome, Request, RequestId, ResultSink},
};

/// Shared handle to a result sink.
pub(crate) type SinkRef<I, S> = Arc<dyn ResultSink<I, S>>;

pub(crate) struct Processor<I, S> {
    pub queue: Arc<RequestQueue<Request<I, S>>>,
    pub coordinator: Arc<Coordinator>,
    pub operation: OperationRef<I, S>,
    pub sink: SinkRef<I, S>,
    pub bus: Bus,
}

impl<I, S> Processor<I, S>
where
    I: RequestId,
    S: Send + 'static,
{
    /// Runs until `runtime` is cancelled.
    pub async fn run(self, runtime: CancellationToken) {
        loop {
            let token = runtime.child_token();
            let queued = match self.coordinator.claim(token.clone(), || self.queue.pop_queued()) {
                Claim::Claimed(queued) => queued,
                Claim::Closed => break,
                Claim::Empty => {
                    tokio::select! {
                        _ = runtime.cancelled() => break,
                        _ = self.queue.available() => {}
                    }
                    continue;
                }
            };
            tracing::trace!(seq = queued.seq, "claimed");

            if !self.process(queued.item, token).await {
                break;
            }
        }
        tracing::debug!("processor loop exited");
    }

    /// Processes one claimed request. Returns `false` when the loop must exit.
    async fn process(&self, request: Request<I, S>, token: CancellationToken) -> bool {
        let (id, desired) = request.into_parts();
        let label: Arc<str> = Arc::from(id.to_string());
        self.coordinator.label(Arc::clone(&label));

        let started = Instant::now();
        // Cancelled or shut down while claiming: the operation is never started.
        let end = if token.is_cancelled() {
            RaceEnd::Interrupted
        } else {
            self.bus
                .publish(Event::new(EventKind::RequestStarting).with_request(Arc::clone(&label)));
            race_operation(&self.operation, &token, id.clone(), desired).await
        };

        match (self.coordinator.settle(), end) {
            (Verdict::Cancelled { mark }, _) => {
                self.bus.publish(
                    Event::new(EventKind::RequestAbandoned)
                        .with_request(label)
                        .with_elapsed(started.elapsed()),
                );
                self.flush(mark);
                true
            }
            (Verdict::Completed, RaceEnd::Finished(res)) => {
                self.report(id, label, started, res).await;
                true
            }
            (Verdict::Completed, RaceEnd::Interrupted) => {
                tracing::debug!(request = %label, "shutdown interrupted in-flight request");
                false
            }
        }
    }

    /// Discards everything buffered up to `mark`.
    fn flush(&self, mark: u64) {
        let discarded = self.queue.drain_until(mark);
        for req in &discarded {
            tracing::trace!(request = %req.id(), "discarded by cancellation");
        }
        self.bus.publish(
            Event::new(EventKind::BacklogFlushed)
                .with_discarded(discarded.len())
                .with_pending(self.queue.len()),
        );
    }

    /// Hands the outcome to the sink, isolating sink panics.
    async fn report(
        &self,
        id: I,
        label: Arc<str>,
        started: Instant,
        res: Result<S, OperationError>,
    ) {
        let elapsed = started.elapsed();
        let (outcome, event) = match res {
            Ok(state) => (
                Outcome::Success { id, state },
                Event::new(EventKind::RequestSucceeded),
            ),
            Err(error) => {
                let ev = Event::new(EventKind::RequestFailed).with_reason(error.as_message());
                (Outcome::Failure { id, error }, ev)
            }
        };

        let delivery = std::panic::AssertUnwindSafe(self.sink.deliver(outcome));
        if delivery.catch_unwind().await.is_err() {
            tracing::warn!(request = %label, "result sink panicked");
        }
        self.bus
            .publish(event.with_request(label).with_elapsed(elapsed));
    }
}
