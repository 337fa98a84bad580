use std::sync::{Arc, Mutex};

use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    config::QueueConfig,
    events::{Bus, EventKind},
    requests::{OperationRef, RemoteOperation, RequestId, ResultSink},
    subscribers::{Subscribe, SubscriberSet},
};

use super::{
    coordinator::Coordinator,
    mutation_queue::{MutationQueue, QueueHandle},
    processor::{Processor, SinkRef},
    queue::RequestQueue,
};

/// Builder for constructing a [`MutationQueue`] with optional subscribers.
pub struct MutationQueueBuilder {
    cfg: QueueConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl MutationQueueBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: QueueConfig) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive queue events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one event subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Builds the queue and starts its processor.
    ///
    /// Must be called from within a tokio runtime: the processor, the event
    /// listener and subscriber workers are spawned here.
    pub fn build<Op, K>(self, operation: Arc<Op>, sink: K) -> MutationQueue<Op::Id, Op::State>
    where
        Op: RemoteOperation,
        K: ResultSink<Op::Id, Op::State>,
    {
        let operation: OperationRef<Op::Id, Op::State> = operation;
        let sink: SinkRef<Op::Id, Op::State> = Arc::new(sink);
        self.build_dyn(operation, sink)
    }

    fn build_dyn<I, S>(self, operation: OperationRef<I, S>, sink: SinkRef<I, S>) -> MutationQueue<I, S>
    where
        I: RequestId,
        S: Send + 'static,
    {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime = CancellationToken::new();

        let listener = if self.subscribers.is_empty() {
            None
        } else {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            Some(spawn_listener(&bus, subs))
        };

        let handle = QueueHandle {
            queue: Arc::new(RequestQueue::new()),
            coordinator: Arc::new(Coordinator::new()),
            bus: bus.clone(),
            runtime: runtime.clone(),
        };

        let processor = Processor {
            queue: Arc::clone(&handle.queue),
            coordinator: Arc::clone(&handle.coordinator),
            operation,
            sink,
            bus,
        };
        let processor = tokio::spawn(processor.run(runtime));

        MutationQueue {
            cfg: self.cfg,
            handle,
            processor: Mutex::new(Some(processor)),
            listener: Mutex::new(listener),
        }
    }
}

impl<I, S> MutationQueue<I, S>
where
    I: RequestId,
    S: Send + 'static,
{
    /// Builds a queue without subscribers.
    ///
    /// Shorthand for `MutationQueueBuilder::new(cfg).build(operation, sink)`.
    pub fn new<Op, K>(cfg: QueueConfig, operation: Arc<Op>, sink: K) -> Self
    where
        Op: RemoteOperation<Id = I, State = S>,
        K: ResultSink<I, S>,
    {
        MutationQueueBuilder::new(cfg).build(operation, sink)
    }
}

/// Forwards bus events to the subscriber set until the processor stops.
///
/// The receiver is created before spawning so no early event is missed.
fn spawn_listener(bus: &Bus, subs: SubscriberSet) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    let last = matches!(ev.kind, EventKind::ProcessorStopped);
                    subs.emit(ev);
                    if last {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event listener lagged; events lost");
                }
                Err(RecvError::Closed) => break,
            }
        }
        subs.shutdown().await;
    })
}
