//! End-to-end behavior of `MutationQueue` against a scripted remote.
//!
//! The scripted remote parks every call until the test answers it, so each test
//! decides exactly when an operation settles. Tests run on a paused clock: a
//! `timeout` only elapses once every task is idle, which makes "nothing else
//! happens" assertions deterministic.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use mutqueue::{
    ChannelSink, Event, EventKind, MutationQueue, MutationQueueBuilder, OpFn, OperationError,
    Outcome, ProcessorState, QueueConfig, RemoteOperation, RuntimeError, Subscribe, SubmitError,
};

struct Call {
    id: u32,
    desired: bool,
    reply: oneshot::Sender<Result<bool, OperationError>>,
}

impl Call {
    fn confirm(self) {
        let _ = self.reply.send(Ok(self.desired));
    }

    fn fail(self, error: OperationError) {
        let _ = self.reply.send(Err(error));
    }
}

struct ScriptedRemote {
    calls: mpsc::UnboundedSender<Call>,
    in_flight: AtomicUsize,
    peak: Arc<AtomicUsize>,
}

#[async_trait]
impl RemoteOperation for ScriptedRemote {
    type Id = u32;
    type State = bool;

    async fn perform(
        &self,
        _ctx: CancellationToken,
        id: u32,
        desired: bool,
    ) -> Result<bool, OperationError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let (reply, rx) = oneshot::channel();
        let _ = self.calls.send(Call { id, desired, reply });
        let res = rx
            .await
            .unwrap_or_else(|_| Err(OperationError::unavailable("reply dropped")));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        res
    }
}

struct Harness {
    queue: MutationQueue<u32, bool>,
    calls: mpsc::UnboundedReceiver<Call>,
    outcomes: mpsc::UnboundedReceiver<Outcome<u32, bool>>,
    peak: Arc<AtomicUsize>,
}

impl Harness {
    fn new() -> Self {
        Self::with_builder(MutationQueueBuilder::new(QueueConfig::default()))
    }

    fn with_builder(builder: MutationQueueBuilder) -> Self {
        let (tx, calls) = mpsc::unbounded_channel();
        let peak = Arc::new(AtomicUsize::new(0));
        let remote = Arc::new(ScriptedRemote {
            calls: tx,
            in_flight: AtomicUsize::new(0),
            peak: Arc::clone(&peak),
        });
        let (sink, outcomes) = ChannelSink::new();
        let queue = builder.build(remote, sink);
        Self {
            queue,
            calls,
            outcomes,
            peak,
        }
    }

    fn submit(&self, id: u32, desired: bool) {
        self.queue
            .handle()
            .submit_parts(id, desired)
            .expect("queue open");
    }

    async fn next_call(&mut self) -> Call {
        tokio::time::timeout(Duration::from_secs(1), self.calls.recv())
            .await
            .expect("operation not started in time")
            .expect("remote dropped")
    }

    async fn next_outcome(&mut self) -> Outcome<u32, bool> {
        tokio::time::timeout(Duration::from_secs(1), self.outcomes.recv())
            .await
            .expect("no outcome in time")
            .expect("sink dropped")
    }

    async fn assert_no_call(&mut self) {
        let res = tokio::time::timeout(Duration::from_secs(1), self.calls.recv()).await;
        if let Ok(Some(call)) = res {
            panic!("unexpected operation started for {}", call.id);
        }
    }

    async fn assert_no_outcome(&mut self) {
        // A closed sink (after shutdown) counts as quiet.
        let res = tokio::time::timeout(Duration::from_secs(1), self.outcomes.recv()).await;
        if let Ok(Some(outcome)) = res {
            panic!("unexpected outcome: {outcome:?}");
        }
    }
}

/// Yields until spawned tasks have had a chance to run.
async fn settle_tasks() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

#[tokio::test(start_paused = true)]
async fn requests_run_in_submission_order_one_at_a_time() {
    let mut h = Harness::new();
    for id in 1..=5 {
        h.submit(id, id % 2 == 0);
    }

    for expected in 1..=5 {
        let call = h.next_call().await;
        assert_eq!(call.id, expected);
        // Nothing else may start while this call is outstanding.
        h.assert_no_call().await;
        call.confirm();

        let outcome = h.next_outcome().await;
        assert_eq!(
            outcome,
            Outcome::Success {
                id: expected,
                state: expected % 2 == 0
            }
        );
    }
    assert_eq!(h.peak.load(Ordering::SeqCst), 1);
    assert_eq!(h.queue.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn failure_is_reported_once_and_processing_continues() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, false);

    h.next_call()
        .await
        .fail(OperationError::rejected("todo 1 is locked"));
    let outcome = h.next_outcome().await;
    assert_eq!(
        outcome,
        Outcome::Failure {
            id: 1,
            error: OperationError::rejected("todo 1 is locked"),
        }
    );

    let call = h.next_call().await;
    assert_eq!(call.id, 2);
    call.confirm();
    assert!(h.next_outcome().await.is_success());
    h.assert_no_outcome().await;
}

#[tokio::test(start_paused = true)]
async fn state_follows_the_in_flight_request() {
    let mut h = Harness::new();
    assert_eq!(h.queue.state(), ProcessorState::Waiting);

    h.submit(42, true);
    let call = h.next_call().await;
    assert!(matches!(
        h.queue.state(),
        ProcessorState::Processing { request: Some(ref request), .. } if &**request == "42"
    ));

    call.confirm();
    h.next_outcome().await;
    settle_tasks().await;
    assert_eq!(h.queue.state(), ProcessorState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn cancel_abandons_in_flight_and_discards_backlog() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, true);
    h.submit(3, true);

    let first = h.next_call().await;
    assert_eq!(first.id, 1);
    assert!(h.queue.cancel());

    // The remote answers after the cancel: the answer is ignored.
    first.confirm();

    h.assert_no_call().await;
    h.assert_no_outcome().await;
    assert_eq!(h.queue.pending(), 0);
    assert_eq!(h.queue.state(), ProcessorState::Waiting);
}

#[tokio::test(start_paused = true)]
async fn late_failure_of_abandoned_request_is_not_reported() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, true);

    let first = h.next_call().await;
    assert!(h.queue.cancel());
    first.fail(OperationError::unavailable("connection reset"));

    h.assert_no_call().await;
    h.assert_no_outcome().await;
    assert_eq!(h.queue.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn repeated_cancel_flushes_requests_submitted_in_between() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, true);
    let first = h.next_call().await;

    // Both cancels land before the processor observes the first one.
    assert!(h.queue.cancel());
    h.submit(3, true);
    assert!(h.queue.cancel());

    h.assert_no_call().await;
    h.assert_no_outcome().await;
    assert_eq!(h.queue.pending(), 0);
    drop(first);

    h.submit(4, true);
    let call = h.next_call().await;
    assert_eq!(call.id, 4);
    call.confirm();
    assert_eq!(h.next_outcome().await.id(), &4);
}

#[tokio::test(start_paused = true)]
async fn queue_resumes_after_cancel() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, true);
    let first = h.next_call().await;
    assert!(h.queue.cancel());
    settle_tasks().await;
    drop(first);

    h.submit(4, false);
    let call = h.next_call().await;
    assert_eq!(call.id, 4);
    call.confirm();
    assert_eq!(
        h.next_outcome().await,
        Outcome::Success {
            id: 4,
            state: false
        }
    );
}

#[tokio::test(start_paused = true)]
async fn submissions_after_cancel_survive_the_flush() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, true);
    let first = h.next_call().await;

    // Cancel and resubmit before the processor observes the cancel.
    assert!(h.queue.cancel());
    h.submit(3, true);

    let call = h.next_call().await;
    assert_eq!(call.id, 3);
    call.confirm();
    assert_eq!(h.next_outcome().await.id(), &3);
    drop(first);
    h.assert_no_outcome().await;
}

#[tokio::test(start_paused = true)]
async fn cancel_while_idle_is_a_noop() {
    let mut h = Harness::new();
    assert!(!h.queue.cancel());

    // Nothing is remembered: the next request runs normally.
    h.submit(1, true);
    let call = h.next_call().await;
    assert_eq!(call.id, 1);
    call.confirm();
    assert!(h.next_outcome().await.is_success());
}

#[tokio::test(start_paused = true)]
async fn unresolved_operation_stalls_queue_until_cancelled() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, true);
    let stuck = h.next_call().await;

    // No timeout: a long wait changes nothing.
    tokio::time::sleep(Duration::from_secs(3600)).await;
    h.assert_no_call().await;
    assert_eq!(h.queue.pending(), 1);
    assert!(matches!(h.queue.state(), ProcessorState::Processing { .. }));

    assert!(h.queue.cancel());
    settle_tasks().await;
    assert_eq!(h.queue.pending(), 0);

    h.submit(3, true);
    let call = h.next_call().await;
    assert_eq!(call.id, 3);
    call.confirm();
    assert_eq!(h.next_outcome().await.id(), &3);
    drop(stuck);
}

#[tokio::test(start_paused = true)]
async fn handle_cancel_from_another_task() {
    let mut h = Harness::new();
    h.submit(1, true);
    h.submit(2, true);
    let first = h.next_call().await;

    let handle = h.queue.handle();
    let hit = tokio::spawn(async move { handle.cancel() })
        .await
        .expect("cancel task");
    assert!(hit);

    h.assert_no_call().await;
    h.assert_no_outcome().await;
    drop(first);
}

#[tokio::test(start_paused = true)]
async fn panicking_operation_is_reported_as_failure() {
    let op = OpFn::arc(|_ctx: CancellationToken, id: u32, desired: bool| async move {
        if id == 13 {
            panic!("remote client exploded");
        }
        Ok::<_, OperationError>(desired)
    });
    let (sink, mut outcomes) = ChannelSink::new();
    let queue = MutationQueue::new(QueueConfig::default(), op, sink);
    queue.handle().submit_parts(13, true).expect("open");
    queue.handle().submit_parts(14, true).expect("open");

    match outcomes.recv().await {
        Some(Outcome::Failure {
            id: 13,
            error: OperationError::Panicked { info },
        }) => assert!(info.contains("exploded")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        outcomes.recv().await,
        Some(Outcome::Success {
            id: 14,
            state: true
        })
    );
}

#[tokio::test(start_paused = true)]
async fn bus_reports_abandon_and_flush() {
    let mut h = Harness::new();
    let mut events = h.queue.subscribe();
    h.submit(1, true);
    h.submit(2, true);
    h.submit(3, true);
    let first = h.next_call().await;
    assert!(h.queue.cancel());

    let mut abandoned = None;
    let flushed = loop {
        let ev = events.recv().await.expect("bus open");
        match ev.kind {
            EventKind::RequestAbandoned => abandoned = ev.request.clone(),
            EventKind::BacklogFlushed => break ev,
            _ => {}
        }
    };
    assert_eq!(abandoned.as_deref(), Some("1"));
    assert_eq!(flushed.discarded, Some(2));
    assert_eq!(flushed.pending, Some(0));
    drop(first);
}

#[tokio::test(start_paused = true)]
async fn idle_cancel_is_published_as_ignored() {
    let h = Harness::new();
    let mut events = h.queue.subscribe();
    assert!(!h.queue.cancel());
    let ev = events.recv().await.expect("bus open");
    assert_eq!(ev.kind, EventKind::CancelIgnored);
}

#[tokio::test(start_paused = true)]
async fn shutdown_closes_submissions_and_drops_backlog() {
    let mut h = Harness::new();
    let handle = h.queue.handle();
    h.submit(1, true);
    h.submit(2, true);
    let first = h.next_call().await;

    h.queue.shutdown().await.expect("clean shutdown");
    assert!(handle.is_closed());
    assert_eq!(handle.pending(), 0);
    assert_eq!(handle.state(), ProcessorState::Stopped);
    assert_eq!(handle.submit_parts(3, true), Err(SubmitError::Closed));

    first.confirm();
    h.assert_no_outcome().await;

    assert!(matches!(
        h.queue.shutdown().await,
        Err(RuntimeError::AlreadyShutdown)
    ));
}

#[derive(Default)]
struct Recorder {
    kinds: Mutex<Vec<EventKind>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.kinds.lock().expect("recorder lock").push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_the_request_lifecycle() {
    let recorder = Arc::new(Recorder::default());
    let builder =
        MutationQueueBuilder::new(QueueConfig::default()).with_subscriber(recorder.clone());
    let mut h = Harness::with_builder(builder);

    h.submit(1, true);
    h.next_call().await.confirm();
    h.next_outcome().await;
    h.queue.shutdown().await.expect("clean shutdown");

    let kinds = recorder.kinds.lock().expect("recorder lock").clone();
    assert_eq!(
        kinds,
        vec![
            EventKind::RequestQueued,
            EventKind::RequestStarting,
            EventKind::RequestSucceeded,
            EventKind::ShutdownRequested,
            EventKind::ProcessorStopped,
        ]
    );
}
