//! # Example: toggle
//!
//! A todo list whose "done" checkboxes are persisted by a slow remote store.
//!
//! Shows how to:
//! - Wrap a remote call in [`OpFn`] and receive outcomes through [`ChannelSink`]
//! - Submit a burst of toggles that are applied strictly one at a time
//! - Cancel mid-burst (e.g. the user navigates away) and keep using the queue
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► submit toggles for todos 1..=4
//!   ├─► todo 1 confirmed, todo 2 in flight
//!   ├─► cancel()  → todo 2 abandoned, todos 3 and 4 discarded
//!   ├─► submit toggle for todo 5 → confirmed
//!   └─► shutdown()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example toggle --features logging
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mutqueue::{
    ChannelSink, LogWriter, MutationQueueBuilder, OpFn, OperationError, Outcome, QueueConfig,
    Subscribe,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

type Store = Arc<Mutex<HashMap<u32, bool>>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let store: Store = Arc::new(Mutex::new(HashMap::new()));

    // 1. Remote call: 300ms round trip, honors the abandon signal.
    let remote = Arc::clone(&store);
    let op = OpFn::arc(move |ctx: CancellationToken, id: u32, done: bool| {
        let remote = Arc::clone(&remote);
        async move {
            tokio::select! {
                _ = ctx.cancelled() => Err(OperationError::unavailable("request abandoned")),
                _ = tokio::time::sleep(Duration::from_millis(300)) => {
                    if id == 0 {
                        return Err(OperationError::rejected("todo 0 does not exist"));
                    }
                    let mut todos = remote.lock().map_err(|_| OperationError::unavailable("store poisoned"))?;
                    todos.insert(id, done);
                    Ok(done)
                }
            }
        }
    });

    // 2. Sink and subscribers.
    let (sink, mut outcomes) = ChannelSink::new();
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let mut cfg = QueueConfig::default();
    cfg.grace = Duration::from_secs(2);
    let queue = MutationQueueBuilder::new(cfg)
        .with_subscribers(subs)
        .build(op, sink);
    let handle = queue.handle();

    // 3. A burst of toggles.
    for id in 1..=4 {
        handle.submit_parts(id, true)?;
    }
    handle.submit_parts(0, true)?;

    // 4. First toggle lands, then the user leaves the page.
    print_outcome(outcomes.recv().await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let abandoned = handle.cancel();
    println!("cancel hit an in-flight request: {abandoned}");

    // 5. Back on the page: the queue keeps working.
    handle.submit_parts(5, true)?;
    handle.submit_parts(0, false)?;
    print_outcome(outcomes.recv().await);
    print_outcome(outcomes.recv().await);

    queue.shutdown().await?;

    let todos = store.lock().map_err(|_| anyhow::anyhow!("store poisoned"))?;
    let mut done: Vec<_> = todos.iter().filter(|(_, d)| **d).map(|(id, _)| *id).collect();
    done.sort_unstable();
    println!("persisted as done: {done:?}");
    Ok(())
}

fn print_outcome(outcome: Option<Outcome<u32, bool>>) {
    match outcome {
        Some(Outcome::Success { id, state }) => println!("todo {id}: done = {state}"),
        Some(Outcome::Failure { id, error }) => println!("todo {id}: {error}"),
        None => println!("sink closed"),
    }
}
