//! # Race one remote operation against cancellation.
//!
//! The operation is spawned as its own tokio task so that losing the race never
//! kills it: the processor only stops waiting. The operation receives the race
//! token and may stop cooperatively.
//!
//! ```text
//! spawn(op.perform(token, id, desired)) ──┐
//!                                         ├─ select! ─► Finished(result) | Interrupted
//! token.cancelled() ──────────────────────┘
//! ```
//!
//! ## Rules
//! - `Interrupted` drops the `JoinHandle` (detaches, does not abort).
//! - A panicking operation resolves as `Finished(Err(OperationError::Panicked))`.
//! - Who actually won is decided afterwards by the coordinator, not here.

use std::sync::Arc;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use crate::{
    error::{OperationError, panic_message},
    requests::{OperationRef, RequestId},
};

/// How the wait on one operation ended.
pub(crate) enum RaceEnd<S> {
    /// The operation resolved (or its task died) first.
    Finished(Result<S, OperationError>),
    /// The race token fired first.
    Interrupted,
}

/// Starts `operation` for one request and waits for it or for `token`.
pub(crate) async fn race_operation<I, S>(
    operation: &OperationRef<I, S>,
    token: &CancellationToken,
    id: I,
    desired: S,
) -> RaceEnd<S>
where
    I: RequestId,
    S: Send + 'static,
{
    let op = Arc::clone(operation);
    let ctx = token.clone();
    let mut handle = tokio::spawn(async move { op.perform(ctx, id, desired).await });

    tokio::select! {
        joined = &mut handle => RaceEnd::Finished(joined.unwrap_or_else(|e| Err(join_failure(e)))),
        _ = token.cancelled() => RaceEnd::Interrupted,
    }
}

fn join_failure(err: JoinError) -> OperationError {
    if err.is_panic() {
        OperationError::Panicked {
            info: panic_message(&*err.into_panic()),
        }
    } else {
        OperationError::unavailable("operation task aborted")
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::requests::OpFn;

    #[tokio::test]
    async fn test_finished_with_value() {
        let op: OperationRef<u64, bool> =
            OpFn::arc(|_ctx, _id: u64, done: bool| async move { Ok(!done) });
        let token = CancellationToken::new();

        match race_operation(&op, &token, 1, true).await {
            RaceEnd::Finished(res) => assert_eq!(res, Ok(false)),
            RaceEnd::Interrupted => panic!("expected Finished"),
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_failure() {
        let op: OperationRef<u64, bool> = OpFn::arc(|_ctx, id: u64, _done: bool| async move {
            if id == 1 {
                panic!("remote exploded");
            }
            Ok(true)
        });
        let token = CancellationToken::new();

        match race_operation(&op, &token, 1, true).await {
            RaceEnd::Finished(Err(OperationError::Panicked { info })) => {
                assert!(info.contains("remote exploded"));
            }
            _ => panic!("expected Panicked failure"),
        }
    }

    #[tokio::test]
    async fn test_interrupt_does_not_abort_operation() {
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<()>();
        let done_tx = std::sync::Mutex::new(Some(done_tx));
        let op: OperationRef<u64, bool> = OpFn::arc(move |_ctx, _id: u64, done: bool| {
            let tx = done_tx.lock().unwrap().take();
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                if let Some(tx) = tx {
                    let _ = tx.send(());
                }
                Ok(done)
            }
        });
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            canceller.cancel();
        });

        assert!(matches!(
            race_operation(&op, &token, 1, true).await,
            RaceEnd::Interrupted
        ));
        // detached operation still runs to completion
        tokio::time::timeout(Duration::from_secs(1), done_rx)
            .await
            .expect("operation kept running")
            .expect("sender alive");
    }
}
