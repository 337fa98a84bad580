//! # Per-request outcome and the sink that receives it.
//!
//! Every request that was actually processed produces exactly one [`Outcome`],
//! delivered to the host's [`ResultSink`]. Flushed and abandoned requests
//! produce nothing.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::OperationError;

/// Result of one processed request, tagged with its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<I, S> {
    /// The remote operation resolved with the new state.
    Success {
        /// Id of the request.
        id: I,
        /// State reported by the remote.
        state: S,
    },
    /// The remote operation failed.
    Failure {
        /// Id of the request.
        id: I,
        /// Failure reported by (or on behalf of) the remote.
        error: OperationError,
    },
}

impl<I, S> Outcome<I, S> {
    /// Returns the id of the request this outcome belongs to.
    pub fn id(&self) -> &I {
        match self {
            Outcome::Success { id, .. } | Outcome::Failure { id, .. } => id,
        }
    }

    /// True for [`Outcome::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Converts into a plain `Result`, dropping the id.
    pub fn into_result(self) -> Result<S, OperationError> {
        match self {
            Outcome::Success { state, .. } => Ok(state),
            Outcome::Failure { error, .. } => Err(error),
        }
    }
}

/// Receiver of per-request outcomes.
///
/// Called by the processor before it picks the next request, so a slow sink
/// delays the queue. Implementations should hand off quickly (a channel send,
/// a state update) and must not panic.
#[async_trait]
pub trait ResultSink<I, S>: Send + Sync + 'static {
    /// Receives the outcome of one processed request.
    async fn deliver(&self, outcome: Outcome<I, S>);
}

/// Sink forwarding outcomes into an unbounded channel.
///
/// ## Example
/// ```rust
/// use mutqueue::{ChannelSink, Outcome};
///
/// let (sink, mut outcomes) = ChannelSink::<u64, bool>::new();
/// # let _ = (sink, &mut outcomes);
/// ```
pub struct ChannelSink<I, S> {
    tx: mpsc::UnboundedSender<Outcome<I, S>>,
}

impl<I, S> ChannelSink<I, S> {
    /// Creates a sink and the receiver its outcomes arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outcome<I, S>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl<I, S> ResultSink<I, S> for ChannelSink<I, S>
where
    I: Send + 'static,
    S: Send + 'static,
{
    async fn deliver(&self, outcome: Outcome<I, S>) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("outcome receiver dropped; discarding outcome");
        }
    }
}
