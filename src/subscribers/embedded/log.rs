//! # LogWriter: events as tracing records
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO mutqueue: queued request="todo-1" pending=1
//! INFO mutqueue: starting request="todo-1"
//! INFO mutqueue: succeeded request="todo-1" elapsed_ms=120
//! WARN mutqueue: abandoned request="todo-2" elapsed_ms=40
//! INFO mutqueue: backlog flushed discarded=3 pending=0
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let request = e.request.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::RequestQueued => {
                tracing::info!(target: "mutqueue", request, pending = ?e.pending, "queued");
            }
            EventKind::RequestStarting => {
                tracing::info!(target: "mutqueue", request, "starting");
            }
            EventKind::RequestSucceeded => {
                tracing::info!(target: "mutqueue", request, elapsed_ms = ?e.elapsed_ms, "succeeded");
            }
            EventKind::RequestFailed => {
                tracing::warn!(
                    target: "mutqueue",
                    request,
                    err = e.reason.as_deref().unwrap_or("unknown"),
                    elapsed_ms = ?e.elapsed_ms,
                    "failed"
                );
            }
            EventKind::RequestAbandoned => {
                tracing::warn!(target: "mutqueue", request, elapsed_ms = ?e.elapsed_ms, "abandoned");
            }
            EventKind::BacklogFlushed => {
                tracing::info!(
                    target: "mutqueue",
                    discarded = ?e.discarded,
                    pending = ?e.pending,
                    "backlog flushed"
                );
            }
            EventKind::CancelIgnored => {
                tracing::debug!(target: "mutqueue", "cancel ignored: processor idle");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "mutqueue", "shutdown requested");
            }
            EventKind::ProcessorStopped => {
                tracing::info!(target: "mutqueue", "processor stopped");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(
                    target: "mutqueue",
                    kind = ?e.kind,
                    reason = e.reason.as_deref().unwrap_or("unknown"),
                    "subscriber trouble"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
