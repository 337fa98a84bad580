//! # mutqueue
//!
//! **mutqueue** serializes state-changing requests against a remote system.
//!
//! Requests are buffered in FIFO order and executed one at a time: the next
//! remote operation is started only after the previous one has settled. At any
//! moment the host may `cancel()`, which abandons the in-flight request and
//! discards everything buffered before the cancel. Each request that is not
//! abandoned produces exactly one [`Outcome`] on the host's [`ResultSink`].
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   UI / host code                              host code (teardown, navigation)
//!        │ submit(Request)                              │ cancel()
//!        ▼                                              ▼
//! ┌──────────────────┐   dequeue()   ┌──────────────────────────────┐
//! │   RequestQueue   │ ────────────► │  Processor (single consumer) │
//! │ (FIFO, seq nums) │ ◄──────────── │  Coordinator (in-flight slot)│
//! └──────────────────┘  drain_until  └───────┬──────────────┬───────┘
//!                                            │ perform()    │ Outcome
//!                                            ▼              ▼
//!                                    RemoteOperation    ResultSink
//!
//!  every step ─► Bus (broadcast) ─► listener ─► SubscriberSet ─► LogWriter / custom
//! ```
//!
//! ### Lifecycle of one request
//! ```text
//! submit ──► Buffered ──► InFlight ──┬─► Succeeded ─► sink(Success)
//!               │                    ├─► Failed    ─► sink(Failure)
//!               │                    └─► Abandoned (cancel won; nothing reported)
//!               └─► Discarded (cancel while buffered; nothing reported)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                           |
//! |-------------------|--------------------------------------------------------------|----------------------------------------------|
//! | **Queue**         | Owned queue, producer handles, shutdown.                     | [`MutationQueue`], [`QueueHandle`]           |
//! | **Operations**    | Host-supplied remote call, as a trait object or a closure.   | [`RemoteOperation`], [`OpFn`]                |
//! | **Results**       | One outcome per non-abandoned request.                       | [`Outcome`], [`ResultSink`], [`ChannelSink`] |
//! | **Subscriber API**| Observe queue events (logging, metrics, custom subscribers). | [`Subscribe`], [`Event`]                     |
//! | **Errors**        | Typed errors for operations, submission and shutdown.        | [`OperationError`], [`RuntimeError`]         |
//! | **Configuration** | Bus capacity and shutdown grace.                             | [`QueueConfig`]                              |
//!
//! ## Optional features
//! - `logging`: exports a built-in [`LogWriter`] subscriber rendering events through `tracing`.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use mutqueue::{ChannelSink, MutationQueue, OpFn, OperationError, Outcome, QueueConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Remote call: echo the desired state back as the confirmed state.
//!     let op = OpFn::arc(|_ctx: CancellationToken, _id: u32, done: bool| async move {
//!         Ok::<_, OperationError>(done)
//!     });
//!     let (sink, mut outcomes) = ChannelSink::new();
//!
//!     let queue = MutationQueue::new(QueueConfig::default(), op, sink);
//!     queue.handle().submit_parts(7, true)?;
//!
//!     if let Some(Outcome::Success { id, state }) = outcomes.recv().await {
//!         assert_eq!((id, state), (7, true));
//!     }
//!     queue.shutdown().await?;
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod requests;
mod subscribers;

// ---- Public re-exports ----

pub use config::QueueConfig;
pub use core::{MutationQueue, MutationQueueBuilder, ProcessorState, QueueHandle, RequestQueue};
pub use error::{OperationError, RuntimeError, SubmitError};
pub use events::{Bus, Event, EventKind};
pub use requests::{
    ChannelSink, OpFn, OperationRef, Outcome, RemoteOperation, Request, RequestId, ResultSink,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
