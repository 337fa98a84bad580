//! Queue events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `QueueHandle` (queued, ignored cancel), the processor
//!   (starting, outcome, abandon, flush, stop), `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the fan-out listener spawned by `MutationQueueBuilder::build`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
