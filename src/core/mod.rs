//! Queue core: buffer, single-flight coordination and the serial processor.
//!
//! The public API from this module is [`MutationQueue`], its [`QueueHandle`],
//! the [`MutationQueueBuilder`], the standalone [`RequestQueue`] and the
//! observable [`ProcessorState`].
//!
//! Internal modules:
//! - [`queue`]: unbounded FIFO with suspend-on-empty `dequeue` and scoped drains;
//! - [`coordinator`]: in-flight slot; decides completion vs cancellation atomically;
//! - [`runner`]: spawns one remote operation and races it against a token;
//! - [`processor`]: the consumer loop reporting outcomes and flushing on cancel;
//! - [`mutation_queue`]: owned queue object, handles and shutdown;
//! - [`builder`]: wiring of bus, subscribers and processor.

mod builder;
mod coordinator;
mod mutation_queue;
mod processor;
mod queue;
mod runner;

pub use builder::MutationQueueBuilder;
pub use coordinator::ProcessorState;
pub use mutation_queue::{MutationQueue, QueueHandle};
pub use queue::RequestQueue;
