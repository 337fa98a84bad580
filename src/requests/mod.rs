//! # Request-side abstractions.
//!
//! - [`Request`] - one requested state change (`id` + desired state)
//! - [`RemoteOperation`] - trait the host implements to perform a change
//! - [`OpFn`] - closure-backed [`RemoteOperation`]
//! - [`Outcome`] / [`ResultSink`] - per-request result and its receiver
//! - [`ChannelSink`] - sink backed by an unbounded channel

mod op_fn;
mod operation;
mod outcome;
mod request;

pub use op_fn::OpFn;
pub use operation::{OperationRef, RemoteOperation};
pub use outcome::{ChannelSink, Outcome, ResultSink};
pub use request::{Request, RequestId};
