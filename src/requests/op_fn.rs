//! # Function-backed remote operation (`OpFn`)
//!
//! [`OpFn`] wraps a closure `F: Fn(CancellationToken, I, S) -> Fut`, producing a
//! fresh future per request. Shared state (an HTTP client, a store) goes into
//! the closure explicitly via `Arc<...>`.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use mutqueue::{OpFn, OperationError};
//!
//! let op = OpFn::arc(|_ctx: CancellationToken, _id: u64, done: bool| async move {
//!     Ok::<_, OperationError>(done)
//! });
//! # let _ = op;
//! ```

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::OperationError;
use crate::requests::{operation::RemoteOperation, request::RequestId};

/// Function-backed remote operation.
pub struct OpFn<F, I, S> {
    f: F,
    _marker: PhantomData<fn(I, S) -> S>,
}

impl<F, Fut, I, S> OpFn<F, I, S>
where
    F: Fn(CancellationToken, I, S) -> Fut,
    Fut: Future<Output = Result<S, OperationError>>,
{
    /// Creates a new function-backed operation.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }

    /// Creates the operation and returns it behind an `Arc`.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, I, S> RemoteOperation for OpFn<F, I, S>
where
    F: Fn(CancellationToken, I, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<S, OperationError>> + Send + 'static,
    I: RequestId,
    S: Send + 'static,
{
    type Id = I;
    type State = S;

    async fn perform(&self, ctx: CancellationToken, id: I, desired: S) -> Result<S, OperationError> {
        (self.f)(ctx, id, desired).await
    }
}
