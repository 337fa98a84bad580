//! # Remote operation abstraction.
//!
//! The [`RemoteOperation`] trait is the capability the host hands to the queue:
//! perform one state change and resolve with the new state or an error.
//! The queue treats it as opaque and calls it at most once per request.
//!
//! An operation receives a [`CancellationToken`] that is cancelled when the
//! processor abandons the request. Honoring it is optional: the queue never
//! aborts the operation, it only stops waiting on it.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::OperationError;
use crate::requests::request::RequestId;

/// # Asynchronous remote state change.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
/// use mutqueue::{OperationError, RemoteOperation};
///
/// struct CompleteTodo;
///
/// #[async_trait]
/// impl RemoteOperation for CompleteTodo {
///     type Id = u64;
///     type State = bool;
///
///     async fn perform(
///         &self,
///         _ctx: CancellationToken,
///         id: u64,
///         done: bool,
///     ) -> Result<bool, OperationError> {
///         if id == 0 {
///             return Err(OperationError::rejected("no such todo"));
///         }
///         Ok(done)
///     }
/// }
/// ```
#[async_trait]
pub trait RemoteOperation: Send + Sync + 'static {
    /// Identifier of the mutated resource.
    type Id: RequestId;
    /// Desired state on input, confirmed state on output.
    type State: Send + 'static;

    /// Performs the state change for one request.
    async fn perform(
        &self,
        ctx: CancellationToken,
        id: Self::Id,
        desired: Self::State,
    ) -> Result<Self::State, OperationError>;
}

/// Shared handle to a remote operation.
pub type OperationRef<I, S> = Arc<dyn RemoteOperation<Id = I, State = S>>;
