//! # Mutation request.
//!
//! A [`Request`] pairs an opaque identifier with the desired state of the remote
//! resource. It is created by a producer, immutable afterwards, and consumed
//! exactly once: either executed by the processor or discarded by a flush.

use std::fmt;

/// Identifier of the remote resource a request mutates.
///
/// Blanket-implemented for every clonable, displayable, thread-safe type
/// (`u64`, `String`, newtypes deriving `Display`, ...). The `Display` form is
/// what shows up in [`Event::request`](crate::Event::request).
pub trait RequestId: Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

impl<T> RequestId for T where T: Clone + fmt::Debug + fmt::Display + Send + Sync + 'static {}

/// One requested state change.
///
/// ## Example
/// ```rust
/// use mutqueue::Request;
///
/// let req = Request::new(42u64, true);
/// assert_eq!(*req.id(), 42);
/// assert!(*req.desired());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request<I, S> {
    id: I,
    desired: S,
}

impl<I, S> Request<I, S> {
    /// Creates a new request for `id` to reach the `desired` state.
    pub fn new(id: I, desired: S) -> Self {
        Self { id, desired }
    }

    /// Returns the identifier of the targeted resource.
    #[inline]
    pub fn id(&self) -> &I {
        &self.id
    }

    /// Returns the desired state.
    #[inline]
    pub fn desired(&self) -> &S {
        &self.desired
    }

    /// Splits the request into `(id, desired)`.
    #[inline]
    pub fn into_parts(self) -> (I, S) {
        (self.id, self.desired)
    }
}

impl<I, S> From<(I, S)> for Request<I, S> {
    fn from((id, desired): (I, S)) -> Self {
        Self::new(id, desired)
    }
}
