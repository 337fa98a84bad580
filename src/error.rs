//! Error types used by the mutation queue and remote operations.
//!
//! This module defines three error enums:
//!
//! - [`OperationError`]: failures of a single remote operation (reported to the sink).
//! - [`SubmitError`]: rejected submissions (only after shutdown).
//! - [`RuntimeError`]: failures of the queue runtime itself.
//!
//! Cancellation has no variant: an abandoned request is a control-flow
//! event, not an error, and never produces a sink notification.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by a remote operation.
///
/// Tagged with the originating request id by the processor and forwarded to the
/// [`ResultSink`](crate::ResultSink) as [`Outcome::Failure`](crate::Outcome::Failure).
/// The processor never retries.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    /// The remote side refused the state change.
    #[error("rejected by remote: {error}")]
    Rejected {
        /// The underlying error message.
        error: String,
    },

    /// The remote side could not be reached or answered garbage.
    #[error("remote unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },

    /// The operation task panicked before producing a result.
    #[error("operation panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl OperationError {
    /// Shorthand for [`OperationError::Rejected`].
    pub fn rejected(error: impl Into<String>) -> Self {
        OperationError::Rejected {
            error: error.into(),
        }
    }

    /// Shorthand for [`OperationError::Unavailable`].
    pub fn unavailable(error: impl Into<String>) -> Self {
        OperationError::Unavailable {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use mutqueue::OperationError;
    ///
    /// let err = OperationError::rejected("todo 7 is locked");
    /// assert_eq!(err.as_label(), "operation_rejected");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OperationError::Rejected { .. } => "operation_rejected",
            OperationError::Unavailable { .. } => "operation_unavailable",
            OperationError::Panicked { .. } => "operation_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            OperationError::Rejected { error } => format!("rejected: {error}"),
            OperationError::Unavailable { error } => format!("unavailable: {error}"),
            OperationError::Panicked { info } => format!("panicked: {info}"),
        }
    }

    /// Indicates whether resubmitting the same request could succeed.
    ///
    /// Only [`OperationError::Unavailable`] is transient. The queue itself never
    /// resubmits; this is a hint for the host.
    pub fn is_transient(&self) -> bool {
        matches!(self, OperationError::Unavailable { .. })
    }
}

/// Error returned by [`QueueHandle::submit`](crate::QueueHandle::submit).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The queue was shut down; nothing will ever process the request.
    #[error("mutation queue closed")]
    Closed,
}

/// # Errors produced by the queue runtime.
#[non_exhaustive]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RuntimeError {
    /// The processor did not stop within the configured grace period.
    #[error("shutdown grace {grace:?} exceeded; processor still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
    },

    /// `shutdown` was already called on this queue.
    #[error("mutation queue already shut down")]
    AlreadyShutdown,
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::AlreadyShutdown => "runtime_already_shutdown",
        }
    }
}

/// Renders a panic payload (`&str` or `String` message) as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
