//! # Cancellation coordinator: owns the in-flight slot.
//!
//! The [`Coordinator`] tracks whether the processor is racing a remote operation
//! and decides, atomically, how that race ends.
//!
//! ## State machine
//! ```text
//!            claim()                  cancel()
//!   Idle ──────────────► Racing ───────────────────► Cancelled { mark }
//!    ▲                     │                           │   ▲
//!    │      settle()       │                           │   └── cancel(): mark raised
//!    ├──── (Completed) ◄───┘                           │ settle()
//!    └──────────────────────── (Cancelled { mark }) ◄──┘
//!
//!   any ── stop() ──► Stopped (terminal)
//! ```
//!
//! ## Rules
//! - At most one race is armed at a time (single-flight).
//! - `claim()` pops the next request under the slot lock: a request is never out
//!   of the buffer while the slot still reads `Idle`.
//! - `cancel()` while `Idle` is a no-op: nothing is remembered for the next request.
//! - Whoever takes the lock first (`cancel()` or the processor's `settle()`) decides
//!   the race. Once `cancel()` won, the request's outcome is never reported.
//! - The flush mark is captured under the lock when `cancel()` is raised, so
//!   submissions made afterwards survive the flush. Raising `cancel()` again
//!   before the processor settles moves the mark forward; it never resolves a
//!   second race.
//! - Lock order is coordinator, then queue.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio_util::sync::CancellationToken;

/// Observable state of the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessorState {
    /// Suspended on the queue, nothing in flight.
    Waiting,

    /// Exactly one request is in flight.
    Processing {
        /// Rendered id of the in-flight request.
        ///
        /// `None` for the short moment between taking the request off the
        /// queue and rendering its id.
        request: Option<Arc<str>>,
        /// When the request was taken off the queue.
        started_at: Instant,
    },

    /// The queue was shut down; the processor is gone.
    Stopped,
}

/// How a race ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// The operation's result stands and must be reported.
    Completed,
    /// Cancellation won; flush the buffer up to `mark`.
    Cancelled { mark: u64 },
}

/// Result of [`Coordinator::claim`].
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Claim<R> {
    /// The slot is armed for this request.
    Claimed(R),
    /// Nothing buffered; the slot stays idle.
    Empty,
    /// The coordinator is stopped (or unexpectedly busy); the processor must exit.
    Closed,
}

enum Slot {
    Idle,
    Racing {
        request: Option<Arc<str>>,
        started_at: Instant,
        token: CancellationToken,
    },
    Cancelled {
        request: Option<Arc<str>>,
        started_at: Instant,
        mark: u64,
    },
    Stopped,
}

/// Single-flight slot shared between the processor and queue handles.
pub(crate) struct Coordinator {
    slot: Mutex<Slot>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `Waiting → Processing`: takes the next request via `pop` and arms the race.
    ///
    /// `pop` runs under the slot lock and only while the slot is idle, so
    /// `cancel()` observes either an empty slot with the request still buffered
    /// or an armed race.
    pub fn claim<R>(&self, token: CancellationToken, pop: impl FnOnce() -> Option<R>) -> Claim<R> {
        let mut slot = self.lock();
        match *slot {
            Slot::Stopped => Claim::Closed,
            Slot::Idle => match pop() {
                Some(request) => {
                    *slot = Slot::Racing {
                        request: None,
                        started_at: Instant::now(),
                        token,
                    };
                    Claim::Claimed(request)
                }
                None => Claim::Empty,
            },
            // The processor settles every race before claiming the next one.
            Slot::Racing { .. } | Slot::Cancelled { .. } => {
                tracing::warn!("claim() while a race is outstanding");
                Claim::Closed
            }
        }
    }

    /// Attaches the rendered id to the armed race, cancelled or not.
    pub fn label(&self, label: Arc<str>) {
        if let Slot::Racing { request, .. } | Slot::Cancelled { request, .. } = &mut *self.lock() {
            *request = Some(label);
        }
    }

    /// Resolves the outstanding race via cancellation.
    ///
    /// `mark` is evaluated under the lock only if a race is armed. Returns
    /// `true` if a race was cancelled (or its flush mark raised), `false` if
    /// there was nothing to cancel.
    pub fn cancel(&self, mark: impl FnOnce() -> u64) -> bool {
        let mut slot = self.lock();
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Racing {
                request,
                started_at,
                token,
            } => {
                *slot = Slot::Cancelled {
                    request,
                    started_at,
                    mark: mark(),
                };
                token.cancel();
                true
            }
            Slot::Cancelled {
                request,
                started_at,
                mark: prev,
            } => {
                *slot = Slot::Cancelled {
                    request,
                    started_at,
                    mark: prev.max(mark()),
                };
                true
            }
            other => {
                *slot = other;
                false
            }
        }
    }

    /// `Processing → Waiting`: closes the race and reports who won it.
    pub fn settle(&self) -> Verdict {
        let mut slot = self.lock();
        match std::mem::replace(&mut *slot, Slot::Idle) {
            Slot::Cancelled { mark, .. } => Verdict::Cancelled { mark },
            Slot::Stopped => {
                *slot = Slot::Stopped;
                Verdict::Completed
            }
            Slot::Idle | Slot::Racing { .. } => Verdict::Completed,
        }
    }

    /// Moves to the terminal `Stopped` state.
    pub fn stop(&self) {
        *self.lock() = Slot::Stopped;
    }

    /// Snapshot of the current processor state.
    pub fn state(&self) -> ProcessorState {
        match &*self.lock() {
            Slot::Idle => ProcessorState::Waiting,
            Slot::Racing {
                request,
                started_at,
                ..
            }
            | Slot::Cancelled {
                request,
                started_at,
                ..
            } => ProcessorState::Processing {
                request: request.clone(),
                started_at: *started_at,
            },
            Slot::Stopped => ProcessorState::Stopped,
        }
    }
}
