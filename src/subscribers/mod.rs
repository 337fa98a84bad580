//! # Event subscribers for the mutation queue.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! built-in implementations for handling events broadcast through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Processor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit
//!                                                         │
//!                                              ┌──────────┼──────────┐
//!                                              ▼          ▼          ▼
//!                                          LogWriter   Metrics    Custom
//! ```

mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
