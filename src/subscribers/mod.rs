//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that delivers runtime events published on the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Task ── publish(Event) ──► Bus ──► Runner listener ──► SubscriberSet::emit()
//!                                                        ┌─────────┼─────────┐
//!                                                        ▼         ▼         ▼
//!                                                    LogWriter  Metrics   Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscriber;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscriber::Subscribe;
