//! Per-container statistics streaming and fan-in.
//!
//! Every container gets its own subscription at a [`StatsSource`] and its own forwarding
//! task, so a stalled or closed stream of one container never blocks observation of
//! another. All forwarding tasks feed one shared channel which is drained by a single
//! writer, see [`log_stats`].
//!
//! # Key Components
//!
//! - [`Snapshot`] — A serializable measurement that knows whether it is empty.
//! - [`StatsSource`] — Opens cancellable per-container subscriptions.
//! - [`log_stats`] — Fans the subscriptions into one JSON-lines sink until cancelled.
mod collector;
mod source;

pub use collector::log_stats;
pub use source::{Snapshot, StatsSource};
