//! Live (synchronous multiplayer) quiz sessions.
//!
//! Game state is synchronised by polling rather than push: every controller
//! treats its local state as a cache that the next poll overwrites.

pub mod flow;
pub mod game;
pub mod lobby;
pub mod poller;

#[cfg(test)]
pub(crate) mod mock;

pub use flow::{FlowState, PollIntervals, Screen, SessionFlow};
