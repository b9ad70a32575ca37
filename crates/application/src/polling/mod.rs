//! Region polling
//!
//! Keeps the stops and vehicles of the visible map region fresh. The state
//! machine in [`state`] decides what to fetch; [`PollingController`] runs
//! those fetches against the ports.

mod config;
mod controller;
pub mod state;

pub use config::PollingConfig;
pub use controller::{PollingController, PollingHandle};
pub use state::{
    Effect, PollingEvent, PollingSnapshot, PollingState, RequestId, Stream, StreamPhase, reduce,
};
