//! Application layer - Use cases and orchestration
//!
//! Contains the transit ports and the region polling controller that keeps
//! stops and live vehicles of the visible map region up to date.

pub mod error;
pub mod polling;
pub mod ports;

pub use error::ApplicationError;
pub use polling::{PollingConfig, PollingController, PollingHandle, PollingSnapshot};
pub use ports::*;
