//! Infrastructure layer
//!
//! Wires the transit backends into the application ports, loads the layered
//! configuration and sets up logging.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::TransitAdapter;
pub use config::{AppConfig, ConfigError};
pub use telemetry::{LoggingConfig, TelemetryError, init_tracing};
