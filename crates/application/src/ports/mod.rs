//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod transit_port;

#[cfg(test)]
pub use transit_port::{MockStopsPort, MockVehiclesPort};
pub use transit_port::{StopsPort, VehiclesPort};
