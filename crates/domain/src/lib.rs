//! Domain layer for the Berlin transit map
//!
//! Contains the transit data model (stops, vehicles, departures, lines),
//! the stop identifier normalizer bridging the two backends, and the
//! cancellation token threaded through every fetch.

pub mod cancellation;
pub mod entities;
pub mod errors;
pub mod value_objects;

pub use cancellation::CancellationToken;
pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
