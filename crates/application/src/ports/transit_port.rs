//! Transit data ports
//!
//! The polling controller reads stops and vehicles through these ports.
//! Adapters in the infrastructure layer implement them on top of the
//! journey planner and the REST backend.

use async_trait::async_trait;
use domain::{BoundingBox, CancellationToken, GeoLocation, Stop, Vehicle};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for stop discovery around a map position
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StopsPort: Send + Sync {
    /// Stations within `max_distance_m` of `center`, at most `max_results`
    ///
    /// Returns `ApplicationError::Cancelled` once `cancel` fires.
    async fn nearby_stops(
        &self,
        center: GeoLocation,
        max_distance_m: u32,
        max_results: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Stop>, ApplicationError>;
}

/// Port for live vehicle positions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VehiclesPort: Send + Sync {
    /// Vehicles inside `bbox` over the next `window_secs` seconds
    ///
    /// Each call returns a complete snapshot.
    async fn vehicles_in(
        &self,
        bbox: BoundingBox,
        window_secs: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vehicle>, ApplicationError>;
}
