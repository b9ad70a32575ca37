//! Berlin transit backends
//!
//! Two backends feed the map:
//!
//! - the VBB [transport.rest](https://v6.vbb.transport.rest) REST API for live
//!   vehicle positions (radar), stop departures and trip routes, wrapped by
//!   [`RemoteTransitClient`] behind the [`RadarClient`] trait;
//! - the BVG journey planner for nearby-stop search, text search and station
//!   departures, wrapped by [`JourneyPlannerClient`] over a [`PlannerBackend`].
//!
//! The planner identifies stations with HAFAS composite ids while the REST API
//! expects plain station codes; [`domain::stop_code::normalize`] bridges the two.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain::{CancellationToken, MapRegion};
//! use integration_transit::{RadarClient, RemoteTransitClient, TransitConfig};
//!
//! let client = RemoteTransitClient::new(&TransitConfig::default())?;
//! let vehicles = client
//!     .fetch_vehicles(MapRegion::berlin().bounding_box(), 30, &CancellationToken::new())
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod models;
pub mod planner;
mod timestamps;

pub use client::{
    DEFAULT_DEPARTURES_WINDOW_SECS, DEFAULT_RADAR_WINDOW_SECS, RadarClient, RemoteTransitClient,
};
pub use config::TransitConfig;
pub use error::TransitError;
pub use planner::{
    BackendError, HafasRestPlanner, JourneyPlannerClient, NearbyLocationsResult, PlannerBackend,
    QueryDeparturesResult, SuggestLocationsResult,
};
pub use timestamps::parse_timestamp;
