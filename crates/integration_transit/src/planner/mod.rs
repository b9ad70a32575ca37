//! Journey planner backend
//!
//! The planner speaks in HAFAS terms: composite location ids, packed RGB
//! line styles and tri-state results. [`PlannerBackend`] is the seam to the
//! backend itself; [`JourneyPlannerClient`] maps its records and results onto
//! the domain model and [`TransitError`](crate::TransitError).

mod client;
mod hafas_rest;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{GeoLocation, ProductKind};
#[cfg(test)]
use mockall::automock;

pub use client::{
    DEFAULT_MAX_DEPARTURES, DEFAULT_MAX_DISTANCE_M, DEFAULT_MAX_NEARBY, DEFAULT_MAX_SUGGESTIONS,
    JourneyPlannerClient,
};
pub use hafas_rest::HafasRestPlanner;

/// A location as the planner reports it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerLocation {
    /// Composite HAFAS id (e.g. `A=1@O=...@L=900100003@`)
    pub id: Option<String>,
    pub name: Option<String>,
    pub place: Option<String>,
    pub coord: Option<GeoLocation>,
    pub products: Vec<ProductKind>,
}

/// Packed `0xAARRGGBB` line colors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineStyle {
    pub background_color: Option<u32>,
    pub foreground_color: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlannerLine {
    pub id: Option<String>,
    pub label: Option<String>,
    pub name: Option<String>,
    pub product: Option<ProductKind>,
    pub style: Option<LineStyle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerDeparture {
    pub planned_time: DateTime<Utc>,
    pub predicted_time: Option<DateTime<Utc>>,
    pub line: PlannerLine,
    pub destination: Option<PlannerLocation>,
    pub planned_platform: Option<String>,
    pub predicted_platform: Option<String>,
    pub cancelled: bool,
}

/// Departures grouped by the station they leave from
#[derive(Debug, Clone, PartialEq)]
pub struct StationDepartures {
    pub stop_location: PlannerLocation,
    pub departures: Vec<PlannerDeparture>,
}

/// Transport-level failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkFault {
    TimedOut,
    Connect,
    Request,
    Body,
}

impl NetworkFault {
    /// Numeric code reported alongside the fault name
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::TimedOut => -1001,
            Self::Connect => -1004,
            Self::Request => -1000,
            Self::Body => -1017,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TimedOut => "timedOut",
            Self::Connect => "cannotConnectToHost",
            Self::Request => "badRequest",
            Self::Body => "cannotParseResponse",
        }
    }
}

impl fmt::Display for NetworkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.code(), self.name())
    }
}

/// Failure reported by a planner backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The call was abandoned through its cancellation token
    Cancelled,
    /// Transport-level failure
    Network { fault: NetworkFault, detail: String },
    /// Any other backend fault; `description` may be empty
    Other { description: String, debug: String },
}

impl BackendError {
    /// Most specific text available for this error
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Cancelled => "cancelled".to_string(),
            Self::Network { fault, .. } => fault.to_string(),
            Self::Other { description, debug } => {
                if description.trim().is_empty() {
                    debug.clone()
                } else {
                    description.clone()
                }
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NearbyLocationsResult {
    Success(Vec<PlannerLocation>),
    InvalidId,
    Failure(BackendError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryDeparturesResult {
    Success(Vec<StationDepartures>),
    InvalidStation,
    Failure(BackendError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SuggestLocationsResult {
    Success(Vec<PlannerLocation>),
    Failure(BackendError),
}

/// Journey planner operations consumed by [`JourneyPlannerClient`]
///
/// Implementations report outcomes in-band; they never panic on backend faults.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PlannerBackend: Send + Sync {
    /// Stations within `max_distance_m` of `center`
    async fn query_nearby_locations(
        &self,
        center: GeoLocation,
        max_distance_m: u32,
        max_locations: u32,
    ) -> NearbyLocationsResult;

    /// Upcoming departures at a station
    async fn query_departures(&self, station_id: &str, max_departures: u32)
    -> QueryDeparturesResult;

    /// Stations matching a free-text constraint
    async fn suggest_locations(&self, constraint: &str, max_locations: u32)
    -> SuggestLocationsResult;
}
