//! Journey planner client
//!
//! Maps planner records onto [`Stop`] and [`Departure`], and planner
//! outcomes onto [`TransitError`].

use std::fmt;
use std::sync::Arc;

use domain::{CancellationToken, Departure, GeoLocation, Line, ProductKind, Stop, hex_color};
use tracing::{debug, instrument, warn};

use super::{
    BackendError, NearbyLocationsResult, PlannerBackend, PlannerDeparture, PlannerLine,
    PlannerLocation, QueryDeparturesResult, SuggestLocationsResult,
};
use crate::client::ensure_active;
use crate::config::TransitConfig;
use crate::error::TransitError;
use crate::models::UNKNOWN_DESTINATION;
use crate::planner::HafasRestPlanner;

pub const DEFAULT_MAX_DISTANCE_M: u32 = 2000;
pub const DEFAULT_MAX_NEARBY: u32 = 50;
pub const DEFAULT_MAX_DEPARTURES: u32 = 20;
pub const DEFAULT_MAX_SUGGESTIONS: u32 = 20;

const UNKNOWN_NAME: &str = "Unknown";

/// Client for nearby-stop search, text search and station departures
#[derive(Clone)]
pub struct JourneyPlannerClient {
    backend: Arc<dyn PlannerBackend>,
}

impl fmt::Debug for JourneyPlannerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JourneyPlannerClient").finish_non_exhaustive()
    }
}

impl JourneyPlannerClient {
    #[must_use]
    pub fn new(backend: Arc<dyn PlannerBackend>) -> Self {
        Self { backend }
    }

    /// Client on the transport.rest HAFAS backend
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn hafas_rest(config: &TransitConfig) -> Result<Self, TransitError> {
        Ok(Self::new(Arc::new(HafasRestPlanner::new(config)?)))
    }

    /// Stations near a coordinate
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for out-of-range coordinates, `InvalidLocation` when
    /// the planner rejects the location, `Cancelled` or `NetworkError` otherwise.
    #[instrument(skip(self, cancel))]
    pub async fn nearby_stops(
        &self,
        latitude: f64,
        longitude: f64,
        max_distance_m: u32,
        max_locations: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Stop>, TransitError> {
        let center = GeoLocation::new(latitude, longitude)
            .map_err(|e| TransitError::InvalidRequest(e.to_string()))?;
        ensure_active(cancel)?;

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransitError::Cancelled),
            result = self.backend.query_nearby_locations(center, max_distance_m, max_locations) => result,
        };

        match result {
            NearbyLocationsResult::Success(locations) => {
                ensure_active(cancel)?;
                let stops = stops_from_locations(locations);
                debug!(count = stops.len(), "Nearby stops fetched");
                Ok(stops)
            },
            NearbyLocationsResult::InvalidId => Err(TransitError::InvalidLocation),
            NearbyLocationsResult::Failure(err) => Err(map_backend_error(err)),
        }
    }

    /// Departures at a planner station id
    ///
    /// # Errors
    ///
    /// `InvalidStation` when the planner rejects the id, `Cancelled` or
    /// `NetworkError` otherwise.
    #[instrument(skip(self, cancel))]
    pub async fn departures(
        &self,
        station_id: &str,
        max_departures: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Departure>, TransitError> {
        if station_id.trim().is_empty() {
            return Err(TransitError::InvalidRequest(
                "station id must not be empty".to_string(),
            ));
        }
        ensure_active(cancel)?;

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransitError::Cancelled),
            result = self.backend.query_departures(station_id, max_departures) => result,
        };

        match result {
            QueryDeparturesResult::Success(stations) => {
                ensure_active(cancel)?;
                let departures: Vec<Departure> = stations
                    .into_iter()
                    .filter(|station| {
                        let located = station.stop_location.coord.is_some();
                        if !located {
                            warn!(
                                station = ?station.stop_location.id,
                                dropped = station.departures.len(),
                                "Dropping departures of station without coordinates"
                            );
                        }
                        located
                    })
                    .flat_map(|station| {
                        let stop = station.stop_location;
                        station
                            .departures
                            .into_iter()
                            .map(move |d| departure_from_planner(d, &stop))
                    })
                    .collect();
                debug!(count = departures.len(), "Planner departures fetched");
                Ok(departures)
            },
            QueryDeparturesResult::InvalidStation => Err(TransitError::InvalidStation),
            QueryDeparturesResult::Failure(err) => Err(map_backend_error(err)),
        }
    }

    /// Free-text station search
    ///
    /// A blank query yields no results without contacting the backend.
    ///
    /// # Errors
    ///
    /// `Cancelled` or `NetworkError`.
    #[instrument(skip(self, cancel))]
    pub async fn search_locations(
        &self,
        query: &str,
        max_locations: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Stop>, TransitError> {
        ensure_active(cancel)?;
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransitError::Cancelled),
            result = self.backend.suggest_locations(query, max_locations) => result,
        };

        match result {
            SuggestLocationsResult::Success(locations) => {
                ensure_active(cancel)?;
                let stops = stops_from_locations(locations);
                debug!(count = stops.len(), "Location suggestions fetched");
                Ok(stops)
            },
            SuggestLocationsResult::Failure(err) => Err(map_backend_error(err)),
        }
    }
}

fn map_backend_error(err: BackendError) -> TransitError {
    match err {
        BackendError::Cancelled => TransitError::Cancelled,
        other => TransitError::NetworkError(other.message()),
    }
}

fn stops_from_locations(locations: Vec<PlannerLocation>) -> Vec<Stop> {
    let total = locations.len();
    let stops: Vec<Stop> = locations.into_iter().filter_map(stop_from_location).collect();
    if stops.len() < total {
        debug!(dropped = total - stops.len(), "Dropped locations without id or coordinates");
    }
    stops
}

/// A located station; `None` without id or coordinates
fn stop_from_location(location: PlannerLocation) -> Option<Stop> {
    let id = location.id?;
    let coord = location.coord?;
    let stop = Stop::new(id, location.name.unwrap_or_else(|| UNKNOWN_NAME.to_string()), coord)
        .with_products(location.products);
    Some(match location.place {
        Some(place) => stop.with_place(place),
        None => stop,
    })
}

fn line_from_planner(line: PlannerLine) -> Line {
    let label = line
        .label
        .or(line.name)
        .unwrap_or_else(|| "?".to_string());
    let style = line.style.unwrap_or_default();
    let background = style.background_color.map(hex_color);
    let foreground = style.foreground_color.map(hex_color);
    Line::new(
        line.id,
        label,
        line.product.unwrap_or(ProductKind::Bus),
        background.as_deref(),
        foreground.as_deref(),
    )
}

fn departure_from_planner(departure: PlannerDeparture, stop: &PlannerLocation) -> Departure {
    let line = line_from_planner(departure.line);
    let stop_id = stop.id.clone().unwrap_or_default();
    let id = format!(
        "{}_{}_{}",
        departure.planned_time.timestamp(),
        line.label,
        stop_id
    );
    let destination = departure
        .destination
        .and_then(|d| d.name.or(d.place))
        .unwrap_or_else(|| UNKNOWN_DESTINATION.to_string());

    Departure {
        id,
        line,
        destination,
        planned_time: Some(departure.planned_time),
        predicted_time: departure.predicted_time,
        delay_seconds: Departure::derive_delay(Some(departure.planned_time), departure.predicted_time),
        platform: departure.predicted_platform.or(departure.planned_platform),
        cancelled: departure.cancelled,
        stop_id,
        stop_name: Some(stop.name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_string())),
    }
}
