//! Transit adapter - Implements the stop and vehicle ports using integration_transit

use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{StopsPort, VehiclesPort};
use async_trait::async_trait;
use domain::stop_code::normalize;
use domain::{BoundingBox, CancellationToken, Departure, GeoLocation, Stop, TripRoute, Vehicle};
use integration_transit::{
    HafasRestPlanner, JourneyPlannerClient, RadarClient, RemoteTransitClient, TransitConfig,
    TransitError,
};
use tracing::{debug, instrument, warn};

/// Adapter over the REST backend (radar, departures, trips) and the journey planner
pub struct TransitAdapter {
    radar: Arc<dyn RadarClient>,
    planner: JourneyPlannerClient,
}

impl std::fmt::Debug for TransitAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitAdapter")
            .field("radar", &"RadarClient")
            .field("planner", &self.planner)
            .finish()
    }
}

impl TransitAdapter {
    pub fn new(radar: Arc<dyn RadarClient>, planner: JourneyPlannerClient) -> Self {
        Self { radar, planner }
    }

    /// Build both backends on one shared HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// fails to initialize.
    pub fn from_config(config: &TransitConfig) -> Result<Self, ApplicationError> {
        config.validate().map_err(ApplicationError::InvalidInput)?;
        let http = config.build_http_client().map_err(map_transit_error)?;

        let radar = RemoteTransitClient::with_client(http.clone(), config);
        let planner = JourneyPlannerClient::new(Arc::new(HafasRestPlanner::with_client(http, config)));

        debug!(
            radar = %config.radar_base_url,
            planner = %config.planner_base_url,
            "Transit adapter initialized"
        );
        Ok(Self::new(Arc::new(radar), planner))
    }

    /// Departures at a stop from the REST backend
    ///
    /// `stop_id` may be a planner composite id or a plain station code.
    #[instrument(skip(self, cancel))]
    pub async fn departures(
        &self,
        stop_id: &str,
        window_secs: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Departure>, ApplicationError> {
        let code = normalize(stop_id);
        debug!(code = %code.as_str(), "Normalized stop code");
        self.radar
            .fetch_departures(&code, window_secs, cancel)
            .await
            .map_err(map_transit_error)
    }

    /// Departures at a stop from the journey planner
    #[instrument(skip(self, cancel))]
    pub async fn planner_departures(
        &self,
        station_id: &str,
        max_departures: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Departure>, ApplicationError> {
        self.planner
            .departures(station_id, max_departures, cancel)
            .await
            .map_err(map_transit_error)
    }

    /// Free-text station search
    #[instrument(skip(self, cancel))]
    pub async fn search_stops(
        &self,
        query: &str,
        max_results: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Stop>, ApplicationError> {
        self.planner
            .search_locations(query, max_results, cancel)
            .await
            .map_err(map_transit_error)
    }

    /// Route geometry of a trip, `None` when the backend has no route
    #[instrument(skip(self, cancel))]
    pub async fn trip_route(
        &self,
        trip_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<TripRoute>, ApplicationError> {
        let route = self
            .radar
            .fetch_trip_route(trip_id, cancel)
            .await
            .map_err(map_transit_error)?;
        if route.is_none() {
            warn!(trip_id, "No route available for trip");
        }
        Ok(route)
    }
}

#[async_trait]
impl StopsPort for TransitAdapter {
    #[instrument(skip(self, cancel))]
    async fn nearby_stops(
        &self,
        center: GeoLocation,
        max_distance_m: u32,
        max_results: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Stop>, ApplicationError> {
        self.planner
            .nearby_stops(
                center.latitude(),
                center.longitude(),
                max_distance_m,
                max_results,
                cancel,
            )
            .await
            .map_err(map_transit_error)
    }
}

#[async_trait]
impl VehiclesPort for TransitAdapter {
    #[instrument(skip(self, cancel))]
    async fn vehicles_in(
        &self,
        bbox: BoundingBox,
        window_secs: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vehicle>, ApplicationError> {
        self.radar
            .fetch_vehicles(bbox, window_secs, cancel)
            .await
            .map_err(map_transit_error)
    }
}

/// Map a backend error onto the application error space
///
/// Cancellation stays cancellation so the polling controller can drop it
/// silently.
pub fn map_transit_error(err: TransitError) -> ApplicationError {
    match err {
        TransitError::Cancelled => ApplicationError::Cancelled,
        TransitError::InvalidRequest(_)
        | TransitError::InvalidLocation
        | TransitError::InvalidStation => ApplicationError::InvalidInput(err.to_string()),
        TransitError::NetworkError(_) | TransitError::DecodeFailure(_) | TransitError::NoData => {
            ApplicationError::ExternalService(err.to_string())
        },
    }
}
