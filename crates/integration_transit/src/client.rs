//! REST transit client via the VBB transport.rest API
//!
//! Provides live vehicle positions (radar), stop departures and trip routes
//! from [v6.vbb.transport.rest](https://v6.vbb.transport.rest). Every call is a
//! single attempt: no caching, no retry.

use std::collections::HashSet;

use async_trait::async_trait;
use domain::{BoundingBox, CancellationToken, Departure, NormalizedStopCode, TripRoute, Vehicle};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::TransitConfig;
use crate::error::TransitError;
use crate::models::{RawDeparturesResponse, RawRadarResponse, RawTripResponse};

/// Default radar look-ahead window in seconds
pub const DEFAULT_RADAR_WINDOW_SECS: u32 = 30;
/// Default departures window in seconds
pub const DEFAULT_DEPARTURES_WINDOW_SECS: u32 = 60;

const RADAR_MAX_RESULTS: &str = "500";
const DEPARTURES_MAX_RESULTS: &str = "30";

/// Trait for the REST backend serving vehicles, departures and trips
#[async_trait]
pub trait RadarClient: Send + Sync {
    /// Vehicles currently inside a bounding box
    async fn fetch_vehicles(
        &self,
        bbox: BoundingBox,
        window_secs: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vehicle>, TransitError>;

    /// Upcoming departures at a station
    async fn fetch_departures(
        &self,
        stop_code: &NormalizedStopCode,
        window_secs: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Departure>, TransitError>;

    /// Geometry and stopovers of one trip
    ///
    /// A missing route (non-2xx status) is `Ok(None)`, not an error.
    async fn fetch_trip_route(
        &self,
        trip_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<TripRoute>, TransitError>;
}

/// transport.rest client for the REST backend
#[derive(Debug, Clone)]
pub struct RemoteTransitClient {
    client: Client,
    base_url: String,
}

impl RemoteTransitClient {
    /// Create a new client with its own HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &TransitConfig) -> Result<Self, TransitError> {
        Ok(Self::with_client(config.build_http_client()?, config))
    }

    /// Create a client on a shared HTTP transport
    #[must_use]
    pub fn with_client(client: Client, config: &TransitConfig) -> Self {
        Self {
            client,
            base_url: config.radar_base_url.clone(),
        }
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransitError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TransitError::InvalidRequest(format!("base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| TransitError::InvalidRequest("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request, aborting as soon as `cancel` fires
    async fn send(
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response, TransitError> {
        ensure_active(cancel)?;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(TransitError::Cancelled),
            result = request.send() => result.map_err(|e| map_transport_error(&e)),
        }
    }

    /// Read the body of a successful response
    async fn read_body(response: Response, cancel: &CancellationToken) -> Result<String, TransitError> {
        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(TransitError::Cancelled),
            result = response.text() => result.map_err(|e| map_transport_error(&e))?,
        };
        // Skip the decode pass entirely if cancellation arrived meanwhile.
        ensure_active(cancel)?;
        Ok(body)
    }

    /// Parse a radar response into vehicles; duplicate trip ids keep the first entry
    pub(crate) fn parse_radar_response(body: &str) -> Result<Vec<Vehicle>, TransitError> {
        let raw: RawRadarResponse =
            serde_json::from_str(body).map_err(|e| TransitError::DecodeFailure(e.to_string()))?;

        let mut seen = HashSet::new();
        let vehicles = raw
            .movements
            .into_iter()
            .filter(|m| {
                let fresh = seen.insert(m.trip_id.clone());
                if !fresh {
                    warn!(trip_id = %m.trip_id, "Dropping duplicate vehicle in radar batch");
                }
                fresh
            })
            .map(crate::models::RawMovement::into_vehicle)
            .collect();
        Ok(vehicles)
    }

    pub(crate) fn parse_departures_response(
        body: &str,
        stop_code: &str,
    ) -> Result<Vec<Departure>, TransitError> {
        let raw: RawDeparturesResponse =
            serde_json::from_str(body).map_err(|e| TransitError::DecodeFailure(e.to_string()))?;

        Ok(raw
            .departures
            .into_iter()
            .map(|d| d.into_departure(stop_code))
            .collect())
    }

    pub(crate) fn parse_trip_response(body: &str) -> Result<TripRoute, TransitError> {
        let raw: RawTripResponse =
            serde_json::from_str(body).map_err(|e| TransitError::DecodeFailure(e.to_string()))?;
        Ok(raw.trip.into_route())
    }
}

#[async_trait]
impl RadarClient for RemoteTransitClient {
    #[instrument(skip(self, cancel))]
    async fn fetch_vehicles(
        &self,
        bbox: BoundingBox,
        window_secs: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vehicle>, TransitError> {
        if !bbox.is_finite() {
            return Err(TransitError::InvalidRequest(format!(
                "bounding box is not finite: {bbox:?}"
            )));
        }

        let url = self.endpoint(&["radar"])?;
        let params = [
            ("north", bbox.north.to_string()),
            ("west", bbox.west.to_string()),
            ("south", bbox.south.to_string()),
            ("east", bbox.east.to_string()),
            ("duration", window_secs.to_string()),
            ("results", RADAR_MAX_RESULTS.to_string()),
            ("frames", "1".to_string()),
            ("polylines", "false".to_string()),
        ];

        debug!(%url, "Fetching vehicles");

        let response = Self::send(self.client.get(url).query(&params), cancel).await?;
        let response = ensure_success(response)?;
        let body = Self::read_body(response, cancel).await?;
        let vehicles = Self::parse_radar_response(&body)?;

        debug!(count = vehicles.len(), "Vehicles fetched");
        Ok(vehicles)
    }

    #[instrument(skip(self, cancel), fields(stop_code = %stop_code))]
    async fn fetch_departures(
        &self,
        stop_code: &NormalizedStopCode,
        window_secs: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Departure>, TransitError> {
        if stop_code.as_str().trim().is_empty() {
            return Err(TransitError::InvalidRequest(
                "stop code must not be empty".to_string(),
            ));
        }

        let url = self.endpoint(&["stops", stop_code.as_str(), "departures"])?;
        let params = [
            ("duration", window_secs.to_string()),
            ("results", DEPARTURES_MAX_RESULTS.to_string()),
            ("linesOfStops", "false".to_string()),
            ("remarks", "false".to_string()),
        ];

        debug!(%url, "Fetching departures");

        let response = Self::send(self.client.get(url).query(&params), cancel).await?;
        let response = ensure_success(response)?;
        let body = Self::read_body(response, cancel).await?;
        let departures = Self::parse_departures_response(&body, stop_code.as_str())?;

        debug!(count = departures.len(), "Departures fetched");
        Ok(departures)
    }

    #[instrument(skip(self, cancel))]
    async fn fetch_trip_route(
        &self,
        trip_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<TripRoute>, TransitError> {
        if trip_id.trim().is_empty() {
            return Err(TransitError::InvalidRequest(
                "trip id must not be empty".to_string(),
            ));
        }

        let url = self.endpoint(&["trips", trip_id])?;
        let params = [("polyline", "true"), ("stopovers", "true")];

        debug!(%url, "Fetching trip route");

        let response = Self::send(self.client.get(url).query(&params), cancel).await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "No route available for trip");
            return Ok(None);
        }

        let body = Self::read_body(response, cancel).await?;
        let route = Self::parse_trip_response(&body)?;

        debug!(points = route.coordinates.len(), stopovers = route.stopovers.len(), "Trip route fetched");
        Ok(Some(route))
    }
}

/// Fail with `Cancelled` once the token has fired
pub(crate) fn ensure_active(cancel: &CancellationToken) -> Result<(), TransitError> {
    if cancel.is_cancelled() {
        return Err(TransitError::Cancelled);
    }
    Ok(())
}

fn ensure_success(response: Response) -> Result<Response, TransitError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(http_status_error(status))
    }
}

fn http_status_error(status: StatusCode) -> TransitError {
    TransitError::NetworkError(format!("HTTP {}", status.as_u16()))
}

/// Map a reqwest failure onto the transit error taxonomy
fn map_transport_error(err: &reqwest::Error) -> TransitError {
    if err.is_builder() {
        TransitError::InvalidRequest(err.to_string())
    } else if err.is_timeout() {
        TransitError::NetworkError(format!("request timed out: {err}"))
    } else if err.is_decode() {
        TransitError::DecodeFailure(err.to_string())
    } else {
        TransitError::NetworkError(err.to_string())
    }
}
