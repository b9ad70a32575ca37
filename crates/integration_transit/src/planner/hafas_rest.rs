//! Planner backend over the BVG transport.rest profile
//!
//! transport.rest fronts the BVG HAFAS endpoint with a JSON API. Rejected ids
//! come back as HTTP 400 or 404; every other fault is reported in-band as a
//! [`BackendError`].

use async_trait::async_trait;
use domain::{GeoLocation, ProductKind, parse_hex_color};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{
    BackendError, LineStyle, NearbyLocationsResult, NetworkFault, PlannerBackend,
    PlannerDeparture, PlannerLine, PlannerLocation, QueryDeparturesResult, StationDepartures,
    SuggestLocationsResult,
};
use crate::config::TransitConfig;
use crate::error::TransitError;
use crate::models::{RawDeparture, RawDeparturesResponse, RawLine, RawLocation, RawStop};

/// transport.rest implementation of [`PlannerBackend`]
#[derive(Debug, Clone)]
pub struct HafasRestPlanner {
    client: Client,
    base_url: String,
}

/// Response of a planner GET
enum Reply {
    Body(String),
    /// HTTP 400 or 404
    Rejected(StatusCode),
}

#[derive(Debug, Deserialize)]
struct RawErrorBody {
    msg: Option<String>,
    message: Option<String>,
}

impl HafasRestPlanner {
    /// Create a new planner backend with its own HTTP transport
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &TransitConfig) -> Result<Self, TransitError> {
        Ok(Self::with_client(config.build_http_client()?, config))
    }

    /// Create a planner backend on a shared HTTP transport
    #[must_use]
    pub fn with_client(client: Client, config: &TransitConfig) -> Self {
        Self {
            client,
            base_url: config.planner_base_url.clone(),
        }
    }

    async fn get(&self, segments: &[&str], params: &[(&str, String)]) -> Result<Reply, BackendError> {
        let mut url = Url::parse(&self.base_url).map_err(|e| BackendError::Other {
            description: "Invalid planner base URL".to_string(),
            debug: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|()| BackendError::Other {
                description: "Invalid planner base URL".to_string(),
                debug: self.base_url.clone(),
            })?
            .pop_if_empty()
            .extend(segments);

        debug!(%url, "Querying planner");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
            debug!(%status, "Planner rejected the request");
            return Ok(Reply::Rejected(status));
        }

        let body = response.text().await.map_err(|e| network_error(&e))?;
        if !status.is_success() {
            return Err(BackendError::Other {
                description: error_description(&body),
                debug: format!("HTTP {}", status.as_u16()),
            });
        }
        Ok(Reply::Body(body))
    }

    pub(crate) fn parse_locations(body: &str) -> Result<Vec<PlannerLocation>, BackendError> {
        let raw: Vec<RawStop> = serde_json::from_str(body).map_err(malformed)?;
        Ok(raw.into_iter().map(location_from_raw).collect())
    }

    /// Group departures by the station they leave from, in response order
    pub(crate) fn parse_departures(
        body: &str,
        station_id: &str,
    ) -> Result<Vec<StationDepartures>, BackendError> {
        let raw: RawDeparturesResponse = serde_json::from_str(body).map_err(malformed)?;

        let mut stations: Vec<StationDepartures> = Vec::new();
        for departure in raw.departures {
            let Some(planned_time) = departure.planned_when else {
                warn!(trip_id = %departure.trip_id, "Skipping departure without planned time");
                continue;
            };
            let (stop_location, departure) = departure_from_raw(departure, planned_time, station_id);

            match stations
                .iter_mut()
                .find(|s| s.stop_location.id == stop_location.id)
            {
                Some(station) => station.departures.push(departure),
                None => stations.push(StationDepartures {
                    stop_location,
                    departures: vec![departure],
                }),
            }
        }
        Ok(stations)
    }
}

#[async_trait]
impl PlannerBackend for HafasRestPlanner {
    #[instrument(skip(self))]
    async fn query_nearby_locations(
        &self,
        center: GeoLocation,
        max_distance_m: u32,
        max_locations: u32,
    ) -> NearbyLocationsResult {
        let params = [
            ("latitude", center.latitude().to_string()),
            ("longitude", center.longitude().to_string()),
            ("distance", max_distance_m.to_string()),
            ("results", max_locations.to_string()),
            ("stops", "true".to_string()),
            ("poi", "false".to_string()),
            ("addresses", "false".to_string()),
            ("linesOfStops", "false".to_string()),
        ];

        match self.get(&["locations", "nearby"], &params).await {
            Ok(Reply::Body(body)) => match Self::parse_locations(&body) {
                Ok(locations) => NearbyLocationsResult::Success(locations),
                Err(e) => NearbyLocationsResult::Failure(e),
            },
            Ok(Reply::Rejected(_)) => NearbyLocationsResult::InvalidId,
            Err(e) => NearbyLocationsResult::Failure(e),
        }
    }

    #[instrument(skip(self))]
    async fn query_departures(&self, station_id: &str, max_departures: u32) -> QueryDeparturesResult {
        let params = [
            ("results", max_departures.to_string()),
            ("linesOfStops", "false".to_string()),
            ("remarks", "false".to_string()),
        ];

        match self.get(&["stops", station_id, "departures"], &params).await {
            Ok(Reply::Body(body)) => match Self::parse_departures(&body, station_id) {
                Ok(stations) => QueryDeparturesResult::Success(stations),
                Err(e) => QueryDeparturesResult::Failure(e),
            },
            Ok(Reply::Rejected(_)) => QueryDeparturesResult::InvalidStation,
            Err(e) => QueryDeparturesResult::Failure(e),
        }
    }

    #[instrument(skip(self))]
    async fn suggest_locations(&self, constraint: &str, max_locations: u32) -> SuggestLocationsResult {
        let params = [
            ("query", constraint.to_string()),
            ("results", max_locations.to_string()),
            ("stops", "true".to_string()),
            ("addresses", "false".to_string()),
            ("poi", "false".to_string()),
            ("fuzzy", "true".to_string()),
        ];

        match self.get(&["locations"], &params).await {
            Ok(Reply::Body(body)) => match Self::parse_locations(&body) {
                Ok(locations) => SuggestLocationsResult::Success(locations),
                Err(e) => SuggestLocationsResult::Failure(e),
            },
            Ok(Reply::Rejected(status)) => SuggestLocationsResult::Failure(BackendError::Other {
                description: String::new(),
                debug: format!("HTTP {}", status.as_u16()),
            }),
            Err(e) => SuggestLocationsResult::Failure(e),
        }
    }
}

fn location_from_raw(raw: RawStop) -> PlannerLocation {
    let products = raw.product_kinds();
    PlannerLocation {
        id: raw.id,
        name: raw.name,
        place: None,
        coord: raw.location.map(RawLocation::to_geo),
        products,
    }
}

fn line_from_raw(raw: RawLine) -> PlannerLine {
    let style = raw.color.map(|c| LineStyle {
        background_color: c.bg.as_deref().and_then(parse_hex_color),
        foreground_color: c.fg.as_deref().and_then(parse_hex_color),
    });
    PlannerLine {
        label: raw.name.clone(),
        name: raw.name,
        product: raw.product.as_deref().and_then(ProductKind::parse_known),
        id: raw.id,
        style,
    }
}

fn departure_from_raw(
    raw: RawDeparture,
    planned_time: chrono::DateTime<chrono::Utc>,
    station_id: &str,
) -> (PlannerLocation, PlannerDeparture) {
    let stop_location = raw.stop.map_or_else(
        || PlannerLocation {
            id: Some(station_id.to_string()),
            ..Default::default()
        },
        location_from_raw,
    );

    // Headsign first, final stop as fallback.
    let destination = match (raw.direction, raw.destination) {
        (Some(direction), _) => Some(PlannerLocation {
            name: Some(direction),
            ..Default::default()
        }),
        (None, Some(stop)) => Some(location_from_raw(stop)),
        (None, None) => None,
    };

    let departure = PlannerDeparture {
        planned_time,
        predicted_time: raw.when,
        line: raw.line.map(line_from_raw).unwrap_or_default(),
        destination,
        planned_platform: raw.planned_platform,
        predicted_platform: raw.platform,
        cancelled: raw.cancelled.unwrap_or(false),
    };
    (stop_location, departure)
}

fn network_error(err: &reqwest::Error) -> BackendError {
    let fault = if err.is_timeout() {
        NetworkFault::TimedOut
    } else if err.is_connect() {
        NetworkFault::Connect
    } else if err.is_body() || err.is_decode() {
        NetworkFault::Body
    } else {
        NetworkFault::Request
    };
    BackendError::Network {
        fault,
        detail: err.to_string(),
    }
}

fn malformed(err: serde_json::Error) -> BackendError {
    BackendError::Other {
        description: String::new(),
        debug: format!("malformed planner response: {err}"),
    }
}

/// Error text from a transport.rest error body, empty if there is none
fn error_description(body: &str) -> String {
    serde_json::from_str::<RawErrorBody>(body)
        .ok()
        .and_then(|e| e.msg.or(e.message))
        .unwrap_or_default()
}
