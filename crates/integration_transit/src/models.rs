//! Wire models of the transport.rest API
//!
//! Raw response shapes for radar, departures, trips and locations, plus the
//! conversions into domain records. Both backends speak the same dialect, so
//! the planner backend reuses these types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use domain::{Departure, GeoLocation, Line, ProductKind, Stopover, TripRoute, Vehicle};
use serde::Deserialize;

use crate::timestamps;

/// Label used for lines the backend sends without name or id
const UNKNOWN_LABEL: &str = "?";
/// Destination text used when the backend sends none
pub(crate) const UNKNOWN_DESTINATION: &str = "Unknown";

#[derive(Debug, Deserialize)]
pub(crate) struct RawRadarResponse {
    pub movements: Vec<RawMovement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMovement {
    pub trip_id: String,
    pub line: Option<RawLine>,
    pub direction: Option<String>,
    pub location: Option<RawLocation>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawDeparturesResponse {
    pub departures: Vec<RawDeparture>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDeparture {
    pub trip_id: String,
    pub stop: Option<RawStop>,
    #[serde(default, deserialize_with = "timestamps::optional")]
    pub when: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamps::optional")]
    pub planned_when: Option<DateTime<Utc>>,
    pub delay: Option<i64>,
    pub platform: Option<String>,
    pub planned_platform: Option<String>,
    pub direction: Option<String>,
    pub destination: Option<RawStop>,
    pub line: Option<RawLine>,
    pub cancelled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTripResponse {
    pub trip: RawTrip,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTrip {
    pub id: Option<String>,
    pub line: Option<RawLine>,
    pub direction: Option<String>,
    pub polyline: Option<RawFeatureCollection>,
    pub stopovers: Option<Vec<RawStopover>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFeatureCollection {
    pub features: Option<Vec<RawFeature>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawFeature {
    pub geometry: Option<RawGeometry>,
}

/// GeoJSON geometry; coordinates stay untyped so non-point features decode too
#[derive(Debug, Deserialize)]
pub(crate) struct RawGeometry {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub coordinates: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStopover {
    pub stop: Option<RawStop>,
    #[serde(default, deserialize_with = "timestamps::optional")]
    pub arrival: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "timestamps::optional")]
    pub departure: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStop {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<RawLocation>,
    pub products: Option<BTreeMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct RawLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawLine {
    pub id: Option<String>,
    pub name: Option<String>,
    pub product: Option<String>,
    pub color: Option<RawLineColor>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLineColor {
    pub fg: Option<String>,
    pub bg: Option<String>,
}

impl RawLocation {
    pub(crate) const fn to_geo(self) -> GeoLocation {
        GeoLocation::new_unchecked(self.latitude, self.longitude)
    }
}

impl RawStop {
    /// Products flagged `true`; unknown product keys are ignored
    pub(crate) fn product_kinds(&self) -> Vec<ProductKind> {
        self.products
            .iter()
            .flatten()
            .filter(|(_, served)| **served)
            .filter_map(|(key, _)| ProductKind::parse_known(key))
            .collect()
    }
}

impl RawLine {
    pub(crate) fn into_line(self) -> Line {
        let label = self
            .name
            .clone()
            .or_else(|| self.id.clone())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        let product = ProductKind::from_backend(self.product.as_deref().unwrap_or_default());
        let (bg, fg) = self
            .color
            .map_or((None, None), |c| (c.bg, c.fg));
        Line::new(self.id, label, product, bg.as_deref(), fg.as_deref())
    }
}

/// Line placeholder for records the backend sends without line data
pub(crate) fn unknown_line() -> Line {
    Line::new(None, UNKNOWN_LABEL, ProductKind::Bus, None, None)
}

impl RawMovement {
    pub(crate) fn into_vehicle(self) -> Vehicle {
        Vehicle {
            trip_id: self.trip_id,
            line: self.line.map(RawLine::into_line),
            direction: self.direction,
            position: self.location.map(RawLocation::to_geo),
        }
    }
}

impl RawDeparture {
    /// Convert into a domain departure; `requested_stop` fills in a missing stop id
    pub(crate) fn into_departure(self, requested_stop: &str) -> Departure {
        let (stop_id, stop_name) = self
            .stop
            .map_or((None, None), |s| (s.id, s.name));
        let delay_seconds = self
            .delay
            .or_else(|| Departure::derive_delay(self.planned_when, self.when));

        Departure {
            id: self.trip_id,
            line: self.line.map_or_else(unknown_line, RawLine::into_line),
            destination: self
                .direction
                .or_else(|| self.destination.and_then(|d| d.name))
                .unwrap_or_else(|| UNKNOWN_DESTINATION.to_string()),
            planned_time: self.planned_when,
            predicted_time: self.when,
            delay_seconds,
            platform: self.platform.or(self.planned_platform),
            cancelled: self.cancelled.unwrap_or(false),
            stop_id: stop_id.unwrap_or_else(|| requested_stop.to_string()),
            stop_name,
        }
    }
}

impl RawGeometry {
    /// The `(lat, lon)` of a point geometry, if this is one
    fn point(&self) -> Option<GeoLocation> {
        if self.kind.as_deref().is_some_and(|k| k != "Point") {
            return None;
        }
        let position: Vec<f64> = self
            .coordinates
            .as_ref()?
            .as_array()?
            .iter()
            .map(serde_json::Value::as_f64)
            .collect::<Option<_>>()?;
        GeoLocation::from_geojson_position(&position)
    }
}

impl RawTrip {
    pub(crate) fn into_route(self) -> TripRoute {
        let coordinates = self
            .polyline
            .and_then(|p| p.features)
            .unwrap_or_default()
            .iter()
            .filter_map(|f| f.geometry.as_ref().and_then(RawGeometry::point))
            .collect();

        let stopovers = self
            .stopovers
            .unwrap_or_default()
            .into_iter()
            .map(|s| {
                let (stop_id, stop_name) = s.stop.map_or((None, None), |st| (st.id, st.name));
                Stopover {
                    stop_id,
                    stop_name,
                    arrival: s.arrival,
                    departure: s.departure,
                }
            })
            .collect();

        TripRoute {
            id: self.id,
            line: self.line.map(RawLine::into_line),
            direction: self.direction,
            coordinates,
            stopovers,
        }
    }
}
