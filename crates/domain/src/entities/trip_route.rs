//! Route geometry and stop sequence of a single trip

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Line;
use crate::value_objects::GeoLocation;

/// One stop along a trip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stopover {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure: Option<DateTime<Utc>>,
}

/// The path and stopovers of a trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRoute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    /// Route points in travel order
    pub coordinates: Vec<GeoLocation>,
    pub stopovers: Vec<Stopover>,
}

impl TripRoute {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}
