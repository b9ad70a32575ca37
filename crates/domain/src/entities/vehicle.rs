//! Live vehicle snapshot

use serde::{Deserialize, Serialize};

use super::Line;
use crate::value_objects::GeoLocation;

/// Color used for a vehicle whose line is unknown
const UNKNOWN_LINE_COLOR: &str = "#007AFF";

/// A vehicle currently in service
///
/// Vehicles are re-fetched wholesale on every poll; `trip_id` is unique within
/// one batch but carries no identity guarantee across polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub trip_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GeoLocation>,
}

impl Vehicle {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.line.as_ref().map_or("?", |l| l.label.as_str())
    }

    /// Color used to draw this vehicle's route
    #[must_use]
    pub fn route_color(&self) -> &str {
        self.line
            .as_ref()
            .map_or(UNKNOWN_LINE_COLOR, |l| l.background_color.as_str())
    }
}
