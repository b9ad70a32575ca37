//! Departure events from a stop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Line;

/// A scheduled or predicted departure from a stop
///
/// Built from either backend's departure shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Departure {
    pub id: String,
    pub line: Line,
    /// Destination or direction text
    pub destination: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_time: Option<DateTime<Utc>>,
    /// Real-time prediction, if available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_time: Option<DateTime<Utc>>,
    /// Delay in seconds (None = unknown, 0 = on time)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default)]
    pub cancelled: bool,
    pub stop_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_name: Option<String>,
}

impl Departure {
    /// Delay derived from the two timestamps when both are known
    #[must_use]
    pub fn derive_delay(
        planned: Option<DateTime<Utc>>,
        predicted: Option<DateTime<Utc>>,
    ) -> Option<i64> {
        match (planned, predicted) {
            (Some(planned), Some(predicted)) => Some((predicted - planned).num_seconds()),
            _ => None,
        }
    }

    /// Predicted time if known, else the planned time
    #[must_use]
    pub fn display_time(&self) -> Option<DateTime<Utc>> {
        self.predicted_time.or(self.planned_time)
    }

    /// Delay in whole minutes, truncated toward zero
    #[must_use]
    pub fn delay_minutes(&self) -> Option<i64> {
        self.delay_seconds.map(|s| s / 60)
    }

    /// Format as a compact one-line summary
    #[must_use]
    pub fn format_summary(&self) -> String {
        let time = self
            .display_time()
            .map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
        let platform = self
            .platform
            .as_deref()
            .map(|p| format!(" Gl.{p}"))
            .unwrap_or_default();
        let status = if self.cancelled {
            " cancelled".to_string()
        } else {
            match self.delay_minutes() {
                Some(m) if m > 0 => format!(" +{m}min"),
                Some(m) if m < 0 => format!(" {m}min"),
                _ => String::new(),
            }
        };

        format!(
            "{time} {} → {}{platform}{status}",
            self.line.label, self.destination
        )
    }
}
