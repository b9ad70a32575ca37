//! Polling controller configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing and sizing of region polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Minimum gap between two issued fetches of one stream, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Vehicle refresh period while live tracking is on, in seconds
    #[serde(default = "default_vehicle_refresh_secs")]
    pub vehicle_refresh_secs: u64,

    /// Upper bound for the stop search radius, in meters
    #[serde(default = "default_stop_search_cap_m")]
    pub stop_search_cap_m: u32,

    /// Maximum number of stops per fetch
    #[serde(default = "default_max_stops")]
    pub max_stops: u32,

    /// Radar look-ahead window, in seconds
    #[serde(default = "default_vehicle_window_secs")]
    pub vehicle_window_secs: u32,

    /// Whether live tracking starts switched on
    #[serde(default = "default_live_on_start")]
    pub live_on_start: bool,
}

const fn default_debounce_ms() -> u64 {
    1000
}

const fn default_vehicle_refresh_secs() -> u64 {
    5
}

const fn default_stop_search_cap_m() -> u32 {
    5000
}

const fn default_max_stops() -> u32 {
    100
}

const fn default_vehicle_window_secs() -> u32 {
    30
}

const fn default_live_on_start() -> bool {
    true
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            vehicle_refresh_secs: default_vehicle_refresh_secs(),
            stop_search_cap_m: default_stop_search_cap_m(),
            max_stops: default_max_stops(),
            vehicle_window_secs: default_vehicle_window_secs(),
            live_on_start: default_live_on_start(),
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    #[must_use]
    pub const fn vehicle_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.vehicle_refresh_secs)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.vehicle_refresh_secs == 0 {
            return Err("vehicle_refresh_secs must be greater than 0".to_string());
        }
        if self.stop_search_cap_m == 0 {
            return Err("stop_search_cap_m must be greater than 0".to_string());
        }
        if self.max_stops == 0 {
            return Err("max_stops must be greater than 0".to_string());
        }
        if self.vehicle_window_secs == 0 {
            return Err("vehicle_window_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
