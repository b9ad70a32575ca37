//! Transit service configuration

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TransitError;

/// Configuration for the transit backends (VBB REST + BVG journey planner)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitConfig {
    /// Base URL of the REST backend serving radar, departures and trips
    #[serde(default = "default_radar_base_url")]
    pub radar_base_url: String,

    /// Base URL of the journey planner backend
    #[serde(default = "default_planner_base_url")]
    pub planner_base_url: String,

    /// Idle timeout while waiting for response data, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound for a whole request including the body, in seconds
    #[serde(default = "default_resource_timeout_secs")]
    pub resource_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_radar_base_url() -> String {
    "https://v6.vbb.transport.rest".to_string()
}

fn default_planner_base_url() -> String {
    "https://v6.bvg.transport.rest".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    15
}

const fn default_resource_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("berlin-transit-map/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            radar_base_url: default_radar_base_url(),
            planner_base_url: default_planner_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            resource_timeout_secs: default_resource_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl TransitConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            request_timeout_secs: 2,
            resource_timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Point both backends at one base URL (e.g. a mock server)
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.radar_base_url = base_url.to_string();
        self.planner_base_url = base_url.to_string();
        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("radar_base_url", &self.radar_base_url),
            ("planner_base_url", &self.planner_base_url),
        ] {
            if value.is_empty() {
                return Err(format!("{name} must not be empty"));
            }
            let url = Url::parse(value).map_err(|e| format!("{name} is not a valid URL: {e}"))?;
            if url.cannot_be_a_base() {
                return Err(format!("{name} cannot be used as a base URL"));
            }
        }

        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }

        if self.resource_timeout_secs < self.request_timeout_secs {
            return Err("resource_timeout_secs must not be below request_timeout_secs".to_string());
        }

        Ok(())
    }

    /// Build the shared HTTP transport with the configured timeouts
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn build_http_client(&self) -> Result<Client, TransitError> {
        Client::builder()
            .read_timeout(Duration::from_secs(self.request_timeout_secs))
            .timeout(Duration::from_secs(self.resource_timeout_secs))
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| TransitError::NetworkError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TransitConfig::default();
        assert_eq!(config.radar_base_url, "https://v6.vbb.transport.rest");
        assert_eq!(config.planner_base_url, "https://v6.bvg.transport.rest");
        assert_eq!(config.request_timeout_secs, 15);
        assert_eq!(config.resource_timeout_secs, 30);
        assert!(config.user_agent.starts_with("berlin-transit-map/"));
    }

    #[test]
    fn test_testing_config() {
        let config = TransitConfig::for_testing();
        assert_eq!(config.request_timeout_secs, 2);
        assert_eq!(config.resource_timeout_secs, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_with_base_url() {
        let config = TransitConfig::for_testing().with_base_url("http://127.0.0.1:9999");
        assert_eq!(config.radar_base_url, "http://127.0.0.1:9999");
        assert_eq!(config.planner_base_url, "http://127.0.0.1:9999");
    }

    #[test]
    fn test_validation_success() {
        assert!(TransitConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_base_url() {
        let config = TransitConfig {
            radar_base_url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_unparseable_base_url() {
        let config = TransitConfig {
            planner_base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = TransitConfig {
            request_timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_resource_below_request_timeout() {
        let config = TransitConfig {
            request_timeout_secs: 20,
            resource_timeout_secs: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: TransitConfig =
            serde_json::from_str(r#"{ "radar_base_url": "http://localhost:3000" }"#).unwrap();
        assert_eq!(config.radar_base_url, "http://localhost:3000");
        assert_eq!(config.planner_base_url, "https://v6.bvg.transport.rest");
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_build_http_client() {
        assert!(TransitConfig::for_testing().build_http_client().is_ok());
    }
}
