//! Application configuration
//!
//! Sources are layered, later ones winning:
//!
//! 1. built-in defaults,
//! 2. `transit-map.toml` in the working directory (optional) or an explicit file,
//! 3. environment variables prefixed with `TRANSITMAP_`, nested with `__`
//!    (e.g. `TRANSITMAP_POLLING__DEBOUNCE_MS=500`).

use std::path::Path;

use application::PollingConfig;
use integration_transit::TransitConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::telemetry::LoggingConfig;

const DEFAULT_CONFIG_FILE: &str = "transit-map";
const ENV_PREFIX: &str = "TRANSITMAP";

/// Errors while loading the configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub transit: TransitConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load and validate the layered configuration
    ///
    /// An explicit `path` must exist; the default file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or parsed, or if the
    /// result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, config::Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(
        path: Option<&Path>,
        env: config::Environment,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate().map_err(ConfigError::Invalid)?;
        debug!(?path, "Configuration loaded");
        Ok(config)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first failing section's message, prefixed with its name.
    pub fn validate(&self) -> Result<(), String> {
        self.transit
            .validate()
            .map_err(|e| format!("transit: {e}"))?;
        self.polling
            .validate()
            .map_err(|e| format!("polling: {e}"))?;
        Ok(())
    }
}
