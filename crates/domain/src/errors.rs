//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Coordinates outside the valid latitude/longitude range
    #[error("Invalid coordinates: {latitude}, {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Map region with a non-positive or non-finite span
    #[error("Invalid map region: {0}")]
    InvalidRegion(String),

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}
