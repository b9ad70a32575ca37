//! Transit error types

use thiserror::Error;

/// Errors that can occur during transit operations
///
/// Display strings are user-facing and stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitError {
    /// The request could not be built (bad coordinates, unusable base URL, empty id)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure, timeout, non-2xx status or backend fault
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Response body could not be decoded
    #[error("Decode failure: {0}")]
    DecodeFailure(String),

    /// The journey planner rejected the location
    #[error("Invalid location")]
    InvalidLocation,

    /// The journey planner rejected the station id
    #[error("Invalid station")]
    InvalidStation,

    /// The backend answered without usable data
    ///
    /// Reserved for backends without a payload; empty result lists are `Ok`.
    #[error("No data available")]
    NoData,

    /// Cooperative cancellation; never reported as a network failure
    #[error("Operation cancelled")]
    Cancelled,
}

impl TransitError {
    /// Returns true if re-issuing the same operation may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkError(_))
    }

    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(TransitError::NetworkError("HTTP 503".to_string()).is_retryable());
    }

    #[test]
    fn test_non_retryable_errors() {
        assert!(!TransitError::InvalidRequest("bbox".to_string()).is_retryable());
        assert!(!TransitError::DecodeFailure("eof".to_string()).is_retryable());
        assert!(!TransitError::InvalidLocation.is_retryable());
        assert!(!TransitError::InvalidStation.is_retryable());
        assert!(!TransitError::NoData.is_retryable());
        assert!(!TransitError::Cancelled.is_retryable());
    }

    #[test]
    fn test_error_descriptions_are_stable() {
        assert_eq!(TransitError::InvalidStation.to_string(), "Invalid station");
        assert_eq!(TransitError::InvalidLocation.to_string(), "Invalid location");
        assert_eq!(TransitError::NoData.to_string(), "No data available");
        assert_eq!(
            TransitError::NetworkError("boom".to_string()).to_string(),
            "Network error: boom"
        );
        assert_eq!(
            TransitError::InvalidRequest("bad bbox".to_string()).to_string(),
            "Invalid request: bad bbox"
        );
        assert_eq!(
            TransitError::DecodeFailure("eof".to_string()).to_string(),
            "Decode failure: eof"
        );
        assert_eq!(TransitError::Cancelled.to_string(), "Operation cancelled");
    }

    #[test]
    fn test_cancelled_is_distinct() {
        assert!(TransitError::Cancelled.is_cancelled());
        assert!(!TransitError::NetworkError("cancelled".to_string()).is_cancelled());
    }
}
