//! Visible map region and the bounding box derived from it

use serde::{Deserialize, Serialize};

use super::GeoLocation;
use crate::errors::DomainError;

/// Approximate meters per degree of latitude
const METERS_PER_DEGREE: f64 = 111_000.0;

/// A north/west/south/east bounding box in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(north: f64, west: f64, south: f64, east: f64) -> Self {
        Self {
            north,
            west,
            south,
            east,
        }
    }

    /// Whether every edge is a finite number and can be put into a URL
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.north.is_finite()
            && self.west.is_finite()
            && self.south.is_finite()
            && self.east.is_finite()
    }
}

/// The region currently shown on the map: a center plus its span in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapRegion {
    pub center: GeoLocation,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl MapRegion {
    /// Create a region, rejecting non-positive or non-finite spans
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRegion` for unusable spans.
    pub fn new(
        center: GeoLocation,
        latitude_delta: f64,
        longitude_delta: f64,
    ) -> Result<Self, DomainError> {
        let usable = |d: f64| d.is_finite() && d > 0.0;
        if !usable(latitude_delta) || !usable(longitude_delta) {
            return Err(DomainError::InvalidRegion(format!(
                "span {latitude_delta} x {longitude_delta} must be positive"
            )));
        }
        Ok(Self {
            center,
            latitude_delta,
            longitude_delta,
        })
    }

    /// Default wide region over central Berlin
    #[must_use]
    pub const fn berlin() -> Self {
        Self {
            center: GeoLocation::berlin(),
            latitude_delta: 0.05,
            longitude_delta: 0.05,
        }
    }

    /// Bounding box spanning half the deltas around the center
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        let lat_half = self.latitude_delta / 2.0;
        let lon_half = self.longitude_delta / 2.0;
        BoundingBox {
            north: self.center.latitude() + lat_half,
            west: self.center.longitude() - lon_half,
            south: self.center.latitude() - lat_half,
            east: self.center.longitude() + lon_half,
        }
    }

    /// Stop search radius in meters derived from the latitude span, capped at `cap_m`
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn search_radius_m(&self, cap_m: u32) -> u32 {
        let meters = (self.latitude_delta * METERS_PER_DEGREE).max(0.0);
        if meters >= f64::from(cap_m) {
            cap_m
        } else {
            meters.round() as u32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> MapRegion {
        MapRegion::new(GeoLocation::new_unchecked(52.52, 13.40), 0.02, 0.04).unwrap()
    }

    #[test]
    fn bounding_box_spans_half_deltas() {
        let bbox = region().bounding_box();
        assert!((bbox.north - 52.53).abs() < 1e-9);
        assert!((bbox.south - 52.51).abs() < 1e-9);
        assert!((bbox.west - 13.38).abs() < 1e-9);
        assert!((bbox.east - 13.42).abs() < 1e-9);
    }

    #[test]
    fn search_radius_follows_latitude_span() {
        assert_eq!(region().search_radius_m(5000), 2220);
    }

    #[test]
    fn search_radius_is_capped() {
        let wide = MapRegion::berlin();
        assert_eq!(wide.search_radius_m(5000), 5000);
    }

    #[test]
    fn zero_span_is_rejected() {
        assert!(MapRegion::new(GeoLocation::berlin(), 0.0, 0.01).is_err());
        assert!(MapRegion::new(GeoLocation::berlin(), 0.01, f64::NAN).is_err());
    }

    #[test]
    fn bounding_box_finiteness() {
        assert!(region().bounding_box().is_finite());
        assert!(!BoundingBox::new(f64::NAN, 13.0, 52.0, 13.5).is_finite());
    }
}
