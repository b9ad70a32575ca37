//! Transit stop entity

use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::value_objects::{GeoLocation, NormalizedStopCode, ProductKind, stop_code};

/// A physical station or platform, as discovered through the journey planner
///
/// Identity is the backend id alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    /// Opaque, backend-specific identifier
    pub id: String,
    /// Human-readable stop name
    pub name: String,
    /// Locality the stop belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Products serving this stop
    #[serde(default)]
    pub products: BTreeSet<ProductKind>,
}

impl Stop {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: GeoLocation) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            place: None,
            latitude: location.latitude(),
            longitude: location.longitude(),
            products: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = Some(place.into());
        self
    }

    #[must_use]
    pub fn with_products(mut self, products: impl IntoIterator<Item = ProductKind>) -> Self {
        self.products = products.into_iter().collect();
        self
    }

    #[must_use]
    pub const fn location(&self) -> GeoLocation {
        GeoLocation::new_unchecked(self.latitude, self.longitude)
    }

    /// Station code for the REST backend, recomputed on every call
    #[must_use]
    pub fn stop_code(&self) -> NormalizedStopCode {
        stop_code::normalize(&self.id)
    }
}

impl PartialEq for Stop {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Stop {}

impl Hash for Stop {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn identity_is_the_id() {
        let a = Stop::new("900100003", "S+U Alexanderplatz", GeoLocation::berlin());
        let b = Stop::new("900100003", "Alexanderplatz (renamed)", GeoLocation::new_unchecked(0.0, 0.0));
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn stop_code_is_normalized_from_id() {
        let stop = Stop::new(
            "A=1@O=S+U Alexanderplatz@X=13411267@Y=52521508@U=86@L=900100003@",
            "S+U Alexanderplatz",
            GeoLocation::berlin(),
        );
        assert_eq!(stop.stop_code().as_str(), "900100003");
    }

    #[test]
    fn builder_sets_place_and_products() {
        let stop = Stop::new("1", "Zoo", GeoLocation::berlin())
            .with_place("Berlin")
            .with_products([ProductKind::Bus, ProductKind::SuburbanTrain, ProductKind::Bus]);
        assert_eq!(stop.place.as_deref(), Some("Berlin"));
        assert_eq!(stop.products.len(), 2);
        assert!(stop.products.contains(&ProductKind::SuburbanTrain));
    }
}
