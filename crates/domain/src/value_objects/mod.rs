//! Value Objects - Immutable, identity-less domain primitives

mod geo_location;
mod map_region;
mod product_kind;
pub mod stop_code;

pub use geo_location::GeoLocation;
pub use map_region::{BoundingBox, MapRegion};
pub use product_kind::ProductKind;
pub use stop_code::NormalizedStopCode;
