//! Adapters implementing application ports

mod transit_adapter;

pub use transit_adapter::{TransitAdapter, map_transit_error};
