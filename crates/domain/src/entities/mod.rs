//! Domain entities - transit records produced by the backends

mod departure;
mod line;
mod stop;
mod trip_route;
mod vehicle;

pub use departure::Departure;
pub use line::{Line, hex_color, parse_hex_color};
pub use stop::Stop;
pub use trip_route::{Stopover, TripRoute};
pub use vehicle::Vehicle;
