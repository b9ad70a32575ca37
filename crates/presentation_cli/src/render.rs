//! Plain-text rendering of transit records

use application::PollingSnapshot;
use domain::{ProductKind, Stop, TripRoute, Vehicle};

pub fn stop_line(stop: &Stop) -> String {
    let products = stop
        .products
        .iter()
        .map(ProductKind::label)
        .collect::<Vec<_>>()
        .join(", ");
    let place = stop
        .place
        .as_deref()
        .map(|p| format!(" ({p})"))
        .unwrap_or_default();

    if products.is_empty() {
        format!("{} {}{place} [code {}]", stop.id, stop.name, stop.stop_code())
    } else {
        format!(
            "{} {}{place} [code {}] {products}",
            stop.id,
            stop.name,
            stop.stop_code()
        )
    }
}

pub fn vehicle_line(vehicle: &Vehicle) -> String {
    let direction = vehicle.direction.as_deref().unwrap_or("?");
    let position = vehicle
        .position
        .map_or_else(|| "no position".to_string(), |p| p.to_string());
    format!(
        "{:<6} -> {direction} @ {position} {}",
        vehicle.display_name(),
        vehicle.route_color()
    )
}

pub fn route_lines(route: &TripRoute) -> Vec<String> {
    let label = route.line.as_ref().map_or("?", |l| l.label.as_str());
    let direction = route.direction.as_deref().unwrap_or("?");
    let mut lines = vec![format!(
        "{label} -> {direction}: {} points, {} stopovers",
        route.coordinates.len(),
        route.stopovers.len()
    )];

    lines.extend(route.stopovers.iter().map(|s| {
        let time = s
            .departure
            .or(s.arrival)
            .map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
        format!("  {time} {}", s.stop_name.as_deref().unwrap_or("Unknown"))
    }));
    lines
}

/// One status line per snapshot change
pub fn snapshot_line(snapshot: &PollingSnapshot) -> String {
    let mut line = format!(
        "stops: {}{} | vehicles: {}{} | live: {}",
        snapshot.stops.len(),
        if snapshot.loading_stops { " (loading)" } else { "" },
        snapshot.vehicles.len(),
        if snapshot.loading_vehicles { " (loading)" } else { "" },
        if snapshot.live { "on" } else { "off" },
    );
    if let Some(message) = &snapshot.error_message {
        line.push_str(&format!(" | error: {message}"));
    }
    line
}
