//! Region polling state machine
//!
//! [`PollingState::apply`] is a pure transition: it consumes one
//! [`PollingEvent`] and returns the [`Effect`]s the driver has to run. Time is
//! carried in the events, so the reducer never reads a clock.
//!
//! Each stream (stops, vehicles) is either idle or fetching exactly one
//! request. A trigger is dropped while its stream is fetching, or when the
//! last issued fetch of that stream is younger than the debounce interval.

use domain::{BoundingBox, GeoLocation, MapRegion, Stop, Vehicle};
use tokio::time::Instant;
use tracing::debug;

use super::config::PollingConfig;
use crate::error::ApplicationError;

/// Identifies one issued fetch
pub type RequestId = u64;

/// The two independently polled result sets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stops,
    Vehicles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Fetching { request: RequestId },
}

/// Inputs to the state machine
#[derive(Debug)]
pub enum PollingEvent {
    /// The visible map region settled
    RegionChanged { region: MapRegion, at: Instant },
    /// Periodic vehicle refresh
    TimerTick { at: Instant },
    /// Re-run the stop fetch (and the vehicle fetch when live) for the last region
    Retry { at: Instant },
    SetLive { live: bool, at: Instant },
    DismissError,
    StopsLoaded {
        request: RequestId,
        result: Result<Vec<Stop>, ApplicationError>,
    },
    VehiclesLoaded {
        request: RequestId,
        result: Result<Vec<Vehicle>, ApplicationError>,
    },
    /// Cancel in-flight work and ignore further triggers
    Shutdown,
}

/// Work requested from the driver
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchStops {
        request: RequestId,
        center: GeoLocation,
        radius_m: u32,
        max_results: u32,
    },
    FetchVehicles {
        request: RequestId,
        bbox: BoundingBox,
        window_secs: u32,
    },
    Cancel { request: RequestId },
}

#[derive(Debug, Clone)]
struct StreamState<T> {
    phase: StreamPhase,
    last_issued: Option<Instant>,
    items: Vec<T>,
}

impl<T> StreamState<T> {
    const fn new() -> Self {
        Self {
            phase: StreamPhase::Idle,
            last_issued: None,
            items: Vec::new(),
        }
    }

    const fn is_fetching(&self) -> bool {
        matches!(self.phase, StreamPhase::Fetching { .. })
    }

    /// Whether a trigger at `at` may issue a fetch
    fn accepts(&self, at: Instant, debounce: std::time::Duration) -> bool {
        if self.is_fetching() {
            return false;
        }
        self.last_issued
            .is_none_or(|last| at.saturating_duration_since(last) >= debounce)
    }

    fn issue(&mut self, request: RequestId, at: Instant) {
        self.phase = StreamPhase::Fetching { request };
        self.last_issued = Some(at);
    }

    /// Return to idle if `request` is the one in flight
    fn complete(&mut self, request: RequestId) -> bool {
        if self.phase == (StreamPhase::Fetching { request }) {
            self.phase = StreamPhase::Idle;
            true
        } else {
            false
        }
    }

    fn take_in_flight(&mut self) -> Option<RequestId> {
        match std::mem::replace(&mut self.phase, StreamPhase::Idle) {
            StreamPhase::Fetching { request } => Some(request),
            StreamPhase::Idle => None,
        }
    }
}

/// Observable view of the controller state
#[derive(Debug, Clone, PartialEq)]
pub struct PollingSnapshot {
    pub region: Option<MapRegion>,
    pub live: bool,
    pub stops: Vec<Stop>,
    pub vehicles: Vec<Vehicle>,
    pub error_message: Option<String>,
    pub loading_stops: bool,
    pub loading_vehicles: bool,
}

/// State owned by the polling driver
#[derive(Debug, Clone)]
pub struct PollingState {
    config: PollingConfig,
    region: Option<MapRegion>,
    live: bool,
    stops: StreamState<Stop>,
    vehicles: StreamState<Vehicle>,
    error_message: Option<String>,
    next_request: RequestId,
    shut_down: bool,
}

/// Apply one event to `state`
#[must_use]
pub fn reduce(mut state: PollingState, event: PollingEvent) -> (PollingState, Vec<Effect>) {
    let effects = state.apply(event);
    (state, effects)
}

impl PollingState {
    #[must_use]
    pub const fn new(config: PollingConfig) -> Self {
        let live = config.live_on_start;
        Self {
            config,
            region: None,
            live,
            stops: StreamState::new(),
            vehicles: StreamState::new(),
            error_message: None,
            next_request: 1,
            shut_down: false,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &PollingConfig {
        &self.config
    }

    #[must_use]
    pub const fn region(&self) -> Option<&MapRegion> {
        self.region.as_ref()
    }

    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.live
    }

    #[must_use]
    pub fn stops(&self) -> &[Stop] {
        &self.stops.items
    }

    #[must_use]
    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles.items
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    #[must_use]
    pub const fn phase(&self, stream: Stream) -> StreamPhase {
        match stream {
            Stream::Stops => self.stops.phase,
            Stream::Vehicles => self.vehicles.phase,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PollingSnapshot {
        PollingSnapshot {
            region: self.region,
            live: self.live,
            stops: self.stops.items.clone(),
            vehicles: self.vehicles.items.clone(),
            error_message: self.error_message.clone(),
            loading_stops: self.stops.is_fetching(),
            loading_vehicles: self.vehicles.is_fetching(),
        }
    }

    /// Apply one event, returning the effects to run
    pub fn apply(&mut self, event: PollingEvent) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.shut_down {
            debug!(?event, "Ignoring event after shutdown");
            return effects;
        }

        match event {
            PollingEvent::RegionChanged { region, at } => {
                let first = self.region.is_none();
                self.region = Some(region);
                effects.extend(self.trigger_stops(at));
                if first && self.live {
                    effects.extend(self.trigger_vehicles(at));
                }
            },
            PollingEvent::TimerTick { at } => {
                if self.live {
                    effects.extend(self.trigger_vehicles(at));
                }
            },
            PollingEvent::Retry { at } => {
                effects.extend(self.trigger_stops(at));
                if self.live {
                    effects.extend(self.trigger_vehicles(at));
                }
            },
            PollingEvent::SetLive { live, at } => {
                let switched_on = live && !self.live;
                self.live = live;
                if switched_on {
                    effects.extend(self.trigger_vehicles(at));
                }
            },
            PollingEvent::DismissError => self.error_message = None,
            PollingEvent::StopsLoaded { request, result } => {
                if !self.stops.complete(request) {
                    debug!(request, "Ignoring stale stop result");
                    return effects;
                }
                match result {
                    Ok(stops) => self.stops.items = stops,
                    Err(ApplicationError::Cancelled) => {},
                    Err(err) => self.error_message = Some(err.user_message()),
                }
            },
            PollingEvent::VehiclesLoaded { request, result } => {
                if !self.vehicles.complete(request) {
                    debug!(request, "Ignoring stale vehicle result");
                    return effects;
                }
                match result {
                    Ok(vehicles) => self.vehicles.items = vehicles,
                    Err(ApplicationError::Cancelled) => {},
                    Err(err) => {
                        self.error_message =
                            Some(format!("Failed to load vehicles: {}", err.user_message()));
                    },
                }
            },
            PollingEvent::Shutdown => {
                self.shut_down = true;
                effects.extend(
                    [self.stops.take_in_flight(), self.vehicles.take_in_flight()]
                        .into_iter()
                        .flatten()
                        .map(|request| Effect::Cancel { request }),
                );
            },
        }
        effects
    }

    const fn next_request_id(&mut self) -> RequestId {
        let id = self.next_request;
        self.next_request += 1;
        id
    }

    fn trigger_stops(&mut self, at: Instant) -> Option<Effect> {
        let region = self.region?;
        if !self.stops.accepts(at, self.config.debounce()) {
            debug!("Stop fetch coalesced");
            return None;
        }

        let request = self.next_request_id();
        self.stops.issue(request, at);
        self.error_message = None;
        Some(Effect::FetchStops {
            request,
            center: region.center,
            radius_m: region.search_radius_m(self.config.stop_search_cap_m),
            max_results: self.config.max_stops,
        })
    }

    fn trigger_vehicles(&mut self, at: Instant) -> Option<Effect> {
        let region = self.region?;
        if !self.vehicles.accepts(at, self.config.debounce()) {
            debug!("Vehicle fetch coalesced");
            return None;
        }

        let request = self.next_request_id();
        self.vehicles.issue(request, at);
        Some(Effect::FetchVehicles {
            request,
            bbox: region.bounding_box(),
            window_secs: self.config.vehicle_window_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn region() -> MapRegion {
        MapRegion::berlin()
    }

    fn moved_region() -> MapRegion {
        MapRegion::new(GeoLocation::new_unchecked(52.50, 13.33), 0.02, 0.02).unwrap()
    }

    fn stop(id: &str) -> Stop {
        Stop::new(id, id, GeoLocation::berlin())
    }

    fn vehicle(trip_id: &str) -> Vehicle {
        Vehicle {
            trip_id: trip_id.to_string(),
            line: None,
            direction: None,
            position: Some(GeoLocation::berlin()),
        }
    }

    fn fetch_stops_request(effects: &[Effect]) -> RequestId {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchStops { request, .. } => Some(*request),
                _ => None,
            })
            .expect("expected a stop fetch")
    }

    fn fetch_vehicles_request(effects: &[Effect]) -> RequestId {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchVehicles { request, .. } => Some(*request),
                _ => None,
            })
            .expect("expected a vehicle fetch")
    }

    fn count_stop_fetches(effects: &[Effect]) -> usize {
        effects.iter().filter(|e| matches!(e, Effect::FetchStops { .. })).count()
    }

    fn count_vehicle_fetches(effects: &[Effect]) -> usize {
        effects.iter().filter(|e| matches!(e, Effect::FetchVehicles { .. })).count()
    }

    /// State with a settled first region and both initial fetches completed
    fn settled(t0: Instant) -> PollingState {
        let mut state = PollingState::new(PollingConfig::default());
        let effects = state.apply(PollingEvent::RegionChanged { region: region(), at: t0 });
        let stops_req = fetch_stops_request(&effects);
        let vehicles_req = fetch_vehicles_request(&effects);
        state.apply(PollingEvent::StopsLoaded {
            request: stops_req,
            result: Ok(vec![stop("a"), stop("b")]),
        });
        state.apply(PollingEvent::VehiclesLoaded {
            request: vehicles_req,
            result: Ok(vec![vehicle("t1")]),
        });
        state
    }

    #[test]
    fn first_region_fetches_both_streams() {
        let t0 = Instant::now();
        let mut state = PollingState::new(PollingConfig::default());
        let effects = state.apply(PollingEvent::RegionChanged { region: region(), at: t0 });

        assert_eq!(effects.len(), 2);
        match &effects[0] {
            Effect::FetchStops { center, radius_m, max_results, .. } => {
                assert_eq!(*center, region().center);
                assert_eq!(*radius_m, region().search_radius_m(5000));
                assert_eq!(*max_results, 100);
            },
            other => panic!("unexpected effect {other:?}"),
        }
        match &effects[1] {
            Effect::FetchVehicles { bbox, window_secs, .. } => {
                assert_eq!(*bbox, region().bounding_box());
                assert_eq!(*window_secs, 30);
            },
            other => panic!("unexpected effect {other:?}"),
        }
        assert!(state.snapshot().loading_stops);
        assert!(state.snapshot().loading_vehicles);
    }

    #[test]
    fn first_region_without_live_fetches_stops_only() {
        let config = PollingConfig {
            live_on_start: false,
            ..Default::default()
        };
        let mut state = PollingState::new(config);
        let effects = state.apply(PollingEvent::RegionChanged {
            region: region(),
            at: Instant::now(),
        });
        assert_eq!(count_stop_fetches(&effects), 1);
        assert_eq!(count_vehicle_fetches(&effects), 0);
    }

    #[test]
    fn later_region_changes_fetch_stops_only() {
        let t0 = Instant::now();
        let mut state = settled(t0);
        let effects = state.apply(PollingEvent::RegionChanged {
            region: moved_region(),
            at: t0 + Duration::from_secs(2),
        });
        assert_eq!(count_stop_fetches(&effects), 1);
        assert_eq!(count_vehicle_fetches(&effects), 0);
    }

    #[test]
    fn triggers_within_debounce_are_dropped() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let effects = state.apply(PollingEvent::RegionChanged {
            region: moved_region(),
            at: t0 + Duration::from_millis(400),
        });
        assert!(effects.is_empty());
        // The region is still remembered for a later retry.
        assert_eq!(state.region(), Some(&moved_region()));

        let effects = state.apply(PollingEvent::RegionChanged {
            region: moved_region(),
            at: t0 + Duration::from_millis(1000),
        });
        assert_eq!(count_stop_fetches(&effects), 1);
    }

    #[test]
    fn triggers_while_fetching_are_coalesced() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let first = state.apply(PollingEvent::RegionChanged {
            region: moved_region(),
            at: t0 + Duration::from_secs(2),
        });
        assert_eq!(count_stop_fetches(&first), 1);

        let second = state.apply(PollingEvent::RegionChanged {
            region: region(),
            at: t0 + Duration::from_secs(10),
        });
        assert!(second.is_empty());
        assert_eq!(
            state.phase(Stream::Stops),
            StreamPhase::Fetching { request: fetch_stops_request(&first) }
        );
    }

    #[test]
    fn dropped_triggers_do_not_restart_debounce() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        // Dropped at +0.5s; the window still counts from t0.
        assert!(state.apply(PollingEvent::Retry { at: t0 + Duration::from_millis(500) }).is_empty());
        let effects = state.apply(PollingEvent::Retry { at: t0 + Duration::from_millis(1100) });
        assert_eq!(count_stop_fetches(&effects), 1);
    }

    #[test]
    fn timer_ticks_fetch_vehicles_only_when_live() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let effects = state.apply(PollingEvent::TimerTick { at: t0 + Duration::from_secs(5) });
        assert_eq!(count_vehicle_fetches(&effects), 1);
        state.apply(PollingEvent::VehiclesLoaded {
            request: fetch_vehicles_request(&effects),
            result: Ok(vec![]),
        });

        state.apply(PollingEvent::SetLive { live: false, at: t0 + Duration::from_secs(6) });
        let effects = state.apply(PollingEvent::TimerTick { at: t0 + Duration::from_secs(10) });
        assert!(effects.is_empty());
    }

    #[test]
    fn switching_live_on_fetches_vehicles_immediately() {
        let t0 = Instant::now();
        let mut state = settled(t0);
        state.apply(PollingEvent::SetLive { live: false, at: t0 + Duration::from_secs(2) });

        let effects = state.apply(PollingEvent::SetLive { live: true, at: t0 + Duration::from_secs(3) });
        assert_eq!(count_vehicle_fetches(&effects), 1);
        assert_eq!(count_stop_fetches(&effects), 0);

        // Already on: no extra fetch.
        let effects = state.apply(PollingEvent::SetLive { live: true, at: t0 + Duration::from_secs(9) });
        assert!(effects.is_empty());
    }

    #[test]
    fn success_replaces_results_wholesale() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let effects = state.apply(PollingEvent::TimerTick { at: t0 + Duration::from_secs(5) });
        state.apply(PollingEvent::VehiclesLoaded {
            request: fetch_vehicles_request(&effects),
            result: Ok(vec![vehicle("t2"), vehicle("t3")]),
        });

        let trips: Vec<&str> = state.vehicles().iter().map(|v| v.trip_id.as_str()).collect();
        assert_eq!(trips, vec!["t2", "t3"]);
    }

    #[test]
    fn stop_failure_keeps_results_and_sets_message() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let effects = state.apply(PollingEvent::Retry { at: t0 + Duration::from_secs(2) });
        state.apply(PollingEvent::StopsLoaded {
            request: fetch_stops_request(&effects),
            result: Err(ApplicationError::ExternalService("Network error: HTTP 503".to_string())),
        });

        assert_eq!(state.stops().len(), 2);
        assert_eq!(state.error_message(), Some("Network error: HTTP 503"));
        assert_eq!(state.phase(Stream::Stops), StreamPhase::Idle);
    }

    #[test]
    fn vehicle_failure_message_is_prefixed() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let effects = state.apply(PollingEvent::TimerTick { at: t0 + Duration::from_secs(5) });
        state.apply(PollingEvent::VehiclesLoaded {
            request: fetch_vehicles_request(&effects),
            result: Err(ApplicationError::ExternalService("Network error: HTTP 500".to_string())),
        });

        assert_eq!(state.vehicles().len(), 1);
        assert_eq!(
            state.error_message(),
            Some("Failed to load vehicles: Network error: HTTP 500")
        );
    }

    #[test]
    fn cancelled_results_do_not_mutate() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let effects = state.apply(PollingEvent::Retry { at: t0 + Duration::from_secs(2) });
        state.apply(PollingEvent::StopsLoaded {
            request: fetch_stops_request(&effects),
            result: Err(ApplicationError::Cancelled),
        });
        state.apply(PollingEvent::VehiclesLoaded {
            request: fetch_vehicles_request(&effects),
            result: Err(ApplicationError::Cancelled),
        });

        assert_eq!(state.stops().len(), 2);
        assert_eq!(state.vehicles().len(), 1);
        assert_eq!(state.error_message(), None);
        assert_eq!(state.phase(Stream::Stops), StreamPhase::Idle);
        assert_eq!(state.phase(Stream::Vehicles), StreamPhase::Idle);
    }

    #[test]
    fn stop_fetch_clears_visible_error() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        let effects = state.apply(PollingEvent::TimerTick { at: t0 + Duration::from_secs(5) });
        state.apply(PollingEvent::VehiclesLoaded {
            request: fetch_vehicles_request(&effects),
            result: Err(ApplicationError::ExternalService("Network error: timeout".to_string())),
        });
        assert!(state.error_message().is_some());

        let effects = state.apply(PollingEvent::Retry { at: t0 + Duration::from_secs(6) });
        assert_eq!(count_stop_fetches(&effects), 1);
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn dismiss_error_clears_message() {
        let t0 = Instant::now();
        let mut state = settled(t0);
        let effects = state.apply(PollingEvent::Retry { at: t0 + Duration::from_secs(2) });
        state.apply(PollingEvent::StopsLoaded {
            request: fetch_stops_request(&effects),
            result: Err(ApplicationError::InvalidInput("Invalid location".to_string())),
        });
        assert_eq!(state.error_message(), Some("Invalid location"));

        state.apply(PollingEvent::DismissError);
        assert_eq!(state.error_message(), None);
    }

    #[test]
    fn retry_without_region_does_nothing() {
        let mut state = PollingState::new(PollingConfig::default());
        assert!(state.apply(PollingEvent::Retry { at: Instant::now() }).is_empty());
        assert!(state.apply(PollingEvent::TimerTick { at: Instant::now() }).is_empty());
    }

    #[test]
    fn stale_results_are_ignored() {
        let t0 = Instant::now();
        let mut state = settled(t0);

        state.apply(PollingEvent::StopsLoaded {
            request: 999,
            result: Ok(vec![]),
        });
        assert_eq!(state.stops().len(), 2);
    }

    #[test]
    fn shutdown_cancels_in_flight_and_ignores_triggers() {
        let t0 = Instant::now();
        let mut state = PollingState::new(PollingConfig::default());
        let effects = state.apply(PollingEvent::RegionChanged { region: region(), at: t0 });
        let stops_req = fetch_stops_request(&effects);
        let vehicles_req = fetch_vehicles_request(&effects);

        let effects = state.apply(PollingEvent::Shutdown);
        assert_eq!(
            effects,
            vec![
                Effect::Cancel { request: stops_req },
                Effect::Cancel { request: vehicles_req },
            ]
        );

        let effects = state.apply(PollingEvent::Retry { at: t0 + Duration::from_secs(10) });
        assert!(effects.is_empty());
        state.apply(PollingEvent::StopsLoaded {
            request: stops_req,
            result: Ok(vec![stop("late")]),
        });
        assert!(state.stops().is_empty());
    }

    #[test]
    fn reduce_threads_state_through() {
        let state = PollingState::new(PollingConfig::default());
        let (state, effects) = reduce(
            state,
            PollingEvent::RegionChanged {
                region: region(),
                at: Instant::now(),
            },
        );
        assert_eq!(effects.len(), 2);
        assert!(state.region().is_some());
    }
}
