//! Async driver for the polling state machine
//!
//! One task owns [`PollingState`]. It receives events from [`PollingHandle`]
//! and from finished fetches, runs the resulting effects and publishes a
//! [`PollingSnapshot`] after every event. Each fetch runs as its own task with
//! a child [`CancellationToken`] of the controller's root token.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use domain::{CancellationToken, MapRegion};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::config::PollingConfig;
use super::state::{Effect, PollingEvent, PollingSnapshot, PollingState, RequestId};
use crate::error::ApplicationError;
use crate::ports::{StopsPort, VehiclesPort};

const EVENT_BUFFER: usize = 64;

/// Entry point for region polling
pub struct PollingController {
    stops: Arc<dyn StopsPort>,
    vehicles: Arc<dyn VehiclesPort>,
    state: PollingState,
    results: mpsc::WeakSender<PollingEvent>,
    snapshots: watch::Sender<PollingSnapshot>,
    root: CancellationToken,
    in_flight: HashMap<RequestId, CancellationToken>,
}

impl fmt::Debug for PollingController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollingController")
            .field("state", &self.state)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

/// Handle for feeding the controller and observing its state
///
/// Dropping every handle stops the controller once in-flight fetches finish.
#[derive(Debug)]
pub struct PollingHandle {
    events: mpsc::Sender<PollingEvent>,
    snapshots: watch::Receiver<PollingSnapshot>,
    task: JoinHandle<()>,
}

impl PollingController {
    /// Start the controller on the current tokio runtime
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::InvalidInput`] if `config` fails validation.
    pub fn spawn(
        stops: Arc<dyn StopsPort>,
        vehicles: Arc<dyn VehiclesPort>,
        config: PollingConfig,
    ) -> Result<PollingHandle, ApplicationError> {
        config.validate().map_err(ApplicationError::InvalidInput)?;

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let state = PollingState::new(config);
        let (snapshots_tx, snapshots_rx) = watch::channel(state.snapshot());

        let controller = Self {
            stops,
            vehicles,
            state,
            results: events_tx.downgrade(),
            snapshots: snapshots_tx,
            root: CancellationToken::new(),
            in_flight: HashMap::new(),
        };
        let task = tokio::spawn(controller.run(events_rx));

        Ok(PollingHandle {
            events: events_tx,
            snapshots: snapshots_rx,
            task,
        })
    }

    async fn run(mut self, mut events: mpsc::Receiver<PollingEvent>) {
        let period = self.state.config().vehicle_refresh_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(refresh_secs = period.as_secs(), "Region polling started");

        loop {
            let event = tokio::select! {
                received = events.recv() => received.unwrap_or(PollingEvent::Shutdown),
                _ = ticker.tick() => PollingEvent::TimerTick { at: Instant::now() },
            };
            let shutdown = matches!(event, PollingEvent::Shutdown);

            match &event {
                PollingEvent::StopsLoaded { request, result } => {
                    self.in_flight.remove(request);
                    log_failure("stops", *request, result.as_ref().err());
                },
                PollingEvent::VehiclesLoaded { request, result } => {
                    self.in_flight.remove(request);
                    log_failure("vehicles", *request, result.as_ref().err());
                },
                _ => {},
            }

            for effect in self.state.apply(event) {
                self.run_effect(effect);
            }
            self.snapshots.send_replace(self.state.snapshot());

            if shutdown {
                self.root.cancel();
                break;
            }
        }

        info!("Region polling stopped");
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::FetchStops {
                request,
                center,
                radius_m,
                max_results,
            } => {
                debug!(request, radius_m, max_results, "Fetching stops");
                let Some(results) = self.results.upgrade() else {
                    return;
                };
                let token = self.track(request);
                let port = Arc::clone(&self.stops);
                tokio::spawn(async move {
                    let result = tokio::select! {
                        biased;
                        () = token.cancelled() => Err(ApplicationError::Cancelled),
                        result = port.nearby_stops(center, radius_m, max_results, &token) => result,
                    };
                    // The controller may already be gone.
                    let _ = results.send(PollingEvent::StopsLoaded { request, result }).await;
                });
            },
            Effect::FetchVehicles {
                request,
                bbox,
                window_secs,
            } => {
                debug!(request, ?bbox, "Fetching vehicles");
                let Some(results) = self.results.upgrade() else {
                    return;
                };
                let token = self.track(request);
                let port = Arc::clone(&self.vehicles);
                tokio::spawn(async move {
                    let result = tokio::select! {
                        biased;
                        () = token.cancelled() => Err(ApplicationError::Cancelled),
                        result = port.vehicles_in(bbox, window_secs, &token) => result,
                    };
                    let _ = results.send(PollingEvent::VehiclesLoaded { request, result }).await;
                });
            },
            Effect::Cancel { request } => {
                if let Some(token) = self.in_flight.remove(&request) {
                    debug!(request, "Cancelling fetch");
                    token.cancel();
                }
            },
        }
    }

    fn track(&mut self, request: RequestId) -> CancellationToken {
        let token = self.root.child_token();
        self.in_flight.insert(request, token.clone());
        token
    }
}

fn log_failure(stream: &str, request: RequestId, error: Option<&ApplicationError>) {
    match error {
        Some(ApplicationError::Cancelled) => debug!(stream, request, "Fetch cancelled"),
        Some(err) => warn!(stream, request, error = %err, "Fetch failed"),
        None => {},
    }
}

impl PollingHandle {
    async fn send(&self, event: PollingEvent) -> Result<(), ApplicationError> {
        self.events
            .send(event)
            .await
            .map_err(|_| ApplicationError::Internal("polling controller stopped".to_string()))
    }

    /// Report a settled map region
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn region_changed(&self, region: MapRegion) -> Result<(), ApplicationError> {
        self.send(PollingEvent::RegionChanged {
            region,
            at: Instant::now(),
        })
        .await
    }

    /// Re-run the last fetches against the last known region
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn retry(&self) -> Result<(), ApplicationError> {
        self.send(PollingEvent::Retry { at: Instant::now() }).await
    }

    /// Switch live vehicle tracking on or off
    ///
    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn set_live(&self, live: bool) -> Result<(), ApplicationError> {
        self.send(PollingEvent::SetLive {
            live,
            at: Instant::now(),
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the controller has stopped.
    pub async fn dismiss_error(&self) -> Result<(), ApplicationError> {
        self.send(PollingEvent::DismissError).await
    }

    /// Latest published state
    #[must_use]
    pub fn snapshot(&self) -> PollingSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified after every processed event
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PollingSnapshot> {
        self.snapshots.clone()
    }

    /// Cancel in-flight fetches and wait for the controller to stop
    ///
    /// # Errors
    ///
    /// Returns an error if the controller task panicked.
    pub async fn shutdown(self) -> Result<(), ApplicationError> {
        // A closed channel means the controller is already stopping.
        let _ = self.events.send(PollingEvent::Shutdown).await;
        self.task
            .await
            .map_err(|e| ApplicationError::Internal(format!("polling controller failed: {e}")))
    }
}
