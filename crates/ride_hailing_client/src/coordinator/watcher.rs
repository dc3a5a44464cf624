/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
//! Ride lifecycle coordination: status polling against the remote ride
//! service, driver-marker movement simulation, and the shared state a
//! rendering shell reads snapshots from.
//!
//! Every loop is started explicitly and returns a [`LoopHandle`]; the owner
//! must stop the handles on teardown. State is re-read from the shared
//! watcher at each tick rather than captured at spawn time.

use crate::common::types::*;
use crate::coordinator::backoff::{Backoff, RetryConfig};
use crate::coordinator::simulation::MovementSimulation;
use crate::outbound::external::{GeoApi, RideServiceApi};
use crate::outbound::types::UpdateRideRequest;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub poll_interval: Duration,
    pub simulation_interval: Duration,
    pub simulation_step_degrees: f64,
    pub arrival_threshold_km: f64,
    /// Where the simulated driver marker spawns relative to the pickup
    /// point, per axis, when no real location feed exists.
    pub driver_spawn_offset_degrees: f64,
    pub retry: RetryConfig,
}

/// Cancellation handle for one coordinator loop.
pub struct LoopHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the loop to stop and waits for it to wind down.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    /// Waits for the loop to finish on its own (terminal status or an
    /// exhausted retry budget).
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Renderer-facing snapshot. Reads are idempotent on current state; no
/// ordering is guaranteed between a status change and a coordinate update
/// landing in the same snapshot.
#[derive(Debug, Clone)]
pub struct RideSnapshot {
    pub status: RideStatus,
    pub driver_id: Option<DriverId>,
    pub driver_position: Option<Point>,
    pub pickup: Option<Point>,
    pub dropoff: Option<Point>,
    pub travel_estimate: Option<TravelEstimate>,
}

struct WatcherState {
    status: RideStatus,
    history: Vec<RideStatus>,
    driver_id: Option<DriverId>,
    pickup: Option<Point>,
    dropoff: Option<Point>,
    simulation: Option<MovementSimulation>,
    travel_estimate: Option<TravelEstimate>,
}

struct SimUpdate {
    position: Point,
    /// Destination of the current leg, absent once the ride is terminal.
    estimate_to: Option<Point>,
    /// Status inferred from a simulated arrival on this tick.
    advanced_to: Option<RideStatus>,
    finished: bool,
}

/// Locally coordinated view of one remote ride.
pub struct RideWatcher {
    ride_id: RideId,
    state: Mutex<WatcherState>,
    notices: mpsc::Sender<Notice>,
}

impl RideWatcher {
    pub fn new(ride: &Ride, notices: mpsc::Sender<Notice>) -> Self {
        RideWatcher {
            ride_id: ride.id.clone(),
            state: Mutex::new(WatcherState {
                status: ride.status,
                history: vec![ride.status],
                driver_id: ride.driver_id.clone(),
                pickup: ride.start_coords,
                dropoff: ride.end_coords,
                simulation: None,
                travel_estimate: None,
            }),
            notices,
        }
    }

    pub fn ride_id(&self) -> &RideId {
        &self.ride_id
    }

    pub async fn status(&self) -> RideStatus {
        self.state.lock().await.status
    }

    /// Every status the watcher has held, in order, without repeats.
    pub async fn status_history(&self) -> Vec<RideStatus> {
        self.state.lock().await.history.clone()
    }

    pub async fn snapshot(&self) -> RideSnapshot {
        let state = self.state.lock().await;
        RideSnapshot {
            status: state.status,
            driver_id: state.driver_id.clone(),
            driver_position: state.simulation.as_ref().map(|sim| sim.position()),
            pickup: state.pickup,
            dropoff: state.dropoff,
            travel_estimate: state.travel_estimate.clone(),
        }
    }

    pub async fn set_travel_estimate(&self, estimate: TravelEstimate) {
        self.state.lock().await.travel_estimate = Some(estimate);
    }

    /// Merges a freshly polled ride record into local state. The server is
    /// authoritative; a remote status the local one cannot legally reach is
    /// treated as stale (the client may be optimistically ahead after an
    /// inferred transition).
    pub async fn apply_remote(&self, ride: &Ride, config: &CoordinatorConfig) -> RideStatus {
        let mut state = self.state.lock().await;

        if ride.status != state.status {
            // A remote terminal status always wins, even against an
            // optimistic local transition the simulation inferred ahead of
            // the server (a driver cancel racing an inferred pickup).
            if state.status.can_transition_to(ride.status) || ride.status.is_terminal() {
                info!(
                    tag = "[RIDE STATUS]",
                    ride_id = %self.ride_id.inner(),
                    from = %state.status,
                    to = %ride.status
                );
                state.status = ride.status;
                state.history.push(ride.status);

                if ride.status.is_terminal() {
                    state.simulation = None;
                    if ride.status == RideStatus::Cancelled {
                        // A cancelled ride leaves no markers behind.
                        state.pickup = None;
                        state.dropoff = None;
                        state.travel_estimate = None;
                    }
                }
            } else {
                debug!(
                    tag = "[STALE REMOTE STATUS]",
                    ride_id = %self.ride_id.inner(),
                    local = %state.status,
                    remote = %ride.status
                );
            }
        }

        if let Some(driver_id) = &ride.driver_id {
            state.driver_id = Some(driver_id.clone());
        }

        // Seed the simulated driver coordinate once a driver is attached.
        if state.status == RideStatus::Dispatched
            && state.simulation.is_none()
            && state.driver_id.is_some()
        {
            if let Some(pickup) = state.pickup {
                let spawn = Point {
                    lat: Latitude(pickup.lat.inner() + config.driver_spawn_offset_degrees),
                    lon: Longitude(pickup.lon.inner() + config.driver_spawn_offset_degrees),
                };
                state.simulation = Some(MovementSimulation::new(
                    spawn,
                    pickup,
                    config.simulation_step_degrees,
                    config.arrival_threshold_km,
                ));
            }
        }

        state.status
    }

    /// Advances the movement simulation one tick, inferring pickup/drop-off
    /// transitions from simulated arrivals. Returns `None` while there is
    /// nothing to move.
    async fn simulation_tick(&self) -> Option<SimUpdate> {
        let mut state = self.state.lock().await;

        if !matches!(
            state.status,
            RideStatus::Dispatched | RideStatus::InTransit
        ) {
            return None;
        }

        let tick = state.simulation.as_mut()?.tick();

        let mut advanced_to = None;
        if tick.arrived_now {
            match state.status {
                RideStatus::Dispatched => {
                    state.status = RideStatus::InTransit;
                    state.history.push(RideStatus::InTransit);
                    advanced_to = Some(RideStatus::InTransit);

                    let dropoff = state.dropoff;
                    match (state.simulation.as_mut(), dropoff) {
                        (Some(simulation), Some(dropoff)) => simulation.retarget(dropoff),
                        // Without a drop-off coordinate the marker holds at
                        // pickup; completion then comes from the server.
                        _ => state.simulation = None,
                    }
                }
                RideStatus::InTransit => {
                    state.status = RideStatus::Completed;
                    state.history.push(RideStatus::Completed);
                    advanced_to = Some(RideStatus::Completed);
                    state.simulation = None;
                }
                _ => {}
            }

            if let Some(next) = advanced_to {
                info!(
                    tag = "[SIMULATED ARRIVAL]",
                    ride_id = %self.ride_id.inner(),
                    status = %next
                );
            }
        }

        Some(SimUpdate {
            position: tick.position,
            estimate_to: state.simulation.as_ref().map(|sim| sim.target()),
            advanced_to,
            finished: state.status.is_terminal(),
        })
    }

    fn notify(&self, notice: Notice) {
        // Dropped notices are acceptable; the channel is a best-effort
        // banner surface, not a durable queue.
        let _ = self.notices.try_send(notice);
    }
}

/// Polls ride-by-id at a fixed interval, converging local status to the
/// server's. Stops on terminal status, teardown, or an exhausted retry
/// budget.
pub fn start_status_poll(
    api: Arc<dyn RideServiceApi>,
    token: AccessToken,
    watcher: Arc<RideWatcher>,
    config: CoordinatorConfig,
) -> LoopHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let ride_id = watcher.ride_id().clone();
        let mut backoff = Backoff::new(config.retry.clone());
        let mut delay = config.poll_interval;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            match api.get_ride(&token, &ride_id).await {
                Ok(response) => {
                    backoff.reset();
                    delay = config.poll_interval;

                    let ride = Ride::from(response);
                    let status = watcher.apply_remote(&ride, &config).await;
                    if status.is_terminal() {
                        info!(tag = "[POLL STOPPED]", ride_id = %ride_id.inner(), status = %status);
                        break;
                    }
                }
                Err(err) => {
                    warn!(tag = "[POLL FAILED]", ride_id = %ride_id.inner(), error = %err);
                    watcher.notify(Notice::warning(format!(
                        "Could not refresh ride status: {}",
                        err.message()
                    )));

                    match backoff.next_delay() {
                        Some(next_delay) => delay = next_delay,
                        None => {
                            watcher.notify(Notice::error(
                                "Lost contact with the ride service".to_string(),
                            ));
                            warn!(tag = "[POLL RETRIES EXHAUSTED]", ride_id = %ride_id.inner());
                            break;
                        }
                    }
                }
            }
        }
    });

    LoopHandle { shutdown, task }
}

/// Drives the movement simulation on its own fixed interval, writing
/// inferred transitions back to the ride service and refreshing the
/// ETA/distance display values after each tick.
pub fn start_movement_simulation(
    api: Arc<dyn RideServiceApi>,
    geo: Arc<dyn GeoApi>,
    token: AccessToken,
    watcher: Arc<RideWatcher>,
    config: CoordinatorConfig,
) -> LoopHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let ride_id = watcher.ride_id().clone();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(config.simulation_interval) => {}
            }

            let Some(update) = watcher.simulation_tick().await else {
                if watcher.status().await.is_terminal() {
                    break;
                }
                continue;
            };

            if let Some(next) = update.advanced_to {
                let request = UpdateRideRequest {
                    status: Some(next),
                    driver_id: None,
                };
                if let Err(err) = api.update_ride(&token, &ride_id, request).await {
                    // Local state stays optimistically ahead; the next poll
                    // reconciles against whatever the server holds.
                    warn!(tag = "[STATUS WRITE FAILED]", ride_id = %ride_id.inner(), status = %next, error = %err);
                    watcher.notify(Notice::warning(format!(
                        "Could not report ride progress: {}",
                        err.message()
                    )));
                }
            }

            if let Some(destination) = update.estimate_to {
                match geo.travel_estimate(&update.position, &destination).await {
                    Ok(estimate) => watcher.set_travel_estimate(estimate).await,
                    Err(err) => {
                        // Stale-but-available: keep the last displayed value.
                        warn!(tag = "[ESTIMATE FAILED]", ride_id = %ride_id.inner(), error = %err);
                    }
                }
            }

            if update.finished {
                break;
            }
        }
    });

    LoopHandle { shutdown, task }
}

/// Driver-side poll over the ride collection: replaces the open-ride
/// candidate set with the server's current `Requested` rides each tick.
pub fn start_open_rides_poll(
    api: Arc<dyn RideServiceApi>,
    token: AccessToken,
    candidates: Arc<Mutex<FxHashMap<RideId, Ride>>>,
    config: CoordinatorConfig,
    notices: mpsc::Sender<Notice>,
) -> LoopHandle {
    let (shutdown, mut shutdown_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut backoff = Backoff::new(config.retry.clone());
        let mut delay = config.poll_interval;

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = tokio::time::sleep(delay) => {}
            }

            match api.list_rides(&token).await {
                Ok(rides) => {
                    backoff.reset();
                    delay = config.poll_interval;

                    let open: FxHashMap<RideId, Ride> = rides
                        .into_iter()
                        .map(Ride::from)
                        .filter(|ride| ride.status == RideStatus::Requested)
                        .map(|ride| (ride.id.clone(), ride))
                        .collect();

                    debug!(tag = "[OPEN RIDES]", count = open.len());
                    *candidates.lock().await = open;
                }
                Err(err) => {
                    warn!(tag = "[OPEN RIDES POLL FAILED]", error = %err);
                    let _ = notices.try_send(Notice::warning(format!(
                        "Could not refresh open rides: {}",
                        err.message()
                    )));

                    match backoff.next_delay() {
                        Some(next_delay) => delay = next_delay,
                        None => {
                            let _ = notices.try_send(Notice::error(
                                "Lost contact with the ride service".to_string(),
                            ));
                            break;
                        }
                    }
                }
            }
        }
    });

    LoopHandle { shutdown, task }
}
