/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
//! Role-specific ride controllers behind one capability trait, selected
//! once at session start instead of branching on the role per call site.

use crate::common::types::*;
use crate::coordinator::watcher::{
    start_movement_simulation, start_open_rides_poll, start_status_poll, CoordinatorConfig,
    LoopHandle, RideWatcher,
};
use crate::outbound::external::{GeoApi, RideServiceApi};
use crate::outbound::types::{
    CreateRideRequest, DriverProfileResponse, RiderProfileResponse, UpdateRideRequest,
};
use crate::storage::session::SessionStorage;
use crate::tools::error::AppError;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

/// A ride currently being watched, with its two coordinator loops. Owner
/// must call `teardown` (or wait for the loops to finish) before dropping.
pub struct ActiveRide {
    pub watcher: Arc<RideWatcher>,
    poll: LoopHandle,
    simulation: LoopHandle,
}

impl ActiveRide {
    pub fn is_finished(&self) -> bool {
        self.poll.is_finished() && self.simulation.is_finished()
    }

    pub async fn teardown(self) {
        self.poll.stop().await;
        self.simulation.stop().await;
    }
}

/// Capability shared by both session roles; the headless runtime drives it
/// until shutdown is requested.
#[async_trait]
pub trait RideController: Send + Sync {
    fn role(&self) -> Role;
    async fn run_until(&self, shutdown: Arc<AtomicBool>) -> Result<(), AppError>;
}

pub struct RiderController {
    api: Arc<dyn RideServiceApi>,
    geo: Arc<dyn GeoApi>,
    sessions: SessionStorage,
    session: Session,
    config: CoordinatorConfig,
    notices: mpsc::Sender<Notice>,
}

impl RiderController {
    pub fn new(
        api: Arc<dyn RideServiceApi>,
        geo: Arc<dyn GeoApi>,
        sessions: SessionStorage,
        session: Session,
        config: CoordinatorConfig,
        notices: mpsc::Sender<Notice>,
    ) -> Self {
        RiderController {
            api,
            geo,
            sessions,
            session,
            config,
            notices,
        }
    }

    /// Requests a new ride and starts watching it: geocodes both addresses,
    /// creates the remote ride, and spins up the poll and simulation loops.
    pub async fn request_ride(
        &self,
        start_location: &str,
        end_location: &str,
    ) -> Result<ActiveRide, AppError> {
        let start_coords = self.geo.geocode(start_location).await?;
        let end_coords = self.geo.geocode(end_location).await?;

        let response = self
            .api
            .create_ride(
                &self.session.access_token,
                CreateRideRequest {
                    rider_id: RiderId(self.session.user.id.inner()),
                    start_location: start_location.to_string(),
                    end_location: end_location.to_string(),
                },
            )
            .await?;

        let mut ride = Ride::from(response);
        ride.start_coords = Some(start_coords);
        ride.end_coords = Some(end_coords);

        self.sessions.store_active_ride(&ride.id).await?;
        info!(tag = "[RIDE REQUESTED]", ride_id = %ride.id.inner());

        Ok(self.watch(ride))
    }

    /// Resumes watching an existing ride, e.g. after an app restart.
    pub async fn watch_ride(&self, ride_id: &RideId) -> Result<ActiveRide, AppError> {
        let response = self
            .api
            .get_ride(&self.session.access_token, ride_id)
            .await?;
        let mut ride = Ride::from(response);

        // Best effort: a failed geocode degrades the map markers, not the
        // ride itself.
        match self.geo.geocode(&ride.start_location).await {
            Ok(coords) => ride.start_coords = Some(coords),
            Err(err) => warn!(tag = "[GEOCODE FAILED]", error = %err),
        }
        match self.geo.geocode(&ride.end_location).await {
            Ok(coords) => ride.end_coords = Some(coords),
            Err(err) => warn!(tag = "[GEOCODE FAILED]", error = %err),
        }

        Ok(self.watch(ride))
    }

    /// Past and current rides of this rider, for the activity view.
    pub async fn ride_history(&self) -> Result<Vec<Ride>, AppError> {
        let rides = self.api.list_rides(&self.session.access_token).await?;
        Ok(rides
            .into_iter()
            .map(Ride::from)
            .filter(|ride| ride.rider_id.inner() == self.session.user.id.inner())
            .collect())
    }

    /// Display details for the assigned driver.
    pub async fn driver_profile(
        &self,
        driver_id: &DriverId,
    ) -> Result<DriverProfileResponse, AppError> {
        self.api
            .get_driver(&self.session.access_token, driver_id)
            .await
    }

    fn watch(&self, ride: Ride) -> ActiveRide {
        let watcher = Arc::new(RideWatcher::new(&ride, self.notices.clone()));

        let poll = start_status_poll(
            Arc::clone(&self.api),
            self.session.access_token.clone(),
            Arc::clone(&watcher),
            self.config.clone(),
        );
        let simulation = start_movement_simulation(
            Arc::clone(&self.api),
            Arc::clone(&self.geo),
            self.session.access_token.clone(),
            Arc::clone(&watcher),
            self.config.clone(),
        );

        ActiveRide {
            watcher,
            poll,
            simulation,
        }
    }
}

#[async_trait]
impl RideController for RiderController {
    fn role(&self) -> Role {
        Role::Rider
    }

    async fn run_until(&self, shutdown: Arc<AtomicBool>) -> Result<(), AppError> {
        let Some(ride_id) = self.sessions.load_active_ride().await? else {
            info!(tag = "[RIDER IDLE]", "No active ride to resume");
            while !shutdown.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            return Ok(());
        };

        let active = self.watch_ride(&ride_id).await?;

        while !shutdown.load(Ordering::Relaxed) && !active.is_finished() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        let status = active.watcher.status().await;
        let stopped_by_user = shutdown.load(Ordering::Relaxed);
        active.teardown().await;

        if status.is_terminal() {
            self.sessions.clear_active_ride().await?;
            Ok(())
        } else if stopped_by_user {
            Ok(())
        } else {
            // The loops died without reaching a terminal status.
            Err(AppError::PollRetriesExhausted(ride_id.inner()))
        }
    }
}

pub struct DriverController {
    api: Arc<dyn RideServiceApi>,
    sessions: SessionStorage,
    session: Session,
    config: CoordinatorConfig,
    notices: mpsc::Sender<Notice>,
    open_rides: Arc<Mutex<FxHashMap<RideId, Ride>>>,
}

impl DriverController {
    pub fn new(
        api: Arc<dyn RideServiceApi>,
        sessions: SessionStorage,
        session: Session,
        config: CoordinatorConfig,
        notices: mpsc::Sender<Notice>,
    ) -> Self {
        DriverController {
            api,
            sessions,
            session,
            config,
            notices,
            open_rides: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    pub fn start_open_rides_poll(&self) -> LoopHandle {
        start_open_rides_poll(
            Arc::clone(&self.api),
            self.session.access_token.clone(),
            Arc::clone(&self.open_rides),
            self.config.clone(),
            self.notices.clone(),
        )
    }

    pub async fn open_rides(&self) -> Vec<Ride> {
        self.open_rides.lock().await.values().cloned().collect()
    }

    /// Rides this driver has served, for the activity view.
    pub async fn ride_history(&self) -> Result<Vec<Ride>, AppError> {
        let driver_id = DriverId(self.session.user.id.inner());
        let rides = self.api.list_rides(&self.session.access_token).await?;
        Ok(rides
            .into_iter()
            .map(Ride::from)
            .filter(|ride| ride.driver_id.as_ref() == Some(&driver_id))
            .collect())
    }

    /// Display details for the requesting rider.
    pub async fn rider_profile(
        &self,
        rider_id: &RiderId,
    ) -> Result<RiderProfileResponse, AppError> {
        self.api
            .get_rider(&self.session.access_token, rider_id)
            .await
    }

    /// Accepts an open ride: `Requested → Dispatched` with this driver
    /// attached. The accepted ride is remembered so a restarted client can
    /// pick it back up.
    pub async fn accept_ride(&self, ride_id: &RideId) -> Result<Ride, AppError> {
        let ride = self.transition(ride_id, RideStatus::Dispatched, true).await?;
        self.sessions.store_active_ride(ride_id).await?;
        Ok(ride)
    }

    /// Explicit pickup confirmation: `Dispatched → InTransit`.
    pub async fn mark_picked_up(&self, ride_id: &RideId) -> Result<Ride, AppError> {
        self.transition(ride_id, RideStatus::InTransit, false).await
    }

    /// Driver-initiated cancellation, only before pickup.
    pub async fn cancel_ride(&self, ride_id: &RideId) -> Result<Ride, AppError> {
        let ride = self.transition(ride_id, RideStatus::Cancelled, false).await?;
        self.sessions.clear_active_ride().await?;
        Ok(ride)
    }

    async fn transition(
        &self,
        ride_id: &RideId,
        next: RideStatus,
        attach_driver: bool,
    ) -> Result<Ride, AppError> {
        let current = Ride::from(
            self.api
                .get_ride(&self.session.access_token, ride_id)
                .await?,
        );

        if !current.status.can_transition_to(next) {
            return Err(AppError::InvalidRideStatus(
                ride_id.inner(),
                current.status.to_string(),
            ));
        }

        let request = UpdateRideRequest {
            status: Some(next),
            driver_id: attach_driver.then(|| DriverId(self.session.user.id.inner())),
        };
        let updated = self
            .api
            .update_ride(&self.session.access_token, ride_id, request)
            .await?;

        info!(tag = "[DRIVER ACTION]", ride_id = %ride_id.inner(), status = %next);
        Ok(Ride::from(updated))
    }
}

#[async_trait]
impl RideController for DriverController {
    fn role(&self) -> Role {
        Role::Driver
    }

    async fn run_until(&self, shutdown: Arc<AtomicBool>) -> Result<(), AppError> {
        // Reconcile a ride accepted in a previous run.
        if let Some(ride_id) = self.sessions.load_active_ride().await? {
            let ride = Ride::from(
                self.api
                    .get_ride(&self.session.access_token, &ride_id)
                    .await?,
            );
            if ride.status.is_terminal() {
                self.sessions.clear_active_ride().await?;
            } else {
                info!(
                    tag = "[DRIVER RESUME]",
                    ride_id = %ride_id.inner(),
                    status = %ride.status
                );
            }
        }

        let poll = self.start_open_rides_poll();

        while !shutdown.load(Ordering::Relaxed) && !poll.is_finished() {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        poll.stop().await;
        Ok(())
    }
}
