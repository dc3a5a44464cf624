/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::fake_service::FakeRideService;
use crate::support::*;
use ride_hailing_client::common::types::*;
use ride_hailing_client::coordinator::controller::{DriverController, RiderController};
use ride_hailing_client::outbound::external::{GeoApi, RideServiceApi};
use ride_hailing_client::outbound::types::PartyRef;
use ride_hailing_client::storage::{session::SessionStorage, InMemoryStorage};
use ride_hailing_client::tools::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn sessions() -> SessionStorage {
    SessionStorage::new(Arc::new(InMemoryStorage::default()))
}

fn rider_controller(fake: &Arc<FakeRideService>, sessions: SessionStorage) -> RiderController {
    // Notices are best-effort; nobody listens in these tests.
    let (notices, _) = mpsc::channel(8);
    RiderController::new(
        fake.clone() as Arc<dyn RideServiceApi>,
        fake.clone() as Arc<dyn GeoApi>,
        sessions,
        session(Role::Rider),
        config(),
        notices,
    )
}

fn driver_controller(fake: &Arc<FakeRideService>, sessions: SessionStorage) -> DriverController {
    let (notices, _) = mpsc::channel(8);
    DriverController::new(
        fake.clone() as Arc<dyn RideServiceApi>,
        sessions,
        session(Role::Driver),
        config(),
        notices,
    )
}

#[tokio::test(start_paused = true)]
async fn requesting_a_ride_persists_it_for_resume() {
    let fake = Arc::new(FakeRideService::new());
    fake.set_location("Home", point(12.970, 77.590));
    fake.set_location("Office", point(12.975, 77.595));

    let sessions = sessions();
    let rider = rider_controller(&fake, sessions.clone());

    let active = rider.request_ride("Home", "Office").await.expect("request");

    assert_eq!(
        sessions.load_active_ride().await.expect("load"),
        Some(active.watcher.ride_id().clone())
    );
    assert_eq!(active.watcher.status().await, RideStatus::Requested);

    let snapshot = active.watcher.snapshot().await;
    assert_eq!(snapshot.pickup, Some(point(12.970, 77.590)));
    assert_eq!(snapshot.dropoff, Some(point(12.975, 77.595)));

    active.teardown().await;
}

#[tokio::test]
async fn unresolvable_addresses_block_the_request() {
    let fake = Arc::new(FakeRideService::new());
    let rider = rider_controller(&fake, sessions());

    assert!(matches!(
        rider.request_ride("Nowhere", "Office").await,
        Err(AppError::GeocodingFailed(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn resuming_survives_a_geocoding_outage() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));
    // No locations registered: every geocode fails.

    let rider = rider_controller(&fake, sessions());
    let active = rider
        .watch_ride(&RideId("ride-1".to_string()))
        .await
        .expect("watch");

    let snapshot = active.watcher.snapshot().await;
    assert_eq!(snapshot.pickup, None);
    assert_eq!(snapshot.dropoff, None);
    assert_eq!(active.watcher.status().await, RideStatus::Requested);

    active.teardown().await;
}

#[tokio::test]
async fn driver_accepts_then_picks_up() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));

    let storage = sessions();
    let driver = driver_controller(&fake, storage.clone());
    let ride_id = RideId("ride-1".to_string());

    let ride = driver.accept_ride(&ride_id).await.expect("accept");
    assert_eq!(ride.status, RideStatus::Dispatched);
    assert_eq!(ride.driver_id, Some(DriverId("user-1".to_string())));

    // The accepted ride is remembered for a restarted client.
    assert_eq!(
        storage.load_active_ride().await.expect("load"),
        Some(ride_id.clone())
    );

    let ride = driver.mark_picked_up(&ride_id).await.expect("pickup");
    assert_eq!(ride.status, RideStatus::InTransit);

    // Past pickup there is no cancelling.
    assert!(matches!(
        driver.cancel_ride(&ride_id).await,
        Err(AppError::InvalidRideStatus(_, _))
    ));
}

#[tokio::test]
async fn driver_cancels_before_pickup() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));

    let storage = sessions();
    let driver = driver_controller(&fake, storage.clone());
    let ride_id = RideId("ride-1".to_string());

    driver.accept_ride(&ride_id).await.expect("accept");
    let ride = driver.cancel_ride(&ride_id).await.expect("cancel");
    assert_eq!(ride.status, RideStatus::Cancelled);
    assert_eq!(fake.ride_status("ride-1"), Some(RideStatus::Cancelled));

    // A cancelled ride is not resumed on restart.
    assert_eq!(storage.load_active_ride().await.expect("load"), None);
}

#[tokio::test]
async fn accepting_a_ride_twice_is_rejected() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));

    let driver = driver_controller(&fake, sessions());
    let ride_id = RideId("ride-1".to_string());

    driver.accept_ride(&ride_id).await.expect("accept");
    assert!(matches!(
        driver.accept_ride(&ride_id).await,
        Err(AppError::InvalidRideStatus(_, _))
    ));
}

#[tokio::test]
async fn ride_history_is_scoped_to_the_session_user() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));
    let mut foreign = requested_ride("ride-2");
    foreign.rider = Some(PartyRef {
        id: "user-2".to_string(),
    });
    fake.insert_ride(foreign);

    let rider = rider_controller(&fake, sessions());
    let history = rider.ride_history().await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, RideId("ride-1".to_string()));

    // The driver sees only rides assigned to them.
    let driver = driver_controller(&fake, sessions());
    assert!(driver.ride_history().await.expect("history").is_empty());

    driver
        .accept_ride(&RideId("ride-1".to_string()))
        .await
        .expect("accept");
    let history = driver.ride_history().await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].driver_id, Some(DriverId("user-1".to_string())));
}

#[tokio::test(start_paused = true)]
async fn open_rides_poll_tracks_only_requested_rides() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));
    fake.insert_ride(requested_ride("ride-2"));
    fake.set_status("ride-2", RideStatus::Completed, None);

    let driver = driver_controller(&fake, sessions());
    let poll = driver.start_open_rides_poll();
    settle().await;

    assert!(driver.open_rides().await.is_empty());

    step(Duration::from_secs(5)).await;
    let open = driver.open_rides().await;
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].id, RideId("ride-1".to_string()));

    // Rides leave the candidate set as soon as the server closes them.
    fake.set_status("ride-1", RideStatus::Cancelled, None);
    step(Duration::from_secs(5)).await;
    assert!(driver.open_rides().await.is_empty());

    poll.stop().await;
}
