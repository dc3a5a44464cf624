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
use ride_hailing_client::coordinator::watcher::{
    start_movement_simulation, start_status_poll, RideWatcher,
};
use ride_hailing_client::outbound::external::{GeoApi, RideServiceApi};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn token() -> AccessToken {
    AccessToken("fake-token".to_string())
}

#[tokio::test(start_paused = true)]
async fn status_poll_fetches_exactly_once_per_interval() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));

    let ride = Ride::from(requested_ride("ride-1"));
    let (notices, _notice_rx) = mpsc::channel(8);
    let watcher = Arc::new(RideWatcher::new(&ride, notices));

    let poll = start_status_poll(
        fake.clone() as Arc<dyn RideServiceApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    settle().await;

    assert_eq!(fake.get_ride_calls.load(Ordering::SeqCst), 0);

    step(Duration::from_secs(5)).await;
    assert_eq!(fake.get_ride_calls.load(Ordering::SeqCst), 1);

    step(Duration::from_secs(5)).await;
    assert_eq!(fake.get_ride_calls.load(Ordering::SeqCst), 2);

    // A stopped loop schedules nothing further.
    poll.stop().await;
    step(Duration::from_secs(5)).await;
    step(Duration::from_secs(5)).await;
    assert_eq!(fake.get_ride_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn ride_progresses_through_the_full_lifecycle() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));

    let pickup = point(12.970, 77.590);
    let dropoff = point(12.975, 77.595);
    let mut ride = Ride::from(requested_ride("ride-1"));
    ride.start_coords = Some(pickup);
    ride.end_coords = Some(dropoff);

    let (notices, _notice_rx) = mpsc::channel(32);
    let watcher = Arc::new(RideWatcher::new(&ride, notices));

    let poll = start_status_poll(
        fake.clone() as Arc<dyn RideServiceApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    let simulation = start_movement_simulation(
        fake.clone() as Arc<dyn RideServiceApi>,
        fake.clone() as Arc<dyn GeoApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    settle().await;

    // A driver accepts the ride on the server side.
    fake.set_status("ride-1", RideStatus::Dispatched, Some("driver-1"));

    let mut steps = 0;
    while watcher.status().await != RideStatus::Completed {
        step(Duration::from_secs(5)).await;
        steps += 1;
        assert!(steps < 100, "ride never completed");
    }

    // Each status exactly once, in order, no skips.
    assert_eq!(
        watcher.status_history().await,
        vec![
            RideStatus::Requested,
            RideStatus::Dispatched,
            RideStatus::InTransit,
            RideStatus::Completed,
        ]
    );

    // Inferred transitions were written back to the server.
    assert_eq!(fake.ride_status("ride-1"), Some(RideStatus::Completed));

    let snapshot = watcher.snapshot().await;
    assert_eq!(snapshot.driver_id, Some(DriverId("driver-1".to_string())));
    assert!(snapshot.travel_estimate.is_some());

    // Both loops wind down on their own once the ride is terminal.
    step(Duration::from_secs(5)).await;
    assert!(poll.is_finished());
    assert!(simulation.is_finished());
    poll.join().await;
    simulation.join().await;
}

#[tokio::test(start_paused = true)]
async fn cancellation_clears_the_map_state() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));

    let mut ride = Ride::from(requested_ride("ride-1"));
    ride.start_coords = Some(point(12.970, 77.590));
    ride.end_coords = Some(point(12.975, 77.595));

    let (notices, _notice_rx) = mpsc::channel(32);
    let watcher = Arc::new(RideWatcher::new(&ride, notices));

    let poll = start_status_poll(
        fake.clone() as Arc<dyn RideServiceApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    let simulation = start_movement_simulation(
        fake.clone() as Arc<dyn RideServiceApi>,
        fake.clone() as Arc<dyn GeoApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    settle().await;

    fake.set_status("ride-1", RideStatus::Cancelled, None);

    let mut steps = 0;
    while watcher.status().await != RideStatus::Cancelled {
        step(Duration::from_secs(5)).await;
        steps += 1;
        assert!(steps < 10, "cancellation never observed");
    }

    let snapshot = watcher.snapshot().await;
    assert_eq!(snapshot.pickup, None);
    assert_eq!(snapshot.dropoff, None);
    assert_eq!(snapshot.driver_position, None);
    assert_eq!(snapshot.travel_estimate, None);

    step(Duration::from_secs(5)).await;
    assert!(poll.is_finished());
    assert!(simulation.is_finished());
    poll.join().await;
    simulation.join().await;
}

#[tokio::test(start_paused = true)]
async fn remote_cancel_overrides_an_inferred_pickup() {
    let fake = Arc::new(FakeRideService::new());

    let mut response = requested_ride("ride-1");
    response.status = RideStatus::Dispatched;
    fake.insert_ride(response.clone());
    fake.set_status("ride-1", RideStatus::Dispatched, Some("driver-1"));

    let mut ride = Ride::from(response);
    ride.driver_id = Some(DriverId("driver-1".to_string()));
    ride.start_coords = Some(point(12.970, 77.590));
    ride.end_coords = Some(point(12.975, 77.595));

    let (notices, _notice_rx) = mpsc::channel(32);
    let watcher = Arc::new(RideWatcher::new(&ride, notices));

    let poll = start_status_poll(
        fake.clone() as Arc<dyn RideServiceApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    let simulation = start_movement_simulation(
        fake.clone() as Arc<dyn RideServiceApi>,
        fake.clone() as Arc<dyn GeoApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    settle().await;

    // Let the simulation reach pickup and optimistically infer InTransit.
    let mut steps = 0;
    while watcher.status().await != RideStatus::InTransit {
        step(Duration::from_secs(5)).await;
        steps += 1;
        assert!(steps < 50, "pickup never inferred");
    }

    // The driver cancels server-side while the client is ahead of it.
    fake.set_status("ride-1", RideStatus::Cancelled, None);

    let mut steps = 0;
    while watcher.status().await != RideStatus::Cancelled {
        step(Duration::from_secs(5)).await;
        steps += 1;
        assert!(steps < 10, "remote cancel never converged");
    }

    // The server record stands; no Completed was written over it.
    assert_eq!(fake.ride_status("ride-1"), Some(RideStatus::Cancelled));
    assert_eq!(
        watcher.status_history().await,
        vec![
            RideStatus::Dispatched,
            RideStatus::InTransit,
            RideStatus::Cancelled,
        ]
    );

    let snapshot = watcher.snapshot().await;
    assert_eq!(snapshot.pickup, None);
    assert_eq!(snapshot.dropoff, None);
    assert_eq!(snapshot.driver_position, None);

    step(Duration::from_secs(5)).await;
    assert!(poll.is_finished());
    assert!(simulation.is_finished());
    poll.join().await;
    simulation.join().await;
}

#[tokio::test(start_paused = true)]
async fn estimate_failures_keep_the_last_displayed_value() {
    let fake = Arc::new(FakeRideService::new());

    let mut response = requested_ride("ride-1");
    response.status = RideStatus::Dispatched;
    fake.insert_ride(response.clone());

    let mut ride = Ride::from(response);
    ride.driver_id = Some(DriverId("driver-1".to_string()));
    ride.start_coords = Some(point(12.970, 77.590));
    ride.end_coords = Some(point(12.975, 77.595));

    let (notices, _notice_rx) = mpsc::channel(32);
    let watcher = Arc::new(RideWatcher::new(&ride, notices));
    // Seed the driver marker the way the first poll would.
    watcher.apply_remote(&ride, &config()).await;

    let simulation = start_movement_simulation(
        fake.clone() as Arc<dyn RideServiceApi>,
        fake.clone() as Arc<dyn GeoApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    settle().await;

    step(Duration::from_secs(5)).await;
    let first = watcher.snapshot().await.travel_estimate;
    assert!(first.is_some());

    fake.fail_estimates(true);
    step(Duration::from_secs(5)).await;
    assert_eq!(watcher.snapshot().await.travel_estimate, first);

    fake.fail_estimates(false);
    step(Duration::from_secs(5)).await;
    assert_ne!(watcher.snapshot().await.travel_estimate, first);

    simulation.stop().await;
}

#[tokio::test(start_paused = true)]
async fn poll_backs_off_and_gives_up_after_repeated_failures() {
    let fake = Arc::new(FakeRideService::new());
    fake.insert_ride(requested_ride("ride-1"));
    fake.fail_rides(true);

    let ride = Ride::from(requested_ride("ride-1"));
    let (notices, mut notice_rx) = mpsc::channel(32);
    let watcher = Arc::new(RideWatcher::new(&ride, notices));

    let poll = start_status_poll(
        fake.clone() as Arc<dyn RideServiceApi>,
        token(),
        Arc::clone(&watcher),
        config(),
    );
    settle().await;

    let mut steps = 0;
    while !poll.is_finished() {
        step(Duration::from_secs(5)).await;
        steps += 1;
        assert!(steps < 100, "poll never gave up");
    }
    poll.join().await;

    // Initial attempt plus one per retry budget entry.
    assert_eq!(fake.get_ride_calls.load(Ordering::SeqCst), 4);
    assert_eq!(watcher.status().await, RideStatus::Requested);

    let mut last = None;
    while let Ok(notice) = notice_rx.try_recv() {
        last = Some(notice);
    }
    let last = last.expect("a notice was surfaced");
    assert_eq!(last.severity, NoticeSeverity::Error);
}
