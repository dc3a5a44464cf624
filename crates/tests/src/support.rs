/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
//! Shared fixtures for the paused-clock coordinator tests.

use ride_hailing_client::common::types::*;
use ride_hailing_client::coordinator::backoff::RetryConfig;
use ride_hailing_client::coordinator::watcher::CoordinatorConfig;
use ride_hailing_client::outbound::types::{PartyRef, RideResponse};
use std::time::Duration;

pub fn point(lat: f64, lon: f64) -> Point {
    Point {
        lat: Latitude(lat),
        lon: Longitude(lon),
    }
}

pub fn config() -> CoordinatorConfig {
    CoordinatorConfig {
        poll_interval: Duration::from_secs(5),
        simulation_interval: Duration::from_secs(5),
        simulation_step_degrees: 0.001,
        arrival_threshold_km: 0.05,
        driver_spawn_offset_degrees: 0.01,
        retry: RetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 8000,
            max_attempts: 3,
        },
    }
}

pub fn requested_ride(id: &str) -> RideResponse {
    RideResponse {
        id: RideId(id.to_string()),
        rider: Some(PartyRef {
            id: "user-1".to_string(),
        }),
        driver: None,
        start_location: "Home".to_string(),
        end_location: "Office".to_string(),
        pickup_time: None,
        dropoff_time: None,
        fare: None,
        distance: None,
        status: RideStatus::Requested,
        created_date: None,
        last_modified_date: None,
    }
}

pub fn session(role: Role) -> Session {
    Session {
        access_token: AccessToken("fake-token".to_string()),
        user: SessionUser {
            id: UserId("user-1".to_string()),
            name: "Fake User".to_string(),
            email: "user@example.com".to_string(),
        },
        role,
    }
}

/// Lets the spawned coordinator loops catch up on the current-thread
/// test runtime.
pub async fn settle() {
    for _ in 0..25 {
        tokio::task::yield_now().await;
    }
}

/// Advances the paused clock one interval and lets the loops react.
pub async fn step(interval: Duration) {
    tokio::time::advance(interval).await;
    settle().await;
}
