/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct RideId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct RiderId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct DriverId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
#[macros::impl_getter]
pub struct UserId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, PartialEq)]
#[macros::impl_getter]
pub struct AccessToken(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
#[macros::impl_getter]
pub struct Latitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
#[macros::impl_getter]
pub struct Longitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Hash, Ord)]
#[macros::impl_getter]
pub struct TimeStamp(pub DateTime<Utc>);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub lat: Latitude,
    pub lon: Longitude,
}

/// Authoritative ride lifecycle. The remote service owns the current value;
/// the client converges to it within one polling interval.
#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
pub enum RideStatus {
    Requested,
    Dispatched,
    InTransit,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// Transition partial order. `Cancelled` is reachable only while the
    /// passenger has not been picked up.
    pub fn can_transition_to(&self, next: RideStatus) -> bool {
        matches!(
            (self, next),
            (RideStatus::Requested, RideStatus::Dispatched)
                | (RideStatus::Requested, RideStatus::Cancelled)
                | (RideStatus::Dispatched, RideStatus::InTransit)
                | (RideStatus::Dispatched, RideStatus::Cancelled)
                | (RideStatus::InTransit, RideStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Rider,
    Driver,
}

/// Client-side cached copy of a ride record, read-mostly, refreshed per poll.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Ride {
    pub id: RideId,
    pub rider_id: RiderId,
    pub driver_id: Option<DriverId>,
    pub start_location: String,
    pub end_location: String,
    pub start_coords: Option<Point>,
    pub end_coords: Option<Point>,
    pub status: RideStatus,
    pub fare: Option<f64>,
    pub distance: Option<f64>,
    pub created_at: Option<TimeStamp>,
    pub updated_at: Option<TimeStamp>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

/// Created at sign-in, destroyed at sign-out, read once at app start.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct Session {
    pub access_token: AccessToken,
    pub user: SessionUser,
    pub role: Role,
}

/// ETA/distance display values from the distance/duration lookup service.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
pub struct TravelEstimate {
    pub duration_text: String,
    pub distance_text: String,
}

#[derive(Debug, Clone, Copy, Display, Serialize, Eq, PartialEq)]
pub enum NoticeSeverity {
    Info,
    Warning,
    Error,
}

/// Non-blocking transient notice (banner/snackbar analog) surfaced to the
/// shell instead of crashing a screen.
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub severity: NoticeSeverity,
    pub message: String,
}

impl Notice {
    pub fn warning(message: impl Into<String>) -> Self {
        Notice {
            severity: NoticeSeverity::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice {
            severity: NoticeSeverity::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct APISuccess {
    result: String,
}

impl Default for APISuccess {
    fn default() -> Self {
        Self {
            result: "Success".to_string(),
        }
    }
}
