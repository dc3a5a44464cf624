/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::types::*;
use serde::{Deserialize, Serialize};

// Payload shapes are whatever the remote ride service defines; aliases keep
// the Rust fields snake_case against its camelCase JSON.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub dob: String,
    pub gender: String,
    pub pronoun: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SigninResponse {
    #[serde(alias = "accessToken")]
    pub access_token: AccessToken,
    pub user: SessionUser,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PartyRef {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RideResponse {
    pub id: RideId,
    pub rider: Option<PartyRef>,
    pub driver: Option<PartyRef>,
    #[serde(alias = "startLocation")]
    pub start_location: String,
    #[serde(alias = "endLocation")]
    pub end_location: String,
    #[serde(alias = "pickupTime")]
    pub pickup_time: Option<TimeStamp>,
    #[serde(alias = "dropoffTime")]
    pub dropoff_time: Option<TimeStamp>,
    pub fare: Option<f64>,
    pub distance: Option<f64>,
    pub status: RideStatus,
    #[serde(alias = "createdDate")]
    pub created_date: Option<TimeStamp>,
    #[serde(alias = "lastModifiedDate")]
    pub last_modified_date: Option<TimeStamp>,
}

impl From<RideResponse> for Ride {
    fn from(resp: RideResponse) -> Self {
        Ride {
            id: resp.id,
            rider_id: RiderId(resp.rider.map(|r| r.id).unwrap_or_default()),
            driver_id: resp.driver.map(|d| DriverId(d.id)),
            start_location: resp.start_location,
            end_location: resp.end_location,
            // Coordinates are derived client-side via geocoding.
            start_coords: None,
            end_coords: None,
            status: resp.status,
            fare: resp.fare,
            distance: resp.distance,
            created_at: resp.created_date,
            updated_at: resp.last_modified_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRideRequest {
    pub rider_id: RiderId,
    pub start_location: String,
    pub end_location: String,
}

/// Partial update; only the populated fields are sent.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRideRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RideStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<DriverId>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RiderProfileResponse {
    pub id: RiderId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DriverProfileResponse {
    pub id: DriverId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub license_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub latitude: Latitude,
    pub longitude: Longitude,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceMatrixResponse {
    pub duration_text: String,
    pub distance_text: String,
}

impl From<DistanceMatrixResponse> for TravelEstimate {
    fn from(resp: DistanceMatrixResponse) -> Self {
        TravelEstimate {
            duration_text: resp.duration_text,
            distance_text: resp.distance_text,
        }
    }
}
