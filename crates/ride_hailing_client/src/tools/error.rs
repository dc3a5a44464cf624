/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use serde::Serialize;

#[macros::add_error]
pub enum AppError {
    InvalidRequest(String),
    InvalidConfiguration(String),
    ExternalAPICallError(String),
    SerializationError(String),
    DeserializationError(String),
    RequestTimeout,
    Unauthorized,
    InvalidRole(String),
    RideNotFound(String),
    InvalidRideStatus(String, String),
    GeocodingFailed(String),
    DistanceLookupFailed(String),
    StorageReadFailed(String),
    StorageWriteFailed(String),
    PollRetriesExhausted(String),
}

impl AppError {
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidRequest(err) => err.to_string(),
            AppError::InvalidConfiguration(err) => err.to_string(),
            AppError::ExternalAPICallError(err) => err.to_string(),
            AppError::SerializationError(err) => err.to_string(),
            AppError::DeserializationError(err) => err.to_string(),
            AppError::RequestTimeout => "Request to remote service timed out".to_string(),
            AppError::Unauthorized => "Session is invalid or expired".to_string(),
            AppError::InvalidRole(role) => format!("Invalid session role : {role}"),
            AppError::RideNotFound(ride_id) => format!("Ride not found : {ride_id}"),
            AppError::InvalidRideStatus(ride_id, ride_status) => {
                format!("Invalid Ride Status : RideId - {ride_id}, Ride Status - {ride_status}")
            }
            AppError::GeocodingFailed(address) => format!("Failed to geocode : {address}"),
            AppError::DistanceLookupFailed(err) => {
                format!("Distance/duration lookup failed : {err}")
            }
            AppError::StorageReadFailed(key) => format!("Failed to read stored value : {key}"),
            AppError::StorageWriteFailed(key) => format!("Failed to write stored value : {key}"),
            AppError::PollRetriesExhausted(ride_id) => {
                format!("Polling retry budget exhausted : {ride_id}")
            }
        }
    }

    pub fn code(&self) -> String {
        match self {
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            AppError::ExternalAPICallError(_) => "EXTERNAL_API_CALL_ERROR",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
            AppError::DeserializationError(_) => "DESERIALIZATION_ERROR",
            AppError::RequestTimeout => "REQUEST_TIMEOUT",
            AppError::Unauthorized => "INVALID_TOKEN",
            AppError::InvalidRole(_) => "INVALID_ROLE",
            AppError::RideNotFound(_) => "RIDE_NOT_FOUND",
            AppError::InvalidRideStatus(_, _) => "INVALID_RIDE_STATUS",
            AppError::GeocodingFailed(_) => "GEOCODING_FAILED",
            AppError::DistanceLookupFailed(_) => "DISTANCE_LOOKUP_FAILED",
            AppError::StorageReadFailed(_) => "STORAGE_READ_FAILED",
            AppError::StorageWriteFailed(_) => "STORAGE_WRITE_FAILED",
            AppError::PollRetriesExhausted(_) => "POLL_RETRIES_EXHAUSTED",
        }
        .to_string()
    }
}
