/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use super::types::*;
use crate::common::types::*;
use crate::tools::{callapi::call_api, error::AppError};
use async_trait::async_trait;
use reqwest::{Client, Method, Url};

/// Remote ride service, treated as an opaque collaborator.
#[async_trait]
pub trait RideServiceApi: Send + Sync {
    async fn signup(&self, request: SignupRequest) -> Result<SigninResponse, AppError>;
    async fn signin(&self, request: SigninRequest) -> Result<SigninResponse, AppError>;
    async fn signout(&self, token: &AccessToken) -> Result<(), AppError>;

    async fn create_ride(
        &self,
        token: &AccessToken,
        request: CreateRideRequest,
    ) -> Result<RideResponse, AppError>;
    async fn get_ride(&self, token: &AccessToken, ride_id: &RideId)
        -> Result<RideResponse, AppError>;
    async fn list_rides(&self, token: &AccessToken) -> Result<Vec<RideResponse>, AppError>;
    async fn update_ride(
        &self,
        token: &AccessToken,
        ride_id: &RideId,
        request: UpdateRideRequest,
    ) -> Result<RideResponse, AppError>;

    async fn get_rider(
        &self,
        token: &AccessToken,
        rider_id: &RiderId,
    ) -> Result<RiderProfileResponse, AppError>;
    async fn get_driver(
        &self,
        token: &AccessToken,
        driver_id: &DriverId,
    ) -> Result<DriverProfileResponse, AppError>;
}

/// Geocoding and distance/duration lookups, an external service pair whose
/// internals this client does not own.
#[async_trait]
pub trait GeoApi: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Point, AppError>;
    async fn travel_estimate(
        &self,
        origin: &Point,
        destination: &Point,
    ) -> Result<TravelEstimate, AppError>;
}

pub struct HttpRideServiceApi {
    client: Client,
    base_url: Url,
}

impl HttpRideServiceApi {
    pub fn new(client: Client, base_url: Url) -> Self {
        HttpRideServiceApi { client, base_url }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AppError> {
        self.base_url
            .join(path)
            .map_err(|err| AppError::InvalidRequest(format!("Invalid endpoint {path} : {err}")))
    }
}

fn bearer(token: &AccessToken) -> String {
    format!("Bearer {}", token.inner())
}

#[async_trait]
impl RideServiceApi for HttpRideServiceApi {
    async fn signup(&self, request: SignupRequest) -> Result<SigninResponse, AppError> {
        call_api(
            &self.client,
            Method::POST,
            &self.endpoint("auth/signup")?,
            vec![],
            Some(request),
        )
        .await
    }

    async fn signin(&self, request: SigninRequest) -> Result<SigninResponse, AppError> {
        call_api(
            &self.client,
            Method::POST,
            &self.endpoint("auth/signin")?,
            vec![],
            Some(request),
        )
        .await
    }

    async fn signout(&self, token: &AccessToken) -> Result<(), AppError> {
        let _: APISuccess = call_api(
            &self.client,
            Method::POST,
            &self.endpoint("auth/signout")?,
            vec![("authorization", &bearer(token))],
            None::<()>,
        )
        .await?;
        Ok(())
    }

    async fn create_ride(
        &self,
        token: &AccessToken,
        request: CreateRideRequest,
    ) -> Result<RideResponse, AppError> {
        call_api(
            &self.client,
            Method::POST,
            &self.endpoint("rides")?,
            vec![("authorization", &bearer(token))],
            Some(request),
        )
        .await
    }

    async fn get_ride(
        &self,
        token: &AccessToken,
        ride_id: &RideId,
    ) -> Result<RideResponse, AppError> {
        call_api(
            &self.client,
            Method::GET,
            &self.endpoint(&format!("rides/{}", ride_id.inner()))?,
            vec![("authorization", &bearer(token))],
            None::<()>,
        )
        .await
    }

    async fn list_rides(&self, token: &AccessToken) -> Result<Vec<RideResponse>, AppError> {
        call_api(
            &self.client,
            Method::GET,
            &self.endpoint("rides")?,
            vec![("authorization", &bearer(token))],
            None::<()>,
        )
        .await
    }

    async fn update_ride(
        &self,
        token: &AccessToken,
        ride_id: &RideId,
        request: UpdateRideRequest,
    ) -> Result<RideResponse, AppError> {
        call_api(
            &self.client,
            Method::PUT,
            &self.endpoint(&format!("rides/{}", ride_id.inner()))?,
            vec![("authorization", &bearer(token))],
            Some(request),
        )
        .await
    }

    async fn get_rider(
        &self,
        token: &AccessToken,
        rider_id: &RiderId,
    ) -> Result<RiderProfileResponse, AppError> {
        call_api(
            &self.client,
            Method::GET,
            &self.endpoint(&format!("riders/{}", rider_id.inner()))?,
            vec![("authorization", &bearer(token))],
            None::<()>,
        )
        .await
    }

    async fn get_driver(
        &self,
        token: &AccessToken,
        driver_id: &DriverId,
    ) -> Result<DriverProfileResponse, AppError> {
        call_api(
            &self.client,
            Method::GET,
            &self.endpoint(&format!("drivers/{}", driver_id.inner()))?,
            vec![("authorization", &bearer(token))],
            None::<()>,
        )
        .await
    }
}

pub struct HttpGeoApi {
    client: Client,
    base_url: Url,
}

impl HttpGeoApi {
    pub fn new(client: Client, base_url: Url) -> Self {
        HttpGeoApi { client, base_url }
    }
}

#[async_trait]
impl GeoApi for HttpGeoApi {
    async fn geocode(&self, address: &str) -> Result<Point, AppError> {
        let mut url = self
            .base_url
            .join("geocode")
            .map_err(|err| AppError::InvalidRequest(err.to_string()))?;
        url.query_pairs_mut().append_pair("address", address);

        let resp: GeocodeResponse =
            call_api(&self.client, Method::GET, &url, vec![], None::<()>)
                .await
                .map_err(|err| AppError::GeocodingFailed(format!("{address} : {err}")))?;

        Ok(Point {
            lat: resp.latitude,
            lon: resp.longitude,
        })
    }

    async fn travel_estimate(
        &self,
        origin: &Point,
        destination: &Point,
    ) -> Result<TravelEstimate, AppError> {
        let mut url = self
            .base_url
            .join("distance")
            .map_err(|err| AppError::InvalidRequest(err.to_string()))?;
        url.query_pairs_mut()
            .append_pair(
                "origin",
                &format!("{},{}", origin.lat.inner(), origin.lon.inner()),
            )
            .append_pair(
                "destination",
                &format!(
                    "{},{}",
                    destination.lat.inner(),
                    destination.lon.inner()
                ),
            );

        let resp: DistanceMatrixResponse =
            call_api(&self.client, Method::GET, &url, vec![], None::<()>)
                .await
                .map_err(|err| AppError::DistanceLookupFailed(err.to_string()))?;

        Ok(resp.into())
    }
}
