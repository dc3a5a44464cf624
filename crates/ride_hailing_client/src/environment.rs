/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::common::types::{Notice, Role, Session};
use crate::coordinator::backoff::RetryConfig;
use crate::coordinator::controller::{DriverController, RideController, RiderController};
use crate::coordinator::watcher::CoordinatorConfig;
use crate::outbound::external::{GeoApi, HttpGeoApi, HttpRideServiceApi, RideServiceApi};
use crate::outbound::types::{SigninRequest, SignupRequest};
use crate::storage::{session::SessionStorage, FileStorage};
use crate::tools::{error::AppError, logger::LoggerConfig};
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub logger_cfg: LoggerConfig,
    pub ride_service_url: String,
    pub geo_service_url: String,
    pub storage_path: String,
    pub request_timeout: u64,
    pub ride_poll_interval_secs: u64,
    pub simulation_interval_secs: u64,
    pub simulation_step_degrees: f64,
    pub arrival_threshold_km: f64,
    pub driver_spawn_offset_degrees: f64,
    pub retry_cfg: RetryConfig,
    pub notice_buffer_size: usize,
}

/// Everything the running client shares: outbound clients, session storage
/// and the coordinator tuning knobs.
pub struct AppState {
    pub ride_api: Arc<dyn RideServiceApi>,
    pub geo_api: Arc<dyn GeoApi>,
    pub sessions: SessionStorage,
    pub coordinator_cfg: CoordinatorConfig,
    pub notices: mpsc::Sender<Notice>,
}

impl AppState {
    pub async fn new(
        app_config: AppConfig,
        notices: mpsc::Sender<Notice>,
    ) -> Result<AppState, AppError> {
        let ride_service_url = Url::parse(&app_config.ride_service_url).map_err(|err| {
            AppError::InvalidConfiguration(format!(
                "ride_service_url {} : {err}",
                app_config.ride_service_url
            ))
        })?;
        let geo_service_url = Url::parse(&app_config.geo_service_url).map_err(|err| {
            AppError::InvalidConfiguration(format!(
                "geo_service_url {} : {err}",
                app_config.geo_service_url
            ))
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(app_config.request_timeout))
            .build()
            .map_err(|err| AppError::InvalidConfiguration(err.to_string()))?;

        let storage = Arc::new(FileStorage::open(&app_config.storage_path).await?);

        Ok(AppState {
            ride_api: Arc::new(HttpRideServiceApi::new(client.clone(), ride_service_url)),
            geo_api: Arc::new(HttpGeoApi::new(client, geo_service_url)),
            sessions: SessionStorage::new(storage),
            coordinator_cfg: CoordinatorConfig {
                poll_interval: Duration::from_secs(app_config.ride_poll_interval_secs),
                simulation_interval: Duration::from_secs(app_config.simulation_interval_secs),
                simulation_step_degrees: app_config.simulation_step_degrees,
                arrival_threshold_km: app_config.arrival_threshold_km,
                driver_spawn_offset_degrees: app_config.driver_spawn_offset_degrees,
                retry: app_config.retry_cfg,
            },
            notices,
        })
    }

    /// Registers a new account and persists the resulting session. The
    /// remote service does not carry the role; the caller picked it at
    /// sign-up.
    pub async fn sign_up(&self, request: SignupRequest, role: Role) -> Result<Session, AppError> {
        let response = self.ride_api.signup(request).await?;
        let session = Session {
            access_token: response.access_token,
            user: response.user,
            role,
        };
        self.sessions.store_session(&session).await?;
        Ok(session)
    }

    pub async fn sign_in(&self, request: SigninRequest, role: Role) -> Result<Session, AppError> {
        let response = self.ride_api.signin(request).await?;
        let session = Session {
            access_token: response.access_token,
            user: response.user,
            role,
        };
        self.sessions.store_session(&session).await?;
        Ok(session)
    }

    /// Revokes the token remotely and clears the stored session either way.
    pub async fn sign_out(&self, session: &Session) -> Result<(), AppError> {
        let revoked = self.ride_api.signout(&session.access_token).await;
        self.sessions.clear_session().await?;
        revoked
    }

    /// Builds the controller matching the session's role. The session is
    /// handed over explicitly; nothing downstream reads ambient state.
    pub fn controller(&self, session: Session) -> Box<dyn RideController> {
        match session.role {
            Role::Rider => Box::new(RiderController::new(
                Arc::clone(&self.ride_api),
                Arc::clone(&self.geo_api),
                self.sessions.clone(),
                session,
                self.coordinator_cfg.clone(),
                self.notices.clone(),
            )),
            Role::Driver => Box::new(DriverController::new(
                Arc::clone(&self.ride_api),
                self.sessions.clone(),
                session,
                self.coordinator_cfg.clone(),
                self.notices.clone(),
            )),
        }
    }
}
