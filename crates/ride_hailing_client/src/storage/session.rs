/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use super::KeyValueStorage;
use crate::common::types::*;
use crate::tools::error::AppError;
use std::str::FromStr;
use std::sync::Arc;

// Key names match the mobile shell's device storage so a stored session
// survives a client swap.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const USER_KEY: &str = "user";
pub const ROLE_KEY: &str = "role";
pub const ACTIVE_RIDE_KEY: &str = "activeRideId";

/// Owns the session keys on top of the opaque key-value storage.
#[derive(Clone)]
pub struct SessionStorage {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStorage {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        SessionStorage { storage }
    }

    pub async fn store_session(&self, session: &Session) -> Result<(), AppError> {
        let user = serde_json::to_string(&session.user)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;

        self.storage
            .set(ACCESS_TOKEN_KEY, &session.access_token.inner())
            .await?;
        self.storage.set(USER_KEY, &user).await?;
        self.storage
            .set(ROLE_KEY, &session.role.to_string())
            .await?;
        Ok(())
    }

    /// Restores the persisted session, if any. Read once at app start.
    pub async fn load_session(&self) -> Result<Option<Session>, AppError> {
        let token = self.storage.get(ACCESS_TOKEN_KEY).await?;
        let user = self.storage.get(USER_KEY).await?;
        let role = self.storage.get(ROLE_KEY).await?;

        let (Some(token), Some(user), Some(role)) = (token, user, role) else {
            return Ok(None);
        };

        let user: SessionUser = serde_json::from_str(&user)
            .map_err(|err| AppError::DeserializationError(err.to_string()))?;
        let role = Role::from_str(&role).map_err(|_| AppError::InvalidRole(role))?;

        Ok(Some(Session {
            access_token: AccessToken(token),
            user,
            role,
        }))
    }

    pub async fn clear_session(&self) -> Result<(), AppError> {
        self.storage.remove(ACCESS_TOKEN_KEY).await?;
        self.storage.remove(USER_KEY).await?;
        self.storage.remove(ROLE_KEY).await?;
        self.storage.remove(ACTIVE_RIDE_KEY).await?;
        Ok(())
    }

    pub async fn store_active_ride(&self, ride_id: &RideId) -> Result<(), AppError> {
        self.storage.set(ACTIVE_RIDE_KEY, &ride_id.inner()).await
    }

    pub async fn load_active_ride(&self) -> Result<Option<RideId>, AppError> {
        Ok(self.storage.get(ACTIVE_RIDE_KEY).await?.map(RideId))
    }

    pub async fn clear_active_ride(&self) -> Result<(), AppError> {
        self.storage.remove(ACTIVE_RIDE_KEY).await
    }
}
