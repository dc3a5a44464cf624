/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::tools::error::AppError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::{error, info};

/// Sends an API request to the remote ride service or one of its collaborators.
///
/// Builds the request from the given method, URL, header pairs and optional
/// JSON body, issues it on the shared `Client`, and deserializes a successful
/// response into `T`. Transport failures, timeouts, authentication rejections
/// and malformed payloads are all mapped onto `AppError` so call sites can
/// stay `?`-only.
pub async fn call_api<T, U>(
    client: &Client,
    method: Method,
    url: &Url,
    headers: Vec<(&str, &str)>,
    body: Option<U>,
) -> Result<T, AppError>
where
    T: DeserializeOwned,
    U: Serialize + Debug,
{
    let start_time = std::time::Instant::now();
    let request_id = uuid::Uuid::new_v4();

    let mut header_map = HeaderMap::new();
    for (header_key, header_value) in headers {
        let header_name = HeaderName::from_str(header_key)
            .map_err(|_| AppError::InvalidRequest(format!("Invalid Header Name : {header_key}")))?;
        let header_value = HeaderValue::from_str(header_value).map_err(|_| {
            AppError::InvalidRequest(format!("Invalid Header Value : {header_value}"))
        })?;
        header_map.insert(header_name, header_value);
    }

    let mut request = client
        .request(method.to_owned(), url.to_owned())
        .headers(header_map);

    if let Some(body) = &body {
        let body = serde_json::to_string(body)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        request = request.header("content-type", "application/json").body(body);
    }

    let resp = request.send().await.map_err(|err| {
        error!(tag = "[OUTGOING API - ERROR]", request_id = %request_id, request_method = %method, request_url = %url, error = %err);
        if err.is_timeout() {
            AppError::RequestTimeout
        } else {
            AppError::ExternalAPICallError(err.to_string())
        }
    })?;

    let status = resp.status();

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        error!(tag = "[OUTGOING API - UNAUTHORIZED]", request_id = %request_id, request_method = %method, request_url = %url, response_status = %status);
        return Err(AppError::Unauthorized);
    }

    if !status.is_success() {
        let response_body = resp.text().await.unwrap_or_default();
        error!(tag = "[OUTGOING API - ERROR]", request_id = %request_id, request_method = %method, request_url = %url, response_status = %status, response_body = %response_body);
        return Err(AppError::ExternalAPICallError(format!(
            "{status} : {response_body}"
        )));
    }

    info!(tag = "[OUTGOING API]", request_id = %request_id, request_method = %method, request_body = format!("{:?}", body), request_url = %url, response_status = %status, latency = format!("{:?}ms", start_time.elapsed().as_millis()));

    resp.json::<T>()
        .await
        .map_err(|err| AppError::DeserializationError(err.to_string()))
}
