// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::{constants::*, Credential};
use alioss_core::time::{now, parse_rfc3339, DateTime};
use alioss_core::{Context, Error, ProvideCredential, Result};
use async_trait::async_trait;
use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::{Method, StatusCode};
use log::debug;
use serde::Deserialize;
use std::sync::{Arc, Mutex};

const METADATA_TOKEN_TTL_SECONDS: i64 = 21600;

/// EcsRamRoleCredentialProvider loads credentials of the RAM role attached to an ECS instance.
///
/// The role name comes from [`with_role_name`](Self::with_role_name) or
/// `ALIBABA_CLOUD_ECS_METADATA`. Without a role name the provider does nothing
/// unless [`with_role_discovery`](Self::with_role_discovery) is enabled, in which
/// case the attached role is listed from the metadata service first.
///
/// A metadata session token is requested before every credential fetch and
/// cached; when the instance does not support it, requests go without token.
/// Set `ALIBABA_CLOUD_ECS_METADATA_DISABLED=true` to disable this provider.
#[derive(Debug, Clone)]
pub struct EcsRamRoleCredentialProvider {
    endpoint: String,
    role_name: Option<String>,
    discover_role: bool,
    token: Arc<Mutex<(String, DateTime)>>,
}

impl Default for EcsRamRoleCredentialProvider {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ECS_METADATA_ENDPOINT.to_string(),
            role_name: None,
            discover_role: false,
            token: Arc::new(Mutex::new((String::new(), DateTime::default()))),
        }
    }
}

impl EcsRamRoleCredentialProvider {
    /// Create a new `EcsRamRoleCredentialProvider` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint for the metadata service.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the RAM role name.
    pub fn with_role_name(mut self, role_name: impl Into<String>) -> Self {
        self.role_name = Some(role_name.into());
        self
    }

    /// List the attached role from the metadata service when no role name is configured.
    pub fn with_role_discovery(mut self) -> Self {
        self.discover_role = true;
        self
    }

    async fn load_metadata_token(&self, ctx: &Context) -> Option<String> {
        {
            let (token, expires_in) = self.token.lock().expect("lock poisoned").clone();
            if expires_in > now() {
                return Some(token);
            }
        }

        let req = http::Request::builder()
            .method(Method::PUT)
            .uri(format!("{}/latest/api/token", self.endpoint))
            .header(CONTENT_LENGTH, "0")
            .header(
                "X-aliyun-ecs-metadata-token-ttl-seconds",
                METADATA_TOKEN_TTL_SECONDS.to_string(),
            )
            .body(Bytes::new())
            .ok()?;

        let resp = match ctx.http_send_as_string(req).await {
            Ok(resp) if resp.status() == StatusCode::OK => resp,
            Ok(resp) => {
                debug!("metadata token is not available: {}", resp.status());
                return None;
            }
            Err(err) => {
                debug!("failed to fetch metadata token: {err:?}");
                return None;
            }
        };

        let token = resp.into_body();
        // Refresh 10 minutes before the token expires.
        let expires_in = now()
            + chrono::TimeDelta::try_seconds(METADATA_TOKEN_TTL_SECONDS - 600).expect("in bounds");
        *self.token.lock().expect("lock poisoned") = (token.clone(), expires_in);
        Some(token)
    }

    async fn get(&self, ctx: &Context, path: &str, token: Option<&str>) -> Result<String> {
        let mut req = http::Request::builder()
            .method(Method::GET)
            .uri(format!("{}{path}", self.endpoint));
        if let Some(token) = token {
            req = req.header("X-aliyun-ecs-metadata-token", token);
        }

        let resp = ctx
            .http_send_as_string(req.body(Bytes::new())?)
            .await
            .map_err(|e| {
                Error::unexpected("failed to connect to ECS metadata service")
                    .with_source(e)
                    .set_temporary()
            })?;

        if resp.status() != StatusCode::OK {
            let err = Error::credential_denied(format!(
                "ECS metadata request {path} failed with {}: {}",
                resp.status(),
                resp.body()
            ));
            return Err(if resp.status().is_server_error() {
                err.set_temporary()
            } else {
                err
            });
        }

        Ok(resp.into_body())
    }
}

#[async_trait]
impl ProvideCredential for EcsRamRoleCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        if ctx
            .env_var(ALIBABA_CLOUD_ECS_METADATA_DISABLED)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
        {
            return Ok(None);
        }

        let role_name = self
            .role_name
            .clone()
            .or_else(|| ctx.env_var(ALIBABA_CLOUD_ECS_METADATA))
            .filter(|v| !v.is_empty());
        if role_name.is_none() && !self.discover_role {
            return Ok(None);
        }

        let token = self.load_metadata_token(ctx).await;

        let role_name = match role_name {
            Some(v) => v,
            None => {
                let listed = self
                    .get(ctx, "/latest/meta-data/ram/security-credentials/", token.as_deref())
                    .await?;
                let listed = listed.trim().to_string();
                if listed.is_empty() {
                    return Err(Error::config_invalid("no RAM role attached to ECS instance"));
                }
                listed
            }
        };

        let content = self
            .get(
                ctx,
                &format!("/latest/meta-data/ram/security-credentials/{role_name}"),
                token.as_deref(),
            )
            .await?;
        let resp: EcsRamRoleResponse = serde_json::from_str(&content).map_err(|e| {
            Error::unexpected("failed to parse ECS RAM role credential").with_source(e)
        })?;
        if resp.code != "Success" {
            return Err(Error::credential_denied(format!(
                "ECS metadata service returned code {}",
                resp.code
            )));
        }

        Ok(Some(Credential {
            access_key_id: resp.access_key_id,
            access_key_secret: resp.access_key_secret,
            security_token: Some(resp.security_token),
            expires_in: Some(parse_rfc3339(&resp.expiration)?),
        }))
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct EcsRamRoleResponse {
    code: String,
    access_key_id: String,
    access_key_secret: String,
    security_token: String,
    expiration: String,
}
