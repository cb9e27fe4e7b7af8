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
use alioss_core::time::{format_rfc3339, now, parse_rfc3339};
use alioss_core::utils::percent_encode_query;
use alioss_core::{Context, Error, ProvideCredential, Result};
use async_trait::async_trait;
use bytes::Bytes;
use log::debug;
use serde::Deserialize;

/// AssumeRoleWithOidcCredentialProvider loads credential via STS `AssumeRoleWithOIDC`.
///
/// Values set through the builder win; missing ones are read from the environment:
/// - `ALIBABA_CLOUD_ROLE_ARN`: The ARN of the role to assume
/// - `ALIBABA_CLOUD_OIDC_PROVIDER_ARN`: The ARN of the OIDC provider
/// - `ALIBABA_CLOUD_OIDC_TOKEN_FILE`: Path to the OIDC token file
/// - `ALIBABA_CLOUD_ROLE_SESSION_NAME`: Optional session name
/// - `ALIBABA_CLOUD_STS_ENDPOINT`: Optional custom STS endpoint
#[derive(Debug, Default, Clone)]
pub struct AssumeRoleWithOidcCredentialProvider {
    role_arn: Option<String>,
    oidc_provider_arn: Option<String>,
    oidc_token_file: Option<String>,
    role_session_name: Option<String>,
    sts_endpoint: Option<String>,
}

impl AssumeRoleWithOidcCredentialProvider {
    /// Create a new `AssumeRoleWithOidcCredentialProvider` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the role to assume.
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    /// Set the OIDC provider.
    pub fn with_oidc_provider_arn(mut self, arn: impl Into<String>) -> Self {
        self.oidc_provider_arn = Some(arn.into());
        self
    }

    /// Set the file holding the OIDC token.
    pub fn with_oidc_token_file(mut self, path: impl Into<String>) -> Self {
        self.oidc_token_file = Some(path.into());
        self
    }

    /// Set the role session name.
    pub fn with_role_session_name(mut self, name: impl Into<String>) -> Self {
        self.role_session_name = Some(name.into());
        self
    }

    /// Set the STS endpoint, with or without scheme.
    pub fn with_sts_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.sts_endpoint = Some(endpoint.into());
        self
    }

    fn get_sts_endpoint(&self, ctx: &Context) -> String {
        match self
            .sts_endpoint
            .clone()
            .or_else(|| ctx.env_var(ALIBABA_CLOUD_STS_ENDPOINT))
        {
            Some(endpoint) if endpoint.starts_with("http") => endpoint,
            Some(endpoint) => format!("https://{endpoint}"),
            None => DEFAULT_STS_ENDPOINT.to_string(),
        }
    }
}

#[async_trait]
impl ProvideCredential for AssumeRoleWithOidcCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let pick = |v: &Option<String>, key: &str| v.clone().or_else(|| ctx.env_var(key));

        let (Some(token_file), Some(role_arn), Some(provider_arn)) = (
            pick(&self.oidc_token_file, ALIBABA_CLOUD_OIDC_TOKEN_FILE),
            pick(&self.role_arn, ALIBABA_CLOUD_ROLE_ARN),
            pick(&self.oidc_provider_arn, ALIBABA_CLOUD_OIDC_PROVIDER_ARN),
        ) else {
            return Ok(None);
        };
        let role_session_name = pick(&self.role_session_name, ALIBABA_CLOUD_ROLE_SESSION_NAME)
            .unwrap_or_else(|| DEFAULT_ROLE_SESSION_NAME.to_string());

        let token = ctx.file_read_as_string(&token_file).await?;

        let timestamp = format_rfc3339(now());
        let params: [(&str, &str); 8] = [
            ("Action", "AssumeRoleWithOIDC"),
            ("Format", "JSON"),
            ("Version", "2015-04-01"),
            ("Timestamp", &timestamp),
            ("RoleArn", &role_arn),
            ("OIDCProviderArn", &provider_arn),
            ("RoleSessionName", &role_session_name),
            ("OIDCToken", token.trim()),
        ];
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={}", percent_encode_query(v)))
            .collect::<Vec<_>>()
            .join("&");
        let url = format!("{}/?{query}", self.get_sts_endpoint(ctx));

        let req = http::Request::builder()
            .method(http::Method::GET)
            .uri(&url)
            .header(
                http::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(Bytes::new())?;

        debug!("assume role {role_arn} with oidc provider {provider_arn}");
        let resp = ctx.http_send(req).await?;

        if resp.status() != http::StatusCode::OK {
            let content = String::from_utf8_lossy(resp.body());
            let err = Error::credential_denied(format!(
                "request to STS AssumeRoleWithOIDC failed: {content}"
            ));
            return Err(if resp.status().is_server_error() {
                err.set_temporary()
            } else {
                err
            });
        }

        let resp: AssumeRoleWithOidcResponse = serde_json::from_slice(resp.body()).map_err(|e| {
            Error::unexpected("failed to parse STS response").with_source(e)
        })?;
        let resp_cred = resp.credentials;

        Ok(Some(Credential {
            access_key_id: resp_cred.access_key_id,
            access_key_secret: resp_cred.access_key_secret,
            security_token: Some(resp_cred.security_token),
            expires_in: Some(parse_rfc3339(&resp_cred.expiration)?),
        }))
    }
}

#[derive(Default, Debug, Deserialize)]
#[serde(default)]
struct AssumeRoleWithOidcResponse {
    #[serde(rename = "Credentials")]
    credentials: AssumeRoleWithOidcCredentials,
}

#[derive(Default, Debug, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct AssumeRoleWithOidcCredentials {
    access_key_id: String,
    access_key_secret: String,
    security_token: String,
    expiration: String,
}
