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

use crate::constants::*;
use alioss_core::Context;

/// Config carries all the configuration used to load OSS credentials.
#[derive(Clone, Debug)]
pub struct Config {
    /// `access_key_id` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_ID`]
    /// - env value: [`OSS_ACCESS_KEY_ID`]
    pub access_key_id: Option<String>,
    /// `access_key_secret` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ACCESS_KEY_SECRET`]
    /// - env value: [`OSS_ACCESS_KEY_SECRET`]
    pub access_key_secret: Option<String>,
    /// `security_token` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_SECURITY_TOKEN`]
    /// - env value: [`OSS_SESSION_TOKEN`]
    pub security_token: Option<String>,
    /// `role_arn` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ROLE_ARN`]
    pub role_arn: Option<String>,
    /// `role_session_name` will be loaded from
    ///
    /// - env value: [`ALIBABA_CLOUD_ROLE_SESSION_NAME`]
    /// - default to `alioss`
    pub role_session_name: String,
    /// `oidc_provider_arn` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_OIDC_PROVIDER_ARN`]
    pub oidc_provider_arn: Option<String>,
    /// `oidc_token_file` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_OIDC_TOKEN_FILE`]
    pub oidc_token_file: Option<String>,
    /// `sts_endpoint` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_STS_ENDPOINT`]
    pub sts_endpoint: Option<String>,
    /// RAM role attached to the ECS instance, loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_ECS_METADATA`]
    pub ecs_ram_role: Option<String>,
    /// Profile name in the CLI config file, loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_PROFILE`]
    pub profile: Option<String>,
    /// Path of the CLI config file, loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ALIBABA_CLOUD_CONFIG_FILE`]
    /// - default to `~/.aliyun/config.json`
    pub config_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key_id: None,
            access_key_secret: None,
            security_token: None,
            role_arn: None,
            role_session_name: DEFAULT_ROLE_SESSION_NAME.to_string(),
            oidc_provider_arn: None,
            oidc_token_file: None,
            sts_endpoint: None,
            ecs_ram_role: None,
            profile: None,
            config_file: None,
        }
    }
}

impl Config {
    /// Load config from env.
    ///
    /// Values already set are kept.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();
        let get = |primary: &str, legacy: Option<&str>| {
            envs.get(primary)
                .or_else(|| legacy.and_then(|k| envs.get(k)))
                .cloned()
        };

        if let Some(v) = get(ALIBABA_CLOUD_ACCESS_KEY_ID, Some(OSS_ACCESS_KEY_ID)) {
            self.access_key_id.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_ACCESS_KEY_SECRET, Some(OSS_ACCESS_KEY_SECRET)) {
            self.access_key_secret.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_SECURITY_TOKEN, Some(OSS_SESSION_TOKEN)) {
            self.security_token.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_ROLE_ARN, None) {
            self.role_arn.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_ROLE_SESSION_NAME, None) {
            self.role_session_name = v;
        }
        if let Some(v) = get(ALIBABA_CLOUD_OIDC_PROVIDER_ARN, None) {
            self.oidc_provider_arn.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_OIDC_TOKEN_FILE, None) {
            self.oidc_token_file.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_STS_ENDPOINT, None) {
            self.sts_endpoint.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_ECS_METADATA, None) {
            self.ecs_ram_role.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_PROFILE, None) {
            self.profile.get_or_insert(v);
        }
        if let Some(v) = get(ALIBABA_CLOUD_CONFIG_FILE, None) {
            self.config_file.get_or_insert(v);
        }

        self
    }
}
