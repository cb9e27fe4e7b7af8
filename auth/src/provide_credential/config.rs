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

use crate::provide_credential::{
    AssumeRoleWithOidcCredentialProvider, EcsRamRoleCredentialProvider, ProfileCredentialProvider,
};
use crate::{Config, Credential};
use alioss_core::{Context, ProvideCredential, Result};
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

/// ConfigCredentialProvider picks a credential source from [`Config`].
///
/// Fields left unset are filled from env at load time. The first complete
/// source wins:
///
/// 1. `access_key_id` + `access_key_secret` (+ `security_token`)
/// 2. `role_arn` + `oidc_provider_arn` + `oidc_token_file`
/// 3. `ecs_ram_role`
/// 4. `profile` or `config_file`
#[derive(Debug)]
pub struct ConfigCredentialProvider {
    config: Arc<Config>,
}

impl ConfigCredentialProvider {
    /// Create a new `ConfigCredentialProvider` instance.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for ConfigCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let cfg = self.config.as_ref().clone().from_env(ctx);

        if let (Some(ak), Some(sk)) = (&cfg.access_key_id, &cfg.access_key_secret) {
            debug!("load credential from config access key pair");
            return Ok(Some(Credential {
                security_token: cfg.security_token.clone(),
                ..Credential::new(ak, sk)
            }));
        }

        if let (Some(role), Some(provider), Some(token_file)) =
            (&cfg.role_arn, &cfg.oidc_provider_arn, &cfg.oidc_token_file)
        {
            debug!("load credential from config oidc role {role}");
            let mut p = AssumeRoleWithOidcCredentialProvider::new()
                .with_role_arn(role)
                .with_oidc_provider_arn(provider)
                .with_oidc_token_file(token_file)
                .with_role_session_name(&cfg.role_session_name);
            if let Some(ep) = &cfg.sts_endpoint {
                p = p.with_sts_endpoint(ep);
            }
            return p.provide_credential(ctx).await;
        }

        if let Some(role) = &cfg.ecs_ram_role {
            debug!("load credential from config ecs ram role {role}");
            return EcsRamRoleCredentialProvider::new()
                .with_role_name(role)
                .provide_credential(ctx)
                .await;
        }

        if cfg.profile.is_some() || cfg.config_file.is_some() {
            let mut p = ProfileCredentialProvider::new();
            if let Some(profile) = &cfg.profile {
                p = p.with_profile(profile);
            }
            if let Some(path) = &cfg.config_file {
                p = p.with_config_file(path);
            }
            return p.provide_credential(ctx).await;
        }

        Ok(None)
    }
}
