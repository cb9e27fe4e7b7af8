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
use alioss_core::{Context, Error, ProvideCredential, Result};
use async_trait::async_trait;
use log::debug;
use serde::Deserialize;

/// ProfileCredentialProvider loads credentials from the Alibaba Cloud CLI config file.
///
/// The file is `~/.aliyun/config.json` unless `ALIBABA_CLOUD_CONFIG_FILE` or
/// [`with_config_file`](Self::with_config_file) points elsewhere.
///
/// The profile to use is determined by:
/// 1. The profile specified via `with_profile()`
/// 2. The `ALIBABA_CLOUD_PROFILE` environment variable
/// 3. The `current` field of the config file
/// 4. Default to "default"
///
/// Only the `AK` and `StsToken` modes carry static credentials; other modes
/// are skipped so the next provider in the chain can handle them.
#[derive(Debug, Default, Clone)]
pub struct ProfileCredentialProvider {
    profile: Option<String>,
    config_file: Option<String>,
}

impl ProfileCredentialProvider {
    /// Create a new ProfileCredentialProvider with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the profile name to use.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Set the path to the config file.
    pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
        self.config_file = Some(path.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for ProfileCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let path = self
            .config_file
            .clone()
            .or_else(|| ctx.env_var(ALIBABA_CLOUD_CONFIG_FILE))
            .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());
        let Some(path) = ctx.expand_home_dir(&path) else {
            debug!("failed to expand homedir for path: {path}");
            return Ok(None);
        };

        let content = match ctx.file_read(&path).await {
            Ok(content) => content,
            Err(err) => {
                debug!("failed to read config file {path}: {err:?}");
                return Ok(None);
            }
        };

        let file: ConfigFile = serde_json::from_slice(&content).map_err(|e| {
            Error::config_invalid(format!("failed to parse config file {path}")).with_source(e)
        })?;

        let name = self
            .profile
            .clone()
            .or_else(|| ctx.env_var(ALIBABA_CLOUD_PROFILE))
            .or_else(|| file.current.clone().filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "default".to_string());
        let Some(profile) = file.profiles.into_iter().find(|p| p.name == name) else {
            debug!("profile {name} not found in config file {path}");
            return Ok(None);
        };

        match profile.mode.as_str() {
            "AK" | "StsToken" => {}
            mode => {
                debug!("profile {name} uses mode {mode} which carries no static credential");
                return Ok(None);
            }
        }

        if profile.access_key_id.is_empty() || profile.access_key_secret.is_empty() {
            return Err(Error::credential_invalid(format!(
                "profile {name} has no access key configured"
            )));
        }

        Ok(Some(Credential {
            access_key_id: profile.access_key_id,
            access_key_secret: profile.access_key_secret,
            security_token: (profile.mode == "StsToken" && !profile.sts_token.is_empty())
                .then_some(profile.sts_token),
            expires_in: None,
        }))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    current: Option<String>,
    profiles: Vec<Profile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Profile {
    name: String,
    mode: String,
    access_key_id: String,
    access_key_secret: String,
    sts_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alioss_core::StaticEnv;
    use alioss_file_read_tokio::TokioFileRead;
    use std::collections::HashMap;
    use std::io::Write;

    const CONFIG: &str = r#"{
  "current": "sts",
  "profiles": [
    {
      "name": "default",
      "mode": "AK",
      "access_key_id": "default_ak",
      "access_key_secret": "default_sk",
      "region_id": "cn-hangzhou",
      "output_format": "json"
    },
    {
      "name": "sts",
      "mode": "StsToken",
      "access_key_id": "STS.ak",
      "access_key_secret": "sts_sk",
      "sts_token": "sts_token"
    },
    {
      "name": "ecs",
      "mode": "EcsRamRole",
      "ram_role_name": "EcsRole"
    }
  ]
}"#;

    fn write_config() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();
        file
    }

    fn ctx(envs: HashMap<String, String>) -> Context {
        Context::new().with_file_read(TokioFileRead).with_env(StaticEnv {
            home_dir: None,
            envs,
        })
    }

    #[tokio::test]
    async fn test_profile_uses_current() -> Result<()> {
        let file = write_config();
        let provider = ProfileCredentialProvider::new()
            .with_config_file(file.path().to_string_lossy().to_string());

        let cred = provider
            .provide_credential(&ctx(HashMap::new()))
            .await?
            .expect("current profile must be loaded");
        assert_eq!(cred.access_key_id, "STS.ak");
        assert_eq!(cred.security_token.as_deref(), Some("sts_token"));
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_from_env() -> Result<()> {
        let file = write_config();
        let envs = HashMap::from([
            (ALIBABA_CLOUD_PROFILE.to_string(), "default".to_string()),
            (
                ALIBABA_CLOUD_CONFIG_FILE.to_string(),
                file.path().to_string_lossy().to_string(),
            ),
        ]);

        let cred = ProfileCredentialProvider::new()
            .provide_credential(&ctx(envs))
            .await?
            .expect("default profile must be loaded");
        assert_eq!(cred.access_key_id, "default_ak");
        assert!(cred.security_token.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_profile_skips_unsupported_mode_and_missing_file() -> Result<()> {
        let file = write_config();
        let provider = ProfileCredentialProvider::new()
            .with_profile("ecs")
            .with_config_file(file.path().to_string_lossy().to_string());
        assert!(provider.provide_credential(&ctx(HashMap::new())).await?.is_none());

        let provider =
            ProfileCredentialProvider::new().with_config_file("/not/exist/aliyun/config.json");
        assert!(provider.provide_credential(&ctx(HashMap::new())).await?.is_none());
        Ok(())
    }
}
