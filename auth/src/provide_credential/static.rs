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

use crate::Credential;
use alioss_core::{Context, ProvideCredential, Result};
use async_trait::async_trait;

/// StaticCredentialProvider always returns the same credential.
///
/// An empty key pair yields no credential so a chain can move on.
#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credential: Credential,
}

impl StaticCredentialProvider {
    /// Create from an access key pair.
    pub fn new(access_key_id: &str, access_key_secret: &str) -> Self {
        Self::from_credential(Credential::new(access_key_id, access_key_secret))
    }

    /// Create from a credential, e.g. one issued by STS out of band.
    pub fn from_credential(credential: Credential) -> Self {
        Self { credential }
    }

    /// Set the STS security token.
    pub fn with_security_token(mut self, token: &str) -> Self {
        self.credential.security_token = Some(token.to_string());
        self
    }
}

#[async_trait]
impl ProvideCredential for StaticCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
        if self.credential.access_key_id.is_empty() || self.credential.access_key_secret.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.credential.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alioss_core::time::now;

    #[tokio::test]
    async fn test_static_credential_provider() -> Result<()> {
        let ctx = Context::new();

        let cred = StaticCredentialProvider::new("ak", "sk")
            .with_security_token("sts-token")
            .provide_credential(&ctx)
            .await?
            .expect("static provider must return credential");
        assert_eq!(cred.access_key_id, "ak");
        assert_eq!(cred.security_token.as_deref(), Some("sts-token"));

        let expires = now() + chrono::TimeDelta::try_hours(1).expect("in bounds");
        let cred = StaticCredentialProvider::from_credential(Credential {
            expires_in: Some(expires),
            ..Credential::new("ak", "sk")
        })
        .provide_credential(&ctx)
        .await?
        .expect("static provider must return credential");
        assert_eq!(cred.expires_in, Some(expires));

        Ok(())
    }

    #[tokio::test]
    async fn test_static_empty_key_pair() -> Result<()> {
        let cred = StaticCredentialProvider::new("", "")
            .provide_credential(&Context::new())
            .await?;
        assert!(cred.is_none());
        Ok(())
    }
}
