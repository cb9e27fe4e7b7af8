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

//! Integration tests for ProvideCredentialChain with OSS credentials.

use alioss_auth::{Credential, EnvCredentialProvider, StaticCredentialProvider};
use alioss_core::{Context, ProvideCredential, ProvideCredentialChain, Result, StaticEnv};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Mock provider that tracks how many times it was called.
#[derive(Debug)]
struct CountingProvider {
    name: String,
    return_credential: bool,
    call_count: Arc<Mutex<usize>>,
}

#[async_trait]
impl ProvideCredential for CountingProvider {
    type Credential = Credential;

    async fn provide_credential(&self, _ctx: &Context) -> Result<Option<Self::Credential>> {
        *self.call_count.lock().unwrap() += 1;

        Ok(self
            .return_credential
            .then(|| Credential::new(format!("{}_key", self.name), format!("{}_secret", self.name))))
    }
}

fn counting(name: &str, return_credential: bool) -> (CountingProvider, Arc<Mutex<usize>>) {
    let count = Arc::new(Mutex::new(0));
    (
        CountingProvider {
            name: name.to_string(),
            return_credential,
            call_count: count.clone(),
        },
        count,
    )
}

#[tokio::test]
async fn test_chain_stops_at_first_success() {
    let ctx = Context::new();

    let (p1, count1) = counting("provider1", false);
    let (p2, count2) = counting("provider2", true);
    let (p3, count3) = counting("provider3", true);
    let chain = ProvideCredentialChain::new().push(p1).push(p2).push(p3);

    let cred = chain.provide_credential(&ctx).await.unwrap().unwrap();
    assert_eq!(cred.access_key_id, "provider2_key");

    assert_eq!(*count1.lock().unwrap(), 1);
    assert_eq!(*count2.lock().unwrap(), 1);
    assert_eq!(*count3.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_chain_env_then_static() {
    let ctx = Context::new().with_env(StaticEnv {
        home_dir: None,
        envs: HashMap::new(),
    });

    let chain = ProvideCredentialChain::new()
        .push(EnvCredentialProvider::new())
        .push(StaticCredentialProvider::new("static_ak", "static_sk"));

    let cred = chain.provide_credential(&ctx).await.unwrap().unwrap();
    assert_eq!(cred.access_key_id, "static_ak");
    assert_eq!(cred.access_key_secret, "static_sk");
}
