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

//! Live signing tests, enabled with `ALIOSS_TEST=on`.

use alioss_auth::{Credential, RequestSigner, RequestSignerV4, Resource, StaticCredentialProvider};
use alioss_core::{Context, Error, Result, SignRequest, Signer};
use alioss_http_send_reqwest::ReqwestHttpSend;
use bytes::Bytes;
use http::StatusCode;
use log::{debug, warn};
use std::env;
use std::time::Duration;

struct Setup {
    ctx: Context,
    bucket: String,
    region: String,
    provider: StaticCredentialProvider,
}

fn init() -> Option<Setup> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("ALIOSS_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let access_key_id =
        env::var("ALIOSS_ACCESS_KEY_ID").expect("env ALIOSS_ACCESS_KEY_ID must set");
    let access_key_secret =
        env::var("ALIOSS_ACCESS_KEY_SECRET").expect("env ALIOSS_ACCESS_KEY_SECRET must set");

    Some(Setup {
        ctx: Context::new().with_http_send(ReqwestHttpSend::default()),
        bucket: env::var("ALIOSS_BUCKET").expect("env ALIOSS_BUCKET must set"),
        region: env::var("ALIOSS_REGION").expect("env ALIOSS_REGION must set"),
        provider: StaticCredentialProvider::new(&access_key_id, &access_key_secret),
    })
}

fn not_exist_request(setup: &Setup) -> http::request::Parts {
    let mut parts = http::Request::get(format!(
        "https://{}.oss-{}.aliyuncs.com/not_exist_file",
        setup.bucket, setup.region
    ))
    .body(())
    .expect("request must be valid")
    .into_parts()
    .0;
    parts
        .extensions
        .insert(Resource::object(&setup.bucket, "not_exist_file"));
    parts
}

async fn send(ctx: &Context, parts: http::request::Parts) -> Result<StatusCode> {
    debug!("signed request: {parts:?}");
    let resp = ctx
        .http_send(http::Request::from_parts(parts, Bytes::new()))
        .await?;
    debug!("got response: {:?}", String::from_utf8_lossy(resp.body()));
    Ok(resp.status())
}

async fn sign_with(
    setup: Setup,
    builder: impl SignRequest<Credential = Credential>,
    expires_in: Option<Duration>,
) -> Result<StatusCode> {
    let parts = {
        let mut parts = not_exist_request(&setup);
        Signer::new(setup.ctx.clone(), setup.provider, builder)
            .sign(&mut parts, expires_in)
            .await?;
        parts
    };
    send(&setup.ctx, parts).await
}

#[tokio::test]
async fn test_get_object_v1() -> Result<()> {
    let Some(setup) = init() else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };

    let status = sign_with(setup, RequestSigner::new(), None).await?;
    assert_eq!(StatusCode::NOT_FOUND, status);
    Ok(())
}

#[tokio::test]
async fn test_get_object_v4() -> Result<()> {
    let Some(setup) = init() else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };

    let signer = RequestSignerV4::new(&setup.region);
    let status = sign_with(setup, signer, None).await?;
    assert_eq!(StatusCode::NOT_FOUND, status);
    Ok(())
}

#[tokio::test]
async fn test_presign_get_object_v4() -> Result<()> {
    let Some(setup) = init() else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };

    let signer = RequestSignerV4::new(&setup.region);
    let status = sign_with(setup, signer, Some(Duration::from_secs(600))).await?;
    if status == StatusCode::FORBIDDEN {
        return Err(Error::unexpected("presigned url was rejected"));
    }
    assert_eq!(StatusCode::NOT_FOUND, status);
    Ok(())
}
