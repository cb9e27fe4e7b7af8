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

//! Live tests against a real bucket, enabled with `ALIOSS_TEST=on`.

use alioss::{
    Client, Config, DeleteMultipleObjectsRequest, ErrorKind, GetObjectRequest, HeadObjectRequest,
    ListObjectsV2Request, ObjectIdentifier, ObjectRequest, PresignOptions, PutObjectRequest, Result,
    SignatureVersion,
};
use alioss_auth::StaticCredentialProvider;
use alioss_core::Context;
use alioss_http_send_reqwest::ReqwestHttpSend;
use futures::TryStreamExt;
use log::warn;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::env;

struct Setup {
    client: Client,
    bucket: String,
    prefix: String,
}

fn init(version: SignatureVersion) -> Option<Setup> {
    let _ = env_logger::builder().is_test(true).try_init();
    let _ = dotenv::dotenv();

    if env::var("ALIOSS_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let access_key_id =
        env::var("ALIOSS_ACCESS_KEY_ID").expect("env ALIOSS_ACCESS_KEY_ID must set");
    let access_key_secret =
        env::var("ALIOSS_ACCESS_KEY_SECRET").expect("env ALIOSS_ACCESS_KEY_SECRET must set");
    let region = env::var("ALIOSS_REGION").expect("env ALIOSS_REGION must set");

    let config = Config::new(&region).with_signature_version(version);
    let client = Client::with_credential_provider(
        config,
        Context::new().with_http_send(ReqwestHttpSend::default()),
        StaticCredentialProvider::new(&access_key_id, &access_key_secret),
    )
    .expect("client must be valid");
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    Some(Setup {
        client,
        bucket: env::var("ALIOSS_BUCKET").expect("env ALIOSS_BUCKET must set"),
        prefix: format!("alioss-test/{suffix}/"),
    })
}

#[tokio::test]
async fn test_object_lifecycle_v4() -> Result<()> {
    let Some(setup) = init(SignatureVersion::V4) else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };
    object_lifecycle(setup).await
}

#[tokio::test]
async fn test_object_lifecycle_v1() -> Result<()> {
    let Some(setup) = init(SignatureVersion::V1) else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };
    object_lifecycle(setup).await
}

async fn object_lifecycle(setup: Setup) -> Result<()> {
    let Setup {
        client,
        bucket,
        prefix,
    } = setup;
    let key = format!("{prefix}hello world.txt");

    client
        .put_object(
            &PutObjectRequest::new(&bucket, &key)
                .with_content_type("text/plain")
                .with_metadata("owner", "alioss")
                .with_body("hello, oss"),
        )
        .await?;

    let meta = client.head_object(&HeadObjectRequest::new(&bucket, &key)).await?;
    assert_eq!(meta.content_length, 10);
    assert_eq!(meta.metadata.get("owner").map(String::as_str), Some("alioss"));

    let out = client
        .get_object(&GetObjectRequest::new(&bucket, &key).with_range(0, 4))
        .await?;
    assert_eq!(out.body.as_ref(), b"hello");

    let pages: Vec<_> = client
        .paginator(ListObjectsV2Request::new(&bucket).with_prefix(&prefix))
        .into_stream()
        .try_collect()
        .await?;
    let keys: Vec<String> = pages
        .into_iter()
        .flat_map(|p| p.contents)
        .map(|o| o.key)
        .collect();
    assert_eq!(keys, vec![key.clone()]);

    client
        .delete_object(&ObjectRequest::new(&bucket, &key))
        .await?;
    assert!(!client.is_object_exist(&bucket, &key).await?);
    Ok(())
}

#[tokio::test]
async fn test_not_exist_object() -> Result<()> {
    let Some(setup) = init(SignatureVersion::V4) else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };

    let err = setup
        .client
        .get_object(&GetObjectRequest::new(&setup.bucket, "not_exist_file"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.operation(), "GetObject");
    let se = err.service_error().expect("must carry service error");
    assert_eq!(se.status_code, 404);
    assert_eq!(se.code, "NoSuchKey");
    assert!(!se.request_id.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_presign_get_object() -> Result<()> {
    let Some(setup) = init(SignatureVersion::V4) else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };

    let key = format!("{}presign.txt", setup.prefix);
    setup
        .client
        .put_object(&PutObjectRequest::new(&setup.bucket, &key).with_body("presigned"))
        .await?;

    let signed = setup
        .client
        .presign(&GetObjectRequest::new(&setup.bucket, &key), PresignOptions::default())
        .await?;
    let body = reqwest::get(&signed.url)
        .await
        .expect("request must succeed")
        .text()
        .await
        .expect("body must be text");
    assert_eq!(body, "presigned");

    setup
        .client
        .delete_object(&ObjectRequest::new(&setup.bucket, &key))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_upload_and_download_file() -> Result<()> {
    let Some(setup) = init(SignatureVersion::V4) else {
        warn!("ALIOSS_TEST is not set, skipped");
        return Ok(());
    };

    let dir = tempfile::tempdir()?;
    let src = dir.path().join("src.bin");
    let content: Vec<u8> = rand::thread_rng()
        .sample_iter(rand::distributions::Standard)
        .take(700 * 1024)
        .collect();
    tokio::fs::write(&src, &content).await?;

    let key = format!("{}multipart.bin", setup.prefix);
    let uploaded = setup
        .client
        .uploader()
        .with_part_size(200 * 1024)
        .with_checkpoint_dir(dir.path())
        .upload_file(&PutObjectRequest::new(&setup.bucket, &key), &src)
        .await?;
    assert!(uploaded.upload_id.is_some());

    let dest = dir.path().join("dest.bin");
    let downloaded = setup
        .client
        .downloader()
        .with_part_size(256 * 1024)
        .download_file(&GetObjectRequest::new(&setup.bucket, &key), &dest)
        .await?;
    assert_eq!(downloaded.size, content.len() as u64);
    assert_eq!(tokio::fs::read(&dest).await?, content);

    setup
        .client
        .delete_multiple_objects(&DeleteMultipleObjectsRequest {
            bucket: setup.bucket.clone(),
            objects: vec![ObjectIdentifier::new(&key)],
            ..Default::default()
        })
        .await?;
    Ok(())
}
