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

//! End to end tests against an in-memory fake of the object and multipart apis.

use alioss::{
    Client, Config, ErrorKind, GetObjectRequest, ListObjectsV2Request, PutObjectRequest,
};
use alioss_auth::StaticCredentialProvider;
use alioss_core::{Context, HttpSend};
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::{Method, Request, Response};
use pretty_assertions::assert_eq;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct State {
    objects: BTreeMap<String, Bytes>,
    uploads: HashMap<String, BTreeMap<i32, Bytes>>,
}

/// A fake bucket keeping objects in memory, served on virtual hosted urls.
#[derive(Debug, Clone, Default)]
struct MemoryOss {
    state: Arc<Mutex<State>>,
    transport_failures: Arc<AtomicUsize>,
}

fn reply(status: u16, headers: &[(&str, String)], body: impl Into<Bytes>) -> Response<Bytes> {
    let mut builder = Response::builder().status(status);
    for (k, v) in headers {
        builder = builder.header(*k, v.as_str());
    }
    builder.body(body.into()).unwrap()
}

fn etag(data: &[u8]) -> String {
    format!("\"{:x}\"", md5::compute(data))
}

fn params(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|kv| !kv.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.to_string(), percent_decode(v)),
            None => (kv.to_string(), String::new()),
        })
        .collect()
}

fn percent_decode(v: &str) -> String {
    percent_encoding::percent_decode_str(v)
        .decode_utf8_lossy()
        .into_owned()
}

impl MemoryOss {
    fn handle(&self, req: &Request<Bytes>) -> Response<Bytes> {
        assert!(req.headers().contains_key("authorization"));
        let key = percent_decode(req.uri().path().trim_start_matches('/'));
        let params = params(req.uri().query().unwrap_or_default());
        let mut state = self.state.lock().unwrap();
        let method = req.method();

        if method == Method::GET && key.is_empty() {
            let prefix = params.get("prefix").cloned().unwrap_or_default();
            let max: usize = params.get("max-keys").map_or(1000, |v| v.parse().unwrap());
            let after = params.get("continuation-token").cloned().unwrap_or_default();
            let keys: Vec<&String> = state
                .objects
                .keys()
                .filter(|k| k.starts_with(&prefix) && k.as_str() > after.as_str())
                .collect();
            let page = &keys[..keys.len().min(max)];
            let truncated = keys.len() > max;
            let contents: String = page
                .iter()
                .map(|k| format!("<Contents><Key>{k}</Key><Size>{}</Size></Contents>", state.objects[*k].len()))
                .collect();
            let token = if truncated {
                format!("<NextContinuationToken>{}</NextContinuationToken>", page[page.len() - 1])
            } else {
                String::new()
            };
            return reply(
                200,
                &[],
                format!("<ListBucketResult><IsTruncated>{truncated}</IsTruncated>{token}{contents}</ListBucketResult>"),
            );
        }

        if method == Method::POST && params.contains_key("uploads") {
            let id = format!("upload-{}", state.uploads.len() + 1);
            state.uploads.insert(id.clone(), BTreeMap::new());
            return reply(
                200,
                &[],
                format!("<InitiateMultipartUploadResult><Key>{key}</Key><UploadId>{id}</UploadId></InitiateMultipartUploadResult>"),
            );
        }

        if let Some(id) = params.get("uploadId") {
            let Some(parts) = state.uploads.get_mut(id) else {
                return reply(404, &[], "<Error><Code>NoSuchUpload</Code></Error>");
            };
            if method == Method::PUT {
                let n: i32 = params["partNumber"].parse().unwrap();
                parts.insert(n, req.body().clone());
                return reply(200, &[("etag", etag(req.body()))], "");
            }
            if method == Method::DELETE {
                state.uploads.remove(id);
                return reply(204, &[], "");
            }
            let parts = state.uploads.remove(id).unwrap_or_default();
            let data: Vec<u8> = parts.values().flat_map(|p| p.to_vec()).collect();
            let tag = etag(&data);
            state.objects.insert(key.clone(), Bytes::from(data));
            return reply(
                200,
                &[],
                format!("<CompleteMultipartUploadResult><Key>{key}</Key><ETag>{tag}</ETag></CompleteMultipartUploadResult>"),
            );
        }

        if method == Method::PUT {
            let tag = etag(req.body());
            state.objects.insert(key, req.body().clone());
            return reply(200, &[("etag", tag)], "");
        }

        let Some(data) = state.objects.get(&key).cloned() else {
            return reply(
                404,
                &[("x-oss-request-id", "req-404".to_string())],
                "<Error><Code>NoSuchKey</Code><Message>The specified key does not exist.</Message></Error>",
            );
        };
        let tag = etag(&data);
        if let Some(expected) = req.headers().get("if-match") {
            if expected.to_str().unwrap() != tag {
                return reply(412, &[], "<Error><Code>PreconditionFailed</Code></Error>");
            }
        }
        if method == Method::HEAD {
            return reply(200, &[("content-length", data.len().to_string()), ("etag", tag)], "");
        }
        if method == Method::DELETE {
            state.objects.remove(&key);
            return reply(204, &[], "");
        }
        match req.headers().get("range") {
            Some(range) => {
                let range = range.to_str().unwrap().trim_start_matches("bytes=");
                let (start, end) = range.split_once('-').unwrap();
                let (start, end): (usize, usize) = (start.parse().unwrap(), end.parse().unwrap());
                let end = end.min(data.len() - 1);
                reply(
                    206,
                    &[
                        ("etag", tag),
                        ("content-range", format!("bytes {start}-{end}/{}", data.len())),
                    ],
                    data.slice(start..=end),
                )
            }
            None => reply(200, &[("etag", tag)], data),
        }
    }
}

#[async_trait]
impl HttpSend for MemoryOss {
    async fn http_send(&self, req: Request<Bytes>) -> alioss_core::Result<Response<Bytes>> {
        let remaining = self.transport_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transport_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(alioss_core::Error::unexpected("connection reset").set_temporary());
        }
        Ok(self.handle(&req))
    }
}

fn client(oss: &MemoryOss) -> Client {
    let _ = env_logger::builder().is_test(true).try_init();

    let config = Config::new("cn-hangzhou")
        .with_retry_delay(Duration::from_millis(1), Duration::from_millis(5));
    Client::with_credential_provider(
        config,
        Context::new().with_http_send(oss.clone()),
        StaticCredentialProvider::new("ak", "sk"),
    )
    .unwrap()
}

#[tokio::test]
async fn test_upload_then_download() {
    let oss = MemoryOss::default();
    let client = client(&oss);
    let content: Vec<u8> = (0..350 * 1024u32).map(|i| (i % 241) as u8).collect();

    let uploaded = client
        .uploader()
        .with_part_size(100 * 1024)
        .upload_from(&PutObjectRequest::new("bucket", "dir/big.bin"), content.clone())
        .await
        .unwrap();
    assert_eq!(uploaded.upload_id.as_deref(), Some("upload-1"));
    assert_eq!(uploaded.etag, etag(&content));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("big.bin");
    let downloaded = client
        .downloader()
        .with_part_size(64 * 1024)
        .with_parallel(4)
        .download_file(&GetObjectRequest::new("bucket", "dir/big.bin"), &path)
        .await
        .unwrap();
    assert_eq!(downloaded.size, content.len() as u64);
    assert_eq!(tokio::fs::read(&path).await.unwrap(), content);
}

#[tokio::test]
async fn test_list_all_pages() {
    let oss = MemoryOss::default();
    let client = client(&oss);
    for i in 0..5 {
        client
            .put_object(&PutObjectRequest::new("bucket", &format!("logs/{i}.log")).with_body("x"))
            .await
            .unwrap();
    }
    client
        .put_object(&PutObjectRequest::new("bucket", "other.txt").with_body("y"))
        .await
        .unwrap();

    let pages: Vec<_> = client
        .paginator(ListObjectsV2Request::new("bucket").with_prefix("logs/"))
        .with_limit(2)
        .into_stream()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(pages.len(), 3);
    let keys: Vec<String> = pages
        .into_iter()
        .flat_map(|p| p.contents)
        .map(|o| o.key)
        .collect();
    assert_eq!(keys, vec!["logs/0.log", "logs/1.log", "logs/2.log", "logs/3.log", "logs/4.log"]);
}

#[tokio::test]
async fn test_transport_errors_are_retried() {
    let oss = MemoryOss::default();
    oss.transport_failures.store(2, Ordering::SeqCst);
    let client = client(&oss);

    client
        .put_object(&PutObjectRequest::new("bucket", "a.txt").with_body("retry"))
        .await
        .unwrap();
    assert!(client.is_object_exist("bucket", "a.txt").await.unwrap());

    oss.transport_failures.store(3, Ordering::SeqCst);
    let err = client
        .get_object(&GetObjectRequest::new("bucket", "a.txt"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.is_temporary());
}

#[tokio::test]
async fn test_service_error() {
    let oss = MemoryOss::default();
    let err = client(&oss)
        .get_object(&GetObjectRequest::new("bucket", "missing.txt"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(err.operation(), "GetObject");
    assert!(!err.is_temporary());

    let se = err.service_error().unwrap();
    assert_eq!(se.status_code, 404);
    assert_eq!(se.code, "NoSuchKey");
    assert_eq!(se.request_id, "req-404");
}
