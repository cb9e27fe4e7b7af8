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

//! Mock transport shared by unit tests.

use crate::client::Client;
use crate::config::Config;
use alioss_auth::StaticCredentialProvider;
use alioss_core::{Context, HttpSend};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::fmt::{Debug, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Handler = dyn Fn(&http::Request<Bytes>) -> http::Response<Bytes> + Send + Sync;

/// MockHttpSend replies with queued responses, or with a handler once the queue is empty.
#[derive(Clone, Default)]
pub struct MockHttpSend {
    replies: Arc<Mutex<VecDeque<http::Response<Bytes>>>>,
    handler: Option<Arc<Handler>>,
    requests: Arc<Mutex<Vec<http::Request<Bytes>>>>,
}

impl Debug for MockHttpSend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHttpSend").finish_non_exhaustive()
    }
}

pub fn response(status: u16, headers: &[(&str, &str)], body: impl Into<Bytes>) -> http::Response<Bytes> {
    let mut builder = http::Response::builder().status(status);
    for (k, v) in headers {
        builder = builder.header(*k, *v);
    }
    builder.body(body.into()).unwrap()
}

impl MockHttpSend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, status: u16, headers: &[(&str, &str)], body: impl Into<Bytes>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(response(status, headers, body));
        self
    }

    pub fn handler(
        mut self,
        f: impl Fn(&http::Request<Bytes>) -> http::Response<Bytes> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Arc::new(f));
        self
    }

    /// Number of requests received.
    pub fn len(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// A copy of the n-th request received, without extensions.
    pub fn request(&self, n: usize) -> http::Request<Bytes> {
        let requests = self.requests.lock().unwrap();
        let req = &requests[n];
        let mut builder = http::Request::builder()
            .method(req.method().clone())
            .uri(req.uri().clone());
        for (k, v) in req.headers() {
            builder = builder.header(k, v);
        }
        builder.body(req.body().clone()).unwrap()
    }

    /// Copies of all requests received.
    pub fn requests(&self) -> Vec<http::Request<Bytes>> {
        (0..self.len()).map(|i| self.request(i)).collect()
    }
}

#[async_trait]
impl HttpSend for MockHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> alioss_core::Result<http::Response<Bytes>> {
        let queued = self.replies.lock().unwrap().pop_front();
        let resp = match (queued, &self.handler) {
            (Some(resp), _) => resp,
            (None, Some(handler)) => handler(&req),
            (None, None) => response(500, &[], "no reply queued"),
        };
        self.requests.lock().unwrap().push(req);
        Ok(resp)
    }
}

/// Build a client with static credential and fast retries on top of the mock.
pub fn mock_client(mock: &MockHttpSend, config: Config) -> Client {
    let config = config.with_retry_delay(Duration::from_millis(1), Duration::from_millis(5));
    Client::with_credential_provider(
        config,
        Context::new().with_http_send(mock.clone()),
        StaticCredentialProvider::new("ak", "sk"),
    )
    .unwrap()
}
