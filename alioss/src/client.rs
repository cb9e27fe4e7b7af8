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

use crate::config::{Config, SignatureVersion};
use crate::endpoint::{validate_bucket_name, validate_object_key, Endpoint};
use crate::error::{Error, Result, ServiceError};
use alioss_auth::{Credential, DefaultCredentialProvider, RequestSigner, RequestSignerV4, Resource};
use alioss_core::hash::base64_md5;
use alioss_core::time::{now, DateTime};
use alioss_core::utils::percent_encode_query;
use alioss_core::{Context, OsEnv, ProvideCredential, Signer};
use alioss_file_read_tokio::TokioFileRead;
use alioss_http_send_reqwest::ReqwestHttpSend;
use backon::{ExponentialBuilder, Retryable};
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, USER_AGENT};
use http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// A single OSS API call before it becomes an http request.
#[derive(Debug, Clone)]
pub struct OperationInput {
    /// Name of the operation, like `PutObject`.
    pub op_name: &'static str,
    /// HTTP method.
    pub method: Method,
    /// Target bucket.
    pub bucket: Option<String>,
    /// Target object key, not encoded.
    pub key: Option<String>,
    /// Query parameters, not encoded. An empty value is sent as a bare key.
    pub parameters: Vec<(String, String)>,
    /// Request headers.
    pub headers: Vec<(String, String)>,
    /// Request body.
    pub body: Bytes,
    /// Send `Content-MD5` computed from body.
    pub content_md5: bool,
}

impl OperationInput {
    /// Create a new input for given operation.
    pub fn new(op_name: &'static str, method: Method) -> Self {
        Self {
            op_name,
            method,
            bucket: None,
            key: None,
            parameters: Vec::new(),
            headers: Vec::new(),
            body: Bytes::new(),
            content_md5: false,
        }
    }

    /// Set bucket.
    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    /// Set object key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Add a sub resource like `acl`.
    pub fn with_subresource(self, name: &str) -> Self {
        self.with_param(name, "")
    }

    /// Add a query parameter.
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        self.parameters.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a query parameter if the value is set.
    pub fn with_param_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.with_param(key, v),
            None => self,
        }
    }

    /// Add a header.
    pub fn with_header(mut self, key: &str, value: impl ToString) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    /// Add a header if the value is set.
    pub fn with_header_opt<T: ToString>(self, key: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.with_header(key, v),
            None => self,
        }
    }

    /// Add `x-oss-meta-*` headers.
    pub fn with_metadata(mut self, metadata: &HashMap<String, String>) -> Self {
        for (k, v) in metadata {
            self.headers
                .push((format!("x-oss-meta-{}", k.to_lowercase()), v.clone()));
        }
        self
    }

    /// Set body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set an xml body serialized from `value` under `root`.
    pub fn with_xml_body<T: serde::Serialize>(self, root: &str, value: &T) -> Result<Self> {
        let body = crate::xml::to_xml(root, value)?;
        Ok(self.with_header("content-type", "application/xml").with_body(body))
    }

    /// Set a json body.
    pub fn with_json_body<T: serde::Serialize>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)
            .map_err(|e| Error::invalid_argument("failed to encode json body").with_source(e))?;
        Ok(self.with_header("content-type", "application/json").with_body(body))
    }

    /// Send `Content-MD5` computed from body.
    pub fn with_content_md5(mut self) -> Self {
        self.content_md5 = true;
        self
    }

    fn resource(&self) -> Resource {
        Resource {
            bucket: self.bucket.clone(),
            key: self.key.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        match (&self.bucket, &self.key) {
            (Some(bucket), key) => {
                validate_bucket_name(bucket)?;
                if let Some(key) = key {
                    validate_object_key(key)?;
                }
            }
            (None, Some(_)) => return Err(Error::invalid_argument("object key requires a bucket")),
            (None, None) => {}
        }
        Ok(())
    }
}

/// Converts a typed request into an [`OperationInput`].
pub trait ToOperation {
    /// Build the input.
    fn to_operation(&self) -> Result<OperationInput>;
}

/// Requests that can be presigned into a url.
pub trait Presign: ToOperation {}

/// The response of an OSS API call.
#[derive(Debug, Clone)]
pub struct OperationOutput {
    /// HTTP status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl OperationOutput {
    /// Get a header as str.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Get a header as owned string.
    pub fn header_string(&self, name: &str) -> Option<String> {
        self.header(name).map(|v| v.to_string())
    }

    /// Parse a header into `T`.
    pub fn header_parse<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.header(name) {
            None => Ok(None),
            Some(v) => v.parse::<T>().map(Some).map_err(|_| {
                Error::deserialize(format!("header {name} has invalid value {v:?}"))
            }),
        }
    }

    /// Collect `x-oss-meta-*` headers without the prefix.
    pub fn metadata(&self) -> HashMap<String, String> {
        self.headers
            .iter()
            .filter_map(|(k, v)| {
                let name = k.as_str().strip_prefix("x-oss-meta-")?;
                Some((name.to_string(), v.to_str().ok()?.to_string()))
            })
            .collect()
    }

    /// Value of `x-oss-request-id`.
    pub fn request_id(&self) -> String {
        self.header_string("x-oss-request-id").unwrap_or_default()
    }

    /// Decode body as xml.
    pub fn xml<T: DeserializeOwned>(&self) -> Result<T> {
        crate::xml::from_xml(&self.body)
    }

    /// Decode body as json.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| Error::deserialize("failed to decode json body").with_source(e))
    }
}

/// Options for [`Client::presign`].
#[derive(Debug, Clone, Copy)]
pub struct PresignOptions {
    /// How long the url stays valid.
    pub expires: Duration,
}

impl Default for PresignOptions {
    fn default() -> Self {
        Self {
            expires: Duration::from_secs(15 * 60),
        }
    }
}

/// A presigned request.
#[derive(Debug, Clone)]
pub struct PresignResult {
    /// HTTP method to use.
    pub method: Method,
    /// Signed url.
    pub url: String,
    /// When the url expires.
    pub expiration: Option<DateTime>,
    /// Headers that must be sent with the url.
    pub signed_headers: HashMap<String, String>,
}

const CONTENT_MD5: HeaderName = HeaderName::from_static("content-md5");

const MAX_V4_PRESIGN_EXPIRES: Duration = Duration::from_secs(7 * 24 * 3600);

/// Client for Alibaba Cloud OSS.
///
/// Cheap to clone, all clones share the same credential cache.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: Config,
    endpoint: Endpoint,
    signer: Signer<Credential>,
}

impl Debug for Client {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client with the default transport and credential chain.
    pub fn new(config: Config) -> Result<Self> {
        let ctx = default_context(&config)?;
        Self::with_context(config, ctx)
    }

    /// Create a client with given context and the default credential chain.
    pub fn with_context(config: Config, ctx: Context) -> Result<Self> {
        Self::with_credential_provider(config, ctx, DefaultCredentialProvider::new())
    }

    /// Create a client with given context and credential provider.
    pub fn with_credential_provider(
        config: Config,
        ctx: Context,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Result<Self> {
        let endpoint = Endpoint::from_config(&config)?;
        Self::build(config, endpoint, ctx, provider)
    }

    pub(crate) fn build(
        config: Config,
        endpoint: Endpoint,
        ctx: Context,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Result<Self> {
        let signer = match config.signature_version {
            SignatureVersion::V1 => Signer::new(ctx, provider, RequestSigner::new()),
            SignatureVersion::V4 => {
                let region = config.region.as_deref().ok_or_else(|| {
                    Error::invalid_argument("region is required by signature v4")
                })?;
                let builder = RequestSignerV4::new(region)
                    .with_product(&config.product)
                    .with_additional_headers(config.additional_headers.clone());
                Signer::new(ctx, provider, builder)
            }
        };

        Ok(Self {
            inner: Arc::new(ClientInner {
                config,
                endpoint,
                signer,
            }),
        })
    }

    /// Config of this client.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Resolved endpoint of this client.
    pub fn endpoint(&self) -> &Endpoint {
        &self.inner.endpoint
    }

    /// Send an operation, retrying temporary failures.
    pub async fn invoke(&self, input: OperationInput) -> Result<OperationOutput> {
        let op = input.op_name;
        input.validate().map_err(|e| e.with_operation(op))?;

        let cfg = &self.inner.config;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(cfg.retry_min_delay)
            .with_max_delay(cfg.retry_max_delay)
            .with_max_times(cfg.retry_max_attempts.saturating_sub(1))
            .with_jitter();

        { || self.send_once(&input) }
            .retry(backoff)
            .when(|e: &Error| e.is_temporary())
            .notify(|e: &Error, dur: Duration| {
                warn!("{op} failed and will be retried after {dur:?}: {e}")
            })
            .await
            .map_err(|e| e.with_operation(op))
    }

    /// Presign a request into a url that can be used without credential.
    pub async fn presign<R: Presign>(&self, req: &R, opts: PresignOptions) -> Result<PresignResult> {
        let input = req.to_operation()?;
        let op = input.op_name;
        input.validate().map_err(|e| e.with_operation(op))?;

        if self.inner.config.signature_version == SignatureVersion::V4
            && opts.expires > MAX_V4_PRESIGN_EXPIRES
        {
            return Err(Error::invalid_argument(
                "expiration of signature v4 must be less than 7 days",
            )
            .with_operation(op));
        }

        let (mut parts, _) = self.build_request(&input, false)?;
        self.sign(&mut parts, Some(opts.expires))
            .await
            .map_err(|e| e.with_operation(op))?;

        let signed_headers = parts
            .headers
            .iter()
            .filter(|(k, _)| *k != USER_AGENT)
            .filter_map(|(k, v)| Some((k.to_string(), v.to_str().ok()?.to_string())))
            .collect();
        let expiration = chrono::TimeDelta::from_std(opts.expires)
            .ok()
            .map(|d| now() + d);

        Ok(PresignResult {
            method: parts.method,
            url: parts.uri.to_string(),
            expiration,
            signed_headers,
        })
    }

    async fn sign(&self, parts: &mut http::request::Parts, expires: Option<Duration>) -> Result<()> {
        if self.inner.config.anonymous {
            return Ok(());
        }
        self.inner.signer.sign_required(parts, expires).await?;
        Ok(())
    }

    async fn send_once(&self, input: &OperationInput) -> Result<OperationOutput> {
        let (mut parts, body) = self.build_request(input, true)?;
        self.sign(&mut parts, None).await?;

        let target = format!("{} {}", parts.method, parts.uri.path());
        let resp = self
            .inner
            .signer
            .context()
            .http_send(http::Request::from_parts(parts, body))
            .await?;
        let (parts, body) = resp.into_parts();
        debug!("{} got response status {}", input.op_name, parts.status);

        if parts.status.is_success() {
            return Ok(OperationOutput {
                status: parts.status,
                headers: parts.headers,
                body,
            });
        }

        let mut err = ServiceError::parse(parts.status, &parts.headers, &body);
        err.request_target = target;
        Err(Error::service(err))
    }

    fn build_request(
        &self,
        input: &OperationInput,
        with_body: bool,
    ) -> Result<(http::request::Parts, Bytes)> {
        let mut url = self
            .inner
            .endpoint
            .url(input.bucket.as_deref(), input.key.as_deref());
        if !input.parameters.is_empty() {
            url.push('?');
            url.push_str(&encode_query(&input.parameters));
        }

        let mut req = http::Request::builder()
            .method(input.method.clone())
            .uri(url)
            .body(())?;
        let headers = req.headers_mut();
        for (k, v) in &input.headers {
            headers.append(HeaderName::try_from(k.as_str())?, HeaderValue::try_from(v.as_str())?);
        }
        headers.insert(USER_AGENT, HeaderValue::try_from(self.inner.config.user_agent())?);
        if with_body && (!input.body.is_empty() || matches!(input.method, Method::PUT | Method::POST)) {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(input.body.len()));
        }
        if input.content_md5 && !headers.contains_key(CONTENT_MD5) {
            headers.insert(CONTENT_MD5, HeaderValue::try_from(base64_md5(&input.body))?);
        }

        let (mut parts, _) = req.into_parts();
        parts.extensions.insert(input.resource());
        Ok((parts, input.body.clone()))
    }
}

fn encode_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                percent_encode_query(k)
            } else {
                format!("{}={}", percent_encode_query(k), percent_encode_query(v))
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

pub(crate) fn default_context(config: &Config) -> Result<Context> {
    let mut builder = reqwest::Client::builder();
    if let Some(t) = config.connect_timeout {
        builder = builder.connect_timeout(t);
    }
    if let Some(t) = config.readwrite_timeout {
        builder = builder.read_timeout(t);
    }
    let client = builder
        .build()
        .map_err(|e| Error::invalid_argument("failed to build http client").with_source(e))?;

    Ok(Context::new()
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::new(client))
        .with_env(OsEnv))
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Error::invalid_argument("invalid header name").with_source(err)
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Error::invalid_argument("invalid header value").with_source(err)
    }
}
