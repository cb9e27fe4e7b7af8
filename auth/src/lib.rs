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

//! Credential loading and request signing for Alibaba Cloud OSS.
//!
//! ## Overview
//!
//! OSS accepts two signature versions:
//!
//! - V1, `Authorization: OSS <ak>:<signature>` with HMAC-SHA1, see [`RequestSigner`].
//! - V4, `Authorization: OSS4-HMAC-SHA256 ...` with HMAC-SHA256 and a region scoped
//!   signing key, see [`RequestSignerV4`].
//!
//! Both support header signing and presigned urls (query signing). The bucket and
//! object key a request addresses are read from the [`Resource`] request extension.
//!
//! ## Quick Start
//!
//! ```no_run
//! use alioss_auth::{DefaultCredentialProvider, RequestSignerV4, Resource};
//! use alioss_core::{Context, OsEnv, Signer};
//! use alioss_file_read_tokio::TokioFileRead;
//! use alioss_http_send_reqwest::ReqwestHttpSend;
//!
//! #[tokio::main]
//! async fn main() -> alioss_core::Result<()> {
//!     let ctx = Context::new()
//!         .with_file_read(TokioFileRead)
//!         .with_http_send(ReqwestHttpSend::default())
//!         .with_env(OsEnv);
//!
//!     let signer = Signer::new(
//!         ctx,
//!         DefaultCredentialProvider::new(),
//!         RequestSignerV4::new("cn-hangzhou"),
//!     );
//!
//!     let mut req = http::Request::get("https://bucket.oss-cn-hangzhou.aliyuncs.com/object.txt")
//!         .body(())?
//!         .into_parts()
//!         .0;
//!     req.extensions.insert(Resource::object("bucket", "object.txt"));
//!
//!     signer.sign(&mut req, None).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Credential Sources
//!
//! [`DefaultCredentialProvider`] tries, in order:
//!
//! - `ALIBABA_CLOUD_ACCESS_KEY_ID` / `ALIBABA_CLOUD_ACCESS_KEY_SECRET` /
//!   `ALIBABA_CLOUD_SECURITY_TOKEN` (or the legacy `OSS_*` names)
//! - the CLI config file `~/.aliyun/config.json`
//! - STS `AssumeRoleWithOIDC` configured by `ALIBABA_CLOUD_ROLE_ARN`,
//!   `ALIBABA_CLOUD_OIDC_PROVIDER_ARN` and `ALIBABA_CLOUD_OIDC_TOKEN_FILE`
//! - the ECS RAM role named by `ALIBABA_CLOUD_ECS_METADATA`

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod resource;
pub use resource::Resource;

mod sign_request;
pub use sign_request::RequestSigner;

mod sign_request_v4;
pub use sign_request_v4::RequestSignerV4;

mod provide_credential;
pub use provide_credential::*;
