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

//! Alibaba Cloud OSS client.
//!
//! ## Overview
//!
//! - [`Client`] sends typed requests: every OSS operation is an async method
//!   taking a request struct and returning a result struct. Requests are
//!   signed with V4 by default, V1 is available through [`SignatureVersion`].
//! - [`Paginator`] walks list operations page by page.
//! - [`Client::presign`] turns object and multipart requests into urls usable
//!   without credential.
//! - [`Uploader`] and [`Downloader`] transfer large objects in parallel parts,
//!   optionally resuming from a checkpoint file.
//! - [`VectorsClient`] talks to vector buckets.
//!
//! Failed operations return [`Error`], which wraps a [`ServiceError`] when
//! the service replied with an error.
//!
//! ## Quick Start
//!
//! ```no_run
//! use alioss::{Client, Config, GetObjectRequest, PutObjectRequest};
//!
//! #[tokio::main]
//! async fn main() -> alioss::Result<()> {
//!     // Credential is loaded from env, profile, RRSA or ECS metadata.
//!     let client = Client::new(Config::new("cn-hangzhou"))?;
//!
//!     client
//!         .put_object(&PutObjectRequest::new("examplebucket", "hello.txt").with_body("hello"))
//!         .await?;
//!     let out = client
//!         .get_object(&GetObjectRequest::new("examplebucket", "hello.txt"))
//!         .await?;
//!     assert_eq!(out.body.as_ref(), b"hello");
//!     Ok(())
//! }
//! ```

mod checkpoint;
mod client;
mod config;
mod downloader;
mod endpoint;
mod error;
mod ops;
mod paginator;
pub mod select_frame;
mod uploader;
mod xml;

#[cfg(test)]
mod test_util;

pub use client::{
    Client, OperationInput, OperationOutput, Presign, PresignOptions, PresignResult, ToOperation,
};
pub use config::{Config, SignatureVersion, DEFAULT_USER_AGENT, OSS_ENDPOINT, OSS_REGION};
pub use downloader::{
    DownloadResult, Downloader, DEFAULT_DOWNLOAD_PARALLEL, DEFAULT_DOWNLOAD_PART_SIZE,
};
pub use endpoint::{
    validate_bucket_name, validate_object_key, validate_region, AddressStyle, Endpoint,
};
pub use error::{Error, ErrorKind, Result, ServiceError};
pub use ops::access_point::*;
pub use ops::bucket::*;
pub use ops::bucket_config::*;
pub use ops::multipart::*;
pub use ops::object::*;
pub use ops::select::*;
pub use ops::service::*;
pub use ops::vector::*;
pub use ops::{
    Acl, BasicResult, CommonPrefix, DataRedundancyType, MetadataDirective, Owner, RestoreTier,
    StorageClass, TaggingDirective, VersioningStatus,
};
pub use paginator::{Paginate, Paginator};
pub use uploader::{
    UploadResult, Uploader, DEFAULT_UPLOAD_PARALLEL, DEFAULT_UPLOAD_PART_SIZE,
    MAX_UPLOAD_PARTS, MIN_UPLOAD_PART_SIZE,
};
pub use xml::{from_xml, to_xml};
