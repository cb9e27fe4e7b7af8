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

use super::bucket::AccessControlPolicy;
use super::bucket_config::Tagging;
use super::{
    decode_xml, url_decode, Acl, BasicResult, MetadataDirective, RestoreTier, StorageClass,
    TaggingDirective,
};
use crate::client::{Client, OperationInput, OperationOutput, Presign, ToOperation};
use crate::error::{ErrorKind, Result};
use alioss_core::hash::base64_encode;
use alioss_core::time::{parse_http_date, DateTime};
use alioss_core::utils::{percent_encode_path, percent_encode_query};
use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request of `PutObject`.
#[derive(Debug, Clone, Default)]
pub struct PutObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Content type.
    pub content_type: Option<String>,
    /// Cache control.
    pub cache_control: Option<String>,
    /// Content disposition.
    pub content_disposition: Option<String>,
    /// Content encoding.
    pub content_encoding: Option<String>,
    /// Expires header.
    pub expires: Option<String>,
    /// Object acl.
    pub acl: Option<Acl>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// User metadata, sent as `x-oss-meta-*`.
    pub metadata: HashMap<String, String>,
    /// Object tags.
    pub tagging: Option<Tagging>,
    /// Fail if an object with the same key exists.
    pub forbid_overwrite: bool,
    /// `AES256`, `KMS` or `SM4`.
    pub server_side_encryption: Option<String>,
    /// Bandwidth limit in bit/s.
    pub traffic_limit: Option<u64>,
    /// Callback config in json, sent base64 encoded.
    pub callback: Option<String>,
    /// Callback variables in json, sent base64 encoded.
    pub callback_var: Option<String>,
    /// Object content.
    pub body: Bytes,
}

impl PutObjectRequest {
    /// Create a request for given object.
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            ..Default::default()
        }
    }

    /// Set body.
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Set content type.
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        self.content_type = Some(content_type.to_string());
        self
    }

    /// Add user metadata.
    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    /// Set tags.
    pub fn with_tagging(mut self, tagging: Tagging) -> Self {
        self.tagging = Some(tagging);
        self
    }

    /// Set acl.
    pub fn with_acl(mut self, acl: Acl) -> Self {
        self.acl = Some(acl);
        self
    }

    /// Set storage class.
    pub fn with_storage_class(mut self, class: StorageClass) -> Self {
        self.storage_class = Some(class);
        self
    }

    /// Fail if an object with the same key exists.
    pub fn with_forbid_overwrite(mut self, v: bool) -> Self {
        self.forbid_overwrite = v;
        self
    }

    /// Headers shared by `PutObject`, `AppendObject` and `InitiateMultipartUpload`.
    pub(crate) fn apply_headers(&self, input: OperationInput) -> OperationInput {
        input
            .with_header_opt("content-type", self.content_type.as_ref())
            .with_header_opt("cache-control", self.cache_control.as_ref())
            .with_header_opt("content-disposition", self.content_disposition.as_ref())
            .with_header_opt("content-encoding", self.content_encoding.as_ref())
            .with_header_opt("expires", self.expires.as_ref())
            .with_header_opt("x-oss-object-acl", self.acl)
            .with_header_opt("x-oss-storage-class", self.storage_class)
            .with_header_opt("x-oss-tagging", self.tagging.as_ref().map(|t| t.to_header()))
            .with_header_opt("x-oss-forbid-overwrite", self.forbid_overwrite.then_some("true"))
            .with_header_opt(
                "x-oss-server-side-encryption",
                self.server_side_encryption.as_ref(),
            )
            .with_metadata(&self.metadata)
    }
}

impl ToOperation for PutObjectRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        let input = OperationInput::new("PutObject", Method::PUT)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_header_opt("x-oss-traffic-limit", self.traffic_limit)
            .with_header_opt(
                "x-oss-callback",
                self.callback.as_ref().map(|c| base64_encode(c.as_bytes())),
            )
            .with_header_opt(
                "x-oss-callback-var",
                self.callback_var.as_ref().map(|c| base64_encode(c.as_bytes())),
            )
            .with_body(self.body.clone());
        Ok(self.apply_headers(input))
    }
}

impl Presign for PutObjectRequest {}

/// Result of `PutObject`.
#[derive(Debug, Clone, Default)]
pub struct PutObjectResult {
    /// ETag with quotes.
    pub etag: String,
    /// Version id if versioning is enabled.
    pub version_id: Option<String>,
    /// CRC-64 of the object.
    pub hash_crc64: Option<String>,
    /// MD5 of the content computed by the server.
    pub content_md5: Option<String>,
    /// Body returned by the callback server.
    pub callback_result: Option<Bytes>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

/// Request of `GetObject`.
#[derive(Debug, Clone, Default)]
pub struct GetObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Version id.
    pub version_id: Option<String>,
    /// Byte range, like `bytes=0-9`.
    pub range: Option<String>,
    /// Only return the object if the ETag matches.
    pub if_match: Option<String>,
    /// Only return the object if the ETag differs.
    pub if_none_match: Option<String>,
    /// Only return the object if modified since, in http date.
    pub if_modified_since: Option<String>,
    /// Only return the object if not modified since, in http date.
    pub if_unmodified_since: Option<String>,
    /// Override `Content-Type` of the response.
    pub response_content_type: Option<String>,
    /// Override `Content-Disposition` of the response.
    pub response_content_disposition: Option<String>,
    /// Image or document processing, like `image/resize,w_100`.
    pub process: Option<String>,
    /// Bandwidth limit in bit/s.
    pub traffic_limit: Option<u64>,
}

impl GetObjectRequest {
    /// Create a request for given object.
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            ..Default::default()
        }
    }

    /// Read `[start, end]`, both inclusive.
    pub fn with_range(mut self, start: u64, end: u64) -> Self {
        self.range = Some(format!("bytes={start}-{end}"));
        self
    }

    /// Set version id.
    pub fn with_version_id(mut self, version_id: &str) -> Self {
        self.version_id = Some(version_id.to_string());
        self
    }

    /// Only read if the ETag matches.
    pub fn with_if_match(mut self, etag: &str) -> Self {
        self.if_match = Some(etag.to_string());
        self
    }
}

impl ToOperation for GetObjectRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("GetObject", Method::GET)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_param_opt("versionId", self.version_id.as_ref())
            .with_param_opt("response-content-type", self.response_content_type.as_ref())
            .with_param_opt(
                "response-content-disposition",
                self.response_content_disposition.as_ref(),
            )
            .with_param_opt("x-oss-process", self.process.as_ref())
            .with_header_opt("range", self.range.as_ref())
            .with_header_opt("if-match", self.if_match.as_ref())
            .with_header_opt("if-none-match", self.if_none_match.as_ref())
            .with_header_opt("if-modified-since", self.if_modified_since.as_ref())
            .with_header_opt("if-unmodified-since", self.if_unmodified_since.as_ref())
            .with_header_opt("x-oss-traffic-limit", self.traffic_limit))
    }
}

impl Presign for GetObjectRequest {}

/// Metadata of an object read from response headers.
#[derive(Debug, Clone, Default)]
pub struct ObjectMeta {
    /// Size of the response body.
    pub content_length: u64,
    /// Content type.
    pub content_type: Option<String>,
    /// ETag with quotes.
    pub etag: Option<String>,
    /// When the object was modified.
    pub last_modified: Option<DateTime>,
    /// Version id.
    pub version_id: Option<String>,
    /// CRC-64 of the whole object.
    pub hash_crc64: Option<String>,
    /// Storage class.
    pub storage_class: Option<String>,
    /// `Normal`, `Multipart`, `Appendable` or `Symlink`.
    pub object_type: Option<String>,
    /// Next position for `AppendObject`.
    pub next_append_position: Option<u64>,
    /// Restore status of archived objects.
    pub restore: Option<String>,
    /// Server side encryption.
    pub server_side_encryption: Option<String>,
    /// Number of tags.
    pub tagging_count: Option<u32>,
    /// Cache control.
    pub cache_control: Option<String>,
    /// Content disposition.
    pub content_disposition: Option<String>,
    /// Content encoding.
    pub content_encoding: Option<String>,
    /// User metadata without the `x-oss-meta-` prefix.
    pub metadata: HashMap<String, String>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

impl ObjectMeta {
    pub(crate) fn from_output(out: &OperationOutput) -> Result<Self> {
        Ok(Self {
            content_length: out.header_parse("content-length")?.unwrap_or_default(),
            content_type: out.header_string("content-type"),
            etag: out.header_string("etag"),
            last_modified: out
                .header("last-modified")
                .and_then(|v| parse_http_date(v).ok()),
            version_id: out.header_string("x-oss-version-id"),
            hash_crc64: out.header_string("x-oss-hash-crc64ecma"),
            storage_class: out.header_string("x-oss-storage-class"),
            object_type: out.header_string("x-oss-object-type"),
            next_append_position: out.header_parse("x-oss-next-append-position")?,
            restore: out.header_string("x-oss-restore"),
            server_side_encryption: out.header_string("x-oss-server-side-encryption"),
            tagging_count: out.header_parse("x-oss-tagging-count")?,
            cache_control: out.header_string("cache-control"),
            content_disposition: out.header_string("content-disposition"),
            content_encoding: out.header_string("content-encoding"),
            metadata: out.metadata(),
            request_id: out.request_id(),
        })
    }
}

/// Result of `GetObject`.
#[derive(Debug, Clone, Default)]
pub struct GetObjectResult {
    /// Object metadata.
    pub meta: ObjectMeta,
    /// Range of this response, like `bytes 0-9/100`.
    pub content_range: Option<String>,
    /// Object content.
    pub body: Bytes,
}

/// Request of `HeadObject`.
#[derive(Debug, Clone, Default)]
pub struct HeadObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Version id.
    pub version_id: Option<String>,
    /// Only succeed if the ETag matches.
    pub if_match: Option<String>,
    /// Only succeed if the ETag differs.
    pub if_none_match: Option<String>,
}

impl HeadObjectRequest {
    /// Create a request for given object.
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            ..Default::default()
        }
    }
}

impl ToOperation for HeadObjectRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("HeadObject", Method::HEAD)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_param_opt("versionId", self.version_id.as_ref())
            .with_header_opt("if-match", self.if_match.as_ref())
            .with_header_opt("if-none-match", self.if_none_match.as_ref()))
    }
}

impl Presign for HeadObjectRequest {}

/// Request addressing one object, optionally one version of it.
#[derive(Debug, Clone, Default)]
pub struct ObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Version id.
    pub version_id: Option<String>,
}

impl ObjectRequest {
    /// Create a request for given object.
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            version_id: None,
        }
    }

    /// Set version id.
    pub fn with_version_id(mut self, version_id: &str) -> Self {
        self.version_id = Some(version_id.to_string());
        self
    }

    fn input(&self, op: &'static str, method: Method, subresource: &str) -> OperationInput {
        let input = OperationInput::new(op, method)
            .with_bucket(&self.bucket)
            .with_key(&self.key);
        let input = if subresource.is_empty() {
            input
        } else {
            input.with_subresource(subresource)
        };
        input.with_param_opt("versionId", self.version_id.as_ref())
    }
}

/// Result of `GetObjectMeta`.
#[derive(Debug, Clone, Default)]
pub struct GetObjectMetaResult {
    /// Size in bytes.
    pub content_length: u64,
    /// ETag with quotes.
    pub etag: Option<String>,
    /// When the object was modified.
    pub last_modified: Option<DateTime>,
    /// When the object was last accessed, if access tracking is on.
    pub last_access_time: Option<DateTime>,
    /// Version id.
    pub version_id: Option<String>,
    /// CRC-64 of the object.
    pub hash_crc64: Option<String>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

/// Result of `DeleteObject`.
#[derive(Debug, Clone, Default)]
pub struct DeleteObjectResult {
    /// A delete marker was created or removed.
    pub delete_marker: bool,
    /// Version id of the delete marker or deleted version.
    pub version_id: Option<String>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

/// An object to delete in `DeleteMultipleObjects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectIdentifier {
    /// Object key.
    pub key: String,
    /// Version id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

impl ObjectIdentifier {
    /// Identify the current version of a key.
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            version_id: None,
        }
    }
}

/// Request of `DeleteMultipleObjects`.
#[derive(Debug, Clone, Default)]
pub struct DeleteMultipleObjectsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Objects to delete, 1000 at most.
    pub objects: Vec<ObjectIdentifier>,
    /// Only report failures.
    pub quiet: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Delete<'a> {
    quiet: bool,
    #[serde(rename = "Object")]
    objects: &'a [ObjectIdentifier],
}

/// Result of `DeleteMultipleObjects`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeleteMultipleObjectsResult {
    /// Deleted objects, empty in quiet mode.
    pub deleted: Vec<DeletedObject>,
    /// Encoding of keys in this result.
    pub encoding_type: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// An object deleted by `DeleteMultipleObjects`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeletedObject {
    /// Object key.
    pub key: String,
    /// Version id.
    pub version_id: Option<String>,
    /// A delete marker was involved.
    pub delete_marker: bool,
    /// Version id of the delete marker.
    pub delete_marker_version_id: Option<String>,
}

/// Request of `CopyObject`.
#[derive(Debug, Clone, Default)]
pub struct CopyObjectRequest {
    /// Destination bucket.
    pub bucket: String,
    /// Destination key.
    pub key: String,
    /// Source bucket, destination bucket if unset.
    pub source_bucket: Option<String>,
    /// Source key.
    pub source_key: String,
    /// Source version id.
    pub source_version_id: Option<String>,
    /// Only copy if the source ETag matches.
    pub if_match: Option<String>,
    /// Only copy if the source ETag differs.
    pub if_none_match: Option<String>,
    /// Keep source metadata or use metadata in this request.
    pub metadata_directive: Option<MetadataDirective>,
    /// Keep source tags or use tags in this request.
    pub tagging_directive: Option<TaggingDirective>,
    /// Metadata, used with `REPLACE`.
    pub metadata: HashMap<String, String>,
    /// Tags, used with `REPLACE`.
    pub tagging: Option<Tagging>,
    /// Object acl.
    pub acl: Option<Acl>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// Fail if the destination exists.
    pub forbid_overwrite: bool,
}

impl CopyObjectRequest {
    /// Copy `source_key` to `key` inside one bucket.
    pub fn new(bucket: &str, key: &str, source_key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            source_key: source_key.to_string(),
            ..Default::default()
        }
    }
}

/// Build the `x-oss-copy-source` header.
pub(crate) fn copy_source(bucket: &str, key: &str, version_id: Option<&str>) -> String {
    let mut source = format!("/{bucket}/{}", percent_encode_path(key));
    if let Some(v) = version_id {
        source.push_str("?versionId=");
        source.push_str(&percent_encode_query(v));
    }
    source
}

impl ToOperation for CopyObjectRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        let source_bucket = self.source_bucket.as_deref().unwrap_or(&self.bucket);
        Ok(OperationInput::new("CopyObject", Method::PUT)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_header(
                "x-oss-copy-source",
                copy_source(source_bucket, &self.source_key, self.source_version_id.as_deref()),
            )
            .with_header_opt("x-oss-copy-source-if-match", self.if_match.as_ref())
            .with_header_opt("x-oss-copy-source-if-none-match", self.if_none_match.as_ref())
            .with_header_opt("x-oss-metadata-directive", self.metadata_directive)
            .with_header_opt("x-oss-tagging-directive", self.tagging_directive)
            .with_header_opt("x-oss-tagging", self.tagging.as_ref().map(|t| t.to_header()))
            .with_header_opt("x-oss-object-acl", self.acl)
            .with_header_opt("x-oss-storage-class", self.storage_class)
            .with_header_opt("x-oss-forbid-overwrite", self.forbid_overwrite.then_some("true"))
            .with_metadata(&self.metadata))
    }
}

/// Result of `CopyObject`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CopyObjectResult {
    /// ETag of the new object.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// When the new object was modified.
    pub last_modified: String,
    /// Version id of the new object.
    #[serde(skip)]
    pub version_id: Option<String>,
    /// Version id of the source object.
    #[serde(skip)]
    pub source_version_id: Option<String>,
    /// CRC-64 of the new object.
    #[serde(skip)]
    pub hash_crc64: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `AppendObject`.
#[derive(Debug, Clone, Default)]
pub struct AppendObjectRequest {
    /// Object headers, used when the object is created.
    pub object: PutObjectRequest,
    /// Position to append at, 0 to create.
    pub position: u64,
}

/// Result of `AppendObject`.
#[derive(Debug, Clone, Default)]
pub struct AppendObjectResult {
    /// Position of the next append.
    pub next_position: u64,
    /// CRC-64 of the whole object.
    pub hash_crc64: Option<String>,
    /// Version id.
    pub version_id: Option<String>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

/// Request of `PutObjectAcl`.
#[derive(Debug, Clone)]
pub struct PutObjectAclRequest {
    /// Target object.
    pub object: ObjectRequest,
    /// New acl.
    pub acl: Acl,
}

/// Request of `PutObjectTagging`.
#[derive(Debug, Clone)]
pub struct PutObjectTaggingRequest {
    /// Target object.
    pub object: ObjectRequest,
    /// Tags to set.
    pub tagging: Tagging,
}

/// Request of `PutSymlink`.
#[derive(Debug, Clone, Default)]
pub struct PutSymlinkRequest {
    /// Bucket name.
    pub bucket: String,
    /// Key of the symlink.
    pub key: String,
    /// Key the symlink points to.
    pub target: String,
    /// Object acl.
    pub acl: Option<Acl>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// User metadata.
    pub metadata: HashMap<String, String>,
    /// Fail if an object with the same key exists.
    pub forbid_overwrite: bool,
}

/// Result of `GetSymlink`.
#[derive(Debug, Clone, Default)]
pub struct GetSymlinkResult {
    /// Key the symlink points to.
    pub target: String,
    /// ETag of the symlink.
    pub etag: Option<String>,
    /// Version id.
    pub version_id: Option<String>,
    /// User metadata.
    pub metadata: HashMap<String, String>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

/// Request of `RestoreObject`.
#[derive(Debug, Clone, Default)]
pub struct RestoreObjectRequest {
    /// Target object.
    pub object: ObjectRequest,
    /// Days the restored copy stays readable.
    pub days: Option<i32>,
    /// Restore speed, for cold archive objects.
    pub tier: Option<RestoreTier>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct RestoreRequest {
    days: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    job_parameters: Option<JobParameters>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JobParameters {
    tier: RestoreTier,
}

fn put_result(out: &OperationOutput, with_callback: bool) -> PutObjectResult {
    PutObjectResult {
        etag: out.header_string("etag").unwrap_or_default(),
        version_id: out.header_string("x-oss-version-id"),
        hash_crc64: out.header_string("x-oss-hash-crc64ecma"),
        content_md5: out.header_string("content-md5"),
        callback_result: (with_callback && !out.body.is_empty()).then(|| out.body.clone()),
        request_id: out.request_id(),
    }
}

impl Client {
    /// Upload an object in one request.
    pub async fn put_object(&self, req: &PutObjectRequest) -> Result<PutObjectResult> {
        let out = self.invoke(req.to_operation()?).await?;
        Ok(put_result(&out, req.callback.is_some()))
    }

    /// Download an object.
    pub async fn get_object(&self, req: &GetObjectRequest) -> Result<GetObjectResult> {
        let out = self.invoke(req.to_operation()?).await?;
        Ok(GetObjectResult {
            meta: ObjectMeta::from_output(&out).map_err(|e| e.with_operation("GetObject"))?,
            content_range: out.header_string("content-range"),
            body: out.body,
        })
    }

    /// Get all metadata of an object.
    pub async fn head_object(&self, req: &HeadObjectRequest) -> Result<ObjectMeta> {
        let out = self.invoke(req.to_operation()?).await?;
        ObjectMeta::from_output(&out).map_err(|e| e.with_operation("HeadObject"))
    }

    /// Get basic metadata of an object.
    pub async fn get_object_meta(&self, req: &ObjectRequest) -> Result<GetObjectMetaResult> {
        let out = self
            .invoke(req.input("GetObjectMeta", Method::HEAD, "objectMeta"))
            .await?;
        Ok(GetObjectMetaResult {
            content_length: out
                .header_parse("content-length")
                .map_err(|e| e.with_operation("GetObjectMeta"))?
                .unwrap_or_default(),
            etag: out.header_string("etag"),
            last_modified: out
                .header("last-modified")
                .and_then(|v| parse_http_date(v).ok()),
            last_access_time: out
                .header("x-oss-last-access-time")
                .and_then(|v| parse_http_date(v).ok()),
            version_id: out.header_string("x-oss-version-id"),
            hash_crc64: out.header_string("x-oss-hash-crc64ecma"),
            request_id: out.request_id(),
        })
    }

    /// Delete an object or one version of it.
    pub async fn delete_object(&self, req: &ObjectRequest) -> Result<DeleteObjectResult> {
        let out = self
            .invoke(req.input("DeleteObject", Method::DELETE, ""))
            .await?;
        Ok(DeleteObjectResult {
            delete_marker: out.header("x-oss-delete-marker") == Some("true"),
            version_id: out.header_string("x-oss-version-id"),
            request_id: out.request_id(),
        })
    }

    /// Delete up to 1000 objects in one request.
    pub async fn delete_multiple_objects(
        &self,
        req: &DeleteMultipleObjectsRequest,
    ) -> Result<DeleteMultipleObjectsResult> {
        const OP: &str = "DeleteMultipleObjects";
        let input = OperationInput::new(OP, Method::POST)
            .with_bucket(&req.bucket)
            .with_subresource("delete")
            .with_param("encoding-type", "url")
            .with_xml_body(
                "Delete",
                &Delete {
                    quiet: req.quiet,
                    objects: &req.objects,
                },
            )
            .map_err(|e| e.with_operation(OP))?
            .with_content_md5();
        let out = self.invoke(input).await?;
        if out.body.is_empty() {
            return Ok(DeleteMultipleObjectsResult {
                request_id: out.request_id(),
                ..Default::default()
            });
        }

        let mut result: DeleteMultipleObjectsResult = decode_xml(&out, OP)?;
        if result.encoding_type.as_deref() == Some("url") {
            result.deleted.iter_mut().for_each(|d| url_decode(&mut d.key));
        }
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Copy an object, up to 1 GiB.
    pub async fn copy_object(&self, req: &CopyObjectRequest) -> Result<CopyObjectResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: CopyObjectResult = decode_xml(&out, "CopyObject")?;
        result.version_id = out.header_string("x-oss-version-id");
        result.source_version_id = out.header_string("x-oss-copy-source-version-id");
        result.hash_crc64 = out.header_string("x-oss-hash-crc64ecma");
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Append to an appendable object.
    pub async fn append_object(&self, req: &AppendObjectRequest) -> Result<AppendObjectResult> {
        const OP: &str = "AppendObject";
        let obj = &req.object;
        let input = OperationInput::new(OP, Method::POST)
            .with_bucket(&obj.bucket)
            .with_key(&obj.key)
            .with_subresource("append")
            .with_param("position", req.position)
            .with_body(obj.body.clone());
        let out = self.invoke(obj.apply_headers(input)).await?;
        Ok(AppendObjectResult {
            next_position: out
                .header_parse("x-oss-next-append-position")
                .map_err(|e| e.with_operation(OP))?
                .unwrap_or_default(),
            hash_crc64: out.header_string("x-oss-hash-crc64ecma"),
            version_id: out.header_string("x-oss-version-id"),
            request_id: out.request_id(),
        })
    }

    /// Set acl of an object.
    pub async fn put_object_acl(&self, req: &PutObjectAclRequest) -> Result<BasicResult> {
        let input = req
            .object
            .input("PutObjectAcl", Method::PUT, "acl")
            .with_header("x-oss-object-acl", req.acl);
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get acl of an object.
    pub async fn get_object_acl(&self, req: &ObjectRequest) -> Result<AccessControlPolicy> {
        let out = self
            .invoke(req.input("GetObjectAcl", Method::GET, "acl"))
            .await?;
        let mut result: AccessControlPolicy = decode_xml(&out, "GetObjectAcl")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Set tags of an object.
    pub async fn put_object_tagging(&self, req: &PutObjectTaggingRequest) -> Result<BasicResult> {
        const OP: &str = "PutObjectTagging";
        let input = req
            .object
            .input(OP, Method::PUT, "tagging")
            .with_xml_body("Tagging", &req.tagging)
            .map_err(|e| e.with_operation(OP))?;
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get tags of an object.
    pub async fn get_object_tagging(&self, req: &ObjectRequest) -> Result<Tagging> {
        let out = self
            .invoke(req.input("GetObjectTagging", Method::GET, "tagging"))
            .await?;
        decode_xml(&out, "GetObjectTagging")
    }

    /// Delete tags of an object.
    pub async fn delete_object_tagging(&self, req: &ObjectRequest) -> Result<BasicResult> {
        let out = self
            .invoke(req.input("DeleteObjectTagging", Method::DELETE, "tagging"))
            .await?;
        Ok(BasicResult::from(&out))
    }

    /// Create a symlink pointing to another key.
    pub async fn put_symlink(&self, req: &PutSymlinkRequest) -> Result<BasicResult> {
        let input = OperationInput::new("PutSymlink", Method::PUT)
            .with_bucket(&req.bucket)
            .with_key(&req.key)
            .with_subresource("symlink")
            .with_header("x-oss-symlink-target", percent_encode_path(&req.target))
            .with_header_opt("x-oss-object-acl", req.acl)
            .with_header_opt("x-oss-storage-class", req.storage_class)
            .with_header_opt("x-oss-forbid-overwrite", req.forbid_overwrite.then_some("true"))
            .with_metadata(&req.metadata);
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get the target of a symlink.
    pub async fn get_symlink(&self, req: &ObjectRequest) -> Result<GetSymlinkResult> {
        let out = self
            .invoke(req.input("GetSymlink", Method::GET, "symlink"))
            .await?;
        let target = out.header("x-oss-symlink-target").unwrap_or_default();
        Ok(GetSymlinkResult {
            target: percent_encoding::percent_decode_str(target)
                .decode_utf8_lossy()
                .into_owned(),
            etag: out.header_string("etag"),
            version_id: out.header_string("x-oss-version-id"),
            metadata: out.metadata(),
            request_id: out.request_id(),
        })
    }

    /// Restore an archived object.
    pub async fn restore_object(&self, req: &RestoreObjectRequest) -> Result<BasicResult> {
        const OP: &str = "RestoreObject";
        let input = req.object.input(OP, Method::POST, "restore");
        let input = match req.days {
            None => input,
            Some(days) => input
                .with_xml_body(
                    "RestoreRequest",
                    &RestoreRequest {
                        days,
                        job_parameters: req.tier.map(|tier| JobParameters { tier }),
                    },
                )
                .map_err(|e| e.with_operation(OP))?,
        };
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Check if an object exists.
    ///
    /// A missing bucket is reported as an error.
    pub async fn is_object_exist(&self, bucket: &str, key: &str) -> Result<bool> {
        match self.get_object_meta(&ObjectRequest::new(bucket, key)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::Service => match err.service_error() {
                Some(se) if se.status_code == 404 && se.code != "NoSuchBucket" => Ok(false),
                _ => Err(err),
            },
            Err(err) => Err(err),
        }
    }
}
