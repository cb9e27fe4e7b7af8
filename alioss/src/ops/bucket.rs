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

use super::{
    decode_xml, url_decode, Acl, BasicResult, CommonPrefix, DataRedundancyType, Owner, StorageClass,
    VersioningStatus,
};
use crate::client::{Client, OperationInput, ToOperation};
use crate::error::{ErrorKind, Result};
use crate::paginator::{next_marker, Paginate};
use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};

/// Request of `PutBucket`.
#[derive(Debug, Clone, Default)]
pub struct PutBucketRequest {
    /// Bucket name.
    pub bucket: String,
    /// Bucket acl.
    pub acl: Option<Acl>,
    /// Resource group to put the bucket in.
    pub resource_group_id: Option<String>,
    /// Storage class.
    pub storage_class: Option<StorageClass>,
    /// Redundancy type.
    pub data_redundancy_type: Option<DataRedundancyType>,
}

impl PutBucketRequest {
    /// Create a request for given bucket.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Default::default()
        }
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
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateBucketConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_class: Option<StorageClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_redundancy_type: Option<DataRedundancyType>,
}

impl ToOperation for PutBucketRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        let input = OperationInput::new("PutBucket", Method::PUT)
            .with_bucket(&self.bucket)
            .with_header_opt("x-oss-acl", self.acl)
            .with_header_opt("x-oss-resource-group-id", self.resource_group_id.as_ref());
        if self.storage_class.is_none() && self.data_redundancy_type.is_none() {
            return Ok(input);
        }
        input.with_xml_body(
            "CreateBucketConfiguration",
            &CreateBucketConfiguration {
                storage_class: self.storage_class,
                data_redundancy_type: self.data_redundancy_type,
            },
        )
    }
}

/// Request addressing a bucket only, used by many bucket operations.
#[derive(Debug, Clone, Default)]
pub struct BucketRequest {
    /// Bucket name.
    pub bucket: String,
}

impl BucketRequest {
    /// Create a request for given bucket.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
        }
    }

    pub(crate) fn input(&self, op: &'static str, method: Method, subresource: &str) -> OperationInput {
        let input = OperationInput::new(op, method).with_bucket(&self.bucket);
        if subresource.is_empty() {
            input
        } else {
            input.with_subresource(subresource)
        }
    }
}

/// Result of `GetBucketInfo`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GetBucketInfoResult {
    /// Bucket details.
    pub bucket: BucketInfo,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Details of a bucket.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BucketInfo {
    /// Bucket name.
    pub name: String,
    /// Region id like `oss-cn-hangzhou`.
    pub location: String,
    /// When the bucket was created.
    pub creation_date: String,
    /// Public endpoint.
    pub extranet_endpoint: String,
    /// Internal endpoint.
    pub intranet_endpoint: String,
    /// Storage class.
    pub storage_class: String,
    /// `LRS` or `ZRS`.
    pub data_redundancy_type: String,
    /// Access tracking status.
    pub access_monitor: String,
    /// Versioning status.
    pub versioning: Option<String>,
    /// Transfer acceleration status.
    pub transfer_acceleration: Option<String>,
    /// Cross region replication status.
    pub cross_region_replication: Option<String>,
    /// Resource group.
    pub resource_group_id: Option<String>,
    /// Comment.
    pub comment: Option<String>,
    /// Owner.
    pub owner: Owner,
    /// Bucket acl.
    pub access_control_list: AccessControlList,
    /// Default server side encryption.
    pub server_side_encryption_rule: ServerSideEncryptionRule,
}

/// Access control list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AccessControlList {
    /// Acl like `private`.
    pub grant: String,
}

/// Default server side encryption of a bucket.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerSideEncryptionRule {
    /// `AES256`, `KMS` or `SM4`.
    #[serde(rename = "SSEAlgorithm")]
    pub sse_algorithm: String,
    /// KMS key id.
    #[serde(rename = "KMSMasterKeyID")]
    pub kms_master_key_id: Option<String>,
    /// Encryption algorithm used by KMS.
    #[serde(rename = "KMSDataEncryption")]
    pub kms_data_encryption: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationConstraint {
    #[serde(rename = "$text", default)]
    value: String,
}

/// Result of `GetBucketStat`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GetBucketStatResult {
    /// Total storage in bytes.
    pub storage: u64,
    /// Total objects.
    pub object_count: u64,
    /// Incomplete multipart uploads.
    pub multipart_upload_count: u64,
    /// Live channels.
    pub live_channel_count: u64,
    /// When the statistics were taken, in seconds.
    pub last_modified_time: i64,
    /// Standard storage in bytes.
    pub standard_storage: u64,
    /// Standard objects.
    pub standard_object_count: u64,
    /// Infrequent access storage in bytes.
    pub infrequent_access_storage: u64,
    /// Billed infrequent access storage in bytes.
    pub infrequent_access_real_storage: u64,
    /// Infrequent access objects.
    pub infrequent_access_object_count: u64,
    /// Archive storage in bytes.
    pub archive_storage: u64,
    /// Billed archive storage in bytes.
    pub archive_real_storage: u64,
    /// Archive objects.
    pub archive_object_count: u64,
    /// Cold archive storage in bytes.
    pub cold_archive_storage: u64,
    /// Billed cold archive storage in bytes.
    pub cold_archive_real_storage: u64,
    /// Cold archive objects.
    pub cold_archive_object_count: u64,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `PutBucketAcl`.
#[derive(Debug, Clone)]
pub struct PutBucketAclRequest {
    /// Bucket name.
    pub bucket: String,
    /// New acl.
    pub acl: Acl,
}

/// Result of `GetBucketAcl` and `GetObjectAcl`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AccessControlPolicy {
    /// Owner.
    pub owner: Owner,
    /// Acl.
    pub access_control_list: AccessControlList,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Versioning state of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VersioningConfiguration {
    /// Unset if versioning was never enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VersioningStatus>,
}

/// Request of `PutBucketVersioning`.
#[derive(Debug, Clone)]
pub struct PutBucketVersioningRequest {
    /// Bucket name.
    pub bucket: String,
    /// New state.
    pub versioning: VersioningConfiguration,
}

/// Request of `ListObjects`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Group keys up to this character.
    pub delimiter: Option<String>,
    /// List keys after this one.
    pub marker: Option<String>,
    /// Max keys returned, 1000 at most.
    pub max_keys: Option<i32>,
    /// Only list keys starting with prefix.
    pub prefix: Option<String>,
    /// `url` to have keys url encoded in the response.
    pub encoding_type: Option<String>,
}

impl ListObjectsRequest {
    /// Create a request for given bucket.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            encoding_type: Some("url".to_string()),
            ..Default::default()
        }
    }

    /// Set prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Set delimiter.
    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = Some(delimiter.to_string());
        self
    }

    /// Set marker.
    pub fn with_marker(mut self, marker: &str) -> Self {
        self.marker = Some(marker.to_string());
        self
    }

    /// Set max keys.
    pub fn with_max_keys(mut self, max_keys: i32) -> Self {
        self.max_keys = Some(max_keys);
        self
    }
}

impl ToOperation for ListObjectsRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("ListObjects", Method::GET)
            .with_bucket(&self.bucket)
            .with_param_opt("delimiter", self.delimiter.as_ref())
            .with_param_opt("marker", self.marker.as_ref())
            .with_param_opt("max-keys", self.max_keys)
            .with_param_opt("prefix", self.prefix.as_ref())
            .with_param_opt("encoding-type", self.encoding_type.as_ref()))
    }
}

/// Result of `ListObjects`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListObjectsResult {
    /// Bucket name.
    pub name: String,
    /// Prefix in the request.
    pub prefix: String,
    /// Marker in the request.
    pub marker: String,
    /// Max keys in the request.
    pub max_keys: i32,
    /// Delimiter in the request.
    pub delimiter: String,
    /// More keys are available.
    pub is_truncated: bool,
    /// Marker of the next page.
    pub next_marker: Option<String>,
    /// Encoding of keys in this result.
    pub encoding_type: Option<String>,
    /// Objects.
    pub contents: Vec<ObjectProperties>,
    /// Grouped prefixes.
    pub common_prefixes: Vec<CommonPrefix>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// An object returned by list operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ObjectProperties {
    /// Object key.
    pub key: String,
    /// `Normal`, `Multipart`, `Appendable` or `Symlink`.
    #[serde(rename = "Type")]
    pub object_type: String,
    /// Size in bytes.
    pub size: u64,
    /// ETag with quotes.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// When the object was modified.
    pub last_modified: String,
    /// Storage class.
    pub storage_class: String,
    /// Owner, only returned when asked.
    pub owner: Option<Owner>,
    /// Restore status of archived objects.
    pub restore_info: Option<String>,
    /// When a cold archive object was transitioned.
    pub transition_time: Option<String>,
}

/// Request of `ListObjectsV2`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectsV2Request {
    /// Bucket name.
    pub bucket: String,
    /// Group keys up to this character.
    pub delimiter: Option<String>,
    /// List keys after this one.
    pub start_after: Option<String>,
    /// Token of the next page.
    pub continuation_token: Option<String>,
    /// Max keys returned, 1000 at most.
    pub max_keys: Option<i32>,
    /// Only list keys starting with prefix.
    pub prefix: Option<String>,
    /// `url` to have keys url encoded in the response.
    pub encoding_type: Option<String>,
    /// Include owner in the result.
    pub fetch_owner: bool,
}

impl ListObjectsV2Request {
    /// Create a request for given bucket.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            encoding_type: Some("url".to_string()),
            ..Default::default()
        }
    }

    /// Set prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Set delimiter.
    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = Some(delimiter.to_string());
        self
    }

    /// Set start after.
    pub fn with_start_after(mut self, start_after: &str) -> Self {
        self.start_after = Some(start_after.to_string());
        self
    }

    /// Set continuation token.
    pub fn with_continuation_token(mut self, token: &str) -> Self {
        self.continuation_token = Some(token.to_string());
        self
    }
}

impl ToOperation for ListObjectsV2Request {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("ListObjectsV2", Method::GET)
            .with_bucket(&self.bucket)
            .with_param("list-type", 2)
            .with_param_opt("delimiter", self.delimiter.as_ref())
            .with_param_opt("start-after", self.start_after.as_ref())
            .with_param_opt("continuation-token", self.continuation_token.as_ref())
            .with_param_opt("max-keys", self.max_keys)
            .with_param_opt("prefix", self.prefix.as_ref())
            .with_param_opt("encoding-type", self.encoding_type.as_ref())
            .with_param_opt("fetch-owner", self.fetch_owner.then_some("true")))
    }
}

/// Result of `ListObjectsV2`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListObjectsV2Result {
    /// Bucket name.
    pub name: String,
    /// Prefix in the request.
    pub prefix: String,
    /// Start after in the request.
    pub start_after: Option<String>,
    /// Continuation token in the request.
    pub continuation_token: Option<String>,
    /// Max keys in the request.
    pub max_keys: i32,
    /// Delimiter in the request.
    pub delimiter: String,
    /// More keys are available.
    pub is_truncated: bool,
    /// Token of the next page.
    pub next_continuation_token: Option<String>,
    /// Encoding of keys in this result.
    pub encoding_type: Option<String>,
    /// Number of keys in this page.
    pub key_count: i32,
    /// Objects.
    pub contents: Vec<ObjectProperties>,
    /// Grouped prefixes.
    pub common_prefixes: Vec<CommonPrefix>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `ListObjectVersions`.
#[derive(Debug, Clone, Default)]
pub struct ListObjectVersionsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Group keys up to this character.
    pub delimiter: Option<String>,
    /// List versions after this key.
    pub key_marker: Option<String>,
    /// List versions after this version of `key_marker`.
    pub version_id_marker: Option<String>,
    /// Max versions returned, 1000 at most.
    pub max_keys: Option<i32>,
    /// Only list keys starting with prefix.
    pub prefix: Option<String>,
    /// `url` to have keys url encoded in the response.
    pub encoding_type: Option<String>,
}

impl ListObjectVersionsRequest {
    /// Create a request for given bucket.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            encoding_type: Some("url".to_string()),
            ..Default::default()
        }
    }

    /// Set prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }
}

impl ToOperation for ListObjectVersionsRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("ListObjectVersions", Method::GET)
            .with_bucket(&self.bucket)
            .with_subresource("versions")
            .with_param_opt("delimiter", self.delimiter.as_ref())
            .with_param_opt("key-marker", self.key_marker.as_ref())
            .with_param_opt("version-id-marker", self.version_id_marker.as_ref())
            .with_param_opt("max-keys", self.max_keys)
            .with_param_opt("prefix", self.prefix.as_ref())
            .with_param_opt("encoding-type", self.encoding_type.as_ref()))
    }
}

/// Result of `ListObjectVersions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListObjectVersionsResult {
    /// Bucket name.
    pub name: String,
    /// Prefix in the request.
    pub prefix: String,
    /// Key marker in the request.
    pub key_marker: String,
    /// Version id marker in the request.
    pub version_id_marker: String,
    /// Max keys in the request.
    pub max_keys: i32,
    /// Delimiter in the request.
    pub delimiter: String,
    /// More versions are available.
    pub is_truncated: bool,
    /// Key marker of the next page.
    pub next_key_marker: Option<String>,
    /// Version id marker of the next page.
    pub next_version_id_marker: Option<String>,
    /// Encoding of keys in this result.
    pub encoding_type: Option<String>,
    /// Object versions.
    #[serde(rename = "Version")]
    pub versions: Vec<ObjectVersion>,
    /// Delete markers.
    #[serde(rename = "DeleteMarker")]
    pub delete_markers: Vec<DeleteMarkerProperties>,
    /// Grouped prefixes.
    pub common_prefixes: Vec<CommonPrefix>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// A version of an object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ObjectVersion {
    /// Object key.
    pub key: String,
    /// Version id.
    pub version_id: String,
    /// This version is the current one.
    pub is_latest: bool,
    /// When the version was created.
    pub last_modified: String,
    /// ETag with quotes.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Object type.
    #[serde(rename = "Type")]
    pub object_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Storage class.
    pub storage_class: String,
    /// Owner.
    pub owner: Option<Owner>,
}

/// A delete marker of an object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DeleteMarkerProperties {
    /// Object key.
    pub key: String,
    /// Version id.
    pub version_id: String,
    /// This marker is the current version.
    pub is_latest: bool,
    /// When the marker was created.
    pub last_modified: String,
    /// Owner.
    pub owner: Option<Owner>,
}

fn is_url_encoded(encoding_type: &Option<String>) -> bool {
    encoding_type.as_deref() == Some("url")
}

impl ListObjectsResult {
    fn decode_keys(&mut self) {
        if !is_url_encoded(&self.encoding_type) {
            return;
        }
        url_decode(&mut self.prefix);
        url_decode(&mut self.marker);
        url_decode(&mut self.delimiter);
        if let Some(m) = self.next_marker.as_mut() {
            url_decode(m);
        }
        self.contents.iter_mut().for_each(|o| url_decode(&mut o.key));
        self.common_prefixes.iter_mut().for_each(|p| url_decode(&mut p.prefix));
    }
}

impl ListObjectsV2Result {
    fn decode_keys(&mut self) {
        if !is_url_encoded(&self.encoding_type) {
            return;
        }
        url_decode(&mut self.prefix);
        url_decode(&mut self.delimiter);
        if let Some(s) = self.start_after.as_mut() {
            url_decode(s);
        }
        self.contents.iter_mut().for_each(|o| url_decode(&mut o.key));
        self.common_prefixes.iter_mut().for_each(|p| url_decode(&mut p.prefix));
    }
}

impl ListObjectVersionsResult {
    fn decode_keys(&mut self) {
        if !is_url_encoded(&self.encoding_type) {
            return;
        }
        url_decode(&mut self.prefix);
        url_decode(&mut self.key_marker);
        url_decode(&mut self.delimiter);
        if let Some(m) = self.next_key_marker.as_mut() {
            url_decode(m);
        }
        self.versions.iter_mut().for_each(|v| url_decode(&mut v.key));
        self.delete_markers.iter_mut().for_each(|d| url_decode(&mut d.key));
        self.common_prefixes.iter_mut().for_each(|p| url_decode(&mut p.prefix));
    }
}

impl Client {
    /// Create a bucket.
    pub async fn put_bucket(&self, req: &PutBucketRequest) -> Result<BasicResult> {
        let out = self.invoke(req.to_operation()?).await?;
        Ok(BasicResult::from(&out))
    }

    /// Delete an empty bucket.
    pub async fn delete_bucket(&self, req: &BucketRequest) -> Result<BasicResult> {
        let out = self
            .invoke(req.input("DeleteBucket", Method::DELETE, ""))
            .await?;
        Ok(BasicResult::from(&out))
    }

    /// Get details of a bucket.
    pub async fn get_bucket_info(&self, req: &BucketRequest) -> Result<GetBucketInfoResult> {
        let out = self
            .invoke(req.input("GetBucketInfo", Method::GET, "bucketInfo"))
            .await?;
        let mut result: GetBucketInfoResult = decode_xml(&out, "GetBucketInfo")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Get the region id of a bucket, like `oss-cn-hangzhou`.
    pub async fn get_bucket_location(&self, req: &BucketRequest) -> Result<String> {
        let out = self
            .invoke(req.input("GetBucketLocation", Method::GET, "location"))
            .await?;
        let location: LocationConstraint = decode_xml(&out, "GetBucketLocation")?;
        Ok(location.value)
    }

    /// Get storage statistics of a bucket.
    pub async fn get_bucket_stat(&self, req: &BucketRequest) -> Result<GetBucketStatResult> {
        let out = self
            .invoke(req.input("GetBucketStat", Method::GET, "stat"))
            .await?;
        let mut result: GetBucketStatResult = decode_xml(&out, "GetBucketStat")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Set acl of a bucket.
    pub async fn put_bucket_acl(&self, req: &PutBucketAclRequest) -> Result<BasicResult> {
        let input = OperationInput::new("PutBucketAcl", Method::PUT)
            .with_bucket(&req.bucket)
            .with_subresource("acl")
            .with_header("x-oss-acl", req.acl);
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get acl of a bucket.
    pub async fn get_bucket_acl(&self, req: &BucketRequest) -> Result<AccessControlPolicy> {
        let out = self
            .invoke(req.input("GetBucketAcl", Method::GET, "acl"))
            .await?;
        let mut result: AccessControlPolicy = decode_xml(&out, "GetBucketAcl")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Enable or suspend versioning of a bucket.
    pub async fn put_bucket_versioning(&self, req: &PutBucketVersioningRequest) -> Result<BasicResult> {
        let input = OperationInput::new("PutBucketVersioning", Method::PUT)
            .with_bucket(&req.bucket)
            .with_subresource("versioning")
            .with_xml_body("VersioningConfiguration", &req.versioning)?;
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get versioning state of a bucket.
    pub async fn get_bucket_versioning(&self, req: &BucketRequest) -> Result<VersioningConfiguration> {
        let out = self
            .invoke(req.input("GetBucketVersioning", Method::GET, "versioning"))
            .await?;
        decode_xml(&out, "GetBucketVersioning")
    }

    /// List objects of a bucket.
    pub async fn list_objects(&self, req: &ListObjectsRequest) -> Result<ListObjectsResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: ListObjectsResult = decode_xml(&out, "ListObjects")?;
        result.decode_keys();
        result.request_id = out.request_id();
        Ok(result)
    }

    /// List objects of a bucket with continuation tokens.
    pub async fn list_objects_v2(&self, req: &ListObjectsV2Request) -> Result<ListObjectsV2Result> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: ListObjectsV2Result = decode_xml(&out, "ListObjectsV2")?;
        result.decode_keys();
        result.request_id = out.request_id();
        Ok(result)
    }

    /// List all versions of objects in a bucket.
    pub async fn list_object_versions(
        &self,
        req: &ListObjectVersionsRequest,
    ) -> Result<ListObjectVersionsResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: ListObjectVersionsResult = decode_xml(&out, "ListObjectVersions")?;
        result.decode_keys();
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Check if a bucket exists.
    ///
    /// A bucket the caller can not access still exists.
    pub async fn is_bucket_exist(&self, bucket: &str) -> Result<bool> {
        let req = ListObjectsRequest::new(bucket).with_max_keys(1);
        match self.list_objects(&req).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::Service => {
                Ok(err.service_error().map(|e| e.code.as_str()) != Some("NoSuchBucket"))
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl Paginate for ListObjectsRequest {
    type Output = ListObjectsResult;

    async fn fetch(&self, client: &Client) -> Result<ListObjectsResult> {
        client.list_objects(self).await
    }

    fn next_request(&self, output: &ListObjectsResult) -> Result<Option<Self>> {
        let marker = next_marker("ListObjects", output.is_truncated, output.next_marker.as_deref())?;
        Ok(marker.map(|m| self.clone().with_marker(&m)))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_keys = Some(limit);
    }
}

#[async_trait]
impl Paginate for ListObjectsV2Request {
    type Output = ListObjectsV2Result;

    async fn fetch(&self, client: &Client) -> Result<ListObjectsV2Result> {
        client.list_objects_v2(self).await
    }

    fn next_request(&self, output: &ListObjectsV2Result) -> Result<Option<Self>> {
        let token = next_marker(
            "ListObjectsV2",
            output.is_truncated,
            output.next_continuation_token.as_deref(),
        )?;
        Ok(token.map(|t| self.clone().with_continuation_token(&t)))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_keys = Some(limit);
    }
}

#[async_trait]
impl Paginate for ListObjectVersionsRequest {
    type Output = ListObjectVersionsResult;

    async fn fetch(&self, client: &Client) -> Result<ListObjectVersionsResult> {
        client.list_object_versions(self).await
    }

    fn next_request(&self, output: &ListObjectVersionsResult) -> Result<Option<Self>> {
        let Some(key_marker) = next_marker(
            "ListObjectVersions",
            output.is_truncated,
            output.next_key_marker.as_deref(),
        )?
        else {
            return Ok(None);
        };
        let mut next = self.clone();
        next.key_marker = Some(key_marker);
        next.version_id_marker = output.next_version_id_marker.clone();
        Ok(Some(next))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_keys = Some(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{mock_client, MockHttpSend};
    use crate::Config;
    use pretty_assertions::assert_eq;

    fn client(mock: &MockHttpSend) -> Client {
        mock_client(mock, Config::new("cn-hangzhou"))
    }

    #[tokio::test]
    async fn test_put_bucket() {
        let mock = MockHttpSend::new().reply(200, &[("x-oss-request-id", "r1")], "");
        let result = client(&mock)
            .put_bucket(
                &PutBucketRequest::new("examplebucket")
                    .with_acl(Acl::Private)
                    .with_storage_class(StorageClass::IA),
            )
            .await
            .unwrap();
        assert_eq!(result.request_id, "r1");

        let req = mock.request(0);
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(req.headers()["x-oss-acl"], "private");
        assert_eq!(
            std::str::from_utf8(req.body()).unwrap(),
            r#"<?xml version="1.0" encoding="UTF-8"?><CreateBucketConfiguration><StorageClass>IA</StorageClass></CreateBucketConfiguration>"#
        );
    }

    /// Example from https://www.alibabacloud.com/help/en/oss/developer-reference/getbucketinfo
    #[tokio::test]
    async fn test_get_bucket_info() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<BucketInfo>
  <Bucket>
    <AccessMonitor>Enabled</AccessMonitor>
    <CreationDate>2013-07-31T10:56:21.000Z</CreationDate>
    <ExtranetEndpoint>oss-cn-hangzhou.aliyuncs.com</ExtranetEndpoint>
    <IntranetEndpoint>oss-cn-hangzhou-internal.aliyuncs.com</IntranetEndpoint>
    <Location>oss-cn-hangzhou</Location>
    <StorageClass>Standard</StorageClass>
    <TransferAcceleration>Disabled</TransferAcceleration>
    <CrossRegionReplication>Disabled</CrossRegionReplication>
    <DataRedundancyType>LRS</DataRedundancyType>
    <Name>oss-example</Name>
    <ResourceGroupId>rg-aek27tc********</ResourceGroupId>
    <Owner>
      <DisplayName>username</DisplayName>
      <ID>27183473914****</ID>
    </Owner>
    <AccessControlList>
      <Grant>private</Grant>
    </AccessControlList>
    <Comment>test</Comment>
    <ServerSideEncryptionRule>
      <SSEAlgorithm>KMS</SSEAlgorithm>
      <KMSMasterKeyID>****</KMSMasterKeyID>
      <KMSDataEncryption>SM4</KMSDataEncryption>
    </ServerSideEncryptionRule>
    <BucketPolicy>
      <LogBucket>examplebucket</LogBucket>
      <LogPrefix>log/</LogPrefix>
    </BucketPolicy>
  </Bucket>
</BucketInfo>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let result = client(&mock)
            .get_bucket_info(&BucketRequest::new("oss-example"))
            .await
            .unwrap();

        let info = result.bucket;
        assert_eq!(info.name, "oss-example");
        assert_eq!(info.data_redundancy_type, "LRS");
        assert_eq!(info.owner.id, "27183473914****");
        assert_eq!(info.access_control_list.grant, "private");
        assert_eq!(info.server_side_encryption_rule.sse_algorithm, "KMS");
        assert_eq!(
            info.server_side_encryption_rule.kms_data_encryption.as_deref(),
            Some("SM4")
        );
        assert_eq!(mock.request(0).uri().query(), Some("bucketInfo"));
    }

    #[tokio::test]
    async fn test_get_bucket_location() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<LocationConstraint>oss-cn-hangzhou</LocationConstraint>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let location = client(&mock)
            .get_bucket_location(&BucketRequest::new("examplebucket"))
            .await
            .unwrap();
        assert_eq!(location, "oss-cn-hangzhou");
    }

    #[tokio::test]
    async fn test_get_bucket_stat() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<BucketStat>
  <Storage>1600</Storage>
  <ObjectCount>230</ObjectCount>
  <MultipartUploadCount>40</MultipartUploadCount>
  <LiveChannelCount>4</LiveChannelCount>
  <LastModifiedTime>1643341269</LastModifiedTime>
  <StandardStorage>430</StandardStorage>
  <StandardObjectCount>66</StandardObjectCount>
  <InfrequentAccessStorage>2359296</InfrequentAccessStorage>
  <InfrequentAccessRealStorage>360</InfrequentAccessRealStorage>
  <InfrequentAccessObjectCount>54</InfrequentAccessObjectCount>
  <ArchiveStorage>2949120</ArchiveStorage>
  <ArchiveRealStorage>450</ArchiveRealStorage>
  <ArchiveObjectCount>74</ArchiveObjectCount>
  <ColdArchiveStorage>2359296</ColdArchiveStorage>
  <ColdArchiveRealStorage>360</ColdArchiveRealStorage>
  <ColdArchiveObjectCount>36</ColdArchiveObjectCount>
</BucketStat>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let stat = client(&mock)
            .get_bucket_stat(&BucketRequest::new("examplebucket"))
            .await
            .unwrap();
        assert_eq!(stat.storage, 1600);
        assert_eq!(stat.object_count, 230);
        assert_eq!(stat.last_modified_time, 1643341269);
        assert_eq!(stat.cold_archive_object_count, 36);
    }

    #[tokio::test]
    async fn test_bucket_acl() {
        let body = r#"<?xml version="1.0" ?>
<AccessControlPolicy>
    <Owner>
        <ID>0022012****</ID>
        <DisplayName>user_example</DisplayName>
    </Owner>
    <AccessControlList>
        <Grant>public-read</Grant>
    </AccessControlList>
</AccessControlPolicy>"#;
        let mock = MockHttpSend::new().reply(200, &[], "").reply(200, &[], body);
        let c = client(&mock);

        c.put_bucket_acl(&PutBucketAclRequest {
            bucket: "examplebucket".to_string(),
            acl: Acl::PublicRead,
        })
        .await
        .unwrap();
        let acl = c.get_bucket_acl(&BucketRequest::new("examplebucket")).await.unwrap();
        assert_eq!(acl.access_control_list.grant, "public-read");
        assert_eq!(acl.owner.display_name, "user_example");

        let put = mock.request(0);
        assert_eq!(put.uri().query(), Some("acl"));
        assert_eq!(put.headers()["x-oss-acl"], "public-read");
    }

    #[tokio::test]
    async fn test_bucket_versioning() {
        let body = "<VersioningConfiguration><Status>Enabled</Status></VersioningConfiguration>";
        let mock = MockHttpSend::new().reply(200, &[], "").reply(200, &[], body);
        let c = client(&mock);

        c.put_bucket_versioning(&PutBucketVersioningRequest {
            bucket: "examplebucket".to_string(),
            versioning: VersioningConfiguration {
                status: Some(VersioningStatus::Enabled),
            },
        })
        .await
        .unwrap();
        let v = c
            .get_bucket_versioning(&BucketRequest::new("examplebucket"))
            .await
            .unwrap();
        assert_eq!(v.status, Some(VersioningStatus::Enabled));
        assert!(std::str::from_utf8(mock.request(0).body())
            .unwrap()
            .ends_with("<VersioningConfiguration><Status>Enabled</Status></VersioningConfiguration>"));
    }

    /// Example from https://www.alibabacloud.com/help/en/oss/developer-reference/listobjects
    #[tokio::test]
    async fn test_list_objects_url_encoded() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">
  <Name>examplebucket</Name>
  <Prefix>fun%2F</Prefix>
  <Marker></Marker>
  <MaxKeys>100</MaxKeys>
  <Delimiter>%2F</Delimiter>
  <EncodingType>url</EncodingType>
  <IsTruncated>true</IsTruncated>
  <NextMarker>fun%2Fmovie%2F007.avi</NextMarker>
  <Contents>
    <Key>fun%2Fmovie%2F001.avi</Key>
    <LastModified>2012-02-24T08:43:07.000Z</LastModified>
    <ETag>"5B3C1A2E053D763E1B002CC607C5A0FE1****"</ETag>
    <Type>Normal</Type>
    <Size>344606</Size>
    <StorageClass>Standard</StorageClass>
    <Owner>
      <ID>0022012****</ID>
      <DisplayName>user-example</DisplayName>
    </Owner>
  </Contents>
  <Contents>
    <Key>fun%2Fmovie%2Fa%20b.avi</Key>
    <LastModified>2012-02-24T08:43:27.000Z</LastModified>
    <ETag>"5B3C1A2E053D763E1B002CC607C5A0FE1****"</ETag>
    <Type>Normal</Type>
    <Size>344606</Size>
    <StorageClass>Standard</StorageClass>
  </Contents>
  <CommonPrefixes>
    <Prefix>fun%2Fmovie%2Fdir%2F</Prefix>
  </CommonPrefixes>
</ListBucketResult>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let result = client(&mock)
            .list_objects(
                &ListObjectsRequest::new("examplebucket")
                    .with_prefix("fun/")
                    .with_delimiter("/"),
            )
            .await
            .unwrap();

        assert_eq!(result.prefix, "fun/");
        assert_eq!(result.delimiter, "/");
        assert_eq!(result.next_marker.as_deref(), Some("fun/movie/007.avi"));
        assert_eq!(result.contents.len(), 2);
        assert_eq!(result.contents[1].key, "fun/movie/a b.avi");
        assert_eq!(result.contents[0].size, 344606);
        assert_eq!(result.contents[0].owner.as_ref().unwrap().id, "0022012****");
        assert_eq!(result.common_prefixes[0].prefix, "fun/movie/dir/");
        assert_eq!(
            mock.request(0).uri().query(),
            Some("delimiter=%2F&prefix=fun%2F&encoding-type=url")
        );
    }

    #[tokio::test]
    async fn test_list_objects_v2_paginator() {
        let first = r#"<ListBucketResult>
  <Name>examplebucket</Name>
  <IsTruncated>true</IsTruncated>
  <NextContinuationToken>CgJiYw--</NextContinuationToken>
  <KeyCount>1</KeyCount>
  <Contents><Key>a</Key><Size>1</Size></Contents>
</ListBucketResult>"#;
        let second = r#"<ListBucketResult>
  <Name>examplebucket</Name>
  <IsTruncated>false</IsTruncated>
  <KeyCount>1</KeyCount>
  <Contents><Key>b</Key><Size>2</Size></Contents>
</ListBucketResult>"#;
        let mock = MockHttpSend::new().reply(200, &[], first).reply(200, &[], second);
        let mut p = client(&mock).paginator(ListObjectsV2Request::new("examplebucket"));

        let mut keys = vec![];
        while p.has_next() {
            let page = p.next_page().await.unwrap();
            keys.extend(page.contents.into_iter().map(|o| o.key));
        }
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(
            mock.request(1).uri().query(),
            Some("list-type=2&continuation-token=CgJiYw--&encoding-type=url")
        );
    }

    #[tokio::test]
    async fn test_list_object_versions() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListVersionsResult>
  <Name>examplebucket</Name>
  <Prefix></Prefix>
  <KeyMarker>example</KeyMarker>
  <VersionIdMarker>CAEQMxiBgICbof2D0BYiIGRhZjgwMzJiMjA3MjQ0ODE5MWYxZDYwMzJlZjU1****</VersionIdMarker>
  <MaxKeys>100</MaxKeys>
  <Delimiter></Delimiter>
  <IsTruncated>true</IsTruncated>
  <NextKeyMarker>example</NextKeyMarker>
  <NextVersionIdMarker>CAEQGBiBgIC_jq7P9xYiIDRiZWJkNjY2Y2Q4NDQ5ZTI5ZGE5ODIxMTIyZThl****</NextVersionIdMarker>
  <DeleteMarker>
    <Key>example</Key>
    <VersionId>CAEQMxiBgICAof2D0BYiIDJhMGE3N2M1YTI1NDQzOGY5NTkyNTI3MGYyMzJm****</VersionId>
    <IsLatest>false</IsLatest>
    <LastModified>2019-04-09T07:27:28.000Z</LastModified>
    <Owner>
      <ID>1234512528586****</ID>
      <DisplayName>12345125285864390</DisplayName>
    </Owner>
  </DeleteMarker>
  <Version>
    <Key>example</Key>
    <VersionId>CAEQMxiBgMDNoP2D0BYiIDE3MWUxNzgxZDQxNTRiODI5OGYwZGMwNGY3MzZjNDVh****</VersionId>
    <IsLatest>false</IsLatest>
    <LastModified>2019-04-09T07:27:28.000Z</LastModified>
    <ETag>"250F8A0AE989679A22926A875F0A2****"</ETag>
    <Type>Normal</Type>
    <Size>93731</Size>
    <StorageClass>Standard</StorageClass>
  </Version>
</ListVersionsResult>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let req = ListObjectVersionsRequest {
            encoding_type: None,
            ..ListObjectVersionsRequest::new("examplebucket")
        };
        let result = client(&mock).list_object_versions(&req).await.unwrap();
        assert_eq!(result.versions.len(), 1);
        assert_eq!(result.versions[0].size, 93731);
        assert_eq!(result.delete_markers.len(), 1);
        assert!(!result.delete_markers[0].is_latest);

        let next = req.next_request(&result).unwrap().unwrap();
        assert_eq!(next.key_marker.as_deref(), Some("example"));
        assert_eq!(
            next.version_id_marker.as_deref(),
            Some("CAEQGBiBgIC_jq7P9xYiIDRiZWJkNjY2Y2Q4NDQ5ZTI5ZGE5ODIxMTIyZThl****")
        );
        assert_eq!(mock.request(0).uri().query(), Some("versions"));
    }

    #[tokio::test]
    async fn test_is_bucket_exist() {
        let no_bucket = "<Error><Code>NoSuchBucket</Code></Error>";
        let denied = "<Error><Code>AccessDenied</Code></Error>";
        let mock = MockHttpSend::new()
            .reply(200, &[], "<ListBucketResult></ListBucketResult>")
            .reply(404, &[], no_bucket)
            .reply(403, &[], denied);
        let c = client(&mock);

        assert!(c.is_bucket_exist("examplebucket").await.unwrap());
        assert!(!c.is_bucket_exist("examplebucket").await.unwrap());
        assert!(c.is_bucket_exist("examplebucket").await.unwrap());
    }
}
