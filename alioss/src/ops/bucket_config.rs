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

use super::bucket::BucketRequest;
use super::{decode_xml, BasicResult};
use crate::client::{Client, OperationInput};
use crate::error::Result;
use http::Method;
use serde::{Deserialize, Serialize};

/// A key value tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}

impl Tag {
    /// Create a tag.
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Tags of a bucket or object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Tagging {
    /// Tag set.
    pub tag_set: TagSet,
}

/// Wrapper of `<TagSet>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagSet {
    /// Tags.
    #[serde(rename = "Tag")]
    pub tags: Vec<Tag>,
}

impl Tagging {
    /// Create tagging from tags.
    pub fn new(tags: Vec<Tag>) -> Self {
        Self {
            tag_set: TagSet { tags },
        }
    }

    /// Encode as `k1=v1&k2=v2` for the `x-oss-tagging` header.
    pub fn to_header(&self) -> String {
        self.tag_set
            .tags
            .iter()
            .map(|t| {
                format!(
                    "{}={}",
                    alioss_core::utils::percent_encode_query(&t.key),
                    alioss_core::utils::percent_encode_query(&t.value)
                )
            })
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Request of `PutBucketTags`.
#[derive(Debug, Clone)]
pub struct PutBucketTagsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Tags to set.
    pub tagging: Tagging,
}

/// Request of `DeleteBucketTags`.
#[derive(Debug, Clone, Default)]
pub struct DeleteBucketTagsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Only delete these keys, all tags if empty.
    pub keys: Vec<String>,
}

/// Lifecycle rules of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfiguration {
    /// Rules.
    #[serde(rename = "Rule")]
    pub rules: Vec<LifecycleRule>,
}

/// A lifecycle rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LifecycleRule {
    /// Rule id.
    #[serde(rename = "ID", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Objects the rule applies to.
    pub prefix: String,
    /// `Enabled` or `Disabled`.
    pub status: String,
    /// Only objects with all these tags.
    #[serde(rename = "Tag", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// When objects expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<LifecycleExpiration>,
    /// When objects move to another storage class.
    #[serde(rename = "Transition", skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<LifecycleTransition>,
    /// When incomplete uploads are aborted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_multipart_upload: Option<LifecycleExpiration>,
    /// When noncurrent versions expire.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noncurrent_version_expiration: Option<NoncurrentVersionExpiration>,
}

/// Expiration of a lifecycle rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LifecycleExpiration {
    /// Days after last modification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i32>,
    /// Objects modified before this date, like `2023-01-01T00:00:00.000Z`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before_date: Option<String>,
    /// Remove delete markers without versions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_object_delete_marker: Option<bool>,
}

/// Transition of a lifecycle rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LifecycleTransition {
    /// Days after last modification or access.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i32>,
    /// Objects modified before this date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before_date: Option<String>,
    /// Target storage class.
    pub storage_class: String,
    /// Count days from last access instead of modification.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_access_time: Option<bool>,
    /// Move back to Standard when accessed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_to_std_when_visit: Option<bool>,
}

/// Expiration of noncurrent versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NoncurrentVersionExpiration {
    /// Days after becoming noncurrent.
    pub noncurrent_days: i32,
}

/// Request of `PutBucketLifecycle`.
#[derive(Debug, Clone)]
pub struct PutBucketLifecycleRequest {
    /// Bucket name.
    pub bucket: String,
    /// Rules to set.
    pub lifecycle: LifecycleConfiguration,
    /// Allow rules with overlapping prefixes.
    pub allow_same_action_overlap: bool,
}

/// CORS rules of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CorsConfiguration {
    /// Rules.
    #[serde(rename = "CORSRule")]
    pub rules: Vec<CorsRule>,
    /// Return `Vary: Origin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_vary: Option<bool>,
}

/// A CORS rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CorsRule {
    /// Allowed origins, `*` for all.
    #[serde(rename = "AllowedOrigin")]
    pub allowed_origins: Vec<String>,
    /// Allowed methods.
    #[serde(rename = "AllowedMethod")]
    pub allowed_methods: Vec<String>,
    /// Allowed request headers.
    #[serde(rename = "AllowedHeader", skip_serializing_if = "Vec::is_empty")]
    pub allowed_headers: Vec<String>,
    /// Headers exposed to the browser.
    #[serde(rename = "ExposeHeader", skip_serializing_if = "Vec::is_empty")]
    pub expose_headers: Vec<String>,
    /// Cache time of preflight results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age_seconds: Option<i64>,
}

/// Request of `PutBucketCors`.
#[derive(Debug, Clone)]
pub struct PutBucketCorsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Rules to set.
    pub cors: CorsConfiguration,
}

/// Hotlink protection of a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RefererConfiguration {
    /// Allow requests without `Referer`.
    pub allow_empty_referer: bool,
    /// Ignore query string when matching.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_truncate_query_string: Option<bool>,
    /// Allowed referers.
    pub referer_list: RefererList,
    /// Denied referers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer_blacklist: Option<RefererList>,
}

/// Wrapper of `<RefererList>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefererList {
    /// Referers, `*` and `?` are wildcards.
    #[serde(rename = "Referer")]
    pub referers: Vec<String>,
}

/// Request of `PutBucketReferer`.
#[derive(Debug, Clone)]
pub struct PutBucketRefererRequest {
    /// Bucket name.
    pub bucket: String,
    /// Config to set.
    pub referer: RefererConfiguration,
}

/// Request of `PutBucketPolicy`.
#[derive(Debug, Clone)]
pub struct PutBucketPolicyRequest {
    /// Bucket name.
    pub bucket: String,
    /// Policy document in json.
    pub policy: String,
}

/// Result of get operations returning a configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigResult<T> {
    /// The configuration.
    pub config: T,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

impl Client {
    async fn put_bucket_xml<T: Serialize>(
        &self,
        op: &'static str,
        bucket: &str,
        subresource: &str,
        root: &str,
        value: &T,
    ) -> Result<BasicResult> {
        let input = OperationInput::new(op, Method::PUT)
            .with_bucket(bucket)
            .with_subresource(subresource)
            .with_xml_body(root, value)
            .map_err(|e| e.with_operation(op))?
            .with_content_md5();
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    async fn get_bucket_xml<T: serde::de::DeserializeOwned>(
        &self,
        op: &'static str,
        req: &BucketRequest,
        subresource: &str,
    ) -> Result<ConfigResult<T>> {
        let out = self.invoke(req.input(op, Method::GET, subresource)).await?;
        Ok(ConfigResult {
            config: decode_xml(&out, op)?,
            request_id: out.request_id(),
        })
    }

    async fn delete_bucket_subresource(
        &self,
        op: &'static str,
        req: &BucketRequest,
        subresource: &str,
    ) -> Result<BasicResult> {
        let out = self.invoke(req.input(op, Method::DELETE, subresource)).await?;
        Ok(BasicResult::from(&out))
    }

    /// Set tags of a bucket.
    pub async fn put_bucket_tags(&self, req: &PutBucketTagsRequest) -> Result<BasicResult> {
        self.put_bucket_xml("PutBucketTags", &req.bucket, "tagging", "Tagging", &req.tagging)
            .await
    }

    /// Get tags of a bucket.
    pub async fn get_bucket_tags(&self, req: &BucketRequest) -> Result<ConfigResult<Tagging>> {
        self.get_bucket_xml("GetBucketTags", req, "tagging").await
    }

    /// Delete tags of a bucket.
    pub async fn delete_bucket_tags(&self, req: &DeleteBucketTagsRequest) -> Result<BasicResult> {
        let input = OperationInput::new("DeleteBucketTags", Method::DELETE).with_bucket(&req.bucket);
        let input = if req.keys.is_empty() {
            input.with_subresource("tagging")
        } else {
            input.with_param("tagging", req.keys.join(","))
        };
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Set lifecycle rules of a bucket.
    pub async fn put_bucket_lifecycle(&self, req: &PutBucketLifecycleRequest) -> Result<BasicResult> {
        const OP: &str = "PutBucketLifecycle";
        let input = OperationInput::new(OP, Method::PUT)
            .with_bucket(&req.bucket)
            .with_subresource("lifecycle")
            .with_header_opt(
                "x-oss-allow-same-action-overlap",
                req.allow_same_action_overlap.then_some("true"),
            )
            .with_xml_body("LifecycleConfiguration", &req.lifecycle)
            .map_err(|e| e.with_operation(OP))?
            .with_content_md5();
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get lifecycle rules of a bucket.
    pub async fn get_bucket_lifecycle(
        &self,
        req: &BucketRequest,
    ) -> Result<ConfigResult<LifecycleConfiguration>> {
        self.get_bucket_xml("GetBucketLifecycle", req, "lifecycle").await
    }

    /// Delete lifecycle rules of a bucket.
    pub async fn delete_bucket_lifecycle(&self, req: &BucketRequest) -> Result<BasicResult> {
        self.delete_bucket_subresource("DeleteBucketLifecycle", req, "lifecycle")
            .await
    }

    /// Set CORS rules of a bucket.
    pub async fn put_bucket_cors(&self, req: &PutBucketCorsRequest) -> Result<BasicResult> {
        self.put_bucket_xml("PutBucketCors", &req.bucket, "cors", "CORSConfiguration", &req.cors)
            .await
    }

    /// Get CORS rules of a bucket.
    pub async fn get_bucket_cors(&self, req: &BucketRequest) -> Result<ConfigResult<CorsConfiguration>> {
        self.get_bucket_xml("GetBucketCors", req, "cors").await
    }

    /// Delete CORS rules of a bucket.
    pub async fn delete_bucket_cors(&self, req: &BucketRequest) -> Result<BasicResult> {
        self.delete_bucket_subresource("DeleteBucketCors", req, "cors").await
    }

    /// Set hotlink protection of a bucket.
    pub async fn put_bucket_referer(&self, req: &PutBucketRefererRequest) -> Result<BasicResult> {
        self.put_bucket_xml(
            "PutBucketReferer",
            &req.bucket,
            "referer",
            "RefererConfiguration",
            &req.referer,
        )
        .await
    }

    /// Get hotlink protection of a bucket.
    pub async fn get_bucket_referer(
        &self,
        req: &BucketRequest,
    ) -> Result<ConfigResult<RefererConfiguration>> {
        self.get_bucket_xml("GetBucketReferer", req, "referer").await
    }

    /// Set the authorization policy of a bucket.
    pub async fn put_bucket_policy(&self, req: &PutBucketPolicyRequest) -> Result<BasicResult> {
        let input = OperationInput::new("PutBucketPolicy", Method::PUT)
            .with_bucket(&req.bucket)
            .with_subresource("policy")
            .with_body(req.policy.clone());
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get the authorization policy of a bucket as json.
    pub async fn get_bucket_policy(&self, req: &BucketRequest) -> Result<ConfigResult<String>> {
        let out = self
            .invoke(req.input("GetBucketPolicy", Method::GET, "policy"))
            .await?;
        Ok(ConfigResult {
            config: String::from_utf8_lossy(&out.body).into_owned(),
            request_id: out.request_id(),
        })
    }

    /// Delete the authorization policy of a bucket.
    pub async fn delete_bucket_policy(&self, req: &BucketRequest) -> Result<BasicResult> {
        self.delete_bucket_subresource("DeleteBucketPolicy", req, "policy")
            .await
    }
}
