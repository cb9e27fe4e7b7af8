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

use super::{decode_xml, Owner};
use crate::client::{Client, OperationInput, ToOperation};
use crate::error::Result;
use crate::paginator::{next_marker, Paginate};
use async_trait::async_trait;
use http::Method;
use serde::Deserialize;

/// Request of `ListBuckets`.
#[derive(Debug, Clone, Default)]
pub struct ListBucketsRequest {
    /// Only list buckets starting with prefix.
    pub prefix: Option<String>,
    /// List buckets after this name.
    pub marker: Option<String>,
    /// Max buckets returned, 1000 at most.
    pub max_keys: Option<i32>,
    /// Only list buckets in this resource group.
    pub resource_group_id: Option<String>,
}

impl ListBucketsRequest {
    /// Create a request listing all buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set prefix.
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
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

impl ToOperation for ListBucketsRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("ListBuckets", Method::GET)
            .with_param_opt("prefix", self.prefix.as_ref())
            .with_param_opt("marker", self.marker.as_ref())
            .with_param_opt("max-keys", self.max_keys)
            .with_header_opt("x-oss-resource-group-id", self.resource_group_id.as_ref()))
    }
}

/// Result of `ListBuckets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListBucketsResult {
    /// Prefix in the request.
    pub prefix: Option<String>,
    /// Marker in the request.
    pub marker: Option<String>,
    /// Max keys in the request.
    pub max_keys: Option<i32>,
    /// More buckets are available.
    pub is_truncated: bool,
    /// Marker of the next page.
    pub next_marker: Option<String>,
    /// Owner of the buckets.
    pub owner: Owner,
    /// Buckets in this page.
    pub buckets: Buckets,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Wrapper of `<Buckets>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Buckets {
    /// Buckets.
    #[serde(rename = "Bucket")]
    pub bucket: Vec<BucketProperties>,
}

/// A bucket returned by `ListBuckets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct BucketProperties {
    /// Bucket name.
    pub name: String,
    /// Region id like `oss-cn-hangzhou`.
    pub location: String,
    /// When the bucket was created.
    pub creation_date: String,
    /// Storage class.
    pub storage_class: String,
    /// Public endpoint.
    pub extranet_endpoint: String,
    /// Internal endpoint.
    pub intranet_endpoint: String,
    /// Region like `cn-hangzhou`.
    pub region: String,
    /// Resource group.
    pub resource_group_id: Option<String>,
}

/// Request of `DescribeRegions`.
#[derive(Debug, Clone, Default)]
pub struct DescribeRegionsRequest {
    /// Only describe this region, like `oss-cn-hangzhou`.
    pub regions: Option<String>,
}

impl ToOperation for DescribeRegionsRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        let input = OperationInput::new("DescribeRegions", Method::GET);
        Ok(match &self.regions {
            Some(region) => input.with_param("regions", region),
            None => input.with_subresource("regions"),
        })
    }
}

/// Result of `DescribeRegions`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct DescribeRegionsResult {
    /// Regions.
    #[serde(rename = "RegionInfo")]
    pub region_info: Vec<RegionInfo>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Endpoints of one region.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct RegionInfo {
    /// Region id like `oss-cn-hangzhou`.
    pub region: String,
    /// Public endpoint.
    pub internet_endpoint: String,
    /// Internal endpoint.
    pub internal_endpoint: String,
    /// Acceleration endpoint.
    pub accelerate_endpoint: String,
}

impl Client {
    /// List buckets owned by the caller.
    pub async fn list_buckets(&self, req: &ListBucketsRequest) -> Result<ListBucketsResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: ListBucketsResult = decode_xml(&out, "ListBuckets")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Describe endpoints of all regions, or the one in request.
    pub async fn describe_regions(&self, req: &DescribeRegionsRequest) -> Result<DescribeRegionsResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: DescribeRegionsResult = decode_xml(&out, "DescribeRegions")?;
        result.request_id = out.request_id();
        Ok(result)
    }
}

#[async_trait]
impl Paginate for ListBucketsRequest {
    type Output = ListBucketsResult;

    async fn fetch(&self, client: &Client) -> Result<ListBucketsResult> {
        client.list_buckets(self).await
    }

    fn next_request(&self, output: &ListBucketsResult) -> Result<Option<Self>> {
        let marker = next_marker("ListBuckets", output.is_truncated, output.next_marker.as_deref())?;
        Ok(marker.map(|m| self.clone().with_marker(&m)))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_keys = Some(limit);
    }
}
