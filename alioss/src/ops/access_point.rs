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

use super::{decode_xml, BasicResult};
use crate::client::{Client, OperationInput};
use crate::error::Result;
use crate::paginator::{next_marker, Paginate};
use async_trait::async_trait;
use http::Method;
use serde::{Deserialize, Serialize};

const ACCESS_POINT_NAME: &str = "x-oss-access-point-name";

/// Where an access point accepts requests from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkOrigin {
    /// Only from the given vpc.
    Vpc,
    /// From anywhere.
    Internet,
}

/// Vpc of an access point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct VpcConfiguration {
    /// Vpc id.
    pub vpc_id: String,
}

/// Request of `CreateAccessPoint`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAccessPointRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Access point name.
    pub access_point_name: String,
    /// Network origin.
    pub network_origin: NetworkOrigin,
    /// Vpc, required for [`NetworkOrigin::Vpc`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_configuration: Option<VpcConfiguration>,
}

/// Result of `CreateAccessPoint`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CreateAccessPointResult {
    /// Arn of the access point.
    pub access_point_arn: String,
    /// Alias of the access point.
    pub alias: String,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request addressing one access point of a bucket.
#[derive(Debug, Clone, Default)]
pub struct AccessPointRequest {
    /// Bucket name.
    pub bucket: String,
    /// Access point name.
    pub access_point_name: String,
}

impl AccessPointRequest {
    /// Create a request for given access point.
    pub fn new(bucket: &str, access_point_name: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            access_point_name: access_point_name.to_string(),
        }
    }

    fn input(&self, op: &'static str, method: Method, subresource: &str) -> OperationInput {
        OperationInput::new(op, method)
            .with_bucket(&self.bucket)
            .with_subresource(subresource)
            .with_header(ACCESS_POINT_NAME, &self.access_point_name)
    }
}

/// Endpoints of an access point.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AccessPointEndpoints {
    /// Public endpoint.
    pub public_endpoint: String,
    /// Internal endpoint.
    pub internal_endpoint: String,
}

/// Result of `GetAccessPoint`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct GetAccessPointResult {
    /// Access point name.
    pub access_point_name: String,
    /// Bucket name.
    pub bucket: String,
    /// Owner account.
    pub account_id: String,
    /// Network origin, `vpc` or `internet`.
    pub network_origin: String,
    /// Vpc of the access point.
    pub vpc_configuration: Option<VpcConfiguration>,
    /// Arn of the access point.
    pub access_point_arn: String,
    /// When the access point was created.
    pub creation_date: String,
    /// Alias of the access point.
    pub alias: String,
    /// `enable`, `disable`, `creating` or `deleting`.
    pub status: String,
    /// Endpoints.
    pub endpoints: AccessPointEndpoints,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `ListAccessPoints`.
///
/// Without a bucket all access points of the account are listed.
#[derive(Debug, Clone, Default)]
pub struct ListAccessPointsRequest {
    /// Bucket name.
    pub bucket: Option<String>,
    /// Max access points returned.
    pub max_keys: Option<i32>,
    /// Token of the page to list.
    pub continuation_token: Option<String>,
}

/// Result of `ListAccessPoints`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListAccessPointsResult {
    /// More access points are available.
    pub is_truncated: bool,
    /// Token of the next page.
    pub next_continuation_token: Option<String>,
    /// Owner account.
    pub account_id: String,
    /// Access points.
    pub access_points: AccessPoints,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Wrapper of listed access points.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AccessPoints {
    /// Access points.
    #[serde(rename = "AccessPoint")]
    pub access_point: Vec<AccessPointSummary>,
}

/// A listed access point.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AccessPointSummary {
    /// Bucket name.
    pub bucket: String,
    /// Access point name.
    pub access_point_name: String,
    /// Alias of the access point.
    pub alias: String,
    /// Network origin.
    pub network_origin: String,
    /// Vpc of the access point.
    pub vpc_configuration: Option<VpcConfiguration>,
    /// Status of the access point.
    pub status: String,
}

/// Request of `PutAccessPointPolicy`.
#[derive(Debug, Clone, Default)]
pub struct PutAccessPointPolicyRequest {
    /// Target access point.
    pub access_point: AccessPointRequest,
    /// Policy document in json.
    pub policy: String,
}

/// Result of `GetAccessPointPolicy`.
#[derive(Debug, Clone, Default)]
pub struct GetAccessPointPolicyResult {
    /// Policy document in json.
    pub policy: String,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

impl Client {
    /// Create an access point for a bucket.
    pub async fn create_access_point(&self, req: &CreateAccessPointRequest) -> Result<CreateAccessPointResult> {
        let input = OperationInput::new("CreateAccessPoint", Method::PUT)
            .with_bucket(&req.bucket)
            .with_subresource("accessPoint")
            .with_xml_body("CreateAccessPointConfiguration", req)
            .map_err(|e| e.with_operation("CreateAccessPoint"))?
            .with_content_md5();
        let out = self.invoke(input).await?;
        let mut result: CreateAccessPointResult = decode_xml(&out, "CreateAccessPoint")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Get an access point.
    pub async fn get_access_point(&self, req: &AccessPointRequest) -> Result<GetAccessPointResult> {
        let out = self
            .invoke(req.input("GetAccessPoint", Method::GET, "accessPoint"))
            .await?;
        let mut result: GetAccessPointResult = decode_xml(&out, "GetAccessPoint")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Delete an access point.
    pub async fn delete_access_point(&self, req: &AccessPointRequest) -> Result<BasicResult> {
        let out = self
            .invoke(req.input("DeleteAccessPoint", Method::DELETE, "accessPoint"))
            .await?;
        Ok(BasicResult::from(&out))
    }

    /// List access points of a bucket or the whole account.
    pub async fn list_access_points(&self, req: &ListAccessPointsRequest) -> Result<ListAccessPointsResult> {
        let mut input = OperationInput::new("ListAccessPoints", Method::GET)
            .with_subresource("accessPoint")
            .with_param_opt("max-keys", req.max_keys)
            .with_param_opt("continuation-token", req.continuation_token.as_ref());
        if let Some(bucket) = &req.bucket {
            input = input.with_bucket(bucket);
        }
        let out = self.invoke(input).await?;
        let mut result: ListAccessPointsResult = decode_xml(&out, "ListAccessPoints")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Set the policy of an access point.
    pub async fn put_access_point_policy(&self, req: &PutAccessPointPolicyRequest) -> Result<BasicResult> {
        let input = req
            .access_point
            .input("PutAccessPointPolicy", Method::PUT, "accessPointPolicy")
            .with_body(req.policy.clone());
        let out = self.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get the policy of an access point as json.
    pub async fn get_access_point_policy(&self, req: &AccessPointRequest) -> Result<GetAccessPointPolicyResult> {
        let out = self
            .invoke(req.input("GetAccessPointPolicy", Method::GET, "accessPointPolicy"))
            .await?;
        Ok(GetAccessPointPolicyResult {
            policy: String::from_utf8_lossy(&out.body).into_owned(),
            request_id: out.request_id(),
        })
    }

    /// Delete the policy of an access point.
    pub async fn delete_access_point_policy(&self, req: &AccessPointRequest) -> Result<BasicResult> {
        let out = self
            .invoke(req.input("DeleteAccessPointPolicy", Method::DELETE, "accessPointPolicy"))
            .await?;
        Ok(BasicResult::from(&out))
    }
}

#[async_trait]
impl Paginate for ListAccessPointsRequest {
    type Output = ListAccessPointsResult;

    async fn fetch(&self, client: &Client) -> Result<ListAccessPointsResult> {
        client.list_access_points(self).await
    }

    fn next_request(&self, output: &ListAccessPointsResult) -> Result<Option<Self>> {
        let Some(token) = next_marker(
            "ListAccessPoints",
            output.is_truncated,
            output.next_continuation_token.as_deref(),
        )?
        else {
            return Ok(None);
        };
        let mut next = self.clone();
        next.continuation_token = Some(token);
        Ok(Some(next))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_keys = Some(limit);
    }
}
