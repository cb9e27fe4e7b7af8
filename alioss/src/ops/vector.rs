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

//! Vector buckets, served by the `oss-vectors` endpoint with json bodies.

use super::{decode_json, BasicResult};
use crate::client::{default_context, Client, OperationInput, OperationOutput};
use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::error::Result;
use crate::paginator::{next_marker, Paginate, Paginator};
use alioss_auth::{Credential, DefaultCredentialProvider};
use alioss_core::{Context, ProvideCredential};
use async_trait::async_trait;
use http::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const VECTORS_PRODUCT: &str = "oss-vectors";

/// Client of vector buckets.
///
/// Buckets are addressed as `<bucket>-<account>.<region>.oss-vectors.aliyuncs.com`,
/// so [`Config::account_id`] must be set.
#[derive(Debug, Clone)]
pub struct VectorsClient {
    client: Client,
}

impl VectorsClient {
    /// Create a client with the default transport and credential chain.
    pub fn new(config: Config) -> Result<Self> {
        let ctx = default_context(&config)?;
        Self::with_credential_provider(config, ctx, DefaultCredentialProvider::new())
    }

    /// Create a client with given context and credential provider.
    pub fn with_credential_provider(
        mut config: Config,
        ctx: Context,
        provider: impl ProvideCredential<Credential = Credential>,
    ) -> Result<Self> {
        config.product = VECTORS_PRODUCT.to_string();
        let endpoint = Endpoint::vectors_from_config(&config)?;
        Ok(Self {
            client: Client::build(config, endpoint, ctx, provider)?,
        })
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Create a paginator for a vector list request.
    pub fn paginator<R: Paginate>(&self, request: R) -> Paginator<R> {
        self.client.paginator(request)
    }

    async fn post_json<T: Serialize>(
        &self,
        op: &'static str,
        bucket: &str,
        action: &str,
        body: &T,
    ) -> Result<OperationOutput> {
        let input = OperationInput::new(op, Method::POST)
            .with_bucket(bucket)
            .with_subresource(action)
            .with_json_body(body)
            .map_err(|e| e.with_operation(op))?;
        self.client.invoke(input).await
    }

    async fn call<T: Serialize, O: DeserializeOwned + WithRequestId>(
        &self,
        op: &'static str,
        bucket: &str,
        action: &str,
        body: &T,
    ) -> Result<O> {
        let out = self.post_json(op, bucket, action, body).await?;
        let mut result: O = decode_json(&out, op)?;
        result.set_request_id(out.request_id());
        Ok(result)
    }
}

trait WithRequestId {
    fn set_request_id(&mut self, id: String);
}

macro_rules! with_request_id {
    ($($ty:ty),*) => {
        $(impl WithRequestId for $ty {
            fn set_request_id(&mut self, id: String) {
                self.request_id = id;
            }
        })*
    };
}

with_request_id!(
    GetVectorBucketResult,
    ListVectorBucketsResult,
    GetVectorIndexResult,
    ListVectorIndexesResult,
    GetVectorsResult,
    ListVectorsResult,
    QueryVectorsResult
);

/// A vector bucket.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VectorBucket {
    /// Bucket name.
    pub name: String,
    /// Region id like `cn-hangzhou`.
    pub region: String,
    /// Location like `oss-cn-hangzhou`.
    pub location: String,
    /// When the bucket was created.
    pub creation_time: String,
    /// Public endpoint.
    pub extranet_endpoint: String,
    /// Internal endpoint.
    pub intranet_endpoint: String,
}

/// Result of `GetVectorBucket`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetVectorBucketResult {
    /// The bucket.
    pub bucket_info: VectorBucket,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `ListVectorBuckets`.
#[derive(Debug, Clone, Default)]
pub struct ListVectorBucketsRequest {
    /// Only list buckets starting with prefix.
    pub prefix: Option<String>,
    /// List buckets after this name.
    pub marker: Option<String>,
    /// Max buckets returned.
    pub max_keys: Option<i32>,
}

/// Result of `ListVectorBuckets`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListVectorBucketsResult {
    /// Buckets.
    pub buckets: Vec<VectorBucket>,
    /// More buckets are available.
    pub is_truncated: bool,
    /// Marker of the next page.
    pub next_marker: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Element type of vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDataType {
    /// 32-bit floats.
    #[default]
    Float32,
}

/// Distance used to rank query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine distance.
    #[default]
    Cosine,
    /// Euclidean distance.
    Euclidean,
}

/// Metadata options of an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IndexMetadataConfig {
    /// Metadata keys that can't be used in filters.
    pub non_filterable_metadata_keys: Vec<String>,
}

/// A vector index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VectorIndex {
    /// Index name.
    pub index_name: String,
    /// Element type.
    pub data_type: VectorDataType,
    /// Dimension of every vector.
    pub dimension: u32,
    /// Distance metric.
    pub distance_metric: DistanceMetric,
    /// Metadata options.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<IndexMetadataConfig>,
    /// When the index was created, set by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    /// Status of the index, set by the server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Request of `PutVectorIndex`.
#[derive(Debug, Clone, Default)]
pub struct PutVectorIndexRequest {
    /// Bucket name.
    pub bucket: String,
    /// The index.
    pub index: VectorIndex,
}

/// Request addressing one index.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Index name.
    pub index_name: String,
}

impl VectorIndexRequest {
    /// Create a request for given index.
    pub fn new(bucket: &str, index_name: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            index_name: index_name.to_string(),
        }
    }
}

/// Result of `GetVectorIndex`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetVectorIndexResult {
    /// The index.
    pub index: VectorIndex,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `ListVectorIndexes`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVectorIndexesRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Only list indexes starting with prefix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Max indexes returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i32>,
    /// Token of the page to list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Result of `ListVectorIndexes`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListVectorIndexesResult {
    /// Indexes.
    pub indexes: Vec<VectorIndex>,
    /// Token of the next page.
    pub next_token: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Data of a vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorData {
    /// 32-bit float elements.
    pub float32: Vec<f32>,
}

/// A vector with its key and metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vector {
    /// Key of the vector, unique in the index.
    pub key: String,
    /// Elements, omitted unless requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<VectorData>,
    /// Metadata, omitted unless requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    /// Distance to the query vector, query results only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

impl Vector {
    /// Create a vector with given key and elements.
    pub fn new(key: &str, data: Vec<f32>) -> Self {
        Self {
            key: key.to_string(),
            data: Some(VectorData { float32: data }),
            ..Default::default()
        }
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Request of `PutVectors`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutVectorsRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Index name.
    pub index_name: String,
    /// Vectors to write, existing keys are overwritten.
    pub vectors: Vec<Vector>,
}

/// Request of `GetVectors`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVectorsRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Index name.
    pub index_name: String,
    /// Keys to fetch.
    pub keys: Vec<String>,
    /// Return vector data.
    pub return_data: bool,
    /// Return vector metadata.
    pub return_metadata: bool,
}

/// Result of `GetVectors`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GetVectorsResult {
    /// Found vectors.
    pub vectors: Vec<Vector>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `DeleteVectors`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVectorsRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Index name.
    pub index_name: String,
    /// Keys to delete.
    pub keys: Vec<String>,
}

/// Request of `ListVectors`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListVectorsRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Index name.
    pub index_name: String,
    /// Max vectors returned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i32>,
    /// Token of the page to list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Return vector data.
    pub return_data: bool,
    /// Return vector metadata.
    pub return_metadata: bool,
    /// Total segments for a parallel listing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_count: Option<u32>,
    /// Segment listed by this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_index: Option<u32>,
}

impl ListVectorsRequest {
    /// Create a request for given index.
    pub fn new(bucket: &str, index_name: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            index_name: index_name.to_string(),
            ..Default::default()
        }
    }
}

/// Result of `ListVectors`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListVectorsResult {
    /// Vectors.
    pub vectors: Vec<Vector>,
    /// Token of the next page.
    pub next_token: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `QueryVectors`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryVectorsRequest {
    /// Bucket name.
    #[serde(skip)]
    pub bucket: String,
    /// Index name.
    pub index_name: String,
    /// The query vector.
    pub query_vector: VectorData,
    /// Number of nearest vectors returned.
    pub top_k: u32,
    /// Metadata filter, like `{"type": {"$eq": "doc"}}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Return distances.
    pub return_distance: bool,
    /// Return vector metadata.
    pub return_metadata: bool,
}

/// Result of `QueryVectors`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryVectorsResult {
    /// Nearest vectors, closest first.
    pub vectors: Vec<Vector>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IndexBody<'a> {
    index_name: &'a str,
    data_type: VectorDataType,
    dimension: u32,
    distance_metric: DistanceMetric,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<&'a IndexMetadataConfig>,
}

impl VectorsClient {
    /// Create a vector bucket.
    pub async fn put_vector_bucket(&self, bucket: &str) -> Result<BasicResult> {
        let input = OperationInput::new("PutVectorBucket", Method::PUT).with_bucket(bucket);
        let out = self.client.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get a vector bucket.
    pub async fn get_vector_bucket(&self, bucket: &str) -> Result<GetVectorBucketResult> {
        let input = OperationInput::new("GetVectorBucket", Method::GET)
            .with_bucket(bucket)
            .with_subresource("bucketInfo");
        let out = self.client.invoke(input).await?;
        let mut result: GetVectorBucketResult = decode_json(&out, "GetVectorBucket")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Delete an empty vector bucket.
    pub async fn delete_vector_bucket(&self, bucket: &str) -> Result<BasicResult> {
        let input = OperationInput::new("DeleteVectorBucket", Method::DELETE).with_bucket(bucket);
        let out = self.client.invoke(input).await?;
        Ok(BasicResult::from(&out))
    }

    /// List vector buckets of the account.
    pub async fn list_vector_buckets(&self, req: &ListVectorBucketsRequest) -> Result<ListVectorBucketsResult> {
        let input = OperationInput::new("ListVectorBuckets", Method::GET)
            .with_param_opt("prefix", req.prefix.as_ref())
            .with_param_opt("marker", req.marker.as_ref())
            .with_param_opt("max-keys", req.max_keys);
        let out = self.client.invoke(input).await?;
        let mut result: ListVectorBucketsResult = decode_json(&out, "ListVectorBuckets")?;
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Create a vector index.
    pub async fn put_vector_index(&self, req: &PutVectorIndexRequest) -> Result<BasicResult> {
        let body = IndexBody {
            index_name: &req.index.index_name,
            data_type: req.index.data_type,
            dimension: req.index.dimension,
            distance_metric: req.index.distance_metric,
            metadata: req.index.metadata.as_ref(),
        };
        let out = self
            .post_json("PutVectorIndex", &req.bucket, "putVectorIndex", &body)
            .await?;
        Ok(BasicResult::from(&out))
    }

    /// Get a vector index.
    pub async fn get_vector_index(&self, req: &VectorIndexRequest) -> Result<GetVectorIndexResult> {
        self.call("GetVectorIndex", &req.bucket, "getVectorIndex", req).await
    }

    /// Delete a vector index and its vectors.
    pub async fn delete_vector_index(&self, req: &VectorIndexRequest) -> Result<BasicResult> {
        let out = self
            .post_json("DeleteVectorIndex", &req.bucket, "deleteVectorIndex", req)
            .await?;
        Ok(BasicResult::from(&out))
    }

    /// List indexes of a vector bucket.
    pub async fn list_vector_indexes(&self, req: &ListVectorIndexesRequest) -> Result<ListVectorIndexesResult> {
        self.call("ListVectorIndexes", &req.bucket, "listVectorIndexes", req).await
    }

    /// Write vectors into an index.
    pub async fn put_vectors(&self, req: &PutVectorsRequest) -> Result<BasicResult> {
        let out = self.post_json("PutVectors", &req.bucket, "putVectors", req).await?;
        Ok(BasicResult::from(&out))
    }

    /// Get vectors by key.
    pub async fn get_vectors(&self, req: &GetVectorsRequest) -> Result<GetVectorsResult> {
        self.call("GetVectors", &req.bucket, "getVectors", req).await
    }

    /// Delete vectors by key.
    pub async fn delete_vectors(&self, req: &DeleteVectorsRequest) -> Result<BasicResult> {
        let out = self
            .post_json("DeleteVectors", &req.bucket, "deleteVectors", req)
            .await?;
        Ok(BasicResult::from(&out))
    }

    /// List vectors of an index.
    pub async fn list_vectors(&self, req: &ListVectorsRequest) -> Result<ListVectorsResult> {
        self.call("ListVectors", &req.bucket, "listVectors", req).await
    }

    /// Find the nearest vectors of a query vector.
    pub async fn query_vectors(&self, req: &QueryVectorsRequest) -> Result<QueryVectorsResult> {
        self.call("QueryVectors", &req.bucket, "queryVectors", req).await
    }
}

fn vectors(client: &Client) -> VectorsClient {
    VectorsClient {
        client: client.clone(),
    }
}

#[async_trait]
impl Paginate for ListVectorBucketsRequest {
    type Output = ListVectorBucketsResult;

    async fn fetch(&self, client: &Client) -> Result<ListVectorBucketsResult> {
        vectors(client).list_vector_buckets(self).await
    }

    fn next_request(&self, output: &ListVectorBucketsResult) -> Result<Option<Self>> {
        let Some(marker) = next_marker(
            "ListVectorBuckets",
            output.is_truncated,
            output.next_marker.as_deref(),
        )?
        else {
            return Ok(None);
        };
        let mut next = self.clone();
        next.marker = Some(marker);
        Ok(Some(next))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_keys = Some(limit);
    }
}

#[async_trait]
impl Paginate for ListVectorIndexesRequest {
    type Output = ListVectorIndexesResult;

    async fn fetch(&self, client: &Client) -> Result<ListVectorIndexesResult> {
        vectors(client).list_vector_indexes(self).await
    }

    fn next_request(&self, output: &ListVectorIndexesResult) -> Result<Option<Self>> {
        Ok(output.next_token.clone().filter(|t| !t.is_empty()).map(|token| {
            let mut next = self.clone();
            next.next_token = Some(token);
            next
        }))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_results = Some(limit);
    }
}

#[async_trait]
impl Paginate for ListVectorsRequest {
    type Output = ListVectorsResult;

    async fn fetch(&self, client: &Client) -> Result<ListVectorsResult> {
        vectors(client).list_vectors(self).await
    }

    fn next_request(&self, output: &ListVectorsResult) -> Result<Option<Self>> {
        Ok(output.next_token.clone().filter(|t| !t.is_empty()).map(|token| {
            let mut next = self.clone();
            next.next_token = Some(token);
            next
        }))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_results = Some(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::MockHttpSend;
    use crate::ErrorKind;
    use alioss_auth::StaticCredentialProvider;
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn vectors_client(mock: &MockHttpSend) -> VectorsClient {
        let config = Config::new("cn-hangzhou")
            .with_account_id("1234567890")
            .with_retry_delay(Duration::from_millis(1), Duration::from_millis(5));
        let ctx = Context::new().with_http_send(mock.clone());
        VectorsClient::with_credential_provider(config, ctx, StaticCredentialProvider::new("ak", "sk"))
            .unwrap()
    }

    #[test]
    fn test_account_id_required() {
        let err = VectorsClient::with_credential_provider(
            Config::new("cn-hangzhou"),
            Context::new(),
            StaticCredentialProvider::new("ak", "sk"),
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_put_vector_bucket() {
        let mock = MockHttpSend::new().reply(200, &[], "");
        vectors_client(&mock).put_vector_bucket("vbucket").await.unwrap();

        let req = mock.request(0);
        assert_eq!(req.method(), Method::PUT);
        assert_eq!(
            req.uri().host(),
            Some("vbucket-1234567890.cn-hangzhou.oss-vectors.aliyuncs.com")
        );
        let auth = req.headers()["authorization"].to_str().unwrap();
        assert!(auth.contains("/cn-hangzhou/oss-vectors/aliyun_v4_request"), "{auth}");
    }

    #[tokio::test]
    async fn test_put_and_query_vectors() {
        let query = r#"{"vectors":[{"key":"doc-1","distance":0.12,"metadata":{"type":"doc"}}]}"#;
        let mock = MockHttpSend::new().reply(200, &[], "").reply(200, &[], query);
        let c = vectors_client(&mock);

        let mut meta = Map::new();
        meta.insert("type".to_string(), Value::from("doc"));
        c.put_vectors(&PutVectorsRequest {
            bucket: "vbucket".to_string(),
            index_name: "idx".to_string(),
            vectors: vec![Vector::new("doc-1", vec![0.5, 1.0]).with_metadata(meta)],
        })
        .await
        .unwrap();

        let result = c
            .query_vectors(&QueryVectorsRequest {
                bucket: "vbucket".to_string(),
                index_name: "idx".to_string(),
                query_vector: VectorData {
                    float32: vec![0.5, 1.0],
                },
                top_k: 1,
                filter: Some(serde_json::json!({"type": {"$eq": "doc"}})),
                return_distance: true,
                return_metadata: true,
            })
            .await
            .unwrap();
        assert_eq!(result.vectors[0].key, "doc-1");
        assert_eq!(result.vectors[0].distance, Some(0.12));

        let put = mock.request(0);
        assert_eq!(put.uri().query(), Some("putVectors"));
        assert_eq!(put.headers()["content-type"], "application/json");
        let body: Value = serde_json::from_slice(put.body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "indexName": "idx",
                "vectors": [{"key": "doc-1", "data": {"float32": [0.5, 1.0]}, "metadata": {"type": "doc"}}]
            })
        );
        let q: Value = serde_json::from_slice(mock.request(1).body()).unwrap();
        assert_eq!(q["topK"], 1);
        assert_eq!(q["filter"]["type"]["$eq"], "doc");
    }

    #[tokio::test]
    async fn test_vector_index() {
        let got = r#"{"index":{"indexName":"idx","dataType":"float32","dimension":128,"distanceMetric":"euclidean","status":"enable"}}"#;
        let mock = MockHttpSend::new().reply(200, &[], "").reply(200, &[], got);
        let c = vectors_client(&mock);
        c.put_vector_index(&PutVectorIndexRequest {
            bucket: "vbucket".to_string(),
            index: VectorIndex {
                index_name: "idx".to_string(),
                dimension: 128,
                distance_metric: DistanceMetric::Euclidean,
                ..Default::default()
            },
        })
        .await
        .unwrap();
        let result = c
            .get_vector_index(&VectorIndexRequest::new("vbucket", "idx"))
            .await
            .unwrap();
        assert_eq!(result.index.dimension, 128);
        assert_eq!(result.index.distance_metric, DistanceMetric::Euclidean);

        let body: Value = serde_json::from_slice(mock.request(0).body()).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"indexName": "idx", "dataType": "float32", "dimension": 128, "distanceMetric": "euclidean"})
        );
        assert_eq!(mock.request(1).uri().query(), Some("getVectorIndex"));
    }

    #[tokio::test]
    async fn test_list_vector_buckets_paginator() {
        let first = r#"{"buckets":[{"name":"vb1","region":"cn-hangzhou"}],"isTruncated":true,"nextMarker":"vb1"}"#;
        let second = r#"{"buckets":[{"name":"vb2","region":"cn-hangzhou"}],"isTruncated":false}"#;
        let mock = MockHttpSend::new().reply(200, &[], first).reply(200, &[], second);
        let pages: Vec<_> = vectors_client(&mock)
            .paginator(ListVectorBucketsRequest::default())
            .into_stream()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].buckets[0].name, "vb2");

        let req = mock.request(1);
        assert_eq!(req.uri().host(), Some("1234567890.cn-hangzhou.oss-vectors.aliyuncs.com"));
        assert_eq!(req.uri().query(), Some("marker=vb1"));
    }

    #[tokio::test]
    async fn test_list_vectors_paginator() {
        let first = r#"{"vectors":[{"key":"a"}],"nextToken":"t1"}"#;
        let second = r#"{"vectors":[{"key":"b"}]}"#;
        let mock = MockHttpSend::new().reply(200, &[], first).reply(200, &[], second);
        let keys: Vec<String> = vectors_client(&mock)
            .paginator(ListVectorsRequest::new("vbucket", "idx"))
            .with_limit(1)
            .into_stream()
            .map_ok(|page| futures::stream::iter(page.vectors.into_iter().map(|v| Ok::<_, crate::Error>(v.key))))
            .try_flatten()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(keys, vec!["a", "b"]);

        let body: Value = serde_json::from_slice(mock.request(1).body()).unwrap();
        assert_eq!(body["nextToken"], "t1");
        assert_eq!(body["maxResults"], 1);
    }
}
