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

use super::object::{copy_source, PutObjectRequest};
use super::{decode_xml, url_decode, BasicResult, CommonPrefix};
use crate::client::{Client, OperationInput, OperationOutput, Presign, ToOperation};
use crate::error::Result;
use crate::paginator::{next_marker, Paginate};
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use serde::{Deserialize, Serialize};

/// Request of `InitiateMultipartUpload`.
///
/// Object headers like content type and metadata are taken from `object`,
/// its body is ignored.
#[derive(Debug, Clone, Default)]
pub struct InitiateMultipartUploadRequest {
    /// Target object and its headers.
    pub object: PutObjectRequest,
}

impl InitiateMultipartUploadRequest {
    /// Create a request for given object.
    pub fn new(bucket: &str, key: &str) -> Self {
        Self {
            object: PutObjectRequest::new(bucket, key),
        }
    }
}

impl From<&PutObjectRequest> for InitiateMultipartUploadRequest {
    fn from(req: &PutObjectRequest) -> Self {
        Self {
            object: PutObjectRequest {
                body: Bytes::new(),
                ..req.clone()
            },
        }
    }
}

impl ToOperation for InitiateMultipartUploadRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        let input = OperationInput::new("InitiateMultipartUpload", Method::POST)
            .with_bucket(&self.object.bucket)
            .with_key(&self.object.key)
            .with_subresource("uploads")
            .with_param("encoding-type", "url");
        Ok(self.object.apply_headers(input))
    }
}

impl Presign for InitiateMultipartUploadRequest {}

/// Result of `InitiateMultipartUpload`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct InitiateMultipartUploadResult {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Encoding of key in this result.
    pub encoding_type: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `UploadPart`.
#[derive(Debug, Clone, Default)]
pub struct UploadPartRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Part number, 1 to 10000.
    pub part_number: i32,
    /// Bandwidth limit in bit/s.
    pub traffic_limit: Option<u64>,
    /// Part content.
    pub body: Bytes,
}

impl ToOperation for UploadPartRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("UploadPart", Method::PUT)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_param("partNumber", self.part_number)
            .with_param("uploadId", &self.upload_id)
            .with_header_opt("x-oss-traffic-limit", self.traffic_limit)
            .with_body(self.body.clone()))
    }
}

impl Presign for UploadPartRequest {}

/// Result of `UploadPart`.
#[derive(Debug, Clone, Default)]
pub struct UploadPartResult {
    /// ETag of the part.
    pub etag: String,
    /// CRC-64 of the part.
    pub hash_crc64: Option<String>,
    /// MD5 of the part computed by the server.
    pub content_md5: Option<String>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

/// Request of `UploadPartCopy`.
#[derive(Debug, Clone, Default)]
pub struct UploadPartCopyRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Part number, 1 to 10000.
    pub part_number: i32,
    /// Source bucket, destination bucket if unset.
    pub source_bucket: Option<String>,
    /// Source key.
    pub source_key: String,
    /// Source version id.
    pub source_version_id: Option<String>,
    /// Source range, like `bytes=0-1023`.
    pub source_range: Option<String>,
    /// Only copy if the source ETag matches.
    pub if_match: Option<String>,
}

/// Result of `UploadPartCopy`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UploadPartCopyResult {
    /// ETag of the part.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// When the part was modified.
    pub last_modified: String,
    /// Version id of the source object.
    #[serde(skip)]
    pub source_version_id: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// A finished part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct UploadPart {
    /// Part number.
    pub part_number: i32,
    /// ETag of the part.
    #[serde(rename = "ETag")]
    pub etag: String,
}

/// Request of `CompleteMultipartUpload`.
#[derive(Debug, Clone, Default)]
pub struct CompleteMultipartUploadRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Parts to combine, sorted by number.
    pub parts: Vec<UploadPart>,
    /// Combine all uploaded parts, `parts` must be empty.
    pub complete_all: bool,
    /// Object acl.
    pub acl: Option<super::Acl>,
    /// Fail if an object with the same key exists.
    pub forbid_overwrite: bool,
}

#[derive(Debug, Serialize)]
struct CompleteMultipartUpload<'a> {
    #[serde(rename = "Part")]
    parts: &'a [UploadPart],
}

impl ToOperation for CompleteMultipartUploadRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        let input = OperationInput::new("CompleteMultipartUpload", Method::POST)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_param("uploadId", &self.upload_id)
            .with_param("encoding-type", "url")
            .with_header_opt("x-oss-object-acl", self.acl)
            .with_header_opt("x-oss-forbid-overwrite", self.forbid_overwrite.then_some("true"));
        if self.complete_all {
            return Ok(input.with_header("x-oss-complete-all", "yes"));
        }
        input.with_xml_body(
            "CompleteMultipartUpload",
            &CompleteMultipartUpload { parts: &self.parts },
        )
    }
}

impl Presign for CompleteMultipartUploadRequest {}

/// Result of `CompleteMultipartUpload`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CompleteMultipartUploadResult {
    /// Url of the object.
    pub location: String,
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// ETag of the object.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Encoding of key in this result.
    pub encoding_type: Option<String>,
    /// Version id of the object.
    #[serde(skip)]
    pub version_id: Option<String>,
    /// CRC-64 of the object.
    #[serde(skip)]
    pub hash_crc64: Option<String>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// Request of `AbortMultipartUpload`.
#[derive(Debug, Clone, Default)]
pub struct AbortMultipartUploadRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
}

impl ToOperation for AbortMultipartUploadRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("AbortMultipartUpload", Method::DELETE)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_param("uploadId", &self.upload_id))
    }
}

impl Presign for AbortMultipartUploadRequest {}

/// Request of `ListMultipartUploads`.
#[derive(Debug, Clone, Default)]
pub struct ListMultipartUploadsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Group keys up to this character.
    pub delimiter: Option<String>,
    /// List uploads after this key.
    pub key_marker: Option<String>,
    /// List uploads after this upload id of `key_marker`.
    pub upload_id_marker: Option<String>,
    /// Max uploads returned, 1000 at most.
    pub max_uploads: Option<i32>,
    /// Only list keys starting with prefix.
    pub prefix: Option<String>,
}

impl ListMultipartUploadsRequest {
    /// Create a request for given bucket.
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            ..Default::default()
        }
    }
}

impl ToOperation for ListMultipartUploadsRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("ListMultipartUploads", Method::GET)
            .with_bucket(&self.bucket)
            .with_subresource("uploads")
            .with_param_opt("delimiter", self.delimiter.as_ref())
            .with_param_opt("key-marker", self.key_marker.as_ref())
            .with_param_opt("upload-id-marker", self.upload_id_marker.as_ref())
            .with_param_opt("max-uploads", self.max_uploads)
            .with_param_opt("prefix", self.prefix.as_ref())
            .with_param("encoding-type", "url"))
    }
}

/// Result of `ListMultipartUploads`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListMultipartUploadsResult {
    /// Bucket name.
    pub bucket: String,
    /// Key marker in the request.
    pub key_marker: String,
    /// Upload id marker in the request.
    pub upload_id_marker: String,
    /// Key marker of the next page.
    pub next_key_marker: Option<String>,
    /// Upload id marker of the next page.
    pub next_upload_id_marker: Option<String>,
    /// Delimiter in the request.
    pub delimiter: String,
    /// Prefix in the request.
    pub prefix: String,
    /// Max uploads in the request.
    pub max_uploads: i32,
    /// More uploads are available.
    pub is_truncated: bool,
    /// Encoding of keys in this result.
    pub encoding_type: Option<String>,
    /// Uploads.
    #[serde(rename = "Upload")]
    pub uploads: Vec<MultipartUpload>,
    /// Grouped prefixes.
    pub common_prefixes: Vec<CommonPrefix>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// An incomplete multipart upload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct MultipartUpload {
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// When the upload was initiated.
    pub initiated: String,
}

/// Request of `ListParts`.
#[derive(Debug, Clone, Default)]
pub struct ListPartsRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Max parts returned, 1000 at most.
    pub max_parts: Option<i32>,
    /// List parts after this number.
    pub part_number_marker: Option<i32>,
}

impl ListPartsRequest {
    /// Create a request for given upload.
    pub fn new(bucket: &str, key: &str, upload_id: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            upload_id: upload_id.to_string(),
            ..Default::default()
        }
    }
}

impl ToOperation for ListPartsRequest {
    fn to_operation(&self) -> Result<OperationInput> {
        Ok(OperationInput::new("ListParts", Method::GET)
            .with_bucket(&self.bucket)
            .with_key(&self.key)
            .with_param("uploadId", &self.upload_id)
            .with_param_opt("max-parts", self.max_parts)
            .with_param_opt("part-number-marker", self.part_number_marker)
            .with_param("encoding-type", "url"))
    }
}

/// Result of `ListParts`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ListPartsResult {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Upload id.
    pub upload_id: String,
    /// Part number marker in the request.
    pub part_number_marker: i32,
    /// Part number marker of the next page.
    pub next_part_number_marker: Option<i32>,
    /// Max parts in the request.
    pub max_parts: i32,
    /// More parts are available.
    pub is_truncated: bool,
    /// Encoding of key in this result.
    pub encoding_type: Option<String>,
    /// Parts.
    #[serde(rename = "Part")]
    pub parts: Vec<PartInfo>,
    /// Value of `x-oss-request-id`.
    #[serde(skip)]
    pub request_id: String,
}

/// An uploaded part.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PartInfo {
    /// Part number.
    pub part_number: i32,
    /// When the part was uploaded.
    pub last_modified: String,
    /// ETag of the part.
    #[serde(rename = "ETag")]
    pub etag: String,
    /// Size in bytes.
    pub size: u64,
    /// CRC-64 of the part.
    pub hash_crc64ecma: Option<String>,
}

fn is_url_encoded(encoding_type: Option<&str>) -> bool {
    encoding_type == Some("url")
}

fn upload_part_result(out: &OperationOutput) -> UploadPartResult {
    UploadPartResult {
        etag: out.header_string("etag").unwrap_or_default(),
        hash_crc64: out.header_string("x-oss-hash-crc64ecma"),
        content_md5: out.header_string("content-md5"),
        request_id: out.request_id(),
    }
}

impl Client {
    /// Start a multipart upload.
    pub async fn initiate_multipart_upload(
        &self,
        req: &InitiateMultipartUploadRequest,
    ) -> Result<InitiateMultipartUploadResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: InitiateMultipartUploadResult =
            decode_xml(&out, "InitiateMultipartUpload")?;
        if is_url_encoded(result.encoding_type.as_deref()) {
            url_decode(&mut result.key);
        }
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Upload one part.
    pub async fn upload_part(&self, req: &UploadPartRequest) -> Result<UploadPartResult> {
        let out = self.invoke(req.to_operation()?).await?;
        Ok(upload_part_result(&out))
    }

    /// Copy a range of an object as one part.
    pub async fn upload_part_copy(&self, req: &UploadPartCopyRequest) -> Result<UploadPartCopyResult> {
        let source_bucket = req.source_bucket.as_deref().unwrap_or(&req.bucket);
        let input = OperationInput::new("UploadPartCopy", Method::PUT)
            .with_bucket(&req.bucket)
            .with_key(&req.key)
            .with_param("partNumber", req.part_number)
            .with_param("uploadId", &req.upload_id)
            .with_header(
                "x-oss-copy-source",
                copy_source(source_bucket, &req.source_key, req.source_version_id.as_deref()),
            )
            .with_header_opt("x-oss-copy-source-range", req.source_range.as_ref())
            .with_header_opt("x-oss-copy-source-if-match", req.if_match.as_ref());
        let out = self.invoke(input).await?;
        let mut result: UploadPartCopyResult = decode_xml(&out, "UploadPartCopy")?;
        result.source_version_id = out.header_string("x-oss-copy-source-version-id");
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Combine uploaded parts into an object.
    pub async fn complete_multipart_upload(
        &self,
        req: &CompleteMultipartUploadRequest,
    ) -> Result<CompleteMultipartUploadResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result = if out.body.is_empty() {
            CompleteMultipartUploadResult::default()
        } else {
            decode_xml::<CompleteMultipartUploadResult>(&out, "CompleteMultipartUpload")?
        };
        if is_url_encoded(result.encoding_type.as_deref()) {
            url_decode(&mut result.key);
        }
        if result.etag.is_empty() {
            result.etag = out.header_string("etag").unwrap_or_default();
        }
        result.version_id = out.header_string("x-oss-version-id");
        result.hash_crc64 = out.header_string("x-oss-hash-crc64ecma");
        result.request_id = out.request_id();
        Ok(result)
    }

    /// Abort a multipart upload and drop its parts.
    pub async fn abort_multipart_upload(&self, req: &AbortMultipartUploadRequest) -> Result<BasicResult> {
        let out = self.invoke(req.to_operation()?).await?;
        Ok(BasicResult::from(&out))
    }

    /// List incomplete multipart uploads of a bucket.
    pub async fn list_multipart_uploads(
        &self,
        req: &ListMultipartUploadsRequest,
    ) -> Result<ListMultipartUploadsResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: ListMultipartUploadsResult = decode_xml(&out, "ListMultipartUploads")?;
        if is_url_encoded(result.encoding_type.as_deref()) {
            url_decode(&mut result.key_marker);
            url_decode(&mut result.prefix);
            url_decode(&mut result.delimiter);
            if let Some(m) = result.next_key_marker.as_mut() {
                url_decode(m);
            }
            result.uploads.iter_mut().for_each(|u| url_decode(&mut u.key));
            result.common_prefixes.iter_mut().for_each(|p| url_decode(&mut p.prefix));
        }
        result.request_id = out.request_id();
        Ok(result)
    }

    /// List uploaded parts of a multipart upload.
    pub async fn list_parts(&self, req: &ListPartsRequest) -> Result<ListPartsResult> {
        let out = self.invoke(req.to_operation()?).await?;
        let mut result: ListPartsResult = decode_xml(&out, "ListParts")?;
        if is_url_encoded(result.encoding_type.as_deref()) {
            url_decode(&mut result.key);
        }
        result.request_id = out.request_id();
        Ok(result)
    }
}

#[async_trait]
impl Paginate for ListMultipartUploadsRequest {
    type Output = ListMultipartUploadsResult;

    async fn fetch(&self, client: &Client) -> Result<ListMultipartUploadsResult> {
        client.list_multipart_uploads(self).await
    }

    fn next_request(&self, output: &ListMultipartUploadsResult) -> Result<Option<Self>> {
        let Some(key_marker) = next_marker(
            "ListMultipartUploads",
            output.is_truncated,
            output.next_key_marker.as_deref(),
        )?
        else {
            return Ok(None);
        };
        let mut next = self.clone();
        next.key_marker = Some(key_marker);
        next.upload_id_marker = output.next_upload_id_marker.clone();
        Ok(Some(next))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_uploads = Some(limit);
    }
}

#[async_trait]
impl Paginate for ListPartsRequest {
    type Output = ListPartsResult;

    async fn fetch(&self, client: &Client) -> Result<ListPartsResult> {
        client.list_parts(self).await
    }

    fn next_request(&self, output: &ListPartsResult) -> Result<Option<Self>> {
        let marker = output.next_part_number_marker.map(|n| n.to_string());
        let Some(marker) = next_marker("ListParts", output.is_truncated, marker.as_deref())? else {
            return Ok(None);
        };
        let mut next = self.clone();
        next.part_number_marker = marker.parse().ok();
        Ok(Some(next))
    }

    fn set_limit(&mut self, limit: i32) {
        self.max_parts = Some(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{mock_client, MockHttpSend};
    use crate::Config;
    use futures::TryStreamExt;
    use pretty_assertions::assert_eq;

    fn client(mock: &MockHttpSend) -> Client {
        mock_client(mock, Config::new("cn-hangzhou"))
    }

    #[tokio::test]
    async fn test_initiate_multipart_upload() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">
    <Bucket>oss-example</Bucket>
    <Key>dir%2Fmultipart.data</Key>
    <UploadId>0004B9894A22E5B1888A1E29F823****</UploadId>
    <EncodingType>url</EncodingType>
</InitiateMultipartUploadResult>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let put = PutObjectRequest::new("oss-example", "dir/multipart.data")
            .with_content_type("application/octet-stream")
            .with_body("ignored");
        let result = client(&mock)
            .initiate_multipart_upload(&InitiateMultipartUploadRequest::from(&put))
            .await
            .unwrap();
        assert_eq!(result.upload_id, "0004B9894A22E5B1888A1E29F823****");
        assert_eq!(result.key, "dir/multipart.data");

        let req = mock.request(0);
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.uri().query(), Some("uploads&encoding-type=url"));
        assert_eq!(req.headers()["content-type"], "application/octet-stream");
        assert!(req.body().is_empty());
    }

    #[tokio::test]
    async fn test_upload_part() {
        let mock = MockHttpSend::new().reply(200, &[("etag", "\"7265F4D211B56873A381D321F586****\"")], "");
        let result = client(&mock)
            .upload_part(&UploadPartRequest {
                bucket: "oss-example".to_string(),
                key: "multipart.data".to_string(),
                upload_id: "0004B9895DBBB6EC9".to_string(),
                part_number: 3,
                body: Bytes::from("part"),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.etag, "\"7265F4D211B56873A381D321F586****\"");
        assert_eq!(
            mock.request(0).uri().query(),
            Some("partNumber=3&uploadId=0004B9895DBBB6EC9")
        );
    }

    #[tokio::test]
    async fn test_upload_part_copy() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<CopyPartResult xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">
    <LastModified>2014-07-17T06:27:54.000Z</LastModified>
    <ETag>"5B3C1A2E053D763E1B002CC607C5****"</ETag>
</CopyPartResult>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let result = client(&mock)
            .upload_part_copy(&UploadPartCopyRequest {
                bucket: "oss-example".to_string(),
                key: "multipart.data".to_string(),
                upload_id: "u1".to_string(),
                part_number: 1,
                source_key: "src.data".to_string(),
                source_range: Some("bytes=100-6291756".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.etag, "\"5B3C1A2E053D763E1B002CC607C5****\"");

        let req = mock.request(0);
        assert_eq!(req.headers()["x-oss-copy-source"], "/oss-example/src.data");
        assert_eq!(req.headers()["x-oss-copy-source-range"], "bytes=100-6291756");
    }

    #[tokio::test]
    async fn test_complete_multipart_upload() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<CompleteMultipartUploadResult xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">
    <EncodingType>url</EncodingType>
    <Location>http://oss-example.oss-cn-hangzhou.aliyuncs.com/multipart.data</Location>
    <Bucket>oss-example</Bucket>
    <Key>multipart.data</Key>
    <ETag>"B864DB6A936D376F9F8D3ED3BBE540****"</ETag>
</CompleteMultipartUploadResult>"#;
        let mock = MockHttpSend::new().reply(200, &[], body).reply(200, &[], body);
        let c = client(&mock);

        let result = c
            .complete_multipart_upload(&CompleteMultipartUploadRequest {
                bucket: "oss-example".to_string(),
                key: "multipart.data".to_string(),
                upload_id: "u1".to_string(),
                parts: vec![
                    UploadPart {
                        part_number: 1,
                        etag: "\"3349DC700140D7F86A0784842780****\"".to_string(),
                    },
                    UploadPart {
                        part_number: 5,
                        etag: "\"8EFDA8BE206636A695359836FE0A****\"".to_string(),
                    },
                ],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(result.etag, "\"B864DB6A936D376F9F8D3ED3BBE540****\"");
        assert_eq!(result.bucket, "oss-example");

        c.complete_multipart_upload(&CompleteMultipartUploadRequest {
            bucket: "oss-example".to_string(),
            key: "multipart.data".to_string(),
            upload_id: "u1".to_string(),
            complete_all: true,
            ..Default::default()
        })
        .await
        .unwrap();

        let explicit = mock.request(0);
        assert_eq!(explicit.uri().query(), Some("uploadId=u1&encoding-type=url"));
        let xml = std::str::from_utf8(explicit.body()).unwrap();
        assert!(xml.contains("<CompleteMultipartUpload><Part><PartNumber>1</PartNumber><ETag>"));
        assert!(xml.contains("<Part><PartNumber>5</PartNumber>"));
        assert_eq!(explicit.headers()["content-type"], "application/xml");
        let all = mock.request(1);
        assert_eq!(all.headers()["x-oss-complete-all"], "yes");
        assert!(all.body().is_empty());
    }

    #[tokio::test]
    async fn test_list_multipart_uploads_paginator() {
        let first = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListMultipartUploadsResult xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">
    <Bucket>oss-example</Bucket>
    <KeyMarker></KeyMarker>
    <UploadIdMarker></UploadIdMarker>
    <NextKeyMarker>oss.avi</NextKeyMarker>
    <NextUploadIdMarker>0004B99B8E707874FC2D692FA5D77D3F</NextUploadIdMarker>
    <Delimiter></Delimiter>
    <Prefix></Prefix>
    <MaxUploads>2</MaxUploads>
    <IsTruncated>true</IsTruncated>
    <Upload>
        <Key>multipart.data</Key>
        <UploadId>0004B999EF518A1FE585B0C9360DC4C8</UploadId>
        <Initiated>2012-02-23T04:18:23.000Z</Initiated>
    </Upload>
    <Upload>
        <Key>oss.avi</Key>
        <UploadId>0004B99B8E707874FC2D692FA5D77D3F</UploadId>
        <Initiated>2012-02-23T06:14:27.000Z</Initiated>
    </Upload>
</ListMultipartUploadsResult>"#;
        let second = "<ListMultipartUploadsResult><IsTruncated>false</IsTruncated></ListMultipartUploadsResult>";
        let mock = MockHttpSend::new().reply(200, &[], first).reply(200, &[], second);

        let pages: Vec<_> = client(&mock)
            .paginator(ListMultipartUploadsRequest::new("oss-example"))
            .with_limit(2)
            .into_stream()
            .try_collect()
            .await
            .unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].uploads.len(), 2);
        assert_eq!(pages[0].uploads[1].key, "oss.avi");
        assert_eq!(
            mock.request(1).uri().query(),
            Some("uploads&key-marker=oss.avi&upload-id-marker=0004B99B8E707874FC2D692FA5D77D3F&max-uploads=2&encoding-type=url")
        );
    }

    #[tokio::test]
    async fn test_list_parts() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListPartsResult xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">
    <Bucket>multipart_upload</Bucket>
    <Key>multipart.data</Key>
    <UploadId>0004B999EF5A239BB9138C6227D6****</UploadId>
    <NextPartNumberMarker>5</NextPartNumberMarker>
    <MaxParts>1000</MaxParts>
    <IsTruncated>false</IsTruncated>
    <Part>
        <PartNumber>1</PartNumber>
        <LastModified>2012-02-23T07:01:34.000Z</LastModified>
        <ETag>"3349DC700140D7F86A0784842780****"</ETag>
        <Size>6291456</Size>
    </Part>
    <Part>
        <PartNumber>2</PartNumber>
        <LastModified>2012-02-23T07:01:12.000Z</LastModified>
        <ETag>"3349DC700140D7F86A0784842780****"</ETag>
        <Size>6291456</Size>
    </Part>
    <Part>
        <PartNumber>5</PartNumber>
        <LastModified>2012-02-23T07:02:03.000Z</LastModified>
        <ETag>"7265F4D211B56873A381D321F586****"</ETag>
        <Size>1024</Size>
    </Part>
</ListPartsResult>"#;
        let mock = MockHttpSend::new().reply(200, &[], body);
        let req = ListPartsRequest::new("oss-example", "multipart.data", "u1");
        let result = client(&mock).list_parts(&req).await.unwrap();
        assert_eq!(result.parts.len(), 3);
        assert_eq!(result.parts[2].part_number, 5);
        assert_eq!(result.parts[2].size, 1024);
        assert!(req.next_request(&result).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_abort_multipart_upload() {
        let mock = MockHttpSend::new().reply(204, &[], "");
        let result = client(&mock)
            .abort_multipart_upload(&AbortMultipartUploadRequest {
                bucket: "oss-example".to_string(),
                key: "multipart.data".to_string(),
                upload_id: "u1".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(result.status, 204);
        assert_eq!(mock.request(0).method(), Method::DELETE);
    }
}
