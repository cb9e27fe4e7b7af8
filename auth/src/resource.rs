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

/// Resource is the bucket and object key a request addresses.
///
/// The client stores it in the request extensions so signers can build the
/// canonical resource without parsing the host, which differs between
/// virtual-hosted, path-style and CNAME addressing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resource {
    /// Bucket name, `None` for service level requests like `ListBuckets`.
    pub bucket: Option<String>,
    /// Object key, not encoded.
    pub key: Option<String>,
}

impl Resource {
    /// Resource for a service level request.
    pub fn service() -> Self {
        Self::default()
    }

    /// Resource for a bucket level request.
    pub fn bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            key: None,
        }
    }

    /// Resource for an object level request.
    pub fn object(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: Some(bucket.into()),
            key: Some(key.into()),
        }
    }

    /// The path used in canonical strings: `/`, `/bucket/` or `/bucket/key`.
    pub fn canonical_path(&self) -> String {
        match (&self.bucket, &self.key) {
            (Some(bucket), Some(key)) => format!("/{bucket}/{key}"),
            (Some(bucket), None) => format!("/{bucket}/"),
            _ => "/".to_string(),
        }
    }
}

/// Find the resource a request addresses.
///
/// Falls back to `default_bucket` plus the decoded path when the client did not
/// attach a [`Resource`], and to path-style parsing when no bucket is known.
pub(crate) fn resolve_resource(req: &http::request::Parts, default_bucket: Option<&str>) -> Resource {
    if let Some(resource) = req.extensions.get::<Resource>() {
        return resource.clone();
    }

    let path = percent_encoding::percent_decode_str(req.uri.path()).decode_utf8_lossy();
    let path = path.trim_start_matches('/');
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());

    match default_bucket {
        Some(bucket) => Resource {
            bucket: Some(bucket.to_string()),
            key: non_empty(path),
        },
        None => match path.split_once('/') {
            Some((bucket, key)) => Resource {
                bucket: non_empty(bucket),
                key: non_empty(key),
            },
            None => Resource {
                bucket: non_empty(path),
                key: None,
            },
        },
    }
}
