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

use crate::utils::percent_encode_query;
use crate::{Error, Result};
use http::header::HeaderName;
use http::uri::{Authority, PathAndQuery, Scheme};
use http::{HeaderMap, HeaderValue, Method, Uri};
use std::borrow::Cow;
use std::mem;
use std::str::FromStr;

/// Signing context for request.
///
/// Query pairs are kept percent decoded. An empty value stands for a bare key
/// such as `?acl` and is written back without `=`.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path, still percent encoded.
    pub path: String,
    /// HTTP query parameters, percent decoded.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTPS),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq.query().map(parse_query).unwrap_or_default(),

            // Headers are moved out and returned in `apply`.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    ///
    /// Query keys and values are percent encoded again.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method;

        let mut paq = self.path;
        if !self.query.is_empty() {
            paq.push('?');
            for (i, (k, v)) in self.query.iter().enumerate() {
                if i > 0 {
                    paq.push('&');
                }
                paq.push_str(&percent_encode_query(k));
                if !v.is_empty() {
                    paq.push('=');
                    paq.push_str(&percent_encode_query(v));
                }
            }
        }

        let mut uri_parts = mem::take(&mut parts.uri).into_parts();
        uri_parts.scheme = Some(self.scheme);
        uri_parts.authority = Some(self.authority);
        uri_parts.path_and_query = Some(PathAndQuery::from_str(&paq)?);
        parts.uri = Uri::from_parts(uri_parts)?;

        Ok(())
    }

    /// Get the path percent decoded.
    pub fn path_percent_decoded(&self) -> Cow<'_, str> {
        percent_encoding::percent_decode_str(&self.path).decode_utf8_lossy()
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Get the first query value of given key.
    pub fn query_get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Collect queries whose key matches the filter.
    pub fn query_to_vec_with_filter(&self, filter: impl Fn(&str) -> bool) -> Vec<(String, String)> {
        self.query
            .iter()
            .filter(|(k, _)| filter(k))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Get header value by name.
    ///
    /// Returns empty string if header not found.
    #[inline]
    pub fn header_get_or_default(&self, key: &HeaderName) -> Result<&str> {
        match self.headers.get(key) {
            Some(v) => Ok(v.to_str()?),
            None => Ok(""),
        }
    }

    /// Collect headers whose lowercase name starts with prefix, values trimmed.
    pub fn header_to_vec_with_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>> {
        self.headers
            .iter()
            .filter(|(k, _)| k.as_str().starts_with(prefix))
            .map(|(k, v)| Ok::<_, Error>((k.as_str().to_lowercase(), v.to_str()?.trim().to_string())))
            .collect()
    }

    /// Insert a header, replacing the existing one.
    pub fn header_insert(&mut self, key: HeaderName, value: &str) -> Result<()> {
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(key == http::header::AUTHORIZATION);
        self.headers.insert(key, value);
        Ok(())
    }

    /// Join sorted pairs into a string.
    ///
    /// ```shell
    /// [(a, b), (c, d)] with (":", "\n") => "a:b\nc:d"
    /// ```
    ///
    /// Pairs with empty values are written as bare keys.
    pub fn pairs_to_string(mut pairs: Vec<(String, String)>, sep: &str, join: &str) -> String {
        pairs.sort();

        let mut s = String::with_capacity(16);
        for (idx, (k, v)) in pairs.into_iter().enumerate() {
            if idx != 0 {
                s.push_str(join);
            }

            s.push_str(&k);
            if !v.is_empty() {
                s.push_str(sep);
                s.push_str(&v);
            }
        }

        s
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (
                percent_encoding::percent_decode_str(k)
                    .decode_utf8_lossy()
                    .into_owned(),
                percent_encoding::percent_decode_str(v)
                    .decode_utf8_lossy()
                    .into_owned(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_and_apply() -> Result<()> {
        let req = http::Request::get(
            "https://bucket.oss-cn-hangzhou.aliyuncs.com/dir/a%20b.txt?acl&prefix=a%2Fb&max-keys=10",
        )
        .header("x-oss-meta-name", "  value ")
        .body(())?;
        let (mut parts, _) = req.into_parts();

        let mut sr = SigningRequest::build(&mut parts)?;
        assert_eq!(sr.authority.as_str(), "bucket.oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(sr.path_percent_decoded(), "/dir/a b.txt");
        assert_eq!(sr.query_get("prefix"), Some("a/b"));
        assert_eq!(sr.query_get("acl"), Some(""));
        assert_eq!(
            sr.header_to_vec_with_prefix("x-oss-")?,
            vec![("x-oss-meta-name".to_string(), "value".to_string())]
        );

        sr.query_push("security-token", "a+b/c");
        sr.apply(&mut parts)?;

        assert_eq!(
            parts.uri.to_string(),
            "https://bucket.oss-cn-hangzhou.aliyuncs.com/dir/a%20b.txt?acl&prefix=a%2Fb&max-keys=10&security-token=a%2Bb%2Fc"
        );
        assert!(parts.headers.contains_key("x-oss-meta-name"));
        Ok(())
    }

    #[test]
    fn test_build_without_authority() {
        let (mut parts, _) = http::Request::get("/path").body(()).unwrap().into_parts();
        let err = SigningRequest::build(&mut parts).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::RequestInvalid);
    }

    #[test]
    fn test_pairs_to_string() {
        let pairs = vec![
            ("uploadId".to_string(), "abc".to_string()),
            ("acl".to_string(), "".to_string()),
            ("partNumber".to_string(), "1".to_string()),
        ];
        assert_eq!(
            SigningRequest::pairs_to_string(pairs, "=", "&"),
            "acl&partNumber=1&uploadId=abc"
        );
    }
}
