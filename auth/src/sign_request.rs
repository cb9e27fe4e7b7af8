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

use crate::constants::*;
use crate::credential::Credential;
use crate::resource::resolve_resource;
use crate::Resource;
use alioss_core::hash::base64_hmac_sha1;
use alioss_core::time::{format_http_date, now, DateTime};
use alioss_core::{Context, Error, Result, SignRequest, SigningRequest};
use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE, DATE};
use http::HeaderName;
use log::debug;
use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt::Write;
use std::time::Duration;

/// RequestSigner for OSS signature V1 (`OSS <ak>:<signature>`).
#[derive(Debug, Default)]
pub struct RequestSigner {
    bucket: Option<String>,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer for OSS signature V1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bucket used when a request carries no [`Resource`].
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_string());
        self
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }

    fn get_time(&self) -> DateTime {
        self.time.unwrap_or_else(now)
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _ctx: &Context,
        req: &mut http::request::Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Ok(());
        };

        let resource = resolve_resource(req, self.bucket.as_deref());
        let signing_time = self.get_time();
        let mut sr = SigningRequest::build(req)?;

        match expires_in {
            Some(expires) => {
                let expires_at = signing_time
                    + chrono::TimeDelta::from_std(expires).map_err(|e| {
                        Error::request_invalid("invalid expiration duration").with_source(e)
                    })?;
                if let Some(token) = &cred.security_token {
                    sr.query_push("security-token", token);
                }

                let string_to_sign =
                    string_to_sign(&sr, &resource, &expires_at.timestamp().to_string())?;
                debug!("calculated string to sign: {string_to_sign}");
                let signature =
                    base64_hmac_sha1(cred.access_key_secret.as_bytes(), string_to_sign.as_bytes());

                sr.query_push("OSSAccessKeyId", &cred.access_key_id);
                sr.query_push("Expires", expires_at.timestamp().to_string());
                sr.query_push("Signature", signature);
            }
            None => {
                let date = format_http_date(signing_time);
                sr.header_insert(DATE, &date)?;
                if let Some(token) = &cred.security_token {
                    sr.header_insert(HeaderName::from_static(X_OSS_SECURITY_TOKEN), token)?;
                }

                let string_to_sign = string_to_sign(&sr, &resource, &date)?;
                debug!("calculated string to sign: {string_to_sign}");
                let signature =
                    base64_hmac_sha1(cred.access_key_secret.as_bytes(), string_to_sign.as_bytes());

                sr.header_insert(
                    AUTHORIZATION,
                    &format!("OSS {}:{}", cred.access_key_id, signature),
                )?;
            }
        }

        sr.apply(req)
    }
}

/// Build the V1 string to sign.
///
/// ```text
/// VERB + "\n"
/// + Content-MD5 + "\n"
/// + Content-Type + "\n"
/// + Date + "\n"
/// + CanonicalizedOSSHeaders
/// + CanonicalizedResource
/// ```
///
/// `date` is the `Date` header for header signing and the expiry epoch for query signing.
pub(crate) fn string_to_sign(sr: &SigningRequest, resource: &Resource, date: &str) -> Result<String> {
    let mut s = String::new();
    writeln!(&mut s, "{}", sr.method.as_str())?;
    writeln!(
        &mut s,
        "{}",
        sr.header_get_or_default(&HeaderName::from_static(CONTENT_MD5))?
    )?;
    writeln!(&mut s, "{}", sr.header_get_or_default(&CONTENT_TYPE)?)?;
    writeln!(&mut s, "{date}")?;

    let mut headers = sr.header_to_vec_with_prefix("x-oss-")?;
    headers.sort();
    for (k, v) in headers {
        writeln!(&mut s, "{k}:{v}")?;
    }

    s.push_str(&canonicalize_resource(sr, resource));
    Ok(s)
}

fn canonicalize_resource(sr: &SigningRequest, resource: &Resource) -> String {
    let path = resource.canonical_path();
    let params = sr.query_to_vec_with_filter(is_sub_resource);
    if params.is_empty() {
        return path;
    }

    format!("{path}?{}", SigningRequest::pairs_to_string(params, "=", "&"))
}

fn is_sub_resource(key: &str) -> bool {
    SUB_RESOURCES.contains(key)
}

/// Query parameters that take part in the V1 canonical resource.
static SUB_RESOURCES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "acl",
        "accessPoint",
        "accessPointPolicy",
        "append",
        "asyncFetch",
        "bucketInfo",
        "callback",
        "callback-var",
        "cname",
        "comp",
        "continuation-token",
        "cors",
        "delete",
        "encryption",
        "endTime",
        "img",
        "inventory",
        "inventoryId",
        "lifecycle",
        "live",
        "location",
        "logging",
        "metaQuery",
        "objectMeta",
        "partNumber",
        "policy",
        "position",
        "qos",
        "qosInfo",
        "referer",
        "regionList",
        "regions",
        "replication",
        "replicationLocation",
        "replicationProgress",
        "requestPayment",
        "response-cache-control",
        "response-content-disposition",
        "response-content-encoding",
        "response-content-language",
        "response-content-type",
        "response-expires",
        "restore",
        "security-token",
        "sequential",
        "startTime",
        "stat",
        "status",
        "style",
        "styleName",
        "symlink",
        "tagging",
        "transferAcceleration",
        "uploadId",
        "uploads",
        "versionId",
        "versioning",
        "versions",
        "website",
        "worm",
        "wormExtend",
        "wormId",
        "x-oss-ac-forward-allow",
        "x-oss-ac-source-ip",
        "x-oss-ac-subnet-mask",
        "x-oss-ac-vpc-id",
        "x-oss-enable-md5",
        "x-oss-enable-sha1",
        "x-oss-enable-sha256",
        "x-oss-hash-ctx",
        "x-oss-md5-ctx",
        "x-oss-process",
        "x-oss-request-payer",
        "x-oss-traffic-limit",
    ])
});

#[cfg(test)]
mod tests {
    use super::*;
    use alioss_core::time::parse_rfc3339;
    use hmac::{Hmac, Mac};
    use pretty_assertions::assert_eq;

    fn signing_time() -> DateTime {
        parse_rfc3339("2022-03-01T08:12:34Z").unwrap()
    }

    fn expected_signature(secret: &str, string_to_sign: &str) -> String {
        let mut mac = Hmac::<sha1::Sha1>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(string_to_sign.as_bytes());
        alioss_core::hash::base64_encode(&mac.finalize().into_bytes())
    }

    fn parts(method: &str, uri: &str, resource: Resource) -> http::request::Parts {
        let mut parts = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts.extensions.insert(resource);
        parts
    }

    #[tokio::test]
    async fn test_sign_header() -> Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let mut req = parts(
            "PUT",
            "https://examplebucket.oss-cn-hangzhou.aliyuncs.com/nelson?acl&prefix=ignored",
            Resource::object("examplebucket", "nelson"),
        );
        req.headers.insert(CONTENT_MD5, "eB5eJF1ptWaXm4bijSPyxw==".parse()?);
        req.headers.insert(CONTENT_TYPE, "text/html".parse()?);
        req.headers.insert("x-oss-meta-author", "alice".parse()?);
        req.headers.insert("x-oss-meta-magic", "abracadabra".parse()?);

        let cred = Credential::new("44CF9590006BF252F707", "OtxrzxIsfpFjA7SwPzILwy8Bw21TLhquhboDYROV");
        RequestSigner::new()
            .with_time(signing_time())
            .sign_request(&Context::new(), &mut req, Some(&cred), None)
            .await?;

        let expected_sts = "PUT\neB5eJF1ptWaXm4bijSPyxw==\ntext/html\nTue, 01 Mar 2022 08:12:34 GMT\nx-oss-meta-author:alice\nx-oss-meta-magic:abracadabra\n/examplebucket/nelson?acl";
        assert_eq!(req.headers[DATE], "Tue, 01 Mar 2022 08:12:34 GMT");
        assert_eq!(
            req.headers[AUTHORIZATION].to_str()?,
            format!(
                "OSS 44CF9590006BF252F707:{}",
                expected_signature("OtxrzxIsfpFjA7SwPzILwy8Bw21TLhquhboDYROV", expected_sts)
            )
        );
        assert!(req.headers[AUTHORIZATION].is_sensitive());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_header_with_security_token() -> Result<()> {
        let mut req = parts(
            "GET",
            "https://oss-cn-hangzhou.aliyuncs.com/",
            Resource::service(),
        );
        let cred = Credential {
            security_token: Some("sts-token".to_string()),
            ..Credential::new("ak", "sk")
        };

        RequestSigner::new()
            .with_time(signing_time())
            .sign_request(&Context::new(), &mut req, Some(&cred), None)
            .await?;

        let expected_sts =
            "GET\n\n\nTue, 01 Mar 2022 08:12:34 GMT\nx-oss-security-token:sts-token\n/";
        assert_eq!(req.headers[X_OSS_SECURITY_TOKEN], "sts-token");
        assert_eq!(
            req.headers[AUTHORIZATION].to_str()?,
            format!("OSS ak:{}", expected_signature("sk", expected_sts))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_query() -> Result<()> {
        let mut req = parts(
            "GET",
            "https://examplebucket.oss-cn-hangzhou.aliyuncs.com/dir/a%20b.txt?versionId=v1",
            Resource::object("examplebucket", "dir/a b.txt"),
        );
        let cred = Credential {
            security_token: Some("tok/en".to_string()),
            ..Credential::new("ak", "sk")
        };

        RequestSigner::new()
            .with_time(signing_time())
            .sign_request(
                &Context::new(),
                &mut req,
                Some(&cred),
                Some(Duration::from_secs(3600)),
            )
            .await?;

        let expires = signing_time().timestamp() + 3600;
        let expected_sts = format!(
            "GET\n\n\n{expires}\n/examplebucket/dir/a b.txt?security-token=tok/en&versionId=v1"
        );
        let signature = expected_signature("sk", &expected_sts);

        let query = req.uri.query().unwrap_or_default().to_string();
        assert!(query.starts_with("versionId=v1&security-token=tok%2Fen&OSSAccessKeyId=ak&"));
        assert!(query.contains(&format!("Expires={expires}")));
        assert!(query.contains(&format!(
            "Signature={}",
            alioss_core::utils::percent_encode_query(&signature)
        )));
        assert!(req.headers.get(AUTHORIZATION).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_without_credential_is_noop() -> Result<()> {
        let mut req = parts("GET", "https://oss-cn-hangzhou.aliyuncs.com/", Resource::service());
        RequestSigner::new()
            .sign_request(&Context::new(), &mut req, None, None)
            .await?;
        assert!(req.headers.is_empty());
        Ok(())
    }

    #[test]
    fn test_canonicalize_resource_bucket_level() -> Result<()> {
        let mut req = parts(
            "GET",
            "https://examplebucket.oss-cn-hangzhou.aliyuncs.com/?uploads&max-uploads=10&delimiter=%2F",
            Resource::bucket("examplebucket"),
        );
        let sr = SigningRequest::build(&mut req)?;
        assert_eq!(
            canonicalize_resource(&sr, &Resource::bucket("examplebucket")),
            "/examplebucket/?uploads"
        );
        Ok(())
    }
}
