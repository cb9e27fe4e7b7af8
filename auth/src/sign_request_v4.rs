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
use alioss_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use alioss_core::time::{format_date, format_iso8601, now, DateTime};
use alioss_core::utils::{percent_encode_path, percent_encode_query};
use alioss_core::{Context, Error, Result, SignRequest, SigningRequest};
use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::HeaderName;
use log::debug;
use std::fmt::Write;
use std::time::Duration;

/// Presigned urls signed with V4 can not live longer than 7 days.
const MAX_PRESIGN_EXPIRES: Duration = Duration::from_secs(7 * 24 * 3600);

/// RequestSignerV4 for OSS signature V4 (`OSS4-HMAC-SHA256`).
#[derive(Debug)]
pub struct RequestSignerV4 {
    region: String,
    product: String,
    bucket: Option<String>,
    additional_headers: Vec<String>,
    time: Option<DateTime>,
}

impl RequestSignerV4 {
    /// Create a new V4 signer for given region, like `cn-hangzhou`.
    pub fn new(region: &str) -> Self {
        Self {
            region: region.to_string(),
            product: "oss".to_string(),
            bucket: None,
            additional_headers: Vec::new(),
            time: None,
        }
    }

    /// Set the product in the signing scope, `oss` by default.
    pub fn with_product(mut self, product: &str) -> Self {
        self.product = product.to_string();
        self
    }

    /// Set the bucket used when a request carries no [`Resource`].
    pub fn with_bucket(mut self, bucket: &str) -> Self {
        self.bucket = Some(bucket.to_string());
        self
    }

    /// Sign these headers too when they are present in the request.
    pub fn with_additional_headers(mut self, headers: impl IntoIterator<Item = String>) -> Self {
        self.additional_headers = headers.into_iter().map(|h| h.to_lowercase()).collect();
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

    fn scope(&self, signing_time: DateTime) -> String {
        format!(
            "{}/{}/{}/aliyun_v4_request",
            format_date(signing_time),
            self.region,
            self.product
        )
    }

    fn signing_key(&self, secret: &str, signing_time: DateTime) -> Vec<u8> {
        let key = hmac_sha256(
            format!("aliyun_v4{secret}").as_bytes(),
            format_date(signing_time).as_bytes(),
        );
        let key = hmac_sha256(&key, self.region.as_bytes());
        let key = hmac_sha256(&key, self.product.as_bytes());
        hmac_sha256(&key, b"aliyun_v4_request")
    }

    /// Additional headers present in the request, sorted and deduplicated.
    fn present_additional_headers(&self, sr: &SigningRequest) -> Vec<String> {
        let mut headers: Vec<String> = self
            .additional_headers
            .iter()
            .filter(|h| !is_default_signed_header(h) && sr.headers.contains_key(h.as_str()))
            .cloned()
            .collect();
        headers.sort();
        headers.dedup();
        headers
    }

    fn signature(
        &self,
        sr: &SigningRequest,
        resource: &Resource,
        cred: &Credential,
        additional: &[String],
        signing_time: DateTime,
    ) -> Result<String> {
        let canonical_request = canonical_request(sr, resource, additional)?;
        debug!("calculated canonical request: {canonical_request}");

        let string_to_sign = format!(
            "{SIGNATURE_V4_ALGORITHM}\n{}\n{}\n{}",
            format_iso8601(signing_time),
            self.scope(signing_time),
            hex_sha256(canonical_request.as_bytes())
        );
        debug!("calculated string to sign: {string_to_sign}");

        let key = self.signing_key(&cred.access_key_secret, signing_time);
        Ok(hex_hmac_sha256(&key, string_to_sign.as_bytes()))
    }
}

#[async_trait]
impl SignRequest for RequestSignerV4 {
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
        let additional = self.present_additional_headers(&sr);

        match expires_in {
            Some(expires) => {
                if expires > MAX_PRESIGN_EXPIRES {
                    return Err(Error::request_invalid(format!(
                        "expires {}s exceeds the maximum of 7 days",
                        expires.as_secs()
                    )));
                }

                sr.query_push("x-oss-signature-version", SIGNATURE_V4_ALGORITHM);
                sr.query_push("x-oss-date", format_iso8601(signing_time));
                sr.query_push("x-oss-expires", expires.as_secs().to_string());
                sr.query_push(
                    "x-oss-credential",
                    format!("{}/{}", cred.access_key_id, self.scope(signing_time)),
                );
                if !additional.is_empty() {
                    sr.query_push("x-oss-additional-headers", additional.join(";"));
                }
                if let Some(token) = &cred.security_token {
                    sr.query_push(X_OSS_SECURITY_TOKEN, token);
                }

                let signature = self.signature(&sr, &resource, cred, &additional, signing_time)?;
                sr.query_push("x-oss-signature", signature);
            }
            None => {
                sr.header_insert(
                    HeaderName::from_static(X_OSS_DATE),
                    &format_iso8601(signing_time),
                )?;
                if !sr.headers.contains_key(X_OSS_CONTENT_SHA256) {
                    sr.header_insert(
                        HeaderName::from_static(X_OSS_CONTENT_SHA256),
                        UNSIGNED_PAYLOAD,
                    )?;
                }
                if let Some(token) = &cred.security_token {
                    sr.header_insert(HeaderName::from_static(X_OSS_SECURITY_TOKEN), token)?;
                }

                let signature = self.signature(&sr, &resource, cred, &additional, signing_time)?;

                let mut auth = format!(
                    "{SIGNATURE_V4_ALGORITHM} Credential={}/{}",
                    cred.access_key_id,
                    self.scope(signing_time)
                );
                if !additional.is_empty() {
                    write!(&mut auth, ",AdditionalHeaders={}", additional.join(";"))?;
                }
                write!(&mut auth, ",Signature={signature}")?;
                sr.header_insert(AUTHORIZATION, &auth)?;
            }
        }

        sr.apply(req)
    }
}

fn is_default_signed_header(name: &str) -> bool {
    name == CONTENT_TYPE.as_str() || name == CONTENT_MD5 || name.starts_with("x-oss-")
}

/// Build the V4 canonical request.
///
/// ```text
/// HTTP Verb + "\n"
/// + Canonical URI + "\n"
/// + Canonical Query String + "\n"
/// + Canonical Headers + "\n"
/// + Additional Headers + "\n"
/// + Hashed PayLoad
/// ```
pub(crate) fn canonical_request(
    sr: &SigningRequest,
    resource: &Resource,
    additional: &[String],
) -> Result<String> {
    let mut s = String::new();
    writeln!(&mut s, "{}", sr.method.as_str())?;
    writeln!(&mut s, "{}", percent_encode_path(&resource.canonical_path()))?;

    let query = sr
        .query
        .iter()
        .map(|(k, v)| (percent_encode_query(k), percent_encode_query(v)))
        .collect();
    writeln!(&mut s, "{}", SigningRequest::pairs_to_string(query, "=", "&"))?;

    let mut headers: Vec<(String, String)> = sr
        .headers
        .iter()
        .filter(|(k, _)| {
            is_default_signed_header(k.as_str()) || additional.iter().any(|h| h == k.as_str())
        })
        .map(|(k, v)| Ok::<_, Error>((k.as_str().to_string(), v.to_str()?.trim().to_string())))
        .collect::<Result<_>>()?;
    headers.sort();
    for (k, v) in headers {
        writeln!(&mut s, "{k}:{v}")?;
    }
    writeln!(&mut s)?;

    writeln!(&mut s, "{}", additional.join(";"))?;
    s.push_str(
        sr.headers
            .get(X_OSS_CONTENT_SHA256)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNSIGNED_PAYLOAD),
    );

    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alioss_core::time::parse_rfc3339;
    use hmac::{Hmac, Mac};
    use pretty_assertions::assert_eq;
    use sha2::{Digest, Sha256};

    fn signing_time() -> DateTime {
        parse_rfc3339("2022-03-01T08:12:34Z").unwrap()
    }

    fn hmac(key: &[u8], data: &str) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
        mac.update(data.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    fn expected_signature(secret: &str, region: &str, product: &str, canonical: &str) -> String {
        let string_to_sign = format!(
            "OSS4-HMAC-SHA256\n20220301T081234Z\n20220301/{region}/{product}/aliyun_v4_request\n{}",
            hex::encode(Sha256::digest(canonical.as_bytes()))
        );
        let key = hmac(format!("aliyun_v4{secret}").as_bytes(), "20220301");
        let key = hmac(&key, region);
        let key = hmac(&key, product);
        let key = hmac(&key, "aliyun_v4_request");
        hex::encode(hmac(&key, &string_to_sign))
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
            "https://examplebucket.oss-cn-hangzhou.aliyuncs.com/exampleobject?acl",
            Resource::object("examplebucket", "exampleobject"),
        );
        req.headers.insert(CONTENT_TYPE, "text/plain".parse()?);
        req.headers.insert("x-oss-meta-a", " a ".parse()?);
        req.headers.insert("host", "examplebucket.oss-cn-hangzhou.aliyuncs.com".parse()?);
        req.headers.insert("user-agent", "alioss".parse()?);

        let cred = Credential::new("ak", "sk");
        RequestSignerV4::new("cn-hangzhou")
            .with_additional_headers(["Host".to_string()])
            .with_time(signing_time())
            .sign_request(&Context::new(), &mut req, Some(&cred), None)
            .await?;

        let canonical = "PUT\n/examplebucket/exampleobject\nacl\ncontent-type:text/plain\nhost:examplebucket.oss-cn-hangzhou.aliyuncs.com\nx-oss-content-sha256:UNSIGNED-PAYLOAD\nx-oss-date:20220301T081234Z\nx-oss-meta-a:a\n\nhost\nUNSIGNED-PAYLOAD";
        assert_eq!(req.headers[X_OSS_DATE], "20220301T081234Z");
        assert_eq!(req.headers[X_OSS_CONTENT_SHA256], UNSIGNED_PAYLOAD);
        assert_eq!(
            req.headers[AUTHORIZATION].to_str()?,
            format!(
                "OSS4-HMAC-SHA256 Credential=ak/20220301/cn-hangzhou/oss/aliyun_v4_request,AdditionalHeaders=host,Signature={}",
                expected_signature("sk", "cn-hangzhou", "oss", canonical)
            )
        );
        Ok(())
    }

    #[test]
    fn test_canonical_request_encoding() -> Result<()> {
        let resource = Resource::object("examplebucket", "dir/文件 1+1.txt");
        let mut req = parts(
            "GET",
            "https://examplebucket.oss-cn-hangzhou.aliyuncs.com/dir/%E6%96%87%E4%BB%B6%201%2B1.txt?response-content-type=text%2Fplain&tagging&partNumber=1",
            resource.clone(),
        );
        let sr = SigningRequest::build(&mut req)?;

        let canonical = canonical_request(&sr, &resource, &[])?;
        assert_eq!(
            canonical,
            "GET\n/examplebucket/dir/%E6%96%87%E4%BB%B6%201%2B1.txt\npartNumber=1&response-content-type=text%2Fplain&tagging\n\n\nUNSIGNED-PAYLOAD"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_query_with_token() -> Result<()> {
        let mut req = parts(
            "GET",
            "https://bucket-123.cn-beijing.oss-vectors.aliyuncs.com/?getVectorBucket",
            Resource::bucket("bucket"),
        );
        let cred = Credential {
            security_token: Some("token".to_string()),
            ..Credential::new("ak", "sk")
        };

        RequestSignerV4::new("cn-beijing")
            .with_product("oss-vectors")
            .with_time(signing_time())
            .sign_request(
                &Context::new(),
                &mut req,
                Some(&cred),
                Some(Duration::from_secs(900)),
            )
            .await?;

        let canonical = "GET\n/bucket/\ngetVectorBucket&x-oss-credential=ak%2F20220301%2Fcn-beijing%2Foss-vectors%2Faliyun_v4_request&x-oss-date=20220301T081234Z&x-oss-expires=900&x-oss-security-token=token&x-oss-signature-version=OSS4-HMAC-SHA256\n\n\nUNSIGNED-PAYLOAD";
        let signature = expected_signature("sk", "cn-beijing", "oss-vectors", canonical);

        let query = req.uri.query().unwrap_or_default();
        assert!(query.starts_with("getVectorBucket&x-oss-signature-version=OSS4-HMAC-SHA256&"));
        assert!(query.ends_with(&format!("x-oss-security-token=token&x-oss-signature={signature}")));
        assert!(req.headers.get(AUTHORIZATION).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_sign_query_rejects_long_expiry() {
        let mut req = parts("GET", "https://oss-cn-hangzhou.aliyuncs.com/", Resource::service());
        let err = RequestSignerV4::new("cn-hangzhou")
            .sign_request(
                &Context::new(),
                &mut req,
                Some(&Credential::new("ak", "sk")),
                Some(Duration::from_secs(8 * 24 * 3600)),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), alioss_core::ErrorKind::RequestInvalid);
    }
}
