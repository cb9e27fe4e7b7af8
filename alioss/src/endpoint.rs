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

use crate::config::Config;
use crate::error::{Error, Result};
use alioss_core::utils::percent_encode_path;
use std::net::IpAddr;

/// How a bucket is carried in the url.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStyle {
    /// `bucket.host/key`
    Virtual,
    /// `host/bucket/key`
    Path,
    /// `host/key`, the host is a custom domain bound to the bucket.
    CName,
    /// `bucket-account.host/key`, used by vector buckets.
    Vector,
}

/// Endpoint resolved from [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    scheme: String,
    host: String,
    style: AddressStyle,
    account_id: Option<String>,
}

impl Endpoint {
    /// Resolve the endpoint for object storage.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let (scheme, host) = match cfg.endpoint.as_deref() {
            Some(ep) => split_endpoint(ep, cfg.disable_ssl)?,
            None => {
                let region = required_region(cfg)?;
                let host = if cfg.use_accelerate_endpoint {
                    "oss-accelerate.aliyuncs.com".to_string()
                } else if cfg.use_dualstack_endpoint {
                    format!("{region}.oss.aliyuncs.com")
                } else if cfg.use_internal_endpoint {
                    format!("oss-{region}-internal.aliyuncs.com")
                } else {
                    format!("oss-{region}.aliyuncs.com")
                };
                (default_scheme(cfg.disable_ssl), host)
            }
        };

        let style = if cfg.use_cname {
            AddressStyle::CName
        } else if cfg.use_path_style || is_ip_or_localhost(&host) {
            AddressStyle::Path
        } else {
            AddressStyle::Virtual
        };

        Ok(Self {
            scheme,
            host,
            style,
            account_id: None,
        })
    }

    /// Resolve the endpoint for vector buckets.
    pub fn vectors_from_config(cfg: &Config) -> Result<Self> {
        let account_id = cfg
            .account_id
            .clone()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::invalid_argument("account id is required for vector buckets"))?;

        let (scheme, host) = match cfg.endpoint.as_deref() {
            Some(ep) => split_endpoint(ep, cfg.disable_ssl)?,
            None => {
                let region = required_region(cfg)?;
                let host = if cfg.use_internal_endpoint {
                    format!("{region}-internal.oss-vectors.aliyuncs.com")
                } else {
                    format!("{region}.oss-vectors.aliyuncs.com")
                };
                (default_scheme(cfg.disable_ssl), host)
            }
        };

        Ok(Self {
            scheme,
            host,
            style: AddressStyle::Vector,
            account_id: Some(account_id),
        })
    }

    /// Addressing style in use.
    pub fn style(&self) -> AddressStyle {
        self.style
    }

    /// Host of the endpoint, without bucket.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Build the url without query for given bucket and key.
    pub fn url(&self, bucket: Option<&str>, key: Option<&str>) -> String {
        let key = key.map(percent_encode_path).unwrap_or_default();
        let scheme = &self.scheme;
        let host = &self.host;

        match (self.style, bucket) {
            (AddressStyle::Vector, Some(bucket)) => {
                let account = self.account_id.as_deref().unwrap_or_default();
                format!("{scheme}://{bucket}-{account}.{host}/{key}")
            }
            (AddressStyle::Vector, None) => match self.account_id.as_deref() {
                Some(account) => format!("{scheme}://{account}.{host}/"),
                None => format!("{scheme}://{host}/"),
            },
            (_, None) | (AddressStyle::CName, _) => format!("{scheme}://{host}/{key}"),
            (AddressStyle::Virtual, Some(bucket)) => format!("{scheme}://{bucket}.{host}/{key}"),
            (AddressStyle::Path, Some(bucket)) => format!("{scheme}://{host}/{bucket}/{key}"),
        }
    }
}

fn default_scheme(disable_ssl: bool) -> String {
    if disable_ssl { "http" } else { "https" }.to_string()
}

fn required_region(cfg: &Config) -> Result<&str> {
    let region = cfg
        .region
        .as_deref()
        .ok_or_else(|| Error::invalid_argument("region or endpoint must be set"))?;
    validate_region(region)?;
    Ok(region)
}

fn split_endpoint(endpoint: &str, disable_ssl: bool) -> Result<(String, String)> {
    let endpoint = endpoint.trim().trim_end_matches('/');
    let (scheme, host) = match endpoint.split_once("://") {
        Some((scheme, host)) => (scheme.to_lowercase(), host.to_string()),
        None => (default_scheme(disable_ssl), endpoint.to_string()),
    };
    if scheme != "http" && scheme != "https" {
        return Err(Error::invalid_argument(format!(
            "endpoint scheme {scheme} is not supported"
        )));
    }
    if host.is_empty() || host.contains('/') {
        return Err(Error::invalid_argument(format!(
            "endpoint {endpoint} is not a valid host"
        )));
    }
    Ok((scheme, host))
}

fn is_ip_or_localhost(host: &str) -> bool {
    let name = match host.strip_prefix('[') {
        Some(v6) => v6.split(']').next().unwrap_or_default(),
        None => host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host),
    };
    name.eq_ignore_ascii_case("localhost") || name.parse::<IpAddr>().is_ok()
}

/// Region must be made of lowercase letters, digits and `-`.
pub fn validate_region(region: &str) -> Result<()> {
    let valid = !region.is_empty()
        && region
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!("region {region:?} is invalid")))
    }
}

/// Bucket name must be 3-63 characters of lowercase letters, digits and `-`,
/// and must not start or end with `-`.
pub fn validate_bucket_name(bucket: &str) -> Result<()> {
    let valid = (3..=63).contains(&bucket.len())
        && bucket
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !bucket.starts_with('-')
        && !bucket.ends_with('-');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!("bucket name {bucket:?} is invalid")))
    }
}

/// Object key must be non-empty and at most 1023 bytes.
pub fn validate_object_key(key: &str) -> Result<()> {
    if key.is_empty() || key.len() > 1023 {
        return Err(Error::invalid_argument(format!(
            "object key length {} is invalid",
            key.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case(Config::new("cn-hangzhou"), "https://bucket.oss-cn-hangzhou.aliyuncs.com/a/b%20c.txt"; "virtual hosted")]
    #[test_case(Config::new("cn-hangzhou").with_internal_endpoint(true), "https://bucket.oss-cn-hangzhou-internal.aliyuncs.com/a/b%20c.txt"; "internal")]
    #[test_case(Config::new("cn-hangzhou").with_accelerate_endpoint(true), "https://bucket.oss-accelerate.aliyuncs.com/a/b%20c.txt"; "accelerate")]
    #[test_case(Config::new("cn-hangzhou").with_dualstack_endpoint(true), "https://bucket.cn-hangzhou.oss.aliyuncs.com/a/b%20c.txt"; "dual stack")]
    #[test_case(Config::new("cn-hangzhou").with_path_style(true), "https://oss-cn-hangzhou.aliyuncs.com/bucket/a/b%20c.txt"; "path style")]
    #[test_case(Config::new("cn-hangzhou").with_disable_ssl(true), "http://bucket.oss-cn-hangzhou.aliyuncs.com/a/b%20c.txt"; "http")]
    #[test_case(Config::default().with_endpoint("http://oss-cn-beijing.aliyuncs.com/"), "http://bucket.oss-cn-beijing.aliyuncs.com/a/b%20c.txt"; "endpoint with scheme")]
    #[test_case(Config::default().with_endpoint("oss-cn-beijing.aliyuncs.com"), "https://bucket.oss-cn-beijing.aliyuncs.com/a/b%20c.txt"; "endpoint without scheme")]
    #[test_case(Config::default().with_endpoint("static.example.com").with_cname(true), "https://static.example.com/a/b%20c.txt"; "cname")]
    #[test_case(Config::default().with_endpoint("http://127.0.0.1:9000"), "http://127.0.0.1:9000/bucket/a/b%20c.txt"; "ip forces path style")]
    #[test_case(Config::default().with_endpoint("localhost:9000"), "https://localhost:9000/bucket/a/b%20c.txt"; "localhost forces path style")]
    fn test_object_url(cfg: Config, expected: &str) {
        let ep = Endpoint::from_config(&cfg).expect("endpoint must be valid");
        assert_eq!(ep.url(Some("bucket"), Some("a/b c.txt")), expected);
    }

    #[test]
    fn test_service_and_bucket_url() {
        let ep = Endpoint::from_config(&Config::new("cn-hangzhou")).unwrap();
        assert_eq!(ep.url(None, None), "https://oss-cn-hangzhou.aliyuncs.com/");
        assert_eq!(ep.url(Some("bucket"), None), "https://bucket.oss-cn-hangzhou.aliyuncs.com/");
    }

    #[test]
    fn test_vector_url() {
        let cfg = Config::new("cn-hangzhou").with_account_id("123456");
        let ep = Endpoint::vectors_from_config(&cfg).unwrap();
        assert_eq!(
            ep.url(Some("vb"), None),
            "https://vb-123456.cn-hangzhou.oss-vectors.aliyuncs.com/"
        );
        assert_eq!(ep.url(None, None), "https://123456.cn-hangzhou.oss-vectors.aliyuncs.com/");

        let err = Endpoint::vectors_from_config(&Config::new("cn-hangzhou")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(Endpoint::from_config(&Config::default()).is_err());
        assert!(Endpoint::from_config(&Config::new("CN_hangzhou")).is_err());
        assert!(Endpoint::from_config(&Config::default().with_endpoint("ftp://a.com")).is_err());
    }

    #[test_case("examplebucket", true)]
    #[test_case("ab", false)]
    #[test_case("-bucket", false)]
    #[test_case("bucket-", false)]
    #[test_case("Bucket", false)]
    #[test_case("bucket_name", false)]
    fn test_validate_bucket_name(bucket: &str, ok: bool) {
        assert_eq!(validate_bucket_name(bucket).is_ok(), ok);
    }

    #[test]
    fn test_validate_object_key() {
        assert!(validate_object_key("a").is_ok());
        assert!(validate_object_key("").is_err());
        assert!(validate_object_key(&"k".repeat(1024)).is_err());
        assert!(validate_object_key(&"k".repeat(1023)).is_ok());
    }
}
