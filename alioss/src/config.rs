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

use alioss_core::Context;
use std::time::Duration;

/// Env value for the default region.
pub const OSS_REGION: &str = "OSS_REGION";
/// Env value for the default endpoint.
pub const OSS_ENDPOINT: &str = "OSS_ENDPOINT";

/// Default user agent prefix sent with every request.
pub const DEFAULT_USER_AGENT: &str = concat!("alioss-rust/", env!("CARGO_PKG_VERSION"));

/// Signature version used to sign requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignatureVersion {
    /// `OSS <ak>:<signature>` with HMAC-SHA1.
    V1,
    /// `OSS4-HMAC-SHA256` with a region scoped signing key.
    #[default]
    V4,
}

/// Config carries everything the client needs to address and call OSS.
#[derive(Clone, Debug)]
pub struct Config {
    /// Region of the service, like `cn-hangzhou`.
    ///
    /// Loaded from env value [`OSS_REGION`] if not set.
    pub region: Option<String>,
    /// Endpoint of the service, with or without scheme.
    ///
    /// Loaded from env value [`OSS_ENDPOINT`] if not set, derived from region otherwise.
    pub endpoint: Option<String>,
    /// Use `http` instead of `https`.
    pub disable_ssl: bool,
    /// Signature version, V4 by default.
    pub signature_version: SignatureVersion,
    /// Endpoint is a custom domain bound to the bucket.
    pub use_cname: bool,
    /// Address buckets as `host/bucket/key`.
    pub use_path_style: bool,
    /// Use the internal endpoint of the region.
    pub use_internal_endpoint: bool,
    /// Use the global acceleration endpoint.
    pub use_accelerate_endpoint: bool,
    /// Use the dual stack (IPv4 and IPv6) endpoint.
    pub use_dualstack_endpoint: bool,
    /// Product used in the V4 signing scope, `oss` by default.
    pub product: String,
    /// Total attempts for one operation, including the first.
    pub retry_max_attempts: usize,
    /// Minimum delay between attempts.
    pub retry_min_delay: Duration,
    /// Maximum delay between attempts.
    pub retry_max_delay: Duration,
    /// Appended to the default user agent.
    pub user_agent: Option<String>,
    /// Extra headers to sign with V4.
    pub additional_headers: Vec<String>,
    /// Send requests without signing them.
    pub anonymous: bool,
    /// Timeout for establishing connections.
    pub connect_timeout: Option<Duration>,
    /// Timeout between two reads of a response, a slow but flowing body is fine.
    pub readwrite_timeout: Option<Duration>,
    /// Account id, required by vector buckets.
    pub account_id: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            disable_ssl: false,
            signature_version: SignatureVersion::default(),
            use_cname: false,
            use_path_style: false,
            use_internal_endpoint: false,
            use_accelerate_endpoint: false,
            use_dualstack_endpoint: false,
            product: "oss".to_string(),
            retry_max_attempts: 3,
            retry_min_delay: Duration::from_millis(200),
            retry_max_delay: Duration::from_secs(20),
            user_agent: None,
            additional_headers: Vec::new(),
            anonymous: false,
            connect_timeout: Some(Duration::from_secs(10)),
            readwrite_timeout: Some(Duration::from_secs(20)),
            account_id: None,
        }
    }
}

impl Config {
    /// Create a config for given region.
    pub fn new(region: &str) -> Self {
        Self::default().with_region(region)
    }

    /// Load config from env, keeping values already set.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.region.is_none() {
            self.region = ctx.env_var(OSS_REGION).filter(|v| !v.is_empty());
        }
        if self.endpoint.is_none() {
            self.endpoint = ctx.env_var(OSS_ENDPOINT).filter(|v| !v.is_empty());
        }
        self
    }

    /// Set region.
    pub fn with_region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    /// Set endpoint.
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Set signature version.
    pub fn with_signature_version(mut self, version: SignatureVersion) -> Self {
        self.signature_version = version;
        self
    }

    /// Address buckets as `host/bucket/key`.
    pub fn with_path_style(mut self, v: bool) -> Self {
        self.use_path_style = v;
        self
    }

    /// Treat endpoint as a custom domain.
    pub fn with_cname(mut self, v: bool) -> Self {
        self.use_cname = v;
        self
    }

    /// Use the internal endpoint.
    pub fn with_internal_endpoint(mut self, v: bool) -> Self {
        self.use_internal_endpoint = v;
        self
    }

    /// Use the acceleration endpoint.
    pub fn with_accelerate_endpoint(mut self, v: bool) -> Self {
        self.use_accelerate_endpoint = v;
        self
    }

    /// Use the dual stack endpoint.
    pub fn with_dualstack_endpoint(mut self, v: bool) -> Self {
        self.use_dualstack_endpoint = v;
        self
    }

    /// Use `http` instead of `https`.
    pub fn with_disable_ssl(mut self, v: bool) -> Self {
        self.disable_ssl = v;
        self
    }

    /// Set total attempts for one operation.
    pub fn with_retry_max_attempts(mut self, attempts: usize) -> Self {
        self.retry_max_attempts = attempts;
        self
    }

    /// Set the delay range between attempts.
    pub fn with_retry_delay(mut self, min: Duration, max: Duration) -> Self {
        self.retry_min_delay = min;
        self.retry_max_delay = max;
        self
    }

    /// Append to the default user agent.
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }

    /// Sign these headers too with V4.
    pub fn with_additional_headers(mut self, headers: impl IntoIterator<Item = String>) -> Self {
        self.additional_headers = headers.into_iter().collect();
        self
    }

    /// Send requests without signature.
    pub fn with_anonymous(mut self, v: bool) -> Self {
        self.anonymous = v;
        self
    }

    /// Set connect and read/write timeouts.
    pub fn with_timeouts(mut self, connect: Option<Duration>, readwrite: Option<Duration>) -> Self {
        self.connect_timeout = connect;
        self.readwrite_timeout = readwrite;
        self
    }

    /// Set account id, required by vector buckets.
    pub fn with_account_id(mut self, account_id: &str) -> Self {
        self.account_id = Some(account_id.to_string());
        self
    }

    /// Set the product used in the V4 signing scope.
    pub fn with_product(mut self, product: &str) -> Self {
        self.product = product.to_string();
        self
    }

    pub(crate) fn user_agent(&self) -> String {
        match &self.user_agent {
            Some(ua) if !ua.is_empty() => format!("{DEFAULT_USER_AGENT}/{ua}"),
            _ => DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alioss_core::StaticEnv;
    use std::collections::HashMap;

    #[test]
    fn test_config_from_env() {
        let ctx = Context::new().with_env(StaticEnv {
            home_dir: None,
            envs: HashMap::from_iter([
                (OSS_REGION.to_string(), "cn-shanghai".to_string()),
                (OSS_ENDPOINT.to_string(), "oss-cn-shanghai-internal.aliyuncs.com".to_string()),
            ]),
        });

        let cfg = Config::default().from_env(&ctx);
        assert_eq!(cfg.region.as_deref(), Some("cn-shanghai"));
        assert_eq!(
            cfg.endpoint.as_deref(),
            Some("oss-cn-shanghai-internal.aliyuncs.com")
        );

        let cfg = Config::new("cn-hangzhou").from_env(&ctx);
        assert_eq!(cfg.region.as_deref(), Some("cn-hangzhou"));
    }

    #[test]
    fn test_config_from_os_env() {
        temp_env::with_vars(
            [(OSS_REGION, Some("cn-beijing")), (OSS_ENDPOINT, Some(""))],
            || {
                let ctx = Context::new().with_env(alioss_core::OsEnv);
                let cfg = Config::default().from_env(&ctx);
                assert_eq!(cfg.region.as_deref(), Some("cn-beijing"));
                assert_eq!(cfg.endpoint, None);
            },
        );
    }

    #[test]
    fn test_config_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.signature_version, SignatureVersion::V4);
        assert_eq!(cfg.retry_max_attempts, 3);
        assert_eq!(cfg.product, "oss");
        assert_eq!(cfg.user_agent(), DEFAULT_USER_AGENT);
        assert_eq!(
            cfg.with_user_agent("app").user_agent(),
            format!("{DEFAULT_USER_AGENT}/app")
        );
    }
}
