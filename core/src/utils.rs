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

//! Utility functions and types.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Debug;

/// AsciiSet used to encode object keys in request paths.
///
/// Everything but unreserved characters and `/` is encoded.
pub static OSS_URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet used to encode query keys and values.
pub static OSS_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent encode a path, keeping `/` as is.
///
/// ```
/// use alioss_core::utils::percent_encode_path;
///
/// assert_eq!(percent_encode_path("a b/c+d.txt"), "a%20b/c%2Bd.txt");
/// ```
pub fn percent_encode_path(path: &str) -> String {
    utf8_percent_encode(path, &OSS_URI_ENCODE_SET).to_string()
}

/// Percent encode a query key or value.
pub fn percent_encode_query(value: &str) -> String {
    utf8_percent_encode(value, &OSS_QUERY_ENCODE_SET).to_string()
}

/// Query parameters that carry signatures or tokens in presigned urls.
const SENSITIVE_QUERY_KEYS: &[&str] = &[
    "Signature",
    "security-token",
    "x-oss-signature",
    "x-oss-security-token",
    "x-oss-credential",
];

/// Redacts a string by replacing all but the first and last three characters with asterisks.
///
/// - If the input string has fewer than 12 characters, it should be entirely redacted.
/// - If the input string has 12 or more characters, only the first three and the last three.
///
/// This allows users to distinguish between different redacted strings without
/// leaking sensitive information.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        match value {
            None => Redact(""),
            Some(v) => Redact(v),
        }
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        if length == 0 {
            f.write_str("EMPTY")
        } else if length < 12 || !self.0.is_char_boundary(3) || !self.0.is_char_boundary(length - 3)
        {
            f.write_str("***")
        } else {
            f.write_str(&self.0[..3])?;
            f.write_str("***")?;
            f.write_str(&self.0[length - 3..])
        }
    }
}

/// Redact signature and token values in the query part of a url, so it can be logged.
///
/// ```
/// use alioss_core::utils::redact_query;
///
/// assert_eq!(
///     redact_query("https://b.oss-cn-hangzhou.aliyuncs.com/k?Expires=1&Signature=abc"),
///     "https://b.oss-cn-hangzhou.aliyuncs.com/k?Expires=1&Signature=***"
/// );
/// ```
pub fn redact_query(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((k, _)) if SENSITIVE_QUERY_KEYS.contains(&k) => format!("{k}=***"),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{base}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        let cases = vec![
            ("Short", "***"),
            ("Hello World!", "Hel***ld!"),
            ("This is a longer string", "Thi***ing"),
            ("", "EMPTY"),
            ("HelloWorld", "***"),
        ];

        for (input, expected) in cases {
            assert_eq!(
                format!("{:?}", Redact(input)),
                expected,
                "Failed on input: {}",
                input
            );
        }
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode_path("dir/文件.txt"), "dir/%E6%96%87%E4%BB%B6.txt");
        assert_eq!(percent_encode_query("a/b c=d"), "a%2Fb%20c%3Dd");
        assert_eq!(percent_encode_query("AZaz09-._~"), "AZaz09-._~");
    }

    #[test]
    fn test_redact_query() {
        let cases = vec![
            ("https://oss-cn-hangzhou.aliyuncs.com/", "https://oss-cn-hangzhou.aliyuncs.com/"),
            (
                "https://b.oss-cn-hangzhou.aliyuncs.com/k?uploads",
                "https://b.oss-cn-hangzhou.aliyuncs.com/k?uploads",
            ),
            (
                "https://b.oss-cn-hangzhou.aliyuncs.com/k?x-oss-credential=ak%2F20240101&x-oss-signature=ff&x-oss-expires=900",
                "https://b.oss-cn-hangzhou.aliyuncs.com/k?x-oss-credential=***&x-oss-signature=***&x-oss-expires=900",
            ),
            (
                "https://b.oss-cn-hangzhou.aliyuncs.com/k?OSSAccessKeyId=ak&security-token=tok",
                "https://b.oss-cn-hangzhou.aliyuncs.com/k?OSSAccessKeyId=ak&security-token=***",
            ),
        ];

        for (input, expected) in cases {
            assert_eq!(redact_query(input), expected, "input: {input}");
        }
    }
}
