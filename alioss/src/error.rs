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

use alioss_core::hash::base64_decode;
use alioss_core::time::{parse_http_date, DateTime};
use bytes::{Buf, Bytes};
use http::{HeaderMap, StatusCode};
use quick_xml::de;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// ServiceError is the error returned by the OSS service.
///
/// It is parsed from the `<Error>` body, or from the `x-oss-err` header when the
/// response has no body, like `HeadObject`.
#[derive(Error, Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ServiceError {
    /// HTTP status code of the response.
    #[serde(skip)]
    pub status_code: u16,
    /// OSS error code, like `NoSuchKey`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
    /// Host that served the request.
    pub host_id: String,
    /// Detailed error code, like `0026-00000001`.
    #[serde(rename = "EC")]
    pub ec: String,
    /// Method and url of the failed request.
    #[serde(skip)]
    pub request_target: String,
    /// Server time of the response.
    #[serde(skip)]
    pub timestamp: Option<DateTime>,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "service returned error: status {}, code {}, message {:?}, request id {}, ec {}",
            self.status_code, self.code, self.message, self.request_id, self.ec
        )?;
        if !self.request_target.is_empty() {
            write!(f, ", target {}", self.request_target)?;
        }
        Ok(())
    }
}

impl ServiceError {
    /// Parse a service error from a non-2xx response.
    pub fn parse(status: StatusCode, headers: &HeaderMap, body: &Bytes) -> Self {
        let mut err = parse_xml_error(body)
            .or_else(|| {
                let encoded = headers.get("x-oss-err")?.to_str().ok()?;
                parse_xml_error(&Bytes::from(base64_decode(encoded).ok()?))
            })
            .unwrap_or_else(|| ServiceError {
                message: String::from_utf8_lossy(body).trim().to_string(),
                ..Default::default()
            });

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        };

        err.status_code = status.as_u16();
        if err.code.is_empty() {
            err.code = status
                .canonical_reason()
                .unwrap_or("Unknown")
                .replace(' ', "");
        }
        if err.request_id.is_empty() {
            err.request_id = header("x-oss-request-id").unwrap_or_default();
        }
        if err.ec.is_empty() {
            err.ec = header("x-oss-ec").unwrap_or_default();
        }
        err.timestamp = header("date").and_then(|v| parse_http_date(&v).ok());
        err
    }

    /// Check if this error is worth retrying.
    ///
    /// `RequestTimeTooSkewed` is not: every retry is signed with the same local clock.
    pub fn is_temporary(&self) -> bool {
        self.status_code >= 500 || self.status_code == 429 || self.code == "RequestTimeout"
    }
}

fn parse_xml_error(body: &Bytes) -> Option<ServiceError> {
    if body.is_empty() {
        return None;
    }
    de::from_reader::<_, ServiceError>(body.clone().reader())
        .ok()
        .filter(|e| !e.code.is_empty())
}

/// The kind of error returned by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Caller passed an invalid argument, like an illegal bucket name.
    InvalidArgument,
    /// Credential can not be loaded.
    Credential,
    /// Request can not be signed.
    Sign,
    /// Network failure while sending the request.
    Transport,
    /// Service returned a non-2xx response, see [`Error::service_error`].
    Service,
    /// Response body can not be decoded.
    Deserialize,
    /// Checkpoint file can not be read or written.
    Checkpoint,
    /// Anything else.
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::Credential => "credential error",
            ErrorKind::Sign => "sign error",
            ErrorKind::Transport => "transport error",
            ErrorKind::Service => "service error",
            ErrorKind::Deserialize => "deserialize error",
            ErrorKind::Checkpoint => "checkpoint error",
            ErrorKind::Unexpected => "unexpected error",
        };
        f.write_str(s)
    }
}

/// Error returned by every client operation.
#[derive(Error, Debug)]
pub struct Error {
    kind: ErrorKind,
    operation: &'static str,
    message: String,
    temporary: bool,
    #[source]
    source: Option<anyhow::Error>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.operation.is_empty() {
            write!(f, "{}: ", self.operation)?;
        }
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, ", source: {source}")?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error with the given kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            operation: "",
            message: message.into(),
            temporary: false,
            source: None,
        }
    }

    /// Wrap a service error.
    pub fn service(err: ServiceError) -> Self {
        let temporary = err.is_temporary();
        Self {
            kind: ErrorKind::Service,
            operation: "",
            message: format!("{} ({})", err.code, err.status_code),
            temporary,
            source: Some(anyhow::Error::new(err)),
        }
    }

    /// Shortcut for [`ErrorKind::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Shortcut for [`ErrorKind::Deserialize`].
    pub fn deserialize(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Deserialize, message)
    }

    /// Shortcut for [`ErrorKind::Checkpoint`].
    pub fn checkpoint(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Checkpoint, message)
    }

    /// Shortcut for [`ErrorKind::Unexpected`].
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// Attach the operation name, keeping the first one set.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if self.operation.is_empty() {
            self.operation = operation;
        }
        self
    }

    /// Attach the underlying error.
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "the source error has been set");
        self.source = Some(source.into());
        self
    }

    /// Mark this error as retryable.
    pub fn set_temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// Kind of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Operation that failed, like `GetObject`.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Message of this error.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Check if this error is retryable.
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    /// The service error carried by this error, if any.
    pub fn service_error(&self) -> Option<&ServiceError> {
        self.source.as_ref()?.downcast_ref::<ServiceError>()
    }
}

impl From<alioss_core::Error> for Error {
    fn from(err: alioss_core::Error) -> Self {
        use alioss_core::ErrorKind as CoreKind;

        let kind = match err.kind() {
            _ if err.is_credential_error() => ErrorKind::Credential,
            CoreKind::RequestInvalid => ErrorKind::Sign,
            CoreKind::ConfigInvalid => ErrorKind::InvalidArgument,
            _ if err.is_temporary() => ErrorKind::Transport,
            _ => ErrorKind::Unexpected,
        };
        let temporary = err.is_temporary();
        let mut e = Error::new(kind, err.message().to_string()).with_source(err);
        e.temporary = temporary;
        e
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::unexpected("io error").with_source(err)
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Error::invalid_argument("failed to build http request").with_source(err)
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    /// Error response example is from https://www.alibabacloud.com/help/en/object-storage-service/latest/error-responses
    #[test]
    fn test_parse_error_body() {
        let body = Bytes::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchKey</Code>
  <Message>The specified key does not exist.</Message>
  <RequestId>5C3D9175B6FC201293AD****</RequestId>
  <HostId>examplebucket.oss-cn-hangzhou.aliyuncs.com</HostId>
  <Key>example.txt</Key>
  <EC>0026-00000001</EC>
</Error>"#,
        );
        let mut headers = HeaderMap::new();
        headers.insert("date", "Tue, 01 Mar 2022 08:12:34 GMT".parse().unwrap());

        let err = ServiceError::parse(StatusCode::NOT_FOUND, &headers, &body);
        assert_eq!(err.status_code, 404);
        assert_eq!(err.code, "NoSuchKey");
        assert_eq!(err.message, "The specified key does not exist.");
        assert_eq!(err.request_id, "5C3D9175B6FC201293AD****");
        assert_eq!(err.host_id, "examplebucket.oss-cn-hangzhou.aliyuncs.com");
        assert_eq!(err.ec, "0026-00000001");
        assert!(err.timestamp.is_some());
        assert!(!err.is_temporary());
    }

    #[test]
    fn test_parse_error_header() {
        let xml = "<Error><Code>AccessDenied</Code><Message>denied</Message><RequestId>id-1</RequestId></Error>";
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-oss-err",
            alioss_core::hash::base64_encode(xml.as_bytes()).parse().unwrap(),
        );
        headers.insert("x-oss-ec", "0003-00000001".parse().unwrap());

        let err = ServiceError::parse(StatusCode::FORBIDDEN, &headers, &Bytes::new());
        assert_eq!(err.code, "AccessDenied");
        assert_eq!(err.request_id, "id-1");
        assert_eq!(err.ec, "0003-00000001");
    }

    #[test]
    fn test_parse_error_without_details() {
        let mut headers = HeaderMap::new();
        headers.insert("x-oss-request-id", "id-2".parse().unwrap());

        let err = ServiceError::parse(StatusCode::SERVICE_UNAVAILABLE, &headers, &Bytes::new());
        assert_eq!(err.code, "ServiceUnavailable");
        assert_eq!(err.request_id, "id-2");
        assert!(err.is_temporary());
    }

    #[test_case(503, "ServiceUnavailable", true; "server error")]
    #[test_case(429, "TooManyRequests", true; "throttled")]
    #[test_case(400, "RequestTimeout", true; "request timeout")]
    #[test_case(403, "RequestTimeTooSkewed", false; "clock skew")]
    #[test_case(404, "NoSuchKey", false; "missing key")]
    fn test_service_error_is_temporary(status: u16, code: &str, temporary: bool) {
        let err = ServiceError {
            status_code: status,
            code: code.to_string(),
            ..Default::default()
        };
        assert_eq!(err.is_temporary(), temporary);
    }

    #[test]
    fn test_error_wraps_service_error() {
        let err = Error::service(ServiceError {
            status_code: 500,
            code: "InternalError".to_string(),
            ..Default::default()
        })
        .with_operation("PutObject");

        assert_eq!(err.kind(), ErrorKind::Service);
        assert_eq!(err.operation(), "PutObject");
        assert!(err.is_temporary());
        assert_eq!(err.service_error().map(|e| e.code.as_str()), Some("InternalError"));
        assert!(err.to_string().starts_with("PutObject: service error: InternalError (500)"));
    }

    #[test]
    fn test_error_from_core() {
        let err: Error = alioss_core::Error::credential_invalid("no credential").into();
        assert_eq!(err.kind(), ErrorKind::Credential);

        let err: Error = alioss_core::Error::unexpected("connect refused")
            .set_temporary()
            .into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_temporary());
    }
}
