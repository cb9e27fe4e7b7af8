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

//! Typed requests, results and client methods, one module per API area.

use crate::client::OperationOutput;
use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod access_point;
pub mod bucket;
pub mod bucket_config;
pub mod multipart;
pub mod object;
pub mod select;
pub mod service;
pub mod vector;

/// Owner of a bucket or object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct Owner {
    /// Account id.
    #[serde(rename = "ID")]
    pub id: String,
    /// Display name, usually the account id.
    pub display_name: String,
}

/// Result of operations without a response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicResult {
    /// HTTP status code.
    pub status: u16,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

impl From<&OperationOutput> for BasicResult {
    fn from(out: &OperationOutput) -> Self {
        Self {
            status: out.status.as_u16(),
            request_id: out.request_id(),
        }
    }
}

/// Define a string-backed enum with `as_str`, `Display`, `FromStr` and serde support.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $value:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
        }

        impl $name {
            /// Wire value.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($value => Ok($name::$variant),)+
                    v => Err(Error::invalid_argument(format!(
                        "invalid {}: {v}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_enum! {
    /// Access control list of a bucket or object.
    pub enum Acl {
        /// Only the owner can read and write.
        Private => "private",
        /// Anyone can read.
        PublicRead => "public-read",
        /// Anyone can read and write.
        PublicReadWrite => "public-read-write",
        /// Object inherits the bucket acl.
        Default => "default",
    }
}

string_enum! {
    /// Storage class of a bucket or object.
    pub enum StorageClass {
        /// Standard.
        Standard => "Standard",
        /// Infrequent access.
        IA => "IA",
        /// Archive.
        Archive => "Archive",
        /// Cold archive.
        ColdArchive => "ColdArchive",
        /// Deep cold archive.
        DeepColdArchive => "DeepColdArchive",
    }
}

string_enum! {
    /// Redundancy of bucket data.
    pub enum DataRedundancyType {
        /// Locally redundant.
        LRS => "LRS",
        /// Zone redundant.
        ZRS => "ZRS",
    }
}

string_enum! {
    /// Versioning state of a bucket.
    pub enum VersioningStatus {
        /// Versioning is on.
        Enabled => "Enabled",
        /// Versioning was on and is paused.
        Suspended => "Suspended",
    }
}

string_enum! {
    /// Speed of restoring a cold archive object.
    pub enum RestoreTier {
        /// Within an hour.
        Expedited => "Expedited",
        /// Within 2 to 5 hours.
        Standard => "Standard",
        /// Within 5 to 12 hours.
        Bulk => "Bulk",
    }
}

string_enum! {
    /// How metadata is handled by `CopyObject`.
    pub enum MetadataDirective {
        /// Keep metadata of the source.
        Copy => "COPY",
        /// Use metadata in the request.
        Replace => "REPLACE",
    }
}

string_enum! {
    /// How tags are handled by `CopyObject`.
    pub enum TaggingDirective {
        /// Keep tags of the source.
        Copy => "Copy",
        /// Use tags in the request.
        Replace => "Replace",
    }
}

/// A prefix shared by keys up to the delimiter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct CommonPrefix {
    /// The prefix.
    pub prefix: String,
}

/// Decode an xml response body, attaching the operation name on failure.
pub(crate) fn decode_xml<T: DeserializeOwned>(out: &OperationOutput, op: &'static str) -> Result<T> {
    out.xml().map_err(|e| e.with_operation(op))
}

/// Decode a json response body, attaching the operation name on failure.
pub(crate) fn decode_json<T: DeserializeOwned>(out: &OperationOutput, op: &'static str) -> Result<T> {
    out.json().map_err(|e| e.with_operation(op))
}

/// Decode a value sent with `encoding-type=url`.
pub(crate) fn url_decode(value: &mut String) {
    let decoded = percent_encoding::percent_decode_str(value).decode_utf8_lossy();
    if decoded != value.as_str() {
        *value = decoded.into_owned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("public-read", Acl::PublicRead)]
    #[test_case("default", Acl::Default)]
    fn test_acl_from_str(input: &str, expected: Acl) {
        assert_eq!(input.parse::<Acl>().unwrap(), expected);
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn test_unknown_value() {
        assert!("Frozen".parse::<StorageClass>().is_err());
    }

    #[test]
    fn test_url_decode() {
        let mut v = "dir%2Fa%20b.txt".to_string();
        url_decode(&mut v);
        assert_eq!(v, "dir/a b.txt");
    }
}
