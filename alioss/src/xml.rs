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

use crate::error::{Error, Result};
use bytes::{Buf, Bytes};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serialize `value` as an xml document with `root` as the root element.
pub fn to_xml<T: Serialize>(root: &str, value: &T) -> Result<Bytes> {
    let body = quick_xml::se::to_string_with_root(root, value)
        .map_err(|e| Error::invalid_argument("failed to encode xml body").with_source(e))?;
    Ok(Bytes::from(format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>{body}"#
    )))
}

/// Deserialize an xml document.
pub fn from_xml<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    quick_xml::de::from_reader(body.clone().reader())
        .map_err(|e| Error::deserialize("failed to decode xml body").with_source(e))
}
