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

use crate::client::{Client, OperationInput};
use crate::error::{Error, Result};
use crate::select_frame::{decode_select, SelectEnd};
use alioss_core::hash::base64_encode;
use bytes::Bytes;
use http::Method;
use serde::Serialize;

/// Compression of the source object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CompressionType {
    /// Not compressed.
    #[default]
    None,
    /// Gzip compressed.
    #[serde(rename = "GZIP")]
    Gzip,
}

/// How the first csv line is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileHeaderInfo {
    /// No header line.
    None,
    /// Header exists but is not referenced by the query.
    Ignore,
    /// Header names can be used as column names.
    Use,
}

/// Layout of a json object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JsonType {
    /// A single json document.
    Document,
    /// One json object per line.
    Lines,
}

/// Csv input options. Delimiters are plain text, encoded on the wire.
#[derive(Debug, Clone, Default)]
pub struct CsvInput {
    /// How the first line is treated.
    pub file_header_info: Option<FileHeaderInfo>,
    /// Record delimiter, `\n` by default.
    pub record_delimiter: Option<String>,
    /// Field delimiter, `,` by default.
    pub field_delimiter: Option<String>,
    /// Quote character, `"` by default.
    pub quote_character: Option<String>,
    /// Comment character.
    pub comment_character: Option<String>,
    /// Query a range, like `line-range=10-20` or `split-range=0-1`.
    pub range: Option<String>,
    /// Allow record delimiters inside quotes.
    pub allow_quoted_record_delimiter: Option<bool>,
}

/// Json input options.
#[derive(Debug, Clone)]
pub struct JsonInput {
    /// Layout of the object.
    pub json_type: JsonType,
    /// Query a range, `LINES` only.
    pub range: Option<String>,
    /// Parse numbers as strings.
    pub parse_json_number_as_string: Option<bool>,
}

/// Csv output options.
#[derive(Debug, Clone, Default)]
pub struct CsvOutput {
    /// Record delimiter.
    pub record_delimiter: Option<String>,
    /// Field delimiter.
    pub field_delimiter: Option<String>,
}

/// Json output options.
#[derive(Debug, Clone, Default)]
pub struct JsonOutput {
    /// Record delimiter.
    pub record_delimiter: Option<String>,
}

/// Source format of a select request.
#[derive(Debug, Clone)]
pub enum SelectInput {
    /// Csv object.
    Csv(CsvInput),
    /// Json object.
    Json(JsonInput),
}

impl SelectInput {
    fn format(&self) -> &'static str {
        match self {
            SelectInput::Csv(_) => "csv",
            SelectInput::Json(_) => "json",
        }
    }
}

/// Output options of a select request.
#[derive(Debug, Clone, Default)]
pub struct SelectOutputOptions {
    /// Csv output, csv input only.
    pub csv: Option<CsvOutput>,
    /// Json output, json input only.
    pub json: Option<JsonOutput>,
    /// Return all columns, not only those in the query.
    pub keep_all_columns: Option<bool>,
    /// Return raw data without frames.
    pub output_raw_data: Option<bool>,
    /// Fill payload crc of every frame.
    pub enable_payload_crc: Option<bool>,
    /// Return the csv header line.
    pub output_header: Option<bool>,
}

/// Request of `SelectObject`.
#[derive(Debug, Clone)]
pub struct SelectObjectRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// SQL, like `select * from ossobject`.
    pub expression: String,
    /// Compression of the object.
    pub compression: CompressionType,
    /// Source format.
    pub input: SelectInput,
    /// Output options.
    pub output: SelectOutputOptions,
    /// Skip records with missing columns instead of failing.
    pub skip_partial_data_record: Option<bool>,
    /// Max records skipped before failing.
    pub max_skipped_records_allowed: Option<u64>,
}

impl SelectObjectRequest {
    /// Create a request selecting from a csv object.
    pub fn csv(bucket: &str, key: &str, expression: &str) -> Self {
        Self::new(bucket, key, expression, SelectInput::Csv(CsvInput::default()))
    }

    /// Create a request selecting from a json object.
    pub fn json(bucket: &str, key: &str, expression: &str, json_type: JsonType) -> Self {
        let input = JsonInput {
            json_type,
            range: None,
            parse_json_number_as_string: None,
        };
        Self::new(bucket, key, expression, SelectInput::Json(input))
    }

    fn new(bucket: &str, key: &str, expression: &str, input: SelectInput) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            expression: expression.to_string(),
            compression: CompressionType::None,
            input,
            output: SelectOutputOptions::default(),
            skip_partial_data_record: None,
            max_skipped_records_allowed: None,
        }
    }

    fn body(&self) -> SelectRequestBody {
        let (csv, json) = match &self.input {
            SelectInput::Csv(v) => (Some(CsvInputBody::from(v)), None),
            SelectInput::Json(v) => (None, Some(JsonInputBody::from(v))),
        };
        let options = if self.skip_partial_data_record.is_some()
            || self.max_skipped_records_allowed.is_some()
        {
            Some(SelectOptionsBody {
                skip_partial_data_record: self.skip_partial_data_record,
                max_skipped_records_allowed: self.max_skipped_records_allowed,
            })
        } else {
            None
        };
        SelectRequestBody {
            expression: base64_encode(self.expression.as_bytes()),
            input_serialization: InputSerializationBody {
                compression_type: self.compression,
                csv,
                json,
            },
            output_serialization: OutputSerializationBody {
                csv: self.output.csv.as_ref().map(|v| CsvOutputBody {
                    record_delimiter: encode_opt(&v.record_delimiter),
                    field_delimiter: encode_opt(&v.field_delimiter),
                }),
                json: self.output.json.as_ref().map(|v| JsonOutputBody {
                    record_delimiter: encode_opt(&v.record_delimiter),
                }),
                keep_all_columns: self.output.keep_all_columns,
                output_raw_data: self.output.output_raw_data,
                enable_payload_crc: self.output.enable_payload_crc,
                output_header: self.output.output_header,
            },
            options,
        }
    }
}

fn encode_opt(v: &Option<String>) -> Option<String> {
    v.as_ref().map(|s| base64_encode(s.as_bytes()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SelectRequestBody {
    expression: String,
    input_serialization: InputSerializationBody,
    output_serialization: OutputSerializationBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<SelectOptionsBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct InputSerializationBody {
    compression_type: CompressionType,
    #[serde(rename = "CSV", skip_serializing_if = "Option::is_none")]
    csv: Option<CsvInputBody>,
    #[serde(rename = "JSON", skip_serializing_if = "Option::is_none")]
    json: Option<JsonInputBody>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CsvInputBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    file_header_info: Option<FileHeaderInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quote_character: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment_character: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allow_quoted_record_delimiter: Option<bool>,
}

impl From<&CsvInput> for CsvInputBody {
    fn from(v: &CsvInput) -> Self {
        Self {
            file_header_info: v.file_header_info,
            record_delimiter: encode_opt(&v.record_delimiter),
            field_delimiter: encode_opt(&v.field_delimiter),
            quote_character: encode_opt(&v.quote_character),
            comment_character: encode_opt(&v.comment_character),
            range: v.range.clone(),
            allow_quoted_record_delimiter: v.allow_quoted_record_delimiter,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonInputBody {
    #[serde(rename = "Type")]
    json_type: JsonType,
    #[serde(skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_json_number_as_string: Option<bool>,
}

impl From<&JsonInput> for JsonInputBody {
    fn from(v: &JsonInput) -> Self {
        Self {
            json_type: v.json_type,
            range: v.range.clone(),
            parse_json_number_as_string: v.parse_json_number_as_string,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct OutputSerializationBody {
    #[serde(rename = "CSV", skip_serializing_if = "Option::is_none")]
    csv: Option<CsvOutputBody>,
    #[serde(rename = "JSON", skip_serializing_if = "Option::is_none")]
    json: Option<JsonOutputBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    keep_all_columns: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_raw_data: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_payload_crc: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_header: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CsvOutputBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    record_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_delimiter: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct JsonOutputBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    record_delimiter: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SelectOptionsBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    skip_partial_data_record: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_skipped_records_allowed: Option<u64>,
}

/// Result of `SelectObject`.
#[derive(Debug, Clone, Default)]
pub struct SelectObjectResult {
    /// Selected records.
    pub data: Bytes,
    /// Summary of the select, `None` for raw output.
    pub end: Option<SelectEnd>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

/// Request of `CreateSelectObjectMeta`.
#[derive(Debug, Clone)]
pub struct CreateSelectObjectMetaRequest {
    /// Bucket name.
    pub bucket: String,
    /// Object key.
    pub key: String,
    /// Source format, only delimiters and json type are used.
    pub input: SelectInput,
    /// Compression of the object.
    pub compression: CompressionType,
    /// Rebuild meta even if it exists.
    pub overwrite_if_exists: bool,
}

impl CreateSelectObjectMetaRequest {
    /// Create a request for given object and format.
    pub fn new(bucket: &str, key: &str, input: SelectInput) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
            input,
            compression: CompressionType::None,
            overwrite_if_exists: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct MetaRequestBody {
    input_serialization: InputSerializationBody,
    overwrite_if_exists: bool,
}

/// Result of `CreateSelectObjectMeta`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateSelectObjectMetaResult {
    /// Total bytes scanned.
    pub total_scanned_bytes: u64,
    /// Splits count.
    pub splits: u32,
    /// Rows count.
    pub rows: u64,
    /// Columns count, csv only.
    pub columns: Option<u32>,
    /// Value of `x-oss-request-id`.
    pub request_id: String,
}

impl Client {
    /// Run a SQL query over a csv or json object.
    pub async fn select_object(&self, req: &SelectObjectRequest) -> Result<SelectObjectResult> {
        if req.output.csv.is_some() && matches!(req.input, SelectInput::Json(_))
            || req.output.json.is_some() && matches!(req.input, SelectInput::Csv(_))
        {
            return Err(Error::invalid_argument("select output format must match input format")
                .with_operation("SelectObject"));
        }
        let input = OperationInput::new("SelectObject", Method::POST)
            .with_bucket(&req.bucket)
            .with_key(&req.key)
            .with_param("x-oss-process", format!("{}/select", req.input.format()))
            .with_xml_body("SelectRequest", &req.body())
            .map_err(|e| e.with_operation("SelectObject"))?;
        let out = self.invoke(input).await?;
        let request_id = out.request_id();
        if req.output.output_raw_data == Some(true) {
            return Ok(SelectObjectResult {
                data: out.body,
                end: None,
                request_id,
            });
        }
        let decoded = decode_select(&out.body).map_err(|e| e.with_operation("SelectObject"))?;
        Ok(SelectObjectResult {
            data: decoded.data,
            end: Some(decoded.end),
            request_id,
        })
    }

    /// Build the select meta of an object so splits can be queried.
    pub async fn create_select_object_meta(
        &self,
        req: &CreateSelectObjectMetaRequest,
    ) -> Result<CreateSelectObjectMetaResult> {
        let (root, csv, json) = match &req.input {
            SelectInput::Csv(v) => (
                "CsvMetaRequest",
                Some(CsvInputBody {
                    file_header_info: None,
                    comment_character: None,
                    range: None,
                    allow_quoted_record_delimiter: None,
                    ..CsvInputBody::from(v)
                }),
                None,
            ),
            SelectInput::Json(v) => (
                "JsonMetaRequest",
                None,
                Some(JsonInputBody {
                    json_type: v.json_type,
                    range: None,
                    parse_json_number_as_string: None,
                }),
            ),
        };
        let body = MetaRequestBody {
            input_serialization: InputSerializationBody {
                compression_type: req.compression,
                csv,
                json,
            },
            overwrite_if_exists: req.overwrite_if_exists,
        };
        let input = OperationInput::new("CreateSelectObjectMeta", Method::POST)
            .with_bucket(&req.bucket)
            .with_key(&req.key)
            .with_param("x-oss-process", format!("{}/meta", req.input.format()))
            .with_xml_body(root, &body)
            .map_err(|e| e.with_operation("CreateSelectObjectMeta"))?;
        let out = self.invoke(input).await?;
        let end = decode_select(&out.body)
            .map_err(|e| e.with_operation("CreateSelectObjectMeta"))?
            .end;
        Ok(CreateSelectObjectMetaResult {
            total_scanned_bytes: end.total_scanned_bytes,
            splits: end.splits.unwrap_or_default(),
            rows: end.rows.unwrap_or_default(),
            columns: end.columns,
            request_id: out.request_id(),
        })
    }
}
