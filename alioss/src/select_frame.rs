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

//! Decoder of the frames returned by select requests.
//!
//! Every frame is laid out as:
//!
//! ```text
//! | version (1) | type (3) | payload length (4) | header crc (4) | payload | payload crc (4) |
//! ```
//!
//! All integers are big endian. The payload crc is only checked when it's
//! not zero.

use crate::error::{Error, Result, ServiceError};
use bytes::{Buf, Bytes, BytesMut};
use http::StatusCode;

const DATA_FRAME: u32 = 8388609;
const CONTINUOUS_FRAME: u32 = 8388612;
const END_FRAME: u32 = 8388613;
const CSV_META_END_FRAME: u32 = 8388614;
const JSON_META_END_FRAME: u32 = 8388615;

const PREFIX_LEN: usize = 12;
const CHECKSUM_LEN: usize = 4;

/// Summary carried by the last frame of a select response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectEnd {
    /// Offset in the source object.
    pub offset: u64,
    /// Total bytes scanned.
    pub total_scanned_bytes: u64,
    /// HTTP status of the whole select.
    pub status: u32,
    /// Splits count, meta requests only.
    pub splits: Option<u32>,
    /// Rows count, meta requests only.
    pub rows: Option<u64>,
    /// Columns count, csv meta requests only.
    pub columns: Option<u32>,
    /// Error message if the select failed halfway.
    pub error_message: String,
}

/// One decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectFrame {
    /// A chunk of selected records.
    Data {
        /// Offset in the source object.
        offset: u64,
        /// Records.
        data: Bytes,
    },
    /// Keep-alive with the current scan offset.
    Continuous {
        /// Offset in the source object.
        offset: u64,
    },
    /// The final frame.
    End(SelectEnd),
}

/// Incremental frame decoder.
///
/// Feed response chunks with [`FrameDecoder::push`] and pull frames with
/// [`FrameDecoder::next_frame`] until it returns `None`.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of response body.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes buffered but not decoded yet.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    /// Decode the next complete frame, `None` if more input is needed.
    pub fn next_frame(&mut self) -> Result<Option<SelectFrame>> {
        if self.buf.len() < PREFIX_LEN {
            return Ok(None);
        }
        let mut prefix = &self.buf[..PREFIX_LEN];
        let version_type = prefix.get_u32();
        let payload_len = prefix.get_u32() as usize;
        let frame_len = PREFIX_LEN + payload_len + CHECKSUM_LEN;
        if self.buf.len() < frame_len {
            return Ok(None);
        }

        let mut frame = self.buf.split_to(frame_len).freeze();
        frame.advance(PREFIX_LEN);
        let mut payload = frame.split_to(payload_len);
        let checksum = frame.get_u32();
        if checksum != 0 {
            let actual = crc32fast::hash(&payload);
            if actual != checksum {
                return Err(Error::deserialize(format!(
                    "select frame checksum mismatch, expected {checksum}, got {actual}"
                )));
            }
        }

        let frame_type = version_type & 0x00ff_ffff;
        let min_len = match frame_type {
            DATA_FRAME | CONTINUOUS_FRAME => 8,
            END_FRAME => 20,
            CSV_META_END_FRAME => 36,
            JSON_META_END_FRAME => 32,
            v => {
                return Err(Error::deserialize(format!("unknown select frame type {v}")));
            }
        };
        if payload.len() < min_len {
            return Err(Error::deserialize(format!(
                "select frame {frame_type} too short: {} bytes",
                payload.len()
            )));
        }

        let offset = payload.get_u64();
        let frame = match frame_type {
            DATA_FRAME => SelectFrame::Data {
                offset,
                data: payload,
            },
            CONTINUOUS_FRAME => SelectFrame::Continuous { offset },
            _ => {
                let mut end = SelectEnd {
                    offset,
                    total_scanned_bytes: payload.get_u64(),
                    status: payload.get_u32(),
                    ..Default::default()
                };
                if frame_type != END_FRAME {
                    end.splits = Some(payload.get_u32());
                    end.rows = Some(payload.get_u64());
                    if frame_type == CSV_META_END_FRAME {
                        end.columns = Some(payload.get_u32());
                    }
                }
                end.error_message = String::from_utf8_lossy(&payload).into_owned();
                SelectFrame::End(end)
            }
        };
        Ok(Some(frame))
    }
}

/// Data and summary of a complete select response.
#[derive(Debug, Clone, Default)]
pub struct SelectOutput {
    /// Selected records in order.
    pub data: Bytes,
    /// The end frame.
    pub end: SelectEnd,
}

/// Decode a full select response body.
///
/// An end frame with a status of 400 or above is returned as a service error.
pub fn decode_select(body: &[u8]) -> Result<SelectOutput> {
    let mut decoder = FrameDecoder::new();
    decoder.push(body);

    let mut data = BytesMut::new();
    while let Some(frame) = decoder.next_frame()? {
        match frame {
            SelectFrame::Data { data: chunk, .. } => data.extend_from_slice(&chunk),
            SelectFrame::Continuous { offset } => log::debug!("select scanned to offset {offset}"),
            SelectFrame::End(end) => {
                if end.status >= 400 {
                    return Err(end_frame_error(&end));
                }
                return Ok(SelectOutput {
                    data: data.freeze(),
                    end,
                });
            }
        }
    }

    Err(Error::deserialize(format!(
        "select response ended without end frame, {} bytes left",
        decoder.remaining()
    )))
}

fn end_frame_error(end: &SelectEnd) -> Error {
    let status = u16::try_from(end.status)
        .ok()
        .and_then(|v| StatusCode::from_u16(v).ok())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let (code, message) = match end.error_message.split_once('.') {
        Some((code, message)) if !code.contains(' ') => (code.to_string(), message.trim().to_string()),
        _ => (String::new(), end.error_message.clone()),
    };
    Error::service(ServiceError {
        status_code: status.as_u16(),
        code,
        message,
        ..Default::default()
    })
}
