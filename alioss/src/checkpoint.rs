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

//! Checkpoint files of resumable transfers.
//!
//! A checkpoint is a json record of the transfer descriptor and its progress,
//! sealed with an md5 over the record. It's named after the md5 of the
//! source and destination so the same transfer finds it again.

use crate::error::{Error, Result};
use crate::ops::multipart::UploadPart;
use alioss_core::hash::hex_md5;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

const UPLOAD_MAGIC: &str = "92611BED-89E2-46B6-89E5-72F273D4B0A3";
const DOWNLOAD_MAGIC: &str = "A90DDC32-2AC6-4B8F-8E5C-9E4E6B1B7A4D";

/// Descriptor of a transfer, a checkpoint is only reused for the same one.
pub(crate) trait TransferInfo: Serialize + DeserializeOwned + PartialEq {
    /// Magic string of this kind of checkpoint.
    const MAGIC: &'static str;
    /// Extension of the checkpoint file.
    const EXT: &'static str;

    /// Source and destination of the transfer.
    fn endpoints(&self) -> (String, String);
}

/// Descriptor of a multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UploadInfo {
    pub bucket: String,
    pub key: String,
    pub file_path: String,
    pub file_size: u64,
    pub modified: u64,
    pub part_size: u64,
}

impl TransferInfo for UploadInfo {
    const MAGIC: &'static str = UPLOAD_MAGIC;
    const EXT: &'static str = "ucp";

    fn endpoints(&self) -> (String, String) {
        (self.file_path.clone(), format!("oss://{}/{}", self.bucket, self.key))
    }
}

/// Progress of a multipart upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct UploadState {
    pub upload_id: String,
    pub parts: Vec<UploadPart>,
}

/// Descriptor of a ranged download.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DownloadInfo {
    pub bucket: String,
    pub key: String,
    pub version_id: Option<String>,
    pub file_path: String,
    pub size: u64,
    pub etag: String,
    pub part_size: u64,
}

impl TransferInfo for DownloadInfo {
    const MAGIC: &'static str = DOWNLOAD_MAGIC;
    const EXT: &'static str = "dcp";

    fn endpoints(&self) -> (String, String) {
        let mut src = format!("oss://{}/{}", self.bucket, self.key);
        if let Some(v) = &self.version_id {
            src.push_str("?versionId=");
            src.push_str(v);
        }
        (src, self.file_path.clone())
    }
}

/// Progress of a ranged download, as offsets of finished parts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DownloadState {
    pub finished: Vec<u64>,
}

#[derive(Serialize, Deserialize)]
struct Record<I, S> {
    magic: String,
    md5: String,
    info: I,
    state: S,
}

impl<I: Serialize, S: Serialize> Record<I, S> {
    fn checksum(&self) -> Result<String> {
        let body = serde_json::to_vec(&(&self.magic, &self.info, &self.state))
            .map_err(|e| Error::checkpoint("failed to encode checkpoint").with_source(e))?;
        Ok(hex_md5(&body))
    }
}

/// A checkpoint file bound to one transfer.
#[derive(Debug)]
pub(crate) struct Checkpoint<I, S> {
    path: PathBuf,
    info: I,
    state: S,
}

impl<I, S> Checkpoint<I, S>
where
    I: TransferInfo + Clone,
    S: Serialize + DeserializeOwned + Default + Clone,
{
    /// Create a checkpoint in `dir` for the transfer described by `info`.
    pub fn new(dir: &Path, info: I) -> Self {
        let (src, dest) = info.endpoints();
        let name = format!(
            "{}-{}.{}",
            hex_md5(src.as_bytes()),
            hex_md5(dest.as_bytes()),
            I::EXT
        );
        Self {
            path: dir.join(name),
            info,
            state: S::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Load saved progress, returns `false` if there is none usable.
    ///
    /// A corrupted or mismatched checkpoint is removed.
    pub async fn load(&mut self) -> bool {
        let content = match tokio::fs::read(&self.path).await {
            Ok(v) => v,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                warn!("failed to read checkpoint {}: {e}", self.path.display());
                return false;
            }
        };

        match self.parse(&content) {
            Ok(state) => {
                debug!("resume from checkpoint {}", self.path.display());
                self.state = state;
                true
            }
            Err(e) => {
                warn!("discard checkpoint {}: {e}", self.path.display());
                self.remove().await;
                false
            }
        }
    }

    fn parse(&self, content: &[u8]) -> Result<S> {
        let record: Record<I, S> = serde_json::from_slice(content)
            .map_err(|e| Error::checkpoint("invalid checkpoint").with_source(e))?;
        if record.magic != I::MAGIC {
            return Err(Error::checkpoint("checkpoint magic mismatch"));
        }
        if record.md5 != record.checksum()? {
            return Err(Error::checkpoint("checkpoint checksum mismatch"));
        }
        if record.info != self.info {
            return Err(Error::checkpoint("checkpoint belongs to another transfer"));
        }
        Ok(record.state)
    }

    /// Persist current progress.
    pub async fn save(&self) -> Result<()> {
        let mut record = Record {
            magic: I::MAGIC.to_string(),
            md5: String::new(),
            info: self.info.clone(),
            state: self.state.clone(),
        };
        record.md5 = record.checksum()?;
        let content = serde_json::to_vec(&record)
            .map_err(|e| Error::checkpoint("failed to encode checkpoint").with_source(e))?;
        tokio::fs::write(&self.path, content).await.map_err(|e| {
            Error::checkpoint(format!("failed to write checkpoint {}", self.path.display()))
                .with_source(e)
        })
    }

    /// Remove the checkpoint file if it exists.
    pub async fn remove(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove checkpoint {}: {e}", self.path.display());
            }
        }
    }
}

/// Modification time of a file in seconds, used to detect changed sources.
pub(crate) async fn modified_secs(path: &Path) -> Result<u64> {
    let meta = tokio::fs::metadata(path).await?;
    Ok(meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or_default())
}
