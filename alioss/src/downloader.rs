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

//! Ranged downloader with checkpoint based resume.

use crate::checkpoint::{Checkpoint, DownloadInfo, DownloadState};
use crate::client::Client;
use crate::error::{Error, Result};
use crate::ops::object::{GetObjectRequest, HeadObjectRequest};
use futures::{StreamExt, TryStreamExt};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Default part size, 6 MiB.
pub const DEFAULT_DOWNLOAD_PART_SIZE: u64 = 6 * 1024 * 1024;
/// Default number of ranges downloaded at the same time.
pub const DEFAULT_DOWNLOAD_PARALLEL: usize = 3;

/// Result of a download.
#[derive(Debug, Clone, Default)]
pub struct DownloadResult {
    /// Bytes written.
    pub size: u64,
    /// ETag of the object.
    pub etag: String,
    /// Version id of the object.
    pub version_id: Option<String>,
}

/// Downloader fetches an object by ranges into a local file.
///
/// Ranges are written into `<path>.temp`, which is renamed to `path` once all
/// of them finished. Every range is requested with `If-Match` so a changed
/// object fails the download instead of mixing versions.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    part_size: u64,
    parallel: usize,
    checkpoint_dir: Option<PathBuf>,
}

impl Downloader {
    /// Create a downloader with default options.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            part_size: DEFAULT_DOWNLOAD_PART_SIZE,
            parallel: DEFAULT_DOWNLOAD_PARALLEL,
            checkpoint_dir: None,
        }
    }

    /// Set size of each range.
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size.max(1);
        self
    }

    /// Set the number of ranges downloaded at the same time.
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    /// Enable checkpoint, files are stored in `dir`.
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    /// Download an object into `path`.
    ///
    /// Bucket, key and version id are taken from `req`, other fields are
    /// sent with every range request.
    pub async fn download_file(&self, req: &GetObjectRequest, path: impl AsRef<Path>) -> Result<DownloadResult> {
        let path = path.as_ref();
        let meta = self
            .client
            .head_object(&HeadObjectRequest {
                bucket: req.bucket.clone(),
                key: req.key.clone(),
                version_id: req.version_id.clone(),
                ..Default::default()
            })
            .await?;
        let size = meta.content_length;
        let etag = meta.etag.unwrap_or_default();
        let temp = temp_path(path);

        let mut checkpoint = self.checkpoint_dir.as_ref().map(|dir| {
            Checkpoint::<DownloadInfo, DownloadState>::new(
                dir,
                DownloadInfo {
                    bucket: req.bucket.clone(),
                    key: req.key.clone(),
                    version_id: req.version_id.clone(),
                    file_path: path.to_string_lossy().into_owned(),
                    size,
                    etag: etag.clone(),
                    part_size: self.part_size,
                },
            )
        });

        let mut resumed = false;
        if let Some(cp) = checkpoint.as_mut() {
            resumed = cp.load().await && tokio::fs::try_exists(&temp).await.unwrap_or(false);
            if !resumed {
                *cp.state_mut() = DownloadState::default();
            }
        }
        if !resumed {
            let f = tokio::fs::File::create(&temp).await.map_err(|e| {
                Error::invalid_argument(format!("failed to create {}", temp.display())).with_source(e)
            })?;
            f.set_len(size).await?;
        }

        let finished = checkpoint
            .as_ref()
            .map(|cp| cp.state().finished.clone())
            .unwrap_or_default();
        let todo: Vec<(u64, u64)> = (0..size.div_ceil(self.part_size))
            .map(|i| {
                let offset = i * self.part_size;
                (offset, self.part_size.min(size - offset))
            })
            .filter(|(offset, _)| !finished.contains(offset))
            .collect();
        debug!(
            "download {} with {} ranges, {} already finished",
            req.key,
            todo.len() + finished.len(),
            finished.len()
        );

        let result = self
            .download_ranges(req, &etag, &temp, todo, checkpoint.as_mut())
            .await;
        if let Err(err) = result {
            if checkpoint.is_none() {
                if let Err(e) = tokio::fs::remove_file(&temp).await {
                    warn!("failed to remove {}: {e}", temp.display());
                }
            }
            return Err(err);
        }

        tokio::fs::rename(&temp, path).await.map_err(|e| {
            Error::unexpected(format!("failed to rename {} to {}", temp.display(), path.display()))
                .with_source(e)
        })?;
        if let Some(cp) = &checkpoint {
            cp.remove().await;
        }
        Ok(DownloadResult {
            size,
            etag,
            version_id: meta.version_id,
        })
    }

    async fn download_ranges(
        &self,
        req: &GetObjectRequest,
        etag: &str,
        temp: &Path,
        todo: Vec<(u64, u64)>,
        mut checkpoint: Option<&mut Checkpoint<DownloadInfo, DownloadState>>,
    ) -> Result<()> {
        let mut ranges = futures::stream::iter(todo)
            .map(|(offset, len)| async move {
                let get = GetObjectRequest {
                    range: Some(format!("bytes={}-{}", offset, offset + len - 1)),
                    if_match: Some(etag.to_string()),
                    ..req.clone()
                };
                let out = self.client.get_object(&get).await?;
                if out.body.len() as u64 != len {
                    return Err(Error::unexpected(format!(
                        "range at {offset} returned {} bytes, expected {len}",
                        out.body.len()
                    ))
                    .with_operation("GetObject"));
                }

                let mut f = tokio::fs::OpenOptions::new().write(true).open(temp).await?;
                f.seek(std::io::SeekFrom::Start(offset)).await?;
                f.write_all(&out.body).await?;
                f.flush().await?;
                Ok::<_, Error>(offset)
            })
            .buffer_unordered(self.parallel);

        while let Some(offset) = ranges.try_next().await? {
            if let Some(cp) = checkpoint.as_mut() {
                cp.state_mut().finished.push(offset);
                if let Err(e) = cp.save().await {
                    warn!("failed to save checkpoint: {e}");
                }
            }
        }
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".temp");
    PathBuf::from(name)
}

impl Client {
    /// Create a downloader with default options.
    pub fn downloader(&self) -> Downloader {
        Downloader::new(self.clone())
    }
}
