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

//! Multipart uploader with checkpoint based resume.

use crate::checkpoint::{modified_secs, Checkpoint, UploadInfo, UploadState};
use crate::client::Client;
use crate::error::{Error, ErrorKind, Result};
use crate::ops::multipart::{
    AbortMultipartUploadRequest, CompleteMultipartUploadRequest, InitiateMultipartUploadRequest,
    ListPartsRequest, UploadPart, UploadPartRequest,
};
use crate::ops::object::PutObjectRequest;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};
use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Default part size, 6 MiB.
pub const DEFAULT_UPLOAD_PART_SIZE: u64 = 6 * 1024 * 1024;
/// Min part size accepted by the service, 100 KiB.
pub const MIN_UPLOAD_PART_SIZE: u64 = 100 * 1024;
/// Default number of parts uploaded at the same time.
pub const DEFAULT_UPLOAD_PARALLEL: usize = 3;
/// Max parts of one multipart upload.
pub const MAX_UPLOAD_PARTS: u64 = 10000;

/// Result of an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadResult {
    /// Upload id, `None` if the object was sent by `PutObject`.
    pub upload_id: Option<String>,
    /// ETag of the object.
    pub etag: String,
    /// Version id if versioning is enabled.
    pub version_id: Option<String>,
    /// CRC-64 of the object.
    pub hash_crc64: Option<String>,
    /// Value of `x-oss-request-id` of the last request.
    pub request_id: String,
}

enum Source {
    File(PathBuf),
    Memory(Bytes),
}

impl Source {
    async fn read(&self, offset: u64, len: u64) -> Result<Bytes> {
        match self {
            Source::Memory(data) => Ok(data.slice(offset as usize..(offset + len) as usize)),
            Source::File(path) => {
                let mut f = tokio::fs::File::open(path).await?;
                f.seek(std::io::SeekFrom::Start(offset)).await?;
                let mut buf = vec![0; len as usize];
                f.read_exact(&mut buf).await?;
                Ok(Bytes::from(buf))
            }
        }
    }
}

/// Uploader splits an object into parts and uploads them concurrently.
///
/// Objects smaller than one part are sent by `PutObject`. With a checkpoint
/// dir, a failed file upload keeps its parts and resumes on the next call.
///
/// ```no_run
/// use alioss::{Client, Config, PutObjectRequest};
///
/// # async fn example() -> alioss::Result<()> {
/// let client = Client::new(Config::new("cn-hangzhou"))?;
/// let result = client
///     .uploader()
///     .with_part_size(16 * 1024 * 1024)
///     .with_checkpoint_dir("/tmp")
///     .upload_file(&PutObjectRequest::new("examplebucket", "big.bin"), "/data/big.bin")
///     .await?;
/// println!("uploaded {}", result.etag);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Uploader {
    client: Client,
    part_size: u64,
    parallel: usize,
    checkpoint_dir: Option<PathBuf>,
    leave_parts_on_error: bool,
}

impl Uploader {
    /// Create an uploader with default options.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            part_size: DEFAULT_UPLOAD_PART_SIZE,
            parallel: DEFAULT_UPLOAD_PARALLEL,
            checkpoint_dir: None,
            leave_parts_on_error: false,
        }
    }

    /// Set part size, raised to the min part size if smaller.
    pub fn with_part_size(mut self, part_size: u64) -> Self {
        self.part_size = part_size.max(MIN_UPLOAD_PART_SIZE);
        self
    }

    /// Set the number of parts uploaded at the same time.
    pub fn with_parallel(mut self, parallel: usize) -> Self {
        self.parallel = parallel.max(1);
        self
    }

    /// Enable checkpoint, files are stored in `dir`.
    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = Some(dir.into());
        self
    }

    /// Keep uploaded parts instead of aborting the upload on failure.
    pub fn with_leave_parts_on_error(mut self, leave: bool) -> Self {
        self.leave_parts_on_error = leave;
        self
    }

    /// Upload a local file, the body of `req` is ignored.
    pub async fn upload_file(&self, req: &PutObjectRequest, path: impl AsRef<Path>) -> Result<UploadResult> {
        let path = path.as_ref();
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| {
                Error::invalid_argument(format!("failed to stat {}", path.display())).with_source(e)
            })?
            .len();

        let checkpoint = match &self.checkpoint_dir {
            Some(dir) => {
                let info = UploadInfo {
                    bucket: req.bucket.clone(),
                    key: req.key.clone(),
                    file_path: path.to_string_lossy().into_owned(),
                    file_size: size,
                    modified: modified_secs(path).await?,
                    part_size: part_size_for(size, self.part_size),
                };
                Some(Checkpoint::new(dir, info))
            }
            None => None,
        };
        self.upload(req, Source::File(path.to_path_buf()), size, checkpoint)
            .await
    }

    /// Upload bytes in memory, the body of `req` is ignored.
    pub async fn upload_from(&self, req: &PutObjectRequest, data: impl Into<Bytes>) -> Result<UploadResult> {
        let data = data.into();
        let size = data.len() as u64;
        self.upload(req, Source::Memory(data), size, None).await
    }

    async fn upload(
        &self,
        req: &PutObjectRequest,
        source: Source,
        size: u64,
        mut checkpoint: Option<Checkpoint<UploadInfo, UploadState>>,
    ) -> Result<UploadResult> {
        let part_size = part_size_for(size, self.part_size);
        if size < part_size {
            let put = PutObjectRequest {
                body: source.read(0, size).await?,
                ..req.clone()
            };
            let out = self.client.put_object(&put).await?;
            return Ok(UploadResult {
                upload_id: None,
                etag: out.etag,
                version_id: out.version_id,
                hash_crc64: out.hash_crc64,
                request_id: out.request_id,
            });
        }

        let mut parts = Vec::new();
        let mut upload_id = None;
        if let Some(cp) = checkpoint.as_mut() {
            if cp.load().await {
                let state = cp.state().clone();
                match self.verify_parts(req, &state).await? {
                    Some(valid) => {
                        upload_id = Some(state.upload_id);
                        parts = valid;
                    }
                    None => cp.remove().await,
                }
            }
        }
        let upload_id = match upload_id {
            Some(id) => id,
            None => {
                let init = self
                    .client
                    .initiate_multipart_upload(&InitiateMultipartUploadRequest::from(req))
                    .await?;
                init.upload_id
            }
        };
        if let Some(cp) = checkpoint.as_mut() {
            *cp.state_mut() = UploadState {
                upload_id: upload_id.clone(),
                parts: parts.clone(),
            };
            cp.save().await?;
        }

        let finished: Vec<i32> = parts.iter().map(|p| p.part_number).collect();
        let todo: Vec<(i32, u64, u64)> = (0..size.div_ceil(part_size))
            .map(|i| {
                let offset = i * part_size;
                ((i + 1) as i32, offset, part_size.min(size - offset))
            })
            .filter(|(n, _, _)| !finished.contains(n))
            .collect();
        debug!(
            "upload {} with {} parts, {} already finished",
            req.key,
            todo.len() + finished.len(),
            finished.len()
        );

        let result = self
            .upload_parts(req, &source, &upload_id, todo, &mut parts, checkpoint.as_mut())
            .await;
        if let Err(err) = result {
            if checkpoint.is_none() && !self.leave_parts_on_error {
                self.abort(req, &upload_id).await;
            }
            return Err(err);
        }

        parts.sort_by_key(|p| p.part_number);
        let out = self
            .client
            .complete_multipart_upload(&CompleteMultipartUploadRequest {
                bucket: req.bucket.clone(),
                key: req.key.clone(),
                upload_id: upload_id.clone(),
                parts,
                acl: req.acl,
                forbid_overwrite: req.forbid_overwrite,
                ..Default::default()
            })
            .await?;
        if let Some(cp) = &checkpoint {
            cp.remove().await;
        }
        Ok(UploadResult {
            upload_id: Some(upload_id),
            etag: out.etag,
            version_id: out.version_id,
            hash_crc64: out.hash_crc64,
            request_id: out.request_id,
        })
    }

    async fn upload_parts(
        &self,
        req: &PutObjectRequest,
        source: &Source,
        upload_id: &str,
        todo: Vec<(i32, u64, u64)>,
        parts: &mut Vec<UploadPart>,
        mut checkpoint: Option<&mut Checkpoint<UploadInfo, UploadState>>,
    ) -> Result<()> {
        let mut uploads = futures::stream::iter(todo)
            .map(|(part_number, offset, len)| async move {
                let body = source.read(offset, len).await?;
                let out = self
                    .client
                    .upload_part(&UploadPartRequest {
                        bucket: req.bucket.clone(),
                        key: req.key.clone(),
                        upload_id: upload_id.to_string(),
                        part_number,
                        traffic_limit: req.traffic_limit,
                        body,
                    })
                    .await?;
                Ok::<_, Error>(UploadPart {
                    part_number,
                    etag: out.etag,
                })
            })
            .buffer_unordered(self.parallel);

        while let Some(part) = uploads.try_next().await? {
            debug!("uploaded part {} of {}", part.part_number, req.key);
            parts.push(part);
            if let Some(cp) = checkpoint.as_mut() {
                cp.state_mut().parts = parts.clone();
                if let Err(e) = cp.save().await {
                    warn!("failed to save checkpoint: {e}");
                }
            }
        }
        Ok(())
    }

    /// Keep checkpoint parts still present on the service, `None` if the upload is gone.
    async fn verify_parts(&self, req: &PutObjectRequest, state: &UploadState) -> Result<Option<Vec<UploadPart>>> {
        let list = ListPartsRequest::new(&req.bucket, &req.key, &state.upload_id);
        let pages: Result<Vec<_>> = self.client.paginator(list).into_stream().try_collect().await;
        let pages = match pages {
            Ok(v) => v,
            Err(e) if is_no_such_upload(&e) => {
                warn!("upload {} of checkpoint is gone, start over", state.upload_id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let uploaded: HashMap<i32, String> = pages
            .into_iter()
            .flat_map(|p| p.parts)
            .map(|p| (p.part_number, p.etag))
            .collect();
        Ok(Some(
            state
                .parts
                .iter()
                .filter(|p| uploaded.get(&p.part_number) == Some(&p.etag))
                .cloned()
                .collect(),
        ))
    }

    async fn abort(&self, req: &PutObjectRequest, upload_id: &str) {
        let abort = AbortMultipartUploadRequest {
            bucket: req.bucket.clone(),
            key: req.key.clone(),
            upload_id: upload_id.to_string(),
        };
        if let Err(e) = self.client.abort_multipart_upload(&abort).await {
            warn!("failed to abort upload {upload_id}: {e}");
        }
    }
}

fn is_no_such_upload(err: &Error) -> bool {
    err.kind() == ErrorKind::Service
        && err
            .service_error()
            .is_some_and(|se| se.code == "NoSuchUpload")
}

/// Grow the part size so the object fits in the max part count.
fn part_size_for(size: u64, part_size: u64) -> u64 {
    part_size.max(size.div_ceil(MAX_UPLOAD_PARTS))
}

impl Client {
    /// Create an uploader with default options.
    pub fn uploader(&self) -> Uploader {
        Uploader::new(self.clone())
    }
}
