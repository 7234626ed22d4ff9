// Copyright 2024 RustFS Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Streaming uploads and downloads.
//!
//! [`TransferEngine`] moves whole objects between local streams and the
//! service. [`SdkTransfer`] splits large bodies into multipart uploads and
//! large objects into ranged GETs, keeping up to `concurrency` parts in flight.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;
use futures::stream::{self, FuturesUnordered, StreamExt};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::{MAX_UPLOAD_PARTS, TransferConfig};
use crate::error::{Error, Result};

/// Destination of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub bucket: String,
    pub key: String,
    pub content_type: Option<String>,
}

#[async_trait]
pub trait TransferEngine: Send + Sync + fmt::Debug {
    /// Upload everything `body` yields to `bucket/key`.
    async fn upload_stream(&self, request: UploadRequest, body: &mut (dyn AsyncRead + Send + Unpin)) -> Result<()>;

    /// Write the whole object to `sink`, returning the number of bytes written.
    async fn download_to_sink(&self, bucket: &str, key: &str, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> Result<u64>;
}

#[derive(Debug, Clone)]
pub struct SdkTransfer {
    client: Client,
    part_size: u64,
    concurrency: usize,
}

impl SdkTransfer {
    pub fn new(client: Client, config: TransferConfig) -> Self {
        Self {
            client,
            part_size: config.part_size,
            concurrency: config.concurrency.max(1),
        }
    }

    async fn put_single(&self, request: &UploadRequest, data: Bytes) -> Result<()> {
        debug!("Uploading {}/{} in a single request ({} bytes)", request.bucket, request.key, data.len());
        self.client
            .put_object()
            .bucket(&request.bucket)
            .key(&request.key)
            .content_length(data.len() as i64)
            .body(ByteStream::from(data))
            .set_content_type(request.content_type.clone())
            .send()
            .await
            .map_err(|e| Error::from_sdk("PutObject", e))?;
        Ok(())
    }

    async fn upload_multipart(
        &self,
        request: &UploadRequest,
        first: Bytes,
        second: Bytes,
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<()> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .set_content_type(request.content_type.clone())
            .send()
            .await
            .map_err(|e| Error::from_sdk("CreateMultipartUpload", e))?;

        let upload_id = output
            .upload_id()
            .map(String::from)
            .ok_or_else(|| Error::invalid_argument("CreateMultipartUpload returned no upload id"))?;

        debug!("Created multipart upload for {}/{}, ID: {}", request.bucket, request.key, upload_id);

        let parts = match self.upload_parts(request, &upload_id, [first, second], body).await {
            Ok(parts) => parts,
            Err(e) => {
                self.abort(request, &upload_id).await;
                return Err(e);
            }
        };

        let part_count = parts.len();
        let completed = CompletedMultipartUpload::builder().set_parts(Some(parts)).build();
        if let Err(e) = self
            .client
            .complete_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .upload_id(&upload_id)
            .multipart_upload(completed)
            .send()
            .await
        {
            self.abort(request, &upload_id).await;
            return Err(Error::from_sdk("CompleteMultipartUpload", e));
        }

        debug!("Completed multipart upload of {}/{} with {} parts", request.bucket, request.key, part_count);
        Ok(())
    }

    async fn upload_parts(
        &self,
        request: &UploadRequest,
        upload_id: &str,
        buffered: [Bytes; 2],
        body: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<Vec<CompletedPart>> {
        let mut buffered = buffered.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut completed = Vec::new();
        let mut part_number: i32 = 0;

        loop {
            let chunk = match buffered.next() {
                Some(chunk) => chunk,
                None => read_part(body, self.part_size).await?,
            };
            if chunk.is_empty() {
                break;
            }

            part_number += 1;
            if part_number as u64 > MAX_UPLOAD_PARTS {
                return Err(Error::invalid_argument(format!(
                    "upload exceeds {MAX_UPLOAD_PARTS} parts of {} bytes",
                    self.part_size
                )));
            }

            while in_flight.len() >= self.concurrency {
                if let Some(done) = in_flight.next().await {
                    completed.push(done?);
                }
            }
            in_flight.push(self.upload_part(request, upload_id, part_number, chunk));
        }

        while let Some(done) = in_flight.next().await {
            completed.push(done?);
        }

        completed.sort_by_key(|part: &CompletedPart| part.part_number());
        Ok(completed)
    }

    async fn upload_part(&self, request: &UploadRequest, upload_id: &str, part_number: i32, chunk: Bytes) -> Result<CompletedPart> {
        let output = self
            .client
            .upload_part()
            .bucket(&request.bucket)
            .key(&request.key)
            .upload_id(upload_id)
            .part_number(part_number)
            .content_length(chunk.len() as i64)
            .body(ByteStream::from(chunk))
            .send()
            .await
            .map_err(|e| Error::from_sdk("UploadPart", e))?;

        Ok(CompletedPart::builder()
            .set_e_tag(output.e_tag().map(String::from))
            .part_number(part_number)
            .build())
    }

    async fn abort(&self, request: &UploadRequest, upload_id: &str) {
        if let Err(e) = self
            .client
            .abort_multipart_upload()
            .bucket(&request.bucket)
            .key(&request.key)
            .upload_id(upload_id)
            .send()
            .await
        {
            warn!(
                "Failed to abort multipart upload {} for {}/{}: {}",
                upload_id,
                request.bucket,
                request.key,
                Error::from_sdk("AbortMultipartUpload", e)
            );
        }
    }

    async fn get_range(&self, bucket: &str, key: &str, start: u64, end: u64) -> Result<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .range(format!("bytes={start}-{end}"))
            .send()
            .await
            .map_err(|e| Error::from_sdk("GetObject", e))?;

        let data = output.body.collect().await.map_err(|e| Error::body("GetObject", e))?;
        Ok(data.into_bytes())
    }
}

#[async_trait]
impl TransferEngine for SdkTransfer {
    async fn upload_stream(&self, request: UploadRequest, body: &mut (dyn AsyncRead + Send + Unpin)) -> Result<()> {
        let first = read_part(body, self.part_size).await?;
        if (first.len() as u64) < self.part_size {
            return self.put_single(&request, first).await;
        }

        let second = read_part(body, self.part_size).await?;
        if second.is_empty() {
            return self.put_single(&request, first).await;
        }

        self.upload_multipart(&request, first, second, body).await
    }

    async fn download_to_sink(&self, bucket: &str, key: &str, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> Result<u64> {
        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("HeadObject", e))?;
        let size = head.content_length().unwrap_or(0).max(0) as u64;

        if size <= self.part_size {
            debug!("Downloading {}/{} in a single request ({} bytes)", bucket, key, size);
            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| Error::from_sdk("GetObject", e))?;
            let data = output.body.collect().await.map_err(|e| Error::body("GetObject", e))?.into_bytes();
            sink.write_all(&data).await?;
            return Ok(data.len() as u64);
        }

        let ranges = part_ranges(size, self.part_size);
        debug!("Downloading {}/{} in {} ranged requests ({} bytes)", bucket, key, ranges.len(), size);

        let mut parts = stream::iter(ranges)
            .map(|(start, end)| self.get_range(bucket, key, start, end))
            .buffered(self.concurrency);

        let mut written = 0u64;
        while let Some(chunk) = parts.next().await {
            let chunk = chunk?;
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}

async fn read_part(body: &mut (dyn AsyncRead + Send + Unpin), part_size: u64) -> Result<Bytes> {
    let mut buf = Vec::with_capacity(part_size.min(64 * 1024 * 1024) as usize);
    (&mut *body).take(part_size).read_to_end(&mut buf).await?;
    Ok(Bytes::from(buf))
}

/// Inclusive byte ranges covering `size` bytes in `part_size` steps.
pub(crate) fn part_ranges(size: u64, part_size: u64) -> Vec<(u64, u64)> {
    let part_size = part_size.max(1);
    let mut ranges = Vec::new();
    let mut start = 0;
    while start < size {
        let end = (start + part_size).min(size) - 1;
        ranges.push((start, end));
        start = end + 1;
    }
    ranges
}
