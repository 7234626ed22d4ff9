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

use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::api::{CopyObjectRequest, DeleteObjectsRequest, ObjectApi, PresignMethod, PresignRequest, PutObjectRequest};
use crate::config::Config;
use crate::content_type::detect_content_type;
use crate::error::{Error, Result};
use crate::sdk::{SdkObjectApi, build_sdk_client};
use crate::transfer::{SdkTransfer, TransferEngine, UploadRequest};

/// High-level client for an S3-compatible endpoint.
///
/// Cheap to clone and safe to share between tasks: it only holds read-only
/// handles. Dropping a returned future cancels the request in flight.
#[derive(Debug, Clone)]
pub struct S3Client {
    api: Arc<dyn ObjectApi>,
    transfer: Arc<dyn TransferEngine>,
    config: Config,
}

impl S3Client {
    /// Build a client backed by the AWS SDK. No request is sent here.
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing S3 client from configuration");

        let config = config.normalize()?;
        debug!("Using region: {}", config.region);
        debug!("Using endpoint: {}", config.endpoint);

        let client = build_sdk_client(&config);
        let api = Arc::new(SdkObjectApi::new(client.clone()));
        let transfer = Arc::new(SdkTransfer::new(client, config.transfer));

        info!("S3 client initialized successfully");
        Ok(Self { api, transfer, config })
    }

    /// Build a client around caller-provided collaborators.
    pub fn with_backend(config: Config, api: Arc<dyn ObjectApi>, transfer: Arc<dyn TransferEngine>) -> Result<Self> {
        let config = config.normalize()?;
        Ok(Self { api, transfer, config })
    }

    /// The normalized configuration (region resolved).
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn create_bucket(&self, name: &str) -> Result<()> {
        debug!("Creating bucket {}", name);
        self.api.create_bucket(name).await
    }

    pub async fn delete_bucket(&self, name: &str) -> Result<()> {
        debug!("Deleting bucket {}", name);
        self.api.delete_bucket(name).await
    }

    /// `Ok(false)` only when the service answers `NotFound`; every other failure is an error.
    pub async fn bucket_exists(&self, name: &str) -> Result<bool> {
        exists(self.api.head_bucket(name).await)
    }

    /// Poll until the bucket exists, failing with [`Error::Timeout`] once `timeout` has elapsed.
    pub async fn wait_bucket_exists(&self, name: &str, timeout: Duration) -> Result<()> {
        debug!("Waiting up to {:?} for bucket {}", timeout, name);
        self.api.wait_bucket_exists(name, timeout).await
    }

    /// Bucket names in the order the service returns them.
    pub async fn list_buckets(&self) -> Result<Vec<String>> {
        debug!("Listing buckets");
        let buckets = self.api.list_buckets().await?;
        Ok(non_empty(buckets))
    }

    /// Single request upload. Use [`upload_file`](Self::upload_file) for large content.
    pub async fn put_object(&self, bucket: &str, key: &str, body: ByteStream, content_type: &str) -> Result<()> {
        debug!("Putting object {}/{}", bucket, key);
        self.api
            .put_object(PutObjectRequest {
                bucket: bucket.to_string(),
                key: key.to_string(),
                body,
                content_type: Some(content_type.to_string()),
            })
            .await
    }

    pub async fn put_object_bytes(&self, bucket: &str, key: &str, data: impl Into<Bytes>, content_type: &str) -> Result<()> {
        self.put_object(bucket, key, ByteStream::from(data.into()), content_type).await
    }

    /// Open the object for reading. The caller owns the stream; dropping it releases the connection.
    pub async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        debug!("Getting object {}/{}", bucket, key);
        self.api.get_object(bucket, key).await
    }

    pub async fn get_object_bytes(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let body = self.get_object(bucket, key).await?;
        let data = body.collect().await.map_err(|e| Error::body("GetObject", e))?;
        Ok(data.into_bytes())
    }

    /// Whether deleting a missing key is an error is up to the service.
    pub async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        debug!("Deleting object {}/{}", bucket, key);
        self.api.delete_object(bucket, key).await
    }

    pub async fn object_exists(&self, bucket: &str, key: &str) -> Result<bool> {
        exists(self.api.head_object(bucket, key).await)
    }

    /// Keys under `prefix`.
    ///
    /// Only the first listing page is read (1000 keys on most services);
    /// larger result sets are silently cut off.
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        debug!("Listing objects in {} with prefix {:?}", bucket, prefix);
        let keys = self.api.list_objects_page(bucket, prefix).await?;
        Ok(non_empty(keys))
    }

    /// Delete `keys` with one bulk request. An empty list is still sent.
    ///
    /// Any error fails the whole call; per-key failures inside a successful
    /// response are not reported.
    pub async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<()> {
        debug!("Deleting {} objects from {}", keys.len(), bucket);
        self.api
            .delete_objects(DeleteObjectsRequest {
                bucket: bucket.to_string(),
                keys: keys.to_vec(),
            })
            .await
    }

    /// Delete the objects returned by one listing page.
    ///
    /// Buckets holding more than a page of objects are not fully emptied;
    /// call again until [`list_objects`](Self::list_objects) comes back empty.
    pub async fn empty_bucket(&self, bucket: &str) -> Result<()> {
        let keys = self.list_objects(bucket, "").await?;
        if keys.is_empty() {
            return Ok(());
        }
        self.delete_objects(bucket, &keys).await
    }

    /// Upload a local file, splitting it into parts when it is large.
    ///
    /// The content type comes from the file extension.
    pub async fn upload_file(&self, bucket: &str, key: &str, local_path: impl AsRef<Path>) -> Result<()> {
        let path = local_path.as_ref();
        let mut file = File::open(path).await?;

        let request = UploadRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            content_type: Some(detect_content_type(path)),
        };
        debug!("Uploading {} to {}/{}", path.display(), bucket, key);

        self.transfer.upload_stream(request, &mut file).await
    }

    /// Download an object into a local file, creating or truncating it.
    ///
    /// On failure the file may hold partial content.
    pub async fn download_file(&self, bucket: &str, key: &str, local_path: impl AsRef<Path>) -> Result<()> {
        let path = local_path.as_ref();
        let mut file = File::create(path).await?;

        debug!("Downloading {}/{} to {}", bucket, key, path.display());
        let written = self.transfer.download_to_sink(bucket, key, &mut file).await?;
        file.flush().await?;

        debug!("Downloaded {} bytes to {}", written, path.display());
        Ok(())
    }

    /// Server-side copy, possibly across buckets.
    pub async fn copy_object(&self, src_bucket: &str, src_key: &str, dst_bucket: &str, dst_key: &str) -> Result<()> {
        debug!("Copying {}/{} to {}/{}", src_bucket, src_key, dst_bucket, dst_key);
        self.api
            .copy_object(CopyObjectRequest::new(src_bucket, src_key, dst_bucket, dst_key))
            .await
    }

    /// Copy `src_key` to `dst_key` in the same bucket, then delete `src_key`.
    ///
    /// Not atomic: if the delete fails the object stays under both keys and
    /// nothing is rolled back. A failed copy skips the delete.
    pub async fn move_object(&self, bucket: &str, src_key: &str, dst_key: &str) -> Result<()> {
        self.copy_object(bucket, src_key, bucket, dst_key).await?;
        self.delete_object(bucket, src_key).await
    }

    pub async fn presign_get_object(&self, bucket: &str, key: &str, expiry: Duration) -> Result<String> {
        self.presign(PresignMethod::Get, bucket, key, expiry).await
    }

    pub async fn presign_put_object(&self, bucket: &str, key: &str, expiry: Duration) -> Result<String> {
        self.presign(PresignMethod::Put, bucket, key, expiry).await
    }

    async fn presign(&self, method: PresignMethod, bucket: &str, key: &str, expiry: Duration) -> Result<String> {
        debug!("Presigning {} {}/{} for {:?}", method, bucket, key, expiry);
        self.api
            .presign(PresignRequest {
                method,
                bucket: bucket.to_string(),
                key: key.to_string(),
                expires_in: expiry,
            })
            .await
    }
}

fn exists(probe: Result<()>) -> Result<bool> {
    match probe {
        Ok(()) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}

fn non_empty(names: Vec<Option<String>>) -> Vec<String> {
    names.into_iter().flatten().filter(|name| !name.is_empty()).collect()
}
