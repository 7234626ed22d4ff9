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

//! Request-level access to an S3-compatible service.
//!
//! [`ObjectApi`] issues exactly one remote call per method. The production
//! implementation is [`SdkObjectApi`](crate::SdkObjectApi); tests plug in an
//! in-memory double.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// HTTP method a presigned URL is valid for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresignMethod {
    Get,
    Put,
}

impl fmt::Display for PresignMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresignMethod::Get => write!(f, "GET"),
            PresignMethod::Put => write!(f, "PUT"),
        }
    }
}

#[derive(Debug)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: ByteStream,
    pub content_type: Option<String>,
}

/// Server-side copy. `copy_source` is the `"{bucket}/{key}"` path of the source object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyObjectRequest {
    pub copy_source: String,
    pub bucket: String,
    pub key: String,
}

impl CopyObjectRequest {
    pub fn new(src_bucket: &str, src_key: &str, dst_bucket: &str, dst_key: &str) -> Self {
        Self {
            copy_source: format!("{src_bucket}/{src_key}"),
            bucket: dst_bucket.to_string(),
            key: dst_key.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteObjectsRequest {
    pub bucket: String,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignRequest {
    pub method: PresignMethod,
    pub bucket: String,
    pub key: String,
    pub expires_in: Duration,
}

#[async_trait]
pub trait ObjectApi: Send + Sync + fmt::Debug {
    async fn create_bucket(&self, bucket: &str) -> Result<()>;

    async fn delete_bucket(&self, bucket: &str) -> Result<()>;

    /// Metadata probe; a missing bucket surfaces as a `NotFound` service error.
    async fn head_bucket(&self, bucket: &str) -> Result<()>;

    /// Block until the bucket is visible or `timeout` elapses ([`Error::Timeout`](crate::Error::Timeout)).
    async fn wait_bucket_exists(&self, bucket: &str, timeout: Duration) -> Result<()>;

    /// Bucket names in service order. Entries the service returned without a name are `None`.
    async fn list_buckets(&self) -> Result<Vec<Option<String>>>;

    async fn put_object(&self, request: PutObjectRequest) -> Result<()>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream>;

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// Metadata probe; a missing key surfaces as a `NotFound` service error.
    async fn head_object(&self, bucket: &str, key: &str) -> Result<()>;

    /// First page of a ListObjectsV2 listing. Continuation tokens are never followed.
    async fn list_objects_page(&self, bucket: &str, prefix: &str) -> Result<Vec<Option<String>>>;

    async fn delete_objects(&self, request: DeleteObjectsRequest) -> Result<()>;

    async fn copy_object(&self, request: CopyObjectRequest) -> Result<()>;

    /// Signed URL for a single request, valid for `expires_in` from now.
    async fn presign(&self, request: PresignRequest) -> Result<String>;
}
