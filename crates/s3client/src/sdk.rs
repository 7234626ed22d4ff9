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

use async_trait::async_trait;
use aws_sdk_s3::client::Waiters;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::waiters::bucket_exists::WaitUntilBucketExistsError;
use aws_sdk_s3::{Client, Config as S3Config};
use std::time::Duration;
use tracing::{debug, warn};

use crate::api::{CopyObjectRequest, DeleteObjectsRequest, ObjectApi, PresignMethod, PresignRequest, PutObjectRequest};
use crate::config::Config;
use crate::error::{Error, Result};

const CREDENTIALS_PROVIDER: &str = "rustfs-s3client";

/// Build an SDK client for a normalized [`Config`].
///
/// Path-style addressing is always on: RustFS, MinIO and most other
/// non-AWS endpoints do not serve virtual-hosted bucket names.
pub fn build_sdk_client(config: &Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        CREDENTIALS_PROVIDER,
    );

    let s3_config = S3Config::builder()
        .credentials_provider(credentials)
        .region(Region::new(config.region.clone()))
        .endpoint_url(config.endpoint.clone())
        .force_path_style(true)
        .behavior_version(BehaviorVersion::latest())
        .build();

    Client::from_conf(s3_config)
}

/// [`ObjectApi`] backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkObjectApi {
    client: Client,
}

impl SdkObjectApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectApi for SdkObjectApi {
    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::from_sdk("CreateBucket", e))?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::from_sdk("DeleteBucket", e))?;
        Ok(())
    }

    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| Error::from_sdk("HeadBucket", e))?;
        Ok(())
    }

    async fn wait_bucket_exists(&self, bucket: &str, timeout: Duration) -> Result<()> {
        match self.client.wait_until_bucket_exists().bucket(bucket).wait(timeout).await {
            Ok(_) => Ok(()),
            Err(WaitUntilBucketExistsError::ExceededMaxWait(_)) => Err(Error::Timeout {
                operation: "WaitBucketExists",
                timeout,
            }),
            Err(e) => Err(Error::from_waiter("WaitBucketExists", e)),
        }
    }

    async fn list_buckets(&self) -> Result<Vec<Option<String>>> {
        let response = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| Error::from_sdk("ListBuckets", e))?;

        Ok(response.buckets().iter().map(|b| b.name().map(String::from)).collect())
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        self.client
            .put_object()
            .bucket(request.bucket)
            .key(request.key)
            .body(request.body)
            .set_content_type(request.content_type)
            .send()
            .await
            .map_err(|e| Error::from_sdk("PutObject", e))?;
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("GetObject", e))?;
        Ok(output.body)
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("DeleteObject", e))?;
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("HeadObject", e))?;
        Ok(())
    }

    async fn list_objects_page(&self, bucket: &str, prefix: &str) -> Result<Vec<Option<String>>> {
        let response = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .send()
            .await
            .map_err(|e| Error::from_sdk("ListObjectsV2", e))?;

        if response.is_truncated().unwrap_or(false) {
            debug!("Listing of {}/{} is truncated, only the first page is returned", bucket, prefix);
        }

        Ok(response.contents().iter().map(|o| o.key().map(String::from)).collect())
    }

    async fn delete_objects(&self, request: DeleteObjectsRequest) -> Result<()> {
        let objects = request
            .keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::invalid_argument(format!("invalid object identifier: {e}")))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| Error::invalid_argument(format!("invalid delete request: {e}")))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&request.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| Error::from_sdk("DeleteObjects", e))?;

        if !output.errors().is_empty() {
            warn!(
                "DeleteObjects on bucket {} reported {} per-key errors",
                request.bucket,
                output.errors().len()
            );
        }
        Ok(())
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> Result<()> {
        self.client
            .copy_object()
            .bucket(request.bucket)
            .copy_source(request.copy_source)
            .key(request.key)
            .send()
            .await
            .map_err(|e| Error::from_sdk("CopyObject", e))?;
        Ok(())
    }

    async fn presign(&self, request: PresignRequest) -> Result<String> {
        let presigning = PresigningConfig::expires_in(request.expires_in).map_err(|e| Error::Presign { message: e.to_string() })?;

        let presigned = match request.method {
            PresignMethod::Get => self
                .client
                .get_object()
                .bucket(request.bucket)
                .key(request.key)
                .presigned(presigning)
                .await
                .map_err(|e| Error::from_sdk("PresignGetObject", e))?,
            PresignMethod::Put => self
                .client
                .put_object()
                .bucket(request.bucket)
                .key(request.key)
                .presigned(presigning)
                .await
                .map_err(|e| Error::from_sdk("PresignPutObject", e))?,
        };

        Ok(presigned.uri().to_string())
    }
}
