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

#![allow(dead_code)]

//! In-memory S3 double used by the integration tests.
//!
//! Implements both [`ObjectApi`] and [`TransferEngine`], records every call,
//! and can be told to fail a named operation with a given error code.

use async_trait::async_trait;
use bytes::Bytes;
use rustfs_s3client::{
    ByteStream, Config, CopyObjectRequest, DeleteObjectsRequest, Error, ObjectApi, PresignMethod, PresignRequest,
    PutObjectRequest, Result, S3Client, TransferEngine, UploadRequest,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    failures: Mutex<HashMap<&'static str, String>>,
    calls: Mutex<Vec<String>>,
    unnamed_bucket_entries: Mutex<Vec<Option<String>>>,
    page_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_page_size(1000)
    }
}

impl MemoryStore {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            unnamed_bucket_entries: Mutex::new(Vec::new()),
            page_size,
        }
    }

    /// Make every subsequent `operation` call fail with `code`.
    pub fn fail(&self, operation: &'static str, code: &str) {
        self.failures.lock().unwrap().insert(operation, code.to_string());
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.failures.lock().unwrap().remove(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.starts_with(operation)).count()
    }

    /// Listing entries that carry an empty or missing name.
    pub fn add_bucket_entry(&self, name: Option<&str>) {
        self.unnamed_bucket_entries.lock().unwrap().push(name.map(String::from));
    }

    pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
        self.buckets.lock().unwrap().entry(bucket.to_string()).or_default().insert(
            key.to_string(),
            StoredObject {
                data: Bytes::copy_from_slice(data),
                content_type: None,
            },
        );
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets.lock().unwrap().get(bucket).and_then(|objects| objects.get(key).cloned())
    }

    pub fn object_count(&self, bucket: &str) -> usize {
        self.buckets.lock().unwrap().get(bucket).map(|objects| objects.len()).unwrap_or(0)
    }

    /// Serve a URL produced by [`ObjectApi::presign`], as the remote service would.
    pub fn fetch_presigned(&self, url: &str) -> Result<Bytes> {
        let (path, query) = url
            .strip_prefix("memory://")
            .and_then(|rest| rest.split_once('?'))
            .ok_or_else(|| Error::service("GetObject", "InvalidRequest", "malformed presigned url"))?;
        let (bucket, key) = path
            .split_once('/')
            .ok_or_else(|| Error::service("GetObject", "InvalidRequest", "malformed presigned url"))?;

        let expires_at: u128 = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("expires_at="))
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| Error::service("GetObject", "InvalidRequest", "missing expiry"))?;

        if now_millis() >= expires_at {
            return Err(Error::service("GetObject", "AccessDenied", "Request has expired"));
        }

        self.object(bucket, key)
            .map(|o| o.data)
            .ok_or_else(|| Error::service("GetObject", "NoSuchKey", "The specified key does not exist."))
    }

    fn record(&self, operation: &'static str, detail: String) -> Result<()> {
        self.calls.lock().unwrap().push(format!("{operation} {detail}"));
        match self.failures.lock().unwrap().get(operation) {
            Some(code) => Err(Error::service(operation, code.clone(), "injected failure")),
            None => Ok(()),
        }
    }

    fn store(&self, operation: &'static str, bucket: &str, key: &str, object: StoredObject) -> Result<()> {
        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::service(operation, "NoSuchBucket", "The specified bucket does not exist"))?;
        objects.insert(key.to_string(), object);
        Ok(())
    }

    fn load(&self, operation: &'static str, bucket: &str, key: &str) -> Result<StoredObject> {
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| Error::service(operation, "NoSuchBucket", "The specified bucket does not exist"))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::service(operation, "NoSuchKey", "The specified key does not exist."))
    }
}

fn now_millis() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_millis()
}

#[async_trait]
impl ObjectApi for MemoryStore {
    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        self.record("CreateBucket", bucket.to_string())?;
        let mut buckets = self.buckets.lock().unwrap();
        if buckets.contains_key(bucket) {
            return Err(Error::service(
                "CreateBucket",
                "BucketAlreadyOwnedByYou",
                "Your previous request to create the named bucket succeeded and you already own it.",
            ));
        }
        buckets.insert(bucket.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<()> {
        self.record("DeleteBucket", bucket.to_string())?;
        let mut buckets = self.buckets.lock().unwrap();
        match buckets.get(bucket) {
            None => Err(Error::service("DeleteBucket", "NoSuchBucket", "The specified bucket does not exist")),
            Some(objects) if !objects.is_empty() => Err(Error::service(
                "DeleteBucket",
                "BucketNotEmpty",
                "The bucket you tried to delete is not empty",
            )),
            Some(_) => {
                buckets.remove(bucket);
                Ok(())
            }
        }
    }

    async fn head_bucket(&self, bucket: &str) -> Result<()> {
        self.record("HeadBucket", bucket.to_string())?;
        if self.buckets.lock().unwrap().contains_key(bucket) {
            Ok(())
        } else {
            Err(Error::service("HeadBucket", "NotFound", "Not Found"))
        }
    }

    async fn wait_bucket_exists(&self, bucket: &str, timeout: Duration) -> Result<()> {
        self.record("WaitBucketExists", bucket.to_string())?;
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let exists = self.buckets.lock().unwrap().contains_key(bucket);
            if exists {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(Error::Timeout {
                    operation: "WaitBucketExists",
                    timeout,
                });
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn list_buckets(&self) -> Result<Vec<Option<String>>> {
        self.record("ListBuckets", String::new())?;
        let mut names: Vec<Option<String>> = self.buckets.lock().unwrap().keys().cloned().map(Some).collect();
        names.extend(self.unnamed_bucket_entries.lock().unwrap().iter().cloned());
        Ok(names)
    }

    async fn put_object(&self, request: PutObjectRequest) -> Result<()> {
        self.record("PutObject", format!("{}/{}", request.bucket, request.key))?;
        let data = request
            .body
            .collect()
            .await
            .map_err(|e| Error::body("PutObject", e))?
            .into_bytes();
        self.store(
            "PutObject",
            &request.bucket,
            &request.key,
            StoredObject {
                data,
                content_type: request.content_type,
            },
        )
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ByteStream> {
        self.record("GetObject", format!("{bucket}/{key}"))?;
        let object = self.load("GetObject", bucket, key)?;
        Ok(ByteStream::from(object.data))
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.record("DeleteObject", format!("{bucket}/{key}"))?;
        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(bucket)
            .ok_or_else(|| Error::service("DeleteObject", "NoSuchBucket", "The specified bucket does not exist"))?;
        objects.remove(key);
        Ok(())
    }

    async fn head_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.record("HeadObject", format!("{bucket}/{key}"))?;
        match self.object(bucket, key) {
            Some(_) => Ok(()),
            None => Err(Error::service("HeadObject", "NotFound", "Not Found")),
        }
    }

    async fn list_objects_page(&self, bucket: &str, prefix: &str) -> Result<Vec<Option<String>>> {
        self.record("ListObjectsV2", format!("{bucket} prefix={prefix}"))?;
        let buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| Error::service("ListObjectsV2", "NoSuchBucket", "The specified bucket does not exist"))?;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .take(self.page_size)
            .cloned()
            .map(Some)
            .collect())
    }

    async fn delete_objects(&self, request: DeleteObjectsRequest) -> Result<()> {
        self.record("DeleteObjects", format!("{} keys={}", request.bucket, request.keys.len()))?;
        let mut buckets = self.buckets.lock().unwrap();
        let objects = buckets
            .get_mut(&request.bucket)
            .ok_or_else(|| Error::service("DeleteObjects", "NoSuchBucket", "The specified bucket does not exist"))?;
        for key in &request.keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn copy_object(&self, request: CopyObjectRequest) -> Result<()> {
        self.record("CopyObject", format!("{} -> {}/{}", request.copy_source, request.bucket, request.key))?;
        let (src_bucket, src_key) = request
            .copy_source
            .split_once('/')
            .ok_or_else(|| Error::service("CopyObject", "InvalidArgument", "Copy Source must mention the source bucket and key"))?;
        let object = self.load("CopyObject", src_bucket, src_key)?;
        self.store("CopyObject", &request.bucket, &request.key, object)
    }

    async fn presign(&self, request: PresignRequest) -> Result<String> {
        self.record("Presign", format!("{} {}/{}", request.method, request.bucket, request.key))?;
        let expires_at = now_millis() + request.expires_in.as_millis();
        let method = match request.method {
            PresignMethod::Get => "GET",
            PresignMethod::Put => "PUT",
        };
        Ok(format!(
            "memory://{}/{}?method={method}&expires_at={expires_at}",
            request.bucket, request.key
        ))
    }
}

#[async_trait]
impl TransferEngine for MemoryStore {
    async fn upload_stream(&self, request: UploadRequest, body: &mut (dyn AsyncRead + Send + Unpin)) -> Result<()> {
        let mut data = Vec::new();
        body.read_to_end(&mut data).await?;
        self.record("UploadStream", format!("{}/{}", request.bucket, request.key))?;
        self.store(
            "UploadStream",
            &request.bucket,
            &request.key,
            StoredObject {
                data: Bytes::from(data),
                content_type: request.content_type,
            },
        )
    }

    async fn download_to_sink(&self, bucket: &str, key: &str, sink: &mut (dyn AsyncWrite + Send + Unpin)) -> Result<u64> {
        self.record("DownloadToSink", format!("{bucket}/{key}"))?;
        let object = self.load("DownloadToSink", bucket, key)?;
        sink.write_all(&object.data).await?;
        Ok(object.data.len() as u64)
    }
}

pub fn test_config() -> Config {
    Config::new("http://127.0.0.1:9000", "rustfsadmin", "rustfsadmin")
}

pub fn memory_client() -> (S3Client, Arc<MemoryStore>) {
    memory_client_with(MemoryStore::default())
}

pub fn memory_client_with(store: MemoryStore) -> (S3Client, Arc<MemoryStore>) {
    let store = Arc::new(store);
    let client = S3Client::with_backend(test_config(), store.clone(), store.clone()).unwrap();
    (client, store)
}
