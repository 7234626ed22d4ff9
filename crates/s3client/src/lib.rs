#![cfg_attr(not(test), deny(clippy::unwrap_used))]
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

//! # RustFS S3 client
//!
//! A small convenience layer over `aws-sdk-s3` for S3-compatible endpoints
//! (RustFS, MinIO, AWS S3): bucket lifecycle, object CRUD, bulk delete,
//! file upload/download with multipart chunking, server-side copy/move and
//! presigned URLs.
//!
//! ```rust,ignore
//! use rustfs_s3client::{Config, S3Client};
//!
//! let client = S3Client::new(Config::new("http://localhost:9000", "rustfsadmin", "rustfsadmin"))?;
//! client.create_bucket("photos").await?;
//! client.upload_file("photos", "2024/cat.jpg", "/tmp/cat.jpg").await?;
//! assert!(client.object_exists("photos", "2024/cat.jpg").await?);
//! ```
//!
//! Requests are issued through the [`ObjectApi`] and [`TransferEngine`]
//! traits, so the client can run against any implementation of them.

mod api;
mod client;
mod config;
mod content_type;
mod error;
mod sdk;
mod transfer;

pub use api::{CopyObjectRequest, DeleteObjectsRequest, ObjectApi, PresignMethod, PresignRequest, PutObjectRequest};
pub use client::S3Client;
pub use config::{Config, DEFAULT_CONCURRENCY, DEFAULT_PART_SIZE, DEFAULT_REGION, MAX_UPLOAD_PARTS, MIN_PART_SIZE, TransferConfig};
pub use content_type::{DEFAULT_CONTENT_TYPE, content_type_for_extension, detect_content_type};
pub use error::{Error, NOT_FOUND_CODE, Result, is_not_found_code};
pub use sdk::{SdkObjectApi, build_sdk_client};
pub use transfer::{SdkTransfer, TransferEngine, UploadRequest};

pub use aws_sdk_s3::primitives::ByteStream;
