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

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rustfs_s3client::{Config, DEFAULT_CONCURRENCY, DEFAULT_PART_SIZE, TransferConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Command line for the S3 client
#[derive(Parser, Debug, Clone)]
#[command(
    name = "rustfs-s3client",
    about = "Bucket, object and file operations against S3-compatible storage",
    version,
    long_about = r#"
rustfs-s3client - bucket, object and file operations against S3-compatible storage

ENVIRONMENT VARIABLES:
  Connection options can also be set via environment variables.
  Command-line arguments take precedence over environment variables.

EXAMPLES:
  # Upload a file to a local RustFS server
  rustfs-s3client --access-key-id rustfsadmin --secret-access-key rustfsadmin put ./report.pdf reports

  # Using environment variables
  export AWS_ENDPOINT_URL=http://localhost:9000
  export AWS_ACCESS_KEY_ID=rustfsadmin
  export AWS_SECRET_ACCESS_KEY=rustfsadmin
  rustfs-s3client ls reports 2024/
  rustfs-s3client presign get reports 2024/report.pdf --expires 1h
"#
)]
pub struct Cli {
    /// S3 endpoint URL
    #[arg(
        long = "endpoint-url",
        env = "AWS_ENDPOINT_URL",
        default_value = "http://localhost:9000",
        help = "S3-compatible endpoint URL (RustFS, MinIO, AWS, ...)"
    )]
    pub endpoint_url: String,

    /// Signing region
    #[arg(long = "region", env = "AWS_REGION", help = "Region used for request signing (default: us-east-1)")]
    pub region: Option<String>,

    #[arg(long = "access-key-id", env = "AWS_ACCESS_KEY_ID", help = "Access key ID")]
    pub access_key_id: Option<String>,

    #[arg(long = "secret-access-key", env = "AWS_SECRET_ACCESS_KEY", help = "Secret access key")]
    pub secret_access_key: Option<String>,

    /// Multipart part size in bytes
    #[arg(long = "part-size", default_value_t = DEFAULT_PART_SIZE, help = "Part size in bytes for multipart transfers")]
    pub part_size: u64,

    #[arg(long = "concurrency", default_value_t = DEFAULT_CONCURRENCY, help = "Parts transferred in parallel")]
    pub concurrency: usize,

    #[arg(
        long = "log-level",
        env = "RUST_LOG",
        default_value = "rustfs_s3client=info",
        help = "Log level configuration"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a bucket
    Mb { bucket: String },
    /// Delete a bucket
    Rb {
        bucket: String,
        /// Empty the bucket first (one listing page)
        #[arg(long)]
        force: bool,
    },
    /// List buckets
    Buckets,
    /// Check whether a bucket exists
    BucketExists { bucket: String },
    /// Wait for a bucket to appear
    WaitBucket {
        bucket: String,
        #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
        timeout: Duration,
    },
    /// List object keys (first page only)
    Ls {
        bucket: String,
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Upload a local file
    Put {
        local_path: PathBuf,
        bucket: String,
        /// Object key, defaults to the file name
        key: Option<String>,
    },
    /// Download an object to a local file
    Get { bucket: String, key: String, local_path: PathBuf },
    /// Write an object to stdout
    Cat { bucket: String, key: String },
    /// Delete an object
    Rm { bucket: String, key: String },
    /// Delete several objects with one request
    RmMany {
        bucket: String,
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Check whether an object exists
    Exists { bucket: String, key: String },
    /// Delete every object returned by one listing page
    Empty { bucket: String },
    /// Server-side copy
    Cp {
        src_bucket: String,
        src_key: String,
        dst_bucket: String,
        dst_key: String,
    },
    /// Copy then delete within a bucket (not atomic)
    Mv { bucket: String, src_key: String, dst_key: String },
    /// Print a presigned URL
    Presign {
        #[arg(value_enum)]
        method: Method,
        bucket: String,
        key: String,
        #[arg(long, default_value = "15m", value_parser = humantime::parse_duration)]
        expires: Duration,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

impl Cli {
    /// Build the client configuration, rejecting missing credentials.
    pub fn to_config(&self) -> Result<Config> {
        let Some(access_key_id) = &self.access_key_id else {
            anyhow::bail!("Access Key ID is required. Set via --access-key-id or AWS_ACCESS_KEY_ID environment variable");
        };
        let Some(secret_access_key) = &self.secret_access_key else {
            anyhow::bail!(
                "Secret Access Key is required. Set via --secret-access-key or AWS_SECRET_ACCESS_KEY environment variable"
            );
        };

        Ok(Config::new(&self.endpoint_url, access_key_id, secret_access_key)
            .with_region(self.region.clone().unwrap_or_default())
            .with_transfer(TransferConfig {
                part_size: self.part_size,
                concurrency: self.concurrency,
            }))
    }

    /// Log current configuration (without sensitive data)
    pub fn log_configuration(&self, config: &Config) {
        info!("Configuration:");
        info!("  Endpoint: {}", config.endpoint);
        info!("  Region: {}", config.region);
        info!("  Access Key ID: {}", config.masked_access_key());
        info!("  Secret Access Key: [HIDDEN]");
        info!("  Part Size: {} bytes, Concurrency: {}", config.transfer.part_size, config.transfer.concurrency);
        info!("  Log Level: {}", self.log_level);
    }
}
