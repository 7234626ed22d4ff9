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

//! Client configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Region used when the configuration leaves it empty.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Smallest part size S3 accepts for every part but the last one.
pub const MIN_PART_SIZE: u64 = 5 * 1024 * 1024;

/// Upper bound on parts in a single multipart upload.
pub const MAX_UPLOAD_PARTS: u64 = 10_000;

pub const DEFAULT_PART_SIZE: u64 = MIN_PART_SIZE;
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Connection settings for an S3-compatible endpoint
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Base endpoint, e.g. `http://localhost:9000`
    pub endpoint: String,
    /// Signing region; empty means [`DEFAULT_REGION`]
    #[serde(default)]
    pub region: String,
    pub access_key_id: String,
    #[serde(skip_serializing, default)]
    pub secret_access_key: String,
    /// Multipart upload and ranged download tuning
    #[serde(default)]
    pub transfer: TransferConfig,
}

/// Chunking parameters for file transfers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransferConfig {
    /// Bytes per multipart part / ranged GET
    pub part_size: u64,
    /// Parts in flight at once
    pub concurrency: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl Config {
    pub fn new(endpoint: impl Into<String>, access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            region: String::new(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            transfer: TransferConfig::default(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_transfer(mut self, transfer: TransferConfig) -> Self {
        self.transfer = transfer;
        self
    }

    /// Resolve defaults and validate the settings.
    ///
    /// Returns a copy with the region filled in. Nothing here touches the network.
    pub fn normalize(&self) -> Result<Config> {
        let mut cfg = self.clone();

        cfg.region = cfg.region.trim().to_string();
        if cfg.region.is_empty() {
            cfg.region = DEFAULT_REGION.to_string();
        }

        if cfg.endpoint.trim().is_empty() {
            return Err(Error::config("endpoint is required"));
        }
        let url = Url::parse(&cfg.endpoint).map_err(|e| Error::config(format!("invalid endpoint {:?}: {e}", cfg.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "endpoint scheme must be http or https, got {:?}",
                url.scheme()
            )));
        }

        if cfg.access_key_id.is_empty() {
            return Err(Error::config("access key id is required"));
        }
        if cfg.secret_access_key.is_empty() {
            return Err(Error::config("secret access key is required"));
        }

        if cfg.transfer.part_size < MIN_PART_SIZE {
            return Err(Error::config(format!(
                "part size {} is below the S3 minimum of {MIN_PART_SIZE} bytes",
                cfg.transfer.part_size
            )));
        }
        if cfg.transfer.concurrency == 0 {
            return Err(Error::config("transfer concurrency must be at least 1"));
        }

        Ok(cfg)
    }

    /// Access key with the middle hidden, for log output.
    pub fn masked_access_key(&self) -> String {
        let key = &self.access_key_id;
        if key.len() > 8 && key.is_ascii() {
            format!("{}...{}", &key[..4], &key[key.len() - 4..])
        } else {
            "*".repeat(key.chars().count())
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key_id", &self.masked_access_key())
            .field("secret_access_key", &"[HIDDEN]")
            .field("transfer", &self.transfer)
            .finish()
    }
}
