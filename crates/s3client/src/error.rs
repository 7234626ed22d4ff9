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

//! Client error types and remote error classification

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::time::Duration;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Remote error code reported for a missing bucket or key on HEAD requests.
pub const NOT_FOUND_CODE: &str = "NotFound";

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Client operation errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Configuration rejected while building the client
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error returned by the storage service or the SDK while issuing a request
    #[error("{operation} failed: {}", describe_remote(.code, .message, .source))]
    Service {
        operation: &'static str,
        code: Option<String>,
        message: Option<String>,
        #[source]
        source: BoxError,
    },

    /// Local file system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while reading a response body
    #[error("{operation} failed while reading the response body: {source}")]
    Body {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// A waiter gave up before the expected state was observed
    #[error("{operation} timed out after {timeout:?}")]
    Timeout { operation: &'static str, timeout: Duration },

    /// Presigning configuration rejected (for example an expiry above seven days)
    #[error("Presign error: {message}")]
    Presign { message: String },

    /// Input that cannot be expressed as a valid request
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

fn describe_remote(code: &Option<String>, message: &Option<String>, source: &BoxError) -> String {
    match (code, message) {
        (Some(code), Some(message)) => format!("{code}: {message}"),
        (Some(code), None) => code.clone(),
        (None, Some(message)) => message.clone(),
        (None, None) => source.to_string(),
    }
}

/// Reports whether a remote error code means "no such bucket/key".
///
/// This is the only code the client reinterprets; every other code is surfaced as-is.
pub fn is_not_found_code(code: &str) -> bool {
    code == NOT_FOUND_CODE
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Create a service error carrying a remote error code.
    ///
    /// Mostly useful for alternative [`ObjectApi`](crate::ObjectApi) implementations and test doubles.
    pub fn service(operation: &'static str, code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        Self::Service {
            operation,
            source: format!("{code}: {message}").into(),
            code: Some(code),
            message: Some(message),
        }
    }

    /// Convert an SDK error, keeping the remote code and message.
    pub fn from_sdk<E, R>(operation: &'static str, err: SdkError<E, R>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
        R: std::fmt::Debug + Send + Sync + 'static,
    {
        let code = err.code().map(String::from);
        let message = err.message().map(String::from);
        Self::Service {
            operation,
            code,
            message,
            source: Box::new(err),
        }
    }

    /// Convert a waiter failure other than a timeout.
    ///
    /// The remote code and message of the failed poll are kept; without a
    /// message the full error chain is used instead.
    pub fn from_waiter<E>(operation: &'static str, err: E) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let code = err.code().map(String::from);
        let message = err
            .message()
            .map(String::from)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string());
        Self::Service {
            operation,
            code,
            message: Some(message),
            source: Box::new(err),
        }
    }

    /// Wrap a failure that happened while draining a response stream.
    pub fn body(operation: &'static str, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Body {
            operation,
            source: Box::new(err),
        }
    }

    /// Remote error code, if this error came from the storage service.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// True when the storage service reported the target as missing.
    pub fn is_not_found(&self) -> bool {
        self.code().is_some_and(is_not_found_code)
    }
}
