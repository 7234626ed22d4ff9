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

use std::path::Path;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// Data formats mime_guess does not know about.
const EXTRA_TYPES: &[(&str, &str)] = &[
    ("parquet", "application/vnd.apache.parquet"),
    ("avro", "application/avro"),
    ("orc", "application/orc"),
    ("feather", "application/feather"),
    ("arrow", "application/arrow"),
    ("ndjson", "application/x-ndjson"),
];

/// Content type for a file extension (without the dot), case-insensitive.
pub fn content_type_for_extension(ext: &str) -> String {
    let ext = ext.trim_start_matches('.').to_ascii_lowercase();
    if ext.is_empty() {
        return DEFAULT_CONTENT_TYPE.to_string();
    }

    if let Some((_, mime)) = EXTRA_TYPES.iter().find(|(known, _)| *known == ext) {
        return (*mime).to_string();
    }

    mime_guess::from_ext(&ext).first_or_octet_stream().to_string()
}

/// Content type for a local path, based on its extension.
pub fn detect_content_type(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(content_type_for_extension)
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}
