// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Idle,
    Busy,
    Success,
    Error,
}

/// Outcome of the most recent operation, as shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl OperationStatus {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn idle() -> Self {
        Self::new(StatusKind::Idle, String::new())
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl Default for OperationStatus {
    fn default() -> Self {
        Self::idle()
    }
}

/// A local file waiting to be uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Name sent as the multipart filename
    pub name: String,

    /// Content length in bytes
    pub size_bytes: u64,

    /// Raw file content
    pub content: Vec<u8>,
}

impl StagedFile {
    pub fn new(name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: content.len() as u64,
            content,
        }
    }

    /// Read a file from disk into a staged upload candidate
    ///
    /// The file name is sent as-is; the server decides what it accepts.
    pub async fn from_path(path: &Path) -> anyhow::Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Path has no UTF-8 file name: {}", path.display()))?
            .to_string();

        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Ok(Self::new(name, content))
    }

    /// Size in megabytes, for display
    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0 / 1024.0
    }
}

/// Counts reported by the batch upload and batch delete endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub success_count: u64,
    pub total_files: u64,
    #[serde(default)]
    pub failed_count: Option<u64>,
}

impl BatchResult {
    pub fn failed(&self) -> u64 {
        self.failed_count
            .unwrap_or_else(|| self.total_files.saturating_sub(self.success_count))
    }
}

/// Batch delete response: the counts plus the per-file outcome when the server reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeleteResult {
    #[serde(flatten)]
    pub summary: BatchResult,
    #[serde(default)]
    pub results: BTreeMap<String, bool>,
}

impl BatchDeleteResult {
    /// Filenames the server confirmed as deleted
    pub fn deleted(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|(_, deleted)| **deleted)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

/// Per-file metadata from the batch info endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInfo {
    pub filename: String,
    pub exists: bool,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
