// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::path::PathBuf;

/// Asks the user before a destructive operation
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Returns true when the user agreed
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Receives downloaded payloads (the archive of a batch download, a single image)
#[async_trait]
pub trait BlobSink: Send + Sync {
    /// Store `bytes` under `filename` and return where it ended up
    async fn save(&self, filename: &str, bytes: Vec<u8>, mime_type: &str) -> anyhow::Result<PathBuf>;
}
