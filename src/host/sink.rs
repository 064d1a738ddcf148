// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use async_trait::async_trait;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use crate::host::traits::BlobSink;
use crate::utils::{sanitize_filename, unique_path};

/// Writes downloads into a directory, never overwriting an existing file
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

/// Move `temp` to `dir/filename`, or to a UUID-prefixed name if that file exists
///
/// Both moves refuse to replace an existing file, so a file created concurrently
/// is never clobbered.
fn persist_new(temp: NamedTempFile, dir: &Path, filename: &str) -> anyhow::Result<PathBuf> {
    let target = dir.join(filename);
    match temp.persist_noclobber(&target) {
        Ok(_) => Ok(target),
        Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
            let fallback = unique_path(dir, filename);
            e.file
                .persist_noclobber(&fallback)
                .with_context(|| format!("Failed to save {}", fallback.display()))?;
            Ok(fallback)
        }
        Err(e) => Err(anyhow::Error::new(e.error).context(format!("Failed to save {}", target.display()))),
    }
}

#[async_trait]
impl BlobSink for DirectorySink {
    async fn save(&self, filename: &str, bytes: Vec<u8>, mime_type: &str) -> anyhow::Result<PathBuf> {
        let filename = sanitize_filename(filename)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create download directory {}", self.dir.display()))?;

        let dir = self.dir.clone();
        let size = bytes.len();

        // Write to a temp file in the same directory, then move it into place
        let path = tokio::task::spawn_blocking(move || {
            let mut temp = NamedTempFile::new_in(&dir)
                .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
            temp.write_all(&bytes)?;
            temp.flush()?;

            persist_new(temp, &dir, &filename)
        })
        .await
        .context("Download write task panicked")??;

        info!(path = %path.display(), bytes = size, mime_type = %mime_type, "Saved download");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_writes_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path().to_path_buf());

        let path = sink.save("images.zip", b"zip bytes".to_vec(), "application/zip").await.unwrap();

        assert_eq!(path, temp_dir.path().join("images.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"zip bytes");
    }

    #[tokio::test]
    async fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("downloads").join("today");
        let sink = DirectorySink::new(nested.clone());

        let path = sink.save("a.jpg", b"jpeg".to_vec(), "image/jpeg").await.unwrap();
        assert!(path.starts_with(&nested));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_save_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path().to_path_buf());

        let first = sink.save("images.zip", b"first".to_vec(), "application/zip").await.unwrap();
        let second = sink.save("images.zip", b"second".to_vec(), "application/zip").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), b"first");
        assert_eq!(std::fs::read(&second).unwrap(), b"second");
    }

    #[test]
    fn test_persist_new_keeps_file_that_appeared_first() {
        let temp_dir = TempDir::new().unwrap();
        let existing = temp_dir.path().join("images.zip");
        std::fs::write(&existing, b"already here").unwrap();

        let mut temp = NamedTempFile::new_in(temp_dir.path()).unwrap();
        temp.write_all(b"new").unwrap();
        let path = persist_new(temp, temp_dir.path(), "images.zip").unwrap();

        assert_ne!(path, existing);
        assert!(path.file_name().unwrap().to_str().unwrap().ends_with("-images.zip"));
        assert_eq!(std::fs::read(&existing).unwrap(), b"already here");
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_save_strips_path_components() {
        let temp_dir = TempDir::new().unwrap();
        let sink = DirectorySink::new(temp_dir.path().to_path_buf());

        let path = sink.save("../../escape.zip", b"x".to_vec(), "application/zip").await.unwrap();
        assert_eq!(path, temp_dir.path().join("escape.zip"));
    }
}
