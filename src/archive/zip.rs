// SPDX-License-Identifier: GPL-3.0-only
use anyhow::Context;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::PathBuf;
use tracing::{info, warn};
use zip::ZipArchive;

/// Reads and unpacks the archives produced by batch downloads
pub struct ZipExtractor {
    max_total_bytes: u64,
    max_file_count: usize,
}

impl ZipExtractor {
    pub fn new(max_total_bytes: u64, max_file_count: usize) -> Self {
        Self {
            max_total_bytes,
            max_file_count,
        }
    }

    /// Names of the files contained in the archive, directories excluded
    pub async fn list_entries(&self, archive_path: PathBuf) -> anyhow::Result<Vec<String>> {
        tokio::task::spawn_blocking(move || {
            let file = File::open(&archive_path)
                .with_context(|| format!("Failed to open archive {}", archive_path.display()))?;
            let archive = ZipArchive::new(BufReader::new(file))
                .with_context(|| format!("Not a zip archive: {}", archive_path.display()))?;

            let mut names: Vec<String> = archive
                .file_names()
                .filter(|name| !name.ends_with('/'))
                .map(str::to_string)
                .collect();
            names.sort();
            Ok::<Vec<String>, anyhow::Error>(names)
        })
        .await
        .context("Archive listing task panicked")?
    }

    /// Extract the archive into `dest` and return the number of files written
    ///
    /// Entries whose names would escape `dest` are skipped.
    pub async fn extract(&self, archive_path: PathBuf, dest: PathBuf) -> anyhow::Result<usize> {
        info!(archive = %archive_path.display(), dest = %dest.display(), "Extracting ZIP archive");

        tokio::fs::create_dir_all(&dest).await?;

        let max_total_bytes = self.max_total_bytes;
        let max_file_count = self.max_file_count;
        let archive_path_clone = archive_path.clone();
        let dest_clone = dest.clone();

        let written = tokio::task::spawn_blocking(move || {
            let file = File::open(&archive_path_clone)?;
            let mut archive = ZipArchive::new(BufReader::new(file))?;

            if archive.len() > max_file_count {
                return Err(anyhow::anyhow!(
                    "Archive has {} entries (limit {})",
                    archive.len(),
                    max_file_count
                ));
            }

            let mut written = 0usize;
            let mut total_bytes = 0u64;

            for i in 0..archive.len() {
                let mut file = archive.by_index(i)?;
                let outpath = match file.enclosed_name() {
                    Some(path) => dest_clone.join(path),
                    None => {
                        warn!(entry = %file.name(), "Skipping archive entry outside destination");
                        continue;
                    }
                };

                if file.name().ends_with('/') {
                    std::fs::create_dir_all(&outpath)?;
                    continue;
                }

                if let Some(p) = outpath.parent() {
                    if !p.exists() {
                        std::fs::create_dir_all(p)?;
                    }
                }

                // Cap the read so a lying header cannot exceed the budget
                let remaining = max_total_bytes.saturating_sub(total_bytes);
                let mut outfile = File::create(&outpath)?;
                let copied = std::io::copy(&mut (&mut file).take(remaining.saturating_add(1)), &mut outfile)?;
                total_bytes += copied;
                if total_bytes > max_total_bytes {
                    drop(outfile);
                    let _ = std::fs::remove_file(&outpath);
                    return Err(anyhow::anyhow!(
                        "Archive exceeds extraction limit of {} bytes",
                        max_total_bytes
                    ));
                }
                written += 1;
            }

            Ok::<usize, anyhow::Error>(written)
        })
        .await??;

        info!(archive = %archive_path.display(), dest = %dest.display(), files = written, "ZIP extraction completed");
        Ok(written)
    }
}

impl Default for ZipExtractor {
    fn default() -> Self {
        Self::new(1024 * 1024 * 1024, 10000)
    }
}
