// SPDX-License-Identifier: GPL-3.0-only
//! Command-line surface of the gallery client
//!
//! Each subcommand drives one or more controller operations and then prints
//! every status the controller published while it ran.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::archive::ZipExtractor;
use crate::config::Config;
use crate::controller::{ControllerSettings, SyncController};
use crate::gallery::{ImageInfo, OperationStatus, StatusKind};
use crate::host::{BlobSink, DirectorySink, PromptConfirm};
use crate::remote::HttpImageApi;

#[derive(Debug, Parser)]
#[command(name = "gallery", version, about = "Client for a remote image gallery")]
pub struct Cli {
    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List the images stored on the server
    List,
    /// Upload local image files in one batch
    Upload {
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,
    },
    /// Delete a single image
    Delete {
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Delete several images in one request
    DeleteBatch {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// Download images as one ZIP archive
    Download {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,

        /// Also unpack the archive into this directory
        #[arg(long, value_name = "DIR")]
        extract: Option<PathBuf>,
    },
    /// Show size and content type of images
    Info {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// Fetch a single image
    Thumbnail {
        #[arg(value_name = "NAME")]
        name: String,

        /// Write the image here instead of the download directory
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
}

/// Everything a command needs, wired from the configuration
struct Session {
    controller: SyncController,
    sink: Arc<DirectorySink>,
    statuses: broadcast::Receiver<OperationStatus>,
}

impl Session {
    fn new(config: &Config, assume_yes: bool) -> anyhow::Result<Self> {
        let api = HttpImageApi::new(&config.api_base_url, config.api_key.clone(), config.request_timeout())?;
        let settings = ControllerSettings {
            status_display: config.status_display(),
            archive_name: config.archive_name.clone(),
            backend_label: api.base_url().to_string(),
        };
        let sink = Arc::new(DirectorySink::new(config.download_dir.clone()));

        let controller = SyncController::new(
            Arc::new(api),
            Arc::new(PromptConfirm::new(assume_yes)),
            Arc::clone(&sink) as Arc<dyn BlobSink>,
            settings,
        );
        let statuses = controller.subscribe();

        Ok(Self {
            controller,
            sink,
            statuses,
        })
    }

    /// Print the statuses published since the last call
    fn flush_statuses(&mut self) {
        loop {
            match self.statuses.try_recv() {
                Ok(status) => {
                    if let Some(line) = status_line(&status) {
                        println!("{}", line);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Status output fell behind");
                }
                Err(_) => break,
            }
        }
    }

    /// Select each named image from the current listing
    ///
    /// Names that are not listed are reported and skipped.
    async fn select(&self, names: &[String]) {
        let store = self.controller.snapshot().await;
        for name in names {
            if !store.is_known(name) {
                warn!(filename = %name, "Not in the gallery, skipping");
                eprintln!("! {} is not in the gallery", name);
            } else if !store.is_selected(name) {
                self.controller.toggle_selection(name).await;
            }
        }
        let selected = self.controller.snapshot().await.selection_len();
        info!(selected, requested = names.len(), "Selection ready");
    }
}

/// Render a status for the terminal. Idle statuses print nothing.
fn status_line(status: &OperationStatus) -> Option<String> {
    match status.kind {
        StatusKind::Idle => None,
        StatusKind::Busy => Some(format!("  {}", status.message)),
        StatusKind::Success => Some(format!("✓ {}", status.message)),
        StatusKind::Error => Some(format!("✗ {}", status.message)),
    }
}

fn info_line(info: &ImageInfo) -> String {
    if !info.exists {
        let reason = info.error.as_deref().unwrap_or("not found");
        return format!("{}  missing ({})", info.filename, reason);
    }
    let size = info
        .size
        .map(|bytes| format!("{:.2} MB", bytes as f64 / 1024.0 / 1024.0))
        .unwrap_or_else(|| "unknown size".to_string());
    let content_type = info.content_type.as_deref().unwrap_or("unknown type");
    format!("{}  {}  {}", info.filename, size, content_type)
}

fn mime_for(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Execute the parsed command; the exit code reflects the final status
pub async fn run(cli: Cli, config: &Config) -> anyhow::Result<ExitCode> {
    let mut session = Session::new(config, cli.yes)?;
    let controller = session.controller.clone();

    let completed = match cli.command {
        Commands::List => {
            let ok = controller.refresh().await.is_ok();
            session.flush_statuses();
            if ok {
                let store = controller.snapshot().await;
                if store.known_filenames().is_empty() {
                    println!("No images in the gallery");
                }
                for name in store.known_filenames() {
                    println!("{}", name);
                }
            }
            ok
        }
        Commands::Upload { files } => {
            if controller.stage_files(&files).await.is_ok() {
                let store = controller.snapshot().await;
                for file in store.staged_files() {
                    println!("  {} ({:.2} MB)", file.name, file.size_mb());
                }
                println!(
                    "  {} file(s), {:.2} MB total",
                    store.staged_len(),
                    store.staged_bytes() as f64 / 1024.0 / 1024.0
                );
                controller.upload_staged().await.is_ok()
            } else {
                false
            }
        }
        Commands::Delete { name } => {
            if controller.refresh().await.is_ok() {
                session.flush_statuses();
                match controller.delete_one(&name).await {
                    Ok(()) => true,
                    Err(e) if e.is_cancelled() => {
                        println!("Cancelled");
                        true
                    }
                    Err(_) => false,
                }
            } else {
                false
            }
        }
        Commands::DeleteBatch { names } => {
            if controller.refresh().await.is_ok() {
                session.flush_statuses();
                session.select(&names).await;
                match controller.delete_selected().await {
                    Ok(result) => {
                        session.flush_statuses();
                        let deleted = result.deleted();
                        let store = controller.snapshot().await;
                        for name in names.iter().filter(|n| store.is_known(n) && !deleted.contains(n)) {
                            println!("✗ {} was not deleted", name);
                        }
                        true
                    }
                    Err(e) if e.is_cancelled() => {
                        println!("Cancelled");
                        true
                    }
                    Err(_) => false,
                }
            } else {
                false
            }
        }
        Commands::Download { names, extract } => {
            if controller.refresh().await.is_ok() {
                session.flush_statuses();
                session.select(&names).await;
                match controller.download_selected().await {
                    Ok(path) => {
                        session.flush_statuses();
                        println!("Saved {}", path.display());
                        if let Some(dest) = extract {
                            extract_archive(path, dest).await?;
                        }
                        true
                    }
                    Err(_) => false,
                }
            } else {
                false
            }
        }
        Commands::Info { names } => {
            if controller.refresh().await.is_ok() {
                session.flush_statuses();
                session.select(&names).await;
                match controller.describe_selected().await {
                    Ok(infos) => {
                        session.flush_statuses();
                        for info in &infos {
                            println!("{}", info_line(info));
                        }
                        true
                    }
                    Err(_) => false,
                }
            } else {
                false
            }
        }
        Commands::Thumbnail { name, out } => {
            if controller.refresh().await.is_ok() {
                session.flush_statuses();
                match controller.load_thumbnail(&name).await {
                    Some(bytes) => {
                        let path = match out {
                            Some(path) => {
                                tokio::fs::write(&path, &bytes).await?;
                                path
                            }
                            None => session.sink.save(&name, bytes, mime_for(&name)).await?,
                        };
                        println!("✓ Saved {}", path.display());
                        true
                    }
                    None => {
                        println!("✗ Could not load {}", name);
                        let failed = controller.snapshot().await.failed_filenames();
                        if failed.contains(&name) {
                            println!("  {} will not be fetched again until the next refresh", name);
                        }
                        false
                    }
                }
            } else {
                false
            }
        }
    };

    session.flush_statuses();

    let status = controller.status().await;
    if !completed || status.is_error() {
        info!(status = ?status.kind, "Command finished with an error");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn extract_archive(archive: PathBuf, dest: PathBuf) -> anyhow::Result<()> {
    let extractor = ZipExtractor::default();
    for entry in extractor.list_entries(archive.clone()).await? {
        println!("  {}", entry);
    }
    let written = extractor.extract(archive, dest.clone()).await?;
    println!("✓ Extracted {} file(s) into {}", written, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_download_with_extract() {
        let cli = Cli::try_parse_from(["gallery", "-y", "download", "a.jpg", "b.jpg", "--extract", "out"]).unwrap();
        assert!(cli.yes);
        match cli.command {
            Commands::Download { names, extract } => {
                assert_eq!(names, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
                assert_eq!(extract, Some(PathBuf::from("out")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["gallery", "list", "-vv", "--config", "alt.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_upload_requires_files() {
        assert!(Cli::try_parse_from(["gallery", "upload"]).is_err());
        assert!(Cli::try_parse_from(["gallery", "delete-batch"]).is_err());
    }

    #[test]
    fn test_status_line() {
        assert_eq!(status_line(&OperationStatus::idle()), None);
        assert_eq!(
            status_line(&OperationStatus::new(StatusKind::Success, "Images loaded successfully")),
            Some("✓ Images loaded successfully".to_string())
        );
        assert_eq!(
            status_line(&OperationStatus::new(StatusKind::Error, "Delete failed: 404 Not Found")),
            Some("✗ Delete failed: 404 Not Found".to_string())
        );
        assert_eq!(
            status_line(&OperationStatus::new(StatusKind::Busy, "Loading images...")),
            Some("  Loading images...".to_string())
        );
    }

    #[test]
    fn test_info_line() {
        let present = ImageInfo {
            filename: "a.jpg".to_string(),
            exists: true,
            size: Some(1024 * 1024),
            content_type: Some("image/jpeg".to_string()),
            error: None,
        };
        assert_eq!(info_line(&present), "a.jpg  1.00 MB  image/jpeg");

        let missing = ImageInfo {
            filename: "b.jpg".to_string(),
            exists: false,
            size: None,
            content_type: None,
            error: None,
        };
        assert_eq!(info_line(&missing), "b.jpg  missing (not found)");
    }

    #[test]
    fn test_mime_for() {
        assert_eq!(mime_for("photo.JPG"), "image/jpeg");
        assert_eq!(mime_for("icon.png"), "image/png");
        assert_eq!(mime_for("notes"), "application/octet-stream");
    }
}
