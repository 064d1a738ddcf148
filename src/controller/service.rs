// SPDX-License-Identifier: GPL-3.0-only
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::try_join_all;
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, error, info, warn};

use crate::controller::SyncError;
use crate::gallery::{
    BatchDeleteResult, BatchResult, ClearTicket, GalleryStore, ImageInfo, OperationId,
    OperationStatus, StagedFile, StatusKind,
};
use crate::host::{BlobSink, Confirm};
use crate::remote::ImageApi;

/// MIME type handed to the sink together with batch download archives
pub const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Buffered status notifications per subscriber
const STATUS_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// How long informational success messages stay before reverting to idle
    pub status_display: Duration,

    /// Filename handed to the sink for batch downloads
    pub archive_name: String,

    /// Backend location quoted in "is the backend running" hints
    pub backend_label: String,
}

/// Drives the remote image API and keeps the gallery store in step with it
///
/// Every operation is a single attempt. Outcomes are written to the store's
/// status line (and published to subscribers) before the call returns, so the
/// returned `Result` is informational.
///
/// Each operation takes an [`OperationId`] when it starts. Its status writes are
/// only applied while it is still the newest operation; a slower, older
/// operation finishing late cannot overwrite the status of a newer one.
#[derive(Clone)]
pub struct SyncController {
    api: Arc<dyn ImageApi>,
    confirm: Arc<dyn Confirm>,
    sink: Arc<dyn BlobSink>,
    store: Arc<RwLock<GalleryStore>>,
    events: broadcast::Sender<OperationStatus>,
    settings: ControllerSettings,
}

impl SyncController {
    pub fn new(
        api: Arc<dyn ImageApi>,
        confirm: Arc<dyn Confirm>,
        sink: Arc<dyn BlobSink>,
        settings: ControllerSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            api,
            confirm,
            sink,
            store: Arc::new(RwLock::new(GalleryStore::new())),
            events,
            settings,
        }
    }

    /// Receive every status change applied from now on
    pub fn subscribe(&self) -> broadcast::Receiver<OperationStatus> {
        self.events.subscribe()
    }

    /// Copy of the current store state for rendering
    pub async fn snapshot(&self) -> GalleryStore {
        self.store.read().await.clone()
    }

    pub async fn status(&self) -> OperationStatus {
        self.store.read().await.status().clone()
    }

    /// Flip the selection of a listed image. Returns whether it is selected afterwards.
    pub async fn toggle_selection(&self, filename: &str) -> bool {
        self.store.write().await.toggle_selection(filename)
    }

    pub async fn set_staged_files(&self, files: Vec<StagedFile>) {
        info!(count = files.len(), "Staged files for upload");
        self.store.write().await.set_staged_files(files);
    }

    /// Read local files and stage them, replacing the previous staging
    ///
    /// If any file cannot be read nothing is replaced.
    pub async fn stage_files(&self, paths: &[PathBuf]) -> Result<usize, SyncError> {
        match try_join_all(paths.iter().map(|p| StagedFile::from_path(p.as_path()))).await {
            Ok(files) => {
                let count = files.len();
                self.set_staged_files(files).await;
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, "Failed to stage files");
                let op = self.begin().await;
                self.report(op, StatusKind::Error, format!("Failed to read files: {:#}", e)).await;
                Err(SyncError::LocalIo(e))
            }
        }
    }

    /// Reload the listing; starts a new epoch on success
    ///
    /// On failure the previous listing stays in place.
    pub async fn refresh(&self) -> Result<usize, SyncError> {
        let op = self.begin().await;
        self.report(op, StatusKind::Busy, "Loading images...").await;

        match self.api.list_images().await {
            Ok(filenames) => {
                let count = filenames.len();
                self.store.write().await.replace_known_filenames(filenames);
                info!(count, "Gallery listing refreshed");
                self.report(op, StatusKind::Success, "Images loaded successfully").await;
                Ok(count)
            }
            Err(e) => {
                error!(error = %e, status = ?e.status_code(), "Failed to fetch image listing");
                let message = format!(
                    "Failed to load images: {}. Make sure backend is running on {}",
                    e, self.settings.backend_label
                );
                self.report(op, StatusKind::Error, message).await;
                Err(e.into())
            }
        }
    }

    /// Upload every staged file in one batch, then refresh
    ///
    /// Staged files survive a failed upload so the user can retry.
    pub async fn upload_staged(&self) -> Result<BatchResult, SyncError> {
        let op = self.begin().await;
        let files = self.store.read().await.staged_files().to_vec();

        if files.is_empty() {
            return Err(self.reject(op, "Please select at least one file").await);
        }

        self.report(op, StatusKind::Busy, "Uploading files...").await;

        match self.api.upload_batch(&files).await {
            Ok(result) => {
                self.store.write().await.clear_staged_files();
                info!(
                    success = result.success_count,
                    total = result.total_files,
                    failed = result.failed(),
                    "Upload finished"
                );
                let message = format!(
                    "Successfully uploaded {} out of {} files",
                    result.success_count, result.total_files
                );
                self.report(op, StatusKind::Success, message).await;
                self.refresh_after("upload").await;
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, status = ?e.status_code(), count = files.len(), "Upload failed");
                let message = format!(
                    "Upload failed: {}. Make sure backend is running on {}",
                    e, self.settings.backend_label
                );
                self.report(op, StatusKind::Error, message).await;
                Err(e.into())
            }
        }
    }

    /// Delete one image after confirmation, then refresh
    pub async fn delete_one(&self, filename: &str) -> Result<(), SyncError> {
        let prompt = format!("Are you sure you want to delete {}?", filename);
        if !self.confirm.confirm(&prompt).await {
            info!(filename = %filename, "Delete cancelled by user");
            return Err(SyncError::Cancelled);
        }

        let op = self.begin().await;
        self.report(op, StatusKind::Busy, format!("Deleting {}...", filename)).await;

        match self.api.delete_image(filename).await {
            Ok(()) => {
                self.store.write().await.remove_filenames(&[filename.to_string()]);
                info!(filename = %filename, "Image deleted");
                self.report(op, StatusKind::Success, format!("Successfully deleted {}", filename)).await;
                self.refresh_after("delete").await;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, status = ?e.status_code(), filename = %filename, "Delete failed");
                self.report(op, StatusKind::Error, format!("Delete failed: {}", e)).await;
                Err(e.into())
            }
        }
    }

    /// Delete the whole selection in one request after confirmation, then refresh
    ///
    /// The refresh also runs after a partial failure. A failed request leaves
    /// the selection untouched.
    pub async fn delete_selected(&self) -> Result<BatchDeleteResult, SyncError> {
        let selected = self.store.read().await.selected_filenames();

        if selected.is_empty() {
            let op = self.begin().await;
            return Err(self.reject(op, "Please select images to delete").await);
        }

        let prompt = format!("Are you sure you want to delete {} image(s)?", selected.len());
        if !self.confirm.confirm(&prompt).await {
            info!(count = selected.len(), "Batch delete cancelled by user");
            return Err(SyncError::Cancelled);
        }

        let op = self.begin().await;
        self.report(op, StatusKind::Busy, format!("Deleting {} image(s)...", selected.len())).await;

        match self.api.delete_batch(&selected).await {
            Ok(result) => {
                self.store.write().await.remove_filenames(&result.deleted());
                info!(
                    success = result.summary.success_count,
                    total = result.summary.total_files,
                    "Batch delete finished"
                );
                let message = format!(
                    "Successfully deleted {} out of {} images",
                    result.summary.success_count, result.summary.total_files
                );
                self.report(op, StatusKind::Success, message).await;
                self.refresh_after("batch delete").await;
                Ok(result)
            }
            Err(e) => {
                error!(error = %e, status = ?e.status_code(), count = selected.len(), "Batch delete failed");
                self.report(op, StatusKind::Error, format!("Delete failed: {}", e)).await;
                Err(e.into())
            }
        }
    }

    /// Retrieve the selection as one archive and hand it to the sink
    ///
    /// Leaves the listing and the selection alone. The resulting status does
    /// not auto-clear because no refresh follows.
    pub async fn download_selected(&self) -> Result<PathBuf, SyncError> {
        let op = self.begin().await;
        let selected = self.store.read().await.selected_filenames();

        if selected.is_empty() {
            return Err(self.reject(op, "Please select images to download").await);
        }

        self.report(op, StatusKind::Busy, format!("Downloading {} image(s)...", selected.len())).await;

        let archive = match self.api.retrieve_batch(&selected).await {
            Ok(archive) => archive,
            Err(e) => {
                error!(error = %e, status = ?e.status_code(), count = selected.len(), "Batch download failed");
                self.report_sticky(op, StatusKind::Error, format!("Download failed: {}", e)).await;
                return Err(e.into());
            }
        };

        match self.sink.save(&self.settings.archive_name, archive, ARCHIVE_MIME_TYPE).await {
            Ok(path) => {
                info!(path = %path.display(), count = selected.len(), "Batch download saved");
                self.report_sticky(op, StatusKind::Success, "Images downloaded successfully").await;
                Ok(path)
            }
            Err(e) => {
                error!(error = %e, "Failed to save downloaded archive");
                self.report_sticky(op, StatusKind::Error, format!("Download failed: {:#}", e)).await;
                Err(SyncError::Sink(e))
            }
        }
    }

    /// Fetch size and content type of the selected images
    pub async fn describe_selected(&self) -> Result<Vec<ImageInfo>, SyncError> {
        let op = self.begin().await;
        let selected = self.store.read().await.selected_filenames();

        if selected.is_empty() {
            return Err(self.reject(op, "Please select images to describe").await);
        }

        self.report(op, StatusKind::Busy, format!("Fetching info for {} image(s)...", selected.len())).await;

        match self.api.batch_info(&selected).await {
            Ok(infos) => {
                let message = format!("Fetched info for {} image(s)", infos.len());
                self.report_sticky(op, StatusKind::Success, message).await;
                Ok(infos)
            }
            Err(e) => {
                error!(error = %e, status = ?e.status_code(), "Batch info request failed");
                self.report_sticky(op, StatusKind::Error, format!("Info request failed: {}", e)).await;
                Err(e.into())
            }
        }
    }

    /// Fetch one image for display
    ///
    /// Images that already failed in this epoch are not fetched again; a new
    /// listing is the only way to retry them. Never touches the status line.
    pub async fn load_thumbnail(&self, filename: &str) -> Option<Vec<u8>> {
        {
            let store = self.store.read().await;
            if !store.is_known(filename) {
                debug!(filename = %filename, "Not in the current listing, skipping thumbnail");
                return None;
            }
            if store.has_load_failed(filename) {
                debug!(filename = %filename, "Thumbnail already failed in this epoch");
                return None;
            }
        }

        match self.api.fetch_image(filename).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(filename = %filename, error = %e, status = ?e.status_code(), "Failed to load image");
                self.report_load_failure(filename).await;
                None
            }
        }
    }

    /// Record a failed thumbnail load. Purely local, nothing is retried.
    pub async fn report_load_failure(&self, filename: &str) {
        self.store.write().await.mark_load_failed(filename);
    }

    async fn begin(&self) -> OperationId {
        self.store.write().await.begin_operation()
    }

    async fn refresh_after(&self, operation: &str) {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, operation, "Refresh after operation failed");
        }
    }

    async fn reject(&self, op: OperationId, message: &str) -> SyncError {
        warn!(reason = %message, "Operation rejected before reaching the backend");
        self.report(op, StatusKind::Error, message).await;
        SyncError::Validation(message.to_string())
    }

    async fn report(&self, op: OperationId, kind: StatusKind, message: impl Into<String>) {
        self.write_status(op, kind, message.into(), true).await;
    }

    async fn report_sticky(&self, op: OperationId, kind: StatusKind, message: impl Into<String>) {
        self.write_status(op, kind, message.into(), false).await;
    }

    async fn write_status(&self, op: OperationId, kind: StatusKind, message: String, auto_clear: bool) {
        let mut store = self.store.write().await;
        if !store.is_current_operation(op) {
            debug!(kind = ?kind, message = %message, "Discarding status of a superseded operation");
            return;
        }

        let ticket = if auto_clear {
            store.set_status(kind, message)
        } else {
            store.set_status_sticky(kind, message);
            None
        };
        let status = store.status().clone();
        drop(store);

        // No subscribers is fine
        let _ = self.events.send(status);

        if let Some(ticket) = ticket {
            self.schedule_clear(ticket);
        }
    }

    fn schedule_clear(&self, ticket: ClearTicket) {
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        let delay = self.settings.status_display;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut guard = store.write().await;
            if guard.clear_status(ticket) {
                let status = guard.status().clone();
                drop(guard);
                let _ = events.send(status);
            }
        });
    }
}
