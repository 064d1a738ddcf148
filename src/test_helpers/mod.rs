// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, broadcast};

use crate::controller::{ControllerSettings, SyncController};
use crate::gallery::{BatchDeleteResult, BatchResult, ImageInfo, OperationStatus, StagedFile};
use crate::host::{BlobSink, Confirm};
use crate::remote::{ApiError, ImageApi};

pub const TEST_BACKEND: &str = "http://localhost:8080/api/v1/images";

/// One recorded call against [`FakeImageApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    List,
    Upload(Vec<String>),
    Fetch(String),
    Delete(String),
    DeleteBatch(Vec<String>),
    Retrieve(Vec<String>),
    Info(Vec<String>),
}

/// In-memory image API with scripted answers
///
/// Every endpoint fails with a 500 unless an answer was configured.
pub struct FakeImageApi {
    state: Mutex<FakeState>,
    retrieve_gate: Option<Arc<Notify>>,
}

#[derive(Default)]
struct FakeState {
    listing: Option<Vec<String>>,
    upload: Option<BatchResult>,
    delete_ok: bool,
    delete_batch: Option<BatchDeleteResult>,
    archive: Option<Vec<u8>>,
    images: HashMap<String, Vec<u8>>,
    info: Option<Vec<ImageInfo>>,
    calls: Vec<ApiCall>,
}

pub fn server_error() -> ApiError {
    ApiError::Status {
        status: 500,
        reason: "Internal Server Error".to_string(),
        body: String::new(),
    }
}

pub fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl FakeImageApi {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState::default()),
            retrieve_gate: None,
        }
    }

    pub fn with_listing(self, listing: &[&str]) -> Self {
        self.set_listing(listing);
        self
    }

    pub fn with_upload_result(self, success_count: u64, total_files: u64) -> Self {
        self.state.lock().unwrap().upload = Some(BatchResult {
            success_count,
            total_files,
            failed_count: None,
        });
        self
    }

    pub fn with_delete(self) -> Self {
        self.state.lock().unwrap().delete_ok = true;
        self
    }

    pub fn with_delete_batch_result(self, success_count: u64, total_files: u64, deleted: &[&str]) -> Self {
        self.state.lock().unwrap().delete_batch = Some(BatchDeleteResult {
            summary: BatchResult {
                success_count,
                total_files,
                failed_count: None,
            },
            results: deleted.iter().map(|name| (name.to_string(), true)).collect(),
        });
        self
    }

    pub fn with_archive(self, archive: &[u8]) -> Self {
        self.state.lock().unwrap().archive = Some(archive.to_vec());
        self
    }

    pub fn with_image(self, filename: &str, bytes: &[u8]) -> Self {
        self.state.lock().unwrap().images.insert(filename.to_string(), bytes.to_vec());
        self
    }

    pub fn with_info(self, info: Vec<ImageInfo>) -> Self {
        self.state.lock().unwrap().info = Some(info);
        self
    }

    /// Hold `retrieve_batch` until the gate is notified
    pub fn with_retrieve_gate(mut self, gate: Arc<Notify>) -> Self {
        self.retrieve_gate = Some(gate);
        self
    }

    pub fn set_listing(&self, listing: &[&str]) {
        self.state.lock().unwrap().listing = Some(names(listing));
    }

    pub fn fail_listing(&self) {
        self.state.lock().unwrap().listing = None;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.state.lock().unwrap().calls.clone()
    }

    fn record(&self, call: ApiCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ImageApi for FakeImageApi {
    async fn list_images(&self) -> Result<Vec<String>, ApiError> {
        self.record(ApiCall::List);
        self.state.lock().unwrap().listing.clone().ok_or_else(server_error)
    }

    async fn upload_batch(&self, files: &[StagedFile]) -> Result<BatchResult, ApiError> {
        self.record(ApiCall::Upload(files.iter().map(|f| f.name.clone()).collect()));
        self.state.lock().unwrap().upload.ok_or_else(server_error)
    }

    async fn fetch_image(&self, filename: &str) -> Result<Vec<u8>, ApiError> {
        self.record(ApiCall::Fetch(filename.to_string()));
        self.state.lock().unwrap().images.get(filename).cloned().ok_or_else(|| ApiError::Status {
            status: 404,
            reason: "Not Found".to_string(),
            body: String::new(),
        })
    }

    async fn delete_image(&self, filename: &str) -> Result<(), ApiError> {
        self.record(ApiCall::Delete(filename.to_string()));
        if self.state.lock().unwrap().delete_ok {
            Ok(())
        } else {
            Err(server_error())
        }
    }

    async fn delete_batch(&self, filenames: &[String]) -> Result<BatchDeleteResult, ApiError> {
        self.record(ApiCall::DeleteBatch(filenames.to_vec()));
        self.state.lock().unwrap().delete_batch.clone().ok_or_else(server_error)
    }

    async fn retrieve_batch(&self, filenames: &[String]) -> Result<Vec<u8>, ApiError> {
        self.record(ApiCall::Retrieve(filenames.to_vec()));
        if let Some(gate) = &self.retrieve_gate {
            gate.notified().await;
        }
        self.state.lock().unwrap().archive.clone().ok_or_else(server_error)
    }

    async fn batch_info(&self, filenames: &[String]) -> Result<Vec<ImageInfo>, ApiError> {
        self.record(ApiCall::Info(filenames.to_vec()));
        self.state.lock().unwrap().info.clone().ok_or_else(server_error)
    }
}

/// Confirm capability with a fixed answer that records its prompts
pub struct ScriptedConfirm {
    answer: bool,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new(answer: bool) -> Self {
        Self {
            answer,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

/// A payload handed to [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedBlob {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Sink that keeps payloads in memory, or refuses them when `failing`
pub struct RecordingSink {
    failing: bool,
    saved: Mutex<Vec<SavedBlob>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            failing: false,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn saved(&self) -> Vec<SavedBlob> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobSink for RecordingSink {
    async fn save(&self, filename: &str, bytes: Vec<u8>, mime_type: &str) -> anyhow::Result<PathBuf> {
        if self.failing {
            return Err(anyhow::anyhow!("disk full"));
        }
        self.saved.lock().unwrap().push(SavedBlob {
            filename: filename.to_string(),
            bytes,
            mime_type: mime_type.to_string(),
        });
        Ok(PathBuf::from("/downloads").join(filename))
    }
}

/// A controller wired to fakes, with handles to inspect them
pub struct Harness {
    pub controller: SyncController,
    pub api: Arc<FakeImageApi>,
    pub confirm: Arc<ScriptedConfirm>,
    pub sink: Arc<RecordingSink>,
}

pub fn test_settings() -> ControllerSettings {
    ControllerSettings {
        status_display: Duration::from_secs(3),
        archive_name: "images.zip".to_string(),
        backend_label: TEST_BACKEND.to_string(),
    }
}

pub fn harness(api: FakeImageApi, confirm_answer: bool) -> Harness {
    harness_with_sink(api, confirm_answer, RecordingSink::new())
}

pub fn harness_with_sink(api: FakeImageApi, confirm_answer: bool, sink: RecordingSink) -> Harness {
    let api = Arc::new(api);
    let confirm = Arc::new(ScriptedConfirm::new(confirm_answer));
    let sink = Arc::new(sink);
    let controller = SyncController::new(
        Arc::clone(&api) as Arc<dyn ImageApi>,
        Arc::clone(&confirm) as Arc<dyn Confirm>,
        Arc::clone(&sink) as Arc<dyn BlobSink>,
        test_settings(),
    );
    Harness {
        controller,
        api,
        confirm,
        sink,
    }
}

/// Everything published on a status receiver so far
pub fn drain(receiver: &mut broadcast::Receiver<OperationStatus>) -> Vec<OperationStatus> {
    let mut statuses = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(status) => statuses.push(status),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    statuses
}

/// Create a temporary directory for tests
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("Failed to create temp directory")
}
