// SPDX-License-Identifier: GPL-3.0-only
use std::collections::HashSet;

use crate::gallery::models::{OperationStatus, StagedFile, StatusKind};

/// Identifies one launched controller operation. Later operations compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OperationId(u64);

/// Handle for a pending status auto-clear
///
/// Only the ticket of the latest status write can clear it; older tickets are inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClearTicket(u64);

/// Client-side view of the remote gallery
///
/// Holds the known filenames from the last successful listing together with the
/// selection, the failed thumbnail loads, the staged uploads and the status line.
/// Every method is a single atomic transition and none of them perform I/O.
///
/// Invariant: the selection and the failed set are always subsets of the known set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryStore {
    known: Vec<String>,
    selected: HashSet<String>,
    failed: HashSet<String>,
    staged: Vec<StagedFile>,
    status: OperationStatus,
    status_generation: u64,
    latest_operation: u64,
}

impl GalleryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the staged uploads wholesale
    pub fn set_staged_files(&mut self, files: Vec<StagedFile>) {
        self.staged = files;
    }

    pub fn clear_staged_files(&mut self) {
        self.staged.clear();
    }

    /// Install a fresh listing and start a new epoch
    ///
    /// Selection and failed loads belong to the previous listing and are dropped.
    /// Duplicate names keep their first position.
    pub fn replace_known_filenames(&mut self, filenames: Vec<String>) {
        let mut seen = HashSet::with_capacity(filenames.len());
        self.known = filenames
            .into_iter()
            .filter(|name| seen.insert(name.clone()))
            .collect();
        self.selected.clear();
        self.failed.clear();
    }

    /// Flip the selection of a known filename
    ///
    /// Unknown filenames are ignored. Returns whether the filename is selected afterwards.
    pub fn toggle_selection(&mut self, filename: &str) -> bool {
        if !self.is_known(filename) {
            return false;
        }
        if self.selected.remove(filename) {
            false
        } else {
            self.selected.insert(filename.to_string());
            true
        }
    }

    /// Record a failed thumbnail load for the current epoch
    pub fn mark_load_failed(&mut self, filename: &str) {
        if self.is_known(filename) {
            self.failed.insert(filename.to_string());
        }
    }

    /// Drop filenames the server confirmed as deleted
    pub fn remove_filenames(&mut self, filenames: &[String]) {
        let doomed: HashSet<&str> = filenames.iter().map(String::as_str).collect();
        self.known.retain(|name| !doomed.contains(name.as_str()));
        self.selected.retain(|name| !doomed.contains(name.as_str()));
        self.failed.retain(|name| !doomed.contains(name.as_str()));
    }

    /// Overwrite the status line
    ///
    /// Success messages are informational and return a ticket for a later
    /// [`clear_status`](Self::clear_status). Any newer write invalidates older tickets.
    pub fn set_status(&mut self, kind: StatusKind, message: impl Into<String>) -> Option<ClearTicket> {
        self.write_status(kind, message.into());
        (kind == StatusKind::Success).then_some(ClearTicket(self.status_generation))
    }

    /// Overwrite the status line without scheduling an auto-clear
    pub fn set_status_sticky(&mut self, kind: StatusKind, message: impl Into<String>) {
        self.write_status(kind, message.into());
    }

    /// Revert to idle if no status was written since `ticket` was issued
    pub fn clear_status(&mut self, ticket: ClearTicket) -> bool {
        if ticket.0 != self.status_generation {
            return false;
        }
        self.write_status(StatusKind::Idle, String::new());
        true
    }

    fn write_status(&mut self, kind: StatusKind, message: String) {
        self.status_generation += 1;
        self.status = OperationStatus { kind, message };
    }

    pub fn begin_operation(&mut self) -> OperationId {
        self.latest_operation += 1;
        OperationId(self.latest_operation)
    }

    /// Whether `op` is still the most recently launched operation
    pub fn is_current_operation(&self, op: OperationId) -> bool {
        op.0 == self.latest_operation
    }

    pub fn known_filenames(&self) -> &[String] {
        &self.known
    }

    pub fn is_known(&self, filename: &str) -> bool {
        self.known.iter().any(|name| name == filename)
    }

    pub fn is_selected(&self, filename: &str) -> bool {
        self.selected.contains(filename)
    }

    /// Selected filenames in listing order
    pub fn selected_filenames(&self) -> Vec<String> {
        self.known
            .iter()
            .filter(|name| self.selected.contains(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    pub fn has_load_failed(&self, filename: &str) -> bool {
        self.failed.contains(filename)
    }

    /// Failed filenames in listing order
    pub fn failed_filenames(&self) -> Vec<String> {
        self.known
            .iter()
            .filter(|name| self.failed.contains(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn staged_files(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    pub fn staged_bytes(&self) -> u64 {
        self.staged.iter().map(|f| f.size_bytes).sum()
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }
}
