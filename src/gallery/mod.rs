// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod store;

pub use models::{BatchDeleteResult, BatchResult, ImageInfo, OperationStatus, StagedFile, StatusKind};
pub use store::{ClearTicket, GalleryStore, OperationId};
