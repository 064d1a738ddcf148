// SPDX-License-Identifier: GPL-3.0-only
pub mod error;
pub mod service;

pub use error::SyncError;
pub use service::{ControllerSettings, SyncController};
