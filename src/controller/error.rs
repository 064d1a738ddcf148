// SPDX-License-Identifier: GPL-3.0-only
use thiserror::Error;

use crate::remote::ApiError;

/// Why a controller operation did not complete
///
/// By the time one of these is returned the status line already carries a
/// user-facing message, so callers may ignore it.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected before any network call (nothing staged, nothing selected)
    #[error("{0}")]
    Validation(String),

    /// The remote API was unreachable or answered with a non-2xx status
    #[error(transparent)]
    Transport(#[from] ApiError),

    /// The downloaded payload could not be handed to the sink
    #[error("could not save download: {0:#}")]
    Sink(anyhow::Error),

    /// A local file could not be read for staging
    #[error("could not read local file: {0:#}")]
    LocalIo(anyhow::Error),

    /// The user declined the confirmation prompt
    #[error("cancelled by user")]
    Cancelled,
}

impl SyncError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
