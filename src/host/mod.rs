// SPDX-License-Identifier: GPL-3.0-only
pub mod confirm;
pub mod sink;
pub mod traits;

pub use confirm::PromptConfirm;
pub use sink::DirectorySink;
pub use traits::{BlobSink, Confirm};
