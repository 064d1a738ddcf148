// SPDX-License-Identifier: GPL-3.0-only
pub mod path_sanitizer;
pub mod url_validator;

pub use path_sanitizer::{sanitize_filename, unique_path};
pub use url_validator::{join_segments, validate_base_url};
