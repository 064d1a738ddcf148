// SPDX-License-Identifier: GPL-3.0-only
use std::path::{Path, PathBuf};
use anyhow::Result;
use uuid::Uuid;

/// Sanitize a filename before it is written to local disk
///
/// Removes path separators and other unsafe characters, ensuring only
/// a valid filename component remains.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Extract just the filename component (remove any path parts)
    let filename_only = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .filter(|c| {
            // Allow alphanumeric, dash, underscore, dot, parentheses and spaces
            c.is_alphanumeric() || matches!(*c, '-' | '_' | '.' | ' ' | '(' | ')')
        })
        .collect();

    let sanitized = sanitized.trim().to_string();

    if sanitized.is_empty() || sanitized.chars().all(|c| c == '.') {
        return Err(anyhow::anyhow!("Filename '{}' is empty after sanitization", filename));
    }

    if sanitized.len() > 255 {
        return Err(anyhow::anyhow!("Filename too long (max 255 characters)"));
    }

    Ok(sanitized)
}

/// Pick a path inside `dir` for `filename` that does not overwrite an existing file
///
/// An existing name gets a UUID prefix, the same way temporary downloads are named.
pub fn unique_path(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }
    dir.join(format!("{}-{}", Uuid::new_v4(), filename))
}
