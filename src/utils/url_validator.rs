// SPDX-License-Identifier: GPL-3.0-only
use anyhow::{Context, Result};
use url::Url;

/// Maximum allowed URL length
const MAX_URL_LENGTH: usize = 2048;

/// Validate the configured base URL of the remote image API
///
/// Checks:
/// - Only allows http/https schemes
/// - Requires a host
/// - Validates URL length
///
/// Unlike download URLs, localhost is allowed here: the image backend usually
/// runs next to the client during development.
pub fn validate_base_url(url_str: &str) -> Result<Url> {
    if url_str.len() > MAX_URL_LENGTH {
        return Err(anyhow::anyhow!("URL exceeds maximum length of {} characters", MAX_URL_LENGTH));
    }

    let url = Url::parse(url_str)
        .with_context(|| format!("Invalid API base URL: {}", url_str))?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(anyhow::anyhow!(
                "Invalid URL scheme: {} (only http and https are allowed)",
                scheme
            ));
        }
    }

    if url.host_str().is_none() {
        return Err(anyhow::anyhow!("URL must have a host"));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(anyhow::anyhow!("API base URL must not carry a query or fragment"));
    }

    Ok(url)
}

/// Append path segments to a base URL
///
/// Each segment is percent-encoded as a single path component, so a filename
/// containing `/` or spaces cannot address a different resource.
pub fn join_segments(base: &Url, segments: &[&str]) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("URL cannot be a base: {}", base))?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}
