// SPDX-License-Identifier: GPL-3.0-only
use thiserror::Error;

/// Failure talking to the remote image API
///
/// Non-2xx responses and transport failures are both errors; nothing is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("{status} {reason}")]
    Status {
        status: u16,
        reason: String,
        body: String,
    },

    /// Connection, timeout or body decoding failure
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// An endpoint URL could not be built
    #[error("invalid endpoint URL: {0}")]
    Url(String),
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        Self::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            body,
        }
    }

    /// HTTP status code, when the server answered at all
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Url(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_error_display() {
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, "stack trace".to_string());
        assert_eq!(err.to_string(), "500 Internal Server Error");
        assert_eq!(err.status_code(), Some(500));
    }

    #[test]
    fn test_url_error_has_no_status() {
        let err = ApiError::Url("cannot be a base".to_string());
        assert_eq!(err.status_code(), None);
        assert!(err.to_string().contains("cannot be a base"));
    }
}
