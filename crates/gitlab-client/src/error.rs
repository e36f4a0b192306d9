//! GitLab client errors

use thiserror::Error;

/// Errors that can occur when interacting with the GitLab API
#[derive(Debug, Error)]
pub enum GitLabError {
    /// HTTP request/response error (connect, timeout, TLS, body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GitLab API returned a non-success status
    #[error("GitLab API error {status}: {message}")]
    Api { status: u16, message: String },

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Credentials could not be turned into request headers or a token
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., missing required fields)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GitLabError {
    /// HTTP status associated with the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            GitLabError::Api { status, .. } => Some(*status),
            GitLabError::NotFound(_) => Some(404),
            GitLabError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the remote reported the resource as absent
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_of_api_and_not_found() {
        let api = GitLabError::Api {
            status: 429,
            message: "Retry later".to_string(),
        };
        assert_eq!(api.status(), Some(429));
        assert!(!api.is_not_found());

        let missing = GitLabError::NotFound("404 Group Not Found".to_string());
        assert_eq!(missing.status(), Some(404));
        assert!(missing.is_not_found());

        assert_eq!(GitLabError::InvalidRequest("x".to_string()).status(), None);
    }
}
