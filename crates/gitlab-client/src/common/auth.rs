//! Authentication modes accepted by GitLab

use serde::Deserialize;
use std::fmt;

/// How requests are authenticated
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Personal, group or project access token (`PRIVATE-TOKEN`)
    PrivateToken(String),
    /// CI job token (`JOB-TOKEN`)
    JobToken(String),
    /// OAuth2 access token (`Authorization: Bearer`)
    OAuth(String),
    /// Username and password, exchanged for an OAuth token on first use
    Basic { username: String, password: String },
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::PrivateToken(_) => f.write_str("PrivateToken(<redacted>)"),
            Auth::JobToken(_) => f.write_str("JobToken(<redacted>)"),
            Auth::OAuth(_) => f.write_str("OAuth(<redacted>)"),
            Auth::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// Response of `POST /oauth/token`
#[derive(Deserialize)]
pub(crate) struct TokenGrant {
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_never_prints_secrets() {
        let token = Auth::PrivateToken("glpat-secret".to_string());
        assert!(!format!("{:?}", token).contains("glpat-secret"));

        let basic = Auth::Basic {
            username: "root".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", basic);
        assert!(rendered.contains("root"));
        assert!(!rendered.contains("hunter2"));
    }
}
