//! Classification of GitLab API failures.
//!
//! Every remote call result passes through [`classify`] to decide between
//! "does not exist", "retry later" and "give up until the user changes something".

use gitlab_client::GitLabError;

/// Outcome class of a failed remote call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The resource does not exist
    NotFound,
    /// Retry with backoff
    Transient,
    /// Retrying will not help until the spec or credentials change
    Fatal,
}

/// Marker GitLab puts in 404 messages, e.g. `404 Project Not Found`
const NOT_FOUND_SUFFIX: &str = "Not Found";

/// Class of `err`; 404s are recognised by status or by GitLab's message text
pub fn classify(err: &GitLabError) -> ErrorClass {
    match err {
        GitLabError::NotFound(_) => ErrorClass::NotFound,
        GitLabError::Api { status, message } => match status {
            404 => ErrorClass::NotFound,
            408 | 429 => ErrorClass::Transient,
            500..=599 => ErrorClass::Transient,
            _ if is_not_found_message(message) => ErrorClass::NotFound,
            _ => ErrorClass::Fatal,
        },
        GitLabError::Http(e) => {
            if e.status().is_some_and(|s| s.as_u16() == 404) {
                ErrorClass::NotFound
            } else if e.is_timeout() || e.is_connect() || e.is_request() {
                ErrorClass::Transient
            } else if let Some(status) = e.status() {
                match status.as_u16() {
                    408 | 429 | 500..=599 => ErrorClass::Transient,
                    _ => ErrorClass::Fatal,
                }
            } else {
                ErrorClass::Transient
            }
        }
        GitLabError::Serialization(_)
        | GitLabError::Authentication(_)
        | GitLabError::InvalidRequest(_) => ErrorClass::Fatal,
    }
}

fn is_not_found_message(message: &str) -> bool {
    message.starts_with("404 ") && message.contains(NOT_FOUND_SUFFIX)
}

/// Shorthand for `classify(err) == ErrorClass::NotFound`
pub fn is_not_found(err: &GitLabError) -> bool {
    classify(err) == ErrorClass::NotFound
}
