//! Common utilities for the GitLab API client
//!
//! `HttpClient` wraps `reqwest::Client` with GitLab authentication and maps
//! response statuses onto `GitLabError`.

pub mod auth;

pub use auth::Auth;

use crate::error::GitLabError;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;
use tracing::debug;

/// Path prefix of the REST API
pub const API_PREFIX: &str = "/api/v4";

/// HTTP client wrapper with authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    auth: Auth,
    oauth_token: OnceCell<String>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("auth", &self.auth)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    ///
    /// `base_url` is the GitLab instance root; `/api/v4` is appended unless
    /// already present.
    pub fn new(client: Client, base_url: &str, auth: Auth) -> Self {
        Self {
            client,
            base_url: api_base_url(base_url),
            auth,
            oauth_token: OnceCell::new(),
        }
    }

    /// Get the API base URL (including `/api/v4`)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from an API path
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Instance root, without the API prefix
    fn instance_url(&self) -> &str {
        self.base_url.trim_end_matches(API_PREFIX)
    }

    /// Attach authentication headers to a request
    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, GitLabError> {
        Ok(match &self.auth {
            Auth::PrivateToken(token) => request.header("PRIVATE-TOKEN", token),
            Auth::JobToken(token) => request.header("JOB-TOKEN", token),
            Auth::OAuth(token) => request.bearer_auth(token),
            Auth::Basic { .. } => {
                let token = self
                    .oauth_token
                    .get_or_try_init(|| self.password_grant())
                    .await?;
                request.bearer_auth(token)
            }
        })
    }

    /// Exchange username/password for an OAuth token (resource owner password grant)
    async fn password_grant(&self) -> Result<String, GitLabError> {
        let Auth::Basic { username, password } = &self.auth else {
            return Err(GitLabError::Authentication(
                "password grant requires basic credentials".to_string(),
            ));
        };

        let url = format!("{}/oauth/token", self.instance_url());
        debug!("POST {} (password grant for {})", url, username);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "password"),
                ("username", username.as_str()),
                ("password", password.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitLabError::Authentication(format!(
                "password grant failed: {} - {}",
                status, body
            )));
        }

        let grant: auth::TokenGrant = response.json().await?;
        Ok(grant.access_token)
    }

    /// Send a request and map error statuses
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<Response, GitLabError> {
        let url = self.build_url(path);
        match body {
            Some(body) => debug!("{} {} with body: {}", method, url, body),
            None => debug!("{} {}", method, url),
        }

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header("Accept", "application/json");
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = self.authorize(request).await?.send().await?;

        let status = response.status();
        if status == 404 {
            let body = response.text().await.unwrap_or_default();
            return Err(GitLabError::NotFound(format!(
                "{} {} - {}",
                method,
                path,
                error_message(&body)
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitLabError::Api {
                status: status.as_u16(),
                message: format!("{} {} - {}", method, path, error_message(&body)),
            });
        }

        Ok(response)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitLabError> {
        self.get_with_query(path, &[]).await
    }

    /// Make a GET request with query parameters
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitLabError> {
        let response = self.send(Method::GET, path, query, None).await?;
        Ok(response.json().await?)
    }

    /// Make a POST request
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::POST, path, &[], Some(&body)).await?;
        Ok(response.json().await?)
    }

    /// Make a PUT request
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        self.put_with_query(path, &[], body).await
    }

    /// Make a PUT request with query parameters
    pub async fn put_with_query<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T, GitLabError> {
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::PUT, path, query, Some(&body)).await?;
        Ok(response.json().await?)
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), GitLabError> {
        self.delete_with_query(path, &[]).await
    }

    /// Make a DELETE request with query parameters
    pub async fn delete_with_query(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<(), GitLabError> {
        self.send(Method::DELETE, path, query, None).await?;
        Ok(())
    }

    /// Make a DELETE request with a JSON body
    pub async fn delete_with_body<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), GitLabError> {
        let body = serde_json::to_value(body)?;
        self.send(Method::DELETE, path, &[], Some(&body)).await?;
        Ok(())
    }
}

/// Append `/api/v4` to an instance URL
pub fn api_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with(API_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{}{}", trimmed, API_PREFIX)
    }
}

/// Encode a single path segment (project paths, file paths, variable keys)
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Extract GitLab's `message`/`error` field from an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .map(|m| match m {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        })
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_url() {
        assert_eq!(api_base_url("https://gitlab.com/"), "https://gitlab.com/api/v4");
        assert_eq!(api_base_url("https://gitlab.com"), "https://gitlab.com/api/v4");
        assert_eq!(
            api_base_url("https://gitlab.example.com/api/v4/"),
            "https://gitlab.example.com/api/v4"
        );
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("ci/app.yaml"), "ci%2Fapp.yaml");
        assert_eq!(encode_segment("KEY_1"), "KEY_1");
    }

    #[test]
    fn test_error_message() {
        assert_eq!(error_message(r#"{"message":"404 Group Not Found"}"#), "404 Group Not Found");
        assert_eq!(
            error_message(r#"{"message":{"name":["has already been taken"]}}"#),
            r#"{"name":["has already been taken"]}"#
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }
}
