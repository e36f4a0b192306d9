//! GitLab REST API Client
//!
//! A Rust client library for the GitLab REST API v4, covering the resources
//! managed by the GitLab controller: groups, projects, members, tokens,
//! variables, hooks, deploy keys, pipeline schedules, repository files and
//! runners.
//!
//! # Example
//!
//! ```no_run
//! use gitlab_client::{Auth, GitLabClient, GitLabClientTrait, GroupOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitLabClient::new(
//!     "https://gitlab.example.com/",
//!     Auth::PrivateToken("glpat-xxxx".to_string()),
//!     false,
//! )?;
//!
//! let group = client
//!     .create_group(&GroupOptions {
//!         name: Some("platform".to_string()),
//!         path: Some("platform".to_string()),
//!         visibility: Some("private".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("created group {}", group.id);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Sparse options**: unset option fields are never sent, so GitLab keeps
//!   the remote value
//! - **Typed errors**: 404 maps to `GitLabError::NotFound`, other failures
//!   carry the HTTP status
//! - **test-util**: `MockGitLabClient`, an in-memory implementation with a call
//!   log and failure injection

pub mod client;
pub mod common;
pub mod error;
#[path = "trait.rs"]
pub mod gitlab_trait;
#[cfg(feature = "test-util")]
pub mod mock;
pub mod models;

pub use client::GitLabClient;
pub use common::{Auth, HttpClient};
pub use error::GitLabError;
pub use gitlab_trait::GitLabClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockGitLabClient;
pub use models::*;
