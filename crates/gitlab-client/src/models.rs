//! GitLab API models
//!
//! Response types mirror the GitLab REST v4 JSON shapes. Request option structs
//! are sparse: every unset field is omitted from the body, so GitLab leaves the
//! corresponding remote value untouched.

#![allow(missing_docs, reason = "field names are the GitLab REST v4 keys and are documented upstream")]

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GitLab user (basic fields)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
}

/// Member of a group or project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Member {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    pub access_level: i64,
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub member_role: Option<MemberRole>,
}

/// Custom member role attached to a membership
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MemberRole {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Create/edit options for group and project members
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct MemberOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_role_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// GitLab group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub full_path: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub project_creation_level: Option<String>,
    #[serde(default)]
    pub subgroup_creation_level: Option<String>,
    #[serde(default)]
    pub request_access_enabled: bool,
    #[serde(default)]
    pub lfs_enabled: bool,
    #[serde(default)]
    pub membership_lock: bool,
    #[serde(default)]
    pub share_with_group_lock: bool,
    #[serde(default)]
    pub require_two_factor_authentication: bool,
    #[serde(default)]
    pub two_factor_grace_period: i64,
    #[serde(default)]
    pub auto_devops_enabled: Option<bool>,
    #[serde(default)]
    pub emails_disabled: Option<bool>,
    #[serde(default)]
    pub mentions_disabled: Option<bool>,
    #[serde(default)]
    pub default_branch_protection: Option<i64>,
    /// Only returned to group owners
    #[serde(default)]
    pub runners_token: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub shared_with_groups: Vec<GroupShare>,
}

/// A group the group is shared with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GroupShare {
    pub group_id: i64,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub group_full_path: Option<String>,
    pub group_access_level: i64,
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
}

/// Create/update options for groups
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct GroupOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_creation_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgroup_creation_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub membership_lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_with_group_lock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_two_factor_authentication: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub two_factor_grace_period: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_devops_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emails_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions_disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch_protection: Option<i64>,
}

/// Options for sharing a group with another group
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct ShareGroupOptions {
    pub group_id: i64,
    pub group_access: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

/// Namespace a project lives in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectNamespace {
    pub id: i64,
    #[serde(default)]
    pub full_path: Option<String>,
}

/// Container registry cleanup policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ContainerExpirationPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_n: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub older_than: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_regex_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_regex_keep: Option<String>,
}

/// GitLab project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub path_with_namespace: Option<String>,
    #[serde(default)]
    pub name_with_namespace: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub http_url_to_repo: Option<String>,
    #[serde(default)]
    pub ssh_url_to_repo: Option<String>,
    #[serde(default)]
    pub namespace: Option<ProjectNamespace>,
    #[serde(default)]
    pub issues_enabled: bool,
    #[serde(default)]
    pub merge_requests_enabled: bool,
    #[serde(default)]
    pub wiki_enabled: bool,
    #[serde(default)]
    pub snippets_enabled: bool,
    #[serde(default)]
    pub lfs_enabled: bool,
    #[serde(default)]
    pub request_access_enabled: bool,
    #[serde(default)]
    pub shared_runners_enabled: bool,
    #[serde(default)]
    pub only_allow_merge_if_pipeline_succeeds: bool,
    #[serde(default)]
    pub only_allow_merge_if_all_discussions_are_resolved: bool,
    #[serde(default)]
    pub remove_source_branch_after_merge: Option<bool>,
    #[serde(default)]
    pub merge_method: Option<String>,
    #[serde(default)]
    pub ci_config_path: Option<String>,
    #[serde(default)]
    pub build_timeout: Option<i64>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub container_expiration_policy: Option<ContainerExpirationPolicy>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub runners_token: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_activity_at: Option<DateTime<Utc>>,
    /// Date the project was soft-deleted; `marked_for_deletion_on` on newer GitLab
    #[serde(default, alias = "marked_for_deletion_on")]
    pub marked_for_deletion_at: Option<NaiveDate>,
}

/// Create/update options for projects
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct ProjectOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_requests_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippets_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_runners_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_pipeline_succeeds: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_all_discussions_are_resolved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_source_branch_after_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ci_config_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_expiration_policy_attributes: Option<ContainerExpirationPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initialize_with_readme: Option<bool>,
}

/// Query options for `DELETE /projects/:id`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeleteProjectOptions {
    pub permanently_remove: Option<bool>,
    pub full_path: Option<String>,
}

impl DeleteProjectOptions {
    /// Options finalizing removal of an already soft-deleted project
    pub fn permanent(full_path: impl Into<String>) -> Self {
        Self {
            permanently_remove: Some(true),
            full_path: Some(full_path.into()),
        }
    }

    /// Render as query parameters
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(permanently_remove) = self.permanently_remove {
            query.push(("permanently_remove", permanently_remove.to_string()));
        }
        if let Some(full_path) = &self.full_path {
            query.push(("full_path", full_path.clone()));
        }
        query
    }
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

/// Project access token
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectAccessToken {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub access_level: i64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<NaiveDate>,
    /// Only returned on creation
    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for ProjectAccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectAccessToken")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("scopes", &self.scopes)
            .field("revoked", &self.revoked)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Options for creating a project access token
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct CreateProjectAccessTokenOptions {
    pub name: String,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

/// Deploy token
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeployToken {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub expired: bool,
    /// Only returned on creation
    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for DeployToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployToken")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("revoked", &self.revoked)
            .field("expired", &self.expired)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Options for creating a deploy token
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct CreateDeployTokenOptions {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub scopes: Vec<String>,
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

/// Project CI/CD variable
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectVariable {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub variable_type: Option<String>,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub masked: bool,
    #[serde(default)]
    pub raw: bool,
    #[serde(default)]
    pub environment_scope: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl fmt::Debug for ProjectVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectVariable")
            .field("key", &self.key)
            .field("variable_type", &self.variable_type)
            .field("protected", &self.protected)
            .field("masked", &self.masked)
            .field("environment_scope", &self.environment_scope)
            .finish_non_exhaustive()
    }
}

/// Create/update options for project variables
#[derive(Clone, Serialize, Default, PartialEq)]
pub struct VariableOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl fmt::Debug for VariableOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariableOptions")
            .field("key", &self.key)
            .field("environment_scope", &self.environment_scope)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Hooks and deploy keys
// ---------------------------------------------------------------------------

/// Project webhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ProjectHook {
    pub id: i64,
    pub url: String,
    #[serde(default)]
    pub project_id: Option<i64>,
    #[serde(default)]
    pub push_events: bool,
    #[serde(default)]
    pub push_events_branch_filter: Option<String>,
    #[serde(default)]
    pub issues_events: bool,
    #[serde(default)]
    pub confidential_issues_events: bool,
    #[serde(default)]
    pub merge_requests_events: bool,
    #[serde(default)]
    pub tag_push_events: bool,
    #[serde(default)]
    pub note_events: bool,
    #[serde(default)]
    pub job_events: bool,
    #[serde(default)]
    pub pipeline_events: bool,
    #[serde(default)]
    pub wiki_page_events: bool,
    #[serde(default)]
    pub deployment_events: bool,
    #[serde(default)]
    pub releases_events: bool,
    #[serde(default)]
    pub enable_ssl_verification: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update options for project webhooks
#[derive(Clone, Serialize, Default, PartialEq)]
pub struct HookOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_events_branch_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidential_issues_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_requests_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_push_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_page_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub releases_events: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_ssl_verification: Option<bool>,
}

impl fmt::Debug for HookOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookOptions")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

/// Project deploy key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct DeployKey {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub fingerprint: Option<String>,
    #[serde(default)]
    pub can_push: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update options for deploy keys; `key` is only accepted on creation
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct DeployKeyOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_push: Option<bool>,
}

// ---------------------------------------------------------------------------
// Pipeline schedules
// ---------------------------------------------------------------------------

/// Pipeline schedule variable
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PipelineVariable {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub variable_type: Option<String>,
}

/// Pipeline schedule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PipelineSchedule {
    pub id: i64,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "ref", default)]
    pub ref_: String,
    #[serde(default)]
    pub cron: String,
    #[serde(default)]
    pub cron_timezone: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub next_run_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub owner: Option<User>,
    /// Only returned by the single-schedule endpoint
    #[serde(default)]
    pub variables: Vec<PipelineVariable>,
}

/// Create/edit options for pipeline schedules
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct PipelineScheduleOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub ref_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cron_timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Create/edit options for a pipeline schedule variable
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct PipelineVariableOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
}

// ---------------------------------------------------------------------------
// Repository files
// ---------------------------------------------------------------------------

/// Repository file as returned by `GET /projects/:id/repository/files/:path`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RepositoryFile {
    #[serde(default)]
    pub file_name: String,
    pub file_path: String,
    #[serde(default)]
    pub size: i64,
    /// Encoding of `content`; GitLab returns base64
    #[serde(default)]
    pub encoding: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub content_sha256: Option<String>,
    #[serde(rename = "ref", default)]
    pub ref_: String,
    #[serde(default)]
    pub blob_id: Option<String>,
    #[serde(default)]
    pub commit_id: Option<String>,
    #[serde(default)]
    pub last_commit_id: Option<String>,
    #[serde(default)]
    pub execute_filemode: Option<bool>,
}

/// Response to a file create or update
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FileInfo {
    pub file_path: String,
    #[serde(default)]
    pub branch: String,
}

/// Create/update options for repository files
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct FileOptions {
    pub branch: String,
    pub content: String,
    pub commit_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execute_filemode: Option<bool>,
}

/// Options for deleting a repository file
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct DeleteFileOptions {
    pub branch: String,
    pub commit_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

// ---------------------------------------------------------------------------
// Runners
// ---------------------------------------------------------------------------

/// Runner details from `GET /runners/:id`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Runner {
    pub id: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub runner_type: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub run_untagged: bool,
    #[serde(default)]
    pub tag_list: Vec<String>,
    #[serde(default)]
    pub access_level: Option<String>,
    #[serde(default)]
    pub maximum_timeout: Option<i64>,
    #[serde(default)]
    pub maintenance_note: Option<String>,
}

/// Response to `POST /user/runners`
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RunnerRegistration {
    pub id: i64,
    pub token: String,
    #[serde(default)]
    pub token_expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for RunnerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerRegistration")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .field("token_expires_at", &self.token_expires_at)
            .finish()
    }
}

/// Options for `POST /user/runners`
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct CreateRunnerOptions {
    pub runner_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,
    #[serde(flatten)]
    pub settings: RunnerOptions,
}

/// Runner settings shared by create and update
#[derive(Debug, Clone, Serialize, Default, PartialEq)]
pub struct RunnerOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_untagged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_list: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_timeout: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintenance_note: Option<String>,
}
