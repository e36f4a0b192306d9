//! RepositoryFile Custom Resource Definition
//!
//! A file committed to a project branch. The external name is the file path,
//! which defaults to `filePath` so the file can be observed before it is bound.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// RepositoryFileSpec defines the desired repository file
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "RepositoryFile",
    namespaced,
    status = "RepositoryFileStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFileSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: RepositoryFileParameters,
}

/// Desired repository file
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFileParameters {
    /// Project ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Path of the file within the repository
    pub file_path: String,

    /// Branch to commit to
    pub branch: String,

    /// File content, plain text
    pub content: String,

    /// Commit message used for create, update and delete
    pub commit_message: String,

    /// Commit author email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,

    /// Commit author name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Branch to start the new branch from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_branch: Option<String>,

    /// Mark the file executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execute_filemode: Option<bool>,
}

/// Observed repository file; the content is not recorded
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFileObservation {
    /// Path within the repository
    pub file_path: String,

    /// File name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Size in bytes
    #[serde(default)]
    pub size: i64,

    /// SHA-256 of the content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_sha256: Option<String>,

    /// Blob SHA
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_id: Option<String>,

    /// Last commit touching the file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_commit_id: Option<String>,
}

/// Status of a RepositoryFile
pub type RepositoryFileStatus = ManagedStatus<RepositoryFileObservation>;

crate::managed_resource!(
    RepositoryFile,
    RepositoryFileParameters,
    RepositoryFileObservation
);
