//! Project Custom Resource Definition
//!
//! Manages a GitLab project. With `permanentlyRemove` set, deleting the
//! resource removes the project immediately instead of leaving it marked for
//! deletion.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, NaiveDate, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProjectSpec defines the desired state of a GitLab project
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "Project",
    namespaced,
    status = "ProjectStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name":"Path", "type":"string", "jsonPath":".status.atProvider.pathWithNamespace"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired project settings
    pub for_provider: ProjectParameters,
}

/// Desired GitLab project settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectParameters {
    /// Project name
    pub name: String,

    /// Project path; GitLab derives it from the name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Namespace (group) ID the project lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id: Option<i64>,

    /// Object whose external name supplies `namespaceId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `namespaceId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_id_selector: Option<Selector>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Visibility: private, internal or public
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,

    /// Default branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,

    /// Issues enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_enabled: Option<bool>,

    /// Merge requests enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_requests_enabled: Option<bool>,

    /// Wiki enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_enabled: Option<bool>,

    /// Snippets enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippets_enabled: Option<bool>,

    /// Git LFS enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,

    /// Users may request access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,

    /// Shared runners enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_runners_enabled: Option<bool>,

    /// Merges require a successful pipeline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_pipeline_succeeds: Option<bool>,

    /// Merges require resolved discussions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only_allow_merge_if_all_discussions_are_resolved: Option<bool>,

    /// Delete the source branch after merge by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_source_branch_after_merge: Option<bool>,

    /// Merge method: merge, rebase_merge or ff
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_method: Option<String>,

    /// Path of the CI configuration file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ci_config_path: Option<String>,

    /// Job timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_timeout: Option<i64>,

    /// Project topics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<String>>,

    /// Cleanup policy for container registry tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_expiration_policy: Option<ContainerExpirationPolicy>,

    /// Only used at creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initialize_with_readme: Option<bool>,

    /// Remove the project immediately on deletion instead of marking it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permanently_remove: Option<bool>,
}

/// Container registry cleanup policy
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContainerExpirationPolicy {
    /// How often the policy runs, e.g. 1d or 7d
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cadence: Option<String>,

    /// Policy enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Tags to keep per image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_n: Option<i64>,

    /// Delete tags older than this, e.g. 90d
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub older_than: Option<String>,

    /// Tags matching this are deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_regex_delete: Option<String>,

    /// Tags matching this are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_regex_keep: Option<String>,
}

/// Observed state of a GitLab project
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectObservation {
    /// GitLab ID
    pub id: i64,

    /// Path including namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_with_namespace: Option<String>,

    /// Name including namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_with_namespace: Option<String>,

    /// Web URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// HTTP clone URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_url_to_repo: Option<String>,

    /// SSH clone URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_url_to_repo: Option<String>,

    /// Project is archived
    #[serde(default)]
    pub archived: bool,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last activity time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_at: Option<DateTime<Utc>>,

    /// Set once the project was soft-deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marked_for_deletion_at: Option<NaiveDate>,
}

/// Status of a Project
pub type ProjectStatus = ManagedStatus<ProjectObservation>;

crate::managed_resource!(Project, ProjectParameters, ProjectObservation);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_round_trips_through_status() {
        let status: ProjectStatus = serde_json::from_value(serde_json::json!({
            "atProvider": {
                "id": 5,
                "pathWithNamespace": "acme/web",
                "markedForDeletionAt": "2026-01-02"
            }
        }))
        .unwrap();

        let observed = status.at_provider.unwrap();
        assert_eq!(observed.id, 5);
        assert_eq!(observed.path_with_namespace.as_deref(), Some("acme/web"));
        assert_eq!(
            observed.marked_for_deletion_at,
            NaiveDate::from_ymd_opt(2026, 1, 2)
        );
        assert!(status.conditions.is_empty());
    }
}
