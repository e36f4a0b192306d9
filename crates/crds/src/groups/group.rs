//! Group Custom Resource Definition
//!
//! Manages a GitLab group. Sub-groups are groups with a `parentId`, which can
//! be resolved from another `Group` through `parentIdRef` or `parentIdSelector`.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, NaiveDate, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// GroupSpec defines the desired state of a GitLab group
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "Group",
    namespaced,
    status = "GroupStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name":"External-Name", "type":"string", "jsonPath":".metadata.annotations.gitlab\\.microscaler\\.io/external-name"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired group settings
    pub for_provider: GroupParameters,
}

/// Desired GitLab group settings
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupParameters {
    /// Group name
    pub name: String,

    /// Group path (URL slug)
    pub path: String,

    /// Group description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Visibility: private, internal or public
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,

    /// Parent group ID; set for sub-groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    /// Group whose external name supplies `parentId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id_ref: Option<Reference>,

    /// Selects the group whose external name supplies `parentId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id_selector: Option<Selector>,

    /// Who may create projects: noone, maintainer or developer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_creation_level: Option<String>,

    /// Who may create sub-groups: owner or maintainer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subgroup_creation_level: Option<String>,

    /// Users may request access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_access_enabled: Option<bool>,

    /// Git LFS enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lfs_enabled: Option<bool>,

    /// Members cannot be added to projects in this group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_lock: Option<bool>,

    /// Projects cannot be shared with other groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_with_group_lock: Option<bool>,

    /// Members must use two-factor authentication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub require_two_factor_authentication: Option<bool>,

    /// Hours before two-factor authentication is enforced
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two_factor_grace_period: Option<i64>,

    /// Auto DevOps enabled by default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_devops_enabled: Option<bool>,

    /// Notification emails disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emails_disabled: Option<bool>,

    /// Group mentions disabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions_disabled: Option<bool>,

    /// Default branch protection level (0-4)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch_protection: Option<i64>,

    /// Groups this group is shared with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_with_groups: Option<Vec<SharedWithGroup>>,
}

/// One group share; `groupId` may come from a reference or selector
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SharedWithGroup {
    /// Group ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    /// Object whose external name supplies `groupId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `groupId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_selector: Option<Selector>,

    /// Access level granted to the invited group (10-50)
    pub group_access_level: i64,

    /// Expiry date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

/// Observed state of a GitLab group
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupObservation {
    /// GitLab ID
    pub id: i64,

    /// Full name including parent groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Full path including parent groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,

    /// Web URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// Parent group ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Groups this group is shared with
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shared_with_groups: Vec<GroupShareObservation>,
}

/// Observed group share
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupShareObservation {
    /// Group ID
    pub group_id: i64,

    /// Full path of the invited group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_full_path: Option<String>,

    /// Access level granted to the invited group
    pub group_access_level: i64,

    /// Expiry date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

/// Status of a Group
pub type GroupStatus = ManagedStatus<GroupObservation>;

crate::managed_resource!(Group, GroupParameters, GroupObservation);
