//! UserRunner Custom Resource Definition
//!
//! A runner registered through `POST /user/runners`. The runner authentication
//! token is only returned at creation and is published as `token`.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// UserRunnerSpec defines the desired runner
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "UserRunner",
    namespaced,
    status = "UserRunnerStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name":"Status", "type":"string", "jsonPath":".status.atProvider.status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct UserRunnerSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: UserRunnerParameters,
}

/// Desired runner
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRunnerParameters {
    /// instance_type, group_type or project_type
    pub runner_type: String,

    /// Group for group_type runners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    /// Object whose external name supplies `groupId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `groupId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_selector: Option<Selector>,

    /// Project for project_type runners
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Runner does not pick up jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused: Option<bool>,

    /// Runner cannot be assigned to other projects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,

    /// Runner picks up untagged jobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_untagged: Option<bool>,

    /// Runner tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_list: Option<Vec<String>>,

    /// not_protected or ref_protected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,

    /// Maximum job timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum_timeout: Option<i64>,

    /// Free-form maintenance note
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_note: Option<String>,
}

/// Observed runner
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRunnerObservation {
    /// GitLab ID
    pub id: i64,

    /// Runner status, e.g. online or stale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Runner is online
    #[serde(default)]
    pub online: bool,

    /// Runner is shared
    #[serde(default)]
    pub is_shared: bool,

    /// Last contact address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,

    /// Authentication token expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
}

/// Status of a UserRunner
pub type UserRunnerStatus = ManagedStatus<UserRunnerObservation>;

crate::managed_resource!(UserRunner, UserRunnerParameters, UserRunnerObservation);
