//! ProjectHook Custom Resource Definition

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProjectHookSpec defines the desired project webhook
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "ProjectHook",
    namespaced,
    status = "ProjectHookStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHookSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: ProjectHookParameters,
}

/// Desired project webhook
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHookParameters {
    /// Project ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Hook URL
    pub url: String,

    /// Secret token sent in `X-Gitlab-Token`; GitLab never returns it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Trigger on push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_events: Option<bool>,

    /// Branch filter for push events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_events_branch_filter: Option<String>,

    /// Trigger on issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issues_events: Option<bool>,

    /// Trigger on confidential issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidential_issues_events: Option<bool>,

    /// Trigger on merge requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_requests_events: Option<bool>,

    /// Trigger on tag push
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_push_events: Option<bool>,

    /// Trigger on comments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_events: Option<bool>,

    /// Trigger on job status changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_events: Option<bool>,

    /// Trigger on pipeline status changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline_events: Option<bool>,

    /// Trigger on wiki changes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki_page_events: Option<bool>,

    /// Trigger on deployments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_events: Option<bool>,

    /// Trigger on releases
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub releases_events: Option<bool>,

    /// Verify the hook endpoint certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_ssl_verification: Option<bool>,
}

/// Observed project webhook
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectHookObservation {
    /// GitLab ID
    pub id: i64,

    /// Hook URL
    pub url: String,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Status of a ProjectHook
pub type ProjectHookStatus = ManagedStatus<ProjectHookObservation>;

crate::managed_resource!(ProjectHook, ProjectHookParameters, ProjectHookObservation);
