//! PipelineSchedule Custom Resource Definition
//!
//! Schedule variables are reconciled one by one before the schedule itself is
//! edited.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// PipelineScheduleSpec defines the desired pipeline schedule
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "PipelineSchedule",
    namespaced,
    status = "PipelineScheduleStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#,
    printcolumn = r#"{"name":"Next-Run", "type":"date", "jsonPath":".status.atProvider.nextRunAt"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: PipelineScheduleParameters,
}

/// Desired pipeline schedule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleParameters {
    /// Project ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Description
    pub description: String,

    /// Branch or tag the pipeline runs on
    #[serde(rename = "ref")]
    pub ref_: String,

    /// Cron expression
    pub cron: String,

    /// Cron timezone, e.g. UTC
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_timezone: Option<String>,

    /// Token is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    /// Variables passed to scheduled pipelines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<PipelineVariable>>,
}

/// A pipeline schedule variable
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineVariable {
    /// Variable key
    pub key: String,

    /// Variable value
    pub value: String,

    /// env_var (default) or file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,
}

/// Observed pipeline schedule
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PipelineScheduleObservation {
    /// GitLab ID
    pub id: i64,

    /// Next scheduled run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run_at: Option<DateTime<Utc>>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Username of the schedule owner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// Status of a PipelineSchedule
pub type PipelineScheduleStatus = ManagedStatus<PipelineScheduleObservation>;

crate::managed_resource!(
    PipelineSchedule,
    PipelineScheduleParameters,
    PipelineScheduleObservation
);
