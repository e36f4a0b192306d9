//! DeployKey Custom Resource Definition
//!
//! Only `title` and `canPush` can be changed after creation.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// DeployKeySpec defines the desired project deploy key
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "DeployKey",
    namespaced,
    status = "DeployKeyStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DeployKeySpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: DeployKeyParameters,
}

/// Desired deploy key
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployKeyParameters {
    /// Project ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Key title
    pub title: String,

    /// Public SSH key
    pub key: String,

    /// Grant write access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_push: Option<bool>,
}

/// Observed deploy key
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployKeyObservation {
    /// GitLab ID
    pub id: i64,

    /// Key fingerprint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Status of a DeployKey
pub type DeployKeyStatus = ManagedStatus<DeployKeyObservation>;

crate::managed_resource!(DeployKey, DeployKeyParameters, DeployKeyObservation);
