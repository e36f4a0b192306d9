//! DeployToken Custom Resource Definition
//!
//! Deploy tokens cannot be updated. Revoked or expired tokens are treated as
//! absent. `token` and `username` are published as connection details.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// DeployTokenSpec defines the desired project deploy token
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "DeployToken",
    namespaced,
    status = "DeployTokenStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct DeployTokenSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: DeployTokenParameters,
}

/// Desired deploy token
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployTokenParameters {
    /// Project ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Token name
    pub name: String,

    /// Username for the token; GitLab generates one when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Expiry time (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Scopes, e.g. read_repository, read_registry
    pub scopes: Vec<String>,
}

/// Observed deploy token
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DeployTokenObservation {
    /// GitLab ID
    pub id: i64,

    /// User name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Expiry date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Token has been revoked
    #[serde(default)]
    pub revoked: bool,

    /// Token has expired
    #[serde(default)]
    pub expired: bool,
}

/// Status of a DeployToken
pub type DeployTokenStatus = ManagedStatus<DeployTokenObservation>;

crate::managed_resource!(DeployToken, DeployTokenParameters, DeployTokenObservation);
