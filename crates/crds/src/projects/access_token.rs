//! ProjectAccessToken Custom Resource Definition
//!
//! Access tokens cannot be updated. A revoked token is treated as absent and
//! re-created when the management policy allows it. The token value is only
//! returned at creation and is published as the `token` connection detail.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, NaiveDate, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProjectAccessTokenSpec defines the desired project access token
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "ProjectAccessToken",
    namespaced,
    status = "ProjectAccessTokenStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAccessTokenSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: ProjectAccessTokenParameters,
}

/// Desired project access token
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAccessTokenParameters {
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

    /// Scopes, e.g. api, read_repository
    pub scopes: Vec<String>,

    /// Access level of the token's bot user (10-50)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_level: Option<i64>,

    /// Expiry date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

/// Observed project access token
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAccessTokenObservation {
    /// GitLab ID
    pub id: i64,

    /// Bot user backing the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// Token is active
    #[serde(default)]
    pub active: bool,

    /// Token has been revoked
    #[serde(default)]
    pub revoked: bool,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Expiry date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,
}

/// Status of a ProjectAccessToken
pub type ProjectAccessTokenStatus = ManagedStatus<ProjectAccessTokenObservation>;

crate::managed_resource!(
    ProjectAccessToken,
    ProjectAccessTokenParameters,
    ProjectAccessTokenObservation
);
