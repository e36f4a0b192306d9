//! ProjectVariable Custom Resource Definition
//!
//! A CI/CD variable of a project. The external name is the variable key; the
//! `environmentScope` is sent with every call so that variables sharing a key
//! across scopes stay distinct.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ProjectVariableSpec defines the desired project CI/CD variable
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "ProjectVariable",
    namespaced,
    status = "ProjectVariableStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVariableSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: ProjectVariableParameters,
}

/// Desired project variable
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVariableParameters {
    /// Project ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `projectId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id_selector: Option<Selector>,

    /// Variable key
    pub key: String,

    /// Variable value
    pub value: String,

    /// env_var or file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,

    /// Only exposed to protected branches and tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,

    /// Hidden in job logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub masked: Option<bool>,

    /// Disable variable expansion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<bool>,

    /// Environment scope; `*` matches every environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,

    /// Description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Observed project variable; the value is never recorded
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectVariableObservation {
    /// Variable key
    pub key: String,

    /// env_var or file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<String>,

    /// Only exposed to protected branches and tags
    #[serde(default)]
    pub protected: bool,

    /// Hidden in job logs
    #[serde(default)]
    pub masked: bool,

    /// Variable expansion disabled
    #[serde(default)]
    pub raw: bool,

    /// Environment scope
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,
}

/// Status of a ProjectVariable
pub type ProjectVariableStatus = ManagedStatus<ProjectVariableObservation>;

crate::managed_resource!(
    ProjectVariable,
    ProjectVariableParameters,
    ProjectVariableObservation
);
