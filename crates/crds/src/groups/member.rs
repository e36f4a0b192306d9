//! GroupMember Custom Resource Definition
//!
//! Grants a GitLab user access to a group. The user is given either by
//! `userId` or by `userName`; a user name is resolved to an ID on every
//! reconciliation and never written back.

use crate::managed::{ManagedStatus, ResourceSpec};
use crate::references::{Reference, Selector};
use chrono::{DateTime, NaiveDate, Utc};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// GroupMemberSpec defines the desired membership of a user in a group
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "GroupMember",
    namespaced,
    status = "GroupMemberStatus",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name":"Synced", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Synced\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberSpec {
    /// Provider config, management policy and connection secret
    #[serde(flatten)]
    pub resource_spec: ResourceSpec,

    /// Desired remote settings
    pub for_provider: GroupMemberParameters,
}

/// Desired group membership
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberParameters {
    /// Group ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,

    /// Object whose external name supplies `groupId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_ref: Option<Reference>,

    /// Selects the object whose external name supplies `groupId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id_selector: Option<Selector>,

    /// User ID; takes precedence over `userName`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,

    /// User name, resolved to a user ID when `userId` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,

    /// Access level (10 guest, 20 reporter, 30 developer, 40 maintainer, 50 owner)
    pub access_level: i64,

    /// Membership expiry date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,

    /// Custom member role ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_role_id: Option<i64>,
}

/// Observed group membership
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct GroupMemberObservation {
    /// User ID
    pub user_id: i64,

    /// User name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// User state, e.g. active or blocked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// Web URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,

    /// Access level
    pub access_level: i64,

    /// Expiry date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<NaiveDate>,

    /// Creation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Status of a GroupMember
pub type GroupMemberStatus = ManagedStatus<GroupMemberObservation>;

crate::managed_resource!(GroupMember, GroupMemberParameters, GroupMemberObservation);
