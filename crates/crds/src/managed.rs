//! Common managed-resource fields and the `ManagedResource` trait
//!
//! Every GitLab CRD embeds `ResourceSpec` (flattened) next to its `forProvider`
//! block and uses `ManagedStatus<Observation>` as its status. The
//! `managed_resource!` macro wires a CRD type to the `ManagedResource` trait so
//! the reconciliation engine can stay generic over kinds.

use crate::conditions::Condition;
use kube::Resource;
use k8s_openapi::NamespaceResourceScope;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// API group of every CRD in this crate
pub const API_GROUP: &str = "gitlab.microscaler.io";

/// API version of every CRD in this crate
pub const API_VERSION: &str = "v1alpha1";

/// Annotation holding the remote identifier bound to a managed resource
pub const EXTERNAL_NAME_ANNOTATION: &str = "gitlab.microscaler.io/external-name";

/// Set immediately before an external create is attempted
pub const CREATE_PENDING_ANNOTATION: &str = "gitlab.microscaler.io/external-create-pending";

/// Set once the external create succeeded and the binding was written
pub const CREATE_SUCCEEDED_ANNOTATION: &str = "gitlab.microscaler.io/external-create-succeeded";

/// Set when the external create call failed
pub const CREATE_FAILED_ANNOTATION: &str = "gitlab.microscaler.io/external-create-failed";

/// JSON map of reference field -> fingerprint of the reference it was resolved from
pub const RESOLVED_REFERENCES_ANNOTATION: &str = "gitlab.microscaler.io/resolved-references";

/// Finalizer held on managed resources until the external resource is gone
pub const MANAGED_FINALIZER: &str = "finalizer.gitlab.microscaler.io";

/// Restricts which actions the controller may take on the external resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ManagementPolicy {
    /// Observe, create, update and delete
    #[default]
    FullControl,
    /// Observe and late-initialize only
    ObserveOnly,
    /// Observe and create, never update or delete
    CreateOnly,
    /// Everything except delete; the external resource is orphaned
    NoDelete,
}

impl ManagementPolicy {
    /// Missing external resources may be created
    pub fn can_create(self) -> bool {
        matches!(self, Self::FullControl | Self::CreateOnly | Self::NoDelete)
    }

    /// Drift may be corrected
    pub fn can_update(self) -> bool {
        matches!(self, Self::FullControl | Self::NoDelete)
    }

    /// The external resource is deleted with the object
    pub fn can_delete(self) -> bool {
        matches!(self, Self::FullControl)
    }
}

/// Reference to a cluster-scoped ProviderConfig
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigReference {
    /// Name of the ProviderConfig
    pub name: String,
}

/// Reference to a Secret receiving connection details
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretReference {
    /// Secret name
    pub name: String,

    /// Secret namespace (defaults to the namespace of the managed resource)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Fields common to every managed resource spec
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    /// ProviderConfig supplying GitLab credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_config_ref: Option<ProviderConfigReference>,

    /// Which reconcile actions may be taken
    #[serde(default)]
    pub management_policy: ManagementPolicy,

    /// Secret to publish connection details (tokens) to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,
}

/// Status shared by every managed resource
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedStatus<O> {
    /// Observed state of the external resource
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub at_provider: Option<O>,

    /// Ready and Synced conditions
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl<O> Default for ManagedStatus<O> {
    fn default() -> Self {
        Self {
            at_provider: None,
            conditions: Vec::new(),
        }
    }
}

/// A declarative object bound to one external GitLab resource.
pub trait ManagedResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
    /// Desired remote state (`spec.forProvider`)
    type Parameters: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    /// Observed remote state (`status.atProvider`)
    type Observation: Clone + Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync;

    fn resource_spec(&self) -> &ResourceSpec;
    fn parameters(&self) -> &Self::Parameters;
    fn parameters_mut(&mut self) -> &mut Self::Parameters;
    fn managed_status(&self) -> Option<&ManagedStatus<Self::Observation>>;
    fn managed_status_mut(&mut self) -> &mut ManagedStatus<Self::Observation>;

    fn management_policy(&self) -> ManagementPolicy {
        self.resource_spec().management_policy
    }

    fn at_provider(&self) -> Option<&Self::Observation> {
        self.managed_status().and_then(|s| s.at_provider.as_ref())
    }

    fn conditions(&self) -> &[Condition] {
        self.managed_status().map_or(&[], |s| s.conditions.as_slice())
    }

    /// Annotation value, treating empty strings as absent
    fn annotation(&self, key: &str) -> Option<&str> {
        self.meta()
            .annotations
            .as_ref()
            .and_then(|a| a.get(key))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn external_name(&self) -> Option<&str> {
        self.annotation(EXTERNAL_NAME_ANNOTATION)
    }

    fn has_finalizer(&self, finalizer: &str) -> bool {
        self.meta()
            .finalizers
            .as_ref()
            .is_some_and(|f| f.iter().any(|x| x == finalizer))
    }

    fn is_being_deleted(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }
}

/// Implement `ManagedResource` for a CRD whose spec has `resource_spec` and
/// `for_provider` fields and whose status is `ManagedStatus<Observation>`.
#[macro_export]
macro_rules! managed_resource {
    ($kind:ty, $params:ty, $observation:ty) => {
        impl $crate::managed::ManagedResource for $kind {
            type Parameters = $params;
            type Observation = $observation;

            fn resource_spec(&self) -> &$crate::managed::ResourceSpec {
                &self.spec.resource_spec
            }

            fn parameters(&self) -> &Self::Parameters {
                &self.spec.for_provider
            }

            fn parameters_mut(&mut self) -> &mut Self::Parameters {
                &mut self.spec.for_provider
            }

            fn managed_status(&self) -> Option<&$crate::managed::ManagedStatus<Self::Observation>> {
                self.status.as_ref()
            }

            fn managed_status_mut(&mut self) -> &mut $crate::managed::ManagedStatus<Self::Observation> {
                self.status.get_or_insert_with(Default::default)
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_management_policy_permissions() {
        assert!(ManagementPolicy::FullControl.can_create());
        assert!(ManagementPolicy::FullControl.can_delete());
        assert!(!ManagementPolicy::ObserveOnly.can_create());
        assert!(!ManagementPolicy::ObserveOnly.can_update());
        assert!(ManagementPolicy::CreateOnly.can_create());
        assert!(!ManagementPolicy::CreateOnly.can_update());
        assert!(!ManagementPolicy::CreateOnly.can_delete());
        assert!(ManagementPolicy::NoDelete.can_update());
        assert!(!ManagementPolicy::NoDelete.can_delete());
    }

    #[test]
    fn test_resource_spec_defaults_to_full_control() {
        let spec: ResourceSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec.management_policy, ManagementPolicy::FullControl);
        assert!(spec.provider_config_ref.is_none());
    }
}
