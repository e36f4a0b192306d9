//! ProviderConfig and ProviderConfigUsage Custom Resource Definitions
//!
//! A ProviderConfig is a cluster-scoped, named credential bundle for one GitLab
//! instance. Managed resources select one through `spec.providerConfigRef`.
//! Every managed resource that resolves credentials through a ProviderConfig
//! records a ProviderConfigUsage so the ProviderConfig is not deleted while in use.

use crate::conditions::Condition;
use crate::managed::ProviderConfigReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label carried by every ProviderConfigUsage naming its ProviderConfig
pub const PROVIDER_CONFIG_LABEL: &str = "gitlab.microscaler.io/provider-config";

/// Finalizer held on a ProviderConfig while usages exist
pub const IN_USE_FINALIZER: &str = "in-use.gitlab.microscaler.io";

fn default_base_url() -> String {
    "https://gitlab.com/".to_string()
}

/// ProviderConfigSpec defines how to reach and authenticate against GitLab
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "ProviderConfig",
    status = "ProviderConfigStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigSpec {
    /// GitLab base URL (e.g. "https://gitlab.example.com/")
    #[serde(rename = "baseURL", default = "default_base_url")]
    pub base_url: String,

    /// Skip TLS certificate verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure_skip_verify: Option<bool>,

    /// How the credentials are presented to GitLab
    #[serde(default)]
    pub auth_method: AuthMethod,

    /// Where the credentials come from
    pub credentials: ProviderCredentials,
}

/// Authentication method used for GitLab API calls
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum AuthMethod {
    /// Personal, group or project access token (`PRIVATE-TOKEN` header)
    #[default]
    PersonalAccessToken,
    /// CI job token (`JOB-TOKEN` header)
    JobToken,
    /// OAuth2 bearer token
    OAuthToken,
    /// Username and password, stored as JSON `{"username", "password"}`
    BasicAuth,
}

/// Source of the credentials
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum CredentialsSource {
    Secret,
    Environment,
    Filesystem,
    InjectedIdentity,
}

/// Credentials descriptor
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCredentials {
    /// Credential source; only `Secret` is supported
    pub source: CredentialsSource,

    /// Secret key holding the credentials when `source` is `Secret`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SecretKeySelector>,
}

/// Selects a key of a Secret
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name
    pub name: String,
    /// Secret namespace
    pub namespace: String,
    /// Key within the Secret data
    pub key: String,
}

/// ProviderConfigStatus defines the observed state of a ProviderConfig
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigStatus {
    /// Number of managed resources using this ProviderConfig
    #[serde(default)]
    pub users: i64,

    /// Conditions
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

/// ProviderConfigUsageSpec records that a managed resource uses a ProviderConfig
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[kube(
    group = "gitlab.microscaler.io",
    version = "v1alpha1",
    kind = "ProviderConfigUsage"
)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfigUsageSpec {
    /// The ProviderConfig in use
    pub provider_config_ref: ProviderConfigReference,

    /// The managed resource using it
    pub resource_ref: TypedReference,
}

/// Fully-qualified reference to a namespaced object
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypedReference {
    /// API version of the object
    pub api_version: String,
    /// Kind of the object
    pub kind: String,
    /// Name of the object
    pub name: String,
    /// Namespace of the object
    pub namespace: String,
    /// UID of the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_config_defaults() {
        let spec: ProviderConfigSpec = serde_json::from_value(serde_json::json!({
            "credentials": {
                "source": "Secret",
                "secretRef": {"name": "gitlab", "namespace": "crossplane", "key": "token"}
            }
        }))
        .unwrap();

        assert_eq!(spec.base_url, "https://gitlab.com/");
        assert_eq!(spec.auth_method, AuthMethod::PersonalAccessToken);
        assert_eq!(spec.insecure_skip_verify, None);
    }

    #[test]
    fn test_base_url_uses_upper_case_url_key() {
        let spec: ProviderConfigSpec = serde_json::from_value(serde_json::json!({
            "baseURL": "https://gitlab.internal/",
            "authMethod": "BasicAuth",
            "credentials": {"source": "Environment"}
        }))
        .unwrap();

        assert_eq!(spec.base_url, "https://gitlab.internal/");
        assert_eq!(spec.auth_method, AuthMethod::BasicAuth);
        assert_eq!(spec.credentials.source, CredentialsSource::Environment);
    }
}
