//! Controller-specific error types.
//!
//! Every variant maps to a `Synced=False` reason through [`ControllerError::reason`]
//! and to a requeue policy through [`ControllerError::is_transient`].

use crate::classify::{ErrorClass, classify};
use gitlab_client::GitLabError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the GitLab Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// The object handed to a reconciler is of another kind
    #[error("object is not a {expected}: got {actual}")]
    NotThisKind { expected: String, actual: String },

    /// No `spec.providerConfigRef`
    #[error("no provider config reference set")]
    ConfigMissing,

    /// `spec.providerConfigRef` names a ProviderConfig that does not exist
    #[error("provider config {0} not found")]
    ConfigNotFound(String),

    /// Credential sources other than `Secret`
    #[error("unsupported credentials source {0}")]
    UnsupportedCredentialSource(String),

    /// Credentials secret is missing or malformed
    #[error("cannot load credentials: {0}")]
    Credentials(String),

    /// Named reference target does not exist or has no usable external name
    #[error("reference {field}: {message}")]
    ReferenceTargetMissing { field: String, message: String },

    /// Selector matched nothing
    #[error("reference {field}: no object matches selector {selector}")]
    ReferenceNotFound { field: String, selector: String },

    /// Selector matched more than one object
    #[error("reference {field}: {count} objects match selector {selector}")]
    ReferenceAmbiguous {
        field: String,
        selector: String,
        count: usize,
    },

    /// A parent ID is neither set nor resolvable
    #[error("{0} is required")]
    MissingRequiredId(&'static str),

    /// `userName` did not resolve to exactly one user
    #[error("user name {username} matched {count} users")]
    AmbiguousUser { username: String, count: usize },

    #[error("cannot get {context}: {source}")]
    GetFailed {
        context: String,
        #[source]
        source: GitLabError,
    },

    #[error("cannot create {context}: {source}")]
    CreateFailed {
        context: String,
        #[source]
        source: GitLabError,
    },

    #[error("cannot update {context}: {source}")]
    UpdateFailed {
        context: String,
        #[source]
        source: GitLabError,
    },

    #[error("cannot delete {context}: {source}")]
    DeleteFailed {
        context: String,
        #[source]
        source: GitLabError,
    },

    /// External resource exists but its identifier could not be stored
    #[error(
        "external resource may exist without a recorded external name: {0}; \
         set the external-name annotation by hand or delete the remote resource"
    )]
    BindingLost(String),

    /// Annotation, finalizer, spec or status write failed
    #[error("cannot update managed resource: {0}")]
    KubeUpdateFailed(#[source] KubeError),

    /// Connection details could not be written to the secret sink
    #[error("cannot publish connection details: {0}")]
    PublishFailed(#[source] KubeError),

    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Tick deadline passed or shutdown was requested
    #[error("reconciliation canceled: {0}")]
    Canceled(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// External name does not parse into the identifier form of the kind
    #[error("invalid external name {0:?}")]
    InvalidExternalName(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ControllerError {
    /// Reason recorded on the `Synced=False` condition
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotThisKind { .. } => "NotThisKind",
            Self::ConfigMissing => "ConfigMissing",
            Self::ConfigNotFound(_) => "ConfigNotFound",
            Self::UnsupportedCredentialSource(_) => "UnsupportedCredentialSource",
            Self::Credentials(_) => "Credentials",
            Self::ReferenceTargetMissing { .. } => "ReferenceTargetMissing",
            Self::ReferenceNotFound { .. } => "ReferenceNotFound",
            Self::ReferenceAmbiguous { .. } => "ReferenceAmbiguous",
            Self::MissingRequiredId(_) => "MissingRequiredID",
            Self::AmbiguousUser { .. } => "AmbiguousUser",
            Self::GetFailed { .. } => "GetFailed",
            Self::CreateFailed { .. } => "CreateFailed",
            Self::UpdateFailed { .. } => "UpdateFailed",
            Self::DeleteFailed { .. } => "DeleteFailed",
            Self::BindingLost(_) => "BindingLost",
            Self::KubeUpdateFailed(_) => "KubeUpdateFailed",
            Self::PublishFailed(_) => "PublishFailed",
            Self::Kube(_) => "Kube",
            Self::Canceled(_) => "Canceled",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::InvalidExternalName(_) => "InvalidExternalName",
            Self::Watch(_) => "Watch",
            Self::Serialization(_) => "Serialization",
        }
    }

    /// Whether a retry may succeed without a user change
    pub fn is_transient(&self) -> bool {
        match self {
            Self::GetFailed { source, .. }
            | Self::CreateFailed { source, .. }
            | Self::UpdateFailed { source, .. }
            | Self::DeleteFailed { source, .. } => classify(source) == ErrorClass::Transient,
            Self::ConfigNotFound(_)
            | Self::ReferenceTargetMissing { .. }
            | Self::ReferenceNotFound { .. }
            | Self::ReferenceAmbiguous { .. }
            | Self::AmbiguousUser { .. }
            | Self::KubeUpdateFailed(_)
            | Self::PublishFailed(_)
            | Self::Kube(_)
            | Self::Canceled(_)
            | Self::Watch(_) => true,
            Self::NotThisKind { .. }
            | Self::ConfigMissing
            | Self::UnsupportedCredentialSource(_)
            | Self::Credentials(_)
            | Self::MissingRequiredId(_)
            | Self::BindingLost(_)
            | Self::InvalidConfig(_)
            | Self::InvalidExternalName(_)
            | Self::Serialization(_) => false,
        }
    }
}
