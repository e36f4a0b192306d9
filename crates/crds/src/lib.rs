//! GitLab Controller CRD Definitions
//!
//! Kubernetes Custom Resource Definitions for GitLab managed resources.
//!
//! Every managed kind shares the same shape:
//! - `spec.providerConfigRef`, `spec.managementPolicy`, `spec.writeConnectionSecretToRef`
//! - `spec.forProvider`: desired remote state (plus cross-resource references)
//! - `status.atProvider`: observed remote state
//! - `status.conditions`: `Ready` and `Synced`

pub mod conditions;
pub mod groups;
pub mod managed;
pub mod projects;
pub mod provider_config;
pub mod references;
pub mod runners;

pub use conditions::*;
pub use groups::*;
pub use managed::*;
pub use projects::*;
pub use provider_config::*;
pub use references::*;
pub use runners::*;
