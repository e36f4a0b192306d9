//! # CRD Generator
//!
//! Prints every CustomResourceDefinition of the GitLab controller as a
//! multi-document YAML stream.
//!
//! ```bash
//! cargo run -p crds --bin crdgen > config/crd/gitlab.yaml
//! cargo run -p crds --bin crdgen | kubectl apply -f -
//! ```

use anyhow::Result;
use crds::{
    DeployKey, DeployToken, Group, GroupMember, PipelineSchedule, Project, ProjectAccessToken,
    ProjectHook, ProjectMember, ProjectVariable, ProviderConfig, ProviderConfigUsage,
    RepositoryFile, UserRunner,
};
use kube::core::CustomResourceExt;

fn main() -> Result<()> {
    let crds = [
        ProviderConfig::crd(),
        ProviderConfigUsage::crd(),
        Group::crd(),
        GroupMember::crd(),
        Project::crd(),
        ProjectMember::crd(),
        ProjectAccessToken::crd(),
        DeployToken::crd(),
        ProjectVariable::crd(),
        ProjectHook::crd(),
        DeployKey::crd(),
        PipelineSchedule::crd(),
        RepositoryFile::crd(),
        UserRunner::crd(),
    ];

    for crd in crds {
        print!("---\n{}", serde_yaml::to_string(&crd)?);
    }

    Ok(())
}
