//! Deploy key adapter
//!
//! The public key itself cannot be changed after creation; only `title` and
//! `canPush` are compared and updated.

use super::{
    Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, required_id, update_failed,
};
use crate::error::ControllerError;
use crate::late_init::{late_init_bool, matches};
use crate::references::ReferenceResolver;
use crds::{DeployKey, DeployKeyObservation, DeployKeyParameters};
use gitlab_client::{DeployKeyOptions, GitLabClientTrait};
use tracing::info;

/// Reconciles `DeployKey` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct DeployKeyAdapter;

fn observe_key(key: &gitlab_client::DeployKey) -> DeployKeyObservation {
    DeployKeyObservation {
        id: key.id,
        fingerprint: key.fingerprint.clone(),
        created_at: key.created_at,
    }
}

#[async_trait::async_trait]
impl Adapter for DeployKeyAdapter {
    type Kind = DeployKey;
    type Remote = gitlab_client::DeployKey;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<DeployKey>,
    ) -> Result<(), ControllerError> {
        resolver
            .project_id(
                "projectId",
                &mut params.project_id,
                params.project_id_ref.as_ref(),
                params.project_id_selector.as_ref(),
            )
            .await
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &DeployKey,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        Ok(found(
            client.get_deploy_key(project_id, id).await,
            format!("deploy key {} of project {}", id, project_id),
        )?
        .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Self::Remote) -> DeployKeyObservation {
        observe_key(remote)
    }

    fn late_initialize(&self, params: &mut DeployKeyParameters, remote: &Self::Remote) -> bool {
        late_init_bool(&mut params.can_push, remote.can_push)
    }

    fn is_up_to_date(&self, params: &DeployKeyParameters, remote: &Self::Remote) -> bool {
        params.title == remote.title && matches(&params.can_push, &remote.can_push)
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &DeployKey,
    ) -> Result<Creation<DeployKeyObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let key = client
            .add_deploy_key(
                project_id,
                &DeployKeyOptions {
                    title: Some(params.title.clone()),
                    key: Some(params.key.clone()),
                    can_push: params.can_push,
                },
            )
            .await
            .map_err(create_failed(format!(
                "deploy key {} of project {}",
                params.title, project_id
            )))?;
        info!("Added deploy key {} to GitLab project {}", key.id, project_id);
        Ok(Creation::new(key.id.to_string()).with_observation(observe_key(&key)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &DeployKey,
        _remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        client
            .update_deploy_key(
                project_id,
                id,
                &DeployKeyOptions {
                    title: Some(params.title.clone()),
                    key: None,
                    can_push: params.can_push,
                },
            )
            .await
            .map_err(update_failed(format!("deploy key {} of project {}", id, project_id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &DeployKey,
    ) -> Result<(), ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        deleted(
            client.delete_deploy_key(project_id, id).await,
            format!("deploy key {} of project {}", id, project_id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_material_is_not_compared() {
        let params = DeployKeyParameters {
            title: "ci".to_string(),
            key: "ssh-ed25519 AAAA-new".to_string(),
            ..Default::default()
        };
        let remote = gitlab_client::DeployKey {
            id: 1,
            title: "ci".to_string(),
            key: "ssh-ed25519 AAAA-old".to_string(),
            can_push: true,
            ..Default::default()
        };
        assert!(DeployKeyAdapter.is_up_to_date(&params, &remote));

        let params = DeployKeyParameters {
            can_push: Some(false),
            ..params
        };
        assert!(!DeployKeyAdapter.is_up_to_date(&params, &remote));
    }
}
