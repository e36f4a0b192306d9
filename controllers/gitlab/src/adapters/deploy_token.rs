//! Deploy token adapter
//!
//! Like access tokens, deploy tokens are never updated; edits are logged. Revoked or expired
//! tokens are reported as [`Observed::Revoked`]. `token` and `username` are
//! published on creation.

use super::{Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, required_id};
use crate::connection::ConnectionDetails;
use crate::error::ControllerError;
use crate::late_init::{matches_opt, matches_str};
use crate::references::ReferenceResolver;
use crds::{DeployTokenObservation, DeployTokenParameters};
use gitlab_client::{CreateDeployTokenOptions, GitLabClientTrait};
use tracing::{info, warn};

/// Reconciles `DeployToken` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct DeployTokenAdapter;

fn observe_token(token: &gitlab_client::DeployToken) -> DeployTokenObservation {
    DeployTokenObservation {
        id: token.id,
        username: token.username.clone(),
        expires_at: token.expires_at,
        revoked: token.revoked,
        expired: token.expired,
    }
}

/// Desired fields that differ from the issued token
fn immutable_changes(params: &DeployTokenParameters, remote: &gitlab_client::DeployToken) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if params.name != remote.name {
        changed.push("name");
    }
    if !matches_str(&params.username, remote.username.as_deref()) {
        changed.push("username");
    }
    if !matches_opt(&params.expires_at, &remote.expires_at) {
        changed.push("expiresAt");
    }
    let mut desired = params.scopes.clone();
    let mut issued = remote.scopes.clone();
    desired.sort();
    issued.sort();
    if desired != issued {
        changed.push("scopes");
    }
    changed
}

#[async_trait::async_trait]
impl Adapter for DeployTokenAdapter {
    type Kind = crds::DeployToken;
    type Remote = gitlab_client::DeployToken;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<crds::DeployToken>,
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
        obj: &crds::DeployToken,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        Ok(
            match found(
                client.get_project_deploy_token(project_id, id).await,
                format!("deploy token {} of project {}", id, project_id),
            )? {
                None => Observed::Absent,
                Some(token) if token.revoked || token.expired => Observed::Revoked(token),
                Some(token) => Observed::Exists(token),
            },
        )
    }

    fn observation(&self, remote: &Self::Remote) -> DeployTokenObservation {
        observe_token(remote)
    }

    fn is_up_to_date(&self, params: &DeployTokenParameters, remote: &Self::Remote) -> bool {
        let changed = immutable_changes(params, remote);
        if !changed.is_empty() {
            warn!(
                "Deploy token {} cannot be changed after creation; ignoring edits to {}",
                remote.id,
                changed.join(", ")
            );
        }
        true
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &crds::DeployToken,
    ) -> Result<Creation<DeployTokenObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let token = client
            .create_project_deploy_token(
                project_id,
                &CreateDeployTokenOptions {
                    name: params.name.clone(),
                    username: params.username.clone(),
                    expires_at: params.expires_at,
                    scopes: params.scopes.clone(),
                },
            )
            .await
            .map_err(create_failed(format!(
                "deploy token {} of project {}",
                params.name, project_id
            )))?;
        info!("Created deploy token {} for GitLab project {}", token.id, project_id);

        let mut details = ConnectionDetails::new();
        if let Some(value) = token.token.as_deref() {
            details.insert("token", value);
        }
        if let Some(username) = token.username.as_deref() {
            details.insert("username", username);
        }
        Ok(Creation::new(token.id.to_string())
            .with_details(details)
            .with_observation(observe_token(&token)))
    }

    async fn update(
        &self,
        _client: &dyn GitLabClientTrait,
        _external_name: &str,
        _obj: &crds::DeployToken,
        _remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        // Unreachable: is_up_to_date never reports drift
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &crds::DeployToken,
    ) -> Result<(), ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        deleted(
            client.delete_project_deploy_token(project_id, id).await,
            format!("deploy token {} of project {}", id, project_id),
        )?;
        info!("Deleted deploy token {} of GitLab project {}", id, project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{deploy_token, mock_client};

    #[tokio::test]
    async fn test_expired_token_is_revoked() {
        let client = mock_client();
        client.add_deploy_token(
            5,
            gitlab_client::DeployToken {
                id: 8,
                name: "registry".to_string(),
                expired: true,
                ..Default::default()
            },
        );
        let mut obj = deploy_token("registry", "default");
        obj.spec.for_provider.project_id = Some(5);

        let observed = DeployTokenAdapter.observe(client.as_ref(), "8", &obj).await.unwrap();
        assert!(matches!(observed, Observed::Revoked(_)));
    }

    #[tokio::test]
    async fn test_create_publishes_token_and_username() {
        let client = mock_client();
        let mut obj = deploy_token("registry", "default");
        obj.spec.for_provider.project_id = Some(5);
        obj.spec.for_provider.username = Some("puller".to_string());

        let creation = DeployTokenAdapter.create(client.as_ref(), &obj).await.unwrap();
        assert_eq!(creation.connection_details.get("username"), Some(b"puller".as_slice()));
        assert!(creation.connection_details.get("token").is_some());
    }

    #[test]
    fn test_scope_edit_is_reported_not_applied() {
        let remote = gitlab_client::DeployToken {
            id: 8,
            name: "registry".to_string(),
            username: Some("puller".to_string()),
            scopes: vec!["read_registry".to_string()],
            ..Default::default()
        };
        let params = DeployTokenParameters {
            name: "registry".to_string(),
            scopes: vec!["read_registry".to_string(), "write_registry".to_string()],
            ..Default::default()
        };
        assert_eq!(immutable_changes(&params, &remote), vec!["scopes"]);
        assert!(DeployTokenAdapter.is_up_to_date(&params, &remote));
    }
}
