//! Project access token adapter
//!
//! Tokens cannot be updated; edits to an issued token are logged and otherwise
//! ignored. A revoked token is reported as [`Observed::Revoked`]
//! so the engine may mint a replacement. The token value is only known at
//! creation and is published as `token`.

use super::{Adapter, Creation, Observed, ParamsOf, create_failed, found, parse_id, required_id};
use crate::classify::is_not_found;
use crate::connection::ConnectionDetails;
use crate::error::ControllerError;
use crate::late_init::{matches, matches_opt};
use crate::references::ReferenceResolver;
use crds::{ManagedResource, ProjectAccessToken, ProjectAccessTokenObservation, ProjectAccessTokenParameters};
use gitlab_client::{CreateProjectAccessTokenOptions, GitLabClientTrait};
use tracing::{info, warn};

/// Reconciles `ProjectAccessToken` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessTokenAdapter;

fn observe_token(token: &gitlab_client::ProjectAccessToken) -> ProjectAccessTokenObservation {
    ProjectAccessTokenObservation {
        id: token.id,
        user_id: token.user_id,
        active: token.active,
        revoked: token.revoked,
        created_at: token.created_at,
        expires_at: token.expires_at,
    }
}

/// Desired fields that differ from the issued token
fn immutable_changes(params: &ProjectAccessTokenParameters, remote: &gitlab_client::ProjectAccessToken) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if params.name != remote.name {
        changed.push("name");
    }
    let mut desired = params.scopes.clone();
    let mut issued = remote.scopes.clone();
    desired.sort();
    issued.sort();
    if desired != issued {
        changed.push("scopes");
    }
    if !matches(&params.access_level, &remote.access_level) {
        changed.push("accessLevel");
    }
    if !matches_opt(&params.expires_at, &remote.expires_at) {
        changed.push("expiresAt");
    }
    changed
}

#[async_trait::async_trait]
impl Adapter for AccessTokenAdapter {
    type Kind = ProjectAccessToken;
    type Remote = gitlab_client::ProjectAccessToken;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<ProjectAccessToken>,
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
        obj: &ProjectAccessToken,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        Ok(
            match found(
                client.get_project_access_token(project_id, id).await,
                format!("access token {} of project {}", id, project_id),
            )? {
                None => Observed::Absent,
                Some(token) if token.revoked => Observed::Revoked(token),
                Some(token) => Observed::Exists(token),
            },
        )
    }

    fn observation(&self, remote: &Self::Remote) -> ProjectAccessTokenObservation {
        observe_token(remote)
    }

    fn is_up_to_date(&self, params: &ProjectAccessTokenParameters, remote: &Self::Remote) -> bool {
        let changed = immutable_changes(params, remote);
        if !changed.is_empty() {
            warn!(
                "Access token {} cannot be changed after creation; ignoring edits to {}",
                remote.id,
                changed.join(", ")
            );
        }
        true
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &ProjectAccessToken,
    ) -> Result<Creation<ProjectAccessTokenObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let token = client
            .create_project_access_token(
                project_id,
                &CreateProjectAccessTokenOptions {
                    name: params.name.clone(),
                    scopes: params.scopes.clone(),
                    access_level: params.access_level,
                    expires_at: params.expires_at,
                },
            )
            .await
            .map_err(create_failed(format!(
                "access token {} of project {}",
                params.name, project_id
            )))?;
        info!("Created access token {} for GitLab project {}", token.id, project_id);

        let mut details = ConnectionDetails::new();
        if let Some(value) = token.token.as_deref() {
            details.insert("token", value);
        }
        Ok(Creation::new(token.id.to_string())
            .with_details(details)
            .with_observation(observe_token(&token)))
    }

    async fn update(
        &self,
        _client: &dyn GitLabClientTrait,
        _external_name: &str,
        _obj: &ProjectAccessToken,
        _remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        // Unreachable: is_up_to_date never reports drift
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectAccessToken,
    ) -> Result<(), ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        // Already revoked tokens cannot be revoked again
        if obj.at_provider().is_some_and(|o| o.revoked) {
            return Ok(());
        }
        match client.revoke_project_access_token(project_id, id).await {
            Ok(()) => {
                info!("Revoked access token {} of GitLab project {}", id, project_id);
                Ok(())
            }
            Err(e) if is_not_found(&e) => Ok(()),
            Err(source) => Err(ControllerError::DeleteFailed {
                context: format!("access token {} of project {}", id, project_id),
                source,
            }),
        }
    }
}
