//! Project membership adapter

use super::{
    Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, required_id, resolve_user,
    update_failed,
};
use crate::error::ControllerError;
use crate::references::ReferenceResolver;
use crds::{ProjectMember, ProjectMemberObservation, ProjectMemberParameters};
use gitlab_client::{GitLabClientTrait, Member, MemberOptions};
use tracing::info;

/// Reconciles `ProjectMember` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectMemberAdapter;

fn observe_member(member: &Member) -> ProjectMemberObservation {
    ProjectMemberObservation {
        user_id: member.id,
        username: Some(member.username.clone()).filter(|u| !u.is_empty()),
        name: Some(member.name.clone()).filter(|n| !n.is_empty()),
        state: member.state.clone(),
        web_url: member.web_url.clone(),
        access_level: member.access_level,
        expires_at: member.expires_at,
        created_at: member.created_at,
    }
}

#[async_trait::async_trait]
impl Adapter for ProjectMemberAdapter {
    type Kind = ProjectMember;
    type Remote = Member;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<ProjectMember>,
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

    async fn prepare(
        &self,
        client: &dyn GitLabClientTrait,
        params: &mut ProjectMemberParameters,
    ) -> Result<(), ControllerError> {
        resolve_user(client, &mut params.user_id, params.user_name.as_deref()).await
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectMember,
    ) -> Result<Observed<Member>, ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let user_id = parse_id(external_name)?;
        Ok(found(
            client.get_project_member(project_id, user_id).await,
            format!("member {} of project {}", user_id, project_id),
        )?
        .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Member) -> ProjectMemberObservation {
        observe_member(remote)
    }

    fn is_up_to_date(&self, params: &ProjectMemberParameters, remote: &Member) -> bool {
        params.access_level == remote.access_level && params.expires_at == remote.expires_at
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &ProjectMember,
    ) -> Result<Creation<ProjectMemberObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let user_id = required_id(params.user_id, "userId")?;
        let member = client
            .add_project_member(
                project_id,
                &MemberOptions {
                    user_id: Some(user_id),
                    access_level: Some(params.access_level),
                    expires_at: params.expires_at,
                    member_role_id: None,
                },
            )
            .await
            .map_err(create_failed(format!("member {} of project {}", user_id, project_id)))?;
        info!("Added user {} to GitLab project {}", member.id, project_id);
        Ok(Creation::new(member.id.to_string()).with_observation(observe_member(&member)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectMember,
        _remote: &Member,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let user_id = parse_id(external_name)?;
        client
            .edit_project_member(
                project_id,
                user_id,
                &MemberOptions {
                    access_level: Some(params.access_level),
                    expires_at: params.expires_at,
                    ..Default::default()
                },
            )
            .await
            .map_err(update_failed(format!("member {} of project {}", user_id, project_id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectMember,
    ) -> Result<(), ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let user_id = parse_id(external_name)?;
        deleted(
            client.remove_project_member(project_id, user_id).await,
            format!("member {} of project {}", user_id, project_id),
        )?;
        info!("Removed user {} from GitLab project {}", user_id, project_id);
        Ok(())
    }
}
