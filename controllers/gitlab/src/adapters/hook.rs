//! Project webhook adapter
//!
//! The secret `token` is write-only on the remote side and never takes part
//! in drift detection; it is sent on every create and update.

use super::{
    Adapter, Creation, Observed, ParamsOf, create_failed, deleted, found, parse_id, required_id, update_failed,
};
use crate::error::ControllerError;
use crate::late_init::{any, late_init_bool, late_init_string, matches, matches_str};
use crate::references::ReferenceResolver;
use crds::{ProjectHook, ProjectHookObservation, ProjectHookParameters};
use gitlab_client::{GitLabClientTrait, HookOptions};
use tracing::info;

/// Reconciles `ProjectHook` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct HookAdapter;

fn hook_options(params: &ProjectHookParameters) -> HookOptions {
    HookOptions {
        url: Some(params.url.clone()),
        token: params.token.clone(),
        push_events: params.push_events,
        push_events_branch_filter: params.push_events_branch_filter.clone(),
        issues_events: params.issues_events,
        confidential_issues_events: params.confidential_issues_events,
        merge_requests_events: params.merge_requests_events,
        tag_push_events: params.tag_push_events,
        note_events: params.note_events,
        job_events: params.job_events,
        pipeline_events: params.pipeline_events,
        wiki_page_events: params.wiki_page_events,
        deployment_events: params.deployment_events,
        releases_events: params.releases_events,
        enable_ssl_verification: params.enable_ssl_verification,
    }
}

fn observe_hook(hook: &gitlab_client::ProjectHook) -> ProjectHookObservation {
    ProjectHookObservation {
        id: hook.id,
        url: hook.url.clone(),
        created_at: hook.created_at,
    }
}

#[async_trait::async_trait]
impl Adapter for HookAdapter {
    type Kind = ProjectHook;
    type Remote = gitlab_client::ProjectHook;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<ProjectHook>,
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
        obj: &ProjectHook,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        Ok(found(
            client.get_project_hook(project_id, id).await,
            format!("hook {} of project {}", id, project_id),
        )?
        .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Self::Remote) -> ProjectHookObservation {
        observe_hook(remote)
    }

    fn late_initialize(&self, params: &mut ProjectHookParameters, remote: &Self::Remote) -> bool {
        any(&[
            late_init_bool(&mut params.push_events, remote.push_events),
            late_init_string(
                &mut params.push_events_branch_filter,
                remote.push_events_branch_filter.as_deref(),
            ),
            late_init_bool(&mut params.issues_events, remote.issues_events),
            late_init_bool(
                &mut params.confidential_issues_events,
                remote.confidential_issues_events,
            ),
            late_init_bool(&mut params.merge_requests_events, remote.merge_requests_events),
            late_init_bool(&mut params.tag_push_events, remote.tag_push_events),
            late_init_bool(&mut params.note_events, remote.note_events),
            late_init_bool(&mut params.job_events, remote.job_events),
            late_init_bool(&mut params.pipeline_events, remote.pipeline_events),
            late_init_bool(&mut params.wiki_page_events, remote.wiki_page_events),
            late_init_bool(&mut params.deployment_events, remote.deployment_events),
            late_init_bool(&mut params.releases_events, remote.releases_events),
            late_init_bool(&mut params.enable_ssl_verification, remote.enable_ssl_verification),
        ])
    }

    fn is_up_to_date(&self, params: &ProjectHookParameters, remote: &Self::Remote) -> bool {
        params.url == remote.url
            && matches(&params.push_events, &remote.push_events)
            && matches_str(
                &params.push_events_branch_filter,
                remote.push_events_branch_filter.as_deref(),
            )
            && matches(&params.issues_events, &remote.issues_events)
            && matches(&params.confidential_issues_events, &remote.confidential_issues_events)
            && matches(&params.merge_requests_events, &remote.merge_requests_events)
            && matches(&params.tag_push_events, &remote.tag_push_events)
            && matches(&params.note_events, &remote.note_events)
            && matches(&params.job_events, &remote.job_events)
            && matches(&params.pipeline_events, &remote.pipeline_events)
            && matches(&params.wiki_page_events, &remote.wiki_page_events)
            && matches(&params.deployment_events, &remote.deployment_events)
            && matches(&params.releases_events, &remote.releases_events)
            && matches(&params.enable_ssl_verification, &remote.enable_ssl_verification)
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &ProjectHook,
    ) -> Result<Creation<ProjectHookObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let hook = client
            .add_project_hook(project_id, &hook_options(params))
            .await
            .map_err(create_failed(format!("hook {} of project {}", params.url, project_id)))?;
        info!("Added hook {} to GitLab project {}", hook.id, project_id);
        Ok(Creation::new(hook.id.to_string()).with_observation(observe_hook(&hook)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectHook,
        _remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        let params = &obj.spec.for_provider;
        let project_id = required_id(params.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        client
            .edit_project_hook(project_id, id, &hook_options(params))
            .await
            .map_err(update_failed(format!("hook {} of project {}", id, project_id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &ProjectHook,
    ) -> Result<(), ControllerError> {
        let project_id = required_id(obj.spec.for_provider.project_id, "projectId")?;
        let id = parse_id(external_name)?;
        deleted(
            client.delete_project_hook(project_id, id).await,
            format!("hook {} of project {}", id, project_id),
        )?;
        info!("Deleted hook {} of GitLab project {}", id, project_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote() -> gitlab_client::ProjectHook {
        gitlab_client::ProjectHook {
            id: 4,
            url: "https://ci.example.com/hook".to_string(),
            push_events: true,
            enable_ssl_verification: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_token_never_drifts() {
        let params = ProjectHookParameters {
            url: "https://ci.example.com/hook".to_string(),
            token: Some("s3cret".to_string()),
            push_events: Some(true),
            ..Default::default()
        };
        assert!(HookAdapter.is_up_to_date(&params, &remote()));
    }

    #[test]
    fn test_event_flag_drift() {
        let params = ProjectHookParameters {
            url: "https://ci.example.com/hook".to_string(),
            push_events: Some(false),
            ..Default::default()
        };
        assert!(!HookAdapter.is_up_to_date(&params, &remote()));
    }

    #[test]
    fn test_late_init_copies_enabled_events() {
        let mut params = ProjectHookParameters {
            url: "https://ci.example.com/hook".to_string(),
            ..Default::default()
        };
        assert!(HookAdapter.late_initialize(&mut params, &remote()));
        assert_eq!(params.push_events, Some(true));
        assert_eq!(params.enable_ssl_verification, Some(true));
        assert_eq!(params.issues_events, None);
        assert!(!HookAdapter.late_initialize(&mut params, &remote()));
    }
}
