//! Project adapter
//!
//! A project marked for deletion still exists. With `permanentlyRemove` set,
//! delete is two calls: the soft delete, then a second delete carrying
//! `permanently_remove=true` and the observed `path_with_namespace`.

use super::{Adapter, Creation, Observed, ParamsOf, create_failed, found, parse_id, update_failed};
use crate::classify::is_not_found;
use crate::connection::ConnectionDetails;
use crate::error::ControllerError;
use crate::late_init::{
    any, late_init, late_init_bool, late_init_i64, late_init_list, late_init_string, matches, matches_list,
    matches_opt, matches_str,
};
use crate::references::ReferenceResolver;
use crds::{ContainerExpirationPolicy, ManagedResource, Project, ProjectObservation, ProjectParameters};
use gitlab_client::{DeleteProjectOptions, GitLabClientTrait, ProjectOptions};
use tracing::{debug, info};

/// Reconciles `Project` objects
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectAdapter;

fn to_remote_policy(policy: &ContainerExpirationPolicy) -> gitlab_client::ContainerExpirationPolicy {
    gitlab_client::ContainerExpirationPolicy {
        cadence: policy.cadence.clone(),
        enabled: policy.enabled,
        keep_n: policy.keep_n,
        older_than: policy.older_than.clone(),
        name_regex_delete: policy.name_regex_delete.clone(),
        name_regex_keep: policy.name_regex_keep.clone(),
    }
}

fn from_remote_policy(policy: &gitlab_client::ContainerExpirationPolicy) -> ContainerExpirationPolicy {
    ContainerExpirationPolicy {
        cadence: policy.cadence.clone(),
        enabled: policy.enabled,
        keep_n: policy.keep_n,
        older_than: policy.older_than.clone(),
        name_regex_delete: policy.name_regex_delete.clone(),
        name_regex_keep: policy.name_regex_keep.clone(),
    }
}

fn policy_matches(desired: &Option<ContainerExpirationPolicy>, observed: Option<&gitlab_client::ContainerExpirationPolicy>) -> bool {
    let Some(desired) = desired else {
        return true;
    };
    let Some(observed) = observed else {
        return false;
    };
    matches_opt(&desired.cadence, &observed.cadence)
        && matches_opt(&desired.enabled, &observed.enabled)
        && matches_opt(&desired.keep_n, &observed.keep_n)
        && matches_opt(&desired.older_than, &observed.older_than)
        && matches_opt(&desired.name_regex_delete, &observed.name_regex_delete)
        && matches_opt(&desired.name_regex_keep, &observed.name_regex_keep)
}

/// Options shared by create and update
fn project_options(params: &ProjectParameters) -> ProjectOptions {
    ProjectOptions {
        name: Some(params.name.clone()),
        path: params.path.clone(),
        description: params.description.clone(),
        visibility: params.visibility.clone(),
        default_branch: params.default_branch.clone(),
        issues_enabled: params.issues_enabled,
        merge_requests_enabled: params.merge_requests_enabled,
        wiki_enabled: params.wiki_enabled,
        snippets_enabled: params.snippets_enabled,
        lfs_enabled: params.lfs_enabled,
        request_access_enabled: params.request_access_enabled,
        shared_runners_enabled: params.shared_runners_enabled,
        only_allow_merge_if_pipeline_succeeds: params.only_allow_merge_if_pipeline_succeeds,
        only_allow_merge_if_all_discussions_are_resolved: params
            .only_allow_merge_if_all_discussions_are_resolved,
        remove_source_branch_after_merge: params.remove_source_branch_after_merge,
        merge_method: params.merge_method.clone(),
        ci_config_path: params.ci_config_path.clone(),
        build_timeout: params.build_timeout,
        topics: params.topics.clone(),
        container_expiration_policy_attributes: params
            .container_expiration_policy
            .as_ref()
            .map(to_remote_policy),
        ..Default::default()
    }
}

fn observe_project(project: &gitlab_client::Project) -> ProjectObservation {
    ProjectObservation {
        id: project.id,
        path_with_namespace: project.path_with_namespace.clone(),
        name_with_namespace: project.name_with_namespace.clone(),
        web_url: project.web_url.clone(),
        http_url_to_repo: project.http_url_to_repo.clone(),
        ssh_url_to_repo: project.ssh_url_to_repo.clone(),
        archived: project.archived,
        created_at: project.created_at,
        last_activity_at: project.last_activity_at,
        marked_for_deletion_at: project.marked_for_deletion_at,
    }
}

#[async_trait::async_trait]
impl Adapter for ProjectAdapter {
    type Kind = Project;
    type Remote = gitlab_client::Project;

    async fn resolve_references(
        &self,
        resolver: &mut ReferenceResolver,
        params: &mut ParamsOf<Project>,
    ) -> Result<(), ControllerError> {
        resolver
            .group_id(
                "namespaceId",
                &mut params.namespace_id,
                params.namespace_id_ref.as_ref(),
                params.namespace_id_selector.as_ref(),
            )
            .await
    }

    async fn observe(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        _obj: &Project,
    ) -> Result<Observed<Self::Remote>, ControllerError> {
        let id = parse_id(external_name)?;
        Ok(found(client.get_project(id).await, format!("project {}", id))?
            .map_or(Observed::Absent, Observed::Exists))
    }

    fn observation(&self, remote: &Self::Remote) -> ProjectObservation {
        observe_project(remote)
    }

    fn late_initialize(&self, params: &mut ProjectParameters, remote: &Self::Remote) -> bool {
        any(&[
            late_init_string(&mut params.path, Some(remote.path.as_str())),
            late_init(
                &mut params.namespace_id,
                remote.namespace.as_ref().map(|n| &n.id),
            ),
            late_init_string(&mut params.description, remote.description.as_deref()),
            late_init_string(&mut params.visibility, remote.visibility.as_deref()),
            late_init_string(&mut params.default_branch, remote.default_branch.as_deref()),
            late_init_bool(&mut params.issues_enabled, remote.issues_enabled),
            late_init_bool(&mut params.merge_requests_enabled, remote.merge_requests_enabled),
            late_init_bool(&mut params.wiki_enabled, remote.wiki_enabled),
            late_init_bool(&mut params.snippets_enabled, remote.snippets_enabled),
            late_init_bool(&mut params.lfs_enabled, remote.lfs_enabled),
            late_init_bool(&mut params.request_access_enabled, remote.request_access_enabled),
            late_init_bool(&mut params.shared_runners_enabled, remote.shared_runners_enabled),
            late_init_bool(
                &mut params.only_allow_merge_if_pipeline_succeeds,
                remote.only_allow_merge_if_pipeline_succeeds,
            ),
            late_init_bool(
                &mut params.only_allow_merge_if_all_discussions_are_resolved,
                remote.only_allow_merge_if_all_discussions_are_resolved,
            ),
            late_init_bool(
                &mut params.remove_source_branch_after_merge,
                remote.remove_source_branch_after_merge.unwrap_or(false),
            ),
            late_init_string(&mut params.merge_method, remote.merge_method.as_deref()),
            late_init_string(&mut params.ci_config_path, remote.ci_config_path.as_deref()),
            late_init_i64(&mut params.build_timeout, remote.build_timeout.unwrap_or(0)),
            late_init_list(&mut params.topics, &remote.topics),
            late_init(
                &mut params.container_expiration_policy,
                remote
                    .container_expiration_policy
                    .as_ref()
                    .map(from_remote_policy)
                    .as_ref(),
            ),
        ])
    }

    fn is_up_to_date(&self, params: &ProjectParameters, remote: &Self::Remote) -> bool {
        params.name == remote.name
            && matches(&params.path, &remote.path)
            && matches_str(&params.description, remote.description.as_deref())
            && matches_str(&params.visibility, remote.visibility.as_deref())
            && matches_str(&params.default_branch, remote.default_branch.as_deref())
            && matches(&params.issues_enabled, &remote.issues_enabled)
            && matches(&params.merge_requests_enabled, &remote.merge_requests_enabled)
            && matches(&params.wiki_enabled, &remote.wiki_enabled)
            && matches(&params.snippets_enabled, &remote.snippets_enabled)
            && matches(&params.lfs_enabled, &remote.lfs_enabled)
            && matches(&params.request_access_enabled, &remote.request_access_enabled)
            && matches(&params.shared_runners_enabled, &remote.shared_runners_enabled)
            && matches(
                &params.only_allow_merge_if_pipeline_succeeds,
                &remote.only_allow_merge_if_pipeline_succeeds,
            )
            && matches(
                &params.only_allow_merge_if_all_discussions_are_resolved,
                &remote.only_allow_merge_if_all_discussions_are_resolved,
            )
            && matches_opt(
                &params.remove_source_branch_after_merge,
                &remote.remove_source_branch_after_merge,
            )
            && matches_str(&params.merge_method, remote.merge_method.as_deref())
            && matches_str(&params.ci_config_path, remote.ci_config_path.as_deref())
            && matches_opt(&params.build_timeout, &remote.build_timeout)
            && matches_list(&params.topics, &remote.topics)
            && policy_matches(
                &params.container_expiration_policy,
                remote.container_expiration_policy.as_ref(),
            )
    }

    async fn create(
        &self,
        client: &dyn GitLabClientTrait,
        obj: &Project,
    ) -> Result<Creation<ProjectObservation>, ControllerError> {
        let params = &obj.spec.for_provider;
        let options = ProjectOptions {
            namespace_id: params.namespace_id,
            initialize_with_readme: params.initialize_with_readme,
            ..project_options(params)
        };
        let project = client
            .create_project(&options)
            .await
            .map_err(create_failed(format!("project {}", params.name)))?;
        info!(
            "Created GitLab project {} ({})",
            project.id,
            project.path_with_namespace.as_deref().unwrap_or(&project.path)
        );

        let mut details = ConnectionDetails::new();
        if let Some(token) = project.runners_token.as_deref().filter(|t| !t.is_empty()) {
            details.insert("runnersToken", token);
        }
        Ok(Creation::new(project.id.to_string())
            .with_details(details)
            .with_observation(observe_project(&project)))
    }

    async fn update(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &Project,
        _remote: &Self::Remote,
    ) -> Result<(), ControllerError> {
        let id = parse_id(external_name)?;
        client
            .update_project(id, &project_options(&obj.spec.for_provider))
            .await
            .map_err(update_failed(format!("project {}", id)))?;
        Ok(())
    }

    async fn delete(
        &self,
        client: &dyn GitLabClientTrait,
        external_name: &str,
        obj: &Project,
    ) -> Result<(), ControllerError> {
        let id = parse_id(external_name)?;
        let observed = obj.at_provider();

        let already_marked = observed.is_some_and(|o| o.marked_for_deletion_at.is_some());
        match client.delete_project(id, &DeleteProjectOptions::default()).await {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => return Ok(()),
            // A second soft delete of a marked project is rejected; the permanent call still applies
            Err(_) if already_marked && obj.spec.for_provider.permanently_remove == Some(true) => {
                debug!("Project {} was already marked for deletion", id);
            }
            Err(source) => {
                return Err(ControllerError::DeleteFailed {
                    context: format!("project {}", id),
                    source,
                });
            }
        }
        if obj.spec.for_provider.permanently_remove != Some(true) {
            info!("Marked GitLab project {} for deletion", id);
            return Ok(());
        }

        let full_path = match observed.and_then(|o| o.path_with_namespace.clone()) {
            Some(path) => path,
            None => match found(client.get_project(id).await, format!("project {}", id))? {
                Some(project) => project.path_with_namespace.unwrap_or_default(),
                None => return Ok(()),
            },
        };
        match client
            .delete_project(id, &DeleteProjectOptions::permanent(&full_path))
            .await
        {
            Ok(()) => {}
            Err(e) if is_not_found(&e) => {}
            Err(source) => {
                return Err(ControllerError::DeleteFailed {
                    context: format!("permanently remove project {} ({})", id, full_path),
                    source,
                });
            }
        }
        info!("Permanently removed GitLab project {} ({})", id, full_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_client, project};
    use chrono::Utc;
    use crds::ManagedStatus;

    fn remote_project(id: i64, path_with_namespace: &str) -> gitlab_client::Project {
        gitlab_client::Project {
            id,
            name: "web".to_string(),
            path: "web".to_string(),
            path_with_namespace: Some(path_with_namespace.to_string()),
            ..Default::default()
        }
    }

    fn with_observation(mut obj: Project, path_with_namespace: &str) -> Project {
        obj.status = Some(ManagedStatus {
            at_provider: Some(ProjectObservation {
                id: 5,
                path_with_namespace: Some(path_with_namespace.to_string()),
                ..Default::default()
            }),
            conditions: Vec::new(),
        });
        obj
    }

    #[tokio::test]
    async fn test_permanent_removal_is_two_calls() {
        let client = mock_client();
        client.add_project(remote_project(5, "acme/web"));

        let mut obj = with_observation(project("web", "default"), "acme/web");
        obj.spec.for_provider.permanently_remove = Some(true);

        ProjectAdapter.delete(client.as_ref(), "5", &obj).await.unwrap();

        assert_eq!(
            client.mutating_calls(),
            vec![
                "delete_project 5",
                "delete_project 5 permanently_remove=true full_path=acme/web"
            ]
        );
        assert!(client.project(5).is_none());
    }

    #[tokio::test]
    async fn test_permanent_removal_of_marked_project() {
        let client = mock_client();
        let mut marked = remote_project(5, "acme/web");
        marked.marked_for_deletion_at = Some(Utc::now().date_naive());
        client.add_project(marked);

        let mut obj = with_observation(project("web", "default"), "acme/web");
        obj.spec.for_provider.permanently_remove = Some(true);
        if let Some(observed) = obj.status.as_mut().and_then(|s| s.at_provider.as_mut()) {
            observed.marked_for_deletion_at = Some(Utc::now().date_naive());
        }

        ProjectAdapter.delete(client.as_ref(), "5", &obj).await.unwrap();
        assert_eq!(client.calls_to("delete_project").len(), 2);
        assert!(client.project(5).is_none());
    }

    #[tokio::test]
    async fn test_soft_delete_only() {
        let client = mock_client();
        client.add_project(remote_project(5, "acme/web"));

        let obj = project("web", "default");
        ProjectAdapter.delete(client.as_ref(), "5", &obj).await.unwrap();

        assert_eq!(client.mutating_calls(), vec!["delete_project 5"]);
        let remaining = client.project(5).unwrap();
        assert!(remaining.marked_for_deletion_at.is_some());

        let observed = ProjectAdapter.observe(client.as_ref(), "5", &obj).await.unwrap();
        assert!(matches!(observed, Observed::Exists(_)));
    }

    #[tokio::test]
    async fn test_delete_of_absent_project() {
        let client = mock_client();
        let mut obj = project("web", "default");
        obj.spec.for_provider.permanently_remove = Some(true);
        ProjectAdapter.delete(client.as_ref(), "5", &obj).await.unwrap();
        assert_eq!(client.calls_to("delete_project").len(), 1);
    }

    #[test]
    fn test_topics_and_policy_drift() {
        let mut params = project("web", "default").spec.for_provider;
        let mut observed = remote_project(5, "acme/web");
        observed.topics = vec!["rust".to_string()];
        assert!(ProjectAdapter.is_up_to_date(&params, &observed));

        params.topics = Some(Vec::new());
        assert!(!ProjectAdapter.is_up_to_date(&params, &observed));
        params.topics = Some(vec!["rust".to_string()]);
        assert!(ProjectAdapter.is_up_to_date(&params, &observed));

        params.container_expiration_policy = Some(ContainerExpirationPolicy {
            enabled: Some(true),
            ..Default::default()
        });
        assert!(!ProjectAdapter.is_up_to_date(&params, &observed));
        observed.container_expiration_policy = Some(gitlab_client::ContainerExpirationPolicy {
            enabled: Some(true),
            cadence: Some("1d".to_string()),
            ..Default::default()
        });
        assert!(ProjectAdapter.is_up_to_date(&params, &observed));
    }

    #[tokio::test]
    async fn test_create_sends_namespace_and_returns_runners_token() {
        let client = mock_client();
        client.add_group(gitlab_client::Group {
            id: 9,
            name: "acme".to_string(),
            path: "acme".to_string(),
            full_path: Some("acme".to_string()),
            ..Default::default()
        });
        let mut obj = project("web", "default");
        obj.spec.for_provider.namespace_id = Some(9);

        let creation = ProjectAdapter.create(client.as_ref(), &obj).await.unwrap();
        let observation = creation.observation.unwrap();
        assert_eq!(observation.path_with_namespace.as_deref(), Some("acme/web"));
        assert!(creation.connection_details.get("runnersToken").is_some());
    }
}
