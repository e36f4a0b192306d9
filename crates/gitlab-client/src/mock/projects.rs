//! Projects and project members for MockGitLabClient
//!
//! `delete_project` behaves like GitLab with delayed deletion enabled: the
//! first delete marks the project for deletion, a second delete with
//! `permanently_remove=true` and the matching `full_path` removes it. Deleting
//! an already-marked project without those options fails with 400.

use super::MockGitLabClient;
use super::groups::{apply_member_options, new_member};
use crate::error::GitLabError;
use crate::models::*;
use chrono::Utc;

pub async fn get_project(client: &MockGitLabClient, id: i64) -> Result<Project, GitLabError> {
    client.record("get_project", id)?;
    client
        .projects
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Project", id))
}

pub async fn create_project(client: &MockGitLabClient, options: &ProjectOptions) -> Result<Project, GitLabError> {
    client.record("create_project", options.name.as_deref().unwrap_or_default())?;
    let Some(name) = options.name.clone() else {
        return Err(GitLabError::Api {
            status: 400,
            message: "name is required".to_string(),
        });
    };

    let id = client.next_id();
    let path = options
        .path
        .clone()
        .unwrap_or_else(|| name.to_lowercase().replace(' ', "-"));
    let namespace = match options.namespace_id {
        Some(ns) => {
            let full_path = client
                .groups
                .lock()
                .unwrap()
                .get(&ns)
                .and_then(|g| g.full_path.clone())
                .ok_or_else(|| MockGitLabClient::not_found("Namespace", ns))?;
            ProjectNamespace {
                id: ns,
                full_path: Some(full_path),
            }
        }
        None => ProjectNamespace {
            id: 1,
            full_path: Some("root".to_string()),
        },
    };
    let path_with_namespace = format!(
        "{}/{}",
        namespace.full_path.clone().unwrap_or_default(),
        path
    );

    let mut project = Project {
        id,
        name,
        path,
        web_url: Some(format!("{}/{}", client.base_url, path_with_namespace)),
        path_with_namespace: Some(path_with_namespace),
        namespace: Some(namespace),
        visibility: Some("private".to_string()),
        default_branch: Some("main".to_string()),
        issues_enabled: true,
        merge_requests_enabled: true,
        wiki_enabled: true,
        runners_token: Some(format!("GR1348941project-{}", id)),
        created_at: Some(Utc::now()),
        ..Default::default()
    };
    apply_project_options(&mut project, options);

    client.projects.lock().unwrap().insert(id, project.clone());
    Ok(project)
}

pub async fn update_project(client: &MockGitLabClient, id: i64, options: &ProjectOptions) -> Result<Project, GitLabError> {
    client.record("update_project", id)?;
    let mut projects = client.projects.lock().unwrap();
    let project = projects
        .get_mut(&id)
        .ok_or_else(|| MockGitLabClient::not_found("Project", id))?;
    apply_project_options(project, options);
    Ok(project.clone())
}

fn apply_project_options(project: &mut Project, options: &ProjectOptions) {
    if let Some(v) = &options.name {
        project.name = v.clone();
    }
    if let Some(v) = &options.path {
        project.path = v.clone();
    }
    if let Some(v) = &options.description {
        project.description = Some(v.clone());
    }
    if let Some(v) = &options.visibility {
        project.visibility = Some(v.clone());
    }
    if let Some(v) = &options.default_branch {
        project.default_branch = Some(v.clone());
    }
    if let Some(v) = options.issues_enabled {
        project.issues_enabled = v;
    }
    if let Some(v) = options.merge_requests_enabled {
        project.merge_requests_enabled = v;
    }
    if let Some(v) = options.wiki_enabled {
        project.wiki_enabled = v;
    }
    if let Some(v) = options.snippets_enabled {
        project.snippets_enabled = v;
    }
    if let Some(v) = options.lfs_enabled {
        project.lfs_enabled = v;
    }
    if let Some(v) = options.request_access_enabled {
        project.request_access_enabled = v;
    }
    if let Some(v) = options.shared_runners_enabled {
        project.shared_runners_enabled = v;
    }
    if let Some(v) = options.only_allow_merge_if_pipeline_succeeds {
        project.only_allow_merge_if_pipeline_succeeds = v;
    }
    if let Some(v) = options.only_allow_merge_if_all_discussions_are_resolved {
        project.only_allow_merge_if_all_discussions_are_resolved = v;
    }
    if let Some(v) = options.remove_source_branch_after_merge {
        project.remove_source_branch_after_merge = Some(v);
    }
    if let Some(v) = &options.merge_method {
        project.merge_method = Some(v.clone());
    }
    if let Some(v) = &options.ci_config_path {
        project.ci_config_path = Some(v.clone());
    }
    if let Some(v) = options.build_timeout {
        project.build_timeout = Some(v);
    }
    if let Some(v) = &options.topics {
        project.topics = v.clone();
    }
    if let Some(v) = &options.container_expiration_policy_attributes {
        project.container_expiration_policy = Some(v.clone());
    }
}

pub async fn delete_project(client: &MockGitLabClient, id: i64, options: &DeleteProjectOptions) -> Result<(), GitLabError> {
    let detail = std::iter::once(id.to_string())
        .chain(options.query().into_iter().map(|(k, v)| format!("{}={}", k, v)))
        .collect::<Vec<_>>()
        .join(" ");
    client.record("delete_project", detail)?;

    let mut projects = client.projects.lock().unwrap();
    let project = projects
        .get_mut(&id)
        .ok_or_else(|| MockGitLabClient::not_found("Project", id))?;

    if options.permanently_remove == Some(true) {
        if project.marked_for_deletion_at.is_none() {
            return Err(GitLabError::Api {
                status: 400,
                message: "Project must be marked for deletion first".to_string(),
            });
        }
        if options.full_path.as_deref() != project.path_with_namespace.as_deref() {
            return Err(GitLabError::Api {
                status: 400,
                message: "full_path does not match".to_string(),
            });
        }
        projects.remove(&id);
        return Ok(());
    }

    if project.marked_for_deletion_at.is_some() {
        return Err(GitLabError::Api {
            status: 400,
            message: "Project has been already marked for deletion".to_string(),
        });
    }
    project.marked_for_deletion_at = Some(Utc::now().date_naive());
    Ok(())
}

pub async fn get_project_member(client: &MockGitLabClient, project_id: i64, user_id: i64) -> Result<Member, GitLabError> {
    client.record("get_project_member", format!("{}/{}", project_id, user_id))?;
    client
        .project_members
        .lock()
        .unwrap()
        .get(&(project_id, user_id))
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Member", user_id))
}

pub async fn add_project_member(client: &MockGitLabClient, project_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
    let user_id = options.user_id.unwrap_or_default();
    client.record("add_project_member", format!("{}/{}", project_id, user_id))?;
    let member = new_member(client, user_id, options);
    client
        .project_members
        .lock()
        .unwrap()
        .insert((project_id, user_id), member.clone());
    Ok(member)
}

pub async fn edit_project_member(client: &MockGitLabClient, project_id: i64, user_id: i64, options: &MemberOptions) -> Result<Member, GitLabError> {
    client.record("edit_project_member", format!("{}/{}", project_id, user_id))?;
    let mut members = client.project_members.lock().unwrap();
    let member = members
        .get_mut(&(project_id, user_id))
        .ok_or_else(|| MockGitLabClient::not_found("Member", user_id))?;
    apply_member_options(member, options);
    Ok(member.clone())
}

pub async fn remove_project_member(client: &MockGitLabClient, project_id: i64, user_id: i64) -> Result<(), GitLabError> {
    client.record("remove_project_member", format!("{}/{}", project_id, user_id))?;
    client
        .project_members
        .lock()
        .unwrap()
        .remove(&(project_id, user_id))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Member", user_id))
}
