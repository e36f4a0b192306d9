//! Project variables, hooks and deploy keys for MockGitLabClient

use super::MockGitLabClient;
use crate::error::GitLabError;
use crate::models::*;
use chrono::Utc;

/// Scope used when none is given
const DEFAULT_SCOPE: &str = "*";

fn scope_of(scope: Option<&str>) -> String {
    scope.unwrap_or(DEFAULT_SCOPE).to_string()
}

pub async fn get_project_variable(client: &MockGitLabClient, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<ProjectVariable, GitLabError> {
    client.record("get_project_variable", format!("{}/{} {}", project_id, key, scope_of(environment_scope)))?;
    let variables = client.variables.lock().unwrap();
    let found = match environment_scope {
        Some(scope) => variables.get(&(project_id, key.to_string(), scope.to_string())),
        None => variables
            .iter()
            .filter(|((p, k, _), _)| *p == project_id && k == key)
            .map(|(_, v)| v)
            .next(),
    };
    found
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Variable", key))
}

pub async fn create_project_variable(client: &MockGitLabClient, project_id: i64, options: &VariableOptions) -> Result<ProjectVariable, GitLabError> {
    let key = options.key.clone().unwrap_or_default();
    let scope = scope_of(options.environment_scope.as_deref());
    client.record("create_project_variable", format!("{}/{} {}", project_id, key, scope))?;

    let mut variables = client.variables.lock().unwrap();
    let id = (project_id, key.clone(), scope.clone());
    if variables.contains_key(&id) {
        return Err(GitLabError::Api {
            status: 400,
            message: format!("{} has already been taken", key),
        });
    }
    let mut variable = ProjectVariable {
        key,
        variable_type: Some("env_var".to_string()),
        environment_scope: Some(scope),
        ..Default::default()
    };
    apply_variable_options(&mut variable, options);
    variables.insert(id, variable.clone());
    Ok(variable)
}

pub async fn update_project_variable(client: &MockGitLabClient, project_id: i64, key: &str, options: &VariableOptions) -> Result<ProjectVariable, GitLabError> {
    let scope = scope_of(options.environment_scope.as_deref());
    client.record("update_project_variable", format!("{}/{} {}", project_id, key, scope))?;
    let mut variables = client.variables.lock().unwrap();
    let variable = variables
        .get_mut(&(project_id, key.to_string(), scope))
        .ok_or_else(|| MockGitLabClient::not_found("Variable", key))?;
    apply_variable_options(variable, options);
    Ok(variable.clone())
}

fn apply_variable_options(variable: &mut ProjectVariable, options: &VariableOptions) {
    if let Some(v) = &options.value {
        variable.value = v.clone();
    }
    if let Some(v) = &options.variable_type {
        variable.variable_type = Some(v.clone());
    }
    if let Some(v) = options.protected {
        variable.protected = v;
    }
    if let Some(v) = options.masked {
        variable.masked = v;
    }
    if let Some(v) = options.raw {
        variable.raw = v;
    }
    if let Some(v) = &options.description {
        variable.description = Some(v.clone());
    }
}

pub async fn remove_project_variable(client: &MockGitLabClient, project_id: i64, key: &str, environment_scope: Option<&str>) -> Result<(), GitLabError> {
    let scope = scope_of(environment_scope);
    client.record("remove_project_variable", format!("{}/{} {}", project_id, key, scope))?;
    client
        .variables
        .lock()
        .unwrap()
        .remove(&(project_id, key.to_string(), scope))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Variable", key))
}

pub async fn get_project_hook(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<ProjectHook, GitLabError> {
    client.record("get_project_hook", format!("{}/{}", project_id, id))?;
    client
        .hooks
        .lock()
        .unwrap()
        .get(&(project_id, id))
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Hook", id))
}

pub async fn add_project_hook(client: &MockGitLabClient, project_id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError> {
    client.record("add_project_hook", project_id)?;
    let id = client.next_id();
    let mut hook = ProjectHook {
        id,
        project_id: Some(project_id),
        push_events: true,
        enable_ssl_verification: true,
        created_at: Some(Utc::now()),
        ..Default::default()
    };
    apply_hook_options(&mut hook, options);
    client
        .hooks
        .lock()
        .unwrap()
        .insert((project_id, id), hook.clone());
    Ok(hook)
}

pub async fn edit_project_hook(client: &MockGitLabClient, project_id: i64, id: i64, options: &HookOptions) -> Result<ProjectHook, GitLabError> {
    client.record("edit_project_hook", format!("{}/{}", project_id, id))?;
    let mut hooks = client.hooks.lock().unwrap();
    let hook = hooks
        .get_mut(&(project_id, id))
        .ok_or_else(|| MockGitLabClient::not_found("Hook", id))?;
    apply_hook_options(hook, options);
    Ok(hook.clone())
}

fn apply_hook_options(hook: &mut ProjectHook, options: &HookOptions) {
    if let Some(v) = &options.url {
        hook.url = v.clone();
    }
    if let Some(v) = &options.push_events_branch_filter {
        hook.push_events_branch_filter = Some(v.clone());
    }
    let flags = [
        (options.push_events, &mut hook.push_events),
        (options.issues_events, &mut hook.issues_events),
        (options.confidential_issues_events, &mut hook.confidential_issues_events),
        (options.merge_requests_events, &mut hook.merge_requests_events),
        (options.tag_push_events, &mut hook.tag_push_events),
        (options.note_events, &mut hook.note_events),
        (options.job_events, &mut hook.job_events),
        (options.pipeline_events, &mut hook.pipeline_events),
        (options.wiki_page_events, &mut hook.wiki_page_events),
        (options.deployment_events, &mut hook.deployment_events),
        (options.releases_events, &mut hook.releases_events),
        (options.enable_ssl_verification, &mut hook.enable_ssl_verification),
    ];
    for (desired, current) in flags {
        if let Some(v) = desired {
            *current = v;
        }
    }
}

pub async fn delete_project_hook(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<(), GitLabError> {
    client.record("delete_project_hook", format!("{}/{}", project_id, id))?;
    client
        .hooks
        .lock()
        .unwrap()
        .remove(&(project_id, id))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Hook", id))
}

pub async fn get_deploy_key(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<DeployKey, GitLabError> {
    client.record("get_deploy_key", format!("{}/{}", project_id, id))?;
    client
        .deploy_keys
        .lock()
        .unwrap()
        .get(&(project_id, id))
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Deploy Key", id))
}

pub async fn add_deploy_key(client: &MockGitLabClient, project_id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError> {
    client.record("add_deploy_key", project_id)?;
    let id = client.next_id();
    let key = DeployKey {
        id,
        title: options.title.clone().unwrap_or_default(),
        key: options.key.clone().unwrap_or_default(),
        fingerprint: Some(format!("SHA256:mock{}", id)),
        can_push: options.can_push.unwrap_or(false),
        created_at: Some(Utc::now()),
    };
    client
        .deploy_keys
        .lock()
        .unwrap()
        .insert((project_id, id), key.clone());
    Ok(key)
}

pub async fn update_deploy_key(client: &MockGitLabClient, project_id: i64, id: i64, options: &DeployKeyOptions) -> Result<DeployKey, GitLabError> {
    client.record("update_deploy_key", format!("{}/{}", project_id, id))?;
    let mut keys = client.deploy_keys.lock().unwrap();
    let key = keys
        .get_mut(&(project_id, id))
        .ok_or_else(|| MockGitLabClient::not_found("Deploy Key", id))?;
    if let Some(title) = &options.title {
        key.title = title.clone();
    }
    if let Some(can_push) = options.can_push {
        key.can_push = can_push;
    }
    Ok(key.clone())
}

pub async fn delete_deploy_key(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<(), GitLabError> {
    client.record("delete_deploy_key", format!("{}/{}", project_id, id))?;
    client
        .deploy_keys
        .lock()
        .unwrap()
        .remove(&(project_id, id))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Deploy Key", id))
}
