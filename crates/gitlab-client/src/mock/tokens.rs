//! Project access tokens and deploy tokens for MockGitLabClient
//!
//! Token values are only returned by the create calls, as on GitLab.

use super::MockGitLabClient;
use crate::error::GitLabError;
use crate::models::*;
use chrono::Utc;

pub async fn get_project_access_token(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<ProjectAccessToken, GitLabError> {
    client.record("get_project_access_token", format!("{}/{}", project_id, id))?;
    client
        .access_tokens
        .lock()
        .unwrap()
        .get(&(project_id, id))
        .cloned()
        .map(|mut t| {
            t.token = None;
            t
        })
        .ok_or_else(|| MockGitLabClient::not_found("Token", id))
}

pub async fn create_project_access_token(client: &MockGitLabClient, project_id: i64, options: &CreateProjectAccessTokenOptions) -> Result<ProjectAccessToken, GitLabError> {
    client.record("create_project_access_token", format!("{} {}", project_id, options.name))?;
    let id = client.next_id();
    let token = ProjectAccessToken {
        id,
        name: options.name.clone(),
        user_id: Some(1000 + id),
        scopes: options.scopes.clone(),
        access_level: options.access_level.unwrap_or(40),
        active: true,
        revoked: false,
        created_at: Some(Utc::now()),
        expires_at: options.expires_at,
        token: Some(format!("glpat-mock-{}", id)),
    };
    client
        .access_tokens
        .lock()
        .unwrap()
        .insert((project_id, id), token.clone());
    Ok(token)
}

pub async fn revoke_project_access_token(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<(), GitLabError> {
    client.record("revoke_project_access_token", format!("{}/{}", project_id, id))?;
    let mut tokens = client.access_tokens.lock().unwrap();
    let token = tokens
        .get_mut(&(project_id, id))
        .ok_or_else(|| MockGitLabClient::not_found("Token", id))?;
    token.revoked = true;
    token.active = false;
    Ok(())
}

pub async fn get_project_deploy_token(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<DeployToken, GitLabError> {
    client.record("get_project_deploy_token", format!("{}/{}", project_id, id))?;
    client
        .deploy_tokens
        .lock()
        .unwrap()
        .get(&(project_id, id))
        .cloned()
        .map(|mut t| {
            t.token = None;
            t
        })
        .ok_or_else(|| MockGitLabClient::not_found("Deploy Token", id))
}

pub async fn create_project_deploy_token(client: &MockGitLabClient, project_id: i64, options: &CreateDeployTokenOptions) -> Result<DeployToken, GitLabError> {
    client.record("create_project_deploy_token", format!("{} {}", project_id, options.name))?;
    let id = client.next_id();
    let token = DeployToken {
        id,
        name: options.name.clone(),
        username: Some(
            options
                .username
                .clone()
                .unwrap_or_else(|| format!("gitlab+deploy-token-{}", id)),
        ),
        expires_at: options.expires_at,
        scopes: options.scopes.clone(),
        revoked: false,
        expired: false,
        token: Some(format!("gldt-mock-{}", id)),
    };
    client
        .deploy_tokens
        .lock()
        .unwrap()
        .insert((project_id, id), token.clone());
    Ok(token)
}

pub async fn delete_project_deploy_token(client: &MockGitLabClient, project_id: i64, id: i64) -> Result<(), GitLabError> {
    client.record("delete_project_deploy_token", format!("{}/{}", project_id, id))?;
    client
        .deploy_tokens
        .lock()
        .unwrap()
        .remove(&(project_id, id))
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Deploy Token", id))
}
