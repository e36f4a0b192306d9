//! Runners for MockGitLabClient

use super::MockGitLabClient;
use crate::error::GitLabError;
use crate::models::*;

pub async fn get_runner(client: &MockGitLabClient, id: i64) -> Result<Runner, GitLabError> {
    client.record("get_runner", id)?;
    client
        .runners
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or_else(|| MockGitLabClient::not_found("Runner", id))
}

pub async fn create_user_runner(client: &MockGitLabClient, options: &CreateRunnerOptions) -> Result<RunnerRegistration, GitLabError> {
    client.record("create_user_runner", &options.runner_type)?;
    let id = client.next_id();
    let mut runner = Runner {
        id,
        runner_type: Some(options.runner_type.clone()),
        is_shared: options.runner_type == "instance_type",
        status: Some("never_contacted".to_string()),
        online: Some(false),
        run_untagged: true,
        ..Default::default()
    };
    apply_runner_options(&mut runner, &options.settings);
    client.runners.lock().unwrap().insert(id, runner);
    Ok(RunnerRegistration {
        id,
        token: format!("glrt-mock-{}", id),
        token_expires_at: None,
    })
}

pub async fn update_runner(client: &MockGitLabClient, id: i64, options: &RunnerOptions) -> Result<Runner, GitLabError> {
    client.record("update_runner", id)?;
    let mut runners = client.runners.lock().unwrap();
    let runner = runners
        .get_mut(&id)
        .ok_or_else(|| MockGitLabClient::not_found("Runner", id))?;
    apply_runner_options(runner, options);
    Ok(runner.clone())
}

fn apply_runner_options(runner: &mut Runner, options: &RunnerOptions) {
    if let Some(v) = &options.description {
        runner.description = Some(v.clone());
    }
    if let Some(v) = options.paused {
        runner.paused = v;
    }
    if let Some(v) = options.locked {
        runner.locked = v;
    }
    if let Some(v) = options.run_untagged {
        runner.run_untagged = v;
    }
    if let Some(v) = &options.tag_list {
        runner.tag_list = v.clone();
    }
    if let Some(v) = &options.access_level {
        runner.access_level = Some(v.clone());
    }
    if let Some(v) = options.maximum_timeout {
        runner.maximum_timeout = Some(v);
    }
    if let Some(v) = &options.maintenance_note {
        runner.maintenance_note = Some(v.clone());
    }
}

pub async fn delete_runner(client: &MockGitLabClient, id: i64) -> Result<(), GitLabError> {
    client.record("delete_runner", id)?;
    client
        .runners
        .lock()
        .unwrap()
        .remove(&id)
        .map(|_| ())
        .ok_or_else(|| MockGitLabClient::not_found("Runner", id))
}
